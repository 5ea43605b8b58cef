use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use gallery_core::RestTableConfig;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "gallery.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub images_table: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_anon_key: None,
            images_table: "csm_clinic_images".into(),
            request_timeout_secs: 15,
        }
    }
}

impl Settings {
    pub fn rest_config(&self) -> anyhow::Result<RestTableConfig> {
        let url = self
            .supabase_url
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("supabase_url is not configured (set SUPABASE_URL or use --offline)"))?;
        let key = self
            .supabase_anon_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("supabase_anon_key is not configured (set SUPABASE_ANON_KEY or use --offline)")
            })?;

        let config = RestTableConfig::new(url, key, self.images_table.clone())
            .with_context(|| format!("invalid supabase_url '{url}'"))?;
        Ok(config.with_timeout(Duration::from_secs(self.request_timeout_secs)))
    }
}

pub fn load_settings(config_path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        if let Err(err) = apply_file_overrides(&mut settings, &raw) {
            warn!(path = %path.display(), error = %err, "config: ignoring unreadable settings file");
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub(crate) fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: toml::Table = toml::from_str(raw).context("settings file is not valid TOML")?;

    if let Some(v) = file_cfg.get("supabase_url").and_then(toml::Value::as_str) {
        settings.supabase_url = Some(v.to_string());
    }
    if let Some(v) = file_cfg.get("supabase_anon_key").and_then(toml::Value::as_str) {
        settings.supabase_anon_key = Some(v.to_string());
    }
    if let Some(v) = file_cfg.get("images_table").and_then(toml::Value::as_str) {
        settings.images_table = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
    {
        settings.request_timeout_secs = u64::try_from(v)
            .map_err(|_| anyhow!("request_timeout_secs must not be negative, got {v}"))?;
    }

    Ok(())
}

/// Applies environment overrides. `APP__*` names win over the bare ones.
pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("SUPABASE_URL") {
        settings.supabase_url = Some(v);
    }
    if let Some(v) = lookup("APP__SUPABASE_URL") {
        settings.supabase_url = Some(v);
    }

    if let Some(v) = lookup("SUPABASE_ANON_KEY") {
        settings.supabase_anon_key = Some(v);
    }
    if let Some(v) = lookup("APP__SUPABASE_ANON_KEY") {
        settings.supabase_anon_key = Some(v);
    }

    if let Some(v) = lookup("APP__IMAGES_TABLE") {
        settings.images_table = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
