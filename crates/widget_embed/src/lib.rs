//! Route-aware chat widget embedding.
//!
//! The third-party embed script scans the page for marker elements and
//! hydrates them; this crate only decides which marker, if any, a route gets.

use std::fmt;

use tokio::sync::watch;
use tracing::debug;
use uuid::{uuid, Uuid};

const EYE_CARE_PREFIX: &str = "/eyecare";
const GYNECOLOGY_PREFIX: &str = "/gynecology";
const MARKER_CLASS_PREFIX: &str = "elfsight-app-";
const LAZY_ATTRIBUTE: &str = "data-elfsight-app-lazy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetId {
    EyeCare,
    Gynecology,
}

impl WidgetId {
    pub fn token(self) -> Uuid {
        match self {
            Self::EyeCare => uuid!("a33bc770-938d-4a29-a90b-1d1514e16817"),
            Self::Gynecology => uuid!("f5987c20-7de0-4b19-a688-ad23bc2c6457"),
        }
    }

    pub fn marker(self) -> WidgetMarker {
        WidgetMarker { widget: self }
    }
}

/// Picks the widget for a navigation path. Eye care wins over gynecology;
/// every other route gets nothing.
pub fn select(path: &str) -> Option<WidgetId> {
    if path.starts_with(EYE_CARE_PREFIX) {
        Some(WidgetId::EyeCare)
    } else if path.starts_with(GYNECOLOGY_PREFIX) {
        Some(WidgetId::Gynecology)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetMarker {
    widget: WidgetId,
}

impl WidgetMarker {
    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    pub fn class_name(&self) -> String {
        format!("{MARKER_CLASS_PREFIX}{}", self.widget.token().hyphenated())
    }
}

impl fmt::Display for WidgetMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<div class="{}" {LAZY_ATTRIBUTE}></div>"#,
            self.class_name()
        )
    }
}

/// Keeps the selected widget in step with the current route.
pub struct WidgetSlot {
    location: watch::Receiver<String>,
}

impl WidgetSlot {
    pub fn new(location: watch::Receiver<String>) -> Self {
        Self { location }
    }

    pub fn current(&self) -> Option<WidgetId> {
        select(self.location.borrow().as_str())
    }

    pub fn current_marker(&self) -> Option<WidgetMarker> {
        self.current().map(WidgetId::marker)
    }

    /// Waits for the next navigation and returns the selection for it.
    /// Returns `None` once the location source is gone.
    pub async fn changed(&mut self) -> Option<Option<WidgetId>> {
        self.location.changed().await.ok()?;
        let path = self.location.borrow_and_update().clone();
        let selected = select(&path);
        debug!(path = %path, widget = ?selected, "widget: route changed");
        Some(selected)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
