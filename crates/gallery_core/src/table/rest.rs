use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use shared::{
    domain::{ImageId, ImagePatch, ImageRecord, NewImage},
    error::{TableError, TableErrorBody},
};
use tracing::{debug, warn};
use url::Url;

use super::{ImageTable, TableResult};

const REST_PATH: &str = "rest/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct RestTableConfig {
    base_url: Url,
    api_key: String,
    table: String,
    timeout: Duration,
}

impl RestTableConfig {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            table: table.into(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        self.base_url
            .join(REST_PATH)?
            .join(&self.table)
    }
}

/// Images table reached through a PostgREST endpoint.
pub struct RestImageTable {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl RestImageTable {
    pub fn new(config: RestTableConfig) -> TableResult<Self> {
        let endpoint = config.endpoint().map_err(TableError::transport)?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TableError::transport)?;
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key,
        })
    }

    fn id_filter(id: ImageId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id.0))]
    }

    async fn send(&self, request: RequestBuilder) -> TableResult<Response> {
        let response = request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(TableError::transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<TableErrorBody>().await.unwrap_or_default();
        warn!(
            status = status.as_u16(),
            code = body.code.as_deref().unwrap_or_default(),
            "images table: request rejected"
        );
        Err(TableError::from_body(status.as_u16(), body))
    }
}

#[async_trait]
impl ImageTable for RestImageTable {
    async fn select_all(&self) -> TableResult<Vec<ImageRecord>> {
        let rows: Vec<ImageRecord> = self
            .send(
                self.http
                    .get(self.endpoint.clone())
                    .query(&[("select", "*"), ("order", "created_at.asc")]),
            )
            .await?
            .json()
            .await
            .map_err(TableError::transport)?;
        debug!(rows = rows.len(), "images table: fetched rows");
        Ok(rows)
    }

    async fn insert(&self, image: &NewImage) -> TableResult<ImageRecord> {
        let rows: Vec<ImageRecord> = self
            .send(
                self.http
                    .post(self.endpoint.clone())
                    .header("Prefer", "return=representation")
                    .json(&[image]),
            )
            .await?
            .json()
            .await
            .map_err(TableError::transport)?;
        let record = rows.into_iter().next().ok_or(TableError::EmptyResponse)?;
        debug!(id = record.id.0, "images table: inserted row");
        Ok(record)
    }

    async fn update(&self, id: ImageId, patch: &ImagePatch) -> TableResult<()> {
        self.send(
            self.http
                .patch(self.endpoint.clone())
                .query(&Self::id_filter(id))
                .json(patch),
        )
        .await?;
        debug!(id = id.0, "images table: updated row");
        Ok(())
    }

    async fn delete(&self, id: ImageId) -> TableResult<()> {
        self.send(
            self.http
                .delete(self.endpoint.clone())
                .query(&Self::id_filter(id)),
        )
        .await?;
        debug!(id = id.0, "images table: deleted row");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/rest_tests.rs"]
mod tests;
