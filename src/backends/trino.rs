//! Trino Backend
//!
//! Speaks the Trino client REST protocol: POST the statement to
//! `/v1/statement`, then follow `nextUri` until the coordinator stops
//! returning one. Column metadata arrives on an early page and every `data`
//! page is zipped against it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use ran_assistant_core::{BackendKind, CoreError, CoreResult, QueryBackend, Row, Rows};
use ran_assistant_llm::build_http_client;

use crate::models::settings::TrinoConfig;
use crate::utils::error::{AppError, AppResult};

/// Retries for `503 Service Unavailable`, which the coordinator uses for
/// "busy, ask again".
const MAX_BUSY_RETRIES: u32 = 3;
const BUSY_BACKOFF_MS: u64 = 100;
const SOURCE: &str = "ran-assistant";

/// One page of a Trino query response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    next_uri: Option<String>,
    #[serde(default)]
    columns: Option<Vec<TrinoColumn>>,
    #[serde(default)]
    data: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    error: Option<TrinoError>,
}

#[derive(Debug, Deserialize)]
struct TrinoColumn {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrinoError {
    message: String,
    #[serde(default)]
    error_name: Option<String>,
}

impl std::fmt::Display for TrinoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_name {
            Some(name) => write!(f, "{}: {}", name, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Zip one page of positional values with the column names.
fn rows_from_page(columns: &[String], data: Vec<Vec<Value>>) -> CoreResult<Rows> {
    data.into_iter()
        .map(|values| {
            if values.len() != columns.len() {
                return Err(CoreError::parse(format!(
                    "trino row has {} values for {} columns",
                    values.len(),
                    columns.len()
                )));
            }
            Ok(columns.iter().cloned().zip(values).collect::<Row>())
        })
        .collect()
}

/// Trino coordinator client.
#[derive(Debug, Clone)]
pub struct TrinoBackend {
    client: Client,
    statement_url: String,
    user: String,
    catalog: Option<String>,
    schema: Option<String>,
}

impl TrinoBackend {
    pub fn new(config: &TrinoConfig) -> AppResult<Self> {
        let base = url::Url::parse(&config.url)
            .map_err(|e| AppError::config(format!("invalid trino url {}: {}", config.url, e)))?;
        let client = build_http_client(config.proxy.as_ref(), None)
            .map_err(|e| AppError::config(format!("failed to build trino http client: {}", e)))?;

        Ok(Self {
            client,
            statement_url: format!("{}/v1/statement", base.as_str().trim_end_matches('/')),
            user: config.user.clone(),
            catalog: config.catalog.clone(),
            schema: config.schema.clone(),
        })
    }

    pub fn statement_url(&self) -> &str {
        &self.statement_url
    }

    fn submit(&self, query: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(&self.statement_url)
            .header("X-Trino-User", &self.user)
            .header("X-Trino-Source", SOURCE)
            .body(query.to_string());
        if let Some(catalog) = &self.catalog {
            request = request.header("X-Trino-Catalog", catalog);
        }
        if let Some(schema) = &self.schema {
            request = request.header("X-Trino-Schema", schema);
        }
        request
    }

    /// Send a request, retrying while the coordinator reports it is busy.
    async fn fetch(&self, request: reqwest::RequestBuilder) -> CoreResult<QueryPage> {
        let mut busy_retries = 0;
        loop {
            let attempt = request
                .try_clone()
                .ok_or_else(|| CoreError::internal("trino request body is not cloneable"))?;
            let response = attempt.send().await.map_err(map_request_error)?;
            let status = response.status();

            if status == StatusCode::SERVICE_UNAVAILABLE && busy_retries < MAX_BUSY_RETRIES {
                busy_retries += 1;
                tracing::debug!(retry = busy_retries, "trino coordinator busy");
                tokio::time::sleep(Duration::from_millis(BUSY_BACKOFF_MS * u64::from(busy_retries)))
                    .await;
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CoreError::backend(format!("trino returned {}: {}", status, body)));
            }

            return response
                .json::<QueryPage>()
                .await
                .map_err(|e| CoreError::parse(format!("invalid trino response: {}", e)));
        }
    }
}

fn map_request_error(e: reqwest::Error) -> CoreError {
    if e.is_connect() {
        CoreError::unavailable(format!("trino unreachable: {}", e))
    } else if e.is_timeout() {
        CoreError::timeout(format!("trino request: {}", e))
    } else {
        CoreError::backend(format!("trino request failed: {}", e))
    }
}

#[async_trait]
impl QueryBackend for TrinoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Trino
    }

    async fn execute(&self, query: &str) -> CoreResult<Rows> {
        let mut page = self.fetch(self.submit(query)).await?;
        if let Some(id) = &page.id {
            tracing::debug!(query_id = %id, "trino query submitted");
        }

        let mut columns: Option<Vec<String>> = None;
        let mut rows = Rows::new();
        loop {
            if let Some(error) = page.error.take() {
                return Err(CoreError::backend(error.to_string()));
            }
            if columns.is_none() {
                columns = page
                    .columns
                    .take()
                    .map(|cols| cols.into_iter().map(|c| c.name).collect());
            }
            if let Some(data) = page.data.take() {
                let names = columns
                    .as_deref()
                    .ok_or_else(|| CoreError::parse("trino sent data before column metadata"))?;
                rows.extend(rows_from_page(names, data)?);
            }
            match page.next_uri.take() {
                Some(next) => page = self.fetch(self.client.get(next)).await?,
                None => break,
            }
        }

        Ok(rows)
    }
}
