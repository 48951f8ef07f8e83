// restoretool/src/import/http.rs
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::{ImportOperation, ImportService, OperationRef};
use crate::config::ImportServiceConfig;
use crate::errors::{RestoreError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct LongRunningOperation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Import service speaking the document-database admin REST API
/// (`databases/{id}:importDocuments` plus long-running operation polling).
#[derive(Debug, Clone)]
pub struct HttpImportService {
    client: Client,
    config: ImportServiceConfig,
    access_token: Option<String>,
}

impl HttpImportService {
    pub fn new(config: ImportServiceConfig, access_token: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(HttpImportService {
            client,
            config,
            access_token,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn import_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}:importDocuments",
            self.config.api_base_url, self.config.project_id, self.config.database_id
        )
    }

    fn operation_url(&self, operation_name: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base_url,
            operation_name.trim_start_matches('/')
        )
    }

    async fn fetch_operation(&self, operation_name: &str) -> Result<LongRunningOperation> {
        let response = self
            .authorize(self.client.get(self.operation_url(operation_name)))
            .send()
            .await
            .map_err(|e| RestoreError::ImportWait(format!("failed to poll {}: {}", operation_name, e)))?;
        let response = ensure_success(response, RestoreError::ImportWait).await?;
        response
            .json::<LongRunningOperation>()
            .await
            .map_err(|e| RestoreError::ImportWait(format!("invalid operation payload: {}", e)))
    }
}

#[async_trait]
impl ImportService for HttpImportService {
    async fn create_import(&self, backup_id: &str) -> Result<ImportOperation> {
        let input_uri_prefix = self.config.input_uri_prefix(backup_id);
        tracing::info!(backup_id, %input_uri_prefix, "requesting import");

        let body = json!({ "inputUriPrefix": input_uri_prefix });
        let response = self
            .authorize(self.client.post(self.import_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| RestoreError::ImportCreation(e.to_string()))?;
        let response = ensure_success(response, RestoreError::ImportCreation).await?;
        let operation = response
            .json::<LongRunningOperation>()
            .await
            .map_err(|e| RestoreError::ImportCreation(format!("invalid operation payload: {}", e)))?;

        if let Some(error) = operation.error {
            return Err(RestoreError::ImportCreation(format_operation_error(&error)));
        }

        Ok(ImportOperation {
            id: backup_id.to_string(),
            operation: OperationRef {
                name: operation.name,
            },
        })
    }

    async fn wait_for_completion(&self, operation_name: &str) -> Result<()> {
        if operation_name.trim().is_empty() {
            return Err(RestoreError::ImportWait(
                "import operation has no name to poll".to_string(),
            ));
        }

        let started = Instant::now();
        loop {
            let operation = self.fetch_operation(operation_name).await?;
            if let Some(error) = operation.error {
                return Err(RestoreError::ImportWait(format_operation_error(&error)));
            }
            if operation.done {
                tracing::info!(
                    operation = operation_name,
                    elapsed_secs = started.elapsed().as_secs(),
                    "import operation finished"
                );
                return Ok(());
            }

            if let Some(max_wait) = self.config.max_wait {
                if started.elapsed() >= max_wait {
                    return Err(RestoreError::ImportWait(format!(
                        "timed out after {}s waiting for {}",
                        max_wait.as_secs_f64(),
                        operation_name
                    )));
                }
            }
            tracing::debug!(operation = operation_name, "import still running");
            sleep(self.config.poll_interval).await;
        }
    }
}

fn format_operation_error(error: &OperationError) -> String {
    if error.message.is_empty() {
        format!("operation failed with code {}", error.code)
    } else {
        error.message.clone()
    }
}

/// Turns a non-2xx response into the given error kind, keeping the body for context.
pub(crate) async fn ensure_success(
    response: Response,
    kind: fn(String) -> RestoreError,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(kind(format!("request rejected with {}: {}", status, body.trim())))
}
