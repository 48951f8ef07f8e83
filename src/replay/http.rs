// restoretool/src/replay/http.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::ReplayLauncher;
use crate::config::ReplayJobConfig;
use crate::errors::{RestoreError, Result};
use crate::import::http::ensure_success;
use crate::utils::clock::Clock;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaunchResponse {
    job: Option<LaunchedJob>,
}

#[derive(Debug, Default, Deserialize)]
struct LaunchedJob {
    #[serde(default)]
    id: String,
}

/// Launches the replay job from a flex template through the job service REST API.
pub struct HttpReplayLauncher {
    client: Client,
    config: ReplayJobConfig,
    access_token: Option<String>,
    clock: Arc<dyn Clock>,
}

impl HttpReplayLauncher {
    pub fn new(
        config: ReplayJobConfig,
        access_token: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(HttpReplayLauncher {
            client,
            config,
            access_token,
            clock,
        })
    }

    fn launch_url(&self) -> String {
        format!(
            "{}/projects/{}/locations/{}/flexTemplates:launch",
            self.config.api_base_url, self.config.project_id, self.config.location
        )
    }

    /// Job names must be unique per launch, so the current time is appended to the prefix.
    fn job_name(&self) -> String {
        format!(
            "{}-{}",
            self.config.job_name_prefix,
            self.clock.now().format("%Y%m%d-%H%M%S")
        )
    }
}

#[async_trait]
impl ReplayLauncher for HttpReplayLauncher {
    async fn launch(&self) -> Result<()> {
        let job_name = self.job_name();
        let body = json!({
            "launchParameter": {
                "jobName": job_name,
                "containerSpecGcsPath": self.config.template_path,
                "parameters": self.config.parameters,
            }
        });

        let mut request = self.client.post(self.launch_url()).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RestoreError::ReplayLaunch(e.to_string()))?;
        let response = ensure_success(response, RestoreError::ReplayLaunch).await?;

        let launched: LaunchResponse = response.json().await.unwrap_or_default();
        tracing::info!(
            %job_name,
            job_id = %launched.job.map(|j| j.id).unwrap_or_default(),
            "replay job launch accepted"
        );
        Ok(())
    }
}
