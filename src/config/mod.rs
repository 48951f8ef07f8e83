// restoretool/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::utils::validate_identifier;

pub const DEFAULT_EXPORTS_TABLE: &str = "backup_exports";
pub const DEFAULT_IMPORTS_TABLE: &str = "backup_imports";
pub const DEFAULT_IMPORT_API_BASE: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_REPLAY_API_BASE: &str = "https://dataflow.googleapis.com/v1b3";
const DEFAULT_DATABASE_ID: &str = "(default)";
const DEFAULT_BACKUP_PREFIX: &str = "backups";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_JOB_NAME_PREFIX: &str = "restore-replay";

// Structs for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonCatalogConfig {
    pub exports_table: Option<String>,
    pub imports_table: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonImportServiceConfig {
    pub api_base_url: Option<String>,
    pub project_id: Option<String>,
    pub database_id: Option<String>,
    pub bucket_name: Option<String>,
    pub backup_prefix: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonReplayJobConfig {
    pub api_base_url: Option<String>,
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub template_path: Option<String>,
    pub job_name_prefix: Option<String>,
    pub parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub database_url: Option<String>,
    pub catalog: Option<JsonCatalogConfig>,
    pub import_service: Option<JsonImportServiceConfig>,
    pub replay_job: Option<JsonReplayJobConfig>,
}

/// Values taken from the process environment that win over config.json.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub database_url: Option<String>,
    pub access_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        EnvOverrides {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            access_token: env::var("RESTORE_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

// Application's internal configuration structs
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub exports_table: String,
    pub imports_table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportServiceConfig {
    pub api_base_url: String,
    pub project_id: String,
    pub database_id: String,
    pub bucket_name: String,
    pub backup_prefix: String,
    pub poll_interval: Duration,
    pub max_wait: Option<Duration>,
}

impl ImportServiceConfig {
    /// Storage location the import service reads a given backup from.
    pub fn input_uri_prefix(&self, backup_id: &str) -> String {
        format!(
            "gs://{}/{}/{}",
            self.bucket_name,
            self.backup_prefix.trim_matches('/'),
            backup_id
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayJobConfig {
    pub api_base_url: String,
    pub project_id: String,
    pub location: String,
    pub template_path: String,
    pub job_name_prefix: String,
    pub parameters: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub access_token: Option<String>,
    pub catalog: CatalogConfig,
    pub import_service: ImportServiceConfig,
    pub replay_job: ReplayJobConfig,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        let raw_json_config: RawJsonConfig = serde_json::from_str(&config_content)
            .with_context(|| {
                format!(
                    "Failed to parse JSON from config file at {}",
                    config_path.display()
                )
            })?;

        Self::from_raw(raw_json_config, EnvOverrides::from_env())
    }

    pub fn from_raw(raw: RawJsonConfig, overrides: EnvOverrides) -> Result<Self> {
        let database_url = overrides
            .database_url
            .or(raw.database_url)
            .filter(|s| !s.trim().is_empty())
            .context("database_url must be set in config.json or DATABASE_URL")?;
        Url::parse(&database_url).context("database_url is not a valid URL")?;

        let catalog = load_catalog_config(raw.catalog.unwrap_or_default())?;
        let import_service = load_import_service_config(
            raw.import_service
                .context("import_service must be defined in config.json")?,
        )?;
        let replay_job = load_replay_job_config(
            raw.replay_job
                .context("replay_job must be defined in config.json")?,
            &import_service.project_id,
        )?;

        Ok(AppConfig {
            database_url,
            access_token: overrides.access_token,
            catalog,
            import_service,
            replay_job,
        })
    }
}

fn load_catalog_config(raw: JsonCatalogConfig) -> Result<CatalogConfig> {
    let exports_table = raw
        .exports_table
        .unwrap_or_else(|| DEFAULT_EXPORTS_TABLE.to_string());
    let imports_table = raw
        .imports_table
        .unwrap_or_else(|| DEFAULT_IMPORTS_TABLE.to_string());

    validate_identifier(&exports_table).context("catalog.exports_table is invalid")?;
    validate_identifier(&imports_table).context("catalog.imports_table is invalid")?;
    if exports_table == imports_table {
        anyhow::bail!("catalog.exports_table and catalog.imports_table must differ");
    }

    Ok(CatalogConfig {
        exports_table,
        imports_table,
    })
}

fn load_import_service_config(raw: JsonImportServiceConfig) -> Result<ImportServiceConfig> {
    let api_base_url = parse_base_url(raw.api_base_url, DEFAULT_IMPORT_API_BASE)
        .context("import_service.api_base_url is invalid")?;
    let project_id = required(raw.project_id, "import_service.project_id")?;
    let bucket_name = required(raw.bucket_name, "import_service.bucket_name")?;

    let poll_interval_secs = raw.poll_interval_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    if poll_interval_secs == 0 {
        anyhow::bail!("import_service.poll_interval_secs must be greater than zero");
    }

    Ok(ImportServiceConfig {
        api_base_url,
        project_id,
        database_id: raw
            .database_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_ID.to_string()),
        bucket_name,
        backup_prefix: raw
            .backup_prefix
            .unwrap_or_else(|| DEFAULT_BACKUP_PREFIX.to_string()),
        poll_interval: Duration::from_secs(poll_interval_secs),
        max_wait: raw.max_wait_secs.map(Duration::from_secs),
    })
}

fn load_replay_job_config(raw: JsonReplayJobConfig, import_project: &str) -> Result<ReplayJobConfig> {
    let api_base_url = parse_base_url(raw.api_base_url, DEFAULT_REPLAY_API_BASE)
        .context("replay_job.api_base_url is invalid")?;

    Ok(ReplayJobConfig {
        api_base_url,
        project_id: raw
            .project_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| import_project.to_string()),
        location: required(raw.location, "replay_job.location")?,
        template_path: required(raw.template_path, "replay_job.template_path")?,
        job_name_prefix: raw
            .job_name_prefix
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_JOB_NAME_PREFIX.to_string()),
        parameters: raw.parameters.unwrap_or_default(),
    })
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|s| !s.trim().is_empty())
        .with_context(|| format!("{} must be set in config.json", field))
}

/// Parses an API base URL and strips any trailing slash so paths can be appended.
fn parse_base_url(value: Option<String>, default: &str) -> Result<String> {
    let raw = value.unwrap_or_else(|| default.to_string());
    let parsed = Url::parse(&raw).with_context(|| format!("Invalid URL: {}", raw))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow::anyhow!("URL must use http or https: {}", raw));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
