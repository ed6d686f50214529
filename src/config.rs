use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::SyncError;
use crate::github::graphql::DEFAULT_API_URL;
use crate::github::ContentTarget;

/// Optional settings file. Action inputs take precedence over it.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub organization: Option<String>,
    pub project_id: Option<i64>,
    pub field_option_values: Option<String>,
    pub api_url: Option<String>,
}

pub struct Settings {
    pub organization: String,
    pub project_id: i32,
    pub field_option_values: String,
    pub token: String,
    pub api_url: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub event_name: String,
    pub event_path: PathBuf,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("organization", &self.organization)
            .field("project_id", &self.project_id)
            .field("field_option_values", &self.field_option_values)
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("event_name", &self.event_name)
            .field("event_path", &self.event_path)
            .finish()
    }
}

fn invalid(msg: impl Into<String>) -> anyhow::Error {
    SyncError::InvalidInput(msg.into()).into()
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

/// GraphQL `Int` is a signed 32-bit value.
fn parse_project_id(raw: &str) -> Result<i32> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid(format!(
            "project_id must be a positive integer (got {raw:?})"
        ))),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from runner-style variables. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let file = match get("INPUT_CONFIG_FILE") {
            Some(path) => load_file_config(Path::new(path.trim()))?,
            None => FileConfig::default(),
        };

        let repository = get("GITHUB_REPOSITORY")
            .ok_or_else(|| invalid("GITHUB_REPOSITORY must be set"))?;
        let (repo_owner, repo_name) = match repository.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                (owner.to_string(), name.to_string())
            }
            _ => {
                return Err(invalid(format!(
                    "GITHUB_REPOSITORY must look like owner/repo (got {repository:?})"
                )))
            }
        };

        let organization = get("INPUT_ORGANIZATION")
            .or(file.organization)
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .ok_or_else(|| invalid("organization must be set"))?;

        let project_id = match get("INPUT_PROJECT_ID") {
            Some(raw) => parse_project_id(&raw)?,
            None => match file.project_id {
                Some(id) => parse_project_id(&id.to_string())?,
                None => return Err(invalid("project_id must be set")),
            },
        };

        let token = get("INPUT_GITHUB_TOKEN")
            .or_else(|| get("GITHUB_TOKEN"))
            .ok_or_else(|| invalid("github_token must be set"))?;

        let field_option_values = get("INPUT_FIELD_OPTION_VALUES")
            .or(file.field_option_values)
            .unwrap_or_default();

        let api_url = get("GITHUB_GRAPHQL_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let event_name =
            get("GITHUB_EVENT_NAME").ok_or_else(|| invalid("GITHUB_EVENT_NAME must be set"))?;
        let event_path = get("GITHUB_EVENT_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| invalid("GITHUB_EVENT_PATH must be set"))?;

        Ok(Self {
            organization,
            project_id,
            field_option_values,
            token: token.trim().to_string(),
            api_url,
            repo_owner,
            repo_name,
            event_name,
            event_path,
        })
    }

    pub fn target(&self, content_number: i32) -> ContentTarget {
        ContentTarget {
            project_owner: self.organization.clone(),
            issue_owner: self.repo_owner.clone(),
            repo: self.repo_name.clone(),
            project_number: self.project_id,
            content_number,
        }
    }
}
