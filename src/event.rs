use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::SyncError;

const SUPPORTED_EVENTS: &[&str] = &["issues", "pull_request", "pull_request_target"];
const SUPPORTED_ACTIONS: &[&str] = &["opened", "reopened"];

#[derive(Debug, Deserialize, Default)]
pub struct EventPayload {
    pub action: Option<String>,
    pub issue: Option<ContentRef>,
    pub pull_request: Option<ContentRef>,
}

#[derive(Debug, Deserialize)]
pub struct ContentRef {
    pub number: Option<i64>,
    pub html_url: Option<String>,
}

/// The issue or pull request that triggered this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeringContent {
    pub number: i32,
    pub html_url: String,
}

pub fn load_payload(path: &Path) -> Result<EventPayload> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload from {}", path.display()))?;
    let payload: EventPayload =
        serde_json::from_str(&contents).with_context(|| "Failed to parse event payload")?;
    Ok(payload)
}

impl EventPayload {
    pub fn triggering_content(&self, event_name: &str) -> Result<TriggeringContent, SyncError> {
        let action = self.action.as_deref().unwrap_or_default();
        if !SUPPORTED_EVENTS.contains(&event_name) || !SUPPORTED_ACTIONS.contains(&action) {
            return Err(SyncError::UnsupportedEvent {
                event: event_name.to_string(),
                action: action.to_string(),
            });
        }

        let content = if event_name == "issues" {
            self.issue.as_ref()
        } else {
            self.pull_request.as_ref()
        };

        let html_url = content
            .and_then(|c| c.html_url.clone())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                SyncError::InvalidInput("html_url must be present on event payload".into())
            })?;
        let number = content
            .and_then(|c| c.number)
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                SyncError::InvalidInput("number must be present on event payload".into())
            })?;

        Ok(TriggeringContent { number, html_url })
    }
}
