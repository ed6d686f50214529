use thiserror::Error;

/// Failures that end a sync run. Every variant is fatal; the run reports the
/// message and exits non-zero.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Unsupported event {event} / {action}!")]
    UnsupportedEvent { event: String, action: String },

    #[error("malformed line {line} in field option values: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("missing expected metadata: {0}")]
    MissingMetadata(&'static str),

    #[error("missing expected info in {0}")]
    MissingInfo(&'static str),

    #[error("{operation} returned errors: {}", messages.join("; "))]
    Graphql {
        operation: &'static str,
        messages: Vec<String>,
    },

    #[error("{operation} failed with HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{operation} request failed")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not decode {operation} response")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{failed} of {total} field updates failed, first: {first}")]
    FieldUpdates {
        failed: usize,
        total: usize,
        first: Box<SyncError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_info_names_the_mutation() {
        let err = SyncError::MissingInfo("addProjectNextItem");
        assert_eq!(err.to_string(), "missing expected info in addProjectNextItem");
    }

    #[test]
    fn graphql_error_joins_messages() {
        let err = SyncError::Graphql {
            operation: "metadata query",
            messages: vec!["Could not resolve".into(), "Forbidden".into()],
        };
        assert_eq!(
            err.to_string(),
            "metadata query returned errors: Could not resolve; Forbidden"
        );
    }

    #[test]
    fn aggregate_failure_reports_first_cause() {
        let err = SyncError::FieldUpdates {
            failed: 2,
            total: 3,
            first: Box::new(SyncError::MissingInfo("updateProjectNextItemField")),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 of 3 field updates failed"));
        assert!(msg.contains("updateProjectNextItemField"));
    }
}
