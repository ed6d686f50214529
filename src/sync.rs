use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::error::SyncError;
use crate::github::{ContentTarget, ProjectsApi};
use crate::model::field_spec::FieldSpec;
use crate::model::project::ProjectMetadata;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub item_id: String,
    pub updated_fields: usize,
}

/// Parse the field spec, resolve ids, attach the content to the project and
/// set every requested field. Each step must succeed before the next starts.
pub async fn run(
    api: &dyn ProjectsApi,
    target: &ContentTarget,
    field_option_values: &str,
) -> Result<SyncReport, SyncError> {
    let spec = FieldSpec::parse(field_option_values)?;
    if spec.is_empty() {
        info!("no field option values given, the item will only be added");
    } else {
        info!(fields = spec.len(), "parsed field option values");
    }

    let meta = api.resolve_metadata(target).await?;
    info!(
        content_id = %meta.content_id,
        project_id = %meta.project_node_id,
        fields = meta.fields.len(),
        "resolved project metadata"
    );
    warn_unknown_fields(&spec, &meta);

    let item = api
        .add_item(&meta.project_node_id, &meta.content_id)
        .await?;
    info!(item_id = %item.id, "added content to project");

    let updated_fields = update_fields(api, &meta.project_node_id, &item.id, &spec).await?;
    info!(updated_fields, "project item fields updated");

    Ok(SyncReport {
        item_id: item.id,
        updated_fields,
    })
}

/// Issues all updates concurrently and waits for every one of them. Any
/// failure fails the whole step.
async fn update_fields(
    api: &dyn ProjectsApi,
    project_node_id: &str,
    item_id: &str,
    spec: &FieldSpec,
) -> Result<usize, SyncError> {
    let updates = spec.iter().map(|(field_id, value)| async move {
        let result = api
            .update_field(project_node_id, item_id, field_id, value)
            .await;
        (field_id, result)
    });
    let results = join_all(updates).await;
    let total = results.len();

    let mut failures = Vec::new();
    for (field_id, result) in results {
        match result {
            Ok(id) => debug!(field_id, item_id = %id, "field updated"),
            Err(e) => {
                error!(field_id, error = %e, "field update failed");
                failures.push(e);
            }
        }
    }

    let failed = failures.len();
    match failures.into_iter().next() {
        None => Ok(total),
        Some(first) => Err(SyncError::FieldUpdates {
            failed,
            total,
            first: Box::new(first),
        }),
    }
}

fn warn_unknown_fields(spec: &FieldSpec, meta: &ProjectMetadata) {
    for (field_id, value) in spec.iter() {
        match meta.field(field_id) {
            None => warn!(field_id, "field is not among the project's first 100 fields"),
            Some(field) if field.has_option(value) == Some(false) => warn!(
                field = %field.name,
                option = value,
                "option is not listed in the field settings"
            ),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::tests::MockApi;
    use crate::model::project::{FieldDescriptor, OptionDescriptor};

    fn target() -> ContentTarget {
        ContentTarget {
            project_owner: "acme".into(),
            issue_owner: "acme".into(),
            repo: "widgets".into(),
            project_number: 5,
            content_number: 12,
        }
    }

    #[tokio::test]
    async fn full_run_succeeds() {
        let api = MockApi::new();
        let calls = api.calls.clone();

        let report = run(&api, &target(), "abc123==::1a2b3c\ndef456::4d5e6f\n")
            .await
            .unwrap();

        assert_eq!(report.item_id, "PNI_1");
        assert_eq!(report.updated_fields, 2);
        assert_eq!(calls.resolve_count(), 1);
        assert_eq!(calls.attach_count(), 1);
        let mut updates = calls.updates.lock().unwrap().clone();
        updates.sort();
        assert_eq!(
            updates,
            vec![
                ("abc123==".to_string(), "1a2b3c".to_string()),
                ("def456".to_string(), "4d5e6f".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn resolve_uses_triggering_content_number() {
        let api = MockApi::new();
        let calls = api.calls.clone();

        run(&api, &target(), "").await.unwrap();

        let resolves = calls.resolves.lock().unwrap();
        assert_eq!(resolves[0].content_number, 12);
        assert_eq!(
            calls.attaches.lock().unwrap().as_slice(),
            &[("PN_5".to_string(), "I_12".to_string())]
        );
    }

    #[tokio::test]
    async fn malformed_spec_makes_no_calls() {
        let api = MockApi::new();
        let calls = api.calls.clone();

        let err = run(&api, &target(), "f1::aaa\nbad line no separator\n")
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::MalformedLine { line: 2, .. }));
        assert_eq!(calls.resolve_count(), 0);
        assert_eq!(calls.attach_count(), 0);
        assert_eq!(calls.update_count(), 0);
    }

    #[tokio::test]
    async fn missing_metadata_stops_before_mutations() {
        let api = MockApi::new().with_missing_metadata();
        let calls = api.calls.clone();

        let err = run(&api, &target(), "f1::aaa").await.unwrap_err();

        assert!(matches!(err, SyncError::MissingMetadata(_)));
        assert_eq!(calls.attach_count(), 0);
        assert_eq!(calls.update_count(), 0);
    }

    #[tokio::test]
    async fn attach_failure_skips_updates() {
        let api = MockApi::new().with_missing_item();
        let calls = api.calls.clone();

        let err = run(&api, &target(), "f1::aaa\nf2::bbb").await.unwrap_err();

        assert_eq!(err.to_string(), "missing expected info in addProjectNextItem");
        assert_eq!(calls.attach_count(), 1);
        assert_eq!(calls.update_count(), 0);
    }

    #[tokio::test]
    async fn one_failed_update_fails_the_run() {
        let api = MockApi::new().with_failing_field("f2");
        let calls = api.calls.clone();

        let err = run(&api, &target(), "f1::aaa\nf2::bbb\nf3::ccc")
            .await
            .unwrap_err();

        // Every update still ran to completion.
        assert_eq!(calls.update_count(), 3);
        match err {
            SyncError::FieldUpdates { failed, total, first } => {
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
                assert!(matches!(*first, SyncError::MissingInfo(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn all_failures_are_counted() {
        let api = MockApi::new()
            .with_failing_field("f1")
            .with_failing_field("f3");

        let err = run(&api, &target(), "f1::aaa\nf2::bbb\nf3::ccc")
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("2 of 3 field updates failed"));
    }

    #[tokio::test]
    async fn duplicate_fields_update_once_with_last_value() {
        let api = MockApi::new();
        let calls = api.calls.clone();

        let report = run(&api, &target(), "f1::aaa\nf1::bbb").await.unwrap();

        assert_eq!(report.updated_fields, 1);
        assert_eq!(
            calls.updates.lock().unwrap().as_slice(),
            &[("f1".to_string(), "bbb".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_fields_are_still_updated() {
        let api = MockApi::new().with_fields(vec![FieldDescriptor {
            id: "f1".into(),
            name: "Status".into(),
            options: Some(vec![OptionDescriptor {
                id: "aaa".into(),
                name: "Todo".into(),
                name_html: "Todo".into(),
                extra: Default::default(),
            }]),
        }]);
        let calls = api.calls.clone();

        let report = run(&api, &target(), "f1::zzz\nghost::aaa").await.unwrap();

        assert_eq!(report.updated_fields, 2);
        assert_eq!(calls.update_count(), 2);
    }
}
