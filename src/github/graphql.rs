use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{ContentTarget, ProjectsApi};
use crate::error::SyncError;
use crate::model::project::{FieldDescriptor, OptionDescriptor, ProjectItem, ProjectMetadata};

pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

const USER_AGENT: &str = concat!("project-item-sync/", env!("CARGO_PKG_VERSION"));

pub struct GraphqlClient {
    api_url: String,
    token: String,
    client: reqwest::Client,
}

impl GraphqlClient {
    pub fn new(api_url: String, token: String) -> Self {
        Self {
            api_url,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Posts one query and unwraps the `{data, errors}` envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: Value,
    ) -> Result<Option<T>, SyncError> {
        debug!(operation, %variables, "sending GraphQL request");
        let body = json!({ "query": query, "variables": variables });
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|source| SyncError::Transport { operation, source })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|source| SyncError::Transport { operation, source })?;

        if !status.is_success() {
            return Err(SyncError::Status {
                operation,
                status: status.as_u16(),
                body: text.chars().take(500).collect(),
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&text).map_err(|source| SyncError::Decode { operation, source })?;

        if !envelope.errors.is_empty() {
            return Err(SyncError::Graphql {
                operation,
                messages: envelope.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        Ok(envelope.data)
    }
}

const METADATA_QUERY: &str = r#"query ($projectOwner: String!, $issueOwner: String!, $repo: String!, $projectId: Int!, $number: Int!) {
  repository(owner: $issueOwner, name: $repo) {
    issueOrPullRequest(number: $number) {
      ... on Issue { id }
      ... on PullRequest { id }
    }
  }
  organization(login: $projectOwner) {
    projectNext(number: $projectId) {
      id
      fields(first: 100) {
        nodes { id name settings }
      }
    }
  }
}"#;

const ADD_ITEM_MUTATION: &str = r#"mutation ($projectId: ID!, $contentId: ID!) {
  addProjectNextItem(input: { projectId: $projectId, contentId: $contentId }) {
    projectNextItem { id }
  }
}"#;

const UPDATE_FIELD_MUTATION: &str = r#"mutation ($projectId: ID!, $itemId: ID!, $fieldId: ID!, $value: String!) {
  updateProjectNextItemField(
    input: { projectId: $projectId, itemId: $itemId, fieldId: $fieldId, value: $value }
  ) {
    projectNextItem { id }
  }
}"#;

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Deserialize)]
struct Node {
    id: Option<Value>,
}

impl Node {
    fn string_id(&self) -> Option<String> {
        non_empty_str(self.id.as_ref())
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[derive(Deserialize)]
struct MetadataData {
    repository: Option<Repository>,
    organization: Option<Organization>,
}

#[derive(Deserialize)]
struct Repository {
    #[serde(rename = "issueOrPullRequest")]
    issue_or_pull_request: Option<Node>,
}

#[derive(Deserialize)]
struct Organization {
    #[serde(rename = "projectNext")]
    project_next: Option<ProjectNext>,
}

#[derive(Deserialize)]
struct ProjectNext {
    id: Option<Value>,
    fields: Option<FieldConnection>,
}

#[derive(Deserialize)]
struct FieldConnection {
    #[serde(default)]
    nodes: Vec<Option<RawField>>,
}

#[derive(Deserialize)]
struct RawField {
    id: Option<String>,
    name: Option<String>,
    settings: Option<String>,
}

#[derive(Deserialize)]
struct AddItemData {
    #[serde(rename = "addProjectNextItem")]
    add_project_next_item: Option<ItemPayload>,
}

#[derive(Deserialize)]
struct UpdateFieldData {
    #[serde(rename = "updateProjectNextItemField")]
    update_project_next_item_field: Option<ItemPayload>,
}

#[derive(Deserialize)]
struct ItemPayload {
    #[serde(rename = "projectNextItem")]
    project_next_item: Option<Node>,
}

fn decode_metadata(data: Option<MetadataData>) -> Result<ProjectMetadata, SyncError> {
    let data = data.ok_or(SyncError::MissingMetadata("empty response"))?;

    let content_id = data
        .repository
        .and_then(|r| r.issue_or_pull_request)
        .and_then(|n| n.string_id())
        .ok_or(SyncError::MissingMetadata("issue or pull request id"))?;

    let project = data
        .organization
        .and_then(|o| o.project_next)
        .ok_or(SyncError::MissingMetadata("project id"))?;
    let project_node_id = non_empty_str(project.id.as_ref())
        .ok_or(SyncError::MissingMetadata("project id"))?;

    let fields = project
        .fields
        .map(|c| c.nodes.into_iter().flatten().filter_map(decode_field).collect())
        .unwrap_or_default();

    Ok(ProjectMetadata {
        content_id,
        project_node_id,
        fields,
    })
}

/// Nodes without an id are dropped; a missing name becomes empty.
fn decode_field(raw: RawField) -> Option<FieldDescriptor> {
    let Some(id) = raw.id.filter(|id| !id.is_empty()) else {
        warn!("skipping project field without an id");
        return None;
    };
    let name = raw.name.unwrap_or_default();
    let options = raw.settings.as_deref().and_then(|s| decode_options(&name, s));
    Some(FieldDescriptor { id, name, options })
}

/// Malformed settings only cost the field its option list.
fn decode_options(field_name: &str, settings: &str) -> Option<Vec<OptionDescriptor>> {
    let value: Value = match serde_json::from_str(settings) {
        Ok(v) => v,
        Err(e) => {
            warn!(field = field_name, error = %e, "ignoring unreadable field settings");
            return None;
        }
    };
    let options = value.get("options")?.as_array()?;
    let decoded = options
        .iter()
        .filter_map(|raw| match OptionDescriptor::deserialize(raw) {
            Ok(opt) => Some(opt),
            Err(e) => {
                warn!(field = field_name, error = %e, "skipping unreadable field option");
                None
            }
        })
        .collect();
    Some(decoded)
}

fn decode_item(
    payload: Option<ItemPayload>,
    mutation: &'static str,
) -> Result<String, SyncError> {
    payload
        .and_then(|p| p.project_next_item)
        .and_then(|n| n.string_id())
        .ok_or(SyncError::MissingInfo(mutation))
}

#[async_trait]
impl ProjectsApi for GraphqlClient {
    async fn resolve_metadata(&self, target: &ContentTarget) -> Result<ProjectMetadata, SyncError> {
        let variables = json!({
            "projectOwner": target.project_owner,
            "issueOwner": target.issue_owner,
            "repo": target.repo,
            "projectId": target.project_number,
            "number": target.content_number,
        });
        let data = self
            .execute::<MetadataData>("metadata query", METADATA_QUERY, variables)
            .await?;
        decode_metadata(data)
    }

    async fn add_item(
        &self,
        project_node_id: &str,
        content_id: &str,
    ) -> Result<ProjectItem, SyncError> {
        let variables = json!({ "projectId": project_node_id, "contentId": content_id });
        let data = self
            .execute::<AddItemData>("addProjectNextItem", ADD_ITEM_MUTATION, variables)
            .await?;
        let id = decode_item(
            data.and_then(|d| d.add_project_next_item),
            "addProjectNextItem",
        )?;
        Ok(ProjectItem { id })
    }

    async fn update_field(
        &self,
        project_node_id: &str,
        item_id: &str,
        field_id: &str,
        option_value_id: &str,
    ) -> Result<String, SyncError> {
        let variables = json!({
            "projectId": project_node_id,
            "itemId": item_id,
            "fieldId": field_id,
            "value": option_value_id,
        });
        let data = self
            .execute::<UpdateFieldData>(
                "updateProjectNextItemField",
                UPDATE_FIELD_MUTATION,
                variables,
            )
            .await?;
        decode_item(
            data.and_then(|d| d.update_project_next_item_field),
            "updateProjectNextItemField",
        )
    }
}
