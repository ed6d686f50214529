pub mod graphql;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::model::project::{ProjectItem, ProjectMetadata};

/// Where the triggering content lives and which project board it joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTarget {
    /// Organization login owning the project board
    pub project_owner: String,
    /// Owner of the repository the issue or pull request lives in
    pub issue_owner: String,
    pub repo: String,
    pub project_number: i32,
    /// Issue or pull request number from the triggering event
    pub content_number: i32,
}

#[async_trait]
pub trait ProjectsApi: Send + Sync {
    async fn resolve_metadata(&self, target: &ContentTarget) -> Result<ProjectMetadata, SyncError>;

    async fn add_item(
        &self,
        project_node_id: &str,
        content_id: &str,
    ) -> Result<ProjectItem, SyncError>;

    /// Sets one field on an item. Returns the item id echoed by the server.
    async fn update_field(
        &self,
        project_node_id: &str,
        item_id: &str,
        field_id: &str,
        option_value_id: &str,
    ) -> Result<String, SyncError>;
}
