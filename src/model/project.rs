use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Ids resolved once per run by the metadata query.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectMetadata {
    /// Node id of the triggering issue or pull request
    pub content_id: String,
    pub project_node_id: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ProjectMetadata {
    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    /// Only present for single-select style fields with readable settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionDescriptor>>,
}

impl FieldDescriptor {
    /// `None` when the field has no known option list.
    pub fn has_option(&self, option_id: &str) -> Option<bool> {
        self.options
            .as_ref()
            .map(|opts| opts.iter().any(|o| o.id == option_id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    pub id: String,
    pub name: String,
    pub name_html: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectItem {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_keeps_unknown_attributes() {
        let json = r#"{"id":"1a2b","name":"Todo","name_html":"Todo","color":"GRAY"}"#;
        let opt: OptionDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(opt.id, "1a2b");
        assert_eq!(opt.extra.get("color"), Some(&serde_json::json!("GRAY")));
    }

    #[test]
    fn has_option_distinguishes_unknown_from_absent() {
        let mut field = FieldDescriptor {
            id: "F1".into(),
            name: "Status".into(),
            options: None,
        };
        assert_eq!(field.has_option("x"), None);

        field.options = Some(vec![OptionDescriptor {
            id: "x".into(),
            name: "X".into(),
            name_html: "X".into(),
            extra: HashMap::new(),
        }]);
        assert_eq!(field.has_option("x"), Some(true));
        assert_eq!(field.has_option("y"), Some(false));
    }
}
