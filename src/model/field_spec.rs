use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::SyncError;

/// Field id to option value id, parsed from `<fieldId>::<optionValueId>` lines.
///
/// Later lines win when a field id repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpec {
    entries: BTreeMap<String, String>,
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9=]+)::([A-Za-z0-9=]+)\s*$").expect("field spec pattern")
    })
}

impl FieldSpec {
    pub fn parse(text: &str) -> Result<Self, SyncError> {
        let mut entries = BTreeMap::new();

        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let caps = line_pattern()
                .captures(line)
                .ok_or_else(|| SyncError::MalformedLine {
                    line: idx + 1,
                    content: line.trim().to_string(),
                })?;
            entries.insert(caps[1].to_string(), caps[2].to_string());
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field_id: &str) -> Option<&str> {
        self.entries.get(field_id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }
}

impl FromStr for FieldSpec {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, value) in self.iter() {
            writeln!(f, "{field}::{value}")?;
        }
        Ok(())
    }
}
