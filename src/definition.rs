use crate::error::DefinitionError;
use crate::page::{Page, sort_pages};
use crate::rule::Rule;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use tracing::warn;

/// Version of the on-disk artifact envelope.
pub const ARTIFACT_VERSION: u32 = 1;

/// Everything a funnel player needs: ordered pages and the funnel's rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunnelDefinition {
    pub funnel_id: String,
    pub pages: Vec<Page>,
    pub rules: Vec<Rule>,
}

#[derive(Deserialize)]
struct RawDefinition {
    funnel_id: String,
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    rules: Vec<serde_json::Value>,
}

/// Binary envelope around the JSON form of a definition.
///
/// Page content and rule actions are self-describing JSON shapes, so the body
/// stays JSON; the envelope carries the version and summary counts.
#[derive(Serialize, Deserialize)]
struct FunnelArtifact {
    version: u32,
    funnel_id: String,
    page_count: u32,
    rule_count: u32,
    body: String,
}

impl FunnelDefinition {
    pub fn new(funnel_id: impl Into<String>, pages: Vec<Page>, rules: Vec<Rule>) -> Self {
        Self {
            funnel_id: funnel_id.into(),
            pages: sort_pages(pages),
            rules,
        }
    }

    /// Parses a definition from JSON.
    ///
    /// Pages are sorted by `order_index` and page ids must be unique. Each
    /// rule is decoded on its own; a rule that fails to decode is skipped
    /// with a warning instead of rejecting the whole funnel.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        let raw: RawDefinition =
            serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))?;

        if let Some(duplicate) = raw.pages.iter().map(|p| &p.id).duplicates().next() {
            return Err(DefinitionError::DuplicatePage(duplicate.clone()));
        }

        let rules = raw
            .rules
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<Rule>(value) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(
                        funnel_id = %raw.funnel_id,
                        index,
                        error = %e,
                        "Skipping undecodable rule"
                    );
                    None
                }
            })
            .collect();

        Ok(Self::new(raw.funnel_id, raw.pages, rules))
    }

    /// Load a definition from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, DefinitionError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DefinitionError::Io(format!("Could not read file '{}': {}", path, e))
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, DefinitionError> {
        serde_json::to_string_pretty(self).map_err(|e| DefinitionError::Encoding(e.to_string()))
    }

    /// Encodes the definition as a versioned binary artifact.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DefinitionError> {
        let artifact = FunnelArtifact {
            version: ARTIFACT_VERSION,
            funnel_id: self.funnel_id.clone(),
            page_count: self.pages.len() as u32,
            rule_count: self.rules.len() as u32,
            body: serde_json::to_string(self)
                .map_err(|e| DefinitionError::Encoding(e.to_string()))?,
        };
        encode_to_vec(&artifact, standard())
            .map_err(|e| DefinitionError::Encoding(format!("Serialization failed: {}", e)))
    }

    /// Deserializes a definition from artifact bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DefinitionError> {
        let (artifact, _): (FunnelArtifact, usize) = decode_from_slice(bytes, standard())
            .map_err(|e| DefinitionError::Encoding(format!("Deserialization failed: {}", e)))?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(DefinitionError::ArtifactVersion {
                expected: ARTIFACT_VERSION,
                found: artifact.version,
            });
        }
        let definition = Self::from_json(&artifact.body)?;
        if definition.pages.len() != artifact.page_count as usize
            || definition.rules.len() != artifact.rule_count as usize
        {
            return Err(DefinitionError::Encoding(format!(
                "artifact for '{}' is inconsistent with its header",
                artifact.funnel_id
            )));
        }
        Ok(definition)
    }

    /// Saves the definition to a file in the artifact format.
    pub fn save(&self, path: &str) -> Result<(), DefinitionError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| {
            DefinitionError::Io(format!("Could not create file '{}': {}", path, e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            DefinitionError::Io(format!("Could not write to file '{}': {}", path, e))
        })?;
        Ok(())
    }

    /// Loads a definition saved with [`FunnelDefinition::save`].
    pub fn from_artifact_file(path: &str) -> Result<Self, DefinitionError> {
        let mut file = fs::File::open(path)
            .map_err(|e| DefinitionError::Io(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            DefinitionError::Io(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "funnel_id": "f1",
        "pages": [
            { "id": "done", "type": "thank_you", "order_index": 20 },
            { "id": "start", "type": "landing", "order_index": 0,
              "content": [{ "id": "email", "type": "input", "field": "email" }] }
        ],
        "rules": [
            { "id": "r1", "condition": { "field": "x", "operator": "equals", "value": 1 },
              "action": { "type": "navigate", "target": "done" } },
            { "id": "bad", "action": { "type": "explode" } }
        ]
    }"#;

    #[test]
    fn sorts_pages_and_skips_bad_rules() {
        let definition = FunnelDefinition::from_json(JSON).unwrap();
        assert_eq!(definition.pages[0].id, "start");
        assert_eq!(definition.rules.len(), 1);
        assert_eq!(definition.rules[0].id, "r1");
    }

    #[test]
    fn rejects_duplicate_page_ids() {
        let json = r#"{ "funnel_id": "f", "pages": [
            { "id": "a", "type": "form" }, { "id": "a", "type": "quiz" } ] }"#;
        assert!(matches!(
            FunnelDefinition::from_json(json),
            Err(DefinitionError::DuplicatePage(id)) if id == "a"
        ));
    }

    #[test]
    fn artifact_bytes_restore_the_definition() {
        let definition = FunnelDefinition::from_json(JSON).unwrap();
        let restored = FunnelDefinition::from_bytes(&definition.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, definition);
    }

    #[test]
    fn artifact_version_is_checked() {
        let artifact = FunnelArtifact {
            version: ARTIFACT_VERSION + 1,
            funnel_id: "f".to_string(),
            page_count: 0,
            rule_count: 0,
            body: "{}".to_string(),
        };
        let bytes = encode_to_vec(&artifact, standard()).unwrap();
        assert!(matches!(
            FunnelDefinition::from_bytes(&bytes),
            Err(DefinitionError::ArtifactVersion { found, .. }) if found == ARTIFACT_VERSION + 1
        ));
    }
}
