//! Raw manifest definitions.
//!
//! The manifest ships every definition as an `(id, json)` row. Only a handful
//! of fields matter to the cache, and any of them may be missing or `null` in
//! a given row, so decoding never fails. A field of the wrong type is treated
//! as absent; a row that is not JSON at all degrades to an empty
//! [`Definition`].

use std::fmt;

use serde::Deserialize;

use crate::lenient;

/// The manifest tables the catalog is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionTable {
    Destination,
    ActivityModifier,
    Activity,
}

impl DefinitionTable {
    /// Name of the table inside the manifest database.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Destination => "DestinyDestinationDefinition",
            Self::ActivityModifier => "DestinyActivityModifierDefinition",
            Self::Activity => "DestinyActivityDefinition",
        }
    }

    /// All tables, in the order the catalog reads them.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Destination, Self::ActivityModifier, Self::Activity]
    }
}

impl fmt::Display for DefinitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

/// A manifest row as stored: an opaque identifier and its JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDefinition {
    pub id: i64,
    pub json: String,
}

impl RawDefinition {
    pub fn new(id: i64, json: impl Into<String>) -> Self {
        Self {
            id,
            json: json.into(),
        }
    }
}

/// The subset of a definition payload the catalog cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Definition {
    #[serde(deserialize_with = "lenient::field")]
    pub hash: Option<i64>,
    #[serde(deserialize_with = "lenient::field")]
    pub display_properties: Option<DisplayProperties>,
    #[serde(deserialize_with = "lenient::field")]
    pub original_display_properties: Option<DisplayProperties>,
    #[serde(deserialize_with = "lenient::field")]
    pub destination_hash: Option<i64>,
    #[serde(deserialize_with = "lenient::seq")]
    pub modifiers: Option<Vec<Option<ModifierRef>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayProperties {
    #[serde(deserialize_with = "lenient::field")]
    pub name: Option<String>,
}

/// Reference from an activity to one of its modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModifierRef {
    #[serde(deserialize_with = "lenient::field")]
    pub activity_modifier_hash: Option<i64>,
}

impl Definition {
    /// Decodes a manifest row, substituting an empty definition for
    /// unreadable payloads.
    pub fn decode(raw: &RawDefinition) -> Self {
        match serde_json::from_str(&raw.json) {
            Ok(definition) => definition,
            Err(err) => {
                tracing::warn!(id = raw.id, error = %err, "unreadable definition payload");
                Self::default()
            }
        }
    }

    pub fn hash(&self) -> i64 {
        self.hash.unwrap_or_default()
    }

    /// The primary display name, empty when absent.
    pub fn name(&self) -> &str {
        display_name(self.display_properties.as_ref())
    }

    /// The original display name, empty when absent.
    pub fn original_name(&self) -> &str {
        display_name(self.original_display_properties.as_ref())
    }

    /// The display name, falling back to the original name when the primary
    /// one is missing or empty.
    pub fn name_or_original(&self) -> &str {
        let name = self.name();
        if name.is_empty() {
            self.original_name()
        } else {
            name
        }
    }

    pub fn destination_hash(&self) -> i64 {
        self.destination_hash.unwrap_or_default()
    }

    /// Modifier identifiers in source order. Unreadable references and
    /// references without a hash keep their slot as `0`.
    pub fn modifier_hashes(&self) -> Vec<i64> {
        self.modifiers
            .iter()
            .flatten()
            .map(|modifier| {
                modifier
                    .as_ref()
                    .and_then(|modifier| modifier.activity_modifier_hash)
                    .unwrap_or_default()
            })
            .collect()
    }
}

fn display_name(properties: Option<&DisplayProperties>) -> &str {
    properties
        .and_then(|properties| properties.name.as_deref())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_activity_payload() {
        let raw = RawDefinition::new(
            -12,
            r#"{
                "hash": 100,
                "displayProperties": {"name": "Vault"},
                "originalDisplayProperties": {"name": "Vault of Glass"},
                "destinationHash": 9,
                "modifiers": [{"activityModifierHash": 7}, {"activityModifierHash": 8}]
            }"#,
        );
        let definition = Definition::decode(&raw);

        assert_eq!(definition.hash(), 100);
        assert_eq!(definition.name(), "Vault");
        assert_eq!(definition.original_name(), "Vault of Glass");
        assert_eq!(definition.destination_hash(), 9);
        assert_eq!(definition.modifier_hashes(), vec![7, 8]);
    }

    #[test]
    fn missing_and_null_fields_default() {
        let raw = RawDefinition::new(
            1,
            r#"{"displayProperties": {"name": null}, "modifiers": [{}]}"#,
        );
        let definition = Definition::decode(&raw);

        assert_eq!(definition.hash(), 0);
        assert_eq!(definition.name(), "");
        assert_eq!(definition.destination_hash(), 0);
        assert_eq!(definition.modifier_hashes(), vec![0]);
    }

    #[test]
    fn wrong_typed_fields_only_lose_themselves() {
        let raw = RawDefinition::new(
            4,
            r#"{
                "hash": 100,
                "displayProperties": {"name": "Vault"},
                "destinationHash": "9",
                "modifiers": [{"activityModifierHash": 7}, "bogus", {"activityModifierHash": "8"}]
            }"#,
        );
        let definition = Definition::decode(&raw);

        assert_eq!(definition.hash(), 100);
        assert_eq!(definition.name(), "Vault");
        assert_eq!(definition.destination_hash(), 0);
        assert_eq!(definition.modifier_hashes(), vec![7, 0, 0]);
    }

    #[test]
    fn wrong_typed_display_properties_fall_back_to_original() {
        let raw = RawDefinition::new(
            5,
            r#"{"hash": 3, "displayProperties": "Moon", "originalDisplayProperties": {"name": "Luna"}}"#,
        );
        let definition = Definition::decode(&raw);

        assert_eq!(definition.name(), "");
        assert_eq!(definition.name_or_original(), "Luna");
    }

    #[test]
    fn unreadable_payload_degrades_to_empty() {
        let raw = RawDefinition::new(1, "not json");
        assert_eq!(Definition::decode(&raw), Definition::default());
    }

    #[test]
    fn name_falls_back_to_original() {
        let raw = RawDefinition::new(
            1,
            r#"{"hash": 3, "displayProperties": {"name": ""}, "originalDisplayProperties": {"name": "Luna"}}"#,
        );
        assert_eq!(Definition::decode(&raw).name_or_original(), "Luna");
    }
}
