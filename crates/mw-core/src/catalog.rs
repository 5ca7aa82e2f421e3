//! Catalog normalization.
//!
//! Destinations and modifiers are only needed to resolve names. They are
//! loaded into a [`CatalogLookup`] first; activities are then resolved one at
//! a time into flat [`CatalogEntry`] rows.

use std::collections::HashMap;

use crate::definition::Definition;

/// One normalized activity from the reference catalog.
///
/// `modifier_ids` and `modifier_names` are index-aligned: an unresolved
/// modifier keeps its slot with an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub activity_id: i64,
    pub activity_name: String,
    pub destination_id: i64,
    pub destination_name: String,
    pub original_name: String,
    pub modifier_ids: Vec<i64>,
    pub modifier_names: Vec<String>,
}

/// Name lookup tables built from the destination and modifier definitions.
#[derive(Debug, Default)]
pub struct CatalogLookup {
    destinations: HashMap<i64, String>,
    modifiers: HashMap<i64, String>,
}

impl CatalogLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_destination(&mut self, definition: &Definition) {
        self.destinations.insert(
            definition.hash(),
            definition.name_or_original().to_string(),
        );
    }

    pub fn add_modifier(&mut self, definition: &Definition) {
        self.modifiers
            .insert(definition.hash(), definition.name().to_string());
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }

    /// Resolves an activity definition into a catalog row.
    ///
    /// Returns `None` for blank rows: no name and a zero identifier.
    pub fn resolve(&self, activity: &Definition) -> Option<CatalogEntry> {
        let activity_id = activity.hash();
        let activity_name = activity.name();
        if activity_name.is_empty() && activity_id == 0 {
            return None;
        }

        let destination_id = activity.destination_hash();
        let destination_name = self
            .destinations
            .get(&destination_id)
            .cloned()
            .unwrap_or_default();

        let modifier_ids = activity.modifier_hashes();
        let modifier_names = modifier_ids
            .iter()
            .map(|id| self.modifiers.get(id).cloned().unwrap_or_default())
            .collect();

        Some(CatalogEntry {
            activity_id,
            activity_name: activity_name.to_string(),
            destination_id,
            destination_name,
            original_name: activity.original_name().to_string(),
            modifier_ids,
            modifier_names,
        })
    }
}
