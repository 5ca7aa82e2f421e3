//! Schedule extraction from the live milestone feed.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::lenient;

/// The live feed: milestone payloads keyed by their stringified identifier.
pub type MilestoneFeed = BTreeMap<String, Value>;

/// An event whose parallel arrays disagree in length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event {event_id} has {activities} activities but {modifier_groups} modifier groups")]
pub struct MalformedEvent {
    pub event_id: i64,
    pub activities: usize,
    pub modifier_groups: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Milestone {
    #[serde(deserialize_with = "lenient::field")]
    milestone_hash: Option<i64>,
    #[serde(deserialize_with = "lenient::field")]
    start_date: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    end_date: Option<String>,
    #[serde(deserialize_with = "lenient::seq")]
    activities: Option<Vec<Option<MilestoneActivity>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MilestoneActivity {
    #[serde(deserialize_with = "lenient::field")]
    activity_hash: Option<i64>,
    #[serde(deserialize_with = "lenient::seq")]
    modifier_hashes: Option<Vec<Option<i64>>>,
}

/// One live event with its activities flattened into parallel arrays.
///
/// `activity_ids[i]` runs with the modifiers in `modifier_id_groups[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub event_id: i64,
    pub start_time: String,
    pub end_time: String,
    pub activity_ids: Vec<i64>,
    pub modifier_id_groups: Vec<Vec<i64>>,
}

/// One `(event, activity, modifier set)` occurrence, ready for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub event_id: i64,
    pub activity_id: i64,
    pub modifier_ids: Vec<i64>,
    pub start_time: String,
    pub end_time: String,
}

impl ScheduledEvent {
    /// Pairs each activity with its modifier group.
    pub fn entries(&self) -> Result<Vec<ScheduleEntry>, MalformedEvent> {
        if self.activity_ids.len() != self.modifier_id_groups.len() {
            return Err(MalformedEvent {
                event_id: self.event_id,
                activities: self.activity_ids.len(),
                modifier_groups: self.modifier_id_groups.len(),
            });
        }
        Ok(self
            .activity_ids
            .iter()
            .zip(&self.modifier_id_groups)
            .map(|(activity_id, modifier_ids)| ScheduleEntry {
                event_id: self.event_id,
                activity_id: *activity_id,
                modifier_ids: modifier_ids.clone(),
                start_time: self.start_time.clone(),
                end_time: self.end_time.clone(),
            })
            .collect())
    }
}

/// Flattens the live feed into one [`ScheduledEvent`] per milestone.
///
/// Missing or wrong-typed fields default to empty strings, zero or empty
/// lists; the rest of the milestone is kept.
pub fn extract(feed: &MilestoneFeed) -> Vec<ScheduledEvent> {
    feed.iter()
        .map(|(key, payload)| {
            let milestone = decode_milestone(key, payload);
            let (activity_ids, modifier_id_groups): (Vec<i64>, Vec<Vec<i64>>) = milestone
                .activities
                .unwrap_or_default()
                .into_iter()
                .map(|activity| {
                    let activity = activity.unwrap_or_default();
                    let modifier_ids: Vec<i64> = activity
                        .modifier_hashes
                        .unwrap_or_default()
                        .into_iter()
                        .map(Option::unwrap_or_default)
                        .collect();
                    (activity.activity_hash.unwrap_or_default(), modifier_ids)
                })
                .unzip();
            ScheduledEvent {
                event_id: event_id(key, milestone.milestone_hash),
                start_time: milestone.start_date.unwrap_or_default(),
                end_time: milestone.end_date.unwrap_or_default(),
                activity_ids,
                modifier_id_groups,
            }
        })
        .collect()
}

/// Distinct event identifiers present in the live feed.
pub fn live_event_ids(feed: &MilestoneFeed) -> BTreeSet<i64> {
    feed.iter()
        .map(|(key, payload)| {
            let milestone_hash = payload.get("milestoneHash").and_then(Value::as_i64);
            event_id(key, milestone_hash)
        })
        .collect()
}

fn decode_milestone(key: &str, payload: &Value) -> Milestone {
    match Milestone::deserialize(payload) {
        Ok(milestone) => milestone,
        Err(err) => {
            tracing::warn!(event = key, error = %err, "unreadable milestone payload");
            Milestone::default()
        }
    }
}

fn event_id(key: &str, milestone_hash: Option<i64>) -> i64 {
    key.trim()
        .parse()
        .ok()
        .or(milestone_hash)
        .unwrap_or_default()
}
