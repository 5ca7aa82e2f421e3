//! Turning joined schedule/catalog rows into reportable matches.

use crate::classify::{Category, classify, significant_modifiers};
use crate::window::UpcomingWindow;

/// Separator line between rendered match blocks.
pub const SEPARATOR: &str = "------------------------------";

/// A scheduled occurrence joined with its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledActivity {
    pub event_id: i64,
    pub activity_name: String,
    pub destination_name: String,
    pub modifier_names: Vec<String>,
    pub start_time: String,
    pub end_time: String,
}

/// An upcoming activity that matched a classification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub activity_name: String,
    pub destination_name: String,
    pub modifier_names: Vec<String>,
    pub category: Category,
}

impl MatchRecord {
    /// Renders the record as a short text block.
    pub fn render(&self) -> String {
        format!(
            "{}: {}\nDestination: {}\nModifiers: {}",
            self.category,
            self.activity_name,
            self.destination_name,
            self.modifier_names.join(", ")
        )
    }
}

/// Keeps rows inside the window that classify, preserving input order.
pub fn match_activities<I>(rows: I, window: &UpcomingWindow) -> Vec<MatchRecord>
where
    I: IntoIterator<Item = ScheduledActivity>,
{
    rows.into_iter()
        .filter(|row| {
            let admitted = window.admits(&row.start_time, &row.end_time);
            if !admitted {
                tracing::trace!(
                    event_id = row.event_id,
                    activity = %row.activity_name,
                    "outside upcoming window"
                );
            }
            admitted
        })
        .filter_map(|row| {
            let Some(category) = classify(&row.modifier_names) else {
                tracing::trace!(
                    event_id = row.event_id,
                    activity = %row.activity_name,
                    "no classification rule matched"
                );
                return None;
            };
            let modifier_names = significant_modifiers(&row.modifier_names)
                .into_iter()
                .map(str::to_string)
                .collect();
            Some(MatchRecord {
                activity_name: row.activity_name,
                destination_name: row.destination_name,
                modifier_names,
                category,
            })
        })
        .collect()
}

/// Joins rendered blocks with [`SEPARATOR`]. Empty when there are no records.
pub fn render_matches(records: &[MatchRecord]) -> String {
    records
        .iter()
        .map(MatchRecord::render)
        .collect::<Vec<_>>()
        .join(&format!("\n{SEPARATOR}\n"))
}
