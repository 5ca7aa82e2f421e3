//! Core domain logic for the milestone watcher.
//!
//! This crate contains the pure parts of the pipeline:
//! - Definitions: decoding raw manifest rows
//! - Catalog: resolving activities against destination and modifier names
//! - Schedule: flattening the live milestone feed
//! - Matching: the rolling window, classification rules and report rendering

pub mod catalog;
pub mod classify;
pub mod definition;
mod lenient;
pub mod matcher;
pub mod schedule;
pub mod window;

pub use catalog::{CatalogEntry, CatalogLookup};
pub use classify::{Category, classify};
pub use definition::{Definition, DefinitionTable, RawDefinition};
pub use matcher::{MatchRecord, SEPARATOR, ScheduledActivity, match_activities, render_matches};
pub use schedule::{
    MalformedEvent, MilestoneFeed, ScheduleEntry, ScheduledEvent, extract, live_event_ids,
};
pub use window::{LOOKAHEAD_DAYS, UpcomingWindow, parse_feed_timestamp};
