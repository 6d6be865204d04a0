//! Use cases - action resolution user stories.
//!
//! Each module covers one concern of resolving a tabletop action; the
//! `action` module ties them together into the execution pipeline.

pub mod action;
pub mod checks;
pub mod costs;
pub mod ledger;
pub mod loadout;
pub mod scrape;
