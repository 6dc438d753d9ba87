//! State management for merged revision histories
//!
//! This module contains the revision aggregate, the display filter settings and the
//! per-editor summaries derived from them.

mod revisions;
mod settings;
mod summary;

pub use revisions::{Editor, MergeReport, Revision, RevisionAggregate, RevisionAggregateState};
pub use settings::DataSettings;
pub use summary::{summarize_editors, EditorSummary};
