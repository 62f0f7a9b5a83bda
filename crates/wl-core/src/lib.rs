//! Document engine for the plain-text work log.
//!
//! This crate contains the fundamental types and logic for:
//! - Parsing: turning log text into a lossless document tree and back
//! - Interpretation: deriving work intervals with alias resolution
//! - Aggregation: flattening intervals into chargeable items and totals
//! - Editing: start, stop, time, delete, issue and comment operations
//! - Submission: pushing totals to a worklog ledger and marking them done

pub mod aggregate;
pub mod config;
pub mod editor;
mod error;
pub mod grammar;
pub mod interpreter;
pub mod ledger;
mod parser;
mod serializer;
pub mod timeexpr;
pub mod tree;
pub mod types;

pub use aggregate::{
    ChargeItem, IssueTotal, aggregate_all, aggregate_uncommitted, chargeable_items,
    dedupe_comments, flatten,
};
pub use config::DocumentConfig;
pub use editor::{EditError, Editor, Outcome, StartRequest, Warning};
pub use error::SyntaxError;
pub use interpreter::{Log, interpret, running};
pub use ledger::{Ledger, SkipReason, Submission, SubmissionOutcome, submit_all};
pub use parser::{ParseState, parse};
pub use serializer::{render, serialize};
pub use timeexpr::{TimeError, format_minutes, parse_duration, parse_time};
pub use tree::{Document, NodeId, NodeKind};
pub use types::{IssueKey, ValidationError};
