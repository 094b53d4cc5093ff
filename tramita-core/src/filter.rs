//! Filter expressions for proceeding queries
//!
//! Pure data - the evaluator lives in `tramita-engine::query`. A
//! `RecordFilter` combines up to three predicates with logical AND:
//! status equality, case-insensitive substring search over a configured
//! field list, and inclusive date bounds on a designated date field.

use crate::Status;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Case-insensitive substring search over named party fields.
///
/// `case_number` is always searched in addition to the listed fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMatch {
    pub needle: String,
    /// Party fields to search
    pub fields: Vec<String>,
}

impl TextMatch {
    pub fn new(needle: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            needle: needle.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Inclusive date bounds on a designated textual date field (ISO dates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateBounds {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Date-range predicate on one party field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Party field holding the date, e.g. "due_date"
    pub field: String,
    pub bounds: DateBounds,
}

impl DateRange {
    pub fn new(field: impl Into<String>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            field: field.into(),
            bounds: DateBounds { from, to },
        }
    }
}

/// Combined filter over an in-memory record set. All present predicates
/// must hold (logical AND); absent predicates match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub status: Option<Status>,
    pub text: Option<TextMatch>,
    pub date_range: Option<DateRange>,
}

impl RecordFilter {
    /// Filter by status only.
    pub fn by_status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Add a text predicate.
    pub fn with_text(mut self, text: TextMatch) -> Self {
        self.text = Some(text);
        self
    }

    /// Add a date-range predicate.
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }
}
