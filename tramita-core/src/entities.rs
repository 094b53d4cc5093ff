//! Core entity structures

use crate::{Centavos, ProceedingId, ProceedingKind, Role, Status, Timestamp};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque reference to a stored attachment (comprovante, generated PDF).
///
/// The bytes live behind the `AttachmentStore` collaborator; records carry
/// only these references, appended and never removed short of record
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Store-assigned key
    pub key: String,
    /// Original file name as uploaded
    pub name: String,
    pub stored_at: Timestamp,
}

/// One audit trail entry. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: Timestamp,
    /// Username of the acting user
    pub actor: String,
    pub description: String,
}

impl AuditEntry {
    pub fn new(actor: &str, description: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            actor: actor.to_string(),
            description: description.into(),
        }
    }
}

/// Payment plan parameters for a settlement not paid up front.
///
/// The concrete schedule is derived from these three parameters on demand;
/// it is never persisted row-by-row. Paid installments are "frozen" by
/// decrementing `installment_count` - the plan tracks the remaining count
/// only, not which specific installments were paid. Known limitation
/// inherited from the office's process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    /// Agreed total, in centavos
    pub total_amount: Centavos,
    /// Remaining installments, always >= 1
    pub installment_count: u32,
    /// Due date of the next installment's 30-day chain
    pub first_due_date: NaiveDate,
    /// Paid "à vista" - one lump sum, no schedule
    pub lump_sum: bool,
}

impl InstallmentPlan {
    pub fn new(total_amount: Centavos, installment_count: u32, first_due_date: NaiveDate) -> Self {
        Self {
            total_amount,
            installment_count: installment_count.max(1),
            first_due_date,
            lump_sum: false,
        }
    }

    /// Mark the plan as a lump-sum payment.
    pub fn lump_sum(mut self) -> Self {
        self.lump_sum = true;
        self
    }
}

/// A single legal proceeding of any of the four kinds.
///
/// Mutated exclusively through the transition engine or role-gated field
/// edits; `kind`, `id`, `created_by` and `created_at` never change after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proceeding {
    pub id: ProceedingId,
    pub kind: ProceedingKind,
    /// Free-text legal case identifier. Not guaranteed unique; duplicates
    /// are tolerated but logged.
    pub case_number: String,
    /// Kind-specific named attributes (claimant, tax id, bank, amounts...).
    /// Flat string columns - the store's textual format cannot represent
    /// true absence, hence the normalization in [`Proceeding::get_field`].
    pub party_fields: BTreeMap<String, String>,
    pub status: Status,
    pub created_by: String,
    pub created_at: Timestamp,
    pub last_updated_by: String,
    pub last_updated_at: Timestamp,
    /// Append-only attachment references
    pub attachments: Vec<AttachmentRef>,
    /// SmallClaim triage: SAC sub-track complete
    pub sac_done: bool,
    /// SmallClaim triage: administrative sub-track complete
    pub administrativo_done: bool,
    pub installment_plan: Option<InstallmentPlan>,
    /// Append-only; the engine writes here for Settlement proceedings
    pub audit_trail: Vec<AuditEntry>,
}

/// Values the textual store uses where a column is really absent.
const EMPTY_MARKERS: [&str; 3] = ["nan", "none", "null"];

/// Whether a stored value is one of the store's stand-ins for absence
/// (whitespace, "nan", "none", "null" in any case).
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || EMPTY_MARKERS
            .iter()
            .any(|m| trimmed.eq_ignore_ascii_case(m))
}

impl Proceeding {
    /// Create a proceeding in the given initial status.
    pub fn new(
        kind: ProceedingKind,
        initial_status: Status,
        case_number: &str,
        created_by: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_proceeding_id(),
            kind,
            case_number: case_number.to_string(),
            party_fields: BTreeMap::new(),
            status: initial_status,
            created_by: created_by.to_string(),
            created_at: now,
            last_updated_by: created_by.to_string(),
            last_updated_at: now,
            attachments: Vec::new(),
            sac_done: false,
            administrativo_done: false,
            installment_plan: None,
            audit_trail: Vec::new(),
        }
    }

    /// Set a party field.
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.party_fields.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the installment plan.
    pub fn with_plan(mut self, plan: InstallmentPlan) -> Self {
        self.installment_plan = Some(plan);
        self
    }

    /// Read a party field, normalizing store artifacts to `default`.
    ///
    /// The backing store round-trips through a textual format that cannot
    /// represent true absence: missing keys come back as empty strings or
    /// the literal markers "nan"/"none"/"null". All of those, in any case,
    /// collapse to the caller-supplied default.
    pub fn get_field<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        match self.party_fields.get(name) {
            Some(value) if !is_blank(value) => value,
            _ => default,
        }
    }

    /// Stamp the envelope after a mutation.
    pub fn touch(&mut self, actor: &str) {
        self.last_updated_by = actor.to_string();
        self.last_updated_at = Utc::now();
    }
}

/// Profile of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub role: Role,
}

/// Event handed to the external deletion-audit collaborator before a
/// record is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionEvent {
    pub proceeding_id: ProceedingId,
    pub kind: ProceedingKind,
    pub case_number: String,
    pub deleted_by: String,
    pub deleted_at: Timestamp,
}

// =============================================================================
// TESTS
// =============================================================================
