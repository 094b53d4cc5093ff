//! TRAMITA Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic: the workflow
//! interpreter lives in `tramita-engine`, persistence contracts in
//! `tramita-storage`.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;

pub use entities::{
    is_blank, AttachmentRef, AuditEntry, DeletionEvent, InstallmentPlan, Proceeding, UserProfile,
};
pub use enums::{
    KindParseError, ProceedingKind, Role, RoleParseError, Status, StatusParseError, Transition,
    TransitionParseError,
};
pub use error::{
    AuthError, EngineError, StoreError, TramitaError, TramitaResult, ValidationError,
};
pub use filter::{DateRange, RecordFilter, TextMatch};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Proceeding identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type ProceedingId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Monetary amount in centavos. All arithmetic on amounts is integral.
pub type Centavos = i64;

/// SHA-256 content hash over a serialized table snapshot.
/// Used as the optimistic-concurrency version token at the store boundary.
pub type ContentHash = [u8; 32];

/// Generate a new UUIDv7 ProceedingId (timestamp-sortable).
pub fn new_proceeding_id() -> ProceedingId {
    Uuid::now_v7()
}

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

// ============================================================================
// VERSION TOKEN
// ============================================================================

/// Opaque token identifying the backing store's state at load time.
///
/// Compared on save to detect concurrent writers (last-writer-wins with
/// conflict detection, never merging).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct VersionToken(pub ContentHash);

impl VersionToken {
    /// Derive the token for a serialized table snapshot.
    pub fn of(content: &[u8]) -> Self {
        Self(compute_content_hash(content))
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
