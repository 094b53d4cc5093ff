//! TRAMITA Storage - Store Contracts and In-Memory Implementations
//!
//! The core treats persistence and the other office collaborators as
//! external parties with small contracts: a flat table per proceeding
//! kind, an attachment bin, a deletion-audit log and an authenticator.
//! The in-memory implementations here back the tests and embedding
//! callers that do not bring their own adapters.
//!
//! Concurrency follows last-writer-wins with conflict detection: `load`
//! hands out a [`VersionToken`] (a content hash of the serialized table)
//! and `save` refuses to overwrite a table whose token moved. The core
//! never merges concurrent edits; a conflicted caller reloads and retries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tramita_core::{
    AttachmentRef, DeletionEvent, Proceeding, ProceedingKind, StoreError, UserProfile,
    VersionToken,
};

// ============================================================================
// CONTRACTS
// ============================================================================

/// A loaded table plus the token to present at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub records: Vec<Proceeding>,
    pub token: VersionToken,
}

/// Flat-table persistence, one table per proceeding kind.
pub trait RecordStore: Send + Sync {
    /// Load the full table for `kind` with its current version token.
    fn load(&self, kind: ProceedingKind) -> Result<TableSnapshot, StoreError>;

    /// Replace the table for `kind`, if `token` still matches the store.
    /// Returns the new token on success and `StoreError::Conflict` when a
    /// concurrent writer got there first.
    fn save(
        &self,
        kind: ProceedingKind,
        records: &[Proceeding],
        token: &VersionToken,
    ) -> Result<VersionToken, StoreError>;
}

/// Attachment (comprovante/PDF) storage.
pub trait AttachmentStore: Send + Sync {
    /// Store `bytes` under a fresh key, returning the reference to embed
    /// in the proceeding.
    fn store(&self, bytes: &[u8], name: &str) -> Result<AttachmentRef, StoreError>;
}

/// External deletion-audit collaborator. Called BEFORE a record is
/// removed; the removal may still fail afterwards.
pub trait DeletionLog: Send + Sync {
    fn record_deletion(&self, event: DeletionEvent) -> Result<(), StoreError>;
}

/// User authentication and role lookup.
pub trait Authenticator: Send + Sync {
    /// `Some(profile)` on valid credentials, `None` otherwise.
    fn authenticate(&self, username: &str, password: &str) -> Option<UserProfile>;
}

impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    fn load(&self, kind: ProceedingKind) -> Result<TableSnapshot, StoreError> {
        (**self).load(kind)
    }

    fn save(
        &self,
        kind: ProceedingKind,
        records: &[Proceeding],
        token: &VersionToken,
    ) -> Result<VersionToken, StoreError> {
        (**self).save(kind, records, token)
    }
}

impl<T: AttachmentStore + ?Sized> AttachmentStore for std::sync::Arc<T> {
    fn store(&self, bytes: &[u8], name: &str) -> Result<AttachmentRef, StoreError> {
        (**self).store(bytes, name)
    }
}

impl<T: DeletionLog + ?Sized> DeletionLog for std::sync::Arc<T> {
    fn record_deletion(&self, event: DeletionEvent) -> Result<(), StoreError> {
        (**self).record_deletion(event)
    }
}

/// Version token for a serialized table.
fn token_of(kind: ProceedingKind, records: &[Proceeding]) -> Result<VersionToken, StoreError> {
    let bytes = serde_json::to_vec(records).map_err(|e| StoreError::Backend {
        kind,
        reason: e.to_string(),
    })?;
    Ok(VersionToken::of(&bytes))
}

// ============================================================================
// IN-MEMORY RECORD STORE
// ============================================================================

/// In-memory [`RecordStore`] over `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<ProceedingKind, Vec<Proceeding>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently in `kind`'s table.
    pub fn record_count(&self, kind: ProceedingKind) -> usize {
        self.tables
            .read()
            .map(|t| t.get(&kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load(&self, kind: ProceedingKind) -> Result<TableSnapshot, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        let records = tables.get(&kind).cloned().unwrap_or_default();
        let token = token_of(kind, &records)?;
        Ok(TableSnapshot { records, token })
    }

    fn save(
        &self,
        kind: ProceedingKind,
        records: &[Proceeding],
        token: &VersionToken,
    ) -> Result<VersionToken, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        let current = tables.get(&kind).cloned().unwrap_or_default();
        let current_token = token_of(kind, &current)?;
        if current_token != *token {
            return Err(StoreError::Conflict { kind });
        }
        let new_token = token_of(kind, records)?;
        tables.insert(kind, records.to_vec());
        Ok(new_token)
    }
}

// ============================================================================
// IN-MEMORY ATTACHMENT STORE
// ============================================================================

/// In-memory [`AttachmentStore`] with sequential keys.
#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    bin: RwLock<HashMap<String, Vec<u8>>>,
    next_key: AtomicU64,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored bytes for `key`, for test assertions.
    pub fn fetch(&self, key: &str) -> Option<Vec<u8>> {
        self.bin.read().ok()?.get(key).cloned()
    }
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn store(&self, bytes: &[u8], name: &str) -> Result<AttachmentRef, StoreError> {
        let seq = self.next_key.fetch_add(1, Ordering::SeqCst);
        let key = format!("att-{seq:06}");
        let mut bin = self.bin.write().map_err(|_| StoreError::LockPoisoned)?;
        bin.insert(key.clone(), bytes.to_vec());
        Ok(AttachmentRef {
            key,
            name: name.to_string(),
            stored_at: chrono::Utc::now(),
        })
    }
}

// ============================================================================
// RECORDING DELETION LOG
// ============================================================================

/// [`DeletionLog`] that keeps every event, in order, for inspection.
#[derive(Debug, Default)]
pub struct RecordingDeletionLog {
    events: RwLock<Vec<DeletionEvent>>,
}

impl RecordingDeletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeletionEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }
}

impl DeletionLog for RecordingDeletionLog {
    fn record_deletion(&self, event: DeletionEvent) -> Result<(), StoreError> {
        let mut events = self.events.write().map_err(|_| StoreError::LockPoisoned)?;
        events.push(event);
        Ok(())
    }
}

/// [`DeletionLog`] that records the call and then reports failure.
/// Exercises the audit-first ordering contract in tests.
#[derive(Debug, Default)]
pub struct FailingAfterRecordLog {
    inner: RecordingDeletionLog,
}

impl FailingAfterRecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeletionEvent> {
        self.inner.events()
    }
}

impl DeletionLog for FailingAfterRecordLog {
    fn record_deletion(&self, event: DeletionEvent) -> Result<(), StoreError> {
        let kind = event.kind;
        self.inner.record_deletion(event)?;
        Err(StoreError::Backend {
            kind,
            reason: "deletion log unavailable".to_string(),
        })
    }
}

// ============================================================================
// IN-MEMORY AUTHENTICATOR
// ============================================================================

/// [`Authenticator`] over a fixed user table.
#[derive(Debug, Default)]
pub struct InMemoryAuthenticator {
    users: HashMap<String, (String, UserProfile)>,
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user.
    pub fn with_user(mut self, profile: UserProfile, password: &str) -> Self {
        self.users.insert(
            profile.username.clone(),
            (password.to_string(), profile),
        );
        self
    }
}

impl Authenticator for InMemoryAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Option<UserProfile> {
        match self.users.get(username) {
            Some((stored, profile)) if stored == password => Some(profile.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
