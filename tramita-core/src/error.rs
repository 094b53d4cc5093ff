//! Error types for TRAMITA operations
//!
//! Business-rule rejections (bad role, missing payload field, unsatisfied
//! guard) are NOT errors - the engine returns those as values. The enums
//! here cover the failures that abort an operation: store trouble, invalid
//! input at creation, corrupt stored data, authentication.

use crate::{ProceedingId, ProceedingKind, Status};
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Proceeding not found: {kind:?} with id {id}")]
    NotFound { kind: ProceedingKind, id: ProceedingId },

    #[error("Version conflict on {kind:?} table: store moved past the presented token")]
    Conflict { kind: ProceedingKind },

    #[error("Backend failure on {kind:?} table: {reason}")]
    Backend { kind: ProceedingKind, reason: String },

    #[error("Attachment store failure: {reason}")]
    Attachment { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors raised at creation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Every blank minimum field, reported together.
    #[error("Required fields missing: {}", fields.join(", "))]
    RequiredFieldsMissing { fields: Vec<String> },
}

/// Programming-error-class failures inside the workflow interpreter.
///
/// These indicate corrupt stored data or a graph/entity mismatch, never an
/// ordinary business-rule violation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Status {status} is not a state of the {kind:?} workflow")]
    StatusOutsideGraph { kind: ProceedingKind, status: Status },

    #[error("{kind:?} proceeding {id} has no installment plan but the edge requires one")]
    MissingPlan { kind: ProceedingKind, id: ProceedingId },
}

/// Authorization errors. Failed authentication is not an error: the
/// `Authenticator` contract answers with `None`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Role {role} may not {action}")]
    PermissionDenied { role: String, action: String },
}

/// Master error type for all TRAMITA errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TramitaError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

/// Result type alias for TRAMITA operations.
pub type TramitaResult<T> = Result<T, TramitaError>;

// =============================================================================
// TESTS
// =============================================================================
