//! TRAMITA Engine - Workflow Interpreter
//!
//! One generic interpreter drives all four proceeding workflows. Each kind
//! contributes a static graph table (states, edges, guards, effects); the
//! engine validates a requested transition against the table and produces
//! a new proceeding value or a typed rejection. The installment scheduler
//! and the role/permission tables live here too - everything that reads the
//! graph tables.
//!
//! # Modules
//!
//! - [`graph`]: the per-kind workflow tables
//! - [`engine`]: `apply_transition` and the rejection taxonomy
//! - [`schedule`]: due-date computation and payment registration
//! - [`permissions`]: `can_transition` / `can_edit_field` lookups
//! - [`query`]: stable AND-combined filtering over record sets

pub mod engine;
pub mod graph;
pub mod permissions;
pub mod query;
pub mod schedule;

pub use engine::{apply_transition, Rejection, Renegotiation, TransitionOutcome, TransitionPayload};
pub use graph::{graph_for, EdgeDef, EdgeSource, EdgeTarget, Effect, Guard, WorkflowGraph};
pub use permissions::{can_edit_field, can_transition};
pub use query::filter_records;
pub use schedule::{compute_schedule, register_payment, Installment, PaymentResolution};
