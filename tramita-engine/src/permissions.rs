//! Role/permission resolution
//!
//! Static table lookups, no dynamic policy. Transition permissions are
//! read straight off the graph tables (the edge allow-lists are the source
//! of truth); field-edit permissions are a small table of their own.
//! Anything the tables do not name is denied.

use crate::graph::graph_for;
use tramita_core::{ProceedingKind, Role, Status, Transition};

/// Whether `role` may fire `transition` anywhere in `kind`'s graph.
///
/// Developer passes everything. This answers "is the role ever allowed on
/// this edge" - the engine still checks the current status when the
/// transition is actually attempted.
pub fn can_transition(role: Role, kind: ProceedingKind, transition: Transition) -> bool {
    if role == Role::Developer {
        return graph_for(kind)
            .edges
            .iter()
            .any(|e| e.transition == transition);
    }
    graph_for(kind)
        .edges
        .iter()
        .any(|e| e.transition == transition && e.roles.contains(&role))
}

/// Party fields the finance desk owns.
const FINANCE_FIELDS: &[&str] = &["total_amount", "amount", "bank", "agency", "account"];

/// Party fields the administrative desk owns.
const ADMIN_FIELDS: &[&str] = &["subject", "judicial_body", "benefit_number"];

/// Party fields the SAC desk owns.
const SAC_FIELDS: &[&str] = &["contact_phone", "contact_notes"];

/// Statuses where the finance desk is working the record.
const FINANCE_STAGES: &[Status] = &[
    Status::EnviadoFinanceiro,
    Status::FinanceiroEnviadoAprovacao,
    Status::ValidacaoFinanceiro,
    Status::EnviadoAprovacao,
    Status::AguardandoPagamento,
];

/// Statuses where the administrative desk is working the record.
const ADMIN_STAGES: &[Status] = &[
    Status::Triagem,
    Status::EnviadoAdministrativo,
    Status::Implantado,
];

/// Statuses where SAC is working the record.
const SAC_STAGES: &[Status] = &[Status::Triagem, Status::EnviadoSac, Status::ContatoSac];

/// Whether `role` may directly edit `field` while the proceeding sits at
/// `status`.
///
/// Cadastrador may edit any party field but only while the record is still
/// in its kind's initial state; the desk roles edit their own fields at
/// their own stages; Developer edits anything anywhere. Terminal states
/// are frozen for everyone but Developer.
pub fn can_edit_field(role: Role, kind: ProceedingKind, field: &str, status: Status) -> bool {
    let graph = graph_for(kind);
    match role {
        Role::Developer => true,
        _ if graph.is_terminal(status) => false,
        Role::Cadastrador => status == graph.initial,
        Role::Financeiro => FINANCE_FIELDS.contains(&field) && FINANCE_STAGES.contains(&status),
        Role::Administrativo => ADMIN_FIELDS.contains(&field) && ADMIN_STAGES.contains(&status),
        Role::Sac => SAC_FIELDS.contains(&field) && SAC_STAGES.contains(&status),
    }
}

// ============================================================================
// TESTS
// ============================================================================
