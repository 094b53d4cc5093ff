//! The status transition engine
//!
//! One pure interpreter over the per-kind graph tables. Given a
//! proceeding, a requested transition, the acting user and a payload, it
//! either produces a NEW proceeding value (the input is never mutated) or
//! a typed rejection. Business-rule violations are values; only corrupt
//! stored data escalates to [`EngineError`].

use crate::graph::{graph_for, EdgeDef, EdgeTarget, Effect, Guard};
use crate::schedule::{register_payment, PaymentResolution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tramita_core::{
    is_blank, AttachmentRef, AuditEntry, Centavos, EngineError, InstallmentPlan, Proceeding,
    ProceedingKind, Role, Status, Transition, UserProfile,
};

/// Renegotiation terms supplied with `MarcarNaoCumprido` to divert a
/// defaulted settlement to Renegociado instead of NaoCumprido.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renegotiation {
    pub new_plan: InstallmentPlan,
    pub terms: String,
}

/// Data accompanying a transition attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionPayload {
    /// Party fields to merge into the proceeding on success
    pub fields: BTreeMap<String, String>,
    /// Comprovante or other attachment, required by some edges
    pub attachment: Option<AttachmentRef>,
    /// Only read by `MarcarNaoCumprido`
    pub renegotiation: Option<Renegotiation>,
    /// Only read by `AtualizarValor`
    pub new_total: Option<Centavos>,
}

impl TransitionPayload {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_attachment(mut self, attachment: AttachmentRef) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_renegotiation(mut self, renegotiation: Renegotiation) -> Self {
        self.renegotiation = Some(renegotiation);
        self
    }

    pub fn with_new_total(mut self, new_total: Centavos) -> Self {
        self.new_total = Some(new_total);
        self
    }
}

/// Why a transition attempt was turned down.
///
/// Every variant carries a stable machine-readable tag (see
/// [`Rejection::tag`]) alongside the human-readable `Display` text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("No transition {transition} out of status {status}")]
    NoSuchTransition { transition: Transition, status: Status },

    #[error("Role {role} is not allowed to fire {transition}")]
    Unauthorized { role: Role, transition: Transition },

    #[error("Required field missing from payload: {field}")]
    MissingField { field: String },

    #[error("Guard not satisfied: {incomplete} sub-track still open")]
    GuardNotSatisfied { incomplete: String },
}

impl Rejection {
    /// Stable machine-readable reason tag.
    pub fn tag(&self) -> String {
        match self {
            Rejection::NoSuchTransition { .. } => "NoSuchTransition".to_string(),
            Rejection::Unauthorized { .. } => "Unauthorized".to_string(),
            Rejection::MissingField { field } => format!("MissingField:{field}"),
            Rejection::GuardNotSatisfied { .. } => "GuardNotSatisfied".to_string(),
        }
    }
}

/// Outcome of a transition attempt that did not hit corrupt data.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// The transition fired; here is the resulting proceeding
    Applied(Box<Proceeding>),
    /// Turned down for a business-rule reason
    Rejected(Rejection),
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }

    /// The new proceeding, if the transition fired.
    pub fn applied(self) -> Option<Proceeding> {
        match self {
            TransitionOutcome::Applied(p) => Some(*p),
            TransitionOutcome::Rejected(_) => None,
        }
    }

    /// The rejection, if the transition was turned down.
    pub fn rejected(self) -> Option<Rejection> {
        match self {
            TransitionOutcome::Applied(_) => None,
            TransitionOutcome::Rejected(r) => Some(r),
        }
    }
}

fn rejected(rejection: Rejection) -> Result<TransitionOutcome, EngineError> {
    Ok(TransitionOutcome::Rejected(rejection))
}

/// Attempt a transition.
///
/// Validation order: edge exists from the current status, acting role is
/// on the edge's allow-list (Developer always passes), payload carries the
/// edge's required fields and attachment, guard holds. On success the
/// returned proceeding has the target status, a stamped envelope, payload
/// fields merged in, the attachment appended, the edge's effect applied
/// and - for Settlement - an audit entry.
///
/// Re-applying a successful transition is NOT idempotent: each application
/// appends audit entries and payment registration mutates the remaining
/// installment count.
pub fn apply_transition(
    proceeding: &Proceeding,
    transition: Transition,
    actor: &UserProfile,
    payload: &TransitionPayload,
) -> Result<TransitionOutcome, EngineError> {
    let graph = graph_for(proceeding.kind);
    if !graph.contains(proceeding.status) {
        return Err(EngineError::StatusOutsideGraph {
            kind: proceeding.kind,
            status: proceeding.status,
        });
    }

    let edge = match graph
        .outgoing(proceeding.status)
        .find(|e| e.transition == transition)
    {
        Some(edge) => edge,
        None => {
            return rejected(Rejection::NoSuchTransition {
                transition,
                status: proceeding.status,
            })
        }
    };

    if actor.role != Role::Developer && !edge.roles.contains(&actor.role) {
        return rejected(Rejection::Unauthorized {
            role: actor.role,
            transition,
        });
    }

    if let Some(missing) = missing_payload_field(edge, payload) {
        return rejected(Rejection::MissingField { field: missing });
    }

    if let Some(Guard::TriagemComplete) = edge.guard {
        if let Some(incomplete) = incomplete_triage_track(proceeding) {
            return rejected(Rejection::GuardNotSatisfied { incomplete });
        }
    }

    // Settlement records carry a plan from creation, so a missing plan
    // there is corrupt data and escalates inside the effect. Kinds where
    // the plan is optional get an ordinary rejection instead.
    if edge.effect == Some(Effect::RegisterPayment)
        && proceeding.kind != ProceedingKind::Settlement
        && proceeding.installment_plan.is_none()
    {
        return rejected(Rejection::MissingField {
            field: "installment_plan".to_string(),
        });
    }

    let mut next = proceeding.clone();
    for (name, value) in &payload.fields {
        next.party_fields.insert(name.clone(), value.clone());
    }
    if let Some(attachment) = &payload.attachment {
        next.attachments.push(attachment.clone());
    }

    let applied = run_effect(edge, &mut next, payload)?;
    let target = match edge.to {
        EdgeTarget::State(status) => status,
        EdgeTarget::Unchanged => next.status,
        EdgeTarget::FromEffect => applied.target.unwrap_or(next.status),
    };
    let previous = next.status;
    next.status = target;
    next.touch(&actor.username);

    if next.kind == ProceedingKind::Settlement {
        let mut description = format!("{transition}: {previous} -> {target}");
        if let Some(note) = applied.note {
            description.push_str(" (");
            description.push_str(&note);
            description.push(')');
        }
        next.audit_trail
            .push(AuditEntry::new(&actor.username, description));
    }

    Ok(TransitionOutcome::Applied(Box::new(next)))
}

/// First required payload field that is absent, if any.
fn missing_payload_field(edge: &EdgeDef, payload: &TransitionPayload) -> Option<String> {
    for field in edge.required_fields {
        match payload.fields.get(*field) {
            Some(value) if !is_blank(value) => {}
            _ => return Some(field.to_string()),
        }
    }
    if edge.requires_attachment && payload.attachment.is_none() {
        return Some("comprovante".to_string());
    }
    if edge.effect == Some(Effect::AmendTotal) && payload.new_total.is_none() {
        return Some("new_total".to_string());
    }
    None
}

/// Which triage sub-track is still open, named for the rejection message.
fn incomplete_triage_track(proceeding: &Proceeding) -> Option<String> {
    match (proceeding.sac_done, proceeding.administrativo_done) {
        (true, true) => None,
        (false, true) => Some("SAC".to_string()),
        (true, false) => Some("Administrativo".to_string()),
        (false, false) => Some("SAC and Administrativo".to_string()),
    }
}

/// What running an edge effect produced: an optional target status (for
/// `EdgeTarget::FromEffect` edges) and an optional note folded into the
/// Settlement audit entry.
#[derive(Debug, Default)]
struct AppliedEffect {
    target: Option<Status>,
    note: Option<String>,
}

/// Apply the edge's effect to the cloned proceeding.
fn run_effect(
    edge: &EdgeDef,
    next: &mut Proceeding,
    payload: &TransitionPayload,
) -> Result<AppliedEffect, EngineError> {
    let Some(effect) = edge.effect else {
        return Ok(AppliedEffect::default());
    };
    match effect {
        Effect::SetSacDone => {
            next.sac_done = true;
            Ok(AppliedEffect::default())
        }
        Effect::SetAdministrativoDone => {
            next.administrativo_done = true;
            Ok(AppliedEffect::default())
        }
        Effect::RegisterPayment => {
            let kind = next.kind;
            let id = next.id;
            let current = next.status;
            let plan = next
                .installment_plan
                .as_mut()
                .ok_or(EngineError::MissingPlan { kind, id })?;
            match register_payment(plan) {
                PaymentResolution::Settled => Ok(AppliedEffect {
                    target: Some(Status::Finalizado),
                    note: Some("payment settled the plan".to_string()),
                }),
                PaymentResolution::NextInstallment { remaining } => Ok(AppliedEffect {
                    target: Some(match kind {
                        ProceedingKind::Settlement => Status::AguardandoPagamento,
                        // BenefitClaim's sub-flow stays at the finance
                        // desk between payments.
                        _ => current,
                    }),
                    note: Some(format!(
                        "payment registered, {remaining} installment(s) remaining"
                    )),
                }),
            }
        }
        Effect::AmendTotal => {
            let kind = next.kind;
            let id = next.id;
            // Presence of new_total was validated with the payload.
            let new_total = payload.new_total.unwrap_or_default();
            let plan = next
                .installment_plan
                .as_mut()
                .ok_or(EngineError::MissingPlan { kind, id })?;
            let old_total = plan.total_amount;
            plan.total_amount = new_total;
            Ok(AppliedEffect {
                target: None,
                note: Some(format!(
                    "total amended from {old_total} to {new_total} centavos"
                )),
            })
        }
        Effect::MarkUnfulfilled => match &payload.renegotiation {
            Some(renegotiation) => {
                next.installment_plan = Some(renegotiation.new_plan.clone());
                Ok(AppliedEffect {
                    target: Some(Status::Renegociado),
                    note: Some(format!("renegotiated: {}", renegotiation.terms)),
                })
            }
            None => Ok(AppliedEffect {
                target: Some(Status::NaoCumprido),
                note: Some("settlement defaulted".to_string()),
            }),
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
