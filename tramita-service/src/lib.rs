//! TRAMITA Service - the contract the core exposes to its callers
//!
//! `CaseService` wires the workflow engine to the store contracts:
//! load table -> authorize -> validate/transition -> persist. It is a
//! plain library facade, not a network service; any UI sits on top of it
//! and stays out of the workflow model.
//!
//! Store conflicts are surfaced untouched: a caller holding a stale
//! version token reloads and retries, the service never merges.

use std::collections::BTreeMap;

use tracing::{info, instrument, warn};
use tramita_core::{
    is_blank, AuthError, DeletionEvent, InstallmentPlan, Proceeding, ProceedingId, ProceedingKind,
    RecordFilter, Role, Status, StoreError, Timestamp, TramitaResult, Transition, UserProfile,
    ValidationError,
};
use tramita_engine::{
    apply_transition, can_edit_field, filter_records, graph_for, TransitionOutcome,
    TransitionPayload,
};
use tramita_storage::{
    AttachmentStore, DeletionLog, InMemoryAttachmentStore, InMemoryRecordStore, RecordStore,
    RecordingDeletionLog,
};

pub use tramita_engine::schedule::{compute_schedule, schedule_for, Installment};

/// Fields every kind must carry at creation.
const MINIMUM_FIELDS: &[&str] = &["claimant_name", "tax_id"];

/// Case-management facade, generic over the office's collaborators.
pub struct CaseService<S, A, D> {
    store: S,
    attachments: A,
    deletion_log: D,
}

impl CaseService<InMemoryRecordStore, InMemoryAttachmentStore, RecordingDeletionLog> {
    /// Service over fresh in-memory collaborators.
    pub fn in_memory() -> Self {
        Self::new(
            InMemoryRecordStore::new(),
            InMemoryAttachmentStore::new(),
            RecordingDeletionLog::new(),
        )
    }
}

impl<S, A, D> CaseService<S, A, D>
where
    S: RecordStore,
    A: AttachmentStore,
    D: DeletionLog,
{
    pub fn new(store: S, attachments: A, deletion_log: D) -> Self {
        Self {
            store,
            attachments,
            deletion_log,
        }
    }

    /// The deletion log, for callers that audit the auditors.
    pub fn deletion_log(&self) -> &D {
        &self.deletion_log
    }

    /// All proceedings of `kind`, in table order.
    pub fn list_proceedings(&self, kind: ProceedingKind) -> TramitaResult<Vec<Proceeding>> {
        Ok(self.store.load(kind)?.records)
    }

    /// Filtered view over `kind`'s table, original order preserved.
    pub fn search(
        &self,
        kind: ProceedingKind,
        filter: &RecordFilter,
    ) -> TramitaResult<Vec<Proceeding>> {
        let records = self.store.load(kind)?.records;
        Ok(filter_records(&records, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    /// One proceeding by id.
    pub fn find_proceeding(
        &self,
        kind: ProceedingKind,
        id: ProceedingId,
    ) -> TramitaResult<Proceeding> {
        let records = self.store.load(kind)?.records;
        records
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound { kind, id }.into())
    }

    /// Create a proceeding in `kind`'s initial status.
    ///
    /// Only Cadastrador (and Developer) may create. Every kind requires at
    /// least claimant_name and tax_id; Settlement additionally requires an
    /// installment plan. Duplicate case numbers are tolerated but logged.
    #[instrument(skip(self, initial_fields, plan), fields(kind = %kind, case = %case_number))]
    pub fn create_proceeding(
        &self,
        kind: ProceedingKind,
        case_number: &str,
        initial_fields: BTreeMap<String, String>,
        plan: Option<InstallmentPlan>,
        actor: &UserProfile,
    ) -> TramitaResult<Proceeding> {
        if !matches!(actor.role, Role::Cadastrador | Role::Developer) {
            return Err(AuthError::PermissionDenied {
                role: actor.role.to_string(),
                action: "create proceedings".to_string(),
            }
            .into());
        }
        let missing: Vec<String> = MINIMUM_FIELDS
            .iter()
            .filter(|field| {
                initial_fields
                    .get(**field)
                    .map_or(true, |value| is_blank(value))
            })
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::RequiredFieldsMissing { fields: missing }.into());
        }
        if kind == ProceedingKind::Settlement && plan.is_none() {
            return Err(ValidationError::RequiredFieldsMissing {
                fields: vec!["installment_plan".to_string()],
            }
            .into());
        }

        let snapshot = self.store.load(kind)?;
        if snapshot
            .records
            .iter()
            .any(|p| p.case_number == case_number)
        {
            warn!("duplicate case number, tolerating");
        }

        let mut proceeding = Proceeding::new(
            kind,
            graph_for(kind).initial,
            case_number,
            &actor.username,
        );
        proceeding.party_fields = initial_fields;
        proceeding.installment_plan = plan;

        let mut records = snapshot.records;
        records.push(proceeding.clone());
        self.store.save(kind, &records, &snapshot.token)?;
        info!(id = %proceeding.id, "proceeding created");
        Ok(proceeding)
    }

    /// Attempt a workflow transition and persist the result.
    ///
    /// Business-rule rejections come back as `TransitionOutcome::Rejected`
    /// with nothing persisted; store conflicts surface as errors for the
    /// caller to reload and retry.
    #[instrument(skip(self, payload), fields(kind = %kind, id = %id, transition = %transition))]
    pub fn apply_transition(
        &self,
        kind: ProceedingKind,
        id: ProceedingId,
        transition: Transition,
        actor: &UserProfile,
        payload: &TransitionPayload,
    ) -> TramitaResult<TransitionOutcome> {
        let snapshot = self.store.load(kind)?;
        let mut records = snapshot.records;
        let index = records
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound { kind, id })?;

        match apply_transition(&records[index], transition, actor, payload)? {
            TransitionOutcome::Applied(next) => {
                info!(from = %records[index].status, to = %next.status, "transition applied");
                records[index] = (*next).clone();
                self.store.save(kind, &records, &snapshot.token)?;
                Ok(TransitionOutcome::Applied(next))
            }
            rejected => {
                info!(reason = %rejection_tag(&rejected), "transition rejected");
                Ok(rejected)
            }
        }
    }

    /// Directly edit one party field, gated by the permission tables.
    #[instrument(skip(self, value), fields(kind = %kind, id = %id, field = field))]
    pub fn update_field(
        &self,
        kind: ProceedingKind,
        id: ProceedingId,
        field: &str,
        value: &str,
        actor: &UserProfile,
    ) -> TramitaResult<Proceeding> {
        let snapshot = self.store.load(kind)?;
        let mut records = snapshot.records;
        let index = records
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound { kind, id })?;

        if !can_edit_field(actor.role, kind, field, records[index].status) {
            return Err(AuthError::PermissionDenied {
                role: actor.role.to_string(),
                action: format!("edit field {field}"),
            }
            .into());
        }

        records[index]
            .party_fields
            .insert(field.to_string(), value.to_string());
        records[index].touch(&actor.username);
        let updated = records[index].clone();
        self.store.save(kind, &records, &snapshot.token)?;
        Ok(updated)
    }

    /// Store an attachment and append its reference to the proceeding.
    #[instrument(skip(self, bytes), fields(kind = %kind, id = %id, name = name))]
    pub fn attach_file(
        &self,
        kind: ProceedingKind,
        id: ProceedingId,
        bytes: &[u8],
        name: &str,
        actor: &UserProfile,
    ) -> TramitaResult<Proceeding> {
        let snapshot = self.store.load(kind)?;
        let mut records = snapshot.records;
        let index = records
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound { kind, id })?;

        let reference = self.attachments.store(bytes, name)?;
        records[index].attachments.push(reference);
        records[index].touch(&actor.username);
        let updated = records[index].clone();
        self.store.save(kind, &records, &snapshot.token)?;
        Ok(updated)
    }

    /// Delete a proceeding, writing the external deletion audit FIRST.
    ///
    /// The audit collaborator is invoked exactly once before removal, so a
    /// removal that fails afterwards still leaves its audit trace.
    #[instrument(skip(self), fields(kind = %kind, id = %id))]
    pub fn delete_proceeding(
        &self,
        kind: ProceedingKind,
        id: ProceedingId,
        actor: &UserProfile,
    ) -> TramitaResult<()> {
        if !matches!(actor.role, Role::Cadastrador | Role::Developer) {
            return Err(AuthError::PermissionDenied {
                role: actor.role.to_string(),
                action: "delete proceedings".to_string(),
            }
            .into());
        }
        let snapshot = self.store.load(kind)?;
        let mut records = snapshot.records;
        let index = records
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound { kind, id })?;

        self.deletion_log.record_deletion(DeletionEvent {
            proceeding_id: id,
            kind,
            case_number: records[index].case_number.clone(),
            deleted_by: actor.username.clone(),
            deleted_at: now(),
        })?;

        records.remove(index);
        self.store.save(kind, &records, &snapshot.token)?;
        info!("proceeding deleted");
        Ok(())
    }

    /// Proceedings of `kind` currently at `status`.
    pub fn list_by_status(
        &self,
        kind: ProceedingKind,
        status: Status,
    ) -> TramitaResult<Vec<Proceeding>> {
        self.search(kind, &RecordFilter::by_status(status))
    }
}

fn now() -> Timestamp {
    chrono::Utc::now()
}

fn rejection_tag(outcome: &TransitionOutcome) -> String {
    match outcome {
        TransitionOutcome::Applied(_) => "applied".to_string(),
        TransitionOutcome::Rejected(rejection) => rejection.tag(),
    }
}
