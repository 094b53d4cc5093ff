//! Per-kind workflow graph tables
//!
//! Each proceeding kind is governed by a directed graph of named states
//! with exactly one initial state and one or more terminal states. The
//! tables below are the single source of truth: the engine interprets
//! them, the permission resolver reads role allow-lists off them, and the
//! graph-sanity tests walk them.

use tramita_core::{ProceedingKind, Role, Status, Transition};

/// Where an edge fires from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSource {
    /// A specific state of the graph
    State(Status),
    /// Any non-terminal state (Settlement's exceptional edges)
    AnyNonTerminal,
}

/// Where an edge lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTarget {
    /// A specific state of the graph
    State(Status),
    /// Status does not change (in-place amendments, triage flag edges)
    Unchanged,
    /// The edge's effect decides the target (payment registration,
    /// default-vs-renegotiation)
    FromEffect,
}

/// Extra precondition beyond role and payload completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Both triage sub-tracks (SAC and Administrativo) complete
    TriagemComplete,
}

/// Side effect applied to the proceeding when the edge fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SetSacDone,
    SetAdministrativoDone,
    /// Decrement the remaining installment count or settle the plan;
    /// resolves the edge target
    RegisterPayment,
    /// Amend the plan's agreed total in place
    AmendTotal,
    /// NaoCumprido, or Renegociado when a renegotiation payload is present;
    /// resolves the edge target
    MarkUnfulfilled,
}

/// One edge of a workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDef {
    pub transition: Transition,
    pub from: EdgeSource,
    pub to: EdgeTarget,
    /// Roles allowed to fire the edge. Developer is implicitly allowed on
    /// every edge and is not listed.
    pub roles: &'static [Role],
    /// Party fields the payload must supply (empty markers count as absent)
    pub required_fields: &'static [&'static str],
    /// A comprovante attachment must accompany the payload
    pub requires_attachment: bool,
    pub guard: Option<Guard>,
    pub effect: Option<Effect>,
}

impl EdgeDef {
    const fn new(transition: Transition, from: Status, to: Status) -> Self {
        Self {
            transition,
            from: EdgeSource::State(from),
            to: EdgeTarget::State(to),
            roles: &[],
            required_fields: &[],
            requires_attachment: false,
            guard: None,
            effect: None,
        }
    }

    const fn roles(mut self, roles: &'static [Role]) -> Self {
        self.roles = roles;
        self
    }

    const fn requires(mut self, fields: &'static [&'static str]) -> Self {
        self.required_fields = fields;
        self
    }

    const fn with_attachment(mut self) -> Self {
        self.requires_attachment = true;
        self
    }

    const fn guarded(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    const fn effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    const fn from_any_non_terminal(mut self) -> Self {
        self.from = EdgeSource::AnyNonTerminal;
        self
    }

    const fn to_effect_target(mut self) -> Self {
        self.to = EdgeTarget::FromEffect;
        self
    }

    const fn in_place(mut self) -> Self {
        self.to = EdgeTarget::Unchanged;
        self
    }
}

/// Complete workflow definition for one proceeding kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowGraph {
    pub kind: ProceedingKind,
    pub initial: Status,
    pub states: &'static [Status],
    pub terminal: &'static [Status],
    pub edges: &'static [EdgeDef],
}

impl WorkflowGraph {
    /// Whether `status` is a state of this graph.
    pub fn contains(&self, status: Status) -> bool {
        self.states.contains(&status)
    }

    /// Whether `status` is terminal in this graph.
    pub fn is_terminal(&self, status: Status) -> bool {
        self.terminal.contains(&status)
    }

    /// Edges that can fire from `status`.
    pub fn outgoing(&self, status: Status) -> impl Iterator<Item = &'static EdgeDef> + '_ {
        let non_terminal = !self.is_terminal(status);
        self.edges.iter().filter(move |e| match e.from {
            EdgeSource::State(s) => s == status,
            EdgeSource::AnyNonTerminal => non_terminal,
        })
    }
}

// ============================================================================
// RELEASE ORDER (alvará) - linear, 4 states
// ============================================================================

const RELEASE_ORDER_EDGES: &[EdgeDef] = &[
    EdgeDef::new(
        Transition::EnviarFinanceiro,
        Status::Cadastrado,
        Status::EnviadoFinanceiro,
    )
    .roles(&[Role::Cadastrador]),
    EdgeDef::new(
        Transition::EnviarAprovacao,
        Status::EnviadoFinanceiro,
        Status::FinanceiroEnviadoAprovacao,
    )
    .roles(&[Role::Financeiro]),
    EdgeDef::new(
        Transition::Finalizar,
        Status::FinanceiroEnviadoAprovacao,
        Status::Finalizado,
    )
    .roles(&[Role::Financeiro])
    .with_attachment(),
];

const RELEASE_ORDER: WorkflowGraph = WorkflowGraph {
    kind: ProceedingKind::ReleaseOrder,
    initial: Status::Cadastrado,
    states: &[
        Status::Cadastrado,
        Status::EnviadoFinanceiro,
        Status::FinanceiroEnviadoAprovacao,
        Status::Finalizado,
    ],
    terminal: &[Status::Finalizado],
    edges: RELEASE_ORDER_EDGES,
};

// ============================================================================
// SMALL CLAIM (RPV) - fan-out/fan-in at Triagem
// ============================================================================

const SMALL_CLAIM_EDGES: &[EdgeDef] = &[
    EdgeDef::new(Transition::IniciarTriagem, Status::Cadastro, Status::Triagem)
        .roles(&[Role::Cadastrador]),
    // The two sub-tracks run independently inside Triagem; each completion
    // edge only flips its flag.
    EdgeDef::new(Transition::ConcluirSac, Status::Triagem, Status::Triagem)
        .roles(&[Role::Sac])
        .in_place()
        .effect(Effect::SetSacDone),
    EdgeDef::new(
        Transition::ConcluirAdministrativo,
        Status::Triagem,
        Status::Triagem,
    )
    .roles(&[Role::Administrativo])
    .in_place()
    .effect(Effect::SetAdministrativoDone),
    // Fan-in: both flags must hold.
    EdgeDef::new(
        Transition::EnviarValidacao,
        Status::Triagem,
        Status::ValidacaoFinanceiro,
    )
    .roles(&[Role::Administrativo, Role::Sac])
    .guarded(Guard::TriagemComplete),
    EdgeDef::new(
        Transition::EnviarAprovacao,
        Status::ValidacaoFinanceiro,
        Status::EnviadoAprovacao,
    )
    .roles(&[Role::Financeiro]),
    EdgeDef::new(
        Transition::LiberarPagamento,
        Status::EnviadoAprovacao,
        Status::AguardandoPagamento,
    )
    .roles(&[Role::Financeiro]),
    EdgeDef::new(
        Transition::Finalizar,
        Status::AguardandoPagamento,
        Status::Finalizado,
    )
    .roles(&[Role::Financeiro])
    .with_attachment(),
];

const SMALL_CLAIM: WorkflowGraph = WorkflowGraph {
    kind: ProceedingKind::SmallClaim,
    initial: Status::Cadastro,
    states: &[
        Status::Cadastro,
        Status::Triagem,
        Status::ValidacaoFinanceiro,
        Status::EnviadoAprovacao,
        Status::AguardandoPagamento,
        Status::Finalizado,
    ],
    terminal: &[Status::Finalizado],
    edges: SMALL_CLAIM_EDGES,
};

// ============================================================================
// BENEFIT CLAIM (INSS) - strict linear, 7 states
// ============================================================================

const BENEFIT_CLAIM_EDGES: &[EdgeDef] = &[
    EdgeDef::new(
        Transition::EnviarAdministrativo,
        Status::Ativo,
        Status::EnviadoAdministrativo,
    )
    .roles(&[Role::Cadastrador]),
    EdgeDef::new(
        Transition::Implantar,
        Status::EnviadoAdministrativo,
        Status::Implantado,
    )
    .roles(&[Role::Administrativo])
    .requires(&["benefit_number"]),
    EdgeDef::new(Transition::EnviarSac, Status::Implantado, Status::EnviadoSac)
        .roles(&[Role::Administrativo]),
    EdgeDef::new(
        Transition::RegistrarContato,
        Status::EnviadoSac,
        Status::ContatoSac,
    )
    .roles(&[Role::Sac]),
    EdgeDef::new(
        Transition::EnviarFinanceiro,
        Status::ContatoSac,
        Status::EnviadoFinanceiro,
    )
    .roles(&[Role::Sac]),
    // Installment sub-flow: stays in EnviadoFinanceiro between payments,
    // finalizes when the remaining count exhausts.
    EdgeDef::new(
        Transition::RegistrarPagamento,
        Status::EnviadoFinanceiro,
        Status::Finalizado,
    )
    .roles(&[Role::Financeiro])
    .with_attachment()
    .to_effect_target()
    .effect(Effect::RegisterPayment),
    EdgeDef::new(
        Transition::Finalizar,
        Status::EnviadoFinanceiro,
        Status::Finalizado,
    )
    .roles(&[Role::Financeiro])
    .with_attachment(),
];

const BENEFIT_CLAIM: WorkflowGraph = WorkflowGraph {
    kind: ProceedingKind::BenefitClaim,
    initial: Status::Ativo,
    states: &[
        Status::Ativo,
        Status::EnviadoAdministrativo,
        Status::Implantado,
        Status::EnviadoSac,
        Status::ContatoSac,
        Status::EnviadoFinanceiro,
        Status::Finalizado,
    ],
    terminal: &[Status::Finalizado],
    edges: BENEFIT_CLAIM_EDGES,
};

// ============================================================================
// SETTLEMENT (acordo) - payment loop plus exceptional edges
// ============================================================================

const SETTLEMENT_EDGES: &[EdgeDef] = &[
    EdgeDef::new(
        Transition::EnviarFinanceiro,
        Status::AguardandoPagamento,
        Status::EnviadoFinanceiro,
    )
    .roles(&[Role::Cadastrador, Role::Financeiro]),
    EdgeDef::new(
        Transition::RetornarAguardando,
        Status::EnviadoFinanceiro,
        Status::AguardandoPagamento,
    )
    .roles(&[Role::Financeiro]),
    // Finalizado for the last installment (or lump sum), back to
    // AguardandoPagamento otherwise.
    EdgeDef::new(
        Transition::RegistrarPagamento,
        Status::EnviadoFinanceiro,
        Status::Finalizado,
    )
    .roles(&[Role::Financeiro])
    .with_attachment()
    .to_effect_target()
    .effect(Effect::RegisterPayment),
    // Exceptional edges, always available off any non-terminal state.
    EdgeDef::new(
        Transition::MarcarNaoCumprido,
        Status::AguardandoPagamento,
        Status::NaoCumprido,
    )
    .roles(&[Role::Financeiro, Role::Administrativo])
    .from_any_non_terminal()
    .to_effect_target()
    .effect(Effect::MarkUnfulfilled),
    EdgeDef::new(
        Transition::AtualizarValor,
        Status::AguardandoPagamento,
        Status::AguardandoPagamento,
    )
    .roles(&[Role::Financeiro])
    .from_any_non_terminal()
    .in_place()
    .effect(Effect::AmendTotal),
];

const SETTLEMENT: WorkflowGraph = WorkflowGraph {
    kind: ProceedingKind::Settlement,
    initial: Status::AguardandoPagamento,
    states: &[
        Status::AguardandoPagamento,
        Status::EnviadoFinanceiro,
        Status::NaoCumprido,
        Status::Renegociado,
        Status::Finalizado,
    ],
    terminal: &[Status::Finalizado, Status::NaoCumprido, Status::Renegociado],
    edges: SETTLEMENT_EDGES,
};

/// The workflow table governing `kind`.
pub fn graph_for(kind: ProceedingKind) -> &'static WorkflowGraph {
    match kind {
        ProceedingKind::ReleaseOrder => &RELEASE_ORDER,
        ProceedingKind::SmallClaim => &SMALL_CLAIM,
        ProceedingKind::BenefitClaim => &BENEFIT_CLAIM,
        ProceedingKind::Settlement => &SETTLEMENT,
    }
}

// ============================================================================
// TESTS
// ============================================================================
