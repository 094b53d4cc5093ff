//! Enum types for TRAMITA proceedings
//!
//! Every enum that round-trips through the backing store carries
//! `as_db_str`/`from_db_str`. The store is textual, so a failed parse means
//! the stored value is corrupt - callers treat that as a hard failure, not
//! a business-rule rejection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PROCEEDING KIND
// ============================================================================

/// Discriminator for the four legal proceeding categories.
///
/// Fixed at creation, never changes. Selects which workflow graph governs
/// the proceeding's status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProceedingKind {
    /// Alvará - judicial release order (linear 4-state flow)
    ReleaseOrder,
    /// RPV - court-ordered small payment (fan-out/fan-in flow)
    SmallClaim,
    /// INSS benefit claim (strict linear 7-state flow)
    BenefitClaim,
    /// Acordo - settlement with optional installment plan
    Settlement,
}

impl ProceedingKind {
    /// All kinds, in table order.
    pub const ALL: [ProceedingKind; 4] = [
        ProceedingKind::ReleaseOrder,
        ProceedingKind::SmallClaim,
        ProceedingKind::BenefitClaim,
        ProceedingKind::Settlement,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ProceedingKind::ReleaseOrder => "ReleaseOrder",
            ProceedingKind::SmallClaim => "SmallClaim",
            ProceedingKind::BenefitClaim => "BenefitClaim",
            ProceedingKind::Settlement => "Settlement",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, KindParseError> {
        match s.to_lowercase().as_str() {
            "releaseorder" => Ok(ProceedingKind::ReleaseOrder),
            "smallclaim" => Ok(ProceedingKind::SmallClaim),
            "benefitclaim" => Ok(ProceedingKind::BenefitClaim),
            "settlement" => Ok(ProceedingKind::Settlement),
            _ => Err(KindParseError(s.to_string())),
        }
    }
}

impl fmt::Display for ProceedingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ProceedingKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid proceeding kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindParseError(pub String);

impl fmt::Display for KindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid proceeding kind: {}", self.0)
    }
}

impl std::error::Error for KindParseError {}

// ============================================================================
// STATUS
// ============================================================================

/// Lifecycle status of a proceeding.
///
/// One flat enum across all four workflow graphs; which members are legal
/// for a given kind is defined by that kind's graph table in
/// `tramita-engine`. Names shared between graphs (EnviadoFinanceiro,
/// Finalizado, AguardandoPagamento) are the same variant on purpose - the
/// office uses the same stage names across proceeding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    // ReleaseOrder flow
    Cadastrado,
    EnviadoFinanceiro,
    FinanceiroEnviadoAprovacao,
    // SmallClaim flow
    Cadastro,
    Triagem,
    ValidacaoFinanceiro,
    EnviadoAprovacao,
    AguardandoPagamento,
    // BenefitClaim flow
    Ativo,
    EnviadoAdministrativo,
    Implantado,
    EnviadoSac,
    ContatoSac,
    // Settlement exceptional outcomes
    NaoCumprido,
    Renegociado,
    // Shared terminal
    Finalizado,
}

impl Status {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Status::Cadastrado => "Cadastrado",
            Status::EnviadoFinanceiro => "EnviadoFinanceiro",
            Status::FinanceiroEnviadoAprovacao => "FinanceiroEnviadoAprovacao",
            Status::Cadastro => "Cadastro",
            Status::Triagem => "Triagem",
            Status::ValidacaoFinanceiro => "ValidacaoFinanceiro",
            Status::EnviadoAprovacao => "EnviadoAprovacao",
            Status::AguardandoPagamento => "AguardandoPagamento",
            Status::Ativo => "Ativo",
            Status::EnviadoAdministrativo => "EnviadoAdministrativo",
            Status::Implantado => "Implantado",
            Status::EnviadoSac => "EnviadoSac",
            Status::ContatoSac => "ContatoSac",
            Status::NaoCumprido => "NaoCumprido",
            Status::Renegociado => "Renegociado",
            Status::Finalizado => "Finalizado",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, StatusParseError> {
        match s.to_lowercase().as_str() {
            "cadastrado" => Ok(Status::Cadastrado),
            "enviadofinanceiro" => Ok(Status::EnviadoFinanceiro),
            "financeiroenviadoaprovacao" => Ok(Status::FinanceiroEnviadoAprovacao),
            "cadastro" => Ok(Status::Cadastro),
            "triagem" => Ok(Status::Triagem),
            "validacaofinanceiro" => Ok(Status::ValidacaoFinanceiro),
            "enviadoaprovacao" => Ok(Status::EnviadoAprovacao),
            "aguardandopagamento" => Ok(Status::AguardandoPagamento),
            "ativo" => Ok(Status::Ativo),
            "enviadoadministrativo" => Ok(Status::EnviadoAdministrativo),
            "implantado" => Ok(Status::Implantado),
            "enviadosac" => Ok(Status::EnviadoSac),
            "contatosac" => Ok(Status::ContatoSac),
            "naocumprido" => Ok(Status::NaoCumprido),
            "renegociado" => Ok(Status::Renegociado),
            "finalizado" => Ok(Status::Finalizado),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Status {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusParseError(pub String);

impl fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid status: {}", self.0)
    }
}

impl std::error::Error for StatusParseError {}

// ============================================================================
// TRANSITION
// ============================================================================

/// Named workflow transition (an edge in a kind's graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// Forward a record to the finance desk
    EnviarFinanceiro,
    /// Finance forwards for approval
    EnviarAprovacao,
    /// Close the proceeding
    Finalizar,
    /// Open the SmallClaim triage fan-out
    IniciarTriagem,
    /// SAC sub-track done (sets the sac flag)
    ConcluirSac,
    /// Administrative sub-track done (sets the administrativo flag)
    ConcluirAdministrativo,
    /// Leave triage for finance validation (guarded fan-in)
    EnviarValidacao,
    /// Approved payment released, now waiting on it
    LiberarPagamento,
    /// Forward a benefit claim to the administrative desk
    EnviarAdministrativo,
    /// Benefit implanted by the agency
    Implantar,
    /// Forward to SAC for claimant contact
    EnviarSac,
    /// SAC reached the claimant
    RegistrarContato,
    /// Record an (installment) payment; target depends on the plan
    RegistrarPagamento,
    /// Send a settlement back to waiting without a payment
    RetornarAguardando,
    /// Settlement defaulted; renegotiation payload diverts to Renegociado
    MarcarNaoCumprido,
    /// Amend the settlement's agreed total in place
    AtualizarValor,
}

impl Transition {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Transition::EnviarFinanceiro => "EnviarFinanceiro",
            Transition::EnviarAprovacao => "EnviarAprovacao",
            Transition::Finalizar => "Finalizar",
            Transition::IniciarTriagem => "IniciarTriagem",
            Transition::ConcluirSac => "ConcluirSac",
            Transition::ConcluirAdministrativo => "ConcluirAdministrativo",
            Transition::EnviarValidacao => "EnviarValidacao",
            Transition::LiberarPagamento => "LiberarPagamento",
            Transition::EnviarAdministrativo => "EnviarAdministrativo",
            Transition::Implantar => "Implantar",
            Transition::EnviarSac => "EnviarSac",
            Transition::RegistrarContato => "RegistrarContato",
            Transition::RegistrarPagamento => "RegistrarPagamento",
            Transition::RetornarAguardando => "RetornarAguardando",
            Transition::MarcarNaoCumprido => "MarcarNaoCumprido",
            Transition::AtualizarValor => "AtualizarValor",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, TransitionParseError> {
        match s.to_lowercase().as_str() {
            "enviarfinanceiro" => Ok(Transition::EnviarFinanceiro),
            "enviaraprovacao" => Ok(Transition::EnviarAprovacao),
            "finalizar" => Ok(Transition::Finalizar),
            "iniciartriagem" => Ok(Transition::IniciarTriagem),
            "concluirsac" => Ok(Transition::ConcluirSac),
            "concluiradministrativo" => Ok(Transition::ConcluirAdministrativo),
            "enviarvalidacao" => Ok(Transition::EnviarValidacao),
            "liberarpagamento" => Ok(Transition::LiberarPagamento),
            "enviaradministrativo" => Ok(Transition::EnviarAdministrativo),
            "implantar" => Ok(Transition::Implantar),
            "enviarsac" => Ok(Transition::EnviarSac),
            "registrarcontato" => Ok(Transition::RegistrarContato),
            "registrarpagamento" => Ok(Transition::RegistrarPagamento),
            "retornaraguardando" => Ok(Transition::RetornarAguardando),
            "marcarnaocumprido" => Ok(Transition::MarcarNaoCumprido),
            "atualizarvalor" => Ok(Transition::AtualizarValor),
            _ => Err(TransitionParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Transition {
    type Err = TransitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid transition string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionParseError(pub String);

impl fmt::Display for TransitionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid transition: {}", self.0)
    }
}

impl std::error::Error for TransitionParseError {}

// ============================================================================
// ROLE
// ============================================================================

/// Office role of an acting user.
///
/// Unknown role strings fail to parse; the permission resolver treats
/// anything it cannot name as having no permissions (deny-by-default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// All permissions, all kinds
    Developer,
    /// Creates records, drives early-stage transitions
    Cadastrador,
    /// Administrative desk
    Administrativo,
    /// Finance desk
    Financeiro,
    /// Claimant-contact desk
    Sac,
}

impl Role {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Role::Developer => "Developer",
            Role::Cadastrador => "Cadastrador",
            Role::Administrativo => "Administrativo",
            Role::Financeiro => "Financeiro",
            Role::Sac => "Sac",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, RoleParseError> {
        match s.to_lowercase().as_str() {
            "developer" => Ok(Role::Developer),
            "cadastrador" => Ok(Role::Cadastrador),
            "administrativo" => Ok(Role::Administrativo),
            "financeiro" => Ok(Role::Financeiro),
            "sac" => Ok(Role::Sac),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleParseError(pub String);

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid role: {}", self.0)
    }
}

impl std::error::Error for RoleParseError {}

// ============================================================================
// TESTS
// ============================================================================
