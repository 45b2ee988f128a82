//! # Guardrails
//!
//! Numeric balance targets for matchup tables and the typed guardrail kinds
//! the compliance checker evaluates.
//!
//! - `catalog` - Static ranges (global, playbook identity, distribution shape,
//!   statistical and performance thresholds)
//! - `kind` - `GuardrailKind` sum type mapping a guardrail to its metric and
//!   severity rule

pub mod catalog;
pub mod kind;

pub use catalog::{
    balance_guardrail, normalize_playbook_key, playbook_identity, BalanceGuardrail,
    DistributionGuardrails, GuardrailRange, PerformanceRequirements, PlaybookIdentity,
    StatisticalThresholds, VarianceTarget, BALANCE_GUARDRAILS, DISTRIBUTION_GUARDRAILS,
    PERFORMANCE_REQUIREMENTS, PLAYBOOK_IDENTITY_GUARDRAILS, STATISTICAL_THRESHOLDS,
};
pub use kind::{
    get_applicable_guardrails, GuardrailKind, IdentityMetric, ViolationSeverity,
    GLOBAL_GUARDRAIL_KINDS,
};
