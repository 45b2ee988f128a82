//! # Compliance
//!
//! Per-table guardrail checking and scoring.

pub mod checker;

pub use checker::{
    playbook_segment, ComplianceResult, ComplianceScoring, ComplianceStatus, GuardrailChecker,
    GuardrailFinding,
};
