//! # aiu-policy
//!
//! Policy compliance engine for recording and auditing AI-tool usage.
//!
//! Decides whether a student's AI usage complies with the policy version in
//! force and with their course's rules:
//!
//! - [`classifier`] maps free text to a usage category by keyword scoring.
//! - [`conflict`] compares declared intent with detected actual usage.
//! - [`evaluation`] runs the intent check and the post-session
//!   classification on top of both.
//! - [`overlay`], [`annotate`] and [`selection`] apply per-course
//!   allow/disallow rules to the usage taxonomy.
//!
//! [`ComplianceEngine`] ties these together for callers.
//!
//! ## Key invariants
//!
//! - **Disallow inherits downward**: a node under an explicitly disallowed
//!   ancestor is disallowed, whatever its own rule says.
//! - **Conflict means riskier**: a conflict is flagged only when the actual
//!   category ranks strictly above the declared one.
//! - **Overrides degrade, rules fail**: a missing or failing course store
//!   falls back to the baseline; a failing rule provider fails the call.
//! - **Stateless**: no call mutates shared state, so the engine is safe to
//!   share across tasks.

pub mod annotate;
pub mod classifier;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod overlay;
pub mod provider;
pub mod rule;
pub mod selection;

pub use annotate::{annotate, AnnotatedNode, NodeStatus};
pub use classifier::{
    strategy_for, ClassificationResult, ClassifierStrategy, KeywordClassifier, TieBreak,
};
pub use config::{ClassifierConfig, EngineConfig, OverlayConfig, StoreLayout};
pub use conflict::{detect_conflict, ConflictResult};
pub use engine::ComplianceEngine;
pub use error::PolicyError;
pub use evaluation::{
    ComplianceStatus, Evaluation, IntentEvaluation, Phase, PolicyEvaluationService,
    SessionEvaluation, SessionInput,
};
pub use overlay::{CourseRuleOverlay, OverlaySource, RuleMap};
pub use provider::{
    CourseRuleStore, FileCourseRuleStore, FileRuleProvider, InMemoryCourseRuleStore,
    InMemoryRuleProvider, OverrideLookup, PolicyRuleProvider,
};
pub use rule::{severity_rank, PolicyRule, PolicyVersion, SeverityLevel};
pub use selection::{disallowed_selections, warning_parent_selections};
