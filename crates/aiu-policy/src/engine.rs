// engine.rs — The compliance engine facade.
//
// Bundles the taxonomy, the course rule overlay and the evaluation service
// behind the operations callers use: course-keyed tree annotation and
// selection checks, plus intent / post-session evaluation.
//
// The engine holds no mutable state. Course-keyed methods fetch the rule
// map on every call; batch callers should fetch it once with `rule_map()`
// and use the `*_with` variants.

use std::sync::Arc;

use aiu_taxonomy::Taxonomy;

use crate::annotate::{annotate, AnnotatedNode};
use crate::classifier::strategy_for;
use crate::config::{EngineConfig, StoreLayout};
use crate::error::Result;
use crate::evaluation::{
    Evaluation, IntentEvaluation, Phase, PolicyEvaluationService, SessionEvaluation, SessionInput,
};
use crate::overlay::{CourseRuleOverlay, RuleMap};
use crate::provider::{CourseRuleStore, FileCourseRuleStore, FileRuleProvider, PolicyRuleProvider};
use crate::selection;

/// Entry point for callers of the policy engine.
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    taxonomy: Arc<Taxonomy>,
    overlay: CourseRuleOverlay,
    evaluator: PolicyEvaluationService,
}

impl ComplianceEngine {
    /// Assemble an engine from its parts.
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        overlay: CourseRuleOverlay,
        evaluator: PolicyEvaluationService,
    ) -> Self {
        Self {
            taxonomy,
            overlay,
            evaluator,
        }
    }

    /// Build an engine from configuration and collaborator implementations.
    pub fn from_config(
        config: &EngineConfig,
        taxonomy: Arc<Taxonomy>,
        rules: Arc<dyn PolicyRuleProvider>,
        courses: Arc<dyn CourseRuleStore>,
    ) -> Result<Self> {
        let classifier = strategy_for(&config.classifier.strategy, config.classifier.tie_break)?;
        let overlay = CourseRuleOverlay::new(&config.overlay.baseline_disallowed, courses);
        let evaluator = PolicyEvaluationService::new(rules, classifier);
        tracing::debug!(
            strategy = %config.classifier.strategy,
            baseline = config.overlay.baseline_disallowed.len(),
            nodes = taxonomy.len(),
            "compliance engine ready"
        );
        Ok(Self::new(taxonomy, overlay, evaluator))
    }

    /// Build an engine over the file-backed stores of a project layout.
    ///
    /// Reads `engine.toml` and the taxonomy file when present, defaults otherwise.
    pub fn for_layout(layout: &StoreLayout) -> Result<Self> {
        let config = EngineConfig::load_or_default(&layout.config_file)?;
        let taxonomy = Taxonomy::load_or_reference(&layout.taxonomy_file)?;
        Self::from_config(
            &config,
            Arc::new(taxonomy),
            Arc::new(FileRuleProvider::new(&layout.policies_dir)),
            Arc::new(FileCourseRuleStore::new(&layout.courses_dir)),
        )
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn overlay(&self) -> &CourseRuleOverlay {
        &self.overlay
    }

    pub fn evaluator(&self) -> &PolicyEvaluationService {
        &self.evaluator
    }

    /// The effective rule map of a course (cacheable for batch work).
    pub async fn rule_map(&self, course_id: &str) -> RuleMap {
        self.overlay.rule_map(course_id).await
    }

    /// Full annotated tree for a course.
    pub async fn annotate_tree(&self, course_id: &str) -> Vec<AnnotatedNode> {
        let rules = self.rule_map(course_id).await;
        self.annotate_tree_with(&rules)
    }

    pub fn annotate_tree_with(&self, rules: &RuleMap) -> Vec<AnnotatedNode> {
        annotate(&self.taxonomy, rules)
    }

    /// Selected ids that are disallowed for a course.
    pub async fn disallowed_selections<S: AsRef<str>>(
        &self,
        node_ids: &[S],
        course_id: &str,
    ) -> Vec<String> {
        let rules = self.rule_map(course_id).await;
        self.disallowed_selections_with(node_ids, &rules)
    }

    pub fn disallowed_selections_with<S: AsRef<str>>(
        &self,
        node_ids: &[S],
        rules: &RuleMap,
    ) -> Vec<String> {
        selection::disallowed_selections(&self.taxonomy, node_ids, rules)
    }

    /// Selected non-leaf ids with a disallowed descendant leaf for a course.
    pub async fn warning_parent_selections<S: AsRef<str>>(
        &self,
        node_ids: &[S],
        course_id: &str,
    ) -> Vec<String> {
        let rules = self.rule_map(course_id).await;
        self.warning_parent_selections_with(node_ids, &rules)
    }

    pub fn warning_parent_selections_with<S: AsRef<str>>(
        &self,
        node_ids: &[S],
        rules: &RuleMap,
    ) -> Vec<String> {
        selection::warning_parent_selections(&self.taxonomy, node_ids, rules)
    }

    pub async fn evaluate(&self, policy_version_id: &str, phase: &Phase) -> Result<Evaluation> {
        self.evaluator.evaluate(policy_version_id, phase).await
    }

    pub async fn evaluate_intent(
        &self,
        reason_text: &str,
        policy_version_id: &str,
    ) -> Result<IntentEvaluation> {
        self.evaluator
            .evaluate_intent(reason_text, policy_version_id)
            .await
    }

    pub async fn evaluate_post_session(&self, input: &SessionInput) -> Result<SessionEvaluation> {
        self.evaluator.evaluate_post_session(input).await
    }
}
