// evaluation.rs — Policy evaluation service.
//
// One operation, two phases:
//
// - `Phase::Intent` runs before the AI interaction. It classifies the
//   student's stated reason and maps the category's severity to an
//   advisory status. No category → WARNING.
// - `Phase::PostSession` runs on the full session content. It classifies
//   what actually happened, compares it against the declared intent, and
//   escalates to NON_COMPLIANT on a conflict or a direct violation.
//
// Each call fetches the version's rules exactly once; a fetch failure fails
// the evaluation and the caller decides the fallback. Everything after the
// fetch is pure (`assess`), so the same rules and input always produce the
// same result.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierStrategy;
use crate::conflict::detect_conflict;
use crate::error::Result;
use crate::provider::PolicyRuleProvider;
use crate::rule::{find_rule, PolicyRule, SeverityLevel};

/// Overall compliance verdict of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    Warning,
    NonCompliant,
}

impl ComplianceStatus {
    /// Advisory status for a category of the given severity.
    pub fn for_severity(level: SeverityLevel) -> Self {
        match level {
            SeverityLevel::Forbidden | SeverityLevel::Serious => ComplianceStatus::NonCompliant,
            SeverityLevel::Moderate => ComplianceStatus::Warning,
            SeverityLevel::Allowed | SeverityLevel::Minor => ComplianceStatus::Compliant,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::Warning => "WARNING",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which evaluation to run, with its phase-specific input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Pre-submission check of the stated reason for using AI.
    Intent { reason_text: String },
    /// Post-submission classification of a logged session.
    PostSession {
        log_id: String,
        session_text: String,
        /// Category detected at intent time, if the student declared one.
        intent_category: Option<String>,
    },
}

/// Input for a post-session evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInput {
    pub log_id: String,
    pub session_text: String,
    pub policy_version_id: String,
    #[serde(default)]
    pub intent_category: Option<String>,
}

impl SessionInput {
    pub fn phase(&self) -> Phase {
        Phase::PostSession {
            log_id: self.log_id.clone(),
            session_text: self.session_text.clone(),
            intent_category: self.intent_category.clone(),
        }
    }
}

/// Result of an intent check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentEvaluation {
    pub detected_category: Option<String>,
    pub compliance_status: ComplianceStatus,
    pub severity_level: Option<SeverityLevel>,
    pub rule_references: Vec<String>,
    pub message: String,
}

/// Result of a post-session classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvaluation {
    pub log_id: String,
    pub actual_category: Option<String>,
    pub compliance_status: ComplianceStatus,
    pub conflict_flag: bool,
    pub direct_violation_flag: bool,
    pub flag_severity: Option<SeverityLevel>,
    pub rule_references: Vec<String>,
    pub message: String,
}

/// Result of [`PolicyEvaluationService::evaluate`], tagged by phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Evaluation {
    Intent(IntentEvaluation),
    PostSession(SessionEvaluation),
}

impl Evaluation {
    pub fn compliance_status(&self) -> ComplianceStatus {
        match self {
            Evaluation::Intent(e) => e.compliance_status,
            Evaluation::PostSession(e) => e.compliance_status,
        }
    }
}

/// Orchestrates rule fetch, classification and conflict detection.
#[derive(Clone)]
pub struct PolicyEvaluationService {
    provider: Arc<dyn PolicyRuleProvider>,
    classifier: Arc<dyn ClassifierStrategy>,
}

impl PolicyEvaluationService {
    pub fn new(
        provider: Arc<dyn PolicyRuleProvider>,
        classifier: Arc<dyn ClassifierStrategy>,
    ) -> Self {
        Self {
            provider,
            classifier,
        }
    }

    pub fn classifier(&self) -> &dyn ClassifierStrategy {
        self.classifier.as_ref()
    }

    /// Fetch the version's rules and run the requested phase.
    pub async fn evaluate(&self, policy_version_id: &str, phase: &Phase) -> Result<Evaluation> {
        let rules = self.fetch_rules(policy_version_id).await?;
        Ok(self.assess(&rules, phase))
    }

    /// Pre-submission intent check.
    pub async fn evaluate_intent(
        &self,
        reason_text: &str,
        policy_version_id: &str,
    ) -> Result<IntentEvaluation> {
        let rules = self.fetch_rules(policy_version_id).await?;
        Ok(self.assess_intent(&rules, reason_text))
    }

    /// Post-submission session classification.
    pub async fn evaluate_post_session(&self, input: &SessionInput) -> Result<SessionEvaluation> {
        let rules = self.fetch_rules(&input.policy_version_id).await?;
        Ok(self.assess_session(
            &rules,
            &input.log_id,
            &input.session_text,
            input.intent_category.as_deref(),
        ))
    }

    /// Run a phase against an already-fetched rule set.
    pub fn assess(&self, rules: &[PolicyRule], phase: &Phase) -> Evaluation {
        match phase {
            Phase::Intent { reason_text } => {
                Evaluation::Intent(self.assess_intent(rules, reason_text))
            }
            Phase::PostSession {
                log_id,
                session_text,
                intent_category,
            } => Evaluation::PostSession(self.assess_session(
                rules,
                log_id,
                session_text,
                intent_category.as_deref(),
            )),
        }
    }

    fn assess_intent(&self, rules: &[PolicyRule], reason_text: &str) -> IntentEvaluation {
        let classification = self.classifier.classify(reason_text, rules);
        let detected = classification
            .detected_category
            .as_deref()
            .and_then(|c| find_rule(rules, c));

        let evaluation = match detected {
            None => IntentEvaluation {
                detected_category: classification.detected_category.clone(),
                compliance_status: ComplianceStatus::Warning,
                severity_level: None,
                rule_references: classification.rule_references.clone(),
                message: "Could not determine a usage category from your description. \
                          Please describe more specifically how you plan to use the AI tool."
                    .to_string(),
            },
            Some(rule) => {
                let status = ComplianceStatus::for_severity(rule.severity_level);
                IntentEvaluation {
                    detected_category: Some(rule.usage_category.clone()),
                    compliance_status: status,
                    severity_level: Some(rule.severity_level),
                    rule_references: classification.rule_references.clone(),
                    message: intent_message(
                        &rule.usage_category,
                        status,
                        &classification.rule_references,
                    ),
                }
            }
        };

        tracing::info!(
            category = evaluation.detected_category.as_deref().unwrap_or("-"),
            status = %evaluation.compliance_status,
            "intent evaluated"
        );
        evaluation
    }

    fn assess_session(
        &self,
        rules: &[PolicyRule],
        log_id: &str,
        session_text: &str,
        intent_category: Option<&str>,
    ) -> SessionEvaluation {
        let classification = self.classifier.classify(session_text, rules);
        let actual_category = classification.detected_category.clone();
        let conflict = detect_conflict(intent_category, actual_category.as_deref(), rules);

        let compliance_status = if conflict.direct_violation_flag || conflict.conflict_flag {
            ComplianceStatus::NonCompliant
        } else if actual_category.is_none() {
            ComplianceStatus::Warning
        } else {
            ComplianceStatus::Compliant
        };

        let message = session_message(
            actual_category.as_deref(),
            intent_category,
            conflict.flag_severity,
            conflict.direct_violation_flag,
            conflict.conflict_flag,
            &conflict.rule_references,
        );

        tracing::info!(
            log_id,
            category = actual_category.as_deref().unwrap_or("-"),
            conflict = conflict.conflict_flag,
            direct_violation = conflict.direct_violation_flag,
            status = %compliance_status,
            "session evaluated"
        );

        SessionEvaluation {
            log_id: log_id.to_string(),
            actual_category,
            compliance_status,
            conflict_flag: conflict.conflict_flag,
            direct_violation_flag: conflict.direct_violation_flag,
            flag_severity: conflict.flag_severity,
            rule_references: conflict.rule_references,
            message,
        }
    }

    async fn fetch_rules(&self, policy_version_id: &str) -> Result<Vec<PolicyRule>> {
        self.provider
            .rules(policy_version_id)
            .await
            .inspect_err(|e| {
                tracing::warn!(version = policy_version_id, error = %e, "rule fetch failed")
            })
    }
}

impl fmt::Debug for PolicyEvaluationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyEvaluationService")
            .field("classifier", &self.classifier.name())
            .finish_non_exhaustive()
    }
}

fn cite(references: &[String]) -> String {
    if references.is_empty() {
        String::new()
    } else {
        format!(" (see {})", references.join(", "))
    }
}

fn intent_message(category: &str, status: ComplianceStatus, references: &[String]) -> String {
    match status {
        ComplianceStatus::NonCompliant => format!(
            "Planned use '{}' is not permitted under this policy{}.",
            category,
            cite(references)
        ),
        ComplianceStatus::Warning => format!(
            "Planned use '{}' is restricted{}. Check your course rules and declare it transparently.",
            category,
            cite(references)
        ),
        ComplianceStatus::Compliant => format!(
            "Planned use '{}' is permitted under this policy.",
            category
        ),
    }
}

fn session_message(
    actual: Option<&str>,
    intent: Option<&str>,
    severity: Option<SeverityLevel>,
    direct_violation: bool,
    conflict: bool,
    references: &[String],
) -> String {
    let Some(actual) = actual else {
        return "Could not determine a usage category from the session content; \
                manual review recommended."
            .to_string();
    };
    let severity = severity.map(|s| s.to_string()).unwrap_or_else(|| "UNKNOWN".to_string());
    if direct_violation {
        format!(
            "Session content matches '{}' ({}), which this policy prohibits{}.",
            actual,
            severity,
            cite(references)
        )
    } else if conflict {
        format!(
            "Session content matches '{}' ({}), which is riskier than the declared intent '{}'{}.",
            actual,
            severity,
            intent.unwrap_or("-"),
            cite(references)
        )
    } else {
        format!("Session content matches '{}', consistent with the policy.", actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::error::PolicyError;
    use crate::provider::InMemoryRuleProvider;

    fn service() -> PolicyEvaluationService {
        let provider = InMemoryRuleProvider::new().with_version(
            "v1",
            vec![
                PolicyRule::new("GrammarFix", SeverityLevel::Allowed)
                    .with_reference("§2.1")
                    .with_keywords(&["grammar"]),
                PolicyRule::new("CodeGeneration", SeverityLevel::Moderate)
                    .with_reference("§3.4")
                    .with_keywords(&["generate code"]),
                PolicyRule::new("EssayWriting", SeverityLevel::Serious)
                    .with_reference("§5.1")
                    .with_keywords(&["write my essay", "essay"]),
                PolicyRule::new("ExamAnswers", SeverityLevel::Forbidden)
                    .with_reference("§5.2")
                    .with_keywords(&["exam answers"]),
            ],
        );
        PolicyEvaluationService::new(Arc::new(provider), Arc::new(KeywordClassifier::default()))
    }

    #[tokio::test]
    async fn intent_grammar_is_compliant() {
        let result = service()
            .evaluate_intent("please fix my grammar", "v1")
            .await
            .unwrap();
        assert_eq!(result.detected_category.as_deref(), Some("GrammarFix"));
        assert_eq!(result.compliance_status, ComplianceStatus::Compliant);
        assert_eq!(result.severity_level, Some(SeverityLevel::Allowed));
        assert_eq!(result.rule_references, vec!["§2.1"]);
    }

    #[tokio::test]
    async fn intent_unrelated_text_is_warning() {
        let result = service()
            .evaluate_intent("I need help with an unrelated topic", "v1")
            .await
            .unwrap();
        assert_eq!(result.detected_category, None);
        assert_eq!(result.compliance_status, ComplianceStatus::Warning);
        assert_eq!(result.severity_level, None);
        assert!(result.message.contains("more specifically"));
    }

    #[tokio::test]
    async fn intent_status_follows_severity() {
        let svc = service();
        let moderate = svc.evaluate_intent("generate code for a parser", "v1").await.unwrap();
        assert_eq!(moderate.compliance_status, ComplianceStatus::Warning);

        let serious = svc.evaluate_intent("write my essay", "v1").await.unwrap();
        assert_eq!(serious.compliance_status, ComplianceStatus::NonCompliant);
        assert!(serious.message.contains("§5.1"));

        let forbidden = svc.evaluate_intent("get exam answers", "v1").await.unwrap();
        assert_eq!(forbidden.compliance_status, ComplianceStatus::NonCompliant);
    }

    #[tokio::test]
    async fn session_riskier_than_intent_conflicts() {
        let input = SessionInput {
            log_id: "log-7".to_string(),
            session_text: "Can you generate code for the linked list assignment?".to_string(),
            policy_version_id: "v1".to_string(),
            intent_category: Some("GrammarFix".to_string()),
        };
        let result = service().evaluate_post_session(&input).await.unwrap();
        assert_eq!(result.log_id, "log-7");
        assert_eq!(result.actual_category.as_deref(), Some("CodeGeneration"));
        assert!(result.conflict_flag);
        assert!(!result.direct_violation_flag);
        assert_eq!(result.flag_severity, Some(SeverityLevel::Moderate));
        assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
        assert_eq!(result.rule_references, vec!["§3.4", "§2.1"]);
        assert!(result.message.contains("GrammarFix"));
    }

    #[tokio::test]
    async fn session_direct_violation_without_intent() {
        let input = SessionInput {
            log_id: "log-8".to_string(),
            session_text: "write my essay on the french revolution".to_string(),
            policy_version_id: "v1".to_string(),
            intent_category: None,
        };
        let result = service().evaluate_post_session(&input).await.unwrap();
        assert!(result.direct_violation_flag);
        assert!(!result.conflict_flag);
        assert_eq!(result.compliance_status, ComplianceStatus::NonCompliant);
    }

    #[tokio::test]
    async fn session_matching_intent_is_compliant() {
        let input = SessionInput {
            log_id: "log-9".to_string(),
            session_text: "grammar check of my introduction".to_string(),
            policy_version_id: "v1".to_string(),
            intent_category: Some("GrammarFix".to_string()),
        };
        let result = service().evaluate_post_session(&input).await.unwrap();
        assert_eq!(result.compliance_status, ComplianceStatus::Compliant);
        assert!(!result.conflict_flag);
    }

    #[tokio::test]
    async fn session_undetermined_is_warning() {
        let input = SessionInput {
            log_id: "log-10".to_string(),
            session_text: "hello there".to_string(),
            policy_version_id: "v1".to_string(),
            intent_category: Some("GrammarFix".to_string()),
        };
        let result = service().evaluate_post_session(&input).await.unwrap();
        assert_eq!(result.actual_category, None);
        assert_eq!(result.compliance_status, ComplianceStatus::Warning);
        assert_eq!(result.flag_severity, None);
    }

    #[tokio::test]
    async fn evaluate_dispatches_on_phase() {
        let svc = service();
        let intent = svc
            .evaluate(
                "v1",
                &Phase::Intent {
                    reason_text: "fix grammar".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(matches!(intent, Evaluation::Intent(_)));
        assert_eq!(intent.compliance_status(), ComplianceStatus::Compliant);

        let input = SessionInput {
            log_id: "log-1".to_string(),
            session_text: "exam answers please".to_string(),
            policy_version_id: "v1".to_string(),
            intent_category: None,
        };
        let session = svc.evaluate("v1", &input.phase()).await.unwrap();
        match session {
            Evaluation::PostSession(e) => assert!(e.direct_violation_flag),
            other => panic!("expected PostSession, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rule_fetch_failure_propagates() {
        let err = service()
            .evaluate_intent("fix grammar", "v404")
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownPolicyVersion { .. }));
    }

    #[test]
    fn evaluation_serializes_with_phase_tag() {
        let evaluation = Evaluation::Intent(IntentEvaluation {
            detected_category: None,
            compliance_status: ComplianceStatus::Warning,
            severity_level: None,
            rule_references: vec![],
            message: "m".to_string(),
        });
        let json = serde_json::to_string(&evaluation).unwrap();
        assert!(json.contains("\"phase\":\"intent\""));
        assert!(json.contains("\"compliance_status\":\"WARNING\""));
    }
}
