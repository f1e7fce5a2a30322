// evaluate.rs — Evaluation commands: intent, session.

use aiu_policy::{ComplianceEngine, ComplianceStatus, SessionInput};

use super::print_json;

pub async fn intent(
    engine: &ComplianceEngine,
    policy_version_id: &str,
    reason_text: &str,
) -> anyhow::Result<()> {
    let evaluation = engine
        .evaluate_intent(reason_text, policy_version_id)
        .await?;
    if evaluation.compliance_status == ComplianceStatus::NonCompliant {
        tracing::warn!(
            category = evaluation.detected_category.as_deref().unwrap_or("-"),
            "stated intent is not permitted"
        );
    }
    print_json(&evaluation)
}

pub async fn session(
    engine: &ComplianceEngine,
    policy_version_id: &str,
    log_id: &str,
    intent_category: Option<&str>,
    session_text: &str,
) -> anyhow::Result<()> {
    let input = SessionInput {
        log_id: log_id.to_string(),
        session_text: session_text.to_string(),
        policy_version_id: policy_version_id.to_string(),
        intent_category: intent_category.map(str::to_string),
    };
    let evaluation = engine.evaluate_post_session(&input).await?;
    print_json(&evaluation)
}
