// policy.rs — Policy version commands: fingerprint, severity.

use serde::Serialize;

use aiu_policy::{
    severity_rank, ComplianceStatus, FileRuleProvider, SeverityLevel, StoreLayout,
};

use super::print_json;

#[derive(Debug, Serialize)]
struct FingerprintReport {
    version_id: String,
    published: bool,
    rules: usize,
    fingerprint: String,
}

#[derive(Debug, Serialize)]
struct SeverityRow {
    level: SeverityLevel,
    rank: u8,
    direct_violation: bool,
    intent_status: ComplianceStatus,
}

/// Print the fingerprint of a version's rules.
///
/// Loading validates the version, so a tampered published file fails here.
pub async fn fingerprint(layout: &StoreLayout, policy_version_id: &str) -> anyhow::Result<()> {
    let provider = FileRuleProvider::new(&layout.policies_dir);
    let version = provider.load_version(policy_version_id).await?;
    print_json(&FingerprintReport {
        fingerprint: version.compute_fingerprint(),
        published: version.is_published(),
        rules: version.rules.len(),
        version_id: version.version_id,
    })
}

pub fn severity() -> anyhow::Result<()> {
    print_json(&severity_table())
}

fn severity_table() -> Vec<SeverityRow> {
    SeverityLevel::ALL
        .into_iter()
        .map(|level| SeverityRow {
            level,
            rank: severity_rank(level),
            direct_violation: level.is_direct_violation(),
            intent_status: ComplianceStatus::for_severity(level),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ordered_by_rank() {
        let table = severity_table();
        assert_eq!(table.len(), 5);
        assert_eq!(table[0].level, SeverityLevel::Allowed);
        assert_eq!(table[4].rank, 4);
        assert!(table[3].direct_violation);
        assert!(!table[2].direct_violation);
        assert_eq!(table[2].intent_status, ComplianceStatus::Warning);
    }
}
