// classifier.rs — Content classification strategies.
//
// A classifier maps free text to the best-matching usage category of a
// policy version. Strategies are pluggable behind `ClassifierStrategy`;
// configuration picks one by name through `strategy_for`.
//
// The keyword strategy scores each rule by how many of its distinct
// keywords occur in the normalized (trimmed, lowercased) text. One point
// per matching keyword, not per occurrence. The highest score above zero
// wins. Ties are broken by `TieBreak`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, Result};
use crate::rule::PolicyRule;

/// Name of the built-in keyword strategy.
pub const KEYWORD_STRATEGY: &str = "keyword";

/// Outcome of classifying one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Winning usage category; `None` when nothing matched.
    pub detected_category: Option<String>,
    /// References of the winning rule, deduplicated, in order.
    pub rule_references: Vec<String>,
    /// Score of the winning rule (0 when nothing matched).
    pub score: usize,
    /// The winning rule's keywords found in the text, normalized.
    pub matched_keywords: Vec<String>,
}

impl ClassificationResult {
    pub fn undetermined() -> Self {
        Self::default()
    }

    pub fn is_undetermined(&self) -> bool {
        self.detected_category.is_none()
    }
}

/// A text → usage-category classifier.
pub trait ClassifierStrategy: Send + Sync {
    /// Registry name of the strategy.
    fn name(&self) -> &str;

    fn classify(&self, text: &str, rules: &[PolicyRule]) -> ClassificationResult;
}

/// How equal top scores are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lexicographically smallest `usage_category` wins. Independent of the
    /// order the provider returned the rules in.
    #[default]
    UsageCategory,
    /// First rule in provider order wins.
    RuleOrder,
}

/// Substring keyword scoring.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    tie_break: TieBreak,
}

impl KeywordClassifier {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}

/// Trim and lowercase.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Distinct normalized keywords of `rule` that occur in `normalized_text`.
/// Blank keywords never match.
fn matching_keywords(rule: &PolicyRule, normalized_text: &str) -> Vec<String> {
    let distinct: BTreeSet<String> = rule
        .keywords
        .iter()
        .map(|k| normalize(k))
        .filter(|k| !k.is_empty())
        .collect();
    distinct
        .into_iter()
        .filter(|k| normalized_text.contains(k.as_str()))
        .collect()
}

impl ClassifierStrategy for KeywordClassifier {
    fn name(&self) -> &str {
        KEYWORD_STRATEGY
    }

    fn classify(&self, text: &str, rules: &[PolicyRule]) -> ClassificationResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return ClassificationResult::undetermined();
        }

        let mut ordered: Vec<&PolicyRule> = rules.iter().collect();
        if self.tie_break == TieBreak::UsageCategory {
            // Stable sort: equal categories keep provider order.
            ordered.sort_by(|a, b| a.usage_category.cmp(&b.usage_category));
        }

        let mut best: Option<(&PolicyRule, Vec<String>)> = None;
        for rule in ordered {
            let matched = matching_keywords(rule, &normalized);
            if matched.is_empty() {
                continue;
            }
            let beats = match &best {
                Some((_, current)) => matched.len() > current.len(),
                None => true,
            };
            if beats {
                best = Some((rule, matched));
            }
        }

        match best {
            Some((rule, matched_keywords)) => {
                tracing::debug!(
                    category = %rule.usage_category,
                    score = matched_keywords.len(),
                    "classified text"
                );
                ClassificationResult {
                    detected_category: Some(rule.usage_category.clone()),
                    rule_references: rule.reference().map(str::to_string).into_iter().collect(),
                    score: matched_keywords.len(),
                    matched_keywords,
                }
            }
            None => {
                tracing::debug!("no rule keywords matched");
                ClassificationResult::undetermined()
            }
        }
    }
}

/// Names of the registered strategies.
pub fn available_strategies() -> &'static [&'static str] {
    &[KEYWORD_STRATEGY]
}

/// Resolve a strategy by its configured name.
pub fn strategy_for(name: &str, tie_break: TieBreak) -> Result<Arc<dyn ClassifierStrategy>> {
    match name.trim() {
        KEYWORD_STRATEGY => Ok(Arc::new(KeywordClassifier::new(tie_break))),
        other => Err(PolicyError::UnknownStrategy {
            name: other.to_string(),
            available: available_strategies().join(", "),
        }),
    }
}
