//! # Category Vocabulary
//!
//! Closed set of labels a transaction description generalizes to. Rules are
//! tried in order; the first rule with a keyword among the description's
//! words wins. A word matches a keyword exactly or as its plural.

use serde::{Deserialize, Serialize};

use shield_core::{FieldClassification, MaskingError};

/// One label and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Output label.
    pub label: String,
    /// Upper-case keywords.
    pub keywords: Vec<String>,
}

/// Ordered rules plus a fallback label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    /// Label for descriptions no rule matches.
    #[serde(default = "default_fallback")]
    pub fallback: String,
    /// Rules in priority order.
    #[serde(default)]
    pub rules: Vec<CategoryRule>,
}

fn default_fallback() -> String {
    "General Transaction".to_string()
}

impl Default for CategoryVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

impl CategoryVocabulary {
    /// Labels for loan and revolving-credit statements.
    pub fn standard() -> Self {
        let rule = |label: &str, keywords: &[&str]| CategoryRule {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        Self {
            fallback: default_fallback(),
            rules: vec![
                rule("Payment Transaction", &["PAYMENT", "PMT", "PAID"]),
                rule("Fee Assessment", &["FEE", "CHARGE", "PENALTY"]),
                rule("Interest Charge", &["INTEREST", "INT", "FINANCE"]),
                rule("Fund Transfer", &["TRANSFER", "XFER", "WIRE"]),
                rule("Cash Advance", &["ADVANCE", "WITHDRAWAL", "DRAW"]),
                rule("Credit Transaction", &["DEPOSIT", "CREDIT"]),
            ],
        }
    }

    /// Reject empty labels and keyword-less rules, and normalize keywords to
    /// upper case.
    pub fn validated(mut self) -> Result<Self, MaskingError> {
        let invalid = |reason: &str| MaskingError::invalid_policy(FieldClassification::Description, reason);
        if self.fallback.trim().is_empty() {
            return Err(invalid("vocabulary fallback label is empty"));
        }
        for rule in &mut self.rules {
            if rule.label.trim().is_empty() {
                return Err(invalid("vocabulary rule has an empty label"));
            }
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(invalid("vocabulary rule has no keywords"));
            }
            rule.keywords = rule
                .keywords
                .iter()
                .map(|k| k.trim().to_uppercase())
                .filter(|k| !k.is_empty())
                .collect();
        }
        Ok(self)
    }

    /// Every label the vocabulary can emit.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|r| r.label.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
    }

    /// True if `value` is already one of the labels.
    pub fn contains(&self, value: &str) -> bool {
        self.labels().any(|l| l == value)
    }

    /// The label for a description.
    pub fn generalize(&self, raw: &str) -> &str {
        let trimmed = raw.trim();
        if let Some(label) = self.labels().find(|l| l.eq_ignore_ascii_case(trimmed)) {
            return label;
        }
        let upper = raw.to_uppercase();
        let words: Vec<&str> = upper
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.rules
            .iter()
            .find(|rule| {
                rule.keywords.iter().any(|k| {
                    words
                        .iter()
                        .any(|w| w == k || w.strip_suffix('S') == Some(k.as_str()))
                })
            })
            .map(|rule| rule.label.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}
