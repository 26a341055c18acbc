//! Priority auto-classification from free text.
//!
//! Keyword tables are scanned most-severe-first, so a text that mentions both
//! an outage and a feature request lands on critical. No match defaults to
//! medium. Pure function over configuration; no side effects.

use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, SlaConfig};
use crate::ticket::Priority;

/// Result of classifying a piece of ticket text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub priority: Priority,
    /// Default SLA budget for the inferred priority
    pub sla_hours: i64,
    /// Keywords from the winning table found in the text
    pub matched_keywords: Vec<String>,
}

/// Keyword-table classifier mapping free text to a priority and SLA budget.
#[derive(Debug, Clone)]
pub struct PriorityClassifier {
    keywords: ClassifierConfig,
    sla: SlaConfig,
}

impl PriorityClassifier {
    pub fn new(keywords: ClassifierConfig, sla: SlaConfig) -> Self {
        Self { keywords, sla }
    }

    /// Infer priority and SLA hours from ticket text.
    ///
    /// Severity order of evaluation is the tie-break: the first table with
    /// any substring hit wins.
    pub fn classify(&self, text: &str) -> Classification {
        let text = text.to_lowercase();

        for priority in Priority::ALL {
            let matched: Vec<String> = self
                .keywords
                .keywords_for(priority)
                .iter()
                .filter(|keyword| text.contains(keyword.as_str()))
                .cloned()
                .collect();

            if !matched.is_empty() {
                return Classification {
                    priority,
                    sla_hours: self.sla.hours_for(priority),
                    matched_keywords: matched,
                };
            }
        }

        Classification {
            priority: Priority::Medium,
            sla_hours: self.sla.hours_for(Priority::Medium),
            matched_keywords: Vec::new(),
        }
    }
}

impl Default for PriorityClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default(), SlaConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
