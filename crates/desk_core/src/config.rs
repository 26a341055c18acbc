//! Desk configuration.
//!
//! Keyword tables and SLA defaults are explicit configuration handed to the
//! classifier and the desk at construction, never module-level mutable state,
//! so tests can override them. Loadable from TOML; every field has a default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::ticket::Priority;

/// Default SLA budgets in hours, per priority.
const DEFAULT_CRITICAL_HOURS: i64 = 4;
const DEFAULT_HIGH_HOURS: i64 = 24;
const DEFAULT_MEDIUM_HOURS: i64 = 72;
const DEFAULT_LOW_HOURS: i64 = 168;

/// Keywords that pull a ticket to a given priority. Matched as lowercase
/// substrings of the free text.
const CRITICAL_KEYWORDS: &[&str] = &[
    "down",
    "outage",
    "crash",
    "critical",
    "emergency",
    "production",
    "breach",
];

const HIGH_KEYWORDS: &[&str] = &[
    "broken",
    "error",
    "fail",
    "urgent",
    "security",
    "data loss",
    "high",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "slow",
    "degraded",
    "incorrect",
    "issue",
    "bug",
    "medium",
];

const LOW_KEYWORDS: &[&str] = &[
    "feature",
    "enhancement",
    "request",
    "question",
    "low",
];

/// SLA budgets per priority, in wall-clock hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaConfig {
    #[serde(default = "default_critical_hours")]
    pub critical_hours: i64,
    #[serde(default = "default_high_hours")]
    pub high_hours: i64,
    #[serde(default = "default_medium_hours")]
    pub medium_hours: i64,
    #[serde(default = "default_low_hours")]
    pub low_hours: i64,
}

fn default_critical_hours() -> i64 {
    DEFAULT_CRITICAL_HOURS
}
fn default_high_hours() -> i64 {
    DEFAULT_HIGH_HOURS
}
fn default_medium_hours() -> i64 {
    DEFAULT_MEDIUM_HOURS
}
fn default_low_hours() -> i64 {
    DEFAULT_LOW_HOURS
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            critical_hours: DEFAULT_CRITICAL_HOURS,
            high_hours: DEFAULT_HIGH_HOURS,
            medium_hours: DEFAULT_MEDIUM_HOURS,
            low_hours: DEFAULT_LOW_HOURS,
        }
    }
}

impl SlaConfig {
    /// SLA budget for a priority.
    pub fn hours_for(&self, priority: Priority) -> i64 {
        match priority {
            Priority::Critical => self.critical_hours,
            Priority::High => self.high_hours,
            Priority::Medium => self.medium_hours,
            Priority::Low => self.low_hours,
        }
    }
}

/// Keyword tables for priority auto-classification, one per priority level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_critical_keywords")]
    pub critical: Vec<String>,
    #[serde(default = "default_high_keywords")]
    pub high: Vec<String>,
    #[serde(default = "default_medium_keywords")]
    pub medium: Vec<String>,
    #[serde(default = "default_low_keywords")]
    pub low: Vec<String>,
}

fn to_owned(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|k| k.to_string()).collect()
}

fn default_critical_keywords() -> Vec<String> {
    to_owned(CRITICAL_KEYWORDS)
}
fn default_high_keywords() -> Vec<String> {
    to_owned(HIGH_KEYWORDS)
}
fn default_medium_keywords() -> Vec<String> {
    to_owned(MEDIUM_KEYWORDS)
}
fn default_low_keywords() -> Vec<String> {
    to_owned(LOW_KEYWORDS)
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            critical: to_owned(CRITICAL_KEYWORDS),
            high: to_owned(HIGH_KEYWORDS),
            medium: to_owned(MEDIUM_KEYWORDS),
            low: to_owned(LOW_KEYWORDS),
        }
    }
}

impl ClassifierConfig {
    /// Keyword table for a priority.
    pub fn keywords_for(&self, priority: Priority) -> &[String] {
        match priority {
            Priority::Critical => &self.critical,
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }
}

/// Top-level desk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    /// SLA budgets
    #[serde(default)]
    pub sla: SlaConfig,

    /// Priority classifier keyword tables
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl DeskConfig {
    /// Load configuration from a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: DeskConfig = toml::from_str(&raw)
            .with_context(|| format!("cannot parse config file {}", path.display()))?;
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sla_hours() {
        let sla = SlaConfig::default();
        assert_eq!(sla.hours_for(Priority::Critical), 4);
        assert_eq!(sla.hours_for(Priority::High), 24);
        assert_eq!(sla.hours_for(Priority::Medium), 72);
        assert_eq!(sla.hours_for(Priority::Low), 168);
    }

    #[test]
    fn test_default_keyword_tables_populated() {
        let classifier = ClassifierConfig::default();
        for priority in Priority::ALL {
            assert!(!classifier.keywords_for(priority).is_empty());
        }
        assert!(classifier.critical.contains(&"outage".to_string()));
        assert!(classifier.low.contains(&"question".to_string()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DeskConfig = toml::from_str(
            r#"
            [sla]
            critical_hours = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.sla.critical_hours, 2);
        assert_eq!(config.sla.high_hours, 24);
        assert!(!config.classifier.medium.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.toml");
        std::fs::write(
            &path,
            r#"
            [classifier]
            critical = ["meltdown"]
            "#,
        )
        .unwrap();

        let config = DeskConfig::load_from(&path).unwrap();
        assert_eq!(config.classifier.critical, vec!["meltdown".to_string()]);
        assert_eq!(config.sla.critical_hours, 4);

        assert!(DeskConfig::load_from(dir.path().join("missing.toml")).is_err());
    }
}
