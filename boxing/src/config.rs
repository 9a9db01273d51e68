//! Configuration of the boxing pass
//!
//! Options only shape reporting, logging and resource limits; every
//! representation rule always runs.

use crate::analysis::refinement::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxingConfig {
    /// Build an [`AnnotationReport`](crate::report::AnnotationReport) after the pass
    pub collect_report: bool,

    /// Longest refinement chain the resolver follows before giving up on it
    pub max_refinement_depth: usize,

    /// Level used when the pass installs the logger itself (`"debug"`, `"trace"`, ...)
    pub log_level: Option<String>,
}

impl Default for BoxingConfig {
    fn default() -> Self {
        Self {
            collect_report: false,
            max_refinement_depth: DEFAULT_MAX_DEPTH,
            log_level: None,
        }
    }
}

impl BoxingConfig {
    /// Report collection on, debug logging
    pub fn debugging() -> Self {
        Self {
            collect_report: true,
            log_level: Some("debug".to_string()),
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_report(mut self, enabled: bool) -> Self {
        self.collect_report = enabled;
        self
    }

    pub fn with_max_refinement_depth(mut self, depth: usize) -> Self {
        self.max_refinement_depth = depth;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoxingConfig::default();
        assert!(!config.collect_report);
        assert_eq!(config.max_refinement_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.log_level, None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BoxingConfig::from_json(r#"{ "collect_report": true }"#).unwrap();
        assert!(config.collect_report);
        assert_eq!(config.max_refinement_depth, DEFAULT_MAX_DEPTH);

        let config = BoxingConfig::from_json(r#"{ "max_refinement_depth": 8, "log_level": "trace" }"#).unwrap();
        assert_eq!(config.max_refinement_depth, 8);
        assert_eq!(config.log_level.as_deref(), Some("trace"));
    }

    #[test]
    fn test_json_round_trip() {
        let config = BoxingConfig::debugging().with_max_refinement_depth(12);
        let json = config.to_json().unwrap();
        assert_eq!(BoxingConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(BoxingConfig::from_json("{ collect_report: yes }").is_err());
        assert!(BoxingConfig::from_json(r#"{ "max_refinement_depth": -1 }"#).is_err());
    }
}
