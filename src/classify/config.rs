//! Classifier configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Role assigned when the oracle fails or answers with an unknown label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Treat the oracle's answer as `body`
    #[default]
    Body,
    /// Treat the oracle's answer as the rule-pass role
    Rule,
}

/// Thresholds and limits for role classification.
///
/// Every field has a default, so a partial JSON object deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Paragraphs longer than this (in characters) become body once
    /// abstract or keyword content has been seen
    pub long_body_threshold: usize,

    /// Oracle confidence at which its role wins over a disagreeing rule
    pub inference_accept: f32,

    /// Confidence given to authoritative rule decisions
    pub rule_confidence: f32,

    /// Confidence a re-prediction needs to overwrite a refuted role
    pub verify_overwrite: f32,

    /// Confidence attached to the fallback answer of a failed oracle call
    pub fallback_confidence: f32,

    /// Oracle calls issued per window; also the worker count
    pub window_size: usize,

    /// Per-call oracle timeout in milliseconds
    pub timeout_ms: u64,

    /// Run the verification pass after classification
    pub verify: bool,

    pub fallback: FallbackPolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            long_body_threshold: 200,
            inference_accept: 0.8,
            rule_confidence: 0.9,
            verify_overwrite: 0.8,
            fallback_confidence: 0.5,
            window_size: 10,
            timeout_ms: 30_000,
            verify: true,
            fallback: FallbackPolicy::Body,
        }
    }
}

impl ClassifierConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window size (at least 1).
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }

    /// Set the per-call oracle timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Enable or disable the verification pass.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_long_body_threshold(mut self, chars: usize) -> Self {
        self.long_body_threshold = chars;
        self
    }

    /// Per-call oracle timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Window size, never zero.
    pub fn window(&self) -> usize {
        self.window_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.long_body_threshold, 200);
        assert_eq!(config.inference_accept, 0.8);
        assert_eq!(config.rule_confidence, 0.9);
        assert_eq!(config.window(), 10);
        assert_eq!(config.fallback, FallbackPolicy::Body);
    }

    #[test]
    fn test_partial_json() {
        let config: ClassifierConfig =
            serde_json::from_str(r#"{"window_size": 3, "fallback": "rule"}"#).unwrap();
        assert_eq!(config.window(), 3);
        assert_eq!(config.fallback, FallbackPolicy::Rule);
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn test_builder() {
        let config = ClassifierConfig::new()
            .with_window_size(0)
            .with_timeout(Duration::from_millis(250))
            .with_verification(false);
        assert_eq!(config.window(), 1);
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert!(!config.verify);
    }
}
