//! External role oracle.
//!
//! The oracle is an untrusted, possibly slow, possibly failing service that
//! guesses a paragraph's role from its text, formatting and context. Every
//! call goes through [`call_with_timeout`]; failures are folded into the
//! classifier's fallback rather than surfaced.

use crate::error::{Error, Result};
use crate::model::ParagraphRole;
use crossbeam_channel::RecvTimeoutError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::thread;
use std::time::Duration;

/// A previously classified paragraph, as shown to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub index: usize,
    pub role: ParagraphRole,
    /// Text, for heading-like roles only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Everything the oracle sees about one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    /// Record index in the document
    pub index: usize,
    pub text: String,
    /// Font and paragraph attributes in requirement-file shape
    pub attributes: Value,
    /// Finalized records before this one
    pub context: Vec<ContextEntry>,
    /// Raw text of the next text paragraph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_text: Option<String>,
    /// What the rule pass decided
    pub rule_role: ParagraphRole,
}

/// Raw prediction. The label is validated by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleAnswer {
    #[serde(alias = "location")]
    pub role: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

/// Answer to a verification question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyAnswer {
    pub is_correct: bool,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    0.5
}

/// A semantic role classifier.
pub trait RoleOracle: Send + Sync {
    /// Guess the role of a paragraph.
    fn predict(&self, request: &OracleRequest) -> Result<OracleAnswer>;

    /// Confirm or refute an already assigned role.
    ///
    /// The default asks for a fresh prediction and compares labels.
    fn verify(&self, request: &OracleRequest, assigned: ParagraphRole) -> Result<VerifyAnswer> {
        let answer = self.predict(request)?;
        Ok(VerifyAnswer {
            is_correct: ParagraphRole::from_label(&answer.role) == Some(assigned),
            confidence: answer.confidence,
        })
    }
}

impl OracleAnswer {
    /// Parsed role and clamped confidence, or `None` for an unusable answer.
    pub fn interpret(&self) -> Option<(ParagraphRole, f32)> {
        let role = ParagraphRole::from_label(&self.role)?;
        if !self.confidence.is_finite() {
            return None;
        }
        Some((role, self.confidence.clamp(0.0, 1.0)))
    }
}

/// Run an oracle call on its own thread and wait at most `timeout`.
///
/// Every call gets a fresh OS thread, including calls made from the
/// classifier's pool workers, so a blocking oracle cannot be interrupted
/// mid-request. A call that overruns is abandoned: its thread keeps running
/// until the oracle returns, and the result is dropped. Oracles should bound
/// their own requests (the HTTP client carries the same timeout) so that
/// abandoned threads do not pile up.
pub fn call_with_timeout<T, F>(timeout: Duration, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new()
        .name("thesisfmt-oracle-call".to_string())
        .spawn(move || {
            let _ = tx.send(call());
        })
        .map_err(|e| Error::Oracle(format!("cannot start oracle call: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(Error::Oracle(format!(
            "no answer within {} ms",
            timeout.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => {
            Err(Error::Oracle("oracle call ended without an answer".to_string()))
        }
    }
}
