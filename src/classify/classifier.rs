//! Hybrid rule/oracle role classification.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::{ClassifierConfig, FallbackPolicy};
use super::oracle::{call_with_timeout, ContextEntry, OracleAnswer, OracleRequest, RoleOracle};
use super::rules::{apply_rules, RuleContext, RuleDecision};
use crate::error::{Error, Result};
use crate::model::{Document, ParagraphRecord, ParagraphRole};

/// Counters describing one classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    /// Text paragraphs classified
    pub paragraphs: usize,
    /// Paragraphs settled by an authoritative rule
    pub authoritative: usize,
    /// Prediction calls issued
    pub oracle_calls: usize,
    /// Calls that failed, timed out or returned an unknown label
    pub oracle_failures: usize,
    /// Windows cut short because a finalized role changed a later rule decision
    pub window_restarts: usize,
    /// Paragraphs checked by the verification pass
    pub verified: usize,
    /// Roles overwritten by the verification pass
    pub overridden: usize,
}

/// Assigns a [`ParagraphRole`] to every text record of a document.
///
/// Without an oracle the rule pass alone decides. With one, paragraphs that
/// no authoritative rule settles are sent to the oracle in windows, and each
/// window's answers are merged in document order once the whole window has
/// returned.
pub struct Classifier {
    config: ClassifierConfig,
    oracle: Option<Arc<dyn RoleOracle>>,
    pool: Option<rayon::ThreadPool>,
}

impl Classifier {
    /// Rule-only classifier.
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            oracle: None,
            pool: None,
        }
    }

    /// Classifier backed by an oracle, with a worker pool sized to the window.
    pub fn with_oracle(config: ClassifierConfig, oracle: Arc<dyn RoleOracle>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.window())
            .thread_name(|i| format!("thesisfmt-oracle-{}", i))
            .build()
            .map_err(|e| Error::Other(format!("cannot build oracle worker pool: {}", e)))?;
        Ok(Self {
            config,
            oracle: Some(oracle),
            pool: Some(pool),
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    /// Classify every text record in place. Image and table records keep their roles.
    pub fn classify(&self, document: &mut Document) -> ClassificationSummary {
        let text_indices: Vec<usize> = document
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_text())
            .map(|(i, _)| i)
            .collect();

        let mut summary = ClassificationSummary {
            paragraphs: text_indices.len(),
            ..Default::default()
        };
        let mut locked = vec![false; document.len()];

        match (&self.oracle, &self.pool) {
            (Some(oracle), Some(pool)) => {
                self.classify_windowed(document, &text_indices, oracle, pool, &mut locked, &mut summary);
                if self.config.verify {
                    self.verify(document, &text_indices, &locked, oracle, pool, &mut summary);
                }
            }
            _ => self.classify_rules_only(document, &text_indices, &mut summary),
        }

        log::info!(
            "classified {} paragraphs ({} by rule, {} oracle calls, {} failures, {} overridden)",
            summary.paragraphs,
            summary.authoritative,
            summary.oracle_calls,
            summary.oracle_failures,
            summary.overridden
        );
        summary
    }

    fn classify_rules_only(
        &self,
        document: &mut Document,
        text_indices: &[usize],
        summary: &mut ClassificationSummary,
    ) {
        let mut context = RuleContext::default();
        for &index in text_indices {
            let record = &mut document.records[index];
            let decision = apply_rules(&record.text, &context, &self.config);
            let confidence = if decision.matched {
                self.config.rule_confidence
            } else {
                self.config.fallback_confidence
            };
            if decision.is_authoritative() {
                summary.authoritative += 1;
            }
            assign(record, index, decision.role, confidence);
            context.advance(decision.role);
        }
    }

    fn classify_windowed(
        &self,
        document: &mut Document,
        text_indices: &[usize],
        oracle: &Arc<dyn RoleOracle>,
        pool: &rayon::ThreadPool,
        locked: &mut [bool],
        summary: &mut ClassificationSummary,
    ) {
        let window = self.config.window();
        let timeout = self.config.timeout();
        let mut context = RuleContext::default();
        let mut position = 0;

        while position < text_indices.len() {
            // Plan ahead assuming every pending paragraph keeps its rule role.
            let mut planned: Vec<RuleDecision> = Vec::new();
            let mut requests: Vec<OracleRequest> = Vec::new();
            let mut simulated = context;
            let context_end = text_indices[position];

            for offset in position..text_indices.len() {
                let index = text_indices[offset];
                let decision = apply_rules(&document.records[index].text, &simulated, &self.config);
                if !decision.is_authoritative() {
                    if requests.len() == window {
                        break;
                    }
                    let next = text_indices.get(offset + 1).map(|&n| document.records[n].text.clone());
                    requests.push(build_request(
                        &document.records,
                        index,
                        context_end,
                        next,
                        decision.role,
                    ));
                }
                planned.push(decision);
                simulated.advance(decision.role);
            }

            summary.oracle_calls += requests.len();
            let answers: Vec<Result<OracleAnswer>> = pool.install(|| {
                requests
                    .into_par_iter()
                    .map(|request| {
                        let oracle = Arc::clone(oracle);
                        call_with_timeout(timeout, move || oracle.predict(&request))
                    })
                    .collect()
            });
            let mut answers = answers.into_iter();

            // Merge in order with the real previous roles.
            let mut finalized = 0;
            for (offset, expected) in planned.iter().enumerate() {
                let index = text_indices[position + offset];
                let decision = apply_rules(&document.records[index].text, &context, &self.config);
                if decision != *expected {
                    log::debug!("paragraph {} depends on a changed role; restarting window", index);
                    summary.window_restarts += 1;
                    break;
                }

                let (role, confidence) = if decision.is_authoritative() {
                    locked[index] = true;
                    summary.authoritative += 1;
                    (decision.role, self.config.rule_confidence)
                } else {
                    let predicted = match answers.next() {
                        Some(Ok(answer)) => answer.interpret().or_else(|| {
                            log::warn!(
                                "oracle returned unknown label '{}' for paragraph {}",
                                answer.role,
                                index
                            );
                            None
                        }),
                        Some(Err(e)) => {
                            log::warn!("oracle failed for paragraph {}: {}", index, e);
                            None
                        }
                        None => None,
                    };
                    let predicted = predicted.unwrap_or_else(|| {
                        summary.oracle_failures += 1;
                        self.fallback(decision.role)
                    });
                    arbitrate(decision.role, predicted, &self.config)
                };

                assign(&mut document.records[index], index, role, confidence);
                context.advance(role);
                finalized += 1;
            }

            position += finalized;
        }
    }

    fn verify(
        &self,
        document: &mut Document,
        text_indices: &[usize],
        locked: &[bool],
        oracle: &Arc<dyn RoleOracle>,
        pool: &rayon::ThreadPool,
        summary: &mut ClassificationSummary,
    ) {
        let timeout = self.config.timeout();
        let checks: Vec<(usize, ParagraphRole, Arc<OracleRequest>)> = text_indices
            .iter()
            .enumerate()
            .filter(|(_, &index)| !locked[index])
            .map(|(position, &index)| {
                let record = &document.records[index];
                let next = text_indices
                    .get(position + 1)
                    .map(|&n| document.records[n].text.clone());
                let request = build_request(&document.records, index, index, next, record.role);
                (index, record.role, Arc::new(request))
            })
            .collect();
        summary.verified = checks.len();

        // Every check reads the same snapshot; changes land after the join.
        let corrections: Vec<(usize, Option<(ParagraphRole, f32)>)> = pool.install(|| {
            checks
                .into_par_iter()
                .map(|(index, assigned, request)| {
                    let verdict = {
                        let oracle = Arc::clone(oracle);
                        let request = Arc::clone(&request);
                        call_with_timeout(timeout, move || oracle.verify(&request, assigned))
                    };
                    match verdict {
                        Ok(v) if v.is_correct => (index, None),
                        Ok(_) => {
                            let oracle = Arc::clone(oracle);
                            let answer =
                                call_with_timeout(timeout, move || oracle.predict(&request));
                            (index, answer.ok().and_then(|a| a.interpret()))
                        }
                        Err(e) => {
                            log::warn!("verification failed for paragraph {}: {}", index, e);
                            (index, None)
                        }
                    }
                })
                .collect()
        });

        for (index, correction) in corrections {
            let Some((role, confidence)) = correction else {
                continue;
            };
            let record = &mut document.records[index];
            if role != record.role && confidence >= self.config.verify_overwrite {
                log::debug!(
                    "verification moved paragraph {} from {} to {}",
                    index,
                    record.role,
                    role
                );
                assign(record, index, role, confidence);
                summary.overridden += 1;
            }
        }
    }

    fn fallback(&self, rule_role: ParagraphRole) -> (ParagraphRole, f32) {
        let role = match self.config.fallback {
            FallbackPolicy::Body => ParagraphRole::Body,
            FallbackPolicy::Rule => rule_role,
        };
        (role, self.config.fallback_confidence)
    }
}

/// Combine the rule role with the oracle's guess.
pub fn arbitrate(
    rule_role: ParagraphRole,
    predicted: (ParagraphRole, f32),
    config: &ClassifierConfig,
) -> (ParagraphRole, f32) {
    let (role, confidence) = predicted;
    if role == rule_role {
        return (rule_role, confidence.max(config.rule_confidence));
    }
    if confidence >= config.inference_accept {
        return (role, confidence);
    }
    if rule_role.is_special() {
        return (rule_role, config.rule_confidence);
    }
    (role, confidence * config.rule_confidence)
}

fn build_request(
    records: &[ParagraphRecord],
    index: usize,
    context_end: usize,
    next_text: Option<String>,
    rule_role: ParagraphRole,
) -> OracleRequest {
    let record = &records[index];
    let context = records[..context_end]
        .iter()
        .enumerate()
        .map(|(i, r)| ContextEntry {
            index: i,
            role: r.role,
            text: r.role.is_heading_like().then(|| r.text.clone()),
        })
        .collect();

    OracleRequest {
        index,
        text: record.text.clone(),
        attributes: record.attribute_tree(),
        context,
        next_text,
        rule_role,
    }
}

fn assign(record: &mut ParagraphRecord, index: usize, role: ParagraphRole, confidence: f32) {
    log::debug!(
        "paragraph {} => {} ({:.2}): {}",
        index,
        role,
        confidence,
        record.excerpt(30)
    );
    record.role = role;
    record.confidence = confidence;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arbitration_agreement() {
        let config = ClassifierConfig::default();
        assert_eq!(
            arbitrate(ParagraphRole::Body, (ParagraphRole::Body, 0.6), &config),
            (ParagraphRole::Body, 0.9)
        );
        assert_eq!(
            arbitrate(ParagraphRole::Heading1, (ParagraphRole::Heading1, 0.97), &config),
            (ParagraphRole::Heading1, 0.97)
        );
    }

    #[test]
    fn test_arbitration_confident_oracle_wins() {
        let config = ClassifierConfig::default();
        assert_eq!(
            arbitrate(ParagraphRole::Body, (ParagraphRole::TitleZh, 0.85), &config),
            (ParagraphRole::TitleZh, 0.85)
        );
    }

    #[test]
    fn test_arbitration_special_rule_wins_over_weak_oracle() {
        let config = ClassifierConfig::default();
        assert_eq!(
            arbitrate(ParagraphRole::References, (ParagraphRole::Body, 0.6), &config),
            (ParagraphRole::References, 0.9)
        );
    }

    #[test]
    fn test_arbitration_weak_oracle_is_discounted() {
        let config = ClassifierConfig::default();
        let (role, confidence) =
            arbitrate(ParagraphRole::Body, (ParagraphRole::Heading2, 0.5), &config);
        assert_eq!(role, ParagraphRole::Heading2);
        assert!((confidence - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_rule_only_classification() {
        let mut doc = Document::new();
        for (i, text) in ["摘要：", "本文研究论文格式。", "关键词：", "格式；论文；检查", "1 引言", "正文内容。"]
            .iter()
            .enumerate()
        {
            doc.add_record(ParagraphRecord::text(*text, i));
        }

        let summary = Classifier::new(ClassifierConfig::default()).classify(&mut doc);
        let roles: Vec<ParagraphRole> = doc.records.iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![
                ParagraphRole::AbstractZh,
                ParagraphRole::AbstractContentZh,
                ParagraphRole::KeywordsZh,
                ParagraphRole::KeywordsContentZh,
                ParagraphRole::Heading1,
                ParagraphRole::Body,
            ]
        );
        assert_eq!(summary.authoritative, 4);
        assert_eq!(summary.oracle_calls, 0);
        assert_eq!(doc.records[5].confidence, 0.5);
    }
}
