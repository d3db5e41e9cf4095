//! Learning gap detection and resolution.
//!
//! A gap is opened once a concept collects three incorrect attempts within a
//! subtopic, and resolved only when at least two of its evidence questions are
//! answered again with 75% or better correctness.

use chrono::Utc;
use std::collections::HashMap;

use super::{AdaptiveEngine, ConceptKey};
use crate::config::{
    GAP_MIN_INCORRECT, GAP_RESOLUTION_MIN_EVIDENCE, GAP_RESOLUTION_PERCENT, MAX_GAP_SEVERITY,
};
use crate::domain::{AttemptRecord, LearningGap, NewLearningGap, QuestionResult};
use crate::error::Result;
use crate::store::AdaptiveStore;

/// Incorrect attempts sharing one concept key
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptCluster {
    pub concept: String,
    pub incorrect_count: usize,
    /// Distinct question ids in the order they were first missed
    pub question_ids: Vec<i64>,
}

/// Outcome of an end-of-batch gap update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapUpdate {
    pub resolved_gap_ids: Vec<i64>,
    pub opened: Vec<LearningGap>,
}

/// Severity grows by one for every two misses, capped at 10
pub fn gap_severity(incorrect_count: usize) -> u8 {
    incorrect_count.div_ceil(2).clamp(1, MAX_GAP_SEVERITY as usize) as u8
}

/// Group incorrect attempts by concept, preserving discovery order
pub fn cluster_incorrect_attempts(
    attempts: &[AttemptRecord],
    concept_key: &dyn ConceptKey,
) -> Vec<ConceptCluster> {
    let mut clusters: Vec<ConceptCluster> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for attempt in attempts.iter().filter(|a| !a.is_correct) {
        let concept = concept_key.concept_key(attempt.question_id, attempt.question_type_id);
        let slot = *index.entry(concept.clone()).or_insert_with(|| {
            clusters.push(ConceptCluster {
                concept,
                incorrect_count: 0,
                question_ids: Vec::new(),
            });
            clusters.len() - 1
        });

        let cluster = &mut clusters[slot];
        cluster.incorrect_count += 1;
        if !cluster.question_ids.contains(&attempt.question_id) {
            cluster.question_ids.push(attempt.question_id);
        }
    }

    clusters
}

/// Whether a batch of results disproves a gap.
///
/// The batch is intersected with the gap's evidence questions. At least two
/// distinct evidence questions must be answered, and each one counts once
/// with its latest result in the batch.
pub fn batch_resolves_gap(gap: &LearningGap, results: &[QuestionResult]) -> bool {
    let mut latest: HashMap<i64, bool> = HashMap::new();
    for result in results.iter().filter(|r| gap.has_evidence(r.question_id)) {
        latest.insert(result.question_id, result.is_correct);
    }

    if latest.len() < GAP_RESOLUTION_MIN_EVIDENCE {
        return false;
    }

    let correct = latest.values().filter(|&&is_correct| is_correct).count();
    let percent = correct as f64 / latest.len() as f64 * 100.0;
    percent >= GAP_RESOLUTION_PERCENT
}

fn is_perfect_run(results: &[QuestionResult]) -> bool {
    !results.is_empty() && results.iter().all(|r| r.is_correct)
}

impl<S: AdaptiveStore> AdaptiveEngine<S> {
    /// Scan the user's incorrect attempts on a subtopic and open a gap for
    /// every concept that has crossed the threshold. Returns the gaps opened.
    pub fn detect_learning_gaps(&self, user_id: &str, subtopic_id: i64) -> Result<Vec<LearningGap>> {
        let attempts = self.store.list_attempts(user_id, subtopic_id)?;

        let incorrect = attempts.iter().filter(|a| !a.is_correct).count();
        if incorrect < GAP_MIN_INCORRECT {
            tracing::debug!(user_id, subtopic_id, incorrect, "Not enough incorrect attempts for gap detection");
            return Ok(Vec::new());
        }

        let mut opened = Vec::new();
        for cluster in cluster_incorrect_attempts(&attempts, self.concept_key.as_ref()) {
            if cluster.incorrect_count < GAP_MIN_INCORRECT {
                continue;
            }

            if self
                .store
                .find_active_gap(user_id, subtopic_id, &cluster.concept)?
                .is_some()
            {
                continue;
            }

            let gap = NewLearningGap {
                user_id: user_id.to_string(),
                subtopic_id,
                severity: gap_severity(cluster.incorrect_count),
                concept_description: cluster.concept,
                evidence_question_ids: cluster.question_ids,
                detected_at: Utc::now(),
            };

            // None means a concurrent pass opened the same gap first
            if let Some(created) = self.store.insert_gap(&gap)? {
                tracing::info!(
                    user_id,
                    subtopic_id,
                    concept = %created.concept_description,
                    severity = created.severity,
                    "Learning gap detected"
                );
                opened.push(created);
            }
        }

        Ok(opened)
    }

    /// Resolve gaps disproved by a finished batch, then look for new ones
    /// unless the batch was flawless.
    pub fn update_learning_gaps(
        &self,
        user_id: &str,
        subtopic_id: i64,
        results: &[QuestionResult],
    ) -> Result<GapUpdate> {
        let mut update = GapUpdate::default();
        let now = Utc::now();

        for gap in self.store.list_active_gaps_for(user_id, &[subtopic_id])? {
            if batch_resolves_gap(&gap, results) && self.store.resolve_gap(gap.id, now)? {
                tracing::info!(
                    user_id,
                    subtopic_id,
                    gap_id = gap.id,
                    concept = %gap.concept_description,
                    "Learning gap resolved"
                );
                update.resolved_gap_ids.push(gap.id);
            }
        }

        if is_perfect_run(results) {
            return Ok(update);
        }

        update.opened = self.detect_learning_gaps(user_id, subtopic_id)?;
        Ok(update)
    }
}
