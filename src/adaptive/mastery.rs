//! Mastery tracking: per-question state machine and subtopic aggregation.
//!
//! Every decision is made on the rate *after* the new attempt is folded in.

use chrono::{DateTime, Utc};

use super::AdaptiveEngine;
use crate::config::{MASTERED_SUCCESS_RATE, REGRESSION_SUCCESS_RATE};
use crate::domain::{AttemptRecord, QuestionProgress, QuestionRecord, QuestionStatus, SubtopicProgress};
use crate::error::Result;
use crate::store::AdaptiveStore;

/// Success rate and attempt count after one more attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldedRate {
  pub success_rate: f64,
  pub attempt_count: u32,
}

/// Fold one attempt into a (rate, count) pair.
///
/// The prior success count is reconstructed from the stored rate, so a rate
/// that was itself rounded never drifts further than one attempt.
pub fn fold_attempt(old_success_rate: f64, old_attempt_count: u32, is_correct: bool) -> FoldedRate {
  let old_successes = (old_success_rate.clamp(0.0, 100.0) * old_attempt_count as f64 / 100.0).round();
  let successes = old_successes + if is_correct { 1.0 } else { 0.0 };
  let attempt_count = old_attempt_count.saturating_add(1);

  let success_rate = if attempt_count == 0 {
    0.0
  } else {
    successes / attempt_count as f64 * 100.0
  };

  FoldedRate {
    success_rate: success_rate.clamp(0.0, 100.0),
    attempt_count,
  }
}

/// State transition for one answer, keyed on the post-attempt success rate
pub fn next_status(current: QuestionStatus, is_correct: bool, new_success_rate: f64) -> QuestionStatus {
  match (current, is_correct) {
    (QuestionStatus::ToStart, true) => QuestionStatus::Learning,
    (QuestionStatus::ToStart, false) => QuestionStatus::ToStart,
    (QuestionStatus::Learning, true) if new_success_rate >= MASTERED_SUCCESS_RATE => QuestionStatus::Mastered,
    (QuestionStatus::Learning, true) => QuestionStatus::Learning,
    (QuestionStatus::Learning, false) if new_success_rate < REGRESSION_SUCCESS_RATE => QuestionStatus::ToStart,
    (QuestionStatus::Learning, false) => QuestionStatus::Learning,
    // Mastered never drops straight to ToStart
    (QuestionStatus::Mastered, false) => QuestionStatus::Learning,
    (QuestionStatus::Mastered, true) => QuestionStatus::Mastered,
  }
}

/// Apply one answer to a question record
pub fn apply_answer(question: &QuestionRecord, is_correct: bool) -> QuestionRecord {
  let folded = fold_attempt(question.success_rate.unwrap_or(0.0), question.attempt_count, is_correct);
  QuestionRecord {
    attempt_count: folded.attempt_count,
    success_rate: Some(folded.success_rate),
    status: next_status(question.status, is_correct, folded.success_rate),
    ..question.clone()
  }
}

/// Fold one answer into the subtopic aggregate
pub fn apply_subtopic_answer(
  progress: &SubtopicProgress,
  is_correct: bool,
  at: DateTime<Utc>,
) -> SubtopicProgress {
  let questions_attempted = progress.questions_attempted.saturating_add(1);
  let questions_correct = progress.questions_correct + u32::from(is_correct);
  let mastery = questions_correct as f64 / questions_attempted as f64 * 100.0;

  SubtopicProgress {
    mastery_level: mastery.round().clamp(0.0, 100.0) as u8,
    questions_attempted,
    questions_correct,
    last_attempt_at: Some(at),
    ..progress.clone()
  }
}

/// Result of recording one answer
#[derive(Debug, Clone, PartialEq)]
pub struct MasteryUpdate {
  pub previous_status: QuestionStatus,
  pub question: QuestionRecord,
  pub subtopic: SubtopicProgress,
}

impl<S: AdaptiveStore> AdaptiveEngine<S> {
  /// Record a scored attempt: append it to the history, advance the question's
  /// mastery state and refresh the subtopic aggregate, all in one transaction.
  pub fn record_answer(
    &self,
    user_id: &str,
    question: &QuestionRecord,
    is_correct: bool,
  ) -> Result<MasteryUpdate> {
    let now = Utc::now();
    let attempt = AttemptRecord {
      question_id: question.id,
      subtopic_id: question.subtopic_id,
      question_type_id: question.question_type_id,
      is_correct,
      attempted_at: now,
    };

    let update = self.store.record_attempt(user_id, &attempt, |stored_question, stored_subtopic| {
      // Persisted state wins over whatever the caller carried along
      let mut current = question.clone();
      if let Some(stored) = stored_question {
        current.attempt_count = stored.attempt_count;
        current.success_rate = Some(stored.success_rate);
        current.status = stored.status;
      }

      let updated = apply_answer(&current, is_correct);
      let question_progress = QuestionProgress {
        user_id: user_id.to_string(),
        question_id: updated.id,
        attempt_count: updated.attempt_count,
        success_rate: updated.success_rate.unwrap_or(0.0),
        status: updated.status,
        last_attempt_at: now,
      };

      let subtopic = stored_subtopic.unwrap_or_else(|| SubtopicProgress::empty(user_id, question.subtopic_id));
      let subtopic = apply_subtopic_answer(&subtopic, is_correct, now);

      let update = MasteryUpdate {
        previous_status: current.status,
        question: updated,
        subtopic: subtopic.clone(),
      };
      (question_progress, subtopic, update)
    })?;

    if update.previous_status != update.question.status {
      tracing::debug!(
        user_id,
        question_id = question.id,
        from = update.previous_status.as_str(),
        to = update.question.status.as_str(),
        "Question status changed"
      );
    }

    Ok(update)
  }

  /// Fill the per-user fields of candidates from persisted question progress
  pub fn apply_question_progress(&self, user_id: &str, candidates: &mut [QuestionRecord]) -> Result<()> {
    for candidate in candidates.iter_mut() {
      if let Some(stored) = self.store.find_question_progress(user_id, candidate.id)? {
        candidate.attempt_count = stored.attempt_count;
        candidate.success_rate = Some(stored.success_rate);
        candidate.status = stored.status;
      }
    }
    Ok(())
  }
}
