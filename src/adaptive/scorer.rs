//! Question scoring and session selection.
//!
//! Each candidate gets an additive score built from:
//! - difficulty fit against the user's target difficulty (x2)
//! - severity of an open learning gap the question is evidence for (x3)
//! - a penalty if it was among the most recently attempted questions
//! - weakness bias (lower success rate = higher score)
//! - a small random jitter to avoid serving identical sessions

use rand::Rng;
use std::collections::HashSet;

use super::AdaptiveEngine;
use crate::config::{
  DIFFICULTY_WEIGHT, GAP_WEIGHT, JITTER_CEILING, MAX_DIFFICULTY, MAX_SESSION_QUESTIONS, MIN_DIFFICULTY,
  NEUTRAL_SUCCESS_RATE, RECENT_ATTEMPT_PENALTY, RECENT_ATTEMPT_WINDOW,
};
use crate::db::LogOnError;
use crate::domain::{DifficultyPreference, LearningGap, QuestionRecord, SelectionLogEntry, SelectionReason};
use crate::error::Result;
use crate::store::AdaptiveStore;

/// Source of the score tie-breaker, drawn once per candidate
pub trait JitterSource {
  /// A value in `[0, JITTER_CEILING)`
  fn next_jitter(&mut self) -> f64;
}

/// Uniform jitter from any `rand` generator
pub struct RandomJitter<R>(pub R);

impl<R: Rng> JitterSource for RandomJitter<R> {
  fn next_jitter(&mut self) -> f64 {
    self.0.random_range(0.0..JITTER_CEILING)
  }
}

/// Constant jitter; makes selection fully deterministic
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
  fn next_jitter(&mut self) -> f64 {
    self.0
  }
}

/// A candidate with its score breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuestion {
  pub question: QuestionRecord,
  pub score: f64,
  pub selection_reason: SelectionReason,
  pub difficulty_score: i32,
  pub gap_score: u8,
  pub recent_attempt_penalty: f64,
  pub success_rate_score: f64,
  pub jitter: f64,
}

/// Everything about the user that scoring needs, resolved once per selection
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
  pub target_difficulty: u8,
  pub active_gaps: &'a [LearningGap],
  pub recent_question_ids: HashSet<i64>,
}

/// Difficulty the user should be practising at, 1-5
pub fn target_difficulty(mastery_level: u8, preference: DifficultyPreference) -> u8 {
  let base = (mastery_level as f64 / 20.0).ceil() as i64;
  let base = base.clamp(MIN_DIFFICULTY as i64, MAX_DIFFICULTY as i64);

  let adjusted = match preference {
    DifficultyPreference::Balanced => base,
    DifficultyPreference::Challenging => base + 1,
    DifficultyPreference::Easier => base - 1,
  };
  adjusted.clamp(MIN_DIFFICULTY as i64, MAX_DIFFICULTY as i64) as u8
}

pub fn score_candidate(
  candidate: &QuestionRecord,
  ctx: &ScoringContext<'_>,
  jitter: &mut dyn JitterSource,
) -> ScoredQuestion {
  let difficulty_score = 10 - (candidate.difficulty_level_id as i32 - ctx.target_difficulty as i32).abs();

  let gap_score = ctx
    .active_gaps
    .iter()
    .find(|gap| gap.has_evidence(candidate.id))
    .map(|gap| gap.severity)
    .unwrap_or(0);

  let recent_attempt_penalty = if ctx.recent_question_ids.contains(&candidate.id) {
    RECENT_ATTEMPT_PENALTY
  } else {
    0.0
  };

  let success_rate = candidate.success_rate.unwrap_or(NEUTRAL_SUCCESS_RATE).clamp(0.0, 100.0);
  let success_rate_score = 10.0 - success_rate / 10.0;

  let jitter = jitter.next_jitter();

  let score = difficulty_score as f64 * DIFFICULTY_WEIGHT
    + gap_score as f64 * GAP_WEIGHT
    + recent_attempt_penalty
    + success_rate_score
    + jitter;

  let selection_reason = if gap_score > 0 {
    SelectionReason::FillingLearningGap
  } else if difficulty_score > 7 {
    SelectionReason::AppropriateDifficulty
  } else if success_rate_score > 5.0 {
    SelectionReason::ReinforcingWeakArea
  } else {
    SelectionReason::BalancedSelection
  };

  ScoredQuestion {
    question: candidate.clone(),
    score,
    selection_reason,
    difficulty_score,
    gap_score,
    recent_attempt_penalty,
    success_rate_score,
    jitter,
  }
}

/// Highest score first; ties keep candidate order
pub fn rank_and_truncate(mut scored: Vec<ScoredQuestion>, limit: usize) -> Vec<ScoredQuestion> {
  scored.sort_by(|a, b| b.score.total_cmp(&a.score));
  scored.truncate(limit);
  scored
}

pub fn selection_log_entries(session_id: &str, selected: &[ScoredQuestion]) -> Vec<SelectionLogEntry> {
  selected
    .iter()
    .enumerate()
    .map(|(position, scored)| SelectionLogEntry {
      session_id: session_id.to_string(),
      question_id: scored.question.id,
      selection_reason: scored.selection_reason,
      difficulty_level: scored.question.difficulty_level_id,
      sequence_position: position as u32,
    })
    .collect()
}

impl<S: AdaptiveStore> AdaptiveEngine<S> {
  /// Order candidates for a practice session, at most ten of them.
  ///
  /// When `session_id` is given the chosen order is written to the selection
  /// log; a failed log write is reported but never fails the selection.
  pub fn select_adaptive_questions(
    &self,
    user_id: &str,
    subtopic_id: i64,
    candidates: &[QuestionRecord],
    session_id: Option<&str>,
  ) -> Result<Vec<ScoredQuestion>> {
    let mut jitter = RandomJitter(rand::rng());
    self.select_adaptive_questions_with(user_id, subtopic_id, candidates, session_id, &mut jitter)
  }

  /// Same as [`Self::select_adaptive_questions`] with an explicit jitter source
  pub fn select_adaptive_questions_with(
    &self,
    user_id: &str,
    subtopic_id: i64,
    candidates: &[QuestionRecord],
    session_id: Option<&str>,
    jitter: &mut dyn JitterSource,
  ) -> Result<Vec<ScoredQuestion>> {
    if candidates.is_empty() {
      return Ok(Vec::new());
    }

    let prefs = self.get_or_create_preferences(user_id)?;
    let mastery_level = self
      .store
      .find_subtopic_progress(user_id, subtopic_id)?
      .map(|p| p.mastery_level)
      .unwrap_or(0);

    let active_gaps = self.store.list_active_gaps_for(user_id, &[subtopic_id])?;
    let recent_question_ids: HashSet<i64> = self
      .store
      .list_recent_attempt_question_ids(user_id, subtopic_id, RECENT_ATTEMPT_WINDOW)?
      .into_iter()
      .collect();

    let ctx = ScoringContext {
      target_difficulty: target_difficulty(mastery_level, prefs.difficulty_preference),
      active_gaps: &active_gaps,
      recent_question_ids,
    };

    tracing::debug!(
      user_id,
      subtopic_id,
      mastery_level,
      target_difficulty = ctx.target_difficulty,
      active_gaps = active_gaps.len(),
      candidates = candidates.len(),
      "Scoring candidates"
    );

    let scored = candidates
      .iter()
      .map(|candidate| score_candidate(candidate, &ctx, jitter))
      .collect();
    let selected = rank_and_truncate(scored, MAX_SESSION_QUESTIONS);

    if let Some(session_id) = session_id {
      let entries = selection_log_entries(session_id, &selected);
      self
        .store
        .insert_selection_log(&entries)
        .inspect_err(|e| self.report_audit_failure(e))
        .log_warn("Failed to write selection log");
    }

    Ok(selected)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::list_selection_log;
  use crate::domain::{GapStatus, PreferencesUpdate, QuestionStatus, SubtopicProgress};
  use crate::store::AdaptiveStore;
  use crate::testing::TestEnv;
  use chrono::Utc;
  use rand::SeedableRng;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  fn question(id: i64, difficulty: u8) -> QuestionRecord {
    QuestionRecord::new(id, 1, difficulty, 7)
  }

  fn gap(evidence: &[i64], severity: u8) -> LearningGap {
    LearningGap {
      id: 1,
      user_id: "u1".to_string(),
      subtopic_id: 1,
      concept_description: "7".to_string(),
      severity,
      evidence_question_ids: evidence.to_vec(),
      status: GapStatus::Active,
      detected_at: Utc::now(),
      resolved_at: None,
    }
  }

  fn context<'a>(target: u8, gaps: &'a [LearningGap], recent: &[i64]) -> ScoringContext<'a> {
    ScoringContext {
      target_difficulty: target,
      active_gaps: gaps,
      recent_question_ids: recent.iter().copied().collect(),
    }
  }

  #[test]
  fn test_target_difficulty_examples() {
    assert_eq!(target_difficulty(0, DifficultyPreference::Balanced), 1);
    assert_eq!(target_difficulty(100, DifficultyPreference::Balanced), 5);
    assert_eq!(target_difficulty(100, DifficultyPreference::Challenging), 5);
    assert_eq!(target_difficulty(0, DifficultyPreference::Easier), 1);
    assert_eq!(target_difficulty(41, DifficultyPreference::Balanced), 3);
    assert_eq!(target_difficulty(41, DifficultyPreference::Challenging), 4);
    assert_eq!(target_difficulty(41, DifficultyPreference::Easier), 2);
  }

  #[test]
  fn test_score_components() {
    let gaps = [gap(&[5], 4)];
    let ctx = context(3, &gaps, &[6]);
    let mut jitter = FixedJitter(0.0);

    let on_target = score_candidate(&question(1, 3), &ctx, &mut jitter);
    assert_eq!(on_target.difficulty_score, 10);
    assert_eq!(on_target.gap_score, 0);
    assert!((on_target.success_rate_score - 5.0).abs() < f64::EPSILON);
    assert!((on_target.score - 25.0).abs() < f64::EPSILON);
    assert_eq!(on_target.selection_reason, SelectionReason::AppropriateDifficulty);

    let gap_question = score_candidate(&question(5, 1), &ctx, &mut jitter);
    assert_eq!(gap_question.difficulty_score, 8);
    assert_eq!(gap_question.gap_score, 4);
    assert!((gap_question.score - (16.0 + 12.0 + 5.0)).abs() < f64::EPSILON);
    assert_eq!(gap_question.selection_reason, SelectionReason::FillingLearningGap);

    let recent = score_candidate(&question(6, 3), &ctx, &mut jitter);
    assert!((recent.recent_attempt_penalty + 15.0).abs() < f64::EPSILON);
    assert!((recent.score - 10.0).abs() < f64::EPSILON);
  }

  #[test]
  fn test_difficulty_score_can_go_negative_far_off_target() {
    let ctx = context(1, &[], &[]);
    let scored = score_candidate(&question(1, 15), &ctx, &mut FixedJitter(0.0));
    assert_eq!(scored.difficulty_score, -4);
  }

  #[test]
  fn test_reason_fallbacks() {
    let ctx = context(1, &[], &[]);
    let mut jitter = FixedJitter(0.0);

    let weak = QuestionRecord {
      success_rate: Some(20.0),
      status: QuestionStatus::Learning,
      attempt_count: 5,
      ..question(1, 5)
    };
    assert_eq!(
      score_candidate(&weak, &ctx, &mut jitter).selection_reason,
      SelectionReason::ReinforcingWeakArea
    );

    let strong = QuestionRecord {
      success_rate: Some(90.0),
      ..weak.clone()
    };
    assert_eq!(
      score_candidate(&strong, &ctx, &mut jitter).selection_reason,
      SelectionReason::BalancedSelection
    );

    // Neutral default (50%) scores exactly 5, which is not a weak area
    assert_eq!(
      score_candidate(&question(2, 5), &ctx, &mut jitter).selection_reason,
      SelectionReason::BalancedSelection
    );
  }

  #[test]
  fn test_random_jitter_within_bounds() {
    let mut jitter = RandomJitter(rand::rngs::StdRng::seed_from_u64(42));
    for _ in 0..1000 {
      let value = jitter.next_jitter();
      assert!((0.0..JITTER_CEILING).contains(&value));
    }
  }

  #[test]
  fn test_rank_and_truncate_orders_descending() {
    let ctx = context(3, &[], &[]);
    let scored: Vec<_> = (1..=15)
      .map(|id| score_candidate(&question(id, (id % 5 + 1) as u8), &ctx, &mut FixedJitter(0.0)))
      .collect();

    let ranked = rank_and_truncate(scored, 10);
    assert_eq!(ranked.len(), 10);
    for pair in ranked.windows(2) {
      assert!(pair[0].score >= pair[1].score);
    }
  }

  #[test]
  fn test_select_empty_candidates() {
    let env = TestEnv::new().unwrap();
    let engine = env.engine();

    let selected = engine.select_adaptive_questions("u1", 1, &[], Some("s1")).unwrap();
    assert!(selected.is_empty());
    assert_eq!(env.count_rows("selection_logs"), 0);
  }

  #[test]
  fn test_select_caps_at_ten() {
    let env = TestEnv::new().unwrap();
    let engine = env.engine();
    let candidates: Vec<_> = (1..=25).map(|id| question(id, 3)).collect();

    let selected = engine.select_adaptive_questions("u1", 1, &candidates, None).unwrap();
    assert_eq!(selected.len(), 10);

    let few: Vec<_> = (1..=4).map(|id| question(id, 3)).collect();
    let selected = engine.select_adaptive_questions("u1", 1, &few, None).unwrap();
    assert_eq!(selected.len(), 4);
  }

  #[test]
  fn test_select_prefers_gap_evidence_and_avoids_recent() {
    let env = TestEnv::new().unwrap();
    let engine = env.engine();

    // Three misses on questions 1-3 open a gap; question 3 is also the latest attempt
    for id in [1, 2, 3] {
      env.add_attempt("u1", 1, id, 7, false);
    }
    engine.detect_learning_gaps("u1", 1).unwrap();

    let candidates: Vec<_> = (1..=6).map(|id| question(id, 1)).collect();
    let selected = engine
      .select_adaptive_questions_with("u1", 1, &candidates, None, &mut FixedJitter(0.0))
      .unwrap();

    // Gap (+6) is outweighed by the recency penalty (-15) for 1-3
    let order: Vec<i64> = selected.iter().map(|s| s.question.id).collect();
    assert_eq!(order, vec![4, 5, 6, 1, 2, 3]);
    assert_eq!(selected[3].selection_reason, SelectionReason::FillingLearningGap);
    assert_eq!(selected[0].selection_reason, SelectionReason::AppropriateDifficulty);
  }

  #[test]
  fn test_select_uses_mastery_and_preference_for_target() {
    let env = TestEnv::new().unwrap();
    let engine = env.engine();

    let mut progress = SubtopicProgress::empty("u1", 1);
    progress.mastery_level = 60;
    env.store.upsert_subtopic_progress(&progress).unwrap();
    engine
      .save_preferences(
        "u1",
        &PreferencesUpdate {
          difficulty_preference: Some(DifficultyPreference::Challenging),
          ..Default::default()
        },
      )
      .unwrap();

    let candidates: Vec<_> = (1..=5).map(|d| question(d as i64, d)).collect();
    let selected = engine
      .select_adaptive_questions_with("u1", 1, &candidates, None, &mut FixedJitter(0.0))
      .unwrap();

    // Target = ceil(60/20) + 1 = 4
    assert_eq!(selected[0].question.difficulty_level_id, 4);
    assert_eq!(selected[0].difficulty_score, 10);
  }

  #[test]
  fn test_select_writes_dense_selection_log() {
    let env = TestEnv::new().unwrap();
    let engine = env.engine();
    let candidates: Vec<_> = (1..=12).map(|id| question(id, (id % 5 + 1) as u8)).collect();

    let selected = engine
      .select_adaptive_questions("u1", 1, &candidates, Some("session-1"))
      .unwrap();

    let log = {
      let conn = env.conn();
      list_selection_log(&conn, env.store.subject(), "session-1").unwrap()
    };
    assert_eq!(log.len(), 10);
    for (position, (entry, scored)) in log.iter().zip(&selected).enumerate() {
      assert_eq!(entry.sequence_position, position as u32);
      assert_eq!(entry.question_id, scored.question.id);
      assert_eq!(entry.selection_reason, scored.selection_reason);
      assert_eq!(entry.difficulty_level, scored.question.difficulty_level_id);
    }
  }

  #[test]
  fn test_log_failure_does_not_fail_selection() {
    let env = TestEnv::new().unwrap();
    let failures = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&failures);
    let engine = env.engine().with_audit_hook(move |_| {
      counter.fetch_add(1, Ordering::SeqCst);
    });
    let candidates: Vec<_> = (1..=3).map(|id| question(id, 2)).collect();

    engine.select_adaptive_questions("u1", 1, &candidates, Some("s1")).unwrap();
    assert_eq!(failures.load(Ordering::SeqCst), 0);

    // Re-using the session id collides with the logged positions
    let selected = engine.select_adaptive_questions("u1", 1, &candidates, Some("s1")).unwrap();
    assert_eq!(selected.len(), 3);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(env.count_rows("selection_logs"), 3);
  }

  #[test]
  fn test_select_propagates_read_errors() {
    let env = TestEnv::new().unwrap();
    let engine = env.engine();
    env.execute("DROP TABLE learning_gaps");

    let result = engine.select_adaptive_questions("u1", 1, &[question(1, 1)], None);
    assert!(result.is_err());
  }
}
