use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user mastery state of a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QuestionStatus {
  #[default]
  ToStart,
  Learning,
  Mastered,
}

impl QuestionStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::ToStart => "ToStart",
      Self::Learning => "Learning",
      Self::Mastered => "Mastered",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "ToStart" => Some(Self::ToStart),
      "Learning" => Some(Self::Learning),
      "Mastered" => Some(Self::Mastered),
      _ => None,
    }
  }
}

/// A candidate question plus the caller's per-user view of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
  pub id: i64,
  pub subtopic_id: i64,
  /// 1-5
  pub difficulty_level_id: u8,
  /// Concept proxy
  pub question_type_id: i64,
  pub attempt_count: u32,
  /// 0-100, None when the user has no history on this question
  pub success_rate: Option<f64>,
  pub status: QuestionStatus,
}

impl QuestionRecord {
  /// A question the user has never attempted
  pub fn new(id: i64, subtopic_id: i64, difficulty_level_id: u8, question_type_id: i64) -> Self {
    Self {
      id,
      subtopic_id,
      difficulty_level_id,
      question_type_id,
      attempt_count: 0,
      success_rate: None,
      status: QuestionStatus::ToStart,
    }
  }
}

/// Persisted per-user, per-question mastery state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionProgress {
  pub user_id: String,
  pub question_id: i64,
  pub attempt_count: u32,
  pub success_rate: f64,
  pub status: QuestionStatus,
  pub last_attempt_at: DateTime<Utc>,
}

/// One answered question, joined with the concept data of its question
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
  pub question_id: i64,
  pub subtopic_id: i64,
  pub question_type_id: i64,
  pub is_correct: bool,
  pub attempted_at: DateTime<Utc>,
}

/// Outcome of one question in a finished batch, as reported by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
  pub question_id: i64,
  pub is_correct: bool,
}

impl QuestionResult {
  pub fn new(question_id: i64, is_correct: bool) -> Self {
    Self { question_id, is_correct }
  }
}
