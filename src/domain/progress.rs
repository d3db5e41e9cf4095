use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate proficiency of one user on one subtopic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtopicProgress {
  pub user_id: String,
  pub subtopic_id: i64,
  /// 0-100
  pub mastery_level: u8,
  pub questions_attempted: u32,
  pub questions_correct: u32,
  pub last_attempt_at: Option<DateTime<Utc>>,
}

impl SubtopicProgress {
  pub fn empty(user_id: &str, subtopic_id: i64) -> Self {
    Self {
      user_id: user_id.to_string(),
      subtopic_id,
      mastery_level: 0,
      questions_attempted: 0,
      questions_correct: 0,
      last_attempt_at: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtopic {
  pub id: i64,
  pub topic_id: i64,
  pub name: String,
  pub position: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
  LearningGap,
  LowMastery,
  NextInProgression,
}

impl RecommendationReason {
  pub fn message(&self) -> &'static str {
    match self {
      Self::LearningGap => "Learning gap detected - practice needed",
      Self::LowMastery => "Low mastery level - more practice recommended",
      Self::NextInProgression => "Next subtopic in progression",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedSubtopic {
  pub subtopic_id: i64,
  pub subtopic_name: String,
  pub kind: RecommendationReason,
  pub reason: &'static str,
}

impl RecommendedSubtopic {
  pub fn new(subtopic: &Subtopic, kind: RecommendationReason) -> Self {
    Self {
      subtopic_id: subtopic.id,
      subtopic_name: subtopic.name.clone(),
      kind,
      reason: kind.message(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
  pub recommended_subtopics: Vec<RecommendedSubtopic>,
  pub learning_gaps_count: usize,
  pub has_adaptive_learning_enabled: bool,
}
