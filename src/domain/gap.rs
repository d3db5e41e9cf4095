use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapStatus {
  Active,
  Testing,
  Resolved,
}

impl GapStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Testing => "testing",
      Self::Resolved => "resolved",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "active" => Some(Self::Active),
      "testing" => Some(Self::Testing),
      "resolved" => Some(Self::Resolved),
      _ => None,
    }
  }

  /// Active and testing gaps are both still open
  pub fn is_open(&self) -> bool {
    !matches!(self, Self::Resolved)
  }
}

/// A recurring, evidence-backed weakness on one concept within a subtopic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningGap {
  pub id: i64,
  pub user_id: String,
  pub subtopic_id: i64,
  pub concept_description: String,
  /// 1-10
  pub severity: u8,
  /// Contributing question ids in discovery order
  pub evidence_question_ids: Vec<i64>,
  pub status: GapStatus,
  pub detected_at: DateTime<Utc>,
  pub resolved_at: Option<DateTime<Utc>>,
}

impl LearningGap {
  pub fn has_evidence(&self, question_id: i64) -> bool {
    self.evidence_question_ids.contains(&question_id)
  }
}

/// Gap row about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewLearningGap {
  pub user_id: String,
  pub subtopic_id: i64,
  pub concept_description: String,
  pub severity: u8,
  pub evidence_question_ids: Vec<i64>,
  pub detected_at: DateTime<Utc>,
}
