use serde::{Deserialize, Serialize};

/// Why a question was served; written to the selection audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
  FillingLearningGap,
  AppropriateDifficulty,
  ReinforcingWeakArea,
  BalancedSelection,
  #[default]
  Default,
}

impl SelectionReason {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::FillingLearningGap => "filling_learning_gap",
      Self::AppropriateDifficulty => "appropriate_difficulty",
      Self::ReinforcingWeakArea => "reinforcing_weak_area",
      Self::BalancedSelection => "balanced_selection",
      Self::Default => "default",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "filling_learning_gap" => Some(Self::FillingLearningGap),
      "appropriate_difficulty" => Some(Self::AppropriateDifficulty),
      "reinforcing_weak_area" => Some(Self::ReinforcingWeakArea),
      "balanced_selection" => Some(Self::BalancedSelection),
      "default" => Some(Self::Default),
      _ => None,
    }
  }
}

/// Write-once audit record for one served question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionLogEntry {
  pub session_id: String,
  pub question_id: i64,
  pub selection_reason: SelectionReason,
  pub difficulty_level: u8,
  /// 0-based rank within the session
  pub sequence_position: u32,
}
