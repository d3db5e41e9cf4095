use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_ADAPTIVITY_LEVEL, MAX_ADAPTIVITY_LEVEL, MIN_ADAPTIVITY_LEVEL};

/// How the target difficulty is shifted relative to the user's mastery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyPreference {
  #[default]
  Balanced,
  Challenging,
  Easier,
}

impl DifficultyPreference {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Balanced => "balanced",
      Self::Challenging => "challenging",
      Self::Easier => "easier",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "balanced" => Some(Self::Balanced),
      "challenging" => Some(Self::Challenging),
      "easier" => Some(Self::Easier),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptivePreferences {
  pub user_id: String,
  /// 1-10
  pub adaptivity_level: u8,
  pub difficulty_preference: DifficultyPreference,
  pub enable_adaptive_learning: bool,
  pub updated_at: DateTime<Utc>,
}

impl AdaptivePreferences {
  /// Defaults for a user who has never saved preferences: (5, balanced, enabled)
  pub fn defaults(user_id: &str) -> Self {
    Self {
      user_id: user_id.to_string(),
      adaptivity_level: DEFAULT_ADAPTIVITY_LEVEL,
      difficulty_preference: DifficultyPreference::Balanced,
      enable_adaptive_learning: true,
      updated_at: Utc::now(),
    }
  }

  /// Merge the supplied fields; untouched fields keep their current values
  pub fn apply(&mut self, update: &PreferencesUpdate) {
    if let Some(level) = update.adaptivity_level {
      self.adaptivity_level = clamp_adaptivity_level(level);
    }
    if let Some(pref) = update.difficulty_preference {
      self.difficulty_preference = pref;
    }
    if let Some(enabled) = update.enable_adaptive_learning {
      self.enable_adaptive_learning = enabled;
    }
    self.updated_at = Utc::now();
  }
}

/// Partial preference update; `None` leaves the stored value alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
  pub adaptivity_level: Option<u8>,
  pub difficulty_preference: Option<DifficultyPreference>,
  pub enable_adaptive_learning: Option<bool>,
}

pub fn clamp_adaptivity_level(level: u8) -> u8 {
  level.clamp(MIN_ADAPTIVITY_LEVEL, MAX_ADAPTIVITY_LEVEL)
}
