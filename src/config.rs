//! Engine configuration constants.
//!
//! Every threshold the adaptive engine relies on lives here so the scoring,
//! gap and mastery modules never carry magic numbers of their own.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== File / Environment Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    engine: Option<EngineConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EngineConfig {
    subject: Option<String>,
}

/// Default database location when nothing else is configured
pub const DEFAULT_DB_PATH: &str = "data/adaptive.db";

/// Subject used when neither config.toml nor the environment names one
pub const DEFAULT_SUBJECT: &str = "general";

fn read_config_file() -> Option<AppConfig> {
    let contents = std::fs::read_to_string("config.toml").ok()?;
    match toml::from_str::<AppConfig>(&contents) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Ignoring malformed config.toml: {}", e);
            None
        }
    }
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    let _ = dotenvy::dotenv();

    if let Some(path) = read_config_file()
        .and_then(|c| c.database)
        .and_then(|db| db.path)
    {
        tracing::info!("Using database from config.toml: {}", path);
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    let default = PathBuf::from(DEFAULT_DB_PATH);
    tracing::info!("Using default database path: {}", default.display());
    default
}

/// Load the subject identifier with priority: config.toml > .env > default
pub fn load_subject() -> String {
    let _ = dotenvy::dotenv();

    if let Some(subject) = read_config_file()
        .and_then(|c| c.engine)
        .and_then(|e| e.subject)
    {
        return subject;
    }

    std::env::var("ADAPTIVE_SUBJECT").unwrap_or_else(|_| DEFAULT_SUBJECT.to_string())
}

// ==================== Preference Defaults ====================

pub const DEFAULT_ADAPTIVITY_LEVEL: u8 = 5;
pub const MIN_ADAPTIVITY_LEVEL: u8 = 1;
pub const MAX_ADAPTIVITY_LEVEL: u8 = 10;

// ==================== Mastery ====================

/// Success rate (percent) at which a Learning question becomes Mastered
pub const MASTERED_SUCCESS_RATE: f64 = 75.0;

/// Below this success rate an incorrect answer sends a Learning question back to ToStart
pub const REGRESSION_SUCCESS_RATE: f64 = 40.0;

// ==================== Learning Gaps ====================

/// Incorrect attempts on one concept needed before a gap is opened
pub const GAP_MIN_INCORRECT: usize = 3;

/// Evidence questions that must be re-answered before a gap can be resolved
pub const GAP_RESOLUTION_MIN_EVIDENCE: usize = 2;

/// Correct percentage over the re-answered evidence needed to resolve a gap
pub const GAP_RESOLUTION_PERCENT: f64 = 75.0;

pub const MAX_GAP_SEVERITY: u8 = 10;

// ==================== Question Selection ====================

/// Upper bound on questions served per session
pub const MAX_SESSION_QUESTIONS: usize = 10;

/// How many recently attempted questions receive the recency penalty
pub const RECENT_ATTEMPT_WINDOW: usize = 10;

pub const RECENT_ATTEMPT_PENALTY: f64 = -15.0;

pub const DIFFICULTY_WEIGHT: f64 = 2.0;
pub const GAP_WEIGHT: f64 = 3.0;

/// Success rate assumed for a candidate that carries none
pub const NEUTRAL_SUCCESS_RATE: f64 = 50.0;

/// Exclusive upper bound of the random tie-breaker
pub const JITTER_CEILING: f64 = 5.0;

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

// ==================== Recommendations ====================

/// Subtopics under this mastery level are recommended for more practice
pub const LOW_MASTERY_LEVEL: u8 = 50;

/// Best mastery above this unlocks a "next subtopic" recommendation
pub const PROGRESSION_MASTERY_LEVEL: u8 = 70;
