//! Adaptive preference rows (one per user per subject)

use rusqlite::{params, Connection, OptionalExtension, Result};

use super::{format_timestamp, invalid_column, parse_timestamp};
use crate::domain::{AdaptivePreferences, DifficultyPreference, Subject};

pub fn find_preferences(
    conn: &Connection,
    subject: &Subject,
    user_id: &str,
) -> Result<Option<AdaptivePreferences>> {
    conn.query_row(
        r#"
        SELECT user_id, adaptivity_level, difficulty_preference, enable_adaptive_learning, updated_at
        FROM adaptive_preferences
        WHERE subject = ?1 AND user_id = ?2
        "#,
        params![subject.as_str(), user_id],
        row_to_preferences,
    )
    .optional()
}

/// Insert or fully overwrite the preference row
pub fn upsert_preferences(
    conn: &Connection,
    subject: &Subject,
    prefs: &AdaptivePreferences,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO adaptive_preferences
          (subject, user_id, adaptivity_level, difficulty_preference, enable_adaptive_learning, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (subject, user_id) DO UPDATE SET
          adaptivity_level = excluded.adaptivity_level,
          difficulty_preference = excluded.difficulty_preference,
          enable_adaptive_learning = excluded.enable_adaptive_learning,
          updated_at = excluded.updated_at
        "#,
        params![
            subject.as_str(),
            prefs.user_id,
            prefs.adaptivity_level,
            prefs.difficulty_preference.as_str(),
            prefs.enable_adaptive_learning,
            format_timestamp(&prefs.updated_at),
        ],
    )?;
    Ok(())
}

/// Insert only when the user has no row yet; returns true when a row was written
pub fn insert_preferences_if_absent(
    conn: &Connection,
    subject: &Subject,
    prefs: &AdaptivePreferences,
) -> Result<bool> {
    let inserted = conn.execute(
        r#"
        INSERT INTO adaptive_preferences
          (subject, user_id, adaptivity_level, difficulty_preference, enable_adaptive_learning, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT (subject, user_id) DO NOTHING
        "#,
        params![
            subject.as_str(),
            prefs.user_id,
            prefs.adaptivity_level,
            prefs.difficulty_preference.as_str(),
            prefs.enable_adaptive_learning,
            format_timestamp(&prefs.updated_at),
        ],
    )?;
    Ok(inserted > 0)
}

fn row_to_preferences(row: &rusqlite::Row) -> Result<AdaptivePreferences> {
    let pref_str: String = row.get(2)?;
    let updated_at_str: String = row.get(4)?;

    Ok(AdaptivePreferences {
        user_id: row.get(0)?,
        adaptivity_level: row.get(1)?,
        difficulty_preference: DifficultyPreference::from_str(&pref_str)
            .ok_or_else(|| invalid_column(2, format!("unknown difficulty preference {:?}", pref_str)))?,
        enable_adaptive_learning: row.get(3)?,
        updated_at: parse_timestamp(&updated_at_str),
    })
}
