//! Learning gap persistence
//!
//! Gaps are never deleted. Resolving one stamps `resolved_at`, which also
//! takes it out of the partial unique index so a fresh gap can be opened for
//! the same concept later on.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result};

use super::{format_timestamp, invalid_column, parse_timestamp, placeholders};
use crate::domain::{GapStatus, LearningGap, NewLearningGap, Subject};

const GAP_COLUMNS: &str = "id, user_id, subtopic_id, concept_description, severity, \
                           evidence_question_ids, status, detected_at, resolved_at";

pub fn find_active_gap(
    conn: &Connection,
    subject: &Subject,
    user_id: &str,
    subtopic_id: i64,
    concept: &str,
) -> Result<Option<LearningGap>> {
    conn.query_row(
        &format!(
            r#"
            SELECT {GAP_COLUMNS}
            FROM learning_gaps
            WHERE subject = ?1 AND user_id = ?2 AND subtopic_id = ?3
              AND concept_description = ?4 AND resolved_at IS NULL
            "#
        ),
        params![subject.as_str(), user_id, subtopic_id, concept],
        row_to_gap,
    )
    .optional()
}

/// Insert a new active gap. Returns `None` when an open gap for the same
/// (user, subtopic, concept) already exists.
pub fn insert_gap(
    conn: &Connection,
    subject: &Subject,
    gap: &NewLearningGap,
) -> Result<Option<LearningGap>> {
    let evidence = serde_json::to_string(&gap.evidence_question_ids)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    let inserted = conn.execute(
        r#"
        INSERT INTO learning_gaps
          (subject, user_id, subtopic_id, concept_description, severity,
           evidence_question_ids, status, detected_at, resolved_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL)
        ON CONFLICT DO NOTHING
        "#,
        params![
            subject.as_str(),
            gap.user_id,
            gap.subtopic_id,
            gap.concept_description,
            gap.severity,
            evidence,
            GapStatus::Active.as_str(),
            format_timestamp(&gap.detected_at),
        ],
    )?;

    if inserted == 0 {
        return Ok(None);
    }

    Ok(Some(LearningGap {
        id: conn.last_insert_rowid(),
        user_id: gap.user_id.clone(),
        subtopic_id: gap.subtopic_id,
        concept_description: gap.concept_description.clone(),
        severity: gap.severity,
        evidence_question_ids: gap.evidence_question_ids.clone(),
        status: GapStatus::Active,
        detected_at: gap.detected_at,
        resolved_at: None,
    }))
}

/// Mark a gap resolved. Returns false if it was already resolved or unknown.
pub fn resolve_gap(
    conn: &Connection,
    subject: &Subject,
    gap_id: i64,
    resolved_at: DateTime<Utc>,
) -> Result<bool> {
    let updated = conn.execute(
        r#"
        UPDATE learning_gaps
        SET status = ?1, resolved_at = ?2
        WHERE subject = ?3 AND id = ?4 AND resolved_at IS NULL
        "#,
        params![
            GapStatus::Resolved.as_str(),
            format_timestamp(&resolved_at),
            subject.as_str(),
            gap_id,
        ],
    )?;
    Ok(updated > 0)
}

/// Open gaps on the given subtopics, oldest first
pub fn list_active_gaps_for(
    conn: &Connection,
    subject: &Subject,
    user_id: &str,
    subtopic_ids: &[i64],
) -> Result<Vec<LearningGap>> {
    if subtopic_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT {GAP_COLUMNS}
        FROM learning_gaps
        WHERE subject = ?1 AND user_id = ?2 AND resolved_at IS NULL
          AND subtopic_id IN ({})
        ORDER BY detected_at ASC, id ASC
        "#,
        placeholders(3, subtopic_ids.len())
    );

    let mut bind: Vec<rusqlite::types::Value> = vec![
        subject.as_str().to_string().into(),
        user_id.to_string().into(),
    ];
    bind.extend(subtopic_ids.iter().map(|&id| id.into()));

    let mut stmt = conn.prepare(&sql)?;
    let gaps = stmt
        .query_map(params_from_iter(bind), row_to_gap)?
        .collect::<Result<Vec<_>>>()?;
    Ok(gaps)
}

fn row_to_gap(row: &rusqlite::Row) -> Result<LearningGap> {
    let severity: i64 = row.get(4)?;
    let evidence_json: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let detected_at: String = row.get(7)?;
    let resolved_at: Option<String> = row.get(8)?;

    let evidence_question_ids: Vec<i64> = serde_json::from_str(&evidence_json)
        .map_err(|e| invalid_column(5, format!("bad evidence list: {}", e)))?;

    Ok(LearningGap {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subtopic_id: row.get(2)?,
        concept_description: row.get(3)?,
        severity: severity.clamp(1, 10) as u8,
        evidence_question_ids,
        status: GapStatus::from_str(&status_str)
            .ok_or_else(|| invalid_column(6, format!("unknown gap status {:?}", status_str)))?,
        detected_at: parse_timestamp(&detected_at),
        resolved_at: resolved_at.as_deref().map(parse_timestamp),
    })
}
