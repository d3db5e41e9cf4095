//! Append-only selection audit trail

use chrono::Utc;
use rusqlite::{params, Connection, Result};

use super::{format_timestamp, invalid_column};
use crate::domain::{SelectionLogEntry, SelectionReason, Subject};

/// Write all entries of one selection in a single transaction.
///
/// Either every entry lands or none do, so a session's positions stay dense.
pub fn insert_selection_log(
  conn: &Connection,
  subject: &Subject,
  entries: &[SelectionLogEntry],
) -> Result<()> {
  if entries.is_empty() {
    return Ok(());
  }

  let now = format_timestamp(&Utc::now());
  let tx = conn.unchecked_transaction()?;
  {
    let mut stmt = tx.prepare(
      r#"
      INSERT INTO selection_logs
        (subject, session_id, question_id, selection_reason, difficulty_level, sequence_position, created_at)
      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
      "#,
    )?;
    for entry in entries {
      stmt.execute(params![
        subject.as_str(),
        entry.session_id,
        entry.question_id,
        entry.selection_reason.as_str(),
        entry.difficulty_level,
        entry.sequence_position,
        now,
      ])?;
    }
  }
  tx.commit()
}

/// Entries of one session in serving order
pub fn list_selection_log(
  conn: &Connection,
  subject: &Subject,
  session_id: &str,
) -> Result<Vec<SelectionLogEntry>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT session_id, question_id, selection_reason, difficulty_level, sequence_position
    FROM selection_logs
    WHERE subject = ?1 AND session_id = ?2
    ORDER BY sequence_position ASC
    "#,
  )?;

  let entries = stmt
    .query_map(params![subject.as_str(), session_id], |row| {
      let reason: String = row.get(2)?;
      Ok(SelectionLogEntry {
        session_id: row.get(0)?,
        question_id: row.get(1)?,
        selection_reason: SelectionReason::from_str(&reason)
          .ok_or_else(|| invalid_column(2, format!("unknown selection reason {:?}", reason)))?,
        difficulty_level: row.get(3)?,
        sequence_position: row.get(4)?,
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(entries)
}
