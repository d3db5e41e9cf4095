//! Answer history

use rusqlite::{params, Connection, Result};

use super::{format_timestamp, parse_timestamp};
use crate::domain::{AttemptRecord, Subject};

pub fn insert_attempt(
  conn: &Connection,
  subject: &Subject,
  user_id: &str,
  attempt: &AttemptRecord,
) -> Result<i64> {
  conn.execute(
    r#"
    INSERT INTO question_attempts
      (subject, user_id, question_id, subtopic_id, question_type_id, is_correct, attempted_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    "#,
    params![
      subject.as_str(),
      user_id,
      attempt.question_id,
      attempt.subtopic_id,
      attempt.question_type_id,
      attempt.is_correct,
      format_timestamp(&attempt.attempted_at),
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

/// All attempts for (user, subtopic), oldest first
pub fn list_attempts(
  conn: &Connection,
  subject: &Subject,
  user_id: &str,
  subtopic_id: i64,
) -> Result<Vec<AttemptRecord>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT question_id, subtopic_id, question_type_id, is_correct, attempted_at
    FROM question_attempts
    WHERE subject = ?1 AND user_id = ?2 AND subtopic_id = ?3
    ORDER BY attempted_at ASC, id ASC
    "#,
  )?;

  let attempts = stmt
    .query_map(params![subject.as_str(), user_id, subtopic_id], |row| {
      let attempted_at: String = row.get(4)?;
      Ok(AttemptRecord {
        question_id: row.get(0)?,
        subtopic_id: row.get(1)?,
        question_type_id: row.get(2)?,
        is_correct: row.get(3)?,
        attempted_at: parse_timestamp(&attempted_at),
      })
    })?
    .collect::<Result<Vec<_>>>()?;
  Ok(attempts)
}

/// Distinct question ids ordered by their latest attempt, most recent first
pub fn list_recent_attempt_question_ids(
  conn: &Connection,
  subject: &Subject,
  user_id: &str,
  subtopic_id: i64,
  limit: usize,
) -> Result<Vec<i64>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT question_id
    FROM question_attempts
    WHERE subject = ?1 AND user_id = ?2 AND subtopic_id = ?3
    GROUP BY question_id
    ORDER BY MAX(attempted_at) DESC, MAX(id) DESC
    LIMIT ?4
    "#,
  )?;

  let ids = stmt
    .query_map(params![subject.as_str(), user_id, subtopic_id, limit as i64], |row| row.get(0))?
    .collect::<Result<Vec<i64>>>()?;
  Ok(ids)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::run_migrations;
  use chrono::{Duration, Utc};

  fn setup() -> (Connection, Subject) {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    (conn, Subject::new("maths").unwrap())
  }

  fn attempt(question_id: i64, minutes_ago: i64, is_correct: bool) -> AttemptRecord {
    AttemptRecord {
      question_id,
      subtopic_id: 1,
      question_type_id: 7,
      is_correct,
      attempted_at: Utc::now() - Duration::minutes(minutes_ago),
    }
  }

  #[test]
  fn test_list_attempts_oldest_first() {
    let (conn, subject) = setup();
    insert_attempt(&conn, &subject, "u1", &attempt(2, 1, false)).unwrap();
    insert_attempt(&conn, &subject, "u1", &attempt(1, 10, true)).unwrap();

    let attempts = list_attempts(&conn, &subject, "u1", 1).unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].question_id, 1);
    assert!(attempts[0].is_correct);
    assert_eq!(attempts[1].question_id, 2);
    assert_eq!(attempts[1].question_type_id, 7);
  }

  #[test]
  fn test_list_attempts_filters_user_and_subject() {
    let (conn, subject) = setup();
    let other = Subject::new("physics").unwrap();
    insert_attempt(&conn, &subject, "u1", &attempt(1, 1, false)).unwrap();
    insert_attempt(&conn, &subject, "u2", &attempt(1, 1, false)).unwrap();
    insert_attempt(&conn, &other, "u1", &attempt(1, 1, false)).unwrap();

    assert_eq!(list_attempts(&conn, &subject, "u1", 1).unwrap().len(), 1);
  }

  #[test]
  fn test_recent_ids_are_distinct_and_most_recent_first() {
    let (conn, subject) = setup();
    insert_attempt(&conn, &subject, "u1", &attempt(1, 30, false)).unwrap();
    insert_attempt(&conn, &subject, "u1", &attempt(2, 20, true)).unwrap();
    insert_attempt(&conn, &subject, "u1", &attempt(1, 5, true)).unwrap();
    insert_attempt(&conn, &subject, "u1", &attempt(3, 10, true)).unwrap();

    let ids = list_recent_attempt_question_ids(&conn, &subject, "u1", 1, 10).unwrap();
    assert_eq!(ids, vec![1, 3, 2]);

    let limited = list_recent_attempt_question_ids(&conn, &subject, "u1", 1, 2).unwrap();
    assert_eq!(limited, vec![1, 3]);
  }
}
