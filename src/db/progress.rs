//! Subtopic and per-question progress rows

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result};

use super::{format_timestamp, invalid_column, parse_timestamp, placeholders};
use crate::domain::{QuestionProgress, QuestionStatus, Subject, SubtopicProgress};

// ==================== Subtopic Progress ====================

pub fn find_subtopic_progress(
    conn: &Connection,
    subject: &Subject,
    user_id: &str,
    subtopic_id: i64,
) -> Result<Option<SubtopicProgress>> {
    conn.query_row(
        r#"
        SELECT user_id, subtopic_id, mastery_level, questions_attempted, questions_correct, last_attempt_at
        FROM subtopic_progress
        WHERE subject = ?1 AND user_id = ?2 AND subtopic_id = ?3
        "#,
        params![subject.as_str(), user_id, subtopic_id],
        row_to_subtopic_progress,
    )
    .optional()
}

pub fn upsert_subtopic_progress(
    conn: &Connection,
    subject: &Subject,
    progress: &SubtopicProgress,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO subtopic_progress
          (subject, user_id, subtopic_id, mastery_level, questions_attempted, questions_correct, last_attempt_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT (subject, user_id, subtopic_id) DO UPDATE SET
          mastery_level = excluded.mastery_level,
          questions_attempted = excluded.questions_attempted,
          questions_correct = excluded.questions_correct,
          last_attempt_at = excluded.last_attempt_at
        "#,
        params![
            subject.as_str(),
            progress.user_id,
            progress.subtopic_id,
            progress.mastery_level.min(100),
            progress.questions_attempted,
            progress.questions_correct,
            progress.last_attempt_at.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(())
}

/// Progress rows for the given subtopics; subtopics without a row are simply absent
pub fn list_subtopic_progress_for(
    conn: &Connection,
    subject: &Subject,
    user_id: &str,
    subtopic_ids: &[i64],
) -> Result<Vec<SubtopicProgress>> {
    if subtopic_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT user_id, subtopic_id, mastery_level, questions_attempted, questions_correct, last_attempt_at
        FROM subtopic_progress
        WHERE subject = ?1 AND user_id = ?2 AND subtopic_id IN ({})
        ORDER BY subtopic_id
        "#,
        placeholders(3, subtopic_ids.len())
    );

    let mut bind: Vec<rusqlite::types::Value> = vec![
        subject.as_str().to_string().into(),
        user_id.to_string().into(),
    ];
    bind.extend(subtopic_ids.iter().map(|&id| id.into()));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(bind), row_to_subtopic_progress)?
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

fn row_to_subtopic_progress(row: &rusqlite::Row) -> Result<SubtopicProgress> {
    let mastery: i64 = row.get(2)?;
    let last_attempt: Option<String> = row.get(5)?;

    Ok(SubtopicProgress {
        user_id: row.get(0)?,
        subtopic_id: row.get(1)?,
        mastery_level: mastery.clamp(0, 100) as u8,
        questions_attempted: row.get(3)?,
        questions_correct: row.get(4)?,
        last_attempt_at: last_attempt.as_deref().map(parse_timestamp),
    })
}

// ==================== Question Progress ====================

pub fn find_question_progress(
    conn: &Connection,
    subject: &Subject,
    user_id: &str,
    question_id: i64,
) -> Result<Option<QuestionProgress>> {
    conn.query_row(
        r#"
        SELECT user_id, question_id, attempt_count, success_rate, status, last_attempt_at
        FROM question_progress
        WHERE subject = ?1 AND user_id = ?2 AND question_id = ?3
        "#,
        params![subject.as_str(), user_id, question_id],
        row_to_question_progress,
    )
    .optional()
}

pub fn upsert_question_progress(
    conn: &Connection,
    subject: &Subject,
    progress: &QuestionProgress,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO question_progress
          (subject, user_id, question_id, attempt_count, success_rate, status, last_attempt_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT (subject, user_id, question_id) DO UPDATE SET
          attempt_count = excluded.attempt_count,
          success_rate = excluded.success_rate,
          status = excluded.status,
          last_attempt_at = excluded.last_attempt_at
        "#,
        params![
            subject.as_str(),
            progress.user_id,
            progress.question_id,
            progress.attempt_count,
            progress.success_rate.clamp(0.0, 100.0),
            progress.status.as_str(),
            format_timestamp(&progress.last_attempt_at),
        ],
    )?;
    Ok(())
}

fn row_to_question_progress(row: &rusqlite::Row) -> Result<QuestionProgress> {
    let status_str: String = row.get(4)?;
    let last_attempt: String = row.get(5)?;

    Ok(QuestionProgress {
        user_id: row.get(0)?,
        question_id: row.get(1)?,
        attempt_count: row.get(2)?,
        success_rate: row.get(3)?,
        status: QuestionStatus::from_str(&status_str)
            .ok_or_else(|| invalid_column(4, format!("unknown question status {:?}", status_str)))?,
        last_attempt_at: parse_timestamp(&last_attempt),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use chrono::Utc;

    fn setup() -> (Connection, Subject) {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        (conn, Subject::new("maths").unwrap())
    }

    fn progress(user: &str, subtopic_id: i64, mastery: u8) -> SubtopicProgress {
        SubtopicProgress {
            user_id: user.to_string(),
            subtopic_id,
            mastery_level: mastery,
            questions_attempted: 4,
            questions_correct: 2,
            last_attempt_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_subtopic_progress_upsert_overwrites() {
        let (conn, subject) = setup();
        upsert_subtopic_progress(&conn, &subject, &progress("u1", 1, 40)).unwrap();
        upsert_subtopic_progress(&conn, &subject, &progress("u1", 1, 60)).unwrap();

        let stored = find_subtopic_progress(&conn, &subject, "u1", 1).unwrap().unwrap();
        assert_eq!(stored.mastery_level, 60);
        assert_eq!(stored.questions_attempted, 4);
    }

    #[test]
    fn test_list_progress_for_subset() {
        let (conn, subject) = setup();
        for (id, mastery) in [(1, 10), (2, 20), (3, 30)] {
            upsert_subtopic_progress(&conn, &subject, &progress("u1", id, mastery)).unwrap();
        }
        upsert_subtopic_progress(&conn, &subject, &progress("u2", 2, 99)).unwrap();

        let rows = list_subtopic_progress_for(&conn, &subject, "u1", &[2, 3, 4]).unwrap();
        let ids: Vec<i64> = rows.iter().map(|p| p.subtopic_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(rows[0].mastery_level, 20);
    }

    #[test]
    fn test_list_progress_for_empty_ids() {
        let (conn, subject) = setup();
        assert!(list_subtopic_progress_for(&conn, &subject, "u1", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_question_progress_round_trip() {
        let (conn, subject) = setup();
        let row = QuestionProgress {
            user_id: "u1".to_string(),
            question_id: 9,
            attempt_count: 3,
            success_rate: 66.5,
            status: QuestionStatus::Learning,
            last_attempt_at: Utc::now(),
        };
        upsert_question_progress(&conn, &subject, &row).unwrap();

        let stored = find_question_progress(&conn, &subject, "u1", 9).unwrap().unwrap();
        assert_eq!(stored.status, QuestionStatus::Learning);
        assert_eq!(stored.attempt_count, 3);
        assert!((stored.success_rate - 66.5).abs() < f64::EPSILON);
    }
}
