use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Every table is scoped by subject so several exam subjects share one file
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS adaptive_preferences (
      subject TEXT NOT NULL,
      user_id TEXT NOT NULL,
      adaptivity_level INTEGER NOT NULL DEFAULT 5,
      difficulty_preference TEXT NOT NULL DEFAULT 'balanced',
      enable_adaptive_learning INTEGER NOT NULL DEFAULT 1,
      updated_at TEXT NOT NULL,
      PRIMARY KEY (subject, user_id)
    );

    CREATE TABLE IF NOT EXISTS subtopics (
      id INTEGER PRIMARY KEY,
      subject TEXT NOT NULL,
      topic_id INTEGER NOT NULL,
      name TEXT NOT NULL,
      position INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS question_attempts (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      subject TEXT NOT NULL,
      user_id TEXT NOT NULL,
      question_id INTEGER NOT NULL,
      subtopic_id INTEGER NOT NULL,
      question_type_id INTEGER NOT NULL,
      is_correct INTEGER NOT NULL,
      attempted_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS question_progress (
      subject TEXT NOT NULL,
      user_id TEXT NOT NULL,
      question_id INTEGER NOT NULL,
      attempt_count INTEGER NOT NULL DEFAULT 0,
      success_rate REAL NOT NULL DEFAULT 0,
      status TEXT NOT NULL DEFAULT 'ToStart',
      last_attempt_at TEXT NOT NULL,
      PRIMARY KEY (subject, user_id, question_id)
    );

    CREATE TABLE IF NOT EXISTS subtopic_progress (
      subject TEXT NOT NULL,
      user_id TEXT NOT NULL,
      subtopic_id INTEGER NOT NULL,
      mastery_level INTEGER NOT NULL DEFAULT 0,
      questions_attempted INTEGER NOT NULL DEFAULT 0,
      questions_correct INTEGER NOT NULL DEFAULT 0,
      last_attempt_at TEXT,
      PRIMARY KEY (subject, user_id, subtopic_id)
    );

    CREATE TABLE IF NOT EXISTS learning_gaps (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      subject TEXT NOT NULL,
      user_id TEXT NOT NULL,
      subtopic_id INTEGER NOT NULL,
      concept_description TEXT NOT NULL,
      severity INTEGER NOT NULL,
      evidence_question_ids TEXT NOT NULL DEFAULT '[]',
      status TEXT NOT NULL DEFAULT 'active',
      detected_at TEXT NOT NULL,
      resolved_at TEXT
    );

    CREATE TABLE IF NOT EXISTS selection_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      subject TEXT NOT NULL,
      session_id TEXT NOT NULL,
      question_id INTEGER NOT NULL,
      selection_reason TEXT NOT NULL,
      difficulty_level INTEGER NOT NULL,
      sequence_position INTEGER NOT NULL,
      created_at TEXT NOT NULL,
      UNIQUE (subject, session_id, sequence_position)
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_subtopics_topic ON subtopics(subject, topic_id);
    CREATE INDEX IF NOT EXISTS idx_attempts_user_subtopic
      ON question_attempts(subject, user_id, subtopic_id, attempted_at);

    -- At most one open gap per (user, subtopic, concept)
    CREATE UNIQUE INDEX IF NOT EXISTS idx_learning_gaps_open
      ON learning_gaps(subject, user_id, subtopic_id, concept_description)
      WHERE resolved_at IS NULL;
    "#,
  )?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
      .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
      .unwrap();
    stmt
      .query_map([], |row| row.get(0))
      .unwrap()
      .collect::<Result<Vec<String>>>()
      .unwrap()
  }

  #[test]
  fn test_migrations_create_all_tables() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();

    let tables = table_names(&conn);
    for expected in [
      "adaptive_preferences",
      "learning_gaps",
      "question_attempts",
      "question_progress",
      "selection_logs",
      "subtopic_progress",
      "subtopics",
    ] {
      assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
    }
  }

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
  }
}
