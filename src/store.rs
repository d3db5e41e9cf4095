//! Persistence seam between the adaptive engine and storage.
//!
//! The engine only ever talks to an [`AdaptiveStore`]. [`SqliteStore`] is the
//! production implementation: a shared connection plus the subject it is
//! scoped to.

use chrono::{DateTime, Utc};

use crate::db::{self, try_lock, DbPool};
use crate::domain::{
    AdaptivePreferences, AttemptRecord, LearningGap, NewLearningGap, QuestionProgress,
    SelectionLogEntry, Subject, Subtopic, SubtopicProgress,
};
use crate::error::Result;

pub trait AdaptiveStore {
    fn find_preferences(&self, user_id: &str) -> Result<Option<AdaptivePreferences>>;
    /// Write defaults for a user with no row; returns false if a row already existed
    fn insert_preferences_if_absent(&self, prefs: &AdaptivePreferences) -> Result<bool>;
    fn upsert_preferences(&self, prefs: &AdaptivePreferences) -> Result<()>;

    fn find_subtopic_progress(&self, user_id: &str, subtopic_id: i64) -> Result<Option<SubtopicProgress>>;
    fn upsert_subtopic_progress(&self, progress: &SubtopicProgress) -> Result<()>;
    fn list_subtopic_progress_for(&self, user_id: &str, subtopic_ids: &[i64]) -> Result<Vec<SubtopicProgress>>;

    fn find_question_progress(&self, user_id: &str, question_id: i64) -> Result<Option<QuestionProgress>>;

    /// Append an attempt and rewrite its question and subtopic progress as one
    /// atomic step. `update` gets the stored rows (if any) and returns the new
    /// ones plus a value handed back to the caller.
    fn record_attempt<T, F>(&self, user_id: &str, attempt: &AttemptRecord, update: F) -> Result<T>
    where
        F: FnOnce(Option<QuestionProgress>, Option<SubtopicProgress>) -> (QuestionProgress, SubtopicProgress, T);

    fn list_attempts(&self, user_id: &str, subtopic_id: i64) -> Result<Vec<AttemptRecord>>;
    fn list_recent_attempt_question_ids(&self, user_id: &str, subtopic_id: i64, limit: usize) -> Result<Vec<i64>>;

    fn find_active_gap(&self, user_id: &str, subtopic_id: i64, concept: &str) -> Result<Option<LearningGap>>;
    /// `None` when an open gap for the same concept already exists
    fn insert_gap(&self, gap: &NewLearningGap) -> Result<Option<LearningGap>>;
    fn resolve_gap(&self, gap_id: i64, resolved_at: DateTime<Utc>) -> Result<bool>;
    fn list_active_gaps_for(&self, user_id: &str, subtopic_ids: &[i64]) -> Result<Vec<LearningGap>>;

    fn insert_selection_log(&self, entries: &[SelectionLogEntry]) -> Result<()>;

    fn list_subtopics(&self, topic_id: i64) -> Result<Vec<Subtopic>>;
}

/// SQLite-backed store bound to one subject
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    subject: Subject,
}

impl SqliteStore {
    pub fn new(pool: DbPool, subject: Subject) -> Self {
        Self { pool, subject }
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl AdaptiveStore for SqliteStore {
    fn find_preferences(&self, user_id: &str) -> Result<Option<AdaptivePreferences>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::find_preferences(&conn, &self.subject, user_id)?)
    }

    fn insert_preferences_if_absent(&self, prefs: &AdaptivePreferences) -> Result<bool> {
        let conn = try_lock(&self.pool)?;
        Ok(db::insert_preferences_if_absent(&conn, &self.subject, prefs)?)
    }

    fn upsert_preferences(&self, prefs: &AdaptivePreferences) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        Ok(db::upsert_preferences(&conn, &self.subject, prefs)?)
    }

    fn find_subtopic_progress(&self, user_id: &str, subtopic_id: i64) -> Result<Option<SubtopicProgress>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::find_subtopic_progress(&conn, &self.subject, user_id, subtopic_id)?)
    }

    fn upsert_subtopic_progress(&self, progress: &SubtopicProgress) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        Ok(db::upsert_subtopic_progress(&conn, &self.subject, progress)?)
    }

    fn list_subtopic_progress_for(&self, user_id: &str, subtopic_ids: &[i64]) -> Result<Vec<SubtopicProgress>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::list_subtopic_progress_for(&conn, &self.subject, user_id, subtopic_ids)?)
    }

    fn find_question_progress(&self, user_id: &str, question_id: i64) -> Result<Option<QuestionProgress>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::find_question_progress(&conn, &self.subject, user_id, question_id)?)
    }

    fn record_attempt<T, F>(&self, user_id: &str, attempt: &AttemptRecord, update: F) -> Result<T>
    where
        F: FnOnce(Option<QuestionProgress>, Option<SubtopicProgress>) -> (QuestionProgress, SubtopicProgress, T),
    {
        let conn = try_lock(&self.pool)?;
        // Rolled back on drop if any step fails
        let tx = conn.unchecked_transaction()?;

        db::insert_attempt(&tx, &self.subject, user_id, attempt)?;
        let question = db::find_question_progress(&tx, &self.subject, user_id, attempt.question_id)?;
        let subtopic = db::find_subtopic_progress(&tx, &self.subject, user_id, attempt.subtopic_id)?;

        let (question, subtopic, output) = update(question, subtopic);
        db::upsert_question_progress(&tx, &self.subject, &question)?;
        db::upsert_subtopic_progress(&tx, &self.subject, &subtopic)?;

        tx.commit()?;
        Ok(output)
    }

    fn list_attempts(&self, user_id: &str, subtopic_id: i64) -> Result<Vec<AttemptRecord>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::list_attempts(&conn, &self.subject, user_id, subtopic_id)?)
    }

    fn list_recent_attempt_question_ids(&self, user_id: &str, subtopic_id: i64, limit: usize) -> Result<Vec<i64>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::list_recent_attempt_question_ids(&conn, &self.subject, user_id, subtopic_id, limit)?)
    }

    fn find_active_gap(&self, user_id: &str, subtopic_id: i64, concept: &str) -> Result<Option<LearningGap>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::find_active_gap(&conn, &self.subject, user_id, subtopic_id, concept)?)
    }

    fn insert_gap(&self, gap: &NewLearningGap) -> Result<Option<LearningGap>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::insert_gap(&conn, &self.subject, gap)?)
    }

    fn resolve_gap(&self, gap_id: i64, resolved_at: DateTime<Utc>) -> Result<bool> {
        let conn = try_lock(&self.pool)?;
        Ok(db::resolve_gap(&conn, &self.subject, gap_id, resolved_at)?)
    }

    fn list_active_gaps_for(&self, user_id: &str, subtopic_ids: &[i64]) -> Result<Vec<LearningGap>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::list_active_gaps_for(&conn, &self.subject, user_id, subtopic_ids)?)
    }

    fn insert_selection_log(&self, entries: &[SelectionLogEntry]) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        Ok(db::insert_selection_log(&conn, &self.subject, entries)?)
    }

    fn list_subtopics(&self, topic_id: i64) -> Result<Vec<Subtopic>> {
        let conn = try_lock(&self.pool)?;
        Ok(db::list_subtopics(&conn, &self.subject, topic_id)?)
    }
}
