//! Adaptive learning engine.
//!
//! Entry points the session orchestrator calls, grouped by concern:
//! - preferences: [`AdaptiveEngine::get_or_create_preferences`], `save_preferences`, `toggle_enabled`
//! - mastery: [`AdaptiveEngine::record_answer`] after each scored attempt
//! - gaps: [`AdaptiveEngine::detect_learning_gaps`], `update_learning_gaps` at session end
//! - selection: [`AdaptiveEngine::select_adaptive_questions`] at session start
//! - recommendations: [`AdaptiveEngine::get_adaptive_learning_recommendations`]

pub mod gaps;
pub mod mastery;
pub mod preferences;
pub mod recommendations;
pub mod scorer;

pub use gaps::GapUpdate;
pub use mastery::MasteryUpdate;
pub use scorer::{FixedJitter, JitterSource, RandomJitter, ScoredQuestion};

use crate::error::AdaptiveError;
use crate::store::AdaptiveStore;

/// Maps a question to the concept key gaps are clustered on
pub trait ConceptKey {
    fn concept_key(&self, question_id: i64, question_type_id: i64) -> String;
}

/// Uses the question type as a stand-in for a concept taxonomy
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionTypeConcept;

impl ConceptKey for QuestionTypeConcept {
    fn concept_key(&self, _question_id: i64, question_type_id: i64) -> String {
        question_type_id.to_string()
    }
}

/// Called whenever a best-effort write (the selection audit trail) fails
pub type AuditHook = Box<dyn Fn(&AdaptiveError) + Send + Sync>;

pub struct AdaptiveEngine<S> {
    store: S,
    concept_key: Box<dyn ConceptKey + Send + Sync>,
    audit_hook: Option<AuditHook>,
}

impl<S: AdaptiveStore> AdaptiveEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            concept_key: Box::new(QuestionTypeConcept),
            audit_hook: None,
        }
    }

    /// Replace the concept proxy used for gap clustering
    pub fn with_concept_key(mut self, key: impl ConceptKey + Send + Sync + 'static) -> Self {
        self.concept_key = Box::new(key);
        self
    }

    pub fn with_audit_hook(
        mut self,
        hook: impl Fn(&AdaptiveError) + Send + Sync + 'static,
    ) -> Self {
        self.audit_hook = Some(Box::new(hook));
        self
    }

    fn report_audit_failure(&self, error: &AdaptiveError) {
        if let Some(hook) = &self.audit_hook {
            hook(error);
        }
    }
}
