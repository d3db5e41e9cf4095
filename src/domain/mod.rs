pub mod gap;
pub mod preferences;
pub mod progress;
pub mod question;
pub mod selection;
pub mod subject;

pub use gap::{GapStatus, LearningGap, NewLearningGap};
pub use preferences::{AdaptivePreferences, DifficultyPreference, PreferencesUpdate};
pub use progress::{RecommendationReason, RecommendedSubtopic, Recommendations, Subtopic, SubtopicProgress};
pub use question::{AttemptRecord, QuestionProgress, QuestionRecord, QuestionResult, QuestionStatus};
pub use selection::{SelectionLogEntry, SelectionReason};
pub use subject::Subject;
