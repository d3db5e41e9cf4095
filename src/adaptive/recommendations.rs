//! Topic-level study recommendations

use std::collections::{HashMap, HashSet};

use super::AdaptiveEngine;
use crate::config::{LOW_MASTERY_LEVEL, PROGRESSION_MASTERY_LEVEL};
use crate::domain::{
    LearningGap, RecommendationReason, RecommendedSubtopic, Recommendations, Subtopic,
    SubtopicProgress,
};
use crate::error::Result;
use crate::store::AdaptiveStore;

/// Build the ranked list: gap subtopics, then low-mastery subtopics, and only
/// if both are empty, the next untouched subtopic once the user is doing well.
pub fn rank_subtopics(
    subtopics: &[Subtopic],
    progress: &[SubtopicProgress],
    active_gaps: &[LearningGap],
) -> Vec<RecommendedSubtopic> {
    let mut recommended: Vec<RecommendedSubtopic> = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();

    let gap_subtopics: HashSet<i64> = active_gaps.iter().map(|g| g.subtopic_id).collect();
    let progress_by_id: HashMap<i64, &SubtopicProgress> =
        progress.iter().map(|p| (p.subtopic_id, p)).collect();

    for subtopic in subtopics {
        if gap_subtopics.contains(&subtopic.id) && seen.insert(subtopic.id) {
            recommended.push(RecommendedSubtopic::new(subtopic, RecommendationReason::LearningGap));
        }
    }

    for subtopic in subtopics {
        let low = progress_by_id
            .get(&subtopic.id)
            .is_some_and(|p| p.mastery_level < LOW_MASTERY_LEVEL);
        if low && seen.insert(subtopic.id) {
            recommended.push(RecommendedSubtopic::new(subtopic, RecommendationReason::LowMastery));
        }
    }

    if recommended.is_empty() && !progress.is_empty() {
        let best = progress.iter().map(|p| p.mastery_level).max().unwrap_or(0);
        if best > PROGRESSION_MASTERY_LEVEL {
            if let Some(next) = subtopics.iter().find(|s| !progress_by_id.contains_key(&s.id)) {
                recommended.push(RecommendedSubtopic::new(next, RecommendationReason::NextInProgression));
            }
        }
    }

    recommended
}

impl<S: AdaptiveStore> AdaptiveEngine<S> {
    pub fn get_adaptive_learning_recommendations(
        &self,
        user_id: &str,
        topic_id: i64,
    ) -> Result<Recommendations> {
        let enabled = self
            .store
            .find_preferences(user_id)?
            .map(|p| p.enable_adaptive_learning)
            .unwrap_or(true);

        let subtopics = self.store.list_subtopics(topic_id)?;
        let ids: Vec<i64> = subtopics.iter().map(|s| s.id).collect();

        let progress = self.store.list_subtopic_progress_for(user_id, &ids)?;
        let active_gaps = self.store.list_active_gaps_for(user_id, &ids)?;

        let recommended_subtopics = rank_subtopics(&subtopics, &progress, &active_gaps);
        tracing::debug!(
            user_id,
            topic_id,
            subtopics = subtopics.len(),
            recommended = recommended_subtopics.len(),
            "Built recommendations"
        );

        Ok(Recommendations {
            recommended_subtopics,
            learning_gaps_count: active_gaps.len(),
            has_adaptive_learning_enabled: enabled,
        })
    }
}
