//! Preference store accessor

use super::AdaptiveEngine;
use crate::domain::{AdaptivePreferences, PreferencesUpdate};
use crate::error::Result;
use crate::store::AdaptiveStore;

impl<S: AdaptiveStore> AdaptiveEngine<S> {
    /// Read the user's preferences, inserting the defaults on first access
    pub fn get_or_create_preferences(&self, user_id: &str) -> Result<AdaptivePreferences> {
        if let Some(prefs) = self.store.find_preferences(user_id)? {
            return Ok(prefs);
        }

        let defaults = AdaptivePreferences::defaults(user_id);
        if self.store.insert_preferences_if_absent(&defaults)? {
            tracing::debug!(user_id, "Created default adaptive preferences");
            return Ok(defaults);
        }

        // Another caller created the row between our read and insert
        Ok(self
            .store
            .find_preferences(user_id)?
            .unwrap_or(defaults))
    }

    /// Merge the supplied fields into the stored preferences
    pub fn save_preferences(
        &self,
        user_id: &str,
        update: &PreferencesUpdate,
    ) -> Result<AdaptivePreferences> {
        let mut prefs = self.get_or_create_preferences(user_id)?;
        prefs.apply(update);
        self.store.upsert_preferences(&prefs)?;
        Ok(prefs)
    }

    /// Flip the enable flag and return its new value
    pub fn toggle_enabled(&self, user_id: &str) -> Result<bool> {
        let current = self.get_or_create_preferences(user_id)?;
        let prefs = self.save_preferences(
            user_id,
            &PreferencesUpdate {
                enable_adaptive_learning: Some(!current.enable_adaptive_learning),
                ..Default::default()
            },
        )?;
        Ok(prefs.enable_adaptive_learning)
    }
}
