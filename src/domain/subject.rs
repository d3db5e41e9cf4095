//! Subject area identifier.
//!
//! Every persisted row is scoped to a subject so one engine can serve
//! several exam subjects side by side without their data mixing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AdaptiveError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject(String);

impl Subject {
    /// Subject ids may only contain ASCII alphanumerics, hyphens and underscores.
    pub fn new(id: &str) -> Result<Self> {
        if is_valid_subject_id(id) {
            Ok(Self(id.to_string()))
        } else {
            Err(AdaptiveError::InvalidSubject(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_subject_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_subjects() {
        assert!(Subject::new("maths").is_ok());
        assert!(Subject::new("cs-101_a").is_ok());
    }

    #[test]
    fn test_invalid_subjects() {
        assert!(matches!(Subject::new(""), Err(AdaptiveError::InvalidSubject(_))));
        assert!(Subject::new("maths; DROP TABLE").is_err());
        assert!(Subject::new("phys ics").is_err());
    }
}
