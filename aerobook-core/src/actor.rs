use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// The authenticated caller as supplied by the identity provider. The core
/// trusts the staff and superuser flags as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub subject: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

impl Actor {
    pub fn passenger(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            is_staff: false,
            is_superuser: false,
        }
    }

    pub fn staff(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            is_staff: true,
            is_superuser: false,
        }
    }

    pub fn superuser(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            is_staff: true,
            is_superuser: true,
        }
    }

    pub fn has_staff_access(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    pub fn require_staff(&self, action: &str) -> CoreResult<()> {
        if self.has_staff_access() {
            Ok(())
        } else {
            tracing::warn!("Non-staff actor {} attempted: {}", self.subject, action);
            Err(CoreError::AuthorizationError(format!(
                "staff access required to {}",
                action
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superuser_counts_as_staff() {
        let root = Actor {
            subject: "root".into(),
            is_staff: false,
            is_superuser: true,
        };
        assert!(root.require_staff("view reports").is_ok());
        assert!(matches!(
            Actor::passenger("p1").require_staff("view reports"),
            Err(CoreError::AuthorizationError(_))
        ));
    }
}
