use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Create,
    Edit,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not allowed to {action} milestones")]
pub struct PermissionDenied {
    pub action: Action,
}

/// Permissions fetched once per session and consulted before every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSnapshot {
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl Default for PermissionSnapshot {
    fn default() -> Self {
        Self::read_only()
    }
}

impl PermissionSnapshot {
    pub const fn full() -> Self {
        Self {
            can_create: true,
            can_edit: true,
            can_delete: true,
        }
    }

    pub const fn read_only() -> Self {
        Self {
            can_create: false,
            can_edit: false,
            can_delete: false,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.can_create,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
        }
    }

    pub fn check(&self, action: Action) -> Result<(), PermissionDenied> {
        if self.allows(action) {
            Ok(())
        } else {
            Err(PermissionDenied { action })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_denies_everything() {
        let snapshot = PermissionSnapshot::read_only();
        let err = snapshot.check(Action::Edit).unwrap_err();
        assert_eq!(err.to_string(), "not allowed to edit milestones");
        assert!(snapshot.check(Action::Create).is_err());
    }

    #[test]
    fn partial_snapshot() {
        let snapshot = PermissionSnapshot {
            can_edit: true,
            ..PermissionSnapshot::read_only()
        };
        assert!(snapshot.check(Action::Edit).is_ok());
        assert!(snapshot.check(Action::Delete).is_err());
    }
}
