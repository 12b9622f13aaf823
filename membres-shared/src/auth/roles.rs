/// Security roles
///
/// Roles are stored on `users.roles` as their `ROLE_*` string form so that
/// unknown values written by another tool survive a round trip. The
/// hierarchy is:
///
/// ```text
/// ROLE_SUPER_ADMIN > ROLE_ADMIN > ROLE_USER
/// ROLE_PROCESS_MANAGER      (standalone)
/// ROLE_PASSWORD_TO_SET      (standalone marker)
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A role granted to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Every authenticated member
    #[serde(rename = "ROLE_USER")]
    User,

    /// Staff running the shop day to day
    #[serde(rename = "ROLE_ADMIN")]
    Admin,

    /// Board members and maintainers
    #[serde(rename = "ROLE_SUPER_ADMIN")]
    SuperAdmin,

    /// Publishes process updates
    #[serde(rename = "ROLE_PROCESS_MANAGER")]
    ProcessManager,

    /// Account created by someone else, the owner must choose a password
    #[serde(rename = "ROLE_PASSWORD_TO_SET")]
    PasswordToSet,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
            Role::SuperAdmin => "ROLE_SUPER_ADMIN",
            Role::ProcessManager => "ROLE_PROCESS_MANAGER",
            Role::PasswordToSet => "ROLE_PASSWORD_TO_SET",
        }
    }

    /// Roles reachable from this one through the hierarchy, itself included
    pub fn reachable(&self) -> &'static [Role] {
        match self {
            Role::SuperAdmin => &[Role::SuperAdmin, Role::Admin, Role::User],
            Role::Admin => &[Role::Admin, Role::User],
            Role::User => &[Role::User],
            Role::ProcessManager => &[Role::ProcessManager],
            Role::PasswordToSet => &[Role::PasswordToSet],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_USER" => Ok(Role::User),
            "ROLE_ADMIN" => Ok(Role::Admin),
            "ROLE_SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ROLE_PROCESS_MANAGER" => Ok(Role::ProcessManager),
            "ROLE_PASSWORD_TO_SET" => Ok(Role::PasswordToSet),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Parses stored role strings, skipping the ones this build does not know
pub fn parse_roles(raw: &[String]) -> Vec<Role> {
    raw.iter()
        .filter_map(|r| match r.parse::<Role>() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring stored role");
                None
            }
        })
        .collect()
}

/// Whether `granted` reaches `required` through the hierarchy
pub fn is_granted(granted: &[Role], required: Role) -> bool {
    granted
        .iter()
        .any(|role| role.reachable().contains(&required))
}

/// Whether `required` was granted directly, ignoring the hierarchy
pub fn holds(granted: &[Role], required: Role) -> bool {
    granted.contains(&required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_string_roundtrip() {
        for role in [
            Role::User,
            Role::Admin,
            Role::SuperAdmin,
            Role::ProcessManager,
            Role::PasswordToSet,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("ROLE_NOPE".parse::<Role>().is_err());
    }

    #[test]
    fn test_hierarchy() {
        assert!(is_granted(&[Role::SuperAdmin], Role::Admin));
        assert!(is_granted(&[Role::SuperAdmin], Role::User));
        assert!(is_granted(&[Role::Admin], Role::User));
        assert!(!is_granted(&[Role::Admin], Role::SuperAdmin));
        assert!(!is_granted(&[Role::SuperAdmin], Role::ProcessManager));
        assert!(is_granted(&[Role::User, Role::ProcessManager], Role::ProcessManager));
    }

    #[test]
    fn test_parse_roles_skips_unknown() {
        let raw = vec![
            "ROLE_ADMIN".to_string(),
            "ROLE_LEGACY".to_string(),
            "ROLE_PASSWORD_TO_SET".to_string(),
        ];
        assert_eq!(parse_roles(&raw), vec![Role::Admin, Role::PasswordToSet]);
    }

    #[test]
    fn test_serde_uses_role_strings() {
        let json = serde_json::to_string(&Role::ProcessManager).unwrap();
        assert_eq!(json, "\"ROLE_PROCESS_MANAGER\"");
    }
}
