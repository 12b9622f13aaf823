/// Access-decision voters
///
/// A voter answers one question: may `actor` perform `action` on `subject`?
/// Voters are pure functions of what they are handed. Handlers load the
/// facts (the code, the actor's shifts, the client address), ask the voter
/// and turn a [`Vote::Denied`] into a 403 through [`Vote::require`].
///
/// # Example
///
/// ```
/// use membres_shared::auth::context::AuthContext;
/// use membres_shared::auth::roles::Role;
/// use membres_shared::auth::voters::{ProcessUpdateAction, ProcessUpdateVoter, Vote, Voter};
/// use uuid::Uuid;
///
/// let manager = AuthContext {
///     user_id: Uuid::new_v4(),
///     username: "manager".to_string(),
///     roles: vec![Role::User, Role::ProcessManager],
/// };
///
/// let vote = ProcessUpdateVoter.vote(ProcessUpdateAction::Create, &(), Some(&manager));
/// assert_eq!(vote, Vote::Granted);
/// ```

pub mod code;
pub mod process_update;

use std::fmt;

use super::context::AuthContext;
use super::roles::Role;

pub use code::{CodeAction, CodeSubject, CodeVoter};
pub use process_update::{ProcessUpdateAction, ProcessUpdateVoter};

/// Outcome of a voter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Granted,
    Denied,
}

impl Vote {
    pub fn is_granted(self) -> bool {
        self == Vote::Granted
    }

    /// Turns a denial into an [`AuthzError`] naming the refused action
    pub fn require(self, action: impl fmt::Display) -> Result<(), AuthzError> {
        match self {
            Vote::Granted => Ok(()),
            Vote::Denied => Err(AuthzError::Denied(action.to_string())),
        }
    }
}

impl From<bool> for Vote {
    fn from(granted: bool) -> Self {
        if granted {
            Vote::Granted
        } else {
            Vote::Denied
        }
    }
}

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// A voter refused the action
    #[error("Access denied: {0}")]
    Denied(String),

    /// The decision needed an authenticated user and there was none
    #[error("Authentication required")]
    Unauthenticated,
}

/// Plain role check for actions no voter covers
pub fn require_granted(actor: &AuthContext, role: Role) -> Result<(), AuthzError> {
    Vote::from(actor.is_granted(role)).require(format_args!("act without {}", role))
}

/// Decides access to one kind of subject
pub trait Voter {
    type Action: Copy + fmt::Display;
    type Subject: ?Sized;

    /// A missing actor is always denied
    fn vote(&self, action: Self::Action, subject: &Self::Subject, actor: Option<&AuthContext>)
        -> Vote;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(Vote::Granted.require("view").is_ok());

        let err = Vote::Denied.require("delete").unwrap_err();
        assert!(matches!(err, AuthzError::Denied(ref action) if action == "delete"));
    }

    #[test]
    fn test_require_granted() {
        let admin = AuthContext {
            user_id: uuid::Uuid::new_v4(),
            username: "admin".to_string(),
            roles: vec![Role::SuperAdmin],
        };

        assert!(require_granted(&admin, Role::Admin).is_ok());
        assert!(require_granted(&admin, Role::ProcessManager).is_err());
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(Vote::from(true), Vote::Granted);
        assert_eq!(Vote::from(false), Vote::Denied);
        assert!(!Vote::from(false).is_granted());
    }
}
