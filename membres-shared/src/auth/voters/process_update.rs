/// Voter for process updates
///
/// Only a user directly holding `ROLE_PROCESS_MANAGER` may view, publish,
/// edit or delete them. Admin roles do not imply it.

use std::fmt;

use super::{Vote, Voter};
use crate::auth::context::AuthContext;
use crate::auth::roles::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessUpdateAction {
    View,
    Create,
    Edit,
    Delete,
}

impl fmt::Display for ProcessUpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessUpdateAction::View => "view",
            ProcessUpdateAction::Create => "create",
            ProcessUpdateAction::Edit => "edit",
            ProcessUpdateAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessUpdateVoter;

impl Voter for ProcessUpdateVoter {
    type Action = ProcessUpdateAction;

    /// The decision does not depend on which update is concerned
    type Subject = ();

    fn vote(&self, _action: Self::Action, _subject: &(), actor: Option<&AuthContext>) -> Vote {
        match actor {
            Some(actor) => Vote::from(actor.holds(Role::ProcessManager)),
            None => Vote::Denied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const ACTIONS: [ProcessUpdateAction; 4] = [
        ProcessUpdateAction::View,
        ProcessUpdateAction::Create,
        ProcessUpdateAction::Edit,
        ProcessUpdateAction::Delete,
    ];

    fn actor(roles: Vec<Role>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "someone".to_string(),
            roles,
        }
    }

    #[test]
    fn test_process_manager_granted_everything() {
        let manager = actor(vec![Role::User, Role::ProcessManager]);
        for action in ACTIONS {
            assert_eq!(ProcessUpdateVoter.vote(action, &(), Some(&manager)), Vote::Granted);
        }
    }

    #[test]
    fn test_super_admin_without_process_manager_denied() {
        let super_admin = actor(vec![Role::SuperAdmin]);
        let admin = actor(vec![Role::Admin, Role::User]);
        for action in ACTIONS {
            assert_eq!(ProcessUpdateVoter.vote(action, &(), Some(&super_admin)), Vote::Denied);
            assert_eq!(ProcessUpdateVoter.vote(action, &(), Some(&admin)), Vote::Denied);
        }
    }

    #[test]
    fn test_anonymous_denied() {
        for action in ACTIONS {
            assert_eq!(ProcessUpdateVoter.vote(action, &(), None), Vote::Denied);
        }
    }
}
