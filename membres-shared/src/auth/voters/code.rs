/// Voter for door codes
///
/// Door codes are shared between shifters: whoever is on shift may read the
/// current code and, from the shop, rotate it. The rules by action:
///
/// | Action | Super admin | Admin | Others |
/// | --- | --- | --- | --- |
/// | VIEW | yes | yes | registrar, or attending |
/// | GENERATE | if enabled | if enabled | if enabled, from the shop, and attending or registrar of today's last code |
/// | EDIT / OPEN / CLOSE | yes | yes | from the shop, and registrar the same day or attending |
/// | DELETE | yes | no | no |
///
/// "Attending" means not a beginner and having a shift in the attendance
/// window (see [`crate::services::shift`]). "From the shop" means the client
/// address is in the allow-list; an empty allow-list accepts any address.

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset, Utc};

use super::{Vote, Voter};
use crate::auth::context::AuthContext;
use crate::auth::roles::Role;
use crate::models::code::Code;
use crate::services::shift::{is_same_local_day, Attendance};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeAction {
    View,
    Generate,
    Edit,
    Delete,
    Open,
    Close,
}

impl fmt::Display for CodeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeAction::View => "view",
            CodeAction::Generate => "generate",
            CodeAction::Edit => "edit",
            CodeAction::Delete => "delete",
            CodeAction::Open => "open",
            CodeAction::Close => "close",
        };
        f.write_str(name)
    }
}

/// What a code decision is made about
#[derive(Debug, Clone)]
pub struct CodeSubject {
    /// The code acted upon; for GENERATE, the latest open code
    pub code: Option<Code>,

    /// Shift history of the actor's beneficiary, None for users without one
    pub attendance: Option<Attendance>,

    pub client_ip: Option<IpAddr>,
    pub now: DateTime<Utc>,
}

/// Settings the code rules depend on
#[derive(Debug, Clone)]
pub struct CodeVoter {
    pub generation_enabled: bool,
    pub allowed_ips: Vec<IpAddr>,
    pub offset: FixedOffset,
}

impl CodeVoter {
    pub fn new(generation_enabled: bool, allowed_ips: Vec<IpAddr>, offset: FixedOffset) -> Self {
        Self {
            generation_enabled,
            allowed_ips,
            offset,
        }
    }

    fn location_ok(&self, client_ip: Option<IpAddr>) -> bool {
        if self.allowed_ips.is_empty() {
            return true;
        }
        client_ip.is_some_and(|ip| self.allowed_ips.contains(&ip))
    }

    fn is_attending(&self, subject: &CodeSubject) -> bool {
        subject
            .attendance
            .as_ref()
            .is_some_and(|attendance| attendance.is_attending(subject.now, &self.offset))
    }

    fn is_registrar(code: &Code, actor: &AuthContext) -> bool {
        code.registrar_id == actor.user_id
    }

    /// Registrar of a code created today
    fn is_same_day_registrar(&self, code: &Code, actor: &AuthContext, now: DateTime<Utc>) -> bool {
        Self::is_registrar(code, actor) && is_same_local_day(code.created_at, now, &self.offset)
    }

    fn can_view(&self, subject: &CodeSubject, actor: &AuthContext) -> bool {
        let Some(code) = &subject.code else {
            return false;
        };
        Self::is_registrar(code, actor) || self.is_attending(subject)
    }

    fn can_generate(&self, subject: &CodeSubject, actor: &AuthContext) -> bool {
        if !self.location_ok(subject.client_ip) {
            return false;
        }
        if self.is_attending(subject) {
            return true;
        }
        subject
            .code
            .as_ref()
            .is_some_and(|last| self.is_same_day_registrar(last, actor, subject.now))
    }

    fn can_edit(&self, subject: &CodeSubject, actor: &AuthContext) -> bool {
        let Some(code) = &subject.code else {
            return false;
        };
        if !self.location_ok(subject.client_ip) {
            return false;
        }
        self.is_same_day_registrar(code, actor, subject.now) || self.is_attending(subject)
    }
}

impl Voter for CodeVoter {
    type Action = CodeAction;
    type Subject = CodeSubject;

    fn vote(&self, action: CodeAction, subject: &CodeSubject, actor: Option<&AuthContext>) -> Vote {
        let Some(actor) = actor else {
            return Vote::Denied;
        };

        if action == CodeAction::Generate && !self.generation_enabled {
            return Vote::Denied;
        }
        if actor.is_granted(Role::SuperAdmin) {
            return Vote::Granted;
        }
        if action == CodeAction::Delete {
            return Vote::Denied;
        }
        if actor.is_granted(Role::Admin) {
            return Vote::Granted;
        }

        let granted = match action {
            CodeAction::View => self.can_view(subject, actor),
            CodeAction::Generate => self.can_generate(subject, actor),
            CodeAction::Edit | CodeAction::Open | CodeAction::Close => {
                self.can_edit(subject, actor)
            }
            CodeAction::Delete => false,
        };

        Vote::from(granted)
    }
}
