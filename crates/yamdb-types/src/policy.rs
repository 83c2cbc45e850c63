//! Authorization decisions.
//!
//! Every endpoint describes what it is about to do as an [`Action`] on a [`Resource`],
//! optionally with the owner of the affected record, and asks [`decide`] whether the
//! [`Actor`] may proceed. The function is pure, it only looks at its arguments.

use crate::claim::Role;

pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(Identity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn is_read(self) -> bool {
        matches!(self, Action::Read)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Category,
    Genre,
    Title,
    Review,
    Comment,
    /// Any user record, managed through the admin user endpoints
    User,
    /// Requester's own record, reached through the `me` alias
    OwnProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Identity is required, but the request carries none
    Unauthenticated,
    /// Identity is known, but not allowed to perform the action
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

impl Actor {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Actor::Anonymous => None,
            Actor::User(identity) => Some(identity),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|i| i.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(|r| r.is_admin())
    }

    pub fn is_moderator(&self) -> bool {
        self.role().is_some_and(|r| r.is_moderator())
    }

    pub fn is_owner(&self, owner: Option<UserId>) -> bool {
        match (self.identity(), owner) {
            (Some(identity), Some(owner)) => identity.id == owner,
            _ => false,
        }
    }

    /// Shortcut for `decide(self, ...).into_result()`
    pub fn authorize(
        &self,
        action: Action,
        resource: Resource,
        owner: Option<UserId>,
    ) -> Result<(), Denial> {
        decide(self, action, resource, owner).into_result()
    }
}

fn require(actor: &Actor, allowed: bool) -> Decision {
    match actor {
        Actor::Anonymous => Decision::Deny(Denial::Unauthenticated),
        Actor::User(_) if allowed => Decision::Allow,
        Actor::User(_) => Decision::Deny(Denial::Forbidden),
    }
}

pub fn decide(
    actor: &Actor,
    action: Action,
    resource: Resource,
    owner: Option<UserId>,
) -> Decision {
    use Resource::*;
    match resource {
        Category | Genre | Title if action.is_read() => Decision::Allow,
        Category | Genre | Title => require(actor, actor.is_admin()),

        Review | Comment => match action {
            Action::Read => Decision::Allow,
            Action::Create => require(actor, true),
            Action::Update | Action::Delete => require(
                actor,
                actor.is_admin() || actor.is_moderator() || actor.is_owner(owner),
            ),
        },

        User => require(actor, actor.is_admin()),

        OwnProfile => require(actor, matches!(action, Action::Read | Action::Update)),
    }
}

/// Whether a write through `resource` may set the role field.
///
/// Only admins managing user records may, the own profile path never does, so a role
/// sent there is dropped rather than rejected.
pub fn may_assign_role(actor: &Actor, resource: Resource) -> bool {
    matches!(resource, Resource::User) && actor.is_admin()
}
