use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;

/// Role attached to an authenticated user by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    /// Storage/display representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

/// The acting user for a request: identity plus role.
///
/// Services never inspect `role` directly; they go through the capability
/// methods below so the gating rules live in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Convenience constructor for a student actor.
    #[must_use]
    pub fn student(id: UserId) -> Self {
        Self::new(id, Role::Student)
    }

    /// Convenience constructor for an admin actor.
    #[must_use]
    pub fn admin(id: UserId) -> Self {
        Self::new(id, Role::Admin)
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Admins may act on course content without an enrollment row.
    #[must_use]
    pub fn bypasses_enrollment(&self) -> bool {
        self.role == Role::Admin
    }

    /// Quiz authoring and admin result views require the admin role.
    #[must_use]
    pub fn can_author(&self) -> bool {
        self.role == Role::Admin
    }
}
