use crate::model::{actor::Actor, request::Request};

/// Roles allowed to approve and reject requests.
pub const DEFAULT_MODERATOR_ROLES: [&str; 6] = [
    "Начальник УГИБДД",
    "Зам. Нач. УГИБДД",
    "Начальник ЦППС",
    "Зам. Начальника ЦППС",
    "Модератор",
    "Администратор",
];

/// Roles pinged when a new request card is posted.
pub const DEFAULT_MENTION_ROLES: [&str; 4] = [
    "Начальник УГИБДД",
    "Зам. Нач. УГИБДД",
    "Начальник ЦППС",
    "Зам. Начальника ЦППС",
];

#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    moderator_roles: Vec<String>,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MODERATOR_ROLES.iter().map(|r| r.to_string()).collect())
    }
}

impl PermissionPolicy {
    pub fn new(moderator_roles: Vec<String>) -> Self {
        Self { moderator_roles }
    }

    /// Elevated capability, or any configured moderator role.
    pub fn can_moderate(&self, actor: &Actor) -> bool {
        actor.manage_messages || self.moderator_roles.iter().any(|role| actor.has_role(role))
    }

    /// Owner or elevated capability. Moderator roles alone do not allow deleting.
    pub fn can_delete(&self, actor: &Actor, request: &Request) -> bool {
        actor.user_id == request.requester_id || actor.manage_messages
    }
}
