/// The chat member behind an interaction, as resolved by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub display_name: String,
    pub roles: Vec<String>,

    /// Platform-level "manage messages" capability
    pub manage_messages: bool,
}

impl Actor {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role == name)
    }
}
