use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::actor::Actor;

/// Actor identity signed by the gateway with the bot token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorClaims {
    /// Chat platform user id
    pub sub: String,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub manage_messages: bool,
    pub exp: usize,
}

impl From<ActorClaims> for Actor {
    fn from(claims: ActorClaims) -> Self {
        Actor {
            user_id: claims.sub,
            display_name: claims.name,
            roles: claims.roles,
            manage_messages: claims.manage_messages,
        }
    }
}

/// Values from the otgul modal form.
#[derive(Deserialize, ToSchema)]
pub struct SubmitOtgulReq {
    #[schema(example = "Иван Иванов")]
    pub full_name: String,
    #[schema(example = "123-456")]
    pub static_id: String,
    #[schema(example = "15:00 - 16:00")]
    pub time: String,
    #[schema(example = "Гражданские дела")]
    pub reason: String,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct RejectOtgulReq {
    #[schema(example = "Некому работать", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsResponse {
    pub can_moderate: bool,
    pub can_delete: bool,
}
