use crate::gateway::GatewayEvent;
use crate::models::{PermissionsResponse, RejectOtgulReq, SubmitOtgulReq};
use crate::view::{ButtonStyle, Card, CardButton, CardColor, CardField};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Otgul Bot API",
        version = "0.1.0",
        description = r#"
## Otgul (short time-off) requests

Backend of the chat bot through which members submit same-day time-off
requests of up to **1 hour** and commanders approve or reject them.

### 🔹 Flow
- The chat gateway relays each form submission or button click here
- Responses are platform-neutral **cards** the gateway renders as messages
- Direct messages and card re-renders are queued at `/api/gateway/events`

### 🔐 Security
Every endpoint expects `Authorization: Bearer <actor token>`: a JWT signed
with the bot token, carrying the acting member's id, name, roles and
`manage_messages` capability.
"#,
    ),
    paths(
        crate::api::otgul::submit_otgul,
        crate::api::otgul::get_otgul,
        crate::api::otgul::approve_otgul,
        crate::api::otgul::reject_otgul,
        crate::api::otgul::delete_otgul,
        crate::api::otgul::my_otguls,
        crate::api::otgul::pending_otguls,
        crate::api::otgul::info_otguls,
        crate::api::otgul::otgul_permissions,

        crate::api::gateway::drain_events
    ),
    components(
        schemas(
            SubmitOtgulReq,
            RejectOtgulReq,
            PermissionsResponse,
            Card,
            CardField,
            CardButton,
            CardColor,
            ButtonStyle,
            GatewayEvent
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Otgul", description = "Otgul request lifecycle APIs"),
        (name = "Gateway", description = "Outbound events for the chat gateway"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
