use crate::auth::auth::AuthActor;
use crate::gateway::{GatewayEvent, Outbox};
use actix_web::{HttpResponse, Responder, web};

/// Drain queued render and direct-message events
#[utoipa::path(
    get,
    path = "/api/gateway/events",
    responses(
        (status = 200, description = "Queued events, oldest first", body = [GatewayEvent]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Gateway"
)]
pub async fn drain_events(
    _auth: AuthActor,
    outbox: web::Data<Outbox>,
) -> actix_web::Result<impl Responder> {
    let events = outbox.drain();
    if !events.is_empty() {
        tracing::debug!(count = events.len(), "gateway drained outbox");
    }
    Ok(HttpResponse::Ok().json(events))
}
