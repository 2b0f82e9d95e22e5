use crate::auth::auth::AuthActor;
use crate::config::Config;
use crate::lifecycle::{LifecycleError, OtgulService, Submission};
use crate::models::{PermissionsResponse, RejectOtgulReq, SubmitOtgulReq};
use crate::view::{Card, render_history, render_info_card, render_request_card};
use actix_web::{HttpResponse, Responder, ResponseError, http::StatusCode, web};
use serde_json::json;

impl ResponseError for LifecycleError {
    fn status_code(&self) -> StatusCode {
        match self {
            LifecycleError::DuplicateRequest
            | LifecycleError::InvalidField(_)
            | LifecycleError::InvalidTime(_)
            | LifecycleError::PastTime => StatusCode::BAD_REQUEST,
            LifecycleError::Forbidden => StatusCode::FORBIDDEN,
            LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
            LifecycleError::AlreadyProcessed(_) => StatusCode::CONFLICT,
            LifecycleError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            LifecycleError::Store(e) => {
                tracing::error!(error = %e, "Request store failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

/* =========================
Submit otgul request
========================= */
/// Swagger doc for submit_otgul endpoint
#[utoipa::path(
    post,
    path = "/api/otgul",
    request_body(
        content = SubmitOtgulReq,
        description = "Otgul modal form values",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request created, card to post with role mentions", body = Card),
        (status = 400, description = "Duplicate request, missing or overlong field, bad time format, duration over 1 hour or start in the past", body = Object, example = json!({
            "message": "Максимальная длительность отгула: 1 час"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn submit_otgul(
    auth: AuthActor,
    service: web::Data<OtgulService>,
    config: web::Data<Config>,
    payload: web::Json<SubmitOtgulReq>,
) -> actix_web::Result<impl Responder> {
    let form = payload.into_inner();
    let submission = Submission {
        requester_id: auth.user_id.clone(),
        display_name: form.full_name,
        static_id: form.static_id,
        time_text: form.time,
        reason: form.reason,
    };
    let request = web::block(move || service.submit(submission, service.now())).await??;

    Ok(HttpResponse::Ok().json(render_request_card(&request, &config.mention_roles)))
}

/// for getting a request card
#[utoipa::path(
    get,
    path = "/api/otgul/{request_id}",
    params(
        ("request_id" = u64, Path, description = "ID of the otgul request")
    ),
    responses(
        (status = 200, description = "Request found", body = Card),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Request not found", body = Object, example = json!({
            "message": "Заявка #7 не найдена"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn get_otgul(
    _auth: AuthActor,
    service: web::Data<OtgulService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();
    let request = web::block(move || service.get(request_id)).await??;
    Ok(HttpResponse::Ok().json(render_request_card(&request, &[])))
}

/* =========================
Approve (moderators)
========================= */
/// Swagger doc for approve_otgul endpoint
#[utoipa::path(
    put,
    path = "/api/otgul/{request_id}/approve",
    params(
        ("request_id" = u64, Path, description = "ID of the otgul request to approve")
    ),
    responses(
        (status = 200, description = "Approved, updated card", body = Card),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed", body = Object, example = json!({
            "message": "Заявка #7 уже обработана"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn approve_otgul(
    auth: AuthActor,
    service: web::Data<OtgulService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();
    let AuthActor(actor) = auth;
    let request =
        web::block(move || service.approve(request_id, &actor, service.now())).await??;
    Ok(HttpResponse::Ok().json(render_request_card(&request, &[])))
}

/* =========================
Reject (moderators)
========================= */
/// Swagger doc for reject_otgul endpoint
#[utoipa::path(
    put,
    path = "/api/otgul/{request_id}/reject",
    params(
        ("request_id" = u64, Path, description = "ID of the otgul request to reject")
    ),
    request_body(
        content = RejectOtgulReq,
        description = "Optional rejection reason",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Rejected, updated card", body = Card),
        (status = 400, description = "Rejection reason over 200 characters"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn reject_otgul(
    auth: AuthActor,
    service: web::Data<OtgulService>,
    path: web::Path<u64>,
    payload: Option<web::Json<RejectOtgulReq>>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();
    let reason = payload.and_then(|p| p.into_inner().reason);
    let AuthActor(actor) = auth;
    let request =
        web::block(move || service.reject(request_id, &actor, reason, service.now())).await??;
    Ok(HttpResponse::Ok().json(render_request_card(&request, &[])))
}

/// Delete a pending request (owner or elevated capability)
#[utoipa::path(
    delete,
    path = "/api/otgul/{request_id}",
    params(
        ("request_id" = u64, Path, description = "ID of the otgul request to delete")
    ),
    responses(
        (status = 200, description = "Request deleted", body = Object, example = json!({
            "message": "Заявка удалена"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Only pending requests can be deleted")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn delete_otgul(
    auth: AuthActor,
    service: web::Data<OtgulService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();
    let AuthActor(actor) = auth;
    web::block(move || service.remove(request_id, &actor)).await??;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Заявка удалена",
        "requestId": request_id
    })))
}

/// Caller's own requests, last ten shown
#[utoipa::path(
    get,
    path = "/api/otgul/mine",
    responses(
        (status = 200, description = "History card", body = Card),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No requests yet", body = Object, example = json!({
            "message": "У вас нет запросов на отгул"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn my_otguls(
    auth: AuthActor,
    service: web::Data<OtgulService>,
) -> actix_web::Result<impl Responder> {
    let AuthActor(actor) = auth;
    let requests = web::block(move || service.list_for_user(&actor.user_id)).await??;
    match render_history(&requests) {
        Some(card) => Ok(HttpResponse::Ok().json(card)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "У вас нет запросов на отгул"
        }))),
    }
}

/// Cards of every pending request, for re-attaching buttons after a restart
#[utoipa::path(
    get,
    path = "/api/otgul/pending",
    responses(
        (status = 200, description = "Pending request cards", body = [Card]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn pending_otguls(
    _auth: AuthActor,
    service: web::Data<OtgulService>,
) -> actix_web::Result<impl Responder> {
    let cards: Vec<Card> = web::block(move || service.list_pending_on_startup())
        .await??
        .iter()
        .map(|request| render_request_card(request, &[]))
        .collect();
    Ok(HttpResponse::Ok().json(cards))
}

/// Info card with the submit button (moderators only)
#[utoipa::path(
    get,
    path = "/api/otgul/info",
    responses(
        (status = 200, description = "Info card", body = Card),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a moderator")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn info_otguls(
    auth: AuthActor,
    service: web::Data<OtgulService>,
) -> actix_web::Result<impl Responder> {
    if !service.can_moderate(&auth) {
        return Err(LifecycleError::Forbidden.into());
    }
    Ok(HttpResponse::Ok().json(render_info_card(service.now())))
}

/// Which buttons the caller may use on a request
#[utoipa::path(
    get,
    path = "/api/otgul/{request_id}/permissions",
    params(
        ("request_id" = u64, Path, description = "ID of the otgul request")
    ),
    responses(
        (status = 200, description = "Caller permissions", body = PermissionsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Otgul"
)]
pub async fn otgul_permissions(
    auth: AuthActor,
    service: web::Data<OtgulService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();
    let can_moderate = service.can_moderate(&auth);
    let AuthActor(actor) = auth;
    let can_delete = web::block(move || service.can_delete(&actor, request_id)).await??;
    Ok(HttpResponse::Ok().json(PermissionsResponse {
        can_moderate,
        can_delete,
    }))
}
