use std::sync::Arc;

use actix_web::{App, http::StatusCode, middleware::from_fn, test, web, web::Data};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Value, json};

use crate::auth::{jwt::generate_actor_token, middleware::auth_middleware, policy::PermissionPolicy};
use crate::config::Config;
use crate::gateway::Outbox;
use crate::lifecycle::OtgulService;
use crate::model::actor::Actor;
use crate::routes::{gateway_scope, otgul_scope};
use crate::store::RecordStore;

const SECRET: &str = "test-bot-token-0123456789";

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap()
}

struct Fixture {
    _dir: tempfile::TempDir,
    service: Data<OtgulService>,
    outbox: Data<Outbox>,
    config: Data<Config>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let data_file = dir.path().join("otgul_requests.json");
    let config = Config::from_lookup(|key| match key {
        "BOT_TOKEN" => Some(SECRET.to_string()),
        "OTGUL_FILE" => Some(data_file.display().to_string()),
        _ => None,
    })
    .unwrap();

    let outbox = Arc::new(Outbox::new(config.outbox_capacity));
    let service = OtgulService::new(
        RecordStore::open(&config.data_file),
        PermissionPolicy::new(config.moderator_roles.clone()),
        outbox.clone(),
        config.default_department.clone(),
    )
    .with_clock(fixed_now);

    Fixture {
        _dir: dir,
        service: Data::new(service),
        outbox: Data::from(outbox),
        config: Data::new(config),
    }
}

macro_rules! init_app {
    ($fx:expr) => {
        test::init_service(
            App::new()
                .app_data($fx.service.clone())
                .app_data($fx.outbox.clone())
                .app_data($fx.config.clone())
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .service(otgul_scope())
                        .service(gateway_scope()),
                ),
        )
        .await
    };
}

fn member(id: &str) -> Actor {
    Actor {
        user_id: id.into(),
        display_name: "Иван Иванов".into(),
        roles: vec![],
        manage_messages: false,
    }
}

fn commander() -> Actor {
    Actor {
        user_id: "m1".into(),
        display_name: "Петров".into(),
        roles: vec!["Начальник УГИБДД".into()],
        manage_messages: false,
    }
}

fn bearer(actor: &Actor) -> (&'static str, String) {
    let token = generate_actor_token(actor, SECRET, 300).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

fn form(time: &str) -> Value {
    json!({
        "full_name": "Иван Иванов",
        "static_id": "123-456",
        "time": time,
        "reason": "Гражданские дела"
    })
}

#[actix_web::test]
async fn rejects_missing_or_forged_token() {
    let fx = fixture();
    let app = init_app!(fx);

    let req = test::TestRequest::get().uri("/api/otgul/mine").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let forged = generate_actor_token(&member("u1"), "some-other-secret-000000", 300).unwrap();
    let req = test::TestRequest::get()
        .uri("/api/otgul/mine")
        .insert_header(("Authorization", format!("Bearer {forged}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn submit_approve_and_notify() {
    let fx = fixture();
    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/otgul")
        .insert_header(bearer(&member("u1")))
        .set_json(form("15:00 - 15:30"))
        .to_request();
    let card: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(card["request_id"], 1);
    assert_eq!(card["color"], "blue");
    assert_eq!(card["mentions"].as_array().unwrap().len(), 4);
    assert_eq!(card["fields"][3]["value"], "15:00 - 15:30 (30 мин)");

    let req = test::TestRequest::put()
        .uri("/api/otgul/1/approve")
        .insert_header(bearer(&commander()))
        .to_request();
    let card: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(card["color"], "green");
    assert_eq!(card["buttons"][0]["disabled"], true);

    let req = test::TestRequest::put()
        .uri("/api/otgul/1/approve")
        .insert_header(bearer(&commander()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri("/api/gateway/events")
        .insert_header(bearer(&member("gateway")))
        .to_request();
    let events: Value = test::call_and_read_body_json(&app, req).await;
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["kind"], "render_status");
    assert_eq!(events[1]["kind"], "direct_message");
    assert_eq!(events[1]["user_id"], "u1");
    assert!(fx.outbox.drain().is_empty());
}

#[actix_web::test]
async fn validation_errors_are_bad_requests() {
    let fx = fixture();
    let app = init_app!(fx);

    for time in ["15:00 - 16:01", "16:00 - 15:00", "not a time", "13:00 - 13:30"] {
        let req = test::TestRequest::post()
            .uri("/api/otgul")
            .insert_header(bearer(&member("u1")))
            .set_json(form(time))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{time}");
    }

    let req = test::TestRequest::post()
        .uri("/api/otgul")
        .insert_header(bearer(&member("u1")))
        .set_json(form("15:00 - 16:01"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Максимальная длительность отгула: 1 час");

    let mut blank_reason = form("15:00 - 15:30");
    blank_reason["reason"] = json!("");
    let req = test::TestRequest::post()
        .uri("/api/otgul")
        .insert_header(bearer(&member("u1")))
        .set_json(blank_reason)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Поле «Причина» обязательно для заполнения");

    let req = test::TestRequest::post()
        .uri("/api/otgul")
        .insert_header(bearer(&member("u1")))
        .set_json(form("15:00 - 15:30"))
        .to_request();
    assert!(test::call_service(&app, req).await.status().is_success());

    let req = test::TestRequest::put()
        .uri("/api/otgul/1/reject")
        .insert_header(bearer(&commander()))
        .set_json(json!({ "reason": "x".repeat(201) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn permission_checks_map_to_forbidden() {
    let fx = fixture();
    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/otgul")
        .insert_header(bearer(&member("u1")))
        .set_json(form("15:00 - 15:30"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::put()
        .uri("/api/otgul/1/reject")
        .insert_header(bearer(&member("u2")))
        .set_json(json!({ "reason": "нет" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri("/api/otgul/1")
        .insert_header(bearer(&commander()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/otgul/1/permissions")
        .insert_header(bearer(&commander()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "canModerate": true, "canDelete": false }));

    let req = test::TestRequest::get()
        .uri("/api/otgul/info")
        .insert_header(bearer(&member("u1")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri("/api/otgul/1")
        .insert_header(bearer(&member("u1")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/otgul/1")
        .insert_header(bearer(&member("u1")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn reject_without_body_and_history() {
    let fx = fixture();
    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri("/api/otgul/mine")
        .insert_header(bearer(&member("u1")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/api/otgul")
        .insert_header(bearer(&member("u1")))
        .set_json(form("15:00 - 15:30"))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::put()
        .uri("/api/otgul/1/reject")
        .insert_header(bearer(&commander()))
        .to_request();
    let card: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(card["color"], "red");

    let req = test::TestRequest::get()
        .uri("/api/otgul/pending")
        .insert_header(bearer(&commander()))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending, json!([]));

    let req = test::TestRequest::get()
        .uri("/api/otgul/mine")
        .insert_header(bearer(&member("u1")))
        .to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history["fields"][0]["value"], "Статус: Отклонен\nОтклонил: Петров");
}
