use crate::{
    api::{gateway, otgul},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Scope, middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst are non-zero");
        Governor::new(&cfg)
    }

    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(otgul_scope())
            .service(gateway_scope()),
    );
}

pub fn otgul_scope() -> Scope {
    web::scope("/otgul")
        // /otgul
        .service(web::resource("").route(web::post().to(otgul::submit_otgul)))
        // fixed paths before /otgul/{id}
        .service(web::resource("/mine").route(web::get().to(otgul::my_otguls)))
        .service(web::resource("/pending").route(web::get().to(otgul::pending_otguls)))
        .service(web::resource("/info").route(web::get().to(otgul::info_otguls)))
        // /otgul/{id}
        .service(
            web::resource("/{id}")
                .route(web::get().to(otgul::get_otgul))
                .route(web::delete().to(otgul::delete_otgul)),
        )
        // /otgul/{id}/approve
        .service(web::resource("/{id}/approve").route(web::put().to(otgul::approve_otgul)))
        // /otgul/{id}/reject
        .service(web::resource("/{id}/reject").route(web::put().to(otgul::reject_otgul)))
        // /otgul/{id}/permissions
        .service(
            web::resource("/{id}/permissions").route(web::get().to(otgul::otgul_permissions)),
        )
}

pub fn gateway_scope() -> Scope {
    web::scope("/gateway")
        .service(web::resource("/events").route(web::get().to(gateway::drain_events)))
}

// GATEWAY (chat platform side)
//  ├─ signs actor claims with BOT_TOKEN
//  └─ Authorization: Bearer actor_token

// BUTTON CLICK
//  └─ PUT /otgul/{id}/approve
//       └─ card re-render + DM queued in /gateway/events
