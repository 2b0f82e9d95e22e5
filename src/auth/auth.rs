use crate::model::actor::Actor;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// The acting chat member, put in request extensions by `auth_middleware`.
pub struct AuthActor(pub Actor);

impl FromRequest for AuthActor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Actor>() {
            Some(actor) => ready(Ok(AuthActor(actor.clone()))),
            None => ready(Err(ErrorUnauthorized("Missing actor"))),
        }
    }
}

impl std::ops::Deref for AuthActor {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.0
    }
}
