use crate::models::ActorClaims;
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Mints the token the gateway sends with each relayed interaction.
/// The gateway signs its own tokens; only tests mint them here.
#[cfg(test)]
pub fn generate_actor_token(
    actor: &crate::model::actor::Actor,
    secret: &str,
    ttl: usize,
) -> Result<String, jsonwebtoken::errors::Error> {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default();
    let claims = ActorClaims {
        sub: actor.user_id.clone(),
        name: actor.display_name.clone(),
        roles: actor.roles.clone(),
        manage_messages: actor.manage_messages,
        exp: now + ttl,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<ActorClaims, String> {
    decode::<ActorClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::actor::Actor;

    const SECRET: &str = "test-bot-token-0123456789";

    fn actor() -> Actor {
        Actor {
            user_id: "42".into(),
            display_name: "Петров".into(),
            roles: vec!["Модератор".into()],
            manage_messages: false,
        }
    }

    #[test]
    fn token_round_trips_actor() {
        let token = generate_actor_token(&actor(), SECRET, 60).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(Actor::from(claims), actor());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_actor_token(&actor(), SECRET, 60).unwrap();
        assert!(verify_token(&token, "another-secret-0123456789").is_err());
    }
}
