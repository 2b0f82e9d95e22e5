use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use derive_more::Display;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::request::Request;
use crate::view::{Card, render_request_card};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum NotifyError {
    #[display(fmt = "outbox is full ({} events)", _0)]
    OutboxFull(usize),
}

impl std::error::Error for NotifyError {}

/// Side effects the lifecycle hands to the chat platform.
pub trait Gateway: Send + Sync {
    /// Re-render the message that carries this request's card.
    fn render_status(&self, request: &Request);

    /// Best-effort direct message. Callers log and drop failures.
    fn notify_user(&self, user_id: &str, text: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayEvent {
    RenderStatus { card: Card },
    DirectMessage { user_id: String, text: String },
}

/// Bounded queue of outbound events, drained by the gateway over HTTP.
#[derive(Debug)]
pub struct Outbox {
    events: Mutex<VecDeque<GatewayEvent>>,
    capacity: usize,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    fn push(&self, event: GatewayEvent) -> Result<(), NotifyError> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if events.len() >= self.capacity {
            return Err(NotifyError::OutboxFull(self.capacity));
        }
        events.push_back(event);
        Ok(())
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<GatewayEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        events.drain(..).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Gateway for Outbox {
    fn render_status(&self, request: &Request) {
        let card = render_request_card(request, &[]);
        if let Err(e) = self.push(GatewayEvent::RenderStatus { card }) {
            tracing::warn!(error = %e, request_id = request.id, "dropping render event");
        }
    }

    fn notify_user(&self, user_id: &str, text: &str) -> Result<(), NotifyError> {
        self.push(GatewayEvent::DirectMessage {
            user_id: user_id.to_string(),
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let outbox = Outbox::new(4);
        outbox.notify_user("u1", "первое").unwrap();
        outbox.notify_user("u2", "второе").unwrap();
        assert_eq!(outbox.len(), 2);

        let events = outbox.drain();
        assert_eq!(
            events[0],
            GatewayEvent::DirectMessage {
                user_id: "u1".into(),
                text: "первое".into()
            }
        );
        assert_eq!(events.len(), 2);
        assert_eq!(outbox.len(), 0);
    }

    #[test]
    fn full_outbox_rejects() {
        let outbox = Outbox::new(1);
        outbox.notify_user("u1", "a").unwrap();
        assert_eq!(outbox.notify_user("u1", "b"), Err(NotifyError::OutboxFull(1)));
    }
}
