use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDateTime};
use derive_more::Display;
use tracing::{info, instrument, warn};

use crate::auth::policy::PermissionPolicy;
use crate::gateway::Gateway;
use crate::model::actor::Actor;
use crate::model::request::{Request, RequestDraft, RequestStatus, StatusUpdate};
use crate::store::{RecordStore, StoreError};
use crate::utils::validation::{
    FULL_NAME_MAX_LEN, FieldError, REASON_MAX_LEN, STATIC_ID_MAX_LEN, TIME_TEXT_MAX_LEN,
    TimeRangeError, has_pending_today, is_future_start, limit_field, parse_time_range,
    require_field,
};

#[derive(Debug, Display)]
pub enum LifecycleError {
    #[display(fmt = "У вас уже есть активная заявка на сегодня! Можно подать только одну заявку в день.")]
    DuplicateRequest,
    #[display(fmt = "{}", _0)]
    InvalidField(FieldError),
    #[display(fmt = "{}", _0)]
    InvalidTime(TimeRangeError),
    #[display(fmt = "Время должно быть в будущем относительно текущего момента!")]
    PastTime,
    #[display(fmt = "Заявка #{} не найдена", _0)]
    NotFound(u64),
    #[display(fmt = "У вас нет прав для этого действия")]
    Forbidden,
    #[display(fmt = "Заявка #{} уже обработана", _0)]
    AlreadyProcessed(u64),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl std::error::Error for LifecycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifecycleError::InvalidField(e) => Some(e),
            LifecycleError::InvalidTime(e) => Some(e),
            LifecycleError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TimeRangeError> for LifecycleError {
    fn from(e: TimeRangeError) -> Self {
        LifecycleError::InvalidTime(e)
    }
}

impl From<FieldError> for LifecycleError {
    fn from(e: FieldError) -> Self {
        LifecycleError::InvalidField(e)
    }
}

impl From<StoreError> for LifecycleError {
    fn from(e: StoreError) -> Self {
        LifecycleError::Store(e)
    }
}

/// What the requester typed into the otgul form.
#[derive(Debug, Clone)]
pub struct Submission {
    pub requester_id: String,
    pub display_name: String,
    pub static_id: String,
    pub time_text: String,
    pub reason: String,
}

impl Submission {
    /// Every form field is required and length-limited.
    fn check_fields(&self) -> Result<(), FieldError> {
        require_field("Имя и фамилия", &self.display_name, FULL_NAME_MAX_LEN)?;
        require_field("Статик", &self.static_id, STATIC_ID_MAX_LEN)?;
        require_field("Время", &self.time_text, TIME_TEXT_MAX_LEN)?;
        require_field("Причина", &self.reason, REASON_MAX_LEN)
    }
}

/// Drives requests through Pending -> Approved | Rejected | deleted.
///
/// Every operation holds `write_lock` for its whole read-modify-write cycle,
/// so concurrent clicks on the same request cannot both pass the
/// pending check.
pub struct OtgulService {
    store: RecordStore,
    policy: PermissionPolicy,
    gateway: Arc<dyn Gateway>,
    default_department: String,
    clock: fn() -> NaiveDateTime,
    write_lock: Mutex<()>,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl OtgulService {
    pub fn new(
        store: RecordStore,
        policy: PermissionPolicy,
        gateway: Arc<dyn Gateway>,
        default_department: impl Into<String>,
    ) -> Self {
        Self {
            store,
            policy,
            gateway,
            default_department: default_department.into(),
            clock: local_now,
            write_lock: Mutex::new(()),
        }
    }

    /// Replaces the local wall clock used by `now`.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Local wall-clock time; dates and the future-start check are local.
    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[instrument(skip(self, submission), fields(requester_id = %submission.requester_id))]
    pub fn submit(
        &self,
        submission: Submission,
        now: NaiveDateTime,
    ) -> Result<Request, LifecycleError> {
        submission.check_fields()?;

        let _guard = self.lock();
        let today = now.date();

        if has_pending_today(&self.store.list()?, &submission.requester_id, today) {
            return Err(LifecycleError::DuplicateRequest);
        }
        let parsed = parse_time_range(&submission.time_text)?;
        if !is_future_start(parsed.range.start, now) {
            return Err(LifecycleError::PastTime);
        }

        let request = self.store.append(
            RequestDraft {
                requester_id: submission.requester_id,
                requester_display_name: submission.display_name,
                date: today,
                time_range: Some(parsed.range),
                static_id: submission.static_id,
                department: self.default_department.clone(),
                reason: submission.reason,
            },
            now,
        )?;

        info!(request_id = request.id, time = %parsed.range, "otgul request submitted");
        Ok(request)
    }

    pub fn approve(
        &self,
        request_id: u64,
        actor: &Actor,
        now: NaiveDateTime,
    ) -> Result<Request, LifecycleError> {
        let request = self.decide(request_id, actor, RequestStatus::Approved, None, now)?;
        self.notify(
            &request,
            format!(
                "✅ Ваш запрос на отгул #{} был одобрен модератором {}!",
                request.id, actor.display_name
            ),
        );
        Ok(request)
    }

    /// A blank reason is stored as no reason.
    pub fn reject(
        &self,
        request_id: u64,
        actor: &Actor,
        reason: Option<String>,
        now: NaiveDateTime,
    ) -> Result<Request, LifecycleError> {
        if let Some(reason) = &reason {
            limit_field("Причина отклонения", reason, REASON_MAX_LEN)?;
        }
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let request = self.decide(
            request_id,
            actor,
            RequestStatus::Rejected,
            reason.clone(),
            now,
        )?;

        let mut text = format!(
            "❌ Ваш запрос на отгул #{} был отклонен модератором {}.",
            request.id, actor.display_name
        );
        if let Some(reason) = reason {
            text.push_str(&format!("\nПричина: {reason}"));
        }
        self.notify(&request, text);
        Ok(request)
    }

    #[instrument(skip(self, actor, rejection_reason), fields(moderator_id = %actor.user_id))]
    fn decide(
        &self,
        request_id: u64,
        actor: &Actor,
        status: RequestStatus,
        rejection_reason: Option<String>,
        now: NaiveDateTime,
    ) -> Result<Request, LifecycleError> {
        let _guard = self.lock();

        let current = self
            .store
            .get(request_id)?
            .ok_or(LifecycleError::NotFound(request_id))?;
        if !self.policy.can_moderate(actor) {
            return Err(LifecycleError::Forbidden);
        }
        if !current.is_pending() {
            return Err(LifecycleError::AlreadyProcessed(request_id));
        }

        let updated = self
            .store
            .update_status(
                request_id,
                StatusUpdate {
                    status,
                    moderator_id: Some(actor.user_id.clone()),
                    moderator_name: Some(actor.display_name.clone()),
                    rejection_reason,
                    processed_at: now,
                },
            )?
            .ok_or(LifecycleError::NotFound(request_id))?;

        info!(request_id, %status, "otgul request processed");
        self.gateway.render_status(&updated);
        Ok(updated)
    }

    /// Delivery failures are logged and never reach the moderator.
    fn notify(&self, request: &Request, text: String) {
        if let Err(e) = self.gateway.notify_user(&request.requester_id, &text) {
            warn!(
                error = %e,
                request_id = request.id,
                user_id = %request.requester_id,
                "failed to notify requester"
            );
        }
    }

    #[instrument(skip(self, actor), fields(actor_id = %actor.user_id))]
    pub fn remove(&self, request_id: u64, actor: &Actor) -> Result<(), LifecycleError> {
        let _guard = self.lock();

        let current = self
            .store
            .get(request_id)?
            .ok_or(LifecycleError::NotFound(request_id))?;
        if !self.policy.can_delete(actor, &current) {
            return Err(LifecycleError::Forbidden);
        }
        if !current.is_pending() {
            return Err(LifecycleError::AlreadyProcessed(request_id));
        }

        if !self.store.remove(request_id)? {
            return Err(LifecycleError::NotFound(request_id));
        }
        info!(request_id, "otgul request deleted");
        Ok(())
    }

    pub fn get(&self, request_id: u64) -> Result<Request, LifecycleError> {
        let _guard = self.lock();
        self.store
            .get(request_id)?
            .ok_or(LifecycleError::NotFound(request_id))
    }

    /// All of a requester's records in insertion order.
    pub fn list_for_user(&self, requester_id: &str) -> Result<Vec<Request>, LifecycleError> {
        let _guard = self.lock();
        let mut records = self.store.list()?;
        records.retain(|r| r.requester_id == requester_id);
        Ok(records)
    }

    /// Pending records whose buttons must be re-attached after a restart.
    pub fn list_pending_on_startup(&self) -> Result<Vec<Request>, LifecycleError> {
        let _guard = self.lock();
        let mut records = self.store.list()?;
        records.retain(Request::is_pending);
        Ok(records)
    }

    pub fn can_moderate(&self, actor: &Actor) -> bool {
        self.policy.can_moderate(actor)
    }

    pub fn can_delete(&self, actor: &Actor, request_id: u64) -> Result<bool, LifecycleError> {
        let request = self.get(request_id)?;
        Ok(self.policy.can_delete(actor, &request))
    }
}
