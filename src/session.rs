use time::OffsetDateTime;

use crate::hooks::HookFn;
use crate::storage::{self, KeyValueStore, StorageError, AUTH_KEY};
use crate::time_ext::TimeDurationExt;
use crate::timers::{SchedulerError, TimerHandle, TimerScheduler};
use crate::token::{AuthRecord, TokenKind};

/// Read the auth record. Values which are not a map of token claims count as absent.
pub(crate) fn read_auth_record(
    store: &dyn KeyValueStore,
) -> Result<Option<AuthRecord>, StorageError> {
    let Some(value) = storage::read_value(store, AUTH_KEY)? else {
        return Ok(None);
    };
    match serde_json::from_value::<AuthRecord>(value) {
        Ok(record) => Ok(Some(record)),
        Err(err) => {
            tracing::debug!(?err, "Stored auth record is unreadable. Treating it as absent.");
            Ok(None)
        }
    }
}

/// True without a record, otherwise true as soon as any stored token, of whatever kind, expired.
pub fn are_tokens_expired(record: Option<&AuthRecord>, now: OffsetDateTime) -> bool {
    match record {
        None => true,
        Some(record) => record.iter().any(|(_name, claims)| claims.is_expired(now)),
    }
}

/// Requires an id or access token. Every one of those two which is present must be unexpired.
/// Other token kinds are not considered.
pub fn is_authenticated(record: Option<&AuthRecord>, now: OffsetDateTime) -> bool {
    let Some(record) = record else {
        return false;
    };
    let mut relevant = TokenKind::ALL
        .into_iter()
        .filter_map(|kind| record.get(kind))
        .peekable();
    if relevant.peek().is_none() {
        return false;
    }
    relevant.all(|claims| !claims.is_expired(now))
}

/// Arm one timer per stored token carrying an `exp`, firing `on_expired` when the token expires.
/// Already expired tokens fire on the next tick.
pub(crate) fn set_token_expiry_timers(
    record: &AuthRecord,
    now: OffsetDateTime,
    timers: &dyn TimerScheduler,
    on_expired: Option<HookFn>,
) -> Result<Vec<TimerHandle>, SchedulerError> {
    let mut handles = Vec::with_capacity(record.len());
    for (name, claims) in record.iter() {
        let Some(time_left) = claims.time_left(now) else {
            tracing::trace!(token = %name, "Token does not expire. No timer armed.");
            continue;
        };
        let delay = time_left.to_std_duration();
        tracing::trace!(token = %name, ?delay, "Arming token expiry timer");

        let name = name.to_owned();
        let on_expired = on_expired.clone();
        let handle = timers.schedule(
            delay,
            Box::new(move || {
                tracing::debug!(token = %name, "Token expired");
                if let Some(on_expired) = on_expired {
                    on_expired();
                }
            }),
        )?;
        handles.push(handle);
    }
    Ok(handles)
}
