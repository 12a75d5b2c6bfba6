//! Collaborators backed by the browser window.

use leptos::prelude::{set_timeout_with_handle, window};
use snafu::OptionExt;
use std::time::Duration;

use crate::environment::Environment;
use crate::navigator::{FailedSnafu, NavigationError, Navigator};
use crate::storage::{BackendSnafu, KeyValueStore, StorageError};
use crate::timers::{self, SchedulerError, TimerHandle, TimerScheduler, TimerTask};

fn backend_error(err: impl std::fmt::Debug) -> StorageError {
    BackendSnafu {
        message: format!("{err:?}"),
    }
    .build()
}

/// `window.localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        window()
            .local_storage()
            .map_err(backend_error)?
            .context(BackendSnafu {
                message: "localStorage is not available",
            })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(backend_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?
            .set_item(key, value)
            .map_err(backend_error)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.storage()?
            .remove_item(key)
            .map_err(backend_error)
    }
}

/// `window.location`. Navigating replaces the current history entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowNavigator;

impl Navigator for WindowNavigator {
    fn current_fragment(&self) -> String {
        window().location().hash().unwrap_or_else(|err| {
            tracing::warn!(?err, "Could not read location hash");
            String::new()
        })
    }

    fn current_origin(&self) -> String {
        window().location().origin().unwrap_or_else(|err| {
            tracing::warn!(?err, "Could not read location origin");
            String::new()
        })
    }

    fn navigate_to(&self, uri: &str) -> Result<(), NavigationError> {
        window().location().replace(uri).map_err(|err| {
            FailedSnafu {
                message: format!("{err:?}"),
            }
            .build()
        })
    }
}

/// Longest delay `setTimeout` accepts.
const MAX_TIMEOUT: Duration = Duration::from_millis(i32::MAX as u64);

/// `window.setTimeout`. Delays beyond its limit are waited for in several legs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTimers;

impl TimerScheduler for BrowserTimers {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, SchedulerError> {
        timers::schedule_in_legs(WindowTimeout, MAX_TIMEOUT, delay, task)
    }
}

/// A single `setTimeout` call. Throws on delays above [`MAX_TIMEOUT`].
#[derive(Debug, Clone, Copy)]
struct WindowTimeout;

impl TimerScheduler for WindowTimeout {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle, SchedulerError> {
        let handle = set_timeout_with_handle(task, delay).map_err(|err| {
            timers::BackendSnafu {
                message: format!("{err:?}"),
            }
            .build()
        })?;
        Ok(TimerHandle::new(move || handle.clear()))
    }
}

impl Environment {
    /// Local storage, window location, `setTimeout` and the system clock.
    pub fn browser() -> Self {
        Environment::new(LocalStorageStore, WindowNavigator, BrowserTimers)
    }
}
