use serde::Serialize;
use snafu::{ResultExt, Snafu};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::Rc;

/// Key of the record holding the request key of the last login attempt.
pub const SSO_KEY: &str = "sso";

/// Key of the record holding the decoded claims of all persisted tokens.
pub const AUTH_KEY: &str = "auth";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    #[snafu(display("StorageError: Backend failed: {message}"))]
    Backend { message: String },

    #[snafu(display("StorageError: Could not encode value for '{key}'"))]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

/// A scoped, synchronous key-value store. In a browser this is `window.localStorage`.
///
/// Implementations are shared by everything running under the same origin. Values must
/// always be re-read, never cached, as they may be changed from the outside at any time.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read a value, parsing it as JSON.
///
/// Values which are not valid JSON are passed through as a JSON string, so records written by
/// older versions or by other code on the same origin never produce a read error.
/// Empty values are treated as absent.
pub(crate) fn read_value(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<serde_json::Value>, StorageError> {
    let raw = match store.get(key)? {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::debug!(?err, "Value of '{key}' is not JSON. Passing it through as text.");
            Ok(Some(serde_json::Value::String(raw)))
        }
    }
}

/// Write a value. Strings are stored verbatim, everything else as JSON text.
pub(crate) fn write_value<T>(
    store: &dyn KeyValueStore,
    key: &str,
    data: &T,
) -> Result<(), StorageError>
where
    T: Serialize + Debug + ?Sized,
{
    let value = serde_json::to_value(data).context(EncodeSnafu { key })?;
    let serialized = match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    };
    tracing::trace!(?data, "Writing '{key}' to storage.");
    store.set(key, &serialized)
}

pub(crate) fn remove_value(store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
    tracing::trace!("Removing '{key}' from storage.");
    store.delete(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;
    use serde_json::json;

    #[test]
    fn objects_are_written_as_json_and_read_back() {
        let store = MemoryStore::new();
        write_value(&store, SSO_KEY, &json!({ "requestKey": "abc" })).unwrap();

        assert_that(store.get(SSO_KEY).unwrap().unwrap())
            .is_equal_to(r#"{"requestKey":"abc"}"#.to_owned());
        assert_that(read_value(&store, SSO_KEY).unwrap())
            .is_equal_to(Some(json!({ "requestKey": "abc" })));
    }

    #[test]
    fn strings_are_written_verbatim() {
        let store = MemoryStore::new();
        write_value(&store, AUTH_KEY, "another value").unwrap();

        assert_that(store.get(AUTH_KEY).unwrap().unwrap()).is_equal_to("another value".to_owned());
    }

    #[test]
    fn non_json_values_are_passed_through() {
        let store = MemoryStore::new();
        store.set(SSO_KEY, "some value").unwrap();

        assert_that(read_value(&store, SSO_KEY).unwrap()).is_equal_to(Some(json!("some value")));
    }

    #[test]
    fn missing_and_empty_values_read_as_absent() {
        let store = MemoryStore::new();
        assert_that(read_value(&store, AUTH_KEY).unwrap().is_none()).is_true();

        store.set(AUTH_KEY, "").unwrap();
        assert_that(read_value(&store, AUTH_KEY).unwrap().is_none()).is_true();
    }

    #[test]
    fn removing_is_idempotent() {
        let store = MemoryStore::new();
        store.set(SSO_KEY, "x").unwrap();

        remove_value(&store, SSO_KEY).unwrap();
        remove_value(&store, SSO_KEY).unwrap();

        assert_that(store.is_empty()).is_true();
    }

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::new();
        let view = store.clone();
        store.set(AUTH_KEY, "{}").unwrap();

        assert_that(view.len()).is_equal_to(1);
        view.clear();
        assert_that(store.get(AUTH_KEY).unwrap().is_none()).is_true();
    }
}
