use snafu::Snafu;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NavigationError {
    #[snafu(display("NavigationError: {message}"))]
    Failed { message: String },
}

/// Access to the browser location.
pub trait Navigator {
    /// The fragment of the current location, including the leading `#`. Empty if there is none.
    fn current_fragment(&self) -> String;

    /// Scheme, host and port of the current location, e.g. `https://app.example`.
    fn current_origin(&self) -> String;

    /// Leave the current page for `uri`.
    fn navigate_to(&self, uri: &str) -> Result<(), NavigationError>;
}

#[derive(Debug, Default)]
struct RecordedLocation {
    fragment: String,
    origin: String,
    navigations: Vec<String>,
}

/// A navigator which never leaves the page but records where it was asked to go.
/// Clones share the same location.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    location: Rc<RefCell<RecordedLocation>>,
}

impl RecordingNavigator {
    pub fn new(origin: impl Into<String>) -> Self {
        let navigator = Self::default();
        navigator.location.borrow_mut().origin = origin.into();
        navigator
    }

    pub fn set_fragment(&self, fragment: impl Into<String>) {
        self.location.borrow_mut().fragment = fragment.into();
    }

    /// Every uri passed to [`Navigator::navigate_to`], oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.location.borrow().navigations.clone()
    }

    pub fn last_navigation(&self) -> Option<String> {
        self.location.borrow().navigations.last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn current_fragment(&self) -> String {
        self.location.borrow().fragment.clone()
    }

    fn current_origin(&self) -> String {
        self.location.borrow().origin.clone()
    }

    fn navigate_to(&self, uri: &str) -> Result<(), NavigationError> {
        tracing::trace!(uri, "Recording navigation");
        self.location.borrow_mut().navigations.push(uri.to_owned());
        Ok(())
    }
}
