use std::rc::Rc;

use crate::clock::{Clock, SystemClock};
use crate::decoder::{TokenDecoder, UnverifiedJwtDecoder};
use crate::navigator::Navigator;
use crate::storage::KeyValueStore;
use crate::timers::TimerScheduler;

/// Everything a [`SessionAuthManager`](crate::SessionAuthManager) needs from its surroundings.
#[derive(Clone)]
pub struct Environment {
    pub store: Rc<dyn KeyValueStore>,
    pub navigator: Rc<dyn Navigator>,
    pub timers: Rc<dyn TimerScheduler>,
    pub clock: Rc<dyn Clock>,
    pub decoder: Rc<dyn TokenDecoder>,
}

impl Environment {
    /// Uses the system clock and decodes tokens without verification.
    pub fn new(
        store: impl KeyValueStore + 'static,
        navigator: impl Navigator + 'static,
        timers: impl TimerScheduler + 'static,
    ) -> Self {
        Self {
            store: Rc::new(store),
            navigator: Rc::new(navigator),
            timers: Rc::new(timers),
            clock: Rc::new(SystemClock),
            decoder: Rc::new(UnverifiedJwtDecoder),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn with_decoder(mut self, decoder: impl TokenDecoder + 'static) -> Self {
        self.decoder = Rc::new(decoder);
        self
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}
