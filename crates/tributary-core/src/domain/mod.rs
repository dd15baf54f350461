//! Domain model (notifications, locators, lifecycle states, errors).

pub mod errors;
pub mod locator;
pub mod notification;
pub mod state;

pub use self::errors::{IngressError, LoadError, QueueError, UnescapeError};
pub use self::locator::{DEFAULT_SCHEME, Locator, ParseLocatorError, unescape_key};
pub use self::notification::{NotificationEnvelope, NotificationRecord};
pub use self::state::{FetchState, LifecycleState};
