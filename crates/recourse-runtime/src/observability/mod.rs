//! Where surfaced errors go: the error log and user notifications.

mod log;
mod notification;

pub use log::{ErrorLog, ErrorLogEntry};
pub use notification::{Notification, NotificationCenter, NotificationEvent, NotificationSink};
