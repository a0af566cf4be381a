use devpool_core::{Notification, NotificationLevel, Notifier};

/// Prints notifications to stderr so stdout stays machine-readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notification: &Notification) {
        eprintln!("{}", render(notification));
    }
}

fn render(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Warning => "warn",
        NotificationLevel::Error => "error",
    };
    match &notification.description {
        Some(description) => format!("[{tag}] {}: {description}", notification.title),
        None => format!("[{tag}] {}", notification.title),
    }
}
