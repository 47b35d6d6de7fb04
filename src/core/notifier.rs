use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

/// Channel for messages the user has to see, as opposed to log-only diagnostics.
pub trait Notifier {
    fn warn(&self, title: &str, message: &str);
    fn error(&self, title: &str, message: &str);
    /// Ask a yes/no question. Returns `true` when the user agreed.
    fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Native message boxes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogNotifier;

impl DialogNotifier {
    fn show(level: MessageLevel, title: &str, message: &str) {
        MessageDialog::new()
            .set_level(level)
            .set_title(title)
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }
}

impl Notifier for DialogNotifier {
    fn warn(&self, title: &str, message: &str) {
        log::warn!("{}: {}", title, message);
        Self::show(MessageLevel::Warning, title, message);
    }

    fn error(&self, title: &str, message: &str) {
        log::error!("{}: {}", title, message);
        Self::show(MessageLevel::Error, title, message);
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        let result = MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title(title)
            .set_description(message)
            .set_buttons(MessageButtons::YesNo)
            .show();
        matches!(result, MessageDialogResult::Yes)
    }
}

/// Headless notifier: everything goes to the log and questions are declined.
#[derive(Debug, Default, Clone, Copy)]
#[allow(dead_code)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn warn(&self, title: &str, message: &str) {
        log::warn!("{}: {}", title, message);
    }

    fn error(&self, title: &str, message: &str) {
        log::error!("{}: {}", title, message);
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        log::info!("{}: {} (declined, no interactive session)", title, message);
        false
    }
}
