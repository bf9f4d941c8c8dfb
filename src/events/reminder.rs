//! Reminder dialog adapter. A headless bot has nobody to click through
//! dialogs, so reminders are accepted and "enable" prompts are ignored.

use tracing::{debug, info};

use crate::platform::{ReminderContent, ReminderEvent, ReminderHandler};

#[derive(Debug, Default)]
pub struct ReminderAdapter;

impl ReminderAdapter {
    fn log_content(kind: &str, content: Option<&ReminderContent>) {
        if let Some(content) = content {
            info!("{} notification received", kind);
            debug!(
                "type={} title={:?} content={:?} blocking={}",
                content.kind, content.title, content.content, content.is_blocking
            );
        }
    }
}

impl ReminderEvent for ReminderAdapter {
    fn on_reminder_notify(&self, content: Option<&ReminderContent>, handler: Option<&dyn ReminderHandler>) {
        Self::log_content("reminder", content);
        if let Some(handler) = handler {
            handler.accept();
        }
    }

    fn on_enable_reminder_notify(
        &self,
        content: Option<&ReminderContent>,
        handler: Option<&dyn ReminderHandler>,
    ) {
        Self::log_content("enable reminder", content);
        if let Some(handler) = handler {
            handler.ignore();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SdkStatus;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Answers(Mutex<Vec<&'static str>>);

    impl ReminderHandler for Answers {
        fn accept(&self) -> SdkStatus {
            self.0.lock().push("accept");
            SdkStatus::Success
        }

        fn ignore(&self) -> SdkStatus {
            self.0.lock().push("ignore");
            SdkStatus::Success
        }

        fn decline(&self) -> SdkStatus {
            self.0.lock().push("decline");
            SdkStatus::Success
        }
    }

    #[test]
    fn test_reminders_are_accepted() {
        let answers = Answers::default();
        let content = ReminderContent {
            kind: 1,
            title: "Recording".to_string(),
            content: "This meeting is being recorded".to_string(),
            is_blocking: true,
        };

        ReminderAdapter.on_reminder_notify(Some(&content), Some(&answers as &dyn ReminderHandler));
        assert_eq!(*answers.0.lock(), vec!["accept"]);
    }

    #[test]
    fn test_enable_reminders_are_ignored() {
        let answers = Answers::default();
        ReminderAdapter.on_enable_reminder_notify(None, Some(&answers as &dyn ReminderHandler));
        assert_eq!(*answers.0.lock(), vec!["ignore"]);
    }

    #[test]
    fn test_missing_handler_is_tolerated() {
        ReminderAdapter.on_reminder_notify(None, None);
    }
}
