use super::*;

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// 记录所有通知的通知器
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(NotificationLevel, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(NotificationLevel, String)> {
        lock(&self.messages).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.by_level(NotificationLevel::Error)
    }

    pub fn infos(&self) -> Vec<String> {
        self.by_level(NotificationLevel::Info)
    }

    fn by_level(&self, level: NotificationLevel) -> Vec<String> {
        lock(&self.messages)
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl INotifier for RecordingNotifier {
    fn info(&self, message: &str) {
        lock(&self.messages).push((NotificationLevel::Info, message.to_string()));
    }

    fn error(&self, message: &str) {
        lock(&self.messages).push((NotificationLevel::Error, message.to_string()));
    }
}
