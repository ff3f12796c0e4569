use std::time::{Duration, Instant};

pub const SUCCESS_DURATION: Duration = Duration::from_millis(1500);
pub const ERROR_DURATION: Duration = Duration::from_millis(10_000);

/// A transient status notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Compiling,
    Compiled { elapsed: Duration },
    Failed,
}

impl StatusMessage {
    pub fn text(&self) -> String {
        match self {
            StatusMessage::Compiling => "Compiling less --> css".to_string(),
            StatusMessage::Compiled { elapsed } => {
                format!("Less compiled in {}ms", elapsed.as_millis())
            }
            StatusMessage::Failed => {
                "Error compiling less (more detail in Errors and Warnings)".to_string()
            }
        }
    }

    /// How long the message stays visible; `None` until replaced
    pub fn duration(&self) -> Option<Duration> {
        match self {
            StatusMessage::Compiling => None,
            StatusMessage::Compiled { .. } => Some(SUCCESS_DURATION),
            StatusMessage::Failed => Some(ERROR_DURATION),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StatusMessage::Failed)
    }
}

/// The status area owned by an adapter.
///
/// Holds at most one visible message. Showing a new message hides the
/// previous one, including an outstanding error alert.
#[derive(Debug, Default)]
pub struct StatusLine {
    current: Option<(StatusMessage, Instant)>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: StatusMessage) {
        self.show_at(message, Instant::now());
    }

    pub fn show_at(&mut self, message: StatusMessage, now: Instant) {
        self.current = Some((message, now));
    }

    pub fn hide(&mut self) {
        self.current = None;
    }

    /// The message visible at `now`, if it has not expired
    pub fn visible_at(&self, now: Instant) -> Option<&StatusMessage> {
        let (message, shown) = self.current.as_ref()?;
        match message.duration() {
            Some(duration) if now.duration_since(*shown) >= duration => None,
            _ => Some(message),
        }
    }

    pub fn visible(&self) -> Option<&StatusMessage> {
        self.visible_at(Instant::now())
    }

    /// Whether an error alert is currently showing
    pub fn has_error(&self) -> bool {
        self.visible().is_some_and(StatusMessage::is_error)
    }
}
