use crate::notify::NotificationKind;

/// Model behind the one-line status bar at the bottom of the screen.
#[derive(Debug, Clone)]
pub struct StatusBar {
    pub connected: bool,
    pub docker_message: String,
    pub message: String,
    /// Colour hint for `message`; `None` is neutral.
    pub tone: Option<NotificationKind>,
    pub loading: bool,
    /// Progress in `0.0..=1.0`, if an operation reports one.
    pub progress: Option<f64>,
    pub progress_text: String,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self {
            connected: false,
            docker_message: "Docker: connecting…".to_string(),
            message: "Ready".to_string(),
            tone: None,
            loading: false,
            progress: None,
            progress_text: String::new(),
        }
    }
}

impl StatusBar {
    pub fn set_docker_status(&mut self, connected: bool, message: Option<&str>) {
        self.connected = connected;
        self.docker_message = match (connected, message) {
            (_, Some(m)) => format!("Docker: {m}"),
            (true, None) => "Docker: connected".to_string(),
            (false, None) => "Docker: disconnected".to_string(),
        };
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.tone = None;
    }

    pub fn show_loading(&mut self, message: impl Into<String>) {
        self.loading = true;
        self.set_message(message);
    }

    pub fn hide_loading(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.set_message(message);
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.message = message.into();
        self.tone = Some(NotificationKind::Error);
    }

    pub fn show_success(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.message = message.into();
        self.tone = Some(NotificationKind::Success);
    }

    pub fn set_progress(&mut self, fraction: f64, text: impl Into<String>) {
        self.progress = Some(fraction.clamp(0.0, 1.0));
        self.progress_text = text.into();
    }

    /// Progress line without a known fraction, e.g. streamed pull output.
    pub fn set_progress_text(&mut self, text: impl Into<String>) {
        self.progress_text = text.into();
    }

    pub fn clear_progress(&mut self) {
        self.progress = None;
        self.progress_text.clear();
    }
}
