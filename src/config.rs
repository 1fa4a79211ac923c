//! Tunables of the viewport adapter.
//!
//! There is no runtime configuration surface: the page gets the defaults.
//! The struct exists so the constants live in one place and tests can shrink
//! or stretch delays without touching the adapter.

use instant::Duration;

/// Id of the rotation prompt node. At most one element with this id exists.
pub const ROTATION_PROMPT_ID: &str = "rotation-message";

#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    /// A viewport at most this wide (and at most `handheld_max_height` tall)
    /// counts as handheld regardless of the user agent.
    pub handheld_max_width: f64,
    pub handheld_max_height: f64,
    /// The rotation prompt is force-removed after this long.
    pub prompt_timeout: Duration,
    /// Delay of the one-off orientation check after initialization so layout can settle.
    pub settle_delay: Duration,
    /// `max-width` of the media query that disables selection and pinch zoom.
    pub style_breakpoint: u32,
    pub prompt_id: String,
    pub prompt_icon: String,
    pub prompt_title: String,
    pub prompt_hint: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            handheld_max_width: 768.0,
            handheld_max_height: 1024.0,
            prompt_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_millis(1000),
            style_breakpoint: 768,
            prompt_id: ROTATION_PROMPT_ID.to_string(),
            prompt_icon: "📱".to_string(),
            prompt_title: "Please rotate your device".to_string(),
            prompt_hint: "Turn your phone to landscape mode for the best experience".to_string(),
        }
    }
}

impl AdapterConfig {
    pub fn with_handheld_bounds(mut self, max_width: f64, max_height: f64) -> Self {
        self.handheld_max_width = max_width;
        self.handheld_max_height = max_height;
        self
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_prompt_text(mut self, title: impl Into<String>, hint: impl Into<String>) -> Self {
        self.prompt_title = title.into();
        self.prompt_hint = hint.into();
        self
    }
}
