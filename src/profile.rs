//! Device classification.
//!
//! A device is *handheld* when its user agent looks like a phone or tablet, or
//! when the viewport is small in both dimensions. Nothing here touches the
//! document; the result is derived on demand from what the [`Host`] reports.

use std::sync::LazyLock;

use regex::Regex;

use crate::{config::AdapterConfig, host::Host};

static HANDHELD_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("handheld signature pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Inner size of the window in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Portrait only when strictly taller than wide. Square viewports are landscape.
    pub fn orientation(&self) -> Orientation {
        if self.height > self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    pub fn is_portrait(&self) -> bool {
        self.orientation() == Orientation::Portrait
    }
}

/// Returns true if the user agent names a known phone or tablet platform.
pub fn matches_handheld_signature(user_agent: &str) -> bool {
    HANDHELD_SIGNATURE.is_match(user_agent)
}

/// Signature match, or a viewport within both handheld bounds.
pub fn detect_handheld(user_agent: &str, viewport: Viewport, config: &AdapterConfig) -> bool {
    matches_handheld_signature(user_agent)
        || (viewport.width <= config.handheld_max_width
            && viewport.height <= config.handheld_max_height)
}

/// Snapshot of what the adapter knows about the device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub user_agent: String,
    pub viewport: Viewport,
    pub handheld: bool,
}

impl DeviceProfile {
    pub fn detect<H: Host + ?Sized>(host: &H, config: &AdapterConfig) -> Self {
        let user_agent = host.user_agent();
        let viewport = host.viewport();
        let handheld = detect_handheld(&user_agent, viewport, config);
        Self {
            user_agent,
            viewport,
            handheld,
        }
    }
}
