//! Vendor-prefixed presentation APIs as ordered lookup tables.
//!
//! Browsers shipped fullscreen and orientation locking under several names
//! before the standard settled. Each table lists the candidates from most to
//! least preferred; the first one the host actually exposes wins. Supporting a
//! new name means adding a row.

use crate::host::{Host, Pending, Target};

/// Argument passed to every orientation-lock entry point.
pub const LANDSCAPE: &str = "landscape";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationLockApi {
    pub target: Target,
    pub method: &'static str,
}

pub const ORIENTATION_LOCK_APIS: &[OrientationLockApi] = &[
    OrientationLockApi {
        target: Target::ScreenOrientation,
        method: "lock",
    },
    OrientationLockApi {
        target: Target::Screen,
        method: "lockOrientation",
    },
    OrientationLockApi {
        target: Target::Screen,
        method: "mozLockOrientation",
    },
    OrientationLockApi {
        target: Target::Screen,
        method: "msLockOrientation",
    },
];

/// Flags on `document` that say whether fullscreen may be requested at all.
pub const FULLSCREEN_ENABLED_FLAGS: &[&str] = &[
    "fullscreenEnabled",
    "webkitFullscreenEnabled",
    "mozFullScreenEnabled",
    "msFullscreenEnabled",
];

/// Request entry points on `document.documentElement`.
pub const FULLSCREEN_REQUEST_METHODS: &[&str] = &[
    "requestFullscreen",
    "webkitRequestFullscreen",
    "mozRequestFullScreen",
    "msRequestFullscreen",
];

pub fn find_orientation_lock<H: Host + ?Sized>(host: &H) -> Option<OrientationLockApi> {
    ORIENTATION_LOCK_APIS
        .iter()
        .copied()
        .find(|api| host.has_member(api.target, api.method))
}

pub fn supports_orientation_lock<H: Host + ?Sized>(host: &H) -> bool {
    find_orientation_lock(host).is_some()
}

pub fn supports_fullscreen<H: Host + ?Sized>(host: &H) -> bool {
    FULLSCREEN_ENABLED_FLAGS
        .iter()
        .any(|flag| host.is_truthy(Target::Document, flag))
}

pub fn find_fullscreen_request<H: Host + ?Sized>(host: &H) -> Option<&'static str> {
    FULLSCREEN_REQUEST_METHODS
        .iter()
        .copied()
        .find(|method| host.has_member(Target::DocumentElement, method))
}

impl OrientationLockApi {
    pub fn lock_landscape<H: Host + ?Sized>(&self, host: &H) -> Pending {
        host.invoke(self.target, self.method, &[LANDSCAPE])
    }
}
