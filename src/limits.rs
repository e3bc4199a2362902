use std::time::Duration;

use crate::model::Ms;

/// Earliest accepted timestamp (1970-01-01).
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// Latest accepted timestamp (2100-01-01).
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 5.0;
/// Pixels of horizontal drag that add 1.0 to the zoom multiplier.
pub const DRAG_ZOOM_DIVISOR: f64 = 300.0;

/// Hard cap on ticks per generation pass.
pub const MAX_TICKS: usize = 10_000;

pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Longest accepted inbound frame in bytes.
pub const MAX_FRAME_LEN: usize = 64 * 1024;
pub const MAX_SUBSCRIBER_KEY_LEN: usize = 256;
