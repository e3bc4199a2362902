use crate::limits::*;

/// Keyboard modifier that gates a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
    Meta,
}

/// Modifier keys held during a pointer or wheel event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn held(&self, m: Modifier) -> bool {
        match m {
            Modifier::Shift => self.shift,
            Modifier::Ctrl => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Meta => self.meta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub zoom_modifier: Modifier,
    pub pan_modifier: Modifier,
    pub initial_zoom: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            zoom_modifier: Modifier::Shift,
            pan_modifier: Modifier::Ctrl,
            initial_zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragOrigin {
    x: f64,
    width: f64,
}

/// Scrollable, zoomable timeline width.
///
/// `unit_length_px = round(container_width_px * zoom_factor)` holds after every
/// mutation; the zoom factor always stays within `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    config: ViewportConfig,
    container_width_px: f64,
    zoom_factor: f64,
    unit_length_px: f64,
    scroll_left_px: f64,
    drag: Option<DragOrigin>,
}

fn clamp_zoom(z: f64) -> f64 {
    if z.is_nan() {
        return MIN_ZOOM;
    }
    z.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            zoom_factor: clamp_zoom(config.initial_zoom),
            config,
            container_width_px: 0.0,
            unit_length_px: 0.0,
            scroll_left_px: 0.0,
            drag: None,
        }
    }

    pub fn container_width_px(&self) -> f64 {
        self.container_width_px
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    pub fn unit_length_px(&self) -> f64 {
        self.unit_length_px
    }

    pub fn scroll_left_px(&self) -> f64 {
        self.scroll_left_px
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn recompute(&mut self) {
        self.unit_length_px = (self.container_width_px * self.zoom_factor).round();
        self.scroll_left_px = self.scroll_left_px.clamp(0.0, self.max_scroll());
    }

    fn max_scroll(&self) -> f64 {
        (self.unit_length_px - self.container_width_px).max(0.0)
    }

    /// Container was measured again. Zoom is kept.
    pub fn resize(&mut self, container_width_px: f64) {
        self.container_width_px = if container_width_px.is_finite() {
            container_width_px.max(0.0)
        } else {
            0.0
        };
        self.recompute();
    }

    /// Set the zoom directly (e.g. from a slider); the value is clamped.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom_factor = clamp_zoom(zoom);
        self.recompute();
        self.zoom_factor
    }

    /// Pointer down. Starts a zoom gesture only when the zoom modifier is held.
    pub fn begin_drag(&mut self, x: f64, modifiers: Modifiers) -> bool {
        if !modifiers.held(self.config.zoom_modifier) {
            return false;
        }
        self.drag = Some(DragOrigin {
            x,
            width: self.unit_length_px,
        });
        true
    }

    /// Pointer move during a zoom gesture. Returns the new zoom factor.
    ///
    /// Dragging right by `DRAG_ZOOM_DIVISOR` pixels adds one origin width.
    pub fn drag_to(&mut self, x: f64) -> Option<f64> {
        let origin = self.drag?;
        if self.container_width_px <= 0.0 {
            return None;
        }
        let factor = 1.0 + (x - origin.x) / DRAG_ZOOM_DIVISOR;
        self.zoom_factor = clamp_zoom(origin.width / self.container_width_px * factor);
        self.recompute();
        Some(self.zoom_factor)
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Wheel event. Pans horizontally 1:1 only when the pan modifier is held;
    /// otherwise the event is left to normal page scrolling.
    pub fn wheel(&mut self, delta_px: f64, modifiers: Modifiers) -> bool {
        if !modifiers.held(self.config.pan_modifier) || !delta_px.is_finite() {
            return false;
        }
        self.scroll_left_px = (self.scroll_left_px + delta_px).clamp(0.0, self.max_scroll());
        true
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}
