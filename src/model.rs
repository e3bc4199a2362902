use serde::{Deserialize, Serialize};

/// Unix milliseconds. The only time type.
pub type Ms = i64;

/// Identifier of a laned entity (assignment, project) as handed out by the REST layer.
pub type EntityId = i64;

/// Interval `[start, end)`. Zero-length spans are valid point intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start <= end, "Span start must not be after end");
        Self { start, end }
    }

    /// Length of the span, saturating at the `Ms` bounds.
    pub fn duration_ms(&self) -> Ms {
        self.end.saturating_sub(self.start)
    }

    /// Length of the span, or `None` when it does not fit in `Ms`.
    pub fn checked_duration_ms(&self) -> Option<Ms> {
        self.end.checked_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The overlapping window of two spans, if they share any time.
    pub fn intersection(&self, other: &Span) -> Option<Span> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then(|| Span::new(start, end))
    }
}

/// A validated absolute-time interval ready for lane allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub id: EntityId,
    pub label: String,
    pub span: Span,
}

/// A validated interval expressed as a fraction of a reference range.
///
/// `start_ratio + span` may exceed 1 because of upstream rounding; only
/// [`RatioInterval::render_end`] clamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioInterval {
    pub id: EntityId,
    pub label: String,
    pub start_ratio: f64,
    pub span: f64,
}

impl RatioInterval {
    pub fn end_ratio(&self) -> f64 {
        self.start_ratio + self.span
    }

    /// End ratio clamped to the reference range, for drawing.
    pub fn render_end(&self) -> f64 {
        self.end_ratio().min(1.0)
    }
}

// ── Raw input records ───────────────────────────────────────────

/// Absolute-time layout input: `{id, name, start, end}` with date-time strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub id: EntityId,
    pub name: String,
    pub start: String,
    pub end: String,
}

/// Ratio layout input, already normalized by the layout service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRecord {
    pub id: EntityId,
    pub name: String,
    pub start_point_ratio: f64,
    #[serde(alias = "project_ratio")]
    pub ratio: f64,
}

// ── Layout output types ─────────────────────────────────────────

/// One visual row. Items are ordered by start and never overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lane<T> {
    pub items: Vec<T>,
}

/// Pixel geometry of a single bar inside its lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub offset_px: f64,
    pub width_px: f64,
}

/// A time-axis tick mark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position_px: f64,
    pub label: String,
}
