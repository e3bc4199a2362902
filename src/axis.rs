use std::str::FromStr;

use chrono::{DateTime, Datelike, Months, TimeDelta, Utc};

use crate::limits::MAX_TICKS;
use crate::model::*;

/// Calendar unit of one axis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScale(pub String);

impl std::fmt::Display for UnknownScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown time scale: {:?}", self.0)
    }
}

impl std::error::Error for UnknownScale {}

impl FromStr for Scale {
    type Err = UnknownScale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" => Ok(Scale::Hour),
            "day" => Ok(Scale::Day),
            "week" => Ok(Scale::Week),
            "month" => Ok(Scale::Month),
            "quarter" => Ok(Scale::Quarter),
            _ => Err(UnknownScale(s.to_string())),
        }
    }
}

impl Scale {
    /// `origin` moved forward by `units` steps of this scale.
    ///
    /// Month and quarter steps use calendar months, clamping to the last day
    /// of shorter months.
    fn advance(self, origin: DateTime<Utc>, units: u32) -> Option<DateTime<Utc>> {
        let n = i64::from(units);
        match self {
            Scale::Hour => origin.checked_add_signed(TimeDelta::try_hours(n)?),
            Scale::Day => origin.checked_add_signed(TimeDelta::try_days(n)?),
            Scale::Week => origin.checked_add_signed(TimeDelta::try_weeks(n)?),
            Scale::Month => origin.checked_add_months(Months::new(units)),
            Scale::Quarter => origin.checked_add_months(Months::new(units.checked_mul(3)?)),
        }
    }

    fn label(self, t: DateTime<Utc>) -> String {
        match self {
            Scale::Quarter => format!("{} Q{}", t.year(), t.month0() / 3 + 1),
            Scale::Month => t.format("%Y-%m").to_string(),
            Scale::Week | Scale::Day => t.format("%Y-%m-%d").to_string(),
            Scale::Hour => t.format("%m-%d %H:00").to_string(),
        }
    }
}

/// One walk over the range with a fixed step of `step` units.
///
/// Each tick is computed from the origin rather than from the previous tick so
/// month-end clamping never accumulates.
fn tick_pass(
    origin: DateTime<Utc>,
    range: &Span,
    total_ms: Ms,
    scale: Scale,
    step: u32,
    width_px: f64,
) -> Vec<Tick> {
    let total = total_ms as f64;
    let mut ticks = Vec::new();
    let mut k: u32 = 0;
    while ticks.len() < MAX_TICKS {
        let Some(t) = k.checked_mul(step).and_then(|units| scale.advance(origin, units)) else {
            break;
        };
        let ms = t.timestamp_millis();
        if ms > range.end {
            break;
        }
        ticks.push(Tick {
            position_px: (ms - range.start) as f64 / total * width_px,
            label: scale.label(t),
        });
        k += 1;
    }
    ticks
}

/// Adaptively spaced ticks covering `range` (both ends inclusive) at `width_px`.
///
/// Starts with a step of one `scale` unit. When the first two ticks are closer
/// than `min_tick_px`, the step is multiplied by `ceil(min_tick_px / density)`
/// and the sequence is generated once more.
pub fn generate_ticks(range: &Span, scale: Scale, width_px: f64, min_tick_px: f64) -> Vec<Tick> {
    let Some(total_ms) = range.checked_duration_ms().filter(|&ms| ms > 0) else {
        return Vec::new();
    };
    let Some(origin) = DateTime::from_timestamp_millis(range.start) else {
        return Vec::new();
    };

    let ticks = tick_pass(origin, range, total_ms, scale, 1, width_px);
    let density = match ticks.as_slice() {
        [first, second, ..] => second.position_px - first.position_px,
        _ => return ticks,
    };
    if density >= min_tick_px {
        return ticks;
    }

    let multiplier = (min_tick_px / density.max(1.0)).ceil() as u32;
    tick_pass(origin, range, total_ms, scale, multiplier.max(1), width_px)
}
