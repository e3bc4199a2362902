use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::limits::*;
use crate::model::*;

use super::LayoutError;

/// Naive formats accepted after RFC 3339 fails; all are read as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a date-time string into Unix milliseconds.
///
/// Accepts RFC 3339, ISO 8601 without an offset (UTC assumed) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<Ms> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

fn checked_timestamp(id: EntityId, field: &'static str, raw: &str) -> Result<Ms, LayoutError> {
    let ms = parse_timestamp(raw).ok_or_else(|| LayoutError::InvalidTimestamp {
        id,
        field,
        value: raw.to_string(),
    })?;
    if !(MIN_VALID_TIMESTAMP_MS..=MAX_VALID_TIMESTAMP_MS).contains(&ms) {
        return Err(LayoutError::TimestampOutOfRange { id, field, value: ms });
    }
    Ok(ms)
}

impl TryFrom<&IntervalRecord> for Interval {
    type Error = LayoutError;

    fn try_from(rec: &IntervalRecord) -> Result<Self, Self::Error> {
        let start = checked_timestamp(rec.id, "start", &rec.start)?;
        let end = checked_timestamp(rec.id, "end", &rec.end)?;
        if end < start {
            return Err(LayoutError::EndBeforeStart { id: rec.id, start, end });
        }
        Ok(Interval {
            id: rec.id,
            label: rec.name.clone(),
            span: Span::new(start, end),
        })
    }
}

impl TryFrom<&RatioRecord> for RatioInterval {
    type Error = LayoutError;

    fn try_from(rec: &RatioRecord) -> Result<Self, Self::Error> {
        if !rec.start_point_ratio.is_finite() {
            return Err(LayoutError::NonFiniteRatio {
                id: rec.id,
                field: "start_point_ratio",
            });
        }
        if !rec.ratio.is_finite() {
            return Err(LayoutError::NonFiniteRatio { id: rec.id, field: "ratio" });
        }
        if rec.ratio < 0.0 {
            return Err(LayoutError::NegativeSpan { id: rec.id, span: rec.ratio });
        }
        Ok(RatioInterval {
            id: rec.id,
            label: rec.name.clone(),
            start_ratio: rec.start_point_ratio,
            span: rec.ratio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: EntityId, start: &str, end: &str) -> IntervalRecord {
        IntervalRecord {
            id,
            name: format!("r{id}"),
            start: start.into(),
            end: end.into(),
        }
    }

    #[test]
    fn parses_supported_formats() {
        let expected = 1_735_689_600_000; // 2025-01-01T00:00:00Z
        assert_eq!(parse_timestamp("2025-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T08:00:00+08:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01 00:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-01"), Some(expected));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("2025-13-01"), None);
    }

    #[test]
    fn interval_from_record() {
        let iv = Interval::try_from(&record(7, "2025-01-01", "2025-01-02")).unwrap();
        assert_eq!(iv.id, 7);
        assert_eq!(iv.span.duration_ms(), 86_400_000);
    }

    #[test]
    fn zero_length_interval_is_valid() {
        let iv = Interval::try_from(&record(1, "2025-01-01", "2025-01-01")).unwrap();
        assert!(iv.span.is_empty());
    }

    #[test]
    fn unparseable_start_is_reported() {
        let err = Interval::try_from(&record(9, "soon", "2025-01-01")).unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvalidTimestamp {
                id: 9,
                field: "start",
                value: "soon".into()
            }
        );
    }

    #[test]
    fn inverted_range_is_reported() {
        let err = Interval::try_from(&record(2, "2025-02-01", "2025-01-01")).unwrap_err();
        assert!(matches!(err, LayoutError::EndBeforeStart { id: 2, .. }));
    }

    #[test]
    fn pre_epoch_is_out_of_range() {
        let err = Interval::try_from(&record(4, "1960-01-01", "2025-01-01")).unwrap_err();
        assert!(matches!(err, LayoutError::TimestampOutOfRange { field: "start", .. }));
    }

    #[test]
    fn ratio_validation() {
        let ok = RatioRecord {
            id: 1,
            name: "a".into(),
            start_point_ratio: 0.9,
            ratio: 0.2,
        };
        assert!(RatioInterval::try_from(&ok).is_ok());

        let nan = RatioRecord { ratio: f64::NAN, ..ok.clone() };
        assert!(matches!(
            RatioInterval::try_from(&nan),
            Err(LayoutError::NonFiniteRatio { field: "ratio", .. })
        ));

        let negative = RatioRecord { ratio: -0.1, ..ok };
        assert!(matches!(
            RatioInterval::try_from(&negative),
            Err(LayoutError::NegativeSpan { .. })
        ));
    }
}
