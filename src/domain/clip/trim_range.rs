//! Trim range value object

use crate::domain::error::InvalidTrimRange;

/// Validated `[start, end)` offsets in seconds within a clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    start: f64,
    end: f64,
}

impl TrimRange {
    /// Validate `0 <= start < end <= duration`; non-finite values are rejected
    pub fn new(start: f64, end: f64, duration: f64) -> Result<Self, InvalidTrimRange> {
        let valid = start.is_finite()
            && end.is_finite()
            && duration.is_finite()
            && start >= 0.0
            && start < end
            && end <= duration;

        if !valid {
            return Err(InvalidTrimRange {
                start,
                end,
                duration,
            });
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Requested length in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_inner_range() {
        let range = TrimRange::new(3.0, 7.0, 10.0).unwrap();
        assert_eq!(range.start(), 3.0);
        assert_eq!(range.end(), 7.0);
        assert_eq!(range.length(), 4.0);
    }

    #[test]
    fn accepts_full_clip() {
        assert!(TrimRange::new(0.0, 10.0, 10.0).is_ok());
    }

    #[test]
    fn rejects_empty_or_reversed() {
        assert!(TrimRange::new(5.0, 5.0, 10.0).is_err());
        assert!(TrimRange::new(7.0, 3.0, 10.0).is_err());
    }

    #[test]
    fn rejects_out_of_bounds() {
        assert!(TrimRange::new(-1.0, 3.0, 10.0).is_err());
        assert!(TrimRange::new(3.0, 10.5, 10.0).is_err());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(TrimRange::new(f64::NAN, 3.0, 10.0).is_err());
        assert!(TrimRange::new(0.0, f64::INFINITY, 10.0).is_err());
        assert!(TrimRange::new(0.0, 3.0, f64::NAN).is_err());
    }

    #[test]
    fn error_reports_values() {
        let err = TrimRange::new(8.0, 4.0, 10.0).unwrap_err();
        assert_eq!(err.start, 8.0);
        assert_eq!(err.end, 4.0);
        assert_eq!(err.duration, 10.0);
    }
}
