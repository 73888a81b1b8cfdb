//! Date arithmetic for timeline layouts.

use chrono::NaiveDate;

/// The date range covered by a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineSpan {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

/// Horizontal placement of a task bar as fractions of the span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Left edge in `[0, 1]` for dates inside the span.
    pub left: f64,
    /// Width in the same units; never negative.
    pub width: f64,
}

impl TimelineSpan {
    /// The span covering every `(start, end)` pair, or `None` if there are
    /// none.
    #[must_use]
    pub fn covering(ranges: impl IntoIterator<Item = (NaiveDate, NaiveDate)>) -> Option<Self> {
        ranges.into_iter().fold(None, |span, (start, end)| {
            let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
            Some(match span {
                None => Self { start: lo, end: hi },
                Some(s) => Self {
                    start: s.start.min(lo),
                    end: s.end.max(hi),
                },
            })
        })
    }

    /// Length in days, at least one.
    #[must_use]
    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }

    /// Fractional position of `date`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.total_days() as f64
    }

    /// Bar placement for a task.
    #[must_use]
    pub fn bar(&self, start: NaiveDate, end: NaiveDate) -> Bar {
        let left = self.position(start);
        Bar {
            left,
            width: (self.position(end) - left).max(0.0),
        }
    }
}
