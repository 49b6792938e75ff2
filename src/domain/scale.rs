// Scale domain model - data-to-pixel and category-to-color mappings
use super::error::ChartError;
use super::series::Dataset;
use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;

/// ColorBrewer Set2.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

const VALUE_PADDING_RATIO: f64 = 0.10;
const CONSTANT_VALUE_SPAN: f64 = 1.0;
const CONSTANT_VALUE_RATIO: f64 = 0.01;
const VALUE_TICK_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: (DateTime<Utc>, DateTime<Utc>),
    range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (DateTime<Utc>, DateTime<Utc>), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn map(&self, ts: DateTime<Utc>) -> f64 {
        let (d0, d1) = self.domain;
        let span = (d1 - d0).num_milliseconds();
        if span == 0 {
            return (self.range.0 + self.range.1) / 2.0;
        }
        let t = (ts - d0).num_milliseconds() as f64 / span as f64;
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    /// Calendar-aligned ticks whose count is close to `count`.
    pub fn ticks(&self, count: usize) -> Vec<DateTime<Utc>> {
        let (d0, d1) = self.domain;
        if d1 <= d0 {
            return vec![d0];
        }
        TickInterval::closest(d1 - d0, count.max(1)).ticks(d0, d1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickInterval {
    Days(u64),
    Months(u32),
    Years,
}

impl TickInterval {
    const LADDER: [TickInterval; 8] = [
        TickInterval::Days(1),
        TickInterval::Days(2),
        TickInterval::Days(7),
        TickInterval::Days(14),
        TickInterval::Months(1),
        TickInterval::Months(3),
        TickInterval::Months(6),
        TickInterval::Years,
    ];

    fn approx_days(self) -> f64 {
        match self {
            TickInterval::Days(n) => n as f64,
            TickInterval::Months(n) => 30.0 * n as f64,
            TickInterval::Years => 365.0,
        }
    }

    fn closest(span: Duration, count: usize) -> Self {
        let span_days = span.num_milliseconds() as f64 / 86_400_000.0;
        let mut best = Self::LADDER[0];
        let mut best_err = f64::INFINITY;
        for interval in Self::LADDER {
            let err = (span_days / interval.approx_days() - count as f64).abs();
            if err < best_err {
                best = interval;
                best_err = err;
            }
        }
        best
    }

    fn ticks(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut ticks = Vec::new();
        let mut date = start.date_naive();

        match self {
            TickInterval::Days(n) => {
                if midnight(date) < start {
                    date = match date.checked_add_days(Days::new(1)) {
                        Some(next) => next,
                        None => return ticks,
                    };
                }
                while midnight(date) <= end {
                    ticks.push(midnight(date));
                    date = match date.checked_add_days(Days::new(n)) {
                        Some(next) => next,
                        None => break,
                    };
                }
            }
            TickInterval::Months(n) => {
                let Some(mut month) = date.with_day(1) else {
                    return ticks;
                };
                while midnight(month) < start || month.month0() % n != 0 {
                    month = match month.checked_add_months(Months::new(1)) {
                        Some(next) => next,
                        None => return ticks,
                    };
                }
                while midnight(month) <= end {
                    ticks.push(midnight(month));
                    month = match month.checked_add_months(Months::new(n)) {
                        Some(next) => next,
                        None => break,
                    };
                }
            }
            TickInterval::Years => {
                let mut year = date.year();
                loop {
                    let Some(jan1) = NaiveDate::from_ymd_opt(year, 1, 1) else {
                        break;
                    };
                    if midnight(jan1) > end {
                        break;
                    }
                    if midnight(jan1) >= start {
                        ticks.push(midnight(jan1));
                    }
                    year += 1;
                }
            }
        }

        ticks
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl ValueScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let t = (value - d0) / (d1 - d0);
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    /// Round-numbered ticks (1, 2 or 5 times a power of ten) inside the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        let step0 = (d1 - d0) / count.max(1) as f64;
        if !(step0 > 0.0) {
            return vec![d0];
        }

        let power = 10f64.powf(step0.log10().floor());
        let error = step0 / power;
        let factor = if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };
        let step = factor * power;

        // Divide by the inverse step for fractional steps so 0.1 * 3 prints as 0.3.
        let (first, last) = ((d0 / step).ceil() as i64, (d1 / step).floor() as i64);
        (first..=last)
            .map(|i| {
                if step < 1.0 {
                    i as f64 / (1.0 / step).round()
                } else {
                    i as f64 * step
                }
            })
            .collect()
    }
}

/// Fixed category-to-color assignment over the full category universe.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    index: HashMap<String, usize>,
    palette: Vec<String>,
}

impl ColorScale {
    pub fn new(categories: &[String], palette: &[String]) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
        } else {
            palette.to_vec()
        };
        let index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { index, palette }
    }

    /// Colors cycle once the palette runs out.
    pub fn color(&self, category: &str) -> Option<&str> {
        self.index
            .get(category)
            .map(|i| self.palette[i % self.palette.len()].as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSet {
    pub time: TimeScale,
    pub value: ValueScale,
    pub color: ColorScale,
}

impl ScaleSet {
    pub fn value_ticks(&self) -> Vec<f64> {
        self.value.ticks(VALUE_TICK_COUNT)
    }
}

pub struct ScaleBuilder;

impl ScaleBuilder {
    /// Derive every scale from the complete dataset. The plot area spans
    /// `[0, width]` horizontally and `[height, 0]` vertically.
    pub fn build(
        dataset: &Dataset,
        width: f64,
        height: f64,
        palette: &[String],
    ) -> Result<ScaleSet, ChartError> {
        let mut points = dataset.iter().flat_map(|s| s.points.iter());
        let first = points.next().ok_or(ChartError::EmptyDataset)?;

        let (mut t_min, mut t_max) = (first.timestamp, first.timestamp);
        let (mut v_min, mut v_max) = (first.value, first.value);
        for p in points {
            t_min = t_min.min(p.timestamp);
            t_max = t_max.max(p.timestamp);
            v_min = v_min.min(p.value);
            v_max = v_max.max(p.value);
        }

        let value_domain = if v_max > v_min {
            let padding = (v_max - v_min) * VALUE_PADDING_RATIO;
            (v_min - padding, v_max + padding)
        } else {
            // a fixed span of 1 is lost to rounding once |v| passes 2^53
            let span = CONSTANT_VALUE_SPAN.max(v_min.abs() * CONSTANT_VALUE_RATIO);
            (v_min - span, v_max + span)
        };

        Ok(ScaleSet {
            time: TimeScale::new((t_min, t_max), (0.0, width)),
            value: ValueScale::new(value_domain, (height, 0.0)),
            color: ColorScale::new(dataset.categories(), palette),
        })
    }
}
