use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Continuous mapping from a numeric domain onto a pixel range.
///
/// The range may be inverted (`range_start > range_end`), which is how value
/// axes grow upwards in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64) -> ChartResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(ChartError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
            range_start: 0.0,
            range_end: 1.0,
        })
    }

    /// Builds a scale over a data extent, widening degenerate extents.
    ///
    /// An empty or single-valued extent becomes `[v - 1, v + 1]` (or `[0, 1]`
    /// when nothing finite was observed) so every layout gets a usable axis.
    /// Large magnitudes widen relative to `v` so the span stays non-zero.
    #[must_use]
    pub fn from_extent(min: f64, max: f64) -> Self {
        let (start, end) = match (min.is_finite(), max.is_finite()) {
            (true, true) if min < max && (max - min).is_finite() => (min, max),
            (true, true) if min < max => (min.max(-f64::MAX / 2.0), max.min(f64::MAX / 2.0)),
            (true, _) => widen(min),
            (false, true) => widen(max),
            (false, false) => (0.0, 1.0),
        };
        Self {
            domain_start: start,
            domain_end: end,
            range_start: 0.0,
            range_end: 1.0,
        }
    }

    pub fn with_range(mut self, range_start: f64, range_end: f64) -> ChartResult<Self> {
        if !range_start.is_finite() || !range_end.is_finite() {
            return Err(ChartError::InvalidData(
                "scale range must be finite".to_owned(),
            ));
        }
        self.range_start = range_start;
        self.range_end = range_end;
        Ok(self)
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    #[must_use]
    pub fn map(self, value: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        let normalized = (value - self.domain_start) / span;
        self.range_start + normalized * (self.range_end - self.range_start)
    }

    /// Like `map`, but clamps the result into the range.
    #[must_use]
    pub fn map_clamped(self, value: f64) -> f64 {
        let low = self.range_start.min(self.range_end);
        let high = self.range_start.max(self.range_end);
        self.map(value).clamp(low, high)
    }

    /// Normalized position of `value` inside the domain, clamped to `[0, 1]`.
    #[must_use]
    pub fn normalize(self, value: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        ((value - self.domain_start) / span).clamp(0.0, 1.0)
    }

    pub fn invert(self, pixel: f64) -> ChartResult<f64> {
        if !pixel.is_finite() {
            return Err(ChartError::InvalidData("pixel must be finite".to_owned()));
        }
        let range_span = self.range_end - self.range_start;
        if range_span == 0.0 {
            return Err(ChartError::InvalidData(
                "cannot invert a zero-width range".to_owned(),
            ));
        }
        let normalized = (pixel - self.range_start) / range_span;
        Ok(self.domain_start + normalized * (self.domain_end - self.domain_start))
    }

    /// Extends the domain outwards to round tick boundaries.
    #[must_use]
    pub fn nice(mut self, count: usize) -> Self {
        let ascending = self.domain_start <= self.domain_end;
        let (mut start, mut end) = if ascending {
            (self.domain_start, self.domain_end)
        } else {
            (self.domain_end, self.domain_start)
        };
        for _ in 0..2 {
            let step = tick_step(start, end, count);
            if step <= 0.0 || !step.is_finite() {
                break;
            }
            start = (start / step).floor() * step;
            end = (end / step).ceil() * step;
        }
        if ascending {
            self.domain_start = start;
            self.domain_end = end;
        } else {
            self.domain_start = end;
            self.domain_end = start;
        }
        self
    }

    /// Round tick values inside the domain, approximately `count` of them.
    #[must_use]
    pub fn ticks(self, count: usize) -> Vec<f64> {
        ticks(self.domain_start, self.domain_end, count)
    }
}

fn widen(value: f64) -> (f64, f64) {
    let pad = 1f64.max(value.abs() * 1e-6);
    (value - pad, value + pad)
}

/// Tick step of 1, 2 or 5 times a power of ten covering `[start, end]` in about `count` steps.
#[must_use]
pub fn tick_step(start: f64, end: f64, count: usize) -> f64 {
    let count = count.max(1) as f64;
    let raw = (end - start).abs() / count;
    if raw <= 0.0 || !raw.is_finite() {
        return 0.0;
    }
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

#[must_use]
pub fn ticks(start: f64, end: f64, count: usize) -> Vec<f64> {
    let (low, high) = if start <= end { (start, end) } else { (end, start) };
    let step = tick_step(low, high, count);
    if step <= 0.0 {
        return if low.is_finite() { vec![low] } else { Vec::new() };
    }
    let first = (low / step).ceil() as i64;
    let last = (high / step).floor() as i64;
    (first..=last)
        .map(|index| {
            let value = index as f64 * step;
            // Snap float noise like 0.30000000000000004 back onto the step grid.
            (value / step).round() * step
        })
        .collect()
}

/// Categorical mapping onto evenly sized bands with padding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandScale {
    domain: Vec<String>,
    range_start: f64,
    range_end: f64,
    padding_inner: f64,
    padding_outer: f64,
}

impl BandScale {
    #[must_use]
    pub fn new(domain: Vec<String>, range_start: f64, range_end: f64) -> Self {
        Self {
            domain,
            range_start,
            range_end,
            padding_inner: 0.1,
            padding_outer: 0.1,
        }
    }

    #[must_use]
    pub fn with_padding(mut self, padding_inner: f64, padding_outer: f64) -> Self {
        self.padding_inner = padding_inner.clamp(0.0, 0.95);
        self.padding_outer = padding_outer.max(0.0);
        self
    }

    #[must_use]
    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    fn step(&self) -> f64 {
        let count = self.domain.len() as f64;
        let span = self.range_end - self.range_start;
        span / (count - self.padding_inner + 2.0 * self.padding_outer).max(1.0)
    }

    /// Width of one band.
    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        (self.step() * (1.0 - self.padding_inner)).abs()
    }

    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.domain.iter().position(|candidate| candidate == key)
    }

    /// Leading edge of the band at `index`.
    #[must_use]
    pub fn position_at(&self, index: usize) -> f64 {
        let step = self.step();
        let start = self.range_start + step * self.padding_outer;
        let edge = start + step * index as f64;
        if step < 0.0 { edge - self.bandwidth() } else { edge }
    }

    #[must_use]
    pub fn position(&self, key: &str) -> Option<f64> {
        self.index_of(key).map(|index| self.position_at(index))
    }

    #[must_use]
    pub fn center(&self, key: &str) -> Option<f64> {
        self.position(key).map(|edge| edge + self.bandwidth() / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{BandScale, LinearScale, ticks};
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_scale_maps_and_inverts_inverted_ranges() {
        let scale = LinearScale::new(0.0, 100.0)
            .expect("scale")
            .with_range(400.0, 0.0)
            .expect("range");
        assert_abs_diff_eq!(scale.map(25.0), 300.0);
        assert_abs_diff_eq!(scale.invert(300.0).expect("invert"), 25.0);
    }

    #[test]
    fn nice_extends_to_round_bounds() {
        let scale = LinearScale::new(0.37, 97.2).expect("scale").nice(5);
        assert_eq!(scale.domain(), (0.0, 100.0));
    }

    #[test]
    fn ticks_use_one_two_five_steps() {
        assert_eq!(ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        let fractional = ticks(0.0, 1.0, 4);
        assert_eq!(fractional.len(), 6);
        for (index, value) in fractional.iter().enumerate() {
            assert_abs_diff_eq!(*value, index as f64 * 0.2, epsilon = 1e-12);
        }
    }

    #[test]
    fn degenerate_extent_is_widened() {
        assert_eq!(LinearScale::from_extent(5.0, 5.0).domain(), (4.0, 6.0));
        let (low, high) = LinearScale::from_extent(1e300, 1e300).domain();
        assert!(low < 1e300 && high > 1e300);
        assert_eq!(
            LinearScale::from_extent(f64::INFINITY, f64::NEG_INFINITY).domain(),
            (0.0, 1.0)
        );
    }

    #[test]
    fn band_scale_spaces_categories_evenly() {
        let scale = BandScale::new(vec!["a".into(), "b".into()], 0.0, 100.0).with_padding(0.0, 0.0);
        assert_abs_diff_eq!(scale.bandwidth(), 50.0);
        assert_abs_diff_eq!(scale.position("b").expect("b"), 50.0);
        assert_abs_diff_eq!(scale.center("a").expect("a"), 25.0);
        assert!(scale.position("c").is_none());
    }
}
