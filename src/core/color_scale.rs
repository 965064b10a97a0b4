use serde::{Deserialize, Serialize};

use crate::core::LinearScale;
use crate::render::Color;

/// Continuous color ramp flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorScaleKind {
    /// Single-hue light-to-dark ramp.
    #[default]
    Sequential,
    /// Two-hue ramp through a neutral midpoint of `[min, max]`.
    Diverging,
}

const SEQUENTIAL_LOW: Color = Color::rgb(0.937, 0.953, 1.0);
const SEQUENTIAL_HIGH: Color = Color::rgb(0.031, 0.188, 0.420);
const DIVERGING_LOW: Color = Color::rgb(0.843, 0.188, 0.153);
const DIVERGING_MID: Color = Color::rgb(0.969, 0.969, 0.969);
const DIVERGING_HIGH: Color = Color::rgb(0.271, 0.459, 0.706);

/// Maps numeric values in `[min, max]` to colors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    kind: ColorScaleKind,
    domain: LinearScale,
    min: f64,
    max: f64,
}

impl ColorScale {
    #[must_use]
    pub fn new(kind: ColorScaleKind, min: f64, max: f64) -> Self {
        Self {
            kind,
            domain: LinearScale::from_extent(min, max),
            min,
            max,
        }
    }

    #[must_use]
    pub fn kind(self) -> ColorScaleKind {
        self.kind
    }

    /// Observed `[min, max]` the scale was built from.
    #[must_use]
    pub fn extent(self) -> (f64, f64) {
        (self.min, self.max)
    }

    #[must_use]
    pub fn color(self, value: f64) -> Color {
        let t = if value.is_finite() {
            self.domain.normalize(value)
        } else {
            0.0
        };
        self.color_at(t)
    }

    /// Color at normalized position `t` in `[0, 1]`.
    #[must_use]
    pub fn color_at(self, t: f64) -> Color {
        match self.kind {
            ColorScaleKind::Sequential => SEQUENTIAL_LOW.lerp(SEQUENTIAL_HIGH, t),
            ColorScaleKind::Diverging => {
                if t < 0.5 {
                    DIVERGING_LOW.lerp(DIVERGING_MID, t * 2.0)
                } else {
                    DIVERGING_MID.lerp(DIVERGING_HIGH, (t - 0.5) * 2.0)
                }
            }
        }
    }

    /// Gradient stops approximating the ramp, for legends.
    #[must_use]
    pub fn stops(self) -> Vec<(f64, Color)> {
        let offsets: &[f64] = match self.kind {
            ColorScaleKind::Sequential => &[0.0, 0.5, 1.0],
            ColorScaleKind::Diverging => &[0.0, 0.25, 0.5, 0.75, 1.0],
        };
        offsets
            .iter()
            .map(|offset| (*offset, self.color_at(*offset)))
            .collect()
    }
}

/// Five buckets of the density ramp: blue, cyan, green, yellow, red.
pub const HEAT_BUCKETS: [Color; 5] = [
    Color::rgb(0.0, 0.0, 1.0),
    Color::rgb(0.0, 1.0, 1.0),
    Color::rgb(0.0, 0.8, 0.0),
    Color::rgb(1.0, 1.0, 0.0),
    Color::rgb(1.0, 0.0, 0.0),
];

/// Bucketed heat color for an intensity already normalized to `[0, 1]`.
#[must_use]
pub fn heat_color(intensity: f64) -> Color {
    let intensity = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let bucket = ((intensity * HEAT_BUCKETS.len() as f64) as usize).min(HEAT_BUCKETS.len() - 1);
    HEAT_BUCKETS[bucket]
}
