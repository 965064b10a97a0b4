//! Color palettes and CSS color parsing.
//!
//! Palette cycling is a plain function of `(index, palette)`; there is no
//! shared cursor, so two charts can never disturb each other's colors.

use indexmap::IndexMap;

use crate::render::Color;

/// Default categorical palette used when a configuration supplies none.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#ec4899", "#84cc16",
    "#f97316", "#6366f1",
];

const FALLBACK_COLOR: Color = Color::rgb(0.4, 0.4, 0.4);

/// Color for series/category `index`, cycling through `colors`.
///
/// Falls back to `DEFAULT_PALETTE` when `colors` is absent or empty, and to
/// the default entry at the same index when a configured color does not parse.
#[must_use]
pub fn palette_color(index: usize, colors: Option<&[String]>) -> Color {
    if let Some(colors) = colors.filter(|colors| !colors.is_empty()) {
        if let Some(color) = parse_css_color(&colors[index % colors.len()]) {
            return color;
        }
    }
    parse_css_color(DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()]).unwrap_or(FALLBACK_COLOR)
}

/// Stable category -> palette color mapping.
///
/// Keys get palette slots in first-seen order, so the same category keeps its
/// color across the legend and every mark of one chart.
#[derive(Debug, Clone, Default)]
pub struct OrdinalScale {
    slots: IndexMap<String, usize>,
    colors: Option<Vec<String>>,
}

impl OrdinalScale {
    #[must_use]
    pub fn new(colors: Option<&[String]>) -> Self {
        Self {
            slots: IndexMap::new(),
            colors: colors.map(<[String]>::to_vec),
        }
    }

    /// Pre-registers `keys` in order.
    #[must_use]
    pub fn with_domain<'a>(mut self, keys: impl IntoIterator<Item = &'a str>) -> Self {
        for key in keys {
            self.slot(key);
        }
        self
    }

    fn slot(&mut self, key: &str) -> usize {
        let next = self.slots.len();
        *self.slots.entry(key.to_owned()).or_insert(next)
    }

    pub fn color(&mut self, key: &str) -> Color {
        let slot = self.slot(key);
        palette_color(slot, self.colors.as_deref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` and a few named colors.
#[must_use]
pub fn parse_css_color(input: &str) -> Option<Color> {
    let text = input.trim().to_ascii_lowercase();
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(body) = text
        .strip_prefix("rgba(")
        .or_else(|| text.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_function(body);
    }
    named_color(&text)
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |slice: &str| u8::from_str_radix(slice, 16).ok();
    match hex.len() {
        3 => {
            let mut expanded = String::with_capacity(6);
            for ch in hex.chars() {
                expanded.push(ch);
                expanded.push(ch);
            }
            parse_hex(&expanded)
        }
        6 => Some(Color::from_rgb8(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        8 => Some(
            Color::from_rgb8(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )
            .with_alpha(f64::from(channel(&hex[6..8])?) / 255.0),
        ),
        _ => None,
    }
}

fn parse_rgb_function(body: &str) -> Option<Color> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |part: &str| -> Option<f64> {
        let value: f64 = part.parse().ok()?;
        (0.0..=255.0).contains(&value).then_some(value / 255.0)
    };
    let alpha = match parts.get(3) {
        Some(part) => {
            let value: f64 = part.parse().ok()?;
            (0.0..=1.0).contains(&value).then_some(value)?
        }
        None => 1.0,
    };
    Some(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

fn named_color(name: &str) -> Option<Color> {
    let hex = match name {
        "black" => "000000",
        "white" => "ffffff",
        "red" => "ff0000",
        "green" => "008000",
        "blue" => "0000ff",
        "yellow" => "ffff00",
        "cyan" => "00ffff",
        "magenta" => "ff00ff",
        "orange" => "ffa500",
        "gray" | "grey" => "808080",
        "transparent" => return Some(Color::rgba(0.0, 0.0, 0.0, 0.0)),
        _ => return None,
    };
    parse_hex(hex)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PALETTE, OrdinalScale, palette_color, parse_css_color};

    #[test]
    fn palette_cycles_without_state() {
        let colors = vec!["#ff0000".to_owned(), "#00ff00".to_owned()];
        assert_eq!(
            palette_color(2, Some(colors.as_slice())),
            palette_color(0, Some(colors.as_slice()))
        );
        assert_eq!(palette_color(1, Some(colors.as_slice())).to_hex(), "#00ff00");
        assert_eq!(
            palette_color(DEFAULT_PALETTE.len(), None),
            palette_color(0, None)
        );
    }

    #[test]
    fn parses_common_css_forms() {
        assert_eq!(parse_css_color("#abc").expect("short").to_hex(), "#aabbcc");
        assert_eq!(
            parse_css_color("rgb(255, 0, 0)").expect("rgb").to_hex(),
            "#ff0000"
        );
        let translucent = parse_css_color("rgba(0,0,255,0.5)").expect("rgba");
        assert!((translucent.alpha - 0.5).abs() < 1e-12);
        assert!(parse_css_color("not-a-color").is_none());
    }

    #[test]
    fn ordinal_scale_keeps_first_seen_slots() {
        let mut scale = OrdinalScale::new(None).with_domain(["b", "a"]);
        let a = scale.color("a");
        assert_eq!(a, palette_color(1, None));
        assert_eq!(scale.color("c"), palette_color(2, None));
        assert_eq!(scale.color("a"), a);
        assert_eq!(scale.len(), 3);
    }
}
