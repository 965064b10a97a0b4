use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::bindings::check_bindings;
use crate::config::ChartConfiguration;
use crate::core::DataRow;
use crate::layout::{LayoutContext, LayoutResult, compute_layout};

/// Empty-state text shown by hosts.
pub const NO_DATA_MESSAGE: &str = "No data available";

/// Result of one render call.
///
/// None of these are errors across the render boundary: every variant carries
/// enough to show an inline message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderOutcome {
    Rendered(Box<LayoutResult>),
    ConfigError(String),
    EmptyData,
    UnsupportedType(String),
}

impl RenderOutcome {
    /// Human-readable text that tells the four outcomes apart.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Rendered(layout) => format!("Rendered {} chart", layout.chart_type),
            Self::ConfigError(reason) => format!("Configuration error: {reason}"),
            Self::EmptyData => NO_DATA_MESSAGE.to_owned(),
            Self::UnsupportedType(tag) => format!("Unsupported chart type: {tag}"),
        }
    }

    #[must_use]
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    #[must_use]
    pub fn layout(&self) -> Option<&LayoutResult> {
        match self {
            Self::Rendered(layout) => Some(layout),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_layout(self) -> Option<LayoutResult> {
        match self {
            Self::Rendered(layout) => Some(*layout),
            _ => None,
        }
    }
}

/// Renders with the current clock and default tuning.
#[must_use]
pub fn render(config: &ChartConfiguration, rows: &[DataRow]) -> RenderOutcome {
    render_with(config, rows, &LayoutContext::default())
}

/// Guards in order: empty data, unsupported type, missing bindings; then layout.
///
/// Empty data is reported before a binding problem so "no data yet" and
/// "misconfigured" stay distinguishable.
#[must_use]
pub fn render_with(
    config: &ChartConfiguration,
    rows: &[DataRow],
    context: &LayoutContext,
) -> RenderOutcome {
    if rows.is_empty() {
        debug!(chart_type = %config.chart_type, "render skipped: no rows");
        return RenderOutcome::EmptyData;
    }
    let Some(family) = config.chart_type.family() else {
        warn!(chart_type = %config.chart_type, "unsupported chart type");
        return RenderOutcome::UnsupportedType(config.chart_type.tag().to_owned());
    };
    if let Err(reason) = check_bindings(family, config, rows) {
        warn!(%reason, "chart configuration is missing bindings");
        return RenderOutcome::ConfigError(reason);
    }
    match compute_layout(config, rows, context) {
        Ok(layout) => {
            info!(
                chart_type = %config.chart_type,
                rows = rows.len(),
                primitives = layout.frame.counts().total(),
                "chart rendered"
            );
            RenderOutcome::Rendered(Box::new(layout))
        }
        Err(err) => {
            warn!(error = %err, "layout rejected configuration");
            RenderOutcome::ConfigError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderOutcome, render};
    use crate::config::{AxisConfig, ChartConfiguration, ChartType, SeriesConfig};
    use crate::core::DataRow;

    #[test]
    fn empty_data_wins_over_missing_bindings() {
        let config = ChartConfiguration::new(ChartType::Bar);
        assert_eq!(render(&config, &[]), RenderOutcome::EmptyData);
    }

    #[test]
    fn unsupported_wins_over_missing_bindings() {
        let config = ChartConfiguration::new(ChartType::parse("RADAR"));
        let rows = vec![DataRow::new().with("a", 1.0)];
        assert_eq!(
            render(&config, &rows),
            RenderOutcome::UnsupportedType("RADAR".to_owned())
        );
    }

    #[test]
    fn incomplete_configuration_is_a_config_error() {
        let config = ChartConfiguration::new(ChartType::Column).with_x_axis(AxisConfig::new("m"));
        let rows = vec![DataRow::new().with("m", "jan").with("v", 1.0)];
        let outcome = render(&config, &rows);
        assert!(matches!(outcome, RenderOutcome::ConfigError(_)));
        assert!(outcome.message().starts_with("Configuration error"));

        let config = config.with_series(SeriesConfig::new("v"));
        assert!(render(&config, &rows).is_rendered());
    }
}
