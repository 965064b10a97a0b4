//! Required field bindings per chart family.

use crate::config::{ChartConfiguration, ChartFamily, GeoKind};
use crate::core::DataRow;
use crate::layout::geo::{LATITUDE_FIELDS, LONGITUDE_FIELDS, coordinate_fields, location_field};

/// Names of the required bindings `config` leaves unset for `family`.
///
/// Geo families resolve coordinates from the rows themselves, so they need
/// the data as well as the configuration.
#[must_use]
pub fn missing_bindings(
    family: ChartFamily,
    config: &ChartConfiguration,
    rows: &[DataRow],
) -> Vec<String> {
    let mut missing = Vec::new();
    let mut need = |present: bool, name: &str| {
        if !present {
            missing.push(name.to_owned());
        }
    };
    let has_series = config
        .series
        .iter()
        .any(|series| !series.field.trim().is_empty());

    match family {
        ChartFamily::Cartesian(_) => {
            need(config.x_field().is_some(), "xAxis.field");
            need(has_series, "series");
        }
        ChartFamily::Pie | ChartFamily::Treemap | ChartFamily::Sunburst => {
            need(config.category_field().is_some(), "categoryField");
            need(config.value_field().is_some(), "valueField");
        }
        ChartFamily::Table => {}
        ChartFamily::Heatmap => {
            need(config.x_field().is_some(), "xAxis.field");
            need(config.y_field().is_some(), "yAxis.field");
            need(config.primary_measure().is_some(), "series[0].field");
        }
        ChartFamily::Waterfall | ChartFamily::BoxPlot => {
            need(config.x_field().is_some(), "xAxis.field");
            need(config.primary_measure().is_some(), "series[0].field");
        }
        ChartFamily::Sankey => {
            need(config.x_field().is_some(), "xAxis.field");
            need(config.y_field().is_some(), "yAxis.field");
            need(config.primary_measure().is_some(), "series[0].field");
        }
        ChartFamily::Gantt => need(config.x_field().is_some(), "xAxis.field"),
        ChartFamily::Geo(GeoKind::Point | GeoKind::Heat) => {
            need(coordinate_fields(rows).is_some(), &coordinate_hint());
        }
        ChartFamily::Geo(GeoKind::Choropleth) => {
            need(
                location_field(config, rows).is_some() || coordinate_fields(rows).is_some(),
                "locationField",
            );
        }
    }
    missing
}

fn coordinate_hint() -> String {
    format!(
        "{} and {}",
        LATITUDE_FIELDS.join("|"),
        LONGITUDE_FIELDS.join("|")
    )
}

/// `Err` with a readable reason when any required binding is missing.
pub fn check_bindings(
    family: ChartFamily,
    config: &ChartConfiguration,
    rows: &[DataRow],
) -> Result<(), String> {
    let missing = missing_bindings(family, config, rows);
    if missing.is_empty() {
        return Ok(());
    }
    Err(format!(
        "{} chart requires {}",
        config.chart_type,
        missing.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::{check_bindings, missing_bindings};
    use crate::config::{
        AxisConfig, CartesianKind, ChartConfiguration, ChartFamily, ChartType, GeoKind,
        SeriesConfig,
    };
    use crate::core::DataRow;

    #[test]
    fn cartesian_needs_x_and_series() {
        let config = ChartConfiguration::new(ChartType::Line);
        let missing = missing_bindings(ChartFamily::Cartesian(CartesianKind::Line), &config, &[]);
        assert_eq!(missing, vec!["xAxis.field", "series"]);

        let config = config
            .with_x_axis(AxisConfig::new("month"))
            .with_series(SeriesConfig::new("sales"));
        assert!(check_bindings(ChartFamily::Cartesian(CartesianKind::Line), &config, &[]).is_ok());
    }

    #[test]
    fn sankey_also_needs_a_target() {
        let config = ChartConfiguration::new(ChartType::Sankey)
            .with_x_axis(AxisConfig::new("from"))
            .with_series(SeriesConfig::new("flow"));
        let reason = check_bindings(ChartFamily::Sankey, &config, &[]).expect_err("missing target");
        assert!(reason.contains("yAxis.field"));
    }

    #[test]
    fn table_never_needs_bindings() {
        let config = ChartConfiguration::new(ChartType::Table);
        assert!(missing_bindings(ChartFamily::Table, &config, &[]).is_empty());
    }

    #[test]
    fn geo_bindings_come_from_the_rows() {
        let config = ChartConfiguration::new(ChartType::MapPoint);
        let family = ChartFamily::Geo(GeoKind::Point);
        let without = vec![DataRow::new().with("city", "Lima")];
        assert!(check_bindings(family, &config, &without).is_err());
        let with = vec![DataRow::new().with("y", -12.0).with("lon", -77.0)];
        assert!(check_bindings(family, &config, &with).is_ok());

        let choropleth = ChartFamily::Geo(GeoKind::Choropleth);
        let regions = vec![DataRow::new().with("country", "PE").with("v", 1.0)];
        assert!(check_bindings(choropleth, &config, &regions).is_ok());
        assert!(check_bindings(choropleth, &config, &without).is_err());
    }
}
