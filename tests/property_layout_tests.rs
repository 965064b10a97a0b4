use chrono::{TimeZone, Utc};
use plotdeck::api::{RenderOutcome, render_with};
use plotdeck::config::{AxisConfig, ChartConfiguration, ChartType, LayoutTuning, SeriesConfig};
use plotdeck::core::{BoxStatistics, Bounds, DataRow, slice_dice, squarify};
use plotdeck::layout::{FamilyGeometry, LayoutContext};
use proptest::prelude::*;

const ALL_TAGS: [&str; 17] = [
    "BAR", "COLUMN", "LINE", "AREA", "PIE", "SCATTER", "TABLE", "HEATMAP", "TREEMAP",
    "WATERFALL", "BOX_PLOT", "SANKEY", "SUNBURST", "GANTT", "MAP_CHOROPLETH", "MAP_POINT",
    "MAP_HEAT",
];

fn complete(tag: &str) -> ChartConfiguration {
    ChartConfiguration::new(ChartType::parse(tag))
        .with_x_axis(AxisConfig::new("cat"))
        .with_y_axis(AxisConfig::new("to"))
        .with_series(SeriesConfig::new("v"))
        .with_category_value("cat", "v")
}

/// Rows carrying `value` in every numeric slot a family may read.
fn measured_rows(values: &[f64]) -> Vec<DataRow> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            DataRow::new()
                .with("cat", format!("c{}", i % 4))
                .with("to", format!("t{}", i % 3))
                .with("v", *value)
                .with("lat", 10.0 + i as f64)
                .with("lng", 20.0 + i as f64)
                .with("start", "2024-01-01")
                .with("duration", *value)
                .with("progress", *value)
        })
        .collect()
}

fn context() -> LayoutContext {
    LayoutContext::new(
        Utc.with_ymd_and_hms(2023, 11, 20, 0, 0, 0)
            .single()
            .expect("valid timestamp"),
    )
}

proptest! {
    #[test]
    fn box_statistics_are_ordered_and_outliers_lie_outside_fences(
        values in prop::collection::vec(-1_000.0f64..1_000.0, 1..200)
    ) {
        let stats = BoxStatistics::from_values(&values).expect("finite input");
        prop_assert!(stats.q1 <= stats.median && stats.median <= stats.q3);
        prop_assert!(stats.whisker_low >= stats.lower_fence);
        prop_assert!(stats.whisker_high <= stats.upper_fence);
        for outlier in &stats.outliers {
            prop_assert!(*outlier < stats.lower_fence || *outlier > stats.upper_fence);
        }
        let inside = values
            .iter()
            .filter(|value| **value >= stats.lower_fence && **value <= stats.upper_fence)
            .count();
        prop_assert_eq!(inside + stats.outliers.len(), values.len());
    }

    #[test]
    fn waterfall_final_total_is_the_sum_of_deltas(
        deltas in prop::collection::vec(-500i32..500, 1..40)
    ) {
        let rows: Vec<DataRow> = deltas
            .iter()
            .enumerate()
            .map(|(i, delta)| DataRow::new().with("c", format!("c{i}")).with("d", *delta))
            .collect();
        let config = ChartConfiguration::new(ChartType::Waterfall)
            .with_x_axis(AxisConfig::new("c"))
            .with_series(SeriesConfig::new("d"));
        let layout = render_with(&config, &rows, &context()).into_layout().expect("renders");
        let FamilyGeometry::Waterfall(geometry) = layout.geometry else {
            panic!("waterfall geometry expected");
        };
        let sum: i64 = deltas.iter().map(|delta| i64::from(*delta)).sum();
        prop_assert_eq!(geometry.final_total, sum as f64);
        let mut partial = 0_i64;
        for (bar, delta) in geometry.bars.iter().zip(&deltas) {
            prop_assert_eq!(bar.start, partial as f64);
            partial += i64::from(*delta);
            prop_assert_eq!(bar.end, partial as f64);
        }
    }

    #[test]
    fn tiling_stays_inside_and_covers_the_container(
        weights in prop::collection::vec(0.01f64..1_000.0, 1..60),
        width in 50.0f64..2_000.0,
        height in 50.0f64..2_000.0
    ) {
        let mut weights = weights;
        weights.sort_by(|a, b| b.total_cmp(a));
        let container = Bounds::new(10.0, 20.0, width, height);
        for tiles in [squarify(&weights, container), slice_dice(&weights, container)] {
            prop_assert_eq!(tiles.len(), weights.len());
            let covered: f64 = tiles.iter().map(|tile| tile.area()).sum();
            prop_assert!((covered - container.area()).abs() <= tiles.len() as f64);
            for tile in &tiles {
                prop_assert!(container.contains(*tile, 1e-6));
            }
        }
    }

    #[test]
    fn sankey_links_never_drop_below_the_floor(
        values in prop::collection::vec(0.0f64..1e6, 1..30)
    ) {
        let rows: Vec<DataRow> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                DataRow::new()
                    .with("s", format!("s{}", i % 5))
                    .with("t", format!("t{}", i % 3))
                    .with("v", *value)
            })
            .collect();
        let config = ChartConfiguration::new(ChartType::Sankey)
            .with_x_axis(AxisConfig::new("s"))
            .with_y_axis(AxisConfig::new("t"))
            .with_series(SeriesConfig::new("v"));
        let layout = render_with(&config, &rows, &context()).into_layout().expect("renders");
        let FamilyGeometry::Sankey(geometry) = layout.geometry else {
            panic!("sankey geometry expected");
        };
        let floor = LayoutTuning::default().sankey_min_link_width;
        for link in &geometry.links {
            prop_assert!(link.width >= floor);
        }
    }

    #[test]
    fn gantt_fallback_depends_only_on_row_index(count in 1usize..20) {
        let rows: Vec<DataRow> = (0..count)
            .map(|i| DataRow::new().with("task", format!("t{i}")))
            .collect();
        let config = ChartConfiguration::new(ChartType::Gantt).with_x_axis(AxisConfig::new("task"));
        let first = render_with(&config, &rows, &context());
        let second = render_with(&config, &rows, &context());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn empty_rows_are_never_a_config_error(tag in prop::sample::select(vec![
        "BAR", "PIE", "HEATMAP", "TREEMAP", "WATERFALL", "BOX_PLOT", "SANKEY", "GANTT", "MAP_POINT",
    ])) {
        let config = ChartConfiguration::new(ChartType::parse(tag));
        prop_assert_eq!(render_with(&config, &[], &context()), RenderOutcome::EmptyData);
    }

    #[test]
    fn arbitrary_measures_render_finite_frames_for_every_type(
        tag in prop::sample::select(ALL_TAGS.to_vec()),
        values in prop::collection::vec(any::<f64>(), 1..12)
    ) {
        let config = complete(tag);
        let outcome = render_with(&config, &measured_rows(&values), &context());
        let layout = match outcome {
            RenderOutcome::Rendered(layout) => layout,
            other => panic!("{tag} did not render: {other:?}"),
        };
        prop_assert!(layout.frame.validate().is_ok(), "{} produced a non-finite frame", tag);
    }

    #[test]
    fn extreme_magnitudes_render_finite_frames(
        tag in prop::sample::select(vec!["BOX_PLOT", "WATERFALL", "COLUMN", "HEATMAP", "GANTT"]),
        magnitude in prop::sample::select(vec![1e308, -1e308, 1e100, -1e99, 5e-324, f64::MAX]),
        count in 1usize..6
    ) {
        let values = vec![magnitude; count];
        let outcome = render_with(&complete(tag), &measured_rows(&values), &context());
        let layout = match outcome {
            RenderOutcome::Rendered(layout) => layout,
            other => panic!("{tag} did not render: {other:?}"),
        };
        prop_assert!(layout.frame.validate().is_ok(), "{} produced a non-finite frame", tag);
    }

    #[test]
    fn timestamp_categories_stay_distinct(
        minutes in prop::collection::btree_set(0i64..1_440, 1..20)
    ) {
        let day = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single().expect("day");
        let rows: Vec<DataRow> = minutes
            .iter()
            .map(|minute| {
                DataRow::new()
                    .with("cat", day + chrono::Duration::minutes(*minute))
                    .with("v", 1.0)
            })
            .collect();
        let layout = render_with(&complete("COLUMN"), &rows, &context())
            .into_layout()
            .expect("renders");
        let FamilyGeometry::Cartesian(geometry) = layout.geometry else {
            panic!("cartesian geometry expected");
        };
        prop_assert_eq!(geometry.categories.len(), minutes.len());
    }
}
