use approx::assert_abs_diff_eq;
use plotdeck::api::render;
use plotdeck::config::{AxisConfig, ChartConfiguration, ChartType, SeriesConfig};
use plotdeck::core::DataRow;
use plotdeck::layout::{FamilyGeometry, WaterfallGeometry, WaterfallKind};

fn waterfall(rows: &[DataRow]) -> WaterfallGeometry {
    let config = ChartConfiguration::new(ChartType::Waterfall)
        .with_x_axis(AxisConfig::new("cat"))
        .with_series(SeriesConfig::new("delta"));
    match render(&config, rows).into_layout().expect("waterfall renders").geometry {
        FamilyGeometry::Waterfall(geometry) => geometry,
        other => panic!("unexpected geometry {other:?}"),
    }
}

#[test]
fn start_loss_gain_scenario() {
    let geometry = waterfall(&[
        DataRow::new().with("cat", "start").with("delta", 100.0),
        DataRow::new().with("cat", "loss").with("delta", -30.0),
        DataRow::new().with("cat", "gain").with("delta", 10.0),
    ]);
    let spans: Vec<(f64, f64)> = geometry.bars.iter().map(|bar| bar.span()).collect();
    assert_eq!(spans, vec![(0.0, 100.0), (70.0, 100.0), (70.0, 80.0)]);
    assert_abs_diff_eq!(geometry.final_total, 80.0);

    let kinds: Vec<WaterfallKind> = geometry.bars.iter().map(|bar| bar.kind).collect();
    assert_eq!(
        kinds,
        vec![WaterfallKind::Increase, WaterfallKind::Decrease, WaterfallKind::Total]
    );
}

#[test]
fn bars_chain_through_partial_sums() {
    let deltas = [12.5, -3.0, 0.0, 7.25, -20.0, 4.0];
    let rows: Vec<DataRow> = deltas
        .iter()
        .enumerate()
        .map(|(i, delta)| DataRow::new().with("cat", format!("c{i}")).with("delta", *delta))
        .collect();
    let geometry = waterfall(&rows);

    let mut partial = 0.0;
    for (bar, delta) in geometry.bars.iter().zip(deltas) {
        assert_abs_diff_eq!(bar.start, partial);
        partial += delta;
        assert_abs_diff_eq!(bar.end, partial);
    }
    assert_abs_diff_eq!(geometry.final_total, deltas.iter().sum::<f64>());
}

#[test]
fn bar_heights_follow_the_value_scale() {
    let geometry = waterfall(&[
        DataRow::new().with("cat", "a").with("delta", 50.0),
        DataRow::new().with("cat", "b").with("delta", "bad"),
        DataRow::new().with("cat", "c").with("delta", -25.0),
    ]);
    let scale = &geometry.value_scale;
    for bar in &geometry.bars {
        let (low, high) = bar.span();
        assert_abs_diff_eq!(bar.bounds.height, scale.map(low) - scale.map(high), epsilon = 1e-9);
    }
    assert_abs_diff_eq!(geometry.bars[1].delta, 0.0);
    assert_abs_diff_eq!(geometry.final_total, 25.0);
}
