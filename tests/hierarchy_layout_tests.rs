use std::f64::consts::TAU;

use approx::assert_abs_diff_eq;
use plotdeck::api::render;
use plotdeck::config::{ChartConfiguration, ChartType, TreemapTiling};
use plotdeck::core::DataRow;
use plotdeck::layout::FamilyGeometry;

fn region_rows() -> Vec<DataRow> {
    [
        ("north", 40.0),
        ("south", 25.0),
        ("east", 20.0),
        ("west", 10.0),
        ("north", 5.0),
        ("islands", 0.1),
    ]
    .into_iter()
    .map(|(region, sales)| DataRow::new().with("region", region).with("sales", sales))
    .collect()
}

fn config(chart_type: ChartType) -> ChartConfiguration {
    ChartConfiguration::new(chart_type).with_category_value("region", "sales")
}

#[test]
fn treemap_leaves_tile_the_container() {
    for tiling in [TreemapTiling::Squarify, TreemapTiling::SliceDice] {
        let mut config = config(ChartType::Treemap);
        config.tiling = tiling;
        config.padding = Some(0.0);
        let FamilyGeometry::Treemap(geometry) =
            render(&config, &region_rows()).into_layout().expect("treemap").geometry
        else {
            panic!("treemap geometry expected");
        };

        assert_eq!(geometry.tiles.len(), 5);
        assert_eq!(geometry.tiles[0].name, "north");
        assert_abs_diff_eq!(geometry.tiles[0].value, 45.0);
        let covered: f64 = geometry.tiles.iter().map(|tile| tile.bounds.area()).sum();
        assert!((covered - geometry.container.area()).abs() <= geometry.tiles.len() as f64);
        for tile in &geometry.tiles {
            assert!(geometry.container.contains(tile.bounds, 1e-6), "{tiling:?} {}", tile.name);
        }
    }
}

#[test]
fn treemap_padding_shrinks_tiles_inside_their_cells() {
    let mut config = config(ChartType::Treemap);
    config.padding = Some(6.0);
    let FamilyGeometry::Treemap(geometry) =
        render(&config, &region_rows()).into_layout().expect("treemap").geometry
    else {
        panic!("treemap geometry expected");
    };
    for tile in &geometry.tiles {
        assert!(tile.cell.contains(tile.bounds, 1e-9));
        assert!(tile.bounds.area() < tile.cell.area());
    }
    let tiny = geometry.tiles.iter().find(|tile| tile.name == "islands").expect("islands");
    assert!(!tiny.labeled);
}

#[test]
fn sunburst_sweeps_sum_to_a_full_turn() {
    let FamilyGeometry::Sunburst(geometry) =
        render(&config(ChartType::Sunburst), &region_rows()).into_layout().expect("sunburst").geometry
    else {
        panic!("sunburst geometry expected");
    };
    let sweep: f64 = geometry.arcs.iter().map(|arc| arc.sweep()).sum();
    assert_abs_diff_eq!(sweep, TAU, epsilon = 1e-9);
    assert_abs_diff_eq!(geometry.total, 100.1, epsilon = 1e-9);
    assert_abs_diff_eq!(geometry.inner_radius, geometry.outer_radius * 0.3, epsilon = 1e-9);
    for pair in geometry.arcs.windows(2) {
        assert_abs_diff_eq!(pair[0].end_angle, pair[1].start_angle, epsilon = 1e-12);
    }
}

#[test]
fn pie_fractions_sum_to_one_and_skip_non_positive_slices() {
    let mut rows = region_rows();
    rows.push(DataRow::new().with("region", "refunds").with("sales", -4.0));
    rows.push(DataRow::new().with("region", "unknown").with("sales", "?"));
    let FamilyGeometry::Pie(geometry) =
        render(&config(ChartType::Pie), &rows).into_layout().expect("pie").geometry
    else {
        panic!("pie geometry expected");
    };
    assert!(geometry.slices.iter().all(|slice| slice.value > 0.0));
    assert_eq!(geometry.slices.len(), 5);
    let fraction: f64 = geometry.slices.iter().map(|slice| slice.fraction).sum();
    assert_abs_diff_eq!(fraction, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(geometry.inner_radius, 0.0);
}

#[test]
fn donut_uses_configured_inner_radius() {
    let mut config = config(ChartType::Pie);
    config.inner_radius = Some(40.0);
    let FamilyGeometry::Pie(geometry) =
        render(&config, &region_rows()).into_layout().expect("pie").geometry
    else {
        panic!("pie geometry expected");
    };
    assert_abs_diff_eq!(geometry.inner_radius, 40.0);
}
