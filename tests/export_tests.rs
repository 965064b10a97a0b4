use std::time::Duration;

use plotdeck::api::{ChartEngine, ChartHost, ExportOptions, HostState};
use plotdeck::config::{ChartConfiguration, ChartType};
use plotdeck::core::DataRow;
use plotdeck::error::ExportError;
use plotdeck::export::{ExportFormat, ExportRequest};
use plotdeck::render::{NullRenderer, SvgRenderer};

fn config() -> ChartConfiguration {
    ChartConfiguration::new(ChartType::Treemap)
        .with_category_value("team", "hours")
        .with_title("Hours by team")
}

fn rows() -> Vec<DataRow> {
    vec![
        DataRow::new().with("team", "core").with("hours", 120.0),
        DataRow::new().with("team", "web").with("hours", 80.0),
        DataRow::new().with("team", "ops").with("hours", 40.0),
    ]
}

#[test]
fn export_reads_the_snapshot_without_repainting() {
    let mut engine = ChartEngine::new(SvgRenderer::default(), config());
    engine.set_rows(rows());
    engine.render().expect("render");
    let painted = engine.surface().renderer().document().map(str::to_owned);
    let generation = engine.surface().generation();

    let artifact = engine
        .export(
            &ExportRequest::new(ExportFormat::Svg, "hours.svg")
                .with_size(1600, 800)
                .with_background("#ffffff"),
        )
        .expect("svg export");
    assert_eq!(artifact.mime_type(), "image/svg+xml");
    assert!(String::from_utf8_lossy(&artifact.bytes).contains("width=\"1600\""));

    assert_eq!(engine.surface().generation(), generation);
    assert_eq!(engine.surface().renderer().document().map(str::to_owned), painted);
    assert!(painted.is_some());
}

#[test]
fn background_job_survives_a_repaint() {
    let mut engine = ChartEngine::new(NullRenderer::default(), config());
    engine.set_rows(rows());
    engine.render().expect("render");
    let job = engine
        .export_in_background(ExportRequest::new(ExportFormat::Svg, "hours.svg"))
        .expect("job");

    engine.set_rows(vec![DataRow::new().with("team", "solo").with("hours", 1.0)]);
    engine.render().expect("repaint");

    let artifact = job.wait_timeout(Duration::from_secs(30)).expect("artifact");
    let text = String::from_utf8(artifact.bytes).expect("utf8");
    assert!(text.contains("core"));
    assert!(!text.contains("solo"));
}

#[test]
fn nothing_rendered_cannot_be_exported() {
    let engine = ChartEngine::new(NullRenderer::default(), config());
    assert!(matches!(
        engine.export(&ExportRequest::new(ExportFormat::Svg, "x.svg")),
        Err(ExportError::NothingRendered)
    ));
    assert!(matches!(
        engine.export_in_background(ExportRequest::new(ExportFormat::Svg, "x.svg")),
        Err(ExportError::NothingRendered)
    ));
}

#[test]
fn host_export_menu_follows_state() {
    let mut host = ChartHost::new(NullRenderer::default(), config());
    assert_eq!(host.state(), &HostState::Loading);
    assert!(host.export_menu().is_empty());
    assert_eq!(host.title(), Some("Hours by team"));

    host.set_data(rows());
    assert_eq!(host.state(), &HostState::Chart);
    assert_eq!(host.export_menu(), ExportFormat::available());

    let artifact = host
        .export(ExportFormat::Svg, &ExportOptions::default())
        .expect("export");
    assert_eq!(artifact.filename, "Hours by team.svg");

    host.begin_loading();
    assert!(host.export(ExportFormat::Svg, &ExportOptions::default()).is_err());
    assert_eq!(host.state(), &HostState::Loading);
}

#[test]
fn failed_export_leaves_the_chart_showing() {
    let mut host = ChartHost::new(NullRenderer::default(), config());
    host.set_data(rows());
    let options = ExportOptions {
        background: Some("no-such-color".to_owned()),
        ..ExportOptions::default()
    };
    assert!(matches!(
        host.export(ExportFormat::Svg, &options),
        Err(ExportError::InvalidOptions(_))
    ));
    assert_eq!(host.state(), &HostState::Chart);
    assert!(host.engine().snapshot().is_some());
}

#[cfg(not(feature = "cairo-backend"))]
#[test]
fn raster_export_without_cairo_is_unsupported() {
    let mut host = ChartHost::new(NullRenderer::default(), config());
    host.set_data(rows());
    assert!(matches!(
        host.export(ExportFormat::Pdf, &ExportOptions::default()),
        Err(ExportError::UnsupportedFormat(_))
    ));
    assert_eq!(host.state(), &HostState::Chart);
}
