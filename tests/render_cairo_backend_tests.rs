#![cfg(feature = "cairo-backend")]

use cairo::{Context, Format, ImageSurface};
use plotdeck::ChartError;
use plotdeck::api::{ChartEngine, ChartHost, ExportOptions};
use plotdeck::config::{ChartConfiguration, ChartType};
use plotdeck::core::DataRow;
use plotdeck::export::ExportFormat;
use plotdeck::render::{CairoRenderer, NullRenderer};

fn config() -> ChartConfiguration {
    ChartConfiguration::new(ChartType::Pie)
        .with_category_value("k", "v")
        .with_title("Mix")
        .with_size(400, 240)
}

fn rows() -> Vec<DataRow> {
    vec![
        DataRow::new().with("k", "a").with("v", 3.0),
        DataRow::new().with("k", "b").with("v", 1.0),
    ]
}

#[test]
fn cairo_renderer_rejects_invalid_surface_size() {
    let err = CairoRenderer::new(0, 480).expect_err("invalid width must fail");
    assert!(matches!(err, ChartError::InvalidData(_)));
}

#[test]
fn cairo_renderer_paints_every_primitive_of_a_chart() {
    let mut engine = ChartEngine::new(CairoRenderer::new(400, 240).expect("renderer"), config());
    engine.set_rows(rows());
    engine.render().expect("render");
    let counts = engine.snapshot().expect("snapshot").counts();
    let stats = engine.into_renderer().last_stats();
    assert_eq!(stats.paths_drawn, counts.paths);
    assert_eq!(stats.texts_drawn, counts.texts);
    assert!(stats.paths_drawn >= 2);
}

#[test]
fn cairo_renderer_can_draw_on_external_context() {
    let mut engine = ChartEngine::new(CairoRenderer::new(400, 240).expect("renderer"), config());
    engine.set_rows(rows());
    engine.render().expect("render");

    let surface = ImageSurface::create(Format::ARgb32, 400, 240).expect("surface");
    let context = Context::new(&surface).expect("context");
    engine.render_on_cairo_context(&context).expect("draw on external context");
}

#[test]
fn png_and_pdf_exports_carry_their_signatures() {
    let mut host = ChartHost::new(NullRenderer::default(), config());
    host.set_data(rows());
    assert_eq!(host.export_menu(), ExportFormat::ALL.to_vec());

    let png = host
        .export(
            ExportFormat::Png,
            &ExportOptions {
                width: Some(800),
                height: Some(480),
                background: Some("#ffffff".to_owned()),
            },
        )
        .expect("png export");
    assert_eq!(&png.bytes[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(png.filename, "Mix.png");

    let pdf = host
        .export(ExportFormat::Pdf, &ExportOptions::default())
        .expect("pdf export");
    assert!(pdf.bytes.starts_with(b"%PDF"));
}
