mod frame;
mod layer_stack;
mod null_renderer;
mod primitives;
mod surface;
mod svg;

pub use frame::{LayerPrimitives, PrimitiveCounts, RenderFrame};
pub use layer_stack::CanvasLayerKind;
pub use null_renderer::NullRenderer;
pub use primitives::{
    CirclePrimitive, Color, Fill, GradientStop, LinePrimitive, LineStrokeStyle, LinearGradient,
    PathCommand, PathPrimitive, Primitive, RectPrimitive, TextHAlign, TextPrimitive,
};
pub use surface::DrawingSurface;
pub use svg::{SvgDocumentOptions, SvgRenderer, escape_xml, render_svg_document};

use crate::error::ChartResult;

/// Contract implemented by any rendering backend.
///
/// Backends receive a fully materialized, deterministic `RenderFrame` so
/// drawing code remains isolated from chart layout logic.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()>;
}

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::{
    CairoContextRenderer, CairoRenderStats, CairoRenderer, paint_frame, render_pdf_bytes,
    render_png_bytes,
};
