use cairo::{Context, Format, ImageSurface, PdfSurface};
use pango::FontDescription;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::{ChartError, ChartResult};
use crate::render::{
    CirclePrimitive, Color, Fill, LinePrimitive, LineStrokeStyle, PathCommand, PathPrimitive,
    Primitive, RectPrimitive, RenderFrame, Renderer, TextHAlign, TextPrimitive,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoRenderStats {
    pub lines_drawn: usize,
    pub rects_drawn: usize,
    pub circles_drawn: usize,
    pub paths_drawn: usize,
    pub texts_drawn: usize,
}

/// Optional extension trait for renderers that can draw into an external Cairo
/// context (for example a toolkit drawing callback).
pub trait CairoContextRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> ChartResult<()>;
}

/// Cairo + Pango + PangoCairo renderer backend.
///
/// This renderer supports two modes:
/// - offscreen image-surface rendering through `Renderer::render`
/// - in-place rendering on an external Cairo context through
///   `CairoContextRenderer`
#[derive(Debug)]
pub struct CairoRenderer {
    surface: ImageSurface,
    clear_color: Color,
    last_stats: CairoRenderStats,
}

impl CairoRenderer {
    pub fn new(width: i32, height: i32) -> ChartResult<Self> {
        Ok(Self {
            surface: create_image_surface(width, height)?,
            clear_color: Color::rgb(1.0, 1.0, 1.0),
            last_stats: CairoRenderStats::default(),
        })
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        "cairo+pango+pangocairo"
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    #[must_use]
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) -> ChartResult<()> {
        color.validate()?;
        self.clear_color = color;
        Ok(())
    }

    #[must_use]
    pub fn last_stats(&self) -> CairoRenderStats {
        self.last_stats
    }

    /// Encodes the current surface content as PNG.
    pub fn to_png(&self) -> ChartResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.surface
            .write_to_png(&mut bytes)
            .map_err(|err| ChartError::Backend(format!("failed to encode png: {err}")))?;
        Ok(bytes)
    }

    fn render_with_context(&mut self, context: &Context, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        self.clear_color.validate()?;
        self.last_stats = paint_frame(context, frame, Some(self.clear_color))?;
        Ok(())
    }
}

impl Renderer for CairoRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        let context = Context::new(&self.surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        self.render_with_context(&context, frame)
    }
}

impl CairoContextRenderer for CairoRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> ChartResult<()> {
        self.render_with_context(context, frame)
    }
}

/// Rasterizes `frame` at `width`x`height` pixels and encodes it as PNG.
///
/// The frame is scaled to fit, so a snapshot can be exported at any size.
pub fn render_png_bytes(
    frame: &RenderFrame,
    width: u32,
    height: u32,
    background: Option<Color>,
) -> ChartResult<Vec<u8>> {
    frame.validate()?;
    let surface = create_image_surface(to_cairo_size(width)?, to_cairo_size(height)?)?;
    {
        let context = Context::new(&surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        scale_to(&context, frame, width, height);
        paint_frame(&context, frame, background.or(frame.background))?;
    }
    surface.flush();
    let mut bytes = Vec::new();
    surface
        .write_to_png(&mut bytes)
        .map_err(|err| ChartError::Backend(format!("failed to encode png: {err}")))?;
    Ok(bytes)
}

/// Renders `frame` as a single-page vector PDF of `width`x`height` points.
pub fn render_pdf_bytes(
    frame: &RenderFrame,
    width: u32,
    height: u32,
    background: Option<Color>,
) -> ChartResult<Vec<u8>> {
    frame.validate()?;
    let surface = PdfSurface::for_stream(f64::from(width), f64::from(height), Vec::<u8>::new())
        .map_err(|err| map_backend_error("failed to create pdf surface", err))?;
    {
        let context = Context::new(&surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        scale_to(&context, frame, width, height);
        paint_frame(&context, frame, background.or(frame.background))?;
        context
            .show_page()
            .map_err(|err| map_backend_error("failed to emit pdf page", err))?;
    }
    let stream = surface
        .finish_output_stream()
        .map_err(|err| map_backend_error("failed to finish pdf stream", err.error))?;
    stream
        .downcast::<Vec<u8>>()
        .map(|bytes| *bytes)
        .map_err(|_| ChartError::Backend("pdf stream has unexpected type".to_owned()))
}

/// Paints every layer of `frame` on `context`, optionally clearing first.
pub fn paint_frame(
    context: &Context,
    frame: &RenderFrame,
    clear: Option<Color>,
) -> ChartResult<CairoRenderStats> {
    if let Some(color) = clear {
        apply_color(context, color);
        context
            .paint()
            .map_err(|err| map_backend_error("failed to clear surface", err))?;
    }

    let mut stats = CairoRenderStats::default();
    for primitive in frame.iter() {
        match primitive {
            Primitive::Line(line) => {
                draw_line(context, line)?;
                stats.lines_drawn += 1;
            }
            Primitive::Rect(rect) => {
                draw_rect(context, frame, rect)?;
                stats.rects_drawn += 1;
            }
            Primitive::Circle(circle) => {
                draw_circle(context, circle)?;
                stats.circles_drawn += 1;
            }
            Primitive::Path(path) => {
                draw_path(context, path)?;
                stats.paths_drawn += 1;
            }
            Primitive::Text(text) => {
                draw_text(context, text)?;
                stats.texts_drawn += 1;
            }
        }
    }
    Ok(stats)
}

fn create_image_surface(width: i32, height: i32) -> ChartResult<ImageSurface> {
    if width <= 0 || height <= 0 {
        return Err(ChartError::InvalidData(
            "cairo surface size must be > 0".to_owned(),
        ));
    }
    ImageSurface::create(Format::ARgb32, width, height)
        .map_err(|err| map_backend_error("failed to create cairo surface", err))
}

fn to_cairo_size(value: u32) -> ChartResult<i32> {
    i32::try_from(value)
        .map_err(|_| ChartError::InvalidData(format!("surface size {value} is too large")))
}

fn scale_to(context: &Context, frame: &RenderFrame, width: u32, height: u32) {
    let sx = f64::from(width) / f64::from(frame.viewport.width.max(1));
    let sy = f64::from(height) / f64::from(frame.viewport.height.max(1));
    context.scale(sx, sy);
}

fn draw_line(context: &Context, line: &LinePrimitive) -> ChartResult<()> {
    apply_color(context, line.color);
    context.set_line_width(line.stroke_width);
    match line.stroke_style {
        LineStrokeStyle::Solid => context.set_dash(&[], 0.0),
        LineStrokeStyle::Dashed => context.set_dash(&[6.0, 4.0], 0.0),
        LineStrokeStyle::Dotted => context.set_dash(&[2.0, 3.0], 0.0),
    }
    context.move_to(line.x1, line.y1);
    context.line_to(line.x2, line.y2);
    let result = context
        .stroke()
        .map_err(|err| map_backend_error("failed to stroke line", err));
    context.set_dash(&[], 0.0);
    result
}

fn draw_rect(context: &Context, frame: &RenderFrame, rect: &RectPrimitive) -> ChartResult<()> {
    append_rect_path(context, rect);
    match &rect.fill {
        Fill::Solid(color) => apply_color(context, *color),
        Fill::Gradient(id) => {
            let Some(gradient) = frame.gradients.iter().find(|gradient| &gradient.id == id) else {
                return Err(ChartError::InvalidData(format!(
                    "rect references unknown gradient `{id}`"
                )));
            };
            let pattern =
                cairo::LinearGradient::new(gradient.x1, gradient.y1, gradient.x2, gradient.y2);
            for stop in &gradient.stops {
                pattern.add_color_stop_rgba(
                    stop.offset,
                    stop.color.red,
                    stop.color.green,
                    stop.color.blue,
                    stop.color.alpha,
                );
            }
            context
                .set_source(&pattern)
                .map_err(|err| map_backend_error("failed to set gradient source", err))?;
        }
    }
    if rect.border_width > 0.0 {
        context
            .fill_preserve()
            .map_err(|err| map_backend_error("failed to fill rectangle", err))?;
        apply_color(context, rect.border_color);
        context.set_line_width(rect.border_width);
        context
            .stroke()
            .map_err(|err| map_backend_error("failed to stroke rectangle border", err))
    } else {
        context
            .fill()
            .map_err(|err| map_backend_error("failed to fill rectangle", err))
    }
}

fn draw_circle(context: &Context, circle: &CirclePrimitive) -> ChartResult<()> {
    context.new_path();
    context.arc(circle.cx, circle.cy, circle.radius, 0.0, 2.0 * PI);
    apply_color(context, circle.fill_color);
    if circle.stroke_width > 0.0 {
        context
            .fill_preserve()
            .map_err(|err| map_backend_error("failed to fill circle", err))?;
        apply_color(context, circle.stroke_color);
        context.set_line_width(circle.stroke_width);
        context
            .stroke()
            .map_err(|err| map_backend_error("failed to stroke circle", err))
    } else {
        context
            .fill()
            .map_err(|err| map_backend_error("failed to fill circle", err))
    }
}

fn draw_path(context: &Context, path: &PathPrimitive) -> ChartResult<()> {
    context.new_path();
    for command in &path.commands {
        match *command {
            PathCommand::MoveTo { x, y } => context.move_to(x, y),
            PathCommand::LineTo { x, y } => context.line_to(x, y),
            PathCommand::CubicTo {
                c1x,
                c1y,
                c2x,
                c2y,
                x,
                y,
            } => context.curve_to(c1x, c1y, c2x, c2y, x, y),
            PathCommand::Arc {
                cx,
                cy,
                radius,
                start_angle,
                end_angle,
            } => {
                if end_angle >= start_angle {
                    context.arc(cx, cy, radius, start_angle, end_angle);
                } else {
                    context.arc_negative(cx, cy, radius, start_angle, end_angle);
                }
            }
            PathCommand::Close => context.close_path(),
        }
    }

    match (path.fill_color, path.stroke_color) {
        (Some(fill), Some(stroke)) => {
            apply_color(context, fill);
            context
                .fill_preserve()
                .map_err(|err| map_backend_error("failed to fill path", err))?;
            apply_color(context, stroke);
            context.set_line_width(path.stroke_width);
            context
                .stroke()
                .map_err(|err| map_backend_error("failed to stroke path", err))
        }
        (Some(fill), None) => {
            apply_color(context, fill);
            context
                .fill()
                .map_err(|err| map_backend_error("failed to fill path", err))
        }
        (None, Some(stroke)) => {
            apply_color(context, stroke);
            context.set_line_width(path.stroke_width);
            context
                .stroke()
                .map_err(|err| map_backend_error("failed to stroke path", err))
        }
        (None, None) => {
            context.new_path();
            Ok(())
        }
    }
}

fn draw_text(context: &Context, text: &TextPrimitive) -> ChartResult<()> {
    let layout = pangocairo::functions::create_layout(context);
    let mut font_description = FontDescription::from_string(&format!("Sans {}", text.font_size_px));
    font_description.set_absolute_size(text.font_size_px * f64::from(pango::SCALE));
    if text.bold {
        font_description.set_weight(pango::Weight::Bold);
    }
    layout.set_font_description(Some(&font_description));
    layout.set_text(&text.text);

    let (text_width, _text_height) = layout.pixel_size();
    let offset_x = match text.h_align {
        TextHAlign::Left => 0.0,
        TextHAlign::Center => -f64::from(text_width) / 2.0,
        TextHAlign::Right => -f64::from(text_width),
    };
    let baseline = f64::from(layout.baseline()) / f64::from(pango::SCALE);

    context
        .save()
        .map_err(|err| map_backend_error("failed to save context", err))?;
    context.translate(text.x, text.y);
    if text.rotation_deg != 0.0 {
        context.rotate(text.rotation_deg.to_radians());
    }
    apply_color(context, text.color);
    context.move_to(offset_x, -baseline);
    pangocairo::functions::show_layout(context, &layout);
    context
        .restore()
        .map_err(|err| map_backend_error("failed to restore context", err))
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn append_rect_path(context: &Context, rect: &RectPrimitive) {
    context.new_path();
    if rect.corner_radius <= 0.0 {
        context.rectangle(rect.x, rect.y, rect.width, rect.height);
        return;
    }

    let radius = rect
        .corner_radius
        .min(rect.width * 0.5)
        .min(rect.height * 0.5);
    let left = rect.x;
    let top = rect.y;
    let right = rect.x + rect.width;
    let bottom = rect.y + rect.height;

    context.new_sub_path();
    context.arc(right - radius, top + radius, radius, -FRAC_PI_2, 0.0);
    context.arc(right - radius, bottom - radius, radius, 0.0, FRAC_PI_2);
    context.arc(left + radius, bottom - radius, radius, FRAC_PI_2, PI);
    context.arc(left + radius, top + radius, radius, PI, PI + FRAC_PI_2);
    context.close_path();
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> ChartError {
    ChartError::Backend(format!("{prefix}: {err}"))
}
