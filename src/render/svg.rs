use std::f64::consts::{PI, TAU};

use tracing::trace;

use crate::error::ChartResult;
use crate::render::{
    CirclePrimitive, Color, Fill, LinePrimitive, LineStrokeStyle, LinearGradient, PathCommand,
    PathPrimitive, Primitive, RectPrimitive, RenderFrame, Renderer, TextHAlign, TextPrimitive,
};

const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";

/// Output overrides for one SVG document.
///
/// The viewBox always matches the frame viewport, so a different output
/// size scales the drawing instead of re-laying it out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SvgDocumentOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background: Option<Color>,
}

/// Serializes a frame into a standalone SVG document.
#[must_use]
pub fn render_svg_document(frame: &RenderFrame, options: &SvgDocumentOptions) -> String {
    let view_width = frame.viewport.width;
    let view_height = frame.viewport.height;
    let width = options.width.unwrap_or(view_width);
    let height = options.height.unwrap_or(view_height);

    let mut svg = String::with_capacity(4096);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {view_width} {view_height}\" font-family=\"{FONT_FAMILY}\">",
    ));

    if let Some(background) = options.background.or(frame.background) {
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" {}/>",
            paint_attr("fill", background)
        ));
    }

    if !frame.gradients.is_empty() {
        svg.push_str("<defs>");
        for gradient in &frame.gradients {
            push_gradient(&mut svg, gradient);
        }
        svg.push_str("</defs>");
    }

    for layer in &frame.layers {
        if layer.primitives.is_empty() {
            continue;
        }
        svg.push_str(&format!("<g class=\"layer-{:?}\">", layer.kind).to_lowercase());
        for primitive in &layer.primitives {
            match primitive {
                Primitive::Line(line) => push_line(&mut svg, line),
                Primitive::Rect(rect) => push_rect(&mut svg, rect),
                Primitive::Circle(circle) => push_circle(&mut svg, circle),
                Primitive::Path(path) => push_path(&mut svg, path),
                Primitive::Text(text) => push_text(&mut svg, text),
            }
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

/// Escapes markup characters and drops characters XML 1.0 cannot carry.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            '\u{FFFE}' | '\u{FFFF}' => {}
            ch if ch < '\u{20}' => {}
            ch => out.push(ch),
        }
    }
    out
}

fn paint_attr(name: &str, color: Color) -> String {
    if color.alpha < 1.0 {
        format!(
            "{name}=\"{}\" {name}-opacity=\"{:.3}\"",
            color.to_hex(),
            color.alpha
        )
    } else {
        format!("{name}=\"{}\"", color.to_hex())
    }
}

fn dash_attr(style: LineStrokeStyle) -> &'static str {
    match style {
        LineStrokeStyle::Solid => "",
        LineStrokeStyle::Dashed => " stroke-dasharray=\"6 4\"",
        LineStrokeStyle::Dotted => " stroke-dasharray=\"2 3\"",
    }
}

fn close_with_tooltip(svg: &mut String, element: &str, tooltip: Option<&str>) {
    match tooltip {
        Some(tooltip) => svg.push_str(&format!(
            "><title>{}</title></{element}>",
            escape_xml(tooltip)
        )),
        None => svg.push_str("/>"),
    }
}

fn push_gradient(svg: &mut String, gradient: &LinearGradient) {
    svg.push_str(&format!(
        "<linearGradient id=\"{}\" gradientUnits=\"userSpaceOnUse\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\">",
        escape_xml(&gradient.id),
        gradient.x1,
        gradient.y1,
        gradient.x2,
        gradient.y2
    ));
    for stop in &gradient.stops {
        svg.push_str(&format!(
            "<stop offset=\"{:.4}\" stop-color=\"{}\" stop-opacity=\"{:.3}\"/>",
            stop.offset,
            stop.color.to_hex(),
            stop.color.alpha
        ));
    }
    svg.push_str("</linearGradient>");
}

fn push_line(svg: &mut String, line: &LinePrimitive) {
    svg.push_str(&format!(
        "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" {} stroke-width=\"{:.2}\"{}/>",
        line.x1,
        line.y1,
        line.x2,
        line.y2,
        paint_attr("stroke", line.color),
        line.stroke_width,
        dash_attr(line.stroke_style)
    ));
}

fn push_rect(svg: &mut String, rect: &RectPrimitive) {
    let fill = match &rect.fill {
        Fill::Solid(color) => paint_attr("fill", *color),
        Fill::Gradient(id) => format!("fill=\"url(#{})\"", escape_xml(id)),
    };
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" {fill}",
        rect.x, rect.y, rect.width, rect.height
    ));
    if rect.corner_radius > 0.0 {
        svg.push_str(&format!(
            " rx=\"{0:.2}\" ry=\"{0:.2}\"",
            rect.corner_radius
        ));
    }
    if rect.border_width > 0.0 {
        svg.push_str(&format!(
            " {} stroke-width=\"{:.2}\"",
            paint_attr("stroke", rect.border_color),
            rect.border_width
        ));
    }
    close_with_tooltip(svg, "rect", rect.tooltip.as_deref());
}

fn push_circle(svg: &mut String, circle: &CirclePrimitive) {
    svg.push_str(&format!(
        "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" {}",
        circle.cx,
        circle.cy,
        circle.radius,
        paint_attr("fill", circle.fill_color)
    ));
    if circle.stroke_width > 0.0 {
        svg.push_str(&format!(
            " {} stroke-width=\"{:.2}\"",
            paint_attr("stroke", circle.stroke_color),
            circle.stroke_width
        ));
    }
    close_with_tooltip(svg, "circle", circle.tooltip.as_deref());
}

fn push_path(svg: &mut String, path: &PathPrimitive) {
    let fill = path
        .fill_color
        .map_or_else(|| "fill=\"none\"".to_owned(), |color| paint_attr("fill", color));
    svg.push_str(&format!(
        "<path d=\"{}\" {fill}",
        path_data(&path.commands)
    ));
    if let Some(stroke) = path.stroke_color {
        svg.push_str(&format!(
            " {} stroke-width=\"{:.2}\" stroke-linejoin=\"round\"",
            paint_attr("stroke", stroke),
            path.stroke_width
        ));
    }
    close_with_tooltip(svg, "path", path.tooltip.as_deref());
}

fn push_text(svg: &mut String, text: &TextPrimitive) {
    let anchor = match text.h_align {
        TextHAlign::Left => "start",
        TextHAlign::Center => "middle",
        TextHAlign::Right => "end",
    };
    svg.push_str(&format!(
        "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.1}\" text-anchor=\"{anchor}\" {}",
        text.x,
        text.y,
        text.font_size_px,
        paint_attr("fill", text.color)
    ));
    if text.bold {
        svg.push_str(" font-weight=\"bold\"");
    }
    if text.rotation_deg != 0.0 {
        svg.push_str(&format!(
            " transform=\"rotate({:.2} {:.2} {:.2})\"",
            text.rotation_deg, text.x, text.y
        ));
    }
    svg.push_str(&format!(">{}</text>", escape_xml(&text.text)));
}

/// SVG path data for a command list.
///
/// Arcs continue the current subpath with a straight segment to their start
/// point. Full circles are split in two because a single SVG arc cannot
/// end where it starts.
fn path_data(commands: &[PathCommand]) -> String {
    let mut data = String::new();
    let mut has_current_point = false;
    for command in commands {
        match *command {
            PathCommand::MoveTo { x, y } => {
                data.push_str(&format!("M{x:.2} {y:.2} "));
                has_current_point = true;
            }
            PathCommand::LineTo { x, y } => {
                data.push_str(&format!("L{x:.2} {y:.2} "));
                has_current_point = true;
            }
            PathCommand::CubicTo {
                c1x,
                c1y,
                c2x,
                c2y,
                x,
                y,
            } => {
                data.push_str(&format!(
                    "C{c1x:.2} {c1y:.2} {c2x:.2} {c2y:.2} {x:.2} {y:.2} "
                ));
                has_current_point = true;
            }
            PathCommand::Arc {
                cx,
                cy,
                radius,
                start_angle,
                end_angle,
            } => {
                let start = (cx + radius * start_angle.cos(), cy + radius * start_angle.sin());
                let verb = if has_current_point { 'L' } else { 'M' };
                data.push_str(&format!("{verb}{:.2} {:.2} ", start.0, start.1));
                let sweep = end_angle - start_angle;
                if sweep.abs() >= TAU - 1e-9 {
                    let half = start_angle + sweep / 2.0;
                    push_arc_segment(&mut data, cx, cy, radius, sweep / 2.0, half);
                    push_arc_segment(&mut data, cx, cy, radius, sweep / 2.0, end_angle);
                } else {
                    push_arc_segment(&mut data, cx, cy, radius, sweep, end_angle);
                }
                has_current_point = true;
            }
            PathCommand::Close => {
                data.push_str("Z ");
            }
        }
    }
    let trimmed_len = data.trim_end().len();
    data.truncate(trimmed_len);
    data
}

fn push_arc_segment(data: &mut String, cx: f64, cy: f64, radius: f64, sweep: f64, end: f64) {
    let large_arc = u8::from(sweep.abs() > PI);
    let sweep_flag = u8::from(sweep > 0.0);
    let end_x = cx + radius * end.cos();
    let end_y = cy + radius * end.sin();
    data.push_str(&format!(
        "A{radius:.2} {radius:.2} 0 {large_arc} {sweep_flag} {end_x:.2} {end_y:.2} "
    ));
}

/// Renderer that keeps the last frame as an SVG document.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    options: SvgDocumentOptions,
    document: Option<String>,
}

impl SvgRenderer {
    #[must_use]
    pub fn new(options: SvgDocumentOptions) -> Self {
        Self {
            options,
            document: None,
        }
    }

    #[must_use]
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn take_document(&mut self) -> Option<String> {
        self.document.take()
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        let document = render_svg_document(frame, &self.options);
        trace!(bytes = document.len(), "svg document rendered");
        self.document = Some(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SvgDocumentOptions, SvgRenderer, escape_xml, path_data, render_svg_document};
    use crate::core::Viewport;
    use crate::render::{
        CanvasLayerKind, Color, PathCommand, RectPrimitive, RenderFrame, Renderer, TextHAlign,
        TextPrimitive,
    };
    use std::f64::consts::{PI, TAU};

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn full_circle_arc_is_split_in_two() {
        let data = path_data(&[PathCommand::Arc {
            cx: 10.0,
            cy: 10.0,
            radius: 5.0,
            start_angle: 0.0,
            end_angle: TAU,
        }]);
        assert_eq!(data.matches('A').count(), 2);
        assert!(data.starts_with("M15.00 10.00"));
    }

    #[test]
    fn counterclockwise_arc_clears_sweep_flag() {
        let data = path_data(&[
            PathCommand::MoveTo { x: 0.0, y: 0.0 },
            PathCommand::Arc {
                cx: 0.0,
                cy: 0.0,
                radius: 5.0,
                start_angle: PI / 2.0,
                end_angle: 0.0,
            },
        ]);
        assert!(data.contains(" 0 0 0 "));
    }

    #[test]
    fn document_scales_through_view_box_and_keeps_tooltips() {
        let mut frame = RenderFrame::new(Viewport::new(200, 100));
        frame.push_rect(
            CanvasLayerKind::Series,
            RectPrimitive::new(1.0, 2.0, 3.0, 4.0, Color::rgb(1.0, 0.0, 0.0))
                .with_tooltip(Some("A: 3".to_owned())),
        );
        frame.push_text(
            CanvasLayerKind::Axis,
            TextPrimitive::new("x & y", 5.0, 5.0, 12.0, Color::rgb(0.0, 0.0, 0.0), TextHAlign::Center),
        );
        let svg = render_svg_document(
            &frame,
            &SvgDocumentOptions {
                width: Some(400),
                height: Some(200),
                background: None,
            },
        );
        assert!(svg.contains("width=\"400\" height=\"200\" viewBox=\"0 0 200 100\""));
        assert!(svg.contains("<title>A: 3</title>"));
        assert!(svg.contains(">x &amp; y</text>"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn escaping_drops_characters_xml_rejects() {
        assert_eq!(escape_xml("a\u{0}b\u{8}c\u{1f}"), "abc");
        assert_eq!(escape_xml("tab\there\nline"), "tab\there\nline");
        assert_eq!(escape_xml("<\u{b}'>"), "&lt;&apos;&gt;");
        assert_eq!(escape_xml("café ✓"), "café ✓");
    }

    #[test]
    fn renderer_retains_last_document() {
        let frame = RenderFrame::new(Viewport::new(10, 10));
        let mut renderer = SvgRenderer::default();
        renderer.render(&frame).expect("render");
        assert!(renderer.document().is_some_and(|svg| svg.starts_with("<svg")));
    }
}
