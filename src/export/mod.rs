//! Export pipeline.
//!
//! Exports read an immutable `RenderFrame` snapshot, so the live surface can
//! keep repainting while a capture runs and a failed export never touches
//! the displayed chart.

mod job;

pub use job::ExportJob;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::parse_css_color;
use crate::error::ExportError;
use crate::render::{Color, RenderFrame, SvgDocumentOptions, render_svg_document};

/// Output format of an export action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Png, Self::Svg, Self::Pdf];

    pub fn parse(input: &str) -> Result<Self, ExportError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            other => Err(ExportError::UnsupportedFormat(other.to_owned())),
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
        }
    }

    /// Whether this build can produce the format.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Self::Svg => true,
            Self::Png | Self::Pdf => cfg!(feature = "cairo-backend"),
        }
    }

    /// Formats this build can produce, in menu order.
    #[must_use]
    pub fn available() -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|format| format.is_available())
            .collect()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `"<title or chart>.<ext>"`.
#[must_use]
pub fn default_filename(title: Option<&str>, format: ExportFormat) -> String {
    let stem = title.map(str::trim).filter(|title| !title.is_empty()).unwrap_or("chart");
    format!("{stem}.{}", format.extension())
}

/// One export action: format, target filename and optional overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub filename: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// CSS color painted under the chart.
    #[serde(default)]
    pub background: Option<String>,
}

impl ExportRequest {
    #[must_use]
    pub fn new(format: ExportFormat, filename: impl Into<String>) -> Self {
        Self {
            format,
            filename: filename.into(),
            width: None,
            height: None,
            background: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    fn resolved_background(&self) -> Result<Option<Color>, ExportError> {
        match self.background.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(css) => parse_css_color(css)
                .map(Some)
                .ok_or_else(|| ExportError::InvalidOptions(format!("unparsable background color `{css}`"))),
        }
    }

    fn validate(&self) -> Result<(), ExportError> {
        if self.filename.trim().is_empty() {
            return Err(ExportError::InvalidOptions("filename must not be empty".to_owned()));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ExportError::InvalidOptions(format!(
                "export size must be positive, got {:?}x{:?}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Encoded export output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encodes `snapshot` per `request`.
///
/// Missing width/height fall back to the snapshot viewport; the frame is
/// scaled to the requested size.
pub fn export(snapshot: &RenderFrame, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
    request.validate()?;
    if !request.format.is_available() {
        return Err(ExportError::UnsupportedFormat(format!(
            "{} (built without the cairo-backend feature)",
            request.format
        )));
    }
    let background = request.resolved_background()?;
    let width = request.width.unwrap_or(snapshot.viewport.width);
    let height = request.height.unwrap_or(snapshot.viewport.height);
    debug!(format = %request.format, width, height, "exporting snapshot");

    let bytes = match request.format {
        ExportFormat::Svg => {
            snapshot.validate()?;
            let options = SvgDocumentOptions {
                width: Some(width),
                height: Some(height),
                background,
            };
            render_svg_document(snapshot, &options).into_bytes()
        }
        ExportFormat::Png => raster_png(snapshot, width, height, background)?,
        ExportFormat::Pdf => vector_pdf(snapshot, width, height, background)?,
    };

    info!(format = %request.format, filename = %request.filename, bytes = bytes.len(), "export finished");
    Ok(ExportArtifact {
        format: request.format,
        filename: request.filename.clone(),
        bytes,
    })
}

#[cfg(feature = "cairo-backend")]
fn raster_png(frame: &RenderFrame, width: u32, height: u32, background: Option<Color>) -> Result<Vec<u8>, ExportError> {
    Ok(crate::render::render_png_bytes(frame, width, height, background)?)
}

#[cfg(not(feature = "cairo-backend"))]
fn raster_png(_: &RenderFrame, _: u32, _: u32, _: Option<Color>) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::UnsupportedFormat("png".to_owned()))
}

#[cfg(feature = "cairo-backend")]
fn vector_pdf(frame: &RenderFrame, width: u32, height: u32, background: Option<Color>) -> Result<Vec<u8>, ExportError> {
    Ok(crate::render::render_pdf_bytes(frame, width, height, background)?)
}

#[cfg(not(feature = "cairo-backend"))]
fn vector_pdf(_: &RenderFrame, _: u32, _: u32, _: Option<Color>) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::UnsupportedFormat("pdf".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::{ExportFormat, ExportRequest, default_filename, export};
    use crate::core::Viewport;
    use crate::error::ExportError;
    use crate::render::{CanvasLayerKind, Color, RectPrimitive, RenderFrame};

    fn frame() -> RenderFrame {
        let mut frame = RenderFrame::new(Viewport::new(100, 50));
        frame.push_rect(
            CanvasLayerKind::Series,
            RectPrimitive::new(0.0, 0.0, 10.0, 10.0, Color::rgb(1.0, 0.0, 0.0)),
        );
        frame
    }

    #[test]
    fn filename_defaults_to_title_or_chart() {
        assert_eq!(default_filename(Some("Q3 revenue"), ExportFormat::Pdf), "Q3 revenue.pdf");
        assert_eq!(default_filename(Some("  "), ExportFormat::Svg), "chart.svg");
        assert_eq!(default_filename(None, ExportFormat::Png), "chart.png");
    }

    #[test]
    fn svg_export_uses_requested_size() {
        let request = ExportRequest::new(ExportFormat::Svg, "out.svg").with_size(200, 100);
        let artifact = export(&frame(), &request).expect("svg export");
        let text = String::from_utf8(artifact.bytes).expect("utf8");
        assert!(text.contains("width=\"200\""));
        assert!(text.contains("viewBox=\"0 0 100 50\""));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let zero = ExportRequest::new(ExportFormat::Svg, "out.svg").with_size(0, 10);
        assert!(matches!(export(&frame(), &zero), Err(ExportError::InvalidOptions(_))));
        let color = ExportRequest::new(ExportFormat::Svg, "out.svg").with_background("not-a-color");
        assert!(matches!(export(&frame(), &color), Err(ExportError::InvalidOptions(_))));
        assert!(matches!(ExportFormat::parse("gif"), Err(ExportError::UnsupportedFormat(_))));
    }

    #[cfg(not(feature = "cairo-backend"))]
    #[test]
    fn raster_formats_need_cairo() {
        let request = ExportRequest::new(ExportFormat::Png, "out.png");
        assert!(matches!(export(&frame(), &request), Err(ExportError::UnsupportedFormat(_))));
        assert_eq!(ExportFormat::available(), vec![ExportFormat::Svg]);
    }
}
