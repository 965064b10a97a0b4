use std::sync::Arc;

use tracing::debug;

use crate::api::dispatcher::{RenderOutcome, render_with};
use crate::config::ChartConfiguration;
use crate::core::DataRow;
use crate::error::{ChartResult, ExportError};
use crate::export::{ExportArtifact, ExportJob, ExportRequest, export};
use crate::layout::{LayoutContext, LayoutResult};
use crate::render::{DrawingSurface, RenderFrame, Renderer};

#[cfg(feature = "cairo-backend")]
use crate::render::CairoContextRenderer;

/// One chart instance: configuration, rows and its own drawing surface.
///
/// Every `(config, rows)` change is laid out from scratch on the next
/// `render`. Instances share nothing, so several charts can render on
/// different threads without coordination.
pub struct ChartEngine<R: Renderer> {
    config: ChartConfiguration,
    rows: Vec<DataRow>,
    context: Option<LayoutContext>,
    surface: DrawingSurface<R>,
    outcome: Option<RenderOutcome>,
}

impl<R: Renderer> ChartEngine<R> {
    #[must_use]
    pub fn new(renderer: R, config: ChartConfiguration) -> Self {
        Self {
            config,
            rows: Vec::new(),
            context: None,
            surface: DrawingSurface::new(renderer),
            outcome: None,
        }
    }

    /// Pins the layout clock and tuning; by default each render uses `Utc::now()`.
    #[must_use]
    pub fn with_context(mut self, context: LayoutContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn set_context(&mut self, context: Option<LayoutContext>) {
        self.context = context;
    }

    #[must_use]
    pub fn config(&self) -> &ChartConfiguration {
        &self.config
    }

    pub fn set_config(&mut self, config: ChartConfiguration) {
        self.config = config;
        self.outcome = None;
    }

    #[must_use]
    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn set_rows(&mut self, rows: Vec<DataRow>) {
        self.rows = rows;
        self.outcome = None;
    }

    /// Outcome of the last `render`, `None` after a config or data change.
    #[must_use]
    pub fn outcome(&self) -> Option<&RenderOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn layout(&self) -> Option<&LayoutResult> {
        self.outcome.as_ref().and_then(RenderOutcome::layout)
    }

    /// Lays out the current inputs and paints the result.
    ///
    /// Non-rendered outcomes clear the surface. A backend failure is returned
    /// as an error and keeps the previously painted snapshot.
    pub fn render(&mut self) -> ChartResult<&RenderOutcome> {
        let context = self.context.unwrap_or_default();
        let outcome = render_with(&self.config, &self.rows, &context);
        match outcome.layout() {
            Some(layout) => {
                self.surface.paint(layout.frame.clone())?;
            }
            None => {
                debug!(message = %outcome.message(), "nothing to paint, clearing surface");
                self.surface.clear();
            }
        }
        Ok(self.outcome.insert(outcome))
    }

    /// Renders onto an external cairo context, e.g. a toolkit draw callback.
    #[cfg(feature = "cairo-backend")]
    pub fn render_on_cairo_context(&mut self, context: &cairo::Context) -> ChartResult<()>
    where
        R: CairoContextRenderer,
    {
        if let Some(snapshot) = self.surface.snapshot() {
            self.surface.renderer_mut().render_on_cairo_context(context, &snapshot)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<RenderFrame>> {
        self.surface.snapshot()
    }

    #[must_use]
    pub fn surface(&self) -> &DrawingSurface<R> {
        &self.surface
    }

    /// Exports the last painted snapshot; the surface itself is not touched.
    pub fn export(&self, request: &ExportRequest) -> Result<ExportArtifact, ExportError> {
        let snapshot = self.surface.snapshot().ok_or(ExportError::NothingRendered)?;
        export(&snapshot, request)
    }

    /// Starts an export of the current snapshot on a worker thread.
    pub fn export_in_background(&self, request: ExportRequest) -> Result<ExportJob, ExportError> {
        let snapshot = self.surface.snapshot().ok_or(ExportError::NothingRendered)?;
        Ok(ExportJob::spawn(snapshot, request))
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.surface.into_renderer()
    }
}

#[cfg(test)]
mod tests {
    use super::ChartEngine;
    use crate::config::{ChartConfiguration, ChartType};
    use crate::core::DataRow;
    use crate::error::ExportError;
    use crate::export::{ExportFormat, ExportRequest};
    use crate::render::NullRenderer;

    fn pie() -> ChartConfiguration {
        ChartConfiguration::new(ChartType::Pie).with_category_value("k", "v")
    }

    #[test]
    fn render_paints_and_empty_data_clears() {
        let mut engine = ChartEngine::new(NullRenderer::default(), pie());
        engine.set_rows(vec![DataRow::new().with("k", "a").with("v", 2.0)]);
        assert!(engine.render().expect("render").is_rendered());
        assert!(engine.snapshot().is_some());
        assert_eq!(engine.surface().renderer().frames_rendered, 1);

        engine.set_rows(Vec::new());
        engine.render().expect("render");
        assert!(engine.snapshot().is_none());
        assert!(matches!(
            engine.export(&ExportRequest::new(ExportFormat::Svg, "x.svg")),
            Err(ExportError::NothingRendered)
        ));
    }

    #[test]
    fn export_leaves_the_surface_alone() {
        let mut engine = ChartEngine::new(NullRenderer::default(), pie());
        engine.set_rows(vec![DataRow::new().with("k", "a").with("v", 2.0)]);
        engine.render().expect("render");
        let generation = engine.surface().generation();
        let before = engine.snapshot().expect("snapshot");
        engine
            .export(&ExportRequest::new(ExportFormat::Svg, "x.svg"))
            .expect("export");
        assert_eq!(engine.surface().generation(), generation);
        assert_eq!(*engine.snapshot().expect("snapshot"), *before);
    }
}
