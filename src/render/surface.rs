use std::sync::Arc;

use tracing::debug;

use crate::error::ChartResult;
use crate::render::{NullRenderer, RenderFrame, Renderer};

/// Single paint target of a chart.
///
/// Owns exactly one renderer and the last successfully painted frame. The
/// frame is kept behind an `Arc` so exports can read a snapshot on another
/// thread while the surface keeps repainting.
#[derive(Debug)]
pub struct DrawingSurface<R: Renderer> {
    renderer: R,
    snapshot: Option<Arc<RenderFrame>>,
    generation: u64,
}

impl<R: Renderer> DrawingSurface<R> {
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            snapshot: None,
            generation: 0,
        }
    }

    /// Paints `frame`, replacing the previous content.
    ///
    /// On backend failure the previous snapshot stays current.
    pub fn paint(&mut self, frame: RenderFrame) -> ChartResult<Arc<RenderFrame>> {
        self.renderer.render(&frame)?;
        let snapshot = Arc::new(frame);
        self.snapshot = Some(Arc::clone(&snapshot));
        self.generation += 1;
        debug!(
            generation = self.generation,
            primitives = snapshot.counts().total(),
            "surface painted"
        );
        Ok(snapshot)
    }

    /// Drops the painted content; a later export reports nothing rendered.
    pub fn clear(&mut self) {
        self.snapshot = None;
        self.generation += 1;
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<RenderFrame>> {
        self.snapshot.clone()
    }

    /// Bumped on every paint or clear.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

impl Default for DrawingSurface<NullRenderer> {
    fn default() -> Self {
        Self::new(NullRenderer::default())
    }
}
