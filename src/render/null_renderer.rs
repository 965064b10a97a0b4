use crate::error::ChartResult;
use crate::render::{PrimitiveCounts, RenderFrame, Renderer};

/// No-op renderer used by tests and headless engine usage.
///
/// It still validates frame content so tests catch invalid geometry without
/// a real backend.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub last_counts: PrimitiveCounts,
    pub frames_rendered: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> ChartResult<()> {
        frame.validate()?;
        self.last_counts = frame.counts();
        self.frames_rendered += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NullRenderer;
    use crate::core::Viewport;
    use crate::render::{CanvasLayerKind, CirclePrimitive, Color, RenderFrame, Renderer};

    #[test]
    fn counts_every_primitive_kind() {
        let mut frame = RenderFrame::new(Viewport::new(20, 20));
        frame.push_circle(
            CanvasLayerKind::Series,
            CirclePrimitive::new(5.0, 5.0, 2.0, Color::rgb(1.0, 0.0, 0.0)),
        );
        let mut renderer = NullRenderer::default();
        renderer.render(&frame).expect("render");
        assert_eq!(renderer.last_counts.circles, 1);
        assert_eq!(renderer.frames_rendered, 1);
    }

    #[test]
    fn rejects_invalid_geometry() {
        let mut frame = RenderFrame::new(Viewport::new(20, 20));
        frame.push_circle(
            CanvasLayerKind::Series,
            CirclePrimitive::new(f64::NAN, 5.0, 2.0, Color::rgb(1.0, 0.0, 0.0)),
        );
        assert!(NullRenderer::default().render(&frame).is_err());
    }
}
