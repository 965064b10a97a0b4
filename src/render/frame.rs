use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::error::{ChartError, ChartResult};
use crate::render::{
    CanvasLayerKind, CirclePrimitive, Color, LinePrimitive, LinearGradient, PathPrimitive,
    Primitive, RectPrimitive, TextPrimitive,
};

/// Primitives of one paint layer, in draw order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPrimitives {
    pub kind: CanvasLayerKind,
    pub primitives: Vec<Primitive>,
}

/// Per-kind primitive counts of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrimitiveCounts {
    pub lines: usize,
    pub rects: usize,
    pub circles: usize,
    pub paths: usize,
    pub texts: usize,
}

impl PrimitiveCounts {
    #[must_use]
    pub fn total(self) -> usize {
        self.lines + self.rects + self.circles + self.paths + self.texts
    }
}

/// Backend-agnostic scene for one chart draw pass.
///
/// Layout code only ever appends to a frame; backends only ever read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub background: Option<Color>,
    pub gradients: Vec<LinearGradient>,
    pub layers: Vec<LayerPrimitives>,
}

impl RenderFrame {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        let layers = CanvasLayerKind::CANONICAL_ORDER
            .iter()
            .map(|kind| LayerPrimitives {
                kind: *kind,
                primitives: Vec::new(),
            })
            .collect();
        Self {
            viewport,
            background: None,
            gradients: Vec::new(),
            layers,
        }
    }

    #[must_use]
    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }

    pub fn push(&mut self, kind: CanvasLayerKind, primitive: impl Into<Primitive>) {
        if let Some(layer) = self.layers.iter_mut().find(|layer| layer.kind == kind) {
            layer.primitives.push(primitive.into());
        }
    }

    pub fn push_line(&mut self, kind: CanvasLayerKind, line: LinePrimitive) {
        self.push(kind, line);
    }

    pub fn push_rect(&mut self, kind: CanvasLayerKind, rect: RectPrimitive) {
        self.push(kind, rect);
    }

    pub fn push_circle(&mut self, kind: CanvasLayerKind, circle: CirclePrimitive) {
        self.push(kind, circle);
    }

    pub fn push_path(&mut self, kind: CanvasLayerKind, path: PathPrimitive) {
        self.push(kind, path);
    }

    pub fn push_text(&mut self, kind: CanvasLayerKind, text: TextPrimitive) {
        self.push(kind, text);
    }

    pub fn add_gradient(&mut self, gradient: LinearGradient) {
        self.gradients.retain(|existing| existing.id != gradient.id);
        self.gradients.push(gradient);
    }

    /// All primitives in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.layers.iter().flat_map(|layer| layer.primitives.iter())
    }

    #[must_use]
    pub fn layer(&self, kind: CanvasLayerKind) -> &[Primitive] {
        self.layers
            .iter()
            .find(|layer| layer.kind == kind)
            .map_or(&[][..], |layer| layer.primitives.as_slice())
    }

    pub fn rects(&self) -> impl Iterator<Item = &RectPrimitive> {
        self.iter().filter_map(|primitive| match primitive {
            Primitive::Rect(rect) => Some(rect),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextPrimitive> {
        self.iter().filter_map(|primitive| match primitive {
            Primitive::Text(text) => Some(text),
            _ => None,
        })
    }

    #[must_use]
    pub fn counts(&self) -> PrimitiveCounts {
        let mut counts = PrimitiveCounts::default();
        for primitive in self.iter() {
            match primitive {
                Primitive::Line(_) => counts.lines += 1,
                Primitive::Rect(_) => counts.rects += 1,
                Primitive::Circle(_) => counts.circles += 1,
                Primitive::Path(_) => counts.paths += 1,
                Primitive::Text(_) => counts.texts += 1,
            }
        }
        counts
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !self.viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        if let Some(background) = self.background {
            background.validate()?;
        }
        for gradient in &self.gradients {
            gradient.validate()?;
        }
        for primitive in self.iter() {
            primitive.validate()?;
            if let Primitive::Rect(RectPrimitive {
                fill: crate::render::Fill::Gradient(id),
                ..
            }) = primitive
            {
                if !self.gradients.iter().any(|gradient| &gradient.id == id) {
                    return Err(ChartError::InvalidData(format!(
                        "rect references unknown gradient `{id}`"
                    )));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|layer| layer.primitives.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::RenderFrame;
    use crate::core::Viewport;
    use crate::render::{
        CanvasLayerKind, Color, Fill, LinePrimitive, Primitive, RectPrimitive, TextHAlign,
        TextPrimitive,
    };

    #[test]
    fn frame_iterates_in_layer_order() {
        let mut frame = RenderFrame::new(Viewport::new(100, 50));
        frame.push_text(
            CanvasLayerKind::Axis,
            TextPrimitive::new("x", 2.0, 4.0, 10.0, Color::rgb(0.0, 0.0, 0.0), TextHAlign::Right),
        );
        frame.push_line(
            CanvasLayerKind::Grid,
            LinePrimitive::new(0.0, 1.0, 5.0, 1.0, 1.0, Color::rgb(0.2, 0.2, 0.2)),
        );

        let order: Vec<_> = frame
            .iter()
            .map(|primitive| matches!(primitive, Primitive::Line(_)))
            .collect();
        assert_eq!(order, vec![true, false]);
        assert_eq!(frame.counts().total(), 2);
    }

    #[test]
    fn frame_rejects_dangling_gradient_reference() {
        let mut frame = RenderFrame::new(Viewport::new(100, 50));
        frame.push_rect(
            CanvasLayerKind::Legend,
            RectPrimitive::new(0.0, 0.0, 10.0, 10.0, Color::rgb(0.0, 0.0, 0.0))
                .with_fill(Fill::Gradient("missing".to_owned())),
        );
        assert!(frame.validate().is_err());
    }
}
