use serde::{Deserialize, Serialize};

/// Paint layers of one chart surface, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanvasLayerKind {
    Background,
    Grid,
    Series,
    Overlay,
    Axis,
    Legend,
}

impl CanvasLayerKind {
    /// Canonical bottom-to-top paint order.
    pub const CANONICAL_ORDER: [Self; 6] = [
        Self::Background,
        Self::Grid,
        Self::Series,
        Self::Overlay,
        Self::Axis,
        Self::Legend,
    ];

    #[must_use]
    pub fn z_index(self) -> usize {
        match self {
            Self::Background => 0,
            Self::Grid => 1,
            Self::Series => 2,
            Self::Overlay => 3,
            Self::Axis => 4,
            Self::Legend => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CanvasLayerKind;

    #[test]
    fn canonical_order_matches_z_index() {
        for (index, kind) in CanvasLayerKind::CANONICAL_ORDER.iter().enumerate() {
            assert_eq!(kind.z_index(), index);
        }
    }
}
