//! The three fixed z-bands entities are drawn and hit-tested within

use serde::{Deserialize, Serialize};

/// A map layer, from bottom-most to top-most paint order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Layer {
    #[default]
    Low,
    Intermediate,
    High,
}

impl Layer {
    /// All layers in paint order (bottom first)
    pub const ALL: [Layer; 3] = [Layer::Low, Layer::Intermediate, Layer::High];

    /// Stable index used by the map file format
    pub fn index(self) -> usize {
        match self {
            Layer::Low => 0,
            Layer::Intermediate => 1,
            Layer::High => 2,
        }
    }

    pub fn from_index(index: i32) -> Option<Layer> {
        match index {
            0 => Some(Layer::Low),
            1 => Some(Layer::Intermediate),
            2 => Some(Layer::High),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Layer::Low => "Low",
            Layer::Intermediate => "Intermediate",
            Layer::High => "High",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for layer in Layer::ALL {
            assert_eq!(Layer::from_index(layer.index() as i32), Some(layer));
        }
        assert_eq!(Layer::from_index(3), None);
        assert_eq!(Layer::from_index(-1), None);
    }

    #[test]
    fn test_paint_order() {
        assert!(Layer::Low < Layer::Intermediate);
        assert!(Layer::Intermediate < Layer::High);
    }
}
