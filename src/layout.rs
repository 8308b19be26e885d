use serde::{Deserialize, Serialize};

use crate::pattern::CuttingPattern;

/// Geometry needed to draw one pattern. Drawing itself happens downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternLayout {
    pub pattern_id: usize,
    pub material_name: String,
    pub material_width: f64,
    pub material_height: f64,
    pub waste: f64,
    pub pieces: Vec<PlacedRect>,
}

/// A placement with its dimensions already swapped for rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedRect {
    pub piece_id: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotated: bool,
}

impl From<&CuttingPattern> for PatternLayout {
    fn from(pattern: &CuttingPattern) -> Self {
        Self {
            pattern_id: pattern.id,
            material_name: pattern.material.name.clone(),
            material_width: pattern.material.width,
            material_height: pattern.material.height,
            waste: pattern.waste,
            pieces: pattern
                .placements
                .iter()
                .map(|p| PlacedRect {
                    piece_id: p.piece_id(),
                    name: p.piece.name.clone(),
                    x: p.x,
                    y: p.y,
                    width: p.effective_width(),
                    height: p.effective_height(),
                    rotated: p.rotated,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::{Material, Piece};

    #[test]
    fn test_layout_uses_effective_dimensions() {
        let material = Arc::new(Material::new(1, 100.0, 70.0, 1, "Board"));
        let mut pattern = CuttingPattern::new(4, material);
        pattern.add_placement(Arc::new(Piece::new(2, 43.0, 28.0, 1, "A")), 0.0, 0.0, true);

        let layout = PatternLayout::from(&pattern);
        assert_eq!(layout.pattern_id, 4);
        assert_eq!(layout.material_width, 100.0);
        assert_eq!(layout.material_height, 70.0);
        assert_eq!(
            layout.pieces,
            vec![PlacedRect {
                piece_id: 2,
                name: "A".to_string(),
                x: 0.0,
                y: 0.0,
                width: 28.0,
                height: 43.0,
                rotated: true,
            }]
        );
    }

    #[test]
    fn test_empty_layout() {
        let material = Arc::new(Material::new(1, 10.0, 20.0, 1, ""));
        let layout = PatternLayout::from(&CuttingPattern::new(0, material));
        assert!(layout.pieces.is_empty());
        assert_eq!(layout.waste, 200.0);
        assert_eq!(layout.material_name, "Material 1");
    }
}
