use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{Material, Piece, Placement};

/// A candidate way of cutting one unit of a material.
///
/// `waste` always equals the material area minus the area of every accepted
/// placement. Placements are bounds-checked against the material only; overlap
/// between placements is not checked.
#[derive(Debug, Clone)]
pub struct CuttingPattern {
    pub id: usize,
    pub material: Arc<Material>,
    pub placements: Vec<Placement>,
    pub waste: f64,
    pub piece_counts: BTreeMap<u32, u32>,
}

impl CuttingPattern {
    pub fn new(id: usize, material: Arc<Material>) -> Self {
        let waste = material.area();
        Self {
            id,
            material,
            placements: Vec::new(),
            waste,
            piece_counts: BTreeMap::new(),
        }
    }

    /// Returns false and leaves the pattern untouched when the piece would
    /// leave the material.
    pub fn add_placement(&mut self, piece: Arc<Piece>, x: f64, y: f64, rotated: bool) -> bool {
        let placement = Placement {
            piece,
            x,
            y,
            rotated,
        };
        if !placement.fits_in(&self.material) {
            return false;
        }

        self.waste -= placement.piece.area();
        *self.piece_counts.entry(placement.piece_id()).or_insert(0) += 1;
        self.placements.push(placement);
        true
    }

    pub fn count_of(&self, piece_id: u32) -> u32 {
        self.piece_counts.get(&piece_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn used_area(&self) -> f64 {
        self.placements.iter().map(|p| p.piece.area()).sum()
    }
}
