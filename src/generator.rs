use std::sync::Arc;

use crate::pattern::CuttingPattern;
use crate::types::{Material, Piece};

/// Builds the candidate pattern set the model chooses from.
///
/// Only the single largest piece is ever considered: every material gets an
/// empty pattern plus one pattern per orientation in which that piece fits at
/// the origin. Multi-piece layouts are not enumerated.
pub struct PatternGenerator {
    max_patterns: usize,
}

impl PatternGenerator {
    pub fn new(max_patterns: usize) -> Self {
        Self { max_patterns }
    }

    pub fn generate(
        &self,
        materials: &[Arc<Material>],
        pieces: &[Arc<Piece>],
    ) -> Vec<CuttingPattern> {
        let mut patterns = Vec::new();
        if self.max_patterns == 0 {
            return patterns;
        }

        let sorted = sort_by_area(pieces);
        let largest = sorted.first().copied();

        for material in materials {
            // The empty pattern keeps the model feasible when nothing fits.
            patterns.push(CuttingPattern::new(patterns.len(), material.clone()));
            if patterns.len() >= self.max_patterns {
                break;
            }

            let Some(piece) = largest else {
                continue;
            };

            if piece.width <= material.width && piece.height <= material.height {
                let mut pattern = CuttingPattern::new(patterns.len(), material.clone());
                if pattern.add_placement(Arc::clone(piece), 0.0, 0.0, false) {
                    patterns.push(pattern);
                    if patterns.len() >= self.max_patterns {
                        break;
                    }
                }
            }

            if piece.height <= material.width && piece.width <= material.height {
                let mut pattern = CuttingPattern::new(patterns.len(), material.clone());
                if pattern.add_placement(Arc::clone(piece), 0.0, 0.0, true) {
                    patterns.push(pattern);
                    if patterns.len() >= self.max_patterns {
                        break;
                    }
                }
            }
        }

        for pattern in &patterns {
            tracing::debug!(
                pattern = pattern.id,
                material = %pattern.material.name,
                placements = pattern.placements.len(),
                waste = pattern.waste,
                "generated pattern"
            );
        }

        patterns
    }
}

/// Descending area; the sort is stable so equal areas keep input order.
fn sort_by_area(pieces: &[Arc<Piece>]) -> Vec<&Arc<Piece>> {
    let mut sorted: Vec<&Arc<Piece>> = pieces.iter().collect();
    sorted.sort_by(|a, b| b.area().total_cmp(&a.area()));
    sorted
}

/// Ids of demanded pieces that no pattern contains.
pub fn uncovered_pieces(patterns: &[CuttingPattern], pieces: &[Arc<Piece>]) -> Vec<u32> {
    pieces
        .iter()
        .filter(|p| p.demand > 0)
        .filter(|p| patterns.iter().all(|pattern| pattern.count_of(p.id) == 0))
        .map(|p| p.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(id: u32, w: f64, h: f64) -> Arc<Material> {
        Arc::new(Material::new(id, w, h, 10, ""))
    }

    fn piece(id: u32, w: f64, h: f64) -> Arc<Piece> {
        Arc::new(Piece::new(id, w, h, 5, ""))
    }

    /// Checks the invariants every generated pattern must hold:
    /// 1. Every placement lies inside the material
    /// 2. Waste equals material area minus placed area and is non-negative
    /// 3. Piece counts agree with the placement list
    fn assert_pattern_valid(pattern: &CuttingPattern) {
        for p in &pattern.placements {
            assert!(
                p.x + p.effective_width() <= pattern.material.width,
                "pattern {}: {} exceeds material width",
                pattern.id,
                p.piece
            );
            assert!(
                p.y + p.effective_height() <= pattern.material.height,
                "pattern {}: {} exceeds material height",
                pattern.id,
                p.piece
            );
        }
        let expected = pattern.material.area() - pattern.used_area();
        assert!((pattern.waste - expected).abs() < 1e-9);
        assert!(pattern.waste >= 0.0);
        let placed: u32 = pattern.piece_counts.values().sum();
        assert_eq!(placed as usize, pattern.placements.len());
    }

    #[test]
    fn test_empty_plus_both_orientations() {
        let generator = PatternGenerator::new(1000);
        let patterns = generator.generate(
            &[material(1, 100.0, 70.0)],
            &[piece(1, 20.0, 15.0), piece(2, 43.0, 28.0)],
        );
        assert_eq!(patterns.len(), 3);
        assert!(patterns[0].is_empty());
        assert!(!patterns[1].placements[0].rotated);
        assert!(patterns[2].placements[0].rotated);
        // Largest piece only.
        assert_eq!(patterns[1].count_of(2), 1);
        assert_eq!(patterns[1].count_of(1), 0);
        for p in &patterns {
            assert_pattern_valid(p);
        }
    }

    #[test]
    fn test_ids_strictly_increasing() {
        let generator = PatternGenerator::new(1000);
        let patterns = generator.generate(
            &[material(1, 100.0, 70.0), material(2, 50.0, 50.0), material(3, 30.0, 80.0)],
            &[piece(1, 40.0, 25.0)],
        );
        for (i, p) in patterns.iter().enumerate() {
            assert_eq!(p.id, i);
            assert_pattern_valid(p);
        }
    }

    #[test]
    fn test_only_rotated_orientation_fits() {
        let generator = PatternGenerator::new(1000);
        let patterns = generator.generate(&[material(1, 100.0, 50.0)], &[piece(1, 50.0, 100.0)]);
        assert_eq!(patterns.len(), 2);
        assert!(patterns[1].placements[0].rotated);
        assert_pattern_valid(&patterns[1]);
    }

    #[test]
    fn test_oversized_piece_gets_only_empty_patterns() {
        let generator = PatternGenerator::new(1000);
        let pieces = [piece(9, 500.0, 500.0)];
        let materials = [material(1, 100.0, 70.0), material(2, 200.0, 90.0)];
        let patterns = generator.generate(&materials, &pieces);
        assert_eq!(patterns.len(), 2);
        assert!(patterns.iter().all(CuttingPattern::is_empty));
        assert_eq!(uncovered_pieces(&patterns, &pieces), vec![9]);
    }

    #[test]
    fn test_no_pieces_still_emits_empty_pattern() {
        let generator = PatternGenerator::new(1000);
        let patterns = generator.generate(&[material(1, 10.0, 10.0), material(2, 5.0, 5.0)], &[]);
        assert_eq!(patterns.len(), 2);
        assert!(patterns.iter().all(CuttingPattern::is_empty));
    }

    #[test]
    fn test_max_patterns_stops_across_materials() {
        let materials = [material(1, 100.0, 70.0), material(2, 100.0, 70.0)];
        let pieces = [piece(1, 30.0, 20.0)];

        let patterns = PatternGenerator::new(1).generate(&materials, &pieces);
        assert_eq!(patterns.len(), 1);

        let patterns = PatternGenerator::new(4).generate(&materials, &pieces);
        assert_eq!(patterns.len(), 4);
        assert_eq!(patterns[3].material.id, 2);
    }

    #[test]
    fn test_area_ties_keep_input_order() {
        let generator = PatternGenerator::new(1000);
        let patterns = generator.generate(
            &[material(1, 100.0, 100.0)],
            &[piece(4, 10.0, 20.0), piece(2, 20.0, 10.0)],
        );
        assert_eq!(patterns[1].placements[0].piece_id(), 4);
    }

    #[test]
    fn test_uncovered_pieces_ignores_covered() {
        let generator = PatternGenerator::new(1000);
        let pieces = [piece(1, 43.0, 28.0), piece(2, 20.0, 15.0)];
        let patterns = generator.generate(&[material(1, 100.0, 70.0)], &pieces);
        assert_eq!(uncovered_pieces(&patterns, &pieces), vec![2]);
    }
}
