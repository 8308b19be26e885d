use serde::{Deserialize, Serialize};

use crate::problem::Problem;

/// Utilization assumed when there is no material area to compare against.
const DEFAULT_UTILIZATION: f64 = 0.85;
const MAX_ESTIMATED_UTILIZATION: f64 = 0.95;

/// Inputs an external waste predictor is trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteFeatures {
    pub num_materials: usize,
    pub num_pieces: usize,
    pub total_material_area: f64,
    pub total_pieces_area: f64,
    pub estimated_utilization: f64,
}

impl From<&Problem> for WasteFeatures {
    fn from(problem: &Problem) -> Self {
        let total_material_area: f64 = problem
            .materials
            .iter()
            .map(|m| m.width * m.height * f64::from(m.quantity))
            .sum();
        let total_pieces_area: f64 = problem
            .pieces
            .iter()
            .map(|p| p.width * p.height * f64::from(p.demand))
            .sum();
        let estimated_utilization = if total_material_area > 0.0 {
            (total_pieces_area / total_material_area).min(MAX_ESTIMATED_UTILIZATION)
        } else {
            DEFAULT_UTILIZATION
        };

        Self {
            num_materials: problem.materials.len(),
            num_pieces: problem.pieces.len(),
            total_material_area,
            total_pieces_area,
            estimated_utilization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_features() {
        let problem = Problem::example("paper").unwrap();
        let features = WasteFeatures::from(&problem);
        assert_eq!(features.num_materials, 1);
        assert_eq!(features.num_pieces, 4);
        assert!((features.total_material_area - 140_000.0).abs() < 1e-6);
        assert!((features.total_pieces_area - 194_660.0).abs() < 1e-6);
        // Demand exceeds supply, so the estimate is capped.
        assert_eq!(features.estimated_utilization, 0.95);
    }

    #[test]
    fn test_no_material_uses_default() {
        let problem = Problem::from_json(
            r#"{"materials": [], "pieces": [{"width": 1, "height": 1, "demand": 1}]}"#,
        )
        .unwrap();
        let features = WasteFeatures::from(&problem);
        assert_eq!(features.estimated_utilization, 0.85);
        assert_eq!(features.total_pieces_area, 1.0);
    }
}
