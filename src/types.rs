use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A demanded rectangle. Rotation never mutates a piece, it produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub id: u32,
    pub width: f64,
    pub height: f64,
    pub demand: u32,
    pub name: String,
}

impl Piece {
    pub fn new(id: u32, width: f64, height: f64, demand: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.is_empty() {
            format!("Piece {id}")
        } else {
            name
        };
        Self {
            id,
            width,
            height,
            demand,
            name,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn rotated(&self) -> Self {
        Self {
            id: self.id,
            width: self.height,
            height: self.width,
            demand: self.demand,
            name: format!("{} (R)", self.name),
        }
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}x{}", self.name, self.width, self.height)
    }
}

/// A raw sheet type with its available supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: u32,
    pub width: f64,
    pub height: f64,
    pub quantity: u32,
    pub name: String,
}

impl Material {
    pub fn new(id: u32, width: f64, height: f64, quantity: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.is_empty() {
            format!("Material {id}")
        } else {
            name
        };
        Self {
            id,
            width,
            height,
            quantity,
            name,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}x{}", self.name, self.width, self.height)
    }
}

/// One piece instance located inside a pattern's material.
#[derive(Debug, Clone)]
pub struct Placement {
    pub piece: Arc<Piece>,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl Placement {
    pub fn piece_id(&self) -> u32 {
        self.piece.id
    }

    pub fn effective_width(&self) -> f64 {
        if self.rotated {
            self.piece.height
        } else {
            self.piece.width
        }
    }

    pub fn effective_height(&self) -> f64 {
        if self.rotated {
            self.piece.width
        } else {
            self.piece.height
        }
    }

    pub fn fits_in(&self, material: &Material) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.effective_width() <= material.width
            && self.y + self.effective_height() <= material.height
    }
}
