use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
}

impl Rect {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn rotated(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How a piece sits on the board, carrying the footprint it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Natural(Rect),
    Rotated(Rect),
}

impl Orientation {
    pub fn size(&self) -> Rect {
        match *self {
            Orientation::Natural(r) | Orientation::Rotated(r) => r,
        }
    }

    pub fn is_rotated(&self) -> bool {
        matches!(self, Orientation::Rotated(_))
    }
}

/// A logical edge of a piece, in the piece's own (unrotated) frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// One line of the cut list as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceRequest {
    pub name: String,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(default = "default_quantity", deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
    #[serde(default = "default_true")]
    pub grain_locked: bool,
    #[serde(default)]
    pub edge_banding: BTreeSet<Side>,
}

fn default_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl PieceRequest {
    pub fn new(name: impl Into<String>, width: u32, height: u32, quantity: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            quantity,
            grain_locked: true,
            edge_banding: BTreeSet::new(),
        }
    }

    pub fn grain_free(mut self) -> Self {
        self.grain_locked = false;
        self
    }

    pub fn with_banding(mut self, sides: impl IntoIterator<Item = Side>) -> Self {
        self.edge_banding.extend(sides);
        self
    }

    pub fn size(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    /// Length of banded edge on one unit of this piece.
    pub fn banding_length(&self) -> u64 {
        self.edge_banding
            .iter()
            .map(|side| match side {
                Side::Top | Side::Bottom => self.width as u64,
                Side::Left | Side::Right => self.height as u64,
            })
            .sum()
    }
}

/// A single physical piece produced by expanding a request's quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceUnit {
    /// `name_N`, N counting from 1 within the request.
    pub id: String,
    /// Position of the originating request in the caller's list.
    pub request: usize,
    pub size: Rect,
    pub grain_locked: bool,
}

/// Where a unit ended up, in working-area coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedPiece {
    pub id: String,
    pub request: usize,
    pub x: u32,
    pub y: u32,
    pub orientation: Orientation,
}

impl PlacedPiece {
    pub fn size(&self) -> Rect {
        self.orientation.size()
    }

    pub fn right(&self) -> u64 {
        self.x as u64 + self.size().width as u64
    }

    pub fn top(&self) -> u64 {
        self.y as u64 + self.size().height as u64
    }
}

/// Accepts `600`, `600.0` or `"600"` and rejects fractional or negative values.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    let number = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))?;

    if number < 0.0 || number.fract() != 0.0 || number > u32::MAX as f64 {
        return Err(D::Error::custom(format!(
            "expected a non-negative whole number of millimetres, got {number}"
        )));
    }
    Ok(number as u32)
}
