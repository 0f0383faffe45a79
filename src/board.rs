use std::collections::BTreeSet;

use crate::types::{Orientation, PieceUnit, PlacedPiece, Rect};

/// One stock board being filled during a run.
///
/// Coordinates are relative to the working area (margins stripped), with the
/// origin at its corner.
#[derive(Debug, Clone)]
pub struct Board {
    index: usize,
    working: Rect,
    kerf: u32,
    grid_step: u32,
    pieces: Vec<PlacedPiece>,
}

impl Board {
    pub fn new(index: usize, working: Rect, kerf: u32, grid_step: u32) -> Self {
        Self {
            index,
            working,
            kerf,
            grid_step: grid_step.max(1),
            pieces: Vec::new(),
        }
    }

    /// 1-based creation order within the run.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn working(&self) -> Rect {
        self.working
    }

    pub fn pieces(&self) -> &[PlacedPiece] {
        &self.pieces
    }

    pub fn into_pieces(self) -> Vec<PlacedPiece> {
        self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn used_area(&self) -> u64 {
        self.pieces.iter().map(|p| p.size().area()).sum()
    }

    /// Whether a `size` footprint at `(x, y)` stays inside the working area
    /// and keeps `kerf` clearance to every placed piece.
    pub fn fits(&self, x: u32, y: u32, size: Rect) -> bool {
        let (x, y) = (x as u64, y as u64);
        let right = x + size.width as u64;
        let top = y + size.height as u64;
        if right > self.working.width as u64 || top > self.working.height as u64 {
            return false;
        }

        let kerf = self.kerf as u64;
        self.pieces.iter().all(|p| {
            let clear_x = right + kerf <= p.x as u64 || p.right() + kerf <= x;
            let clear_y = top + kerf <= p.y as u64 || p.top() + kerf <= y;
            clear_x || clear_y
        })
    }

    /// Lowest, then leftmost, admissible anchor for a `size` footprint.
    ///
    /// Anchors come from the edges of placed pieces; when none of them is
    /// admissible a coarse grid scan is tried before giving up.
    pub fn find_position(&self, size: Rect) -> Option<(u32, u32)> {
        if !size.fits_in(&self.working) {
            return None;
        }
        if self.pieces.is_empty() {
            return Some((0, 0));
        }

        self.candidates(size)
            .into_iter()
            .map(|(y, x)| (x, y))
            .find(|&(x, y)| self.fits(x, y, size))
            .or_else(|| self.scan_grid(size))
    }

    /// Anchor points ordered by `(y, x)`, already clipped to the working area.
    ///
    /// Each placed piece contributes its own corner, the points right of it
    /// and above it, and the corner diagonal to it; the origin is always in.
    fn candidates(&self, size: Rect) -> BTreeSet<(u32, u32)> {
        let max_x = (self.working.width - size.width) as u64;
        let max_y = (self.working.height - size.height) as u64;
        let kerf = self.kerf as u64;

        let mut anchors = BTreeSet::new();
        anchors.insert((0, 0));
        for p in &self.pieces {
            let (x, y) = (p.x as u64, p.y as u64);
            let right = p.right() + kerf;
            let above = p.top() + kerf;
            for (ax, ay) in [(right, y), (right, above), (x, above), (x, y)] {
                if ax <= max_x && ay <= max_y {
                    anchors.insert((ay as u32, ax as u32));
                }
            }
        }
        anchors
    }

    /// Row-major scan on a fixed lattice. Slots off the lattice are missed.
    pub fn scan_grid(&self, size: Rect) -> Option<(u32, u32)> {
        if !size.fits_in(&self.working) {
            return None;
        }
        let step = self.grid_step as usize;
        for y in (0..=self.working.height - size.height).step_by(step) {
            for x in (0..=self.working.width - size.width).step_by(step) {
                if self.fits(x, y, size) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// Tries every legal orientation of `unit` in turn and records the first
    /// one that finds a position.
    pub fn place_piece(&mut self, unit: &PieceUnit) -> bool {
        for orientation in orientations(unit, self.working) {
            if let Some((x, y)) = self.find_position(orientation.size()) {
                self.pieces.push(PlacedPiece {
                    id: unit.id.clone(),
                    request: unit.request,
                    x,
                    y,
                    orientation,
                });
                return true;
            }
        }
        false
    }
}

/// Orientations worth trying for `unit` on a `working` area, natural first.
///
/// Empty when the unit cannot fit an empty board at all.
pub fn orientations(unit: &PieceUnit, working: Rect) -> Vec<Orientation> {
    let natural = unit.size;
    let rotated = natural.rotated();
    let may_rotate = !unit.grain_locked && !natural.is_square() && rotated.fits_in(&working);

    let mut out = Vec::with_capacity(2);
    if natural.fits_in(&working) {
        out.push(Orientation::Natural(natural));
    }
    if may_rotate {
        out.push(Orientation::Rotated(rotated));
    }
    out
}
