//! Manual edits to a finished layout and the checks that keep them honest.

use serde::{Deserialize, Serialize};

use crate::result::{BoardLayout, PiecePlacement, RunResult};

/// New position and footprint for one piece, in full-board coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceUpdate {
    /// 0-based position in the board's piece list.
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub rotated: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardUpdate {
    /// 1-based board number.
    pub board: usize,
    pub pieces: Vec<PieceUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutIssue {
    OutOfBounds { board: usize, piece: String },
    TooClose { board: usize, first: String, second: String },
    GrainViolation { board: usize, piece: String },
}

impl RunResult {
    /// Applies hand-made placement changes and refreshes all metrics.
    ///
    /// Updates naming a board or piece that does not exist are ignored.
    /// Returns how many pieces were changed.
    pub fn apply_manual_layout(&mut self, updates: &[BoardUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            let Some(board) = update
                .board
                .checked_sub(1)
                .and_then(|i| self.boards.get_mut(i))
            else {
                continue;
            };
            for pu in &update.pieces {
                let Some(piece) = board.pieces.get_mut(pu.index) else {
                    continue;
                };
                piece.x = pu.x;
                piece.y = pu.y;
                piece.width = pu.width;
                piece.height = pu.height;
                if let Some(rotated) = pu.rotated {
                    piece.rotated = rotated;
                }
                applied += 1;
            }
            board.refresh_metrics();
        }
        self.refresh_totals();
        applied
    }

    /// Lists every bounds, clearance and grain problem in the current layout.
    pub fn audit(&self) -> Vec<LayoutIssue> {
        self.boards
            .iter()
            .flat_map(|board| {
                audit_board(board, self.config.margin_x, self.config.margin_y, self.config.kerf)
            })
            .collect()
    }
}

fn audit_board(board: &BoardLayout, margin_x: u32, margin_y: u32, kerf: u32) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();
    let min_x = margin_x as u64;
    let min_y = margin_y as u64;
    let max_x = min_x + board.working_width as u64;
    let max_y = min_y + board.working_height as u64;

    for p in &board.pieces {
        let (right, top) = far_corner(p);
        if (p.x as u64) < min_x || (p.y as u64) < min_y || right > max_x || top > max_y {
            issues.push(LayoutIssue::OutOfBounds {
                board: board.index,
                piece: p.id.clone(),
            });
        }
        if p.grain_locked && p.rotated {
            issues.push(LayoutIssue::GrainViolation {
                board: board.index,
                piece: p.id.clone(),
            });
        }
    }

    let kerf = kerf as u64;
    for (i, a) in board.pieces.iter().enumerate() {
        for b in &board.pieces[i + 1..] {
            let (a_right, a_top) = far_corner(a);
            let (b_right, b_top) = far_corner(b);
            let clear_x = a_right + kerf <= b.x as u64 || b_right + kerf <= a.x as u64;
            let clear_y = a_top + kerf <= b.y as u64 || b_top + kerf <= a.y as u64;
            if !clear_x && !clear_y {
                issues.push(LayoutIssue::TooClose {
                    board: board.index,
                    first: a.id.clone(),
                    second: b.id.clone(),
                });
            }
        }
    }
    issues
}

fn far_corner(p: &PiecePlacement) -> (u64, u64) {
    (p.x as u64 + p.width as u64, p.y as u64 + p.height as u64)
}
