//! Output contract of a run, handed to whoever persists or renders it.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::config::BoardConfig;
use crate::types::{PieceRequest, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    DeadlineExceeded,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// Does not fit an empty board in any legal orientation.
    TooLarge,
    /// The run stopped before this unit was tried.
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedPiece {
    pub id: String,
    pub name: String,
    pub reason: UnplacedReason,
}

/// A placed piece in full-board coordinates (margins included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiecePlacement {
    pub id: String,
    pub name: String,
    pub x: u32,
    pub y: u32,
    /// Footprint after rotation.
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
    pub grain_locked: bool,
    #[serde(default)]
    pub edge_banding: BTreeSet<Side>,
}

impl PiecePlacement {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Banded edge length, measured on the piece's unrotated sides.
    pub fn banding_length(&self) -> u64 {
        let (w, h) = if self.rotated {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        self.edge_banding
            .iter()
            .map(|side| match side {
                Side::Top | Side::Bottom => w as u64,
                Side::Left | Side::Right => h as u64,
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub working_width: u32,
    pub working_height: u32,
    pub pieces: Vec<PiecePlacement>,
    pub area_used: u64,
    pub area_total: u64,
    pub efficiency_percent: f64,
}

impl BoardLayout {
    pub fn refresh_metrics(&mut self) {
        self.area_used = self.pieces.iter().map(PiecePlacement::area).sum();
        self.area_total = self.working_width as u64 * self.working_height as u64;
        self.efficiency_percent = percent(self.area_used, self.area_total);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub config: BoardConfig,
    pub boards: Vec<BoardLayout>,
    pub total_boards: usize,
    pub total_pieces_placed: usize,
    pub pieces_unplaced: usize,
    pub unplaced: Vec<UnplacedPiece>,
    pub area_used_m2: f64,
    pub area_total_m2: f64,
    pub efficiency_percent: f64,
    pub edge_banding_length_mm: u64,
    pub elapsed_seconds: f64,
    pub stop_reason: StopReason,
    /// The cut list exactly as supplied, so the run can be reproduced.
    pub requests: Vec<PieceRequest>,
}

impl RunResult {
    pub(crate) fn assemble(
        config: BoardConfig,
        requests: &[PieceRequest],
        boards: Vec<Board>,
        unplaced: Vec<UnplacedPiece>,
        elapsed: Duration,
        stop_reason: StopReason,
    ) -> Self {
        let boards = boards
            .into_iter()
            .map(|board| layout_board(&config, requests, board))
            .collect();

        let mut result = Self {
            config,
            boards,
            total_boards: 0,
            total_pieces_placed: 0,
            pieces_unplaced: unplaced.len(),
            unplaced,
            area_used_m2: 0.0,
            area_total_m2: 0.0,
            efficiency_percent: 0.0,
            edge_banding_length_mm: 0,
            elapsed_seconds: elapsed.as_secs_f64(),
            stop_reason,
            requests: requests.to_vec(),
        };
        result.refresh_totals();
        result
    }

    /// Recomputes run-level figures from the board list.
    pub fn refresh_totals(&mut self) {
        self.total_boards = self.boards.len();
        self.total_pieces_placed = self.boards.iter().map(|b| b.pieces.len()).sum();
        self.pieces_unplaced = self.unplaced.len();

        let used: u64 = self.boards.iter().map(|b| b.area_used).sum();
        let total: u64 = self.boards.iter().map(|b| b.area_total).sum();
        self.area_used_m2 = used as f64 / 1_000_000.0;
        self.area_total_m2 = total as f64 / 1_000_000.0;
        self.efficiency_percent = percent(used, total);
        self.edge_banding_length_mm = self
            .boards
            .iter()
            .flat_map(|b| &b.pieces)
            .map(PiecePlacement::banding_length)
            .sum();
    }
}

fn layout_board(config: &BoardConfig, requests: &[PieceRequest], board: Board) -> BoardLayout {
    let working = board.working();
    let index = board.index();
    let pieces = board
        .into_pieces()
        .into_iter()
        .map(|p| {
            let req = &requests[p.request];
            let size = p.orientation.size();
            PiecePlacement {
                id: p.id,
                name: req.name.clone(),
                x: p.x + config.margin_x,
                y: p.y + config.margin_y,
                width: size.width,
                height: size.height,
                rotated: p.orientation.is_rotated(),
                grain_locked: req.grain_locked,
                edge_banding: req.edge_banding.clone(),
            }
        })
        .collect();

    let mut layout = BoardLayout {
        index,
        width: config.width,
        height: config.height,
        working_width: working.width,
        working_height: working.height,
        pieces,
        area_used: 0,
        area_total: 0,
        efficiency_percent: 0.0,
    };
    layout.refresh_metrics();
    layout
}

/// `used / total` as a percentage rounded to two decimals; 0 when `total` is 0.
pub fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64 * 10_000.0).round() / 100.0
}
