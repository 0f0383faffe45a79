use std::cmp::Reverse;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::board::{Board, orientations};
use crate::clock::{Clock, Stopwatch};
use crate::config::{BoardConfig, EngineOptions, validate_requests};
use crate::error::Result;
use crate::pieces::expand_and_sort;
use crate::result::{RunResult, StopReason, UnplacedPiece, UnplacedReason};
use crate::types::{PieceRequest, PieceUnit, Rect};

/// Packs a cut list onto boards of one size.
///
/// A solver holds only immutable configuration; every call to [`Solver::solve`]
/// starts from an empty board list.
#[derive(Debug, Clone)]
pub struct Solver {
    config: BoardConfig,
    options: EngineOptions,
}

impl Solver {
    pub fn new(config: BoardConfig, options: EngineOptions) -> Result<Self> {
        config.validate()?;
        options.validate()?;
        Ok(Self { config, options })
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Runs the optimization on an already validated cut list.
    ///
    /// Requests are expected to pass [`validate_requests`]; a zero-sized
    /// piece would otherwise be placed as a zero-area footprint. Use
    /// [`Solver::try_solve`] when the list comes straight from a caller.
    pub fn solve(&self, requests: &[PieceRequest]) -> RunResult {
        self.solve_with_clock(requests, &Stopwatch::start())
    }

    /// Validates `requests` before running, rejecting zero dimensions and
    /// zero quantities.
    pub fn try_solve(&self, requests: &[PieceRequest]) -> Result<RunResult> {
        validate_requests(requests)?;
        Ok(self.solve(requests))
    }

    /// Same as [`Solver::solve`], reading elapsed time from `clock`.
    pub fn solve_with_clock(&self, requests: &[PieceRequest], clock: &dyn Clock) -> RunResult {
        debug!(requests = requests.len(), "expanding and sorting pieces");
        let units = expand_and_sort(requests);

        debug!(units = units.len(), "placing pieces");
        let mut pool = BoardPool::new(&self.config, self.options.grid_step);
        let mut unplaced = Vec::new();
        let mut stop_reason = StopReason::Completed;

        let mut remaining = units.into_iter();
        while let Some(unit) = remaining.next() {
            if let Some(reason) = self.poll(clock) {
                stop_reason = reason;
                let skipped: Vec<PieceUnit> =
                    std::iter::once(unit).chain(remaining.by_ref()).collect();
                warn!(
                    reason = ?reason,
                    skipped = skipped.len(),
                    "run stopped early, remaining pieces left unplaced"
                );
                unplaced.extend(
                    skipped
                        .iter()
                        .map(|u| unplaced_piece(requests, u, UnplacedReason::NotAttempted)),
                );
                break;
            }

            if pool.assign(&unit).is_none() {
                warn!(
                    piece = %unit.id,
                    size = %unit.size,
                    working = %self.config.working_area(),
                    "piece does not fit an empty board"
                );
                unplaced.push(unplaced_piece(requests, &unit, UnplacedReason::TooLarge));
            }
        }

        debug!(boards = pool.len(), "finalizing");
        let result = RunResult::assemble(
            self.config,
            requests,
            pool.into_boards(),
            unplaced,
            clock.elapsed(),
            stop_reason,
        );
        info!(
            boards = result.total_boards,
            placed = result.total_pieces_placed,
            unplaced = result.pieces_unplaced,
            efficiency = result.efficiency_percent,
            elapsed = result.elapsed_seconds,
            "optimization finished"
        );
        result
    }

    fn deadline(&self) -> Option<Duration> {
        (self.options.timeout_ms > 0).then(|| Duration::from_millis(self.options.timeout_ms))
    }

    /// Checked before each unit; never interrupts a placement in progress.
    fn poll(&self, clock: &dyn Clock) -> Option<StopReason> {
        if self
            .options
            .cancel
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Some(StopReason::Cancelled);
        }
        match self.deadline() {
            Some(limit) if clock.elapsed() > limit => Some(StopReason::DeadlineExceeded),
            _ => None,
        }
    }
}

fn unplaced_piece(requests: &[PieceRequest], unit: &PieceUnit, reason: UnplacedReason) -> UnplacedPiece {
    UnplacedPiece {
        id: unit.id.clone(),
        name: requests[unit.request].name.clone(),
        reason,
    }
}

/// The boards opened during one run, in creation order.
#[derive(Debug)]
pub struct BoardPool {
    working: Rect,
    kerf: u32,
    grid_step: u32,
    boards: Vec<Board>,
}

impl BoardPool {
    pub fn new(config: &BoardConfig, grid_step: u32) -> Self {
        Self {
            working: config.working_area(),
            kerf: config.kerf,
            grid_step,
            boards: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn into_boards(self) -> Vec<Board> {
        self.boards
    }

    /// Places `unit` and returns the arena index of the board it went to.
    ///
    /// Fuller boards are tried first (ties in creation order). A new board is
    /// opened only when the unit actually fits on it; `None` means the unit
    /// is too large for this board size.
    pub fn assign(&mut self, unit: &PieceUnit) -> Option<usize> {
        if orientations(unit, self.working).is_empty() {
            return None;
        }

        let mut order: Vec<usize> = (0..self.boards.len()).collect();
        order.sort_by_key(|&i| Reverse(self.boards[i].len()));
        for i in order {
            if self.boards[i].place_piece(unit) {
                return Some(i);
            }
        }

        let mut board = Board::new(self.boards.len() + 1, self.working, self.kerf, self.grid_step);
        if !board.place_piece(unit) {
            return None;
        }
        debug!(board = board.index(), piece = %unit.id, "opened new board");
        self.boards.push(board);
        Some(self.boards.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn solver(config: BoardConfig) -> Solver {
        Solver::new(config, EngineOptions::default()).unwrap()
    }

    #[test]
    fn test_single_piece() {
        let sol = solver(BoardConfig::new(100, 100)).solve(&[PieceRequest::new("a", 50, 50, 1)]);
        assert_eq!(sol.total_boards, 1);
        assert_eq!(sol.total_pieces_placed, 1);
        assert_eq!(sol.pieces_unplaced, 0);
        assert_eq!(sol.stop_reason, StopReason::Completed);
    }

    #[test]
    fn test_no_demands() {
        let sol = solver(BoardConfig::new(100, 100)).solve(&[]);
        assert_eq!(sol.total_boards, 0);
        assert_eq!(sol.efficiency_percent, 0.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Solver::new(BoardConfig::new(100, 0), EngineOptions::default()).unwrap_err();
        assert_eq!(err, ConfigError::EmptyBoard { width: 100, height: 0 });
    }

    #[test]
    fn test_try_solve_rejects_empty_piece() {
        let solver = solver(BoardConfig::new(1000, 1000));
        let err = solver
            .try_solve(&[
                PieceRequest::new("ok", 100, 100, 1),
                PieceRequest::new("flat", 0, 300, 2),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::EmptyPiece {
                name: "flat".to_string(),
                width: 0,
                height: 300,
            }
        );

        let sol = solver.try_solve(&[PieceRequest::new("ok", 100, 100, 2)]).unwrap();
        assert_eq!(sol.total_pieces_placed, 2);
    }

    #[test]
    fn test_kerf_reduces_capacity() {
        let pieces = [PieceRequest::new("half", 50, 100, 2)];
        let no_kerf = solver(BoardConfig::new(100, 100).with_kerf(0)).solve(&pieces);
        assert_eq!(no_kerf.total_boards, 1);

        // 50 + 5 + 50 > 100
        let kerf = solver(BoardConfig::new(100, 100).with_kerf(5)).solve(&pieces);
        assert_eq!(kerf.total_boards, 2);
        assert_eq!(kerf.total_pieces_placed, 2);
    }

    #[test]
    fn test_oversized_piece_opens_no_board() {
        let sol = solver(BoardConfig::new(300, 300)).solve(&[
            PieceRequest::new("huge", 400, 200, 1).grain_free(),
            PieceRequest::new("ok", 100, 100, 1),
        ]);
        assert_eq!(sol.total_boards, 1);
        assert_eq!(sol.pieces_unplaced, 1);
        assert_eq!(sol.unplaced[0].id, "huge_1");
        assert_eq!(sol.unplaced[0].reason, UnplacedReason::TooLarge);
    }

    #[test]
    fn test_fuller_board_tried_first() {
        let config = BoardConfig::new(100, 100).with_kerf(0);
        let mut pool = BoardPool::new(&config, 15);
        let unit = |id: &str, w, h| PieceUnit {
            id: id.to_string(),
            request: 0,
            size: Rect::new(w, h),
            grain_locked: true,
        };
        assert_eq!(pool.assign(&unit("a", 100, 60)), Some(0));
        assert_eq!(pool.assign(&unit("b", 60, 60)), Some(1));
        // too tall for the strip left on the first board
        assert_eq!(pool.assign(&unit("c", 40, 60)), Some(1));
        // both boards have room; the second one holds more pieces
        assert_eq!(pool.assign(&unit("d", 20, 20)), Some(1));
        assert_eq!(pool.boards()[0].len(), 1);
        assert_eq!(pool.boards()[1].len(), 3);
        assert_eq!(pool.boards()[1].index(), 2);
    }
}
