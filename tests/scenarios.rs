//! End-to-end runs of the nesting engine on small, hand-checked cut lists
//! plus the layout invariants every run must keep.

use std::cell::Cell;
use std::time::Duration;

use panel_nester::{
    BoardConfig, CancelToken, Clock, EngineOptions, PieceRequest, RunResult, Side, Solver,
    StopReason, UnplacedReason,
};
use pretty_assertions::assert_eq;

/// Advances by a fixed tick every time it is read.
struct TickClock {
    tick: Duration,
    reads: Cell<u32>,
}

impl TickClock {
    fn new(tick: Duration) -> Self {
        Self {
            tick,
            reads: Cell::new(0),
        }
    }
}

impl Clock for TickClock {
    fn elapsed(&self) -> Duration {
        self.reads.set(self.reads.get() + 1);
        self.tick * self.reads.get()
    }
}

fn solve(config: BoardConfig, pieces: &[PieceRequest]) -> RunResult {
    Solver::new(config, EngineOptions::default())
        .unwrap()
        .solve(pieces)
}

fn positions(result: &RunResult, board: usize) -> Vec<(u32, u32)> {
    result.boards[board].pieces.iter().map(|p| (p.x, p.y)).collect()
}

/// Invariants that hold for every engine-produced layout.
fn assert_layout_valid(result: &RunResult, requests: &[PieceRequest]) {
    let issues = result.audit();
    assert!(issues.is_empty(), "layout issues: {issues:?}");

    let requested: u32 = requests.iter().map(|r| r.quantity).sum();
    assert_eq!(
        result.total_pieces_placed + result.pieces_unplaced,
        requested as usize,
        "pieces were lost or duplicated"
    );
    assert_eq!(result.total_boards, result.boards.len());
    assert!(result.boards.iter().all(|b| !b.pieces.is_empty()));

    for (i, board) in result.boards.iter().enumerate() {
        assert_eq!(board.index, i + 1);
    }
}

fn cabinet_job() -> Vec<PieceRequest> {
    vec![
        PieceRequest::new("side", 720, 560, 4).with_banding([Side::Top, Side::Right]),
        PieceRequest::new("bottom", 764, 560, 2).grain_free(),
        PieceRequest::new("shelf", 764, 540, 5).grain_free().with_banding([Side::Top]),
        PieceRequest::new("door", 397, 716, 4).with_banding([
            Side::Top,
            Side::Right,
            Side::Bottom,
            Side::Left,
        ]),
        PieceRequest::new("drawer_front", 796, 176, 6),
        PieceRequest::new("drawer_side", 500, 120, 12).grain_free(),
        PieceRequest::new("back", 1200, 764, 2).grain_free(),
        PieceRequest::new("rail", 764, 80, 8).grain_free(),
    ]
}

#[test]
fn test_four_squares_fill_one_board() {
    let pieces = [PieceRequest::new("sq", 400, 400, 4)];
    let result = solve(BoardConfig::new(1000, 1000).with_kerf(0), &pieces);

    assert_layout_valid(&result, &pieces);
    assert_eq!(result.total_boards, 1);
    assert_eq!(
        positions(&result, 0),
        vec![(0, 0), (400, 0), (0, 400), (400, 400)]
    );
    assert_eq!(result.efficiency_percent, 64.0);
    assert_eq!(result.boards[0].efficiency_percent, 64.0);
}

#[test]
fn test_exact_fit_inside_margins() {
    let pieces = [PieceRequest::new("panel", 480, 480, 1)];
    let config = BoardConfig::new(500, 500).with_margins(10, 10).with_kerf(3);
    let result = solve(config, &pieces);

    assert_layout_valid(&result, &pieces);
    let board = &result.boards[0];
    assert_eq!((board.working_width, board.working_height), (480, 480));
    assert_eq!((board.width, board.height), (500, 500));
    assert_eq!(positions(&result, 0), vec![(10, 10)]);
    assert_eq!(result.efficiency_percent, 100.0);
}

#[test]
fn test_piece_too_large_in_both_orientations() {
    let pieces = [PieceRequest::new("long", 400, 200, 1).grain_free()];
    let result = solve(BoardConfig::new(300, 300), &pieces);

    assert_layout_valid(&result, &pieces);
    assert_eq!(result.total_boards, 0);
    assert_eq!(result.pieces_unplaced, 1);
    assert_eq!(result.unplaced[0].reason, UnplacedReason::TooLarge);
    assert_eq!(result.efficiency_percent, 0.0);
    assert_eq!(result.stop_reason, StopReason::Completed);
}

#[test]
fn test_kerf_pushes_neighbour_off_board() {
    let pieces = [PieceRequest::new("sq", 300, 300, 2)];
    let result = solve(BoardConfig::new(600, 600).with_kerf(5), &pieces);

    assert_layout_valid(&result, &pieces);
    assert_eq!(result.total_boards, 2);
    assert_eq!(positions(&result, 0), vec![(0, 0)]);
    assert_eq!(positions(&result, 1), vec![(0, 0)]);

    // five more millimetres of board make room for the clearance
    let result = solve(BoardConfig::new(605, 600).with_kerf(5), &pieces);
    assert_layout_valid(&result, &pieces);
    assert_eq!(result.total_boards, 1);
    assert_eq!(positions(&result, 0), vec![(0, 0), (305, 0)]);
}

#[test]
fn test_grain_free_piece_rotates_when_forced() {
    let pieces = [PieceRequest::new("back", 1200, 500, 1).grain_free()];
    let result = solve(BoardConfig::new(800, 1300), &pieces);

    assert_layout_valid(&result, &pieces);
    let p = &result.boards[0].pieces[0];
    assert!(p.rotated);
    assert_eq!((p.width, p.height), (500, 1200));
}

#[test]
fn test_grain_locked_never_rotates() {
    let pieces = cabinet_job()
        .into_iter()
        .map(|r| PieceRequest {
            grain_locked: true,
            ..r
        })
        .collect::<Vec<_>>();
    let result = solve(BoardConfig::new(2440, 1830).with_margins(10, 10), &pieces);

    assert_layout_valid(&result, &pieces);
    assert!(result.boards.iter().flat_map(|b| &b.pieces).all(|p| !p.rotated));
}

#[test]
fn test_mixed_job_keeps_invariants() {
    let pieces = cabinet_job();
    let config = BoardConfig::new(2440, 1830).with_margins(10, 10).with_kerf(4);
    let result = solve(config, &pieces);

    assert_layout_valid(&result, &pieces);
    assert_eq!(result.pieces_unplaced, 0);
    assert_eq!(result.requests, pieces);

    let used: u64 = result.boards.iter().map(|b| b.area_used).sum();
    let board_area = 2420u64 * 1810;
    assert!(result.total_boards as u64 >= used.div_ceil(board_area));
    assert!(result.efficiency_percent > 0.0 && result.efficiency_percent <= 100.0);
}

/// A few hundred small parts of distinct sizes, default options: the whole
/// list must be placed well inside the default time budget.
#[test]
fn test_complex_many_distinct_small_parts() {
    let pieces: Vec<PieceRequest> = (0..300u32)
        .map(|i| PieceRequest::new(format!("part{i}"), 30 + i % 50, 20 + (i / 50) * 9, 1))
        .collect();
    let config = BoardConfig::new(2440, 1830).with_kerf(3);
    let result = solve(config, &pieces);

    assert_layout_valid(&result, &pieces);
    assert_eq!(result.stop_reason, StopReason::Completed);
    assert_eq!(result.pieces_unplaced, 0);
    assert_eq!(result.total_pieces_placed, 300);
    assert_eq!(result.total_boards, 1);
    assert!(result.elapsed_seconds < 30.0);
}

#[test]
fn test_runs_are_deterministic() {
    let pieces = cabinet_job();
    let config = BoardConfig::new(2440, 1830).with_margins(10, 10).with_kerf(4);
    let first = solve(config, &pieces);
    let second = solve(config, &pieces);
    assert_eq!(first.boards, second.boards);
    assert_eq!(first.unplaced, second.unplaced);
}

#[test]
fn test_small_pieces_below_grid_step() {
    let pieces = [PieceRequest::new("chip", 10, 10, 100)];
    let options = EngineOptions::default().with_grid_step(15);
    let result = Solver::new(BoardConfig::new(100, 100).with_kerf(0), options)
        .unwrap()
        .solve(&pieces);

    assert_layout_valid(&result, &pieces);
    assert_eq!(result.total_boards, 1);
    assert_eq!(result.total_pieces_placed, 100);
    assert_eq!(result.efficiency_percent, 100.0);
}

#[test]
fn test_deadline_leaves_rest_unplaced() {
    let pieces = [PieceRequest::new("sq", 100, 100, 10)];
    let options = EngineOptions::default().with_timeout_ms(3);
    let solver = Solver::new(BoardConfig::new(1000, 1000).with_kerf(0), options).unwrap();
    let result = solver.solve_with_clock(&pieces, &TickClock::new(Duration::from_millis(1)));

    assert_layout_valid(&result, &pieces);
    assert_eq!(result.stop_reason, StopReason::DeadlineExceeded);
    assert_eq!(result.total_pieces_placed, 3);
    assert_eq!(result.pieces_unplaced, 7);
    assert!(
        result
            .unplaced
            .iter()
            .all(|u| u.reason == UnplacedReason::NotAttempted)
    );
    assert_eq!(result.unplaced[0].id, "sq_4");
}

#[test]
fn test_zero_timeout_means_unlimited() {
    let pieces = [PieceRequest::new("sq", 100, 100, 10)];
    let options = EngineOptions::default().with_timeout_ms(0);
    let solver = Solver::new(BoardConfig::new(1000, 1000), options).unwrap();
    let result = solver.solve_with_clock(&pieces, &TickClock::new(Duration::from_secs(3600)));

    assert_eq!(result.stop_reason, StopReason::Completed);
    assert_eq!(result.total_pieces_placed, 10);
}

#[test]
fn test_cancelled_run_places_nothing() {
    let token = CancelToken::new();
    token.cancel();
    let pieces = [PieceRequest::new("sq", 100, 100, 5)];
    let options = EngineOptions::default().with_cancel_token(token);
    let result = Solver::new(BoardConfig::new(1000, 1000), options)
        .unwrap()
        .solve(&pieces);

    assert_layout_valid(&result, &pieces);
    assert_eq!(result.stop_reason, StopReason::Cancelled);
    assert_eq!(result.total_boards, 0);
    assert_eq!(result.pieces_unplaced, 5);
}

#[test]
fn test_edge_banding_passes_through() {
    let pieces = [PieceRequest::new("door", 400, 700, 2).with_banding([Side::Left, Side::Right])];
    let result = solve(BoardConfig::new(1000, 1000), &pieces);

    for p in result.boards.iter().flat_map(|b| &b.pieces) {
        assert_eq!(
            p.edge_banding.iter().copied().collect::<Vec<_>>(),
            vec![Side::Right, Side::Left]
        );
    }
    assert_eq!(result.edge_banding_length_mm, 2 * 2 * 700);
}

#[test]
fn test_result_json_shape() {
    let pieces = [PieceRequest::new("sq", 400, 400, 1)];
    let result = solve(BoardConfig::new(1000, 1000), &pieces);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["stop_reason"], "completed");
    assert_eq!(json["total_boards"], 1);
    assert_eq!(json["boards"][0]["pieces"][0]["id"], "sq_1");
    assert_eq!(json["boards"][0]["pieces"][0]["rotated"], false);
    assert_eq!(json["requests"][0]["name"], "sq");

    let back: RunResult = serde_json::from_value(json).unwrap();
    assert_eq!(back.boards, result.boards);
}
