//! Rectangle nesting for panel cutting.
//!
//! Takes a cut list of rectangular pieces and packs the individual units onto
//! as few boards of one size as a greedy bottom-left heuristic manages,
//! keeping saw-blade clearance (kerf) between pieces and honouring grain
//! direction. The result is plain serde data ready to be stored, rendered or
//! edited by hand.
//!
//! ```no_run
//! use panel_nester::{BoardConfig, EngineOptions, PieceRequest, Solver};
//!
//! let config = BoardConfig::new(2440, 1830).with_margins(10, 10).with_kerf(3);
//! let solver = Solver::new(config, EngineOptions::default()).unwrap();
//! let result = solver.solve(&[
//!     PieceRequest::new("side", 720, 560, 2),
//!     PieceRequest::new("shelf", 764, 540, 3).grain_free(),
//! ]);
//! println!("{} boards, {}% used", result.total_boards, result.efficiency_percent);
//! ```

pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod layout;
pub mod pieces;
pub mod result;
pub mod solver;
pub mod types;

pub use clock::{CancelToken, Clock, Stopwatch};
pub use config::{BoardConfig, EngineOptions, Job};
pub use error::ConfigError;
pub use layout::{BoardUpdate, LayoutIssue, PieceUpdate};
pub use result::{BoardLayout, PiecePlacement, RunResult, StopReason, UnplacedPiece, UnplacedReason};
pub use solver::Solver;
pub use types::{Orientation, PieceRequest, Rect, Side};
