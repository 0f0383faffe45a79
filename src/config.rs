//! Board geometry, engine knobs and the job-file root.

use serde::{Deserialize, Serialize};

use crate::clock::CancelToken;
use crate::error::{ConfigError, Result};
use crate::types::{PieceRequest, Rect, deserialize_u32_from_number};

/// Default saw allowance in millimetres.
pub const DEFAULT_KERF: u32 = 3;

/// Default wall-clock budget for one run.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default step of the fallback grid scan in millimetres.
pub const DEFAULT_GRID_STEP: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub margin_x: u32,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub margin_y: u32,
    #[serde(default = "default_kerf", deserialize_with = "deserialize_u32_from_number")]
    pub kerf: u32,
}

fn default_kerf() -> u32 {
    DEFAULT_KERF
}

impl BoardConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            margin_x: 0,
            margin_y: 0,
            kerf: DEFAULT_KERF,
        }
    }

    pub fn with_margins(mut self, margin_x: u32, margin_y: u32) -> Self {
        self.margin_x = margin_x;
        self.margin_y = margin_y;
        self
    }

    pub fn with_kerf(mut self, kerf: u32) -> Self {
        self.kerf = kerf;
        self
    }

    pub fn working_width(&self) -> u32 {
        self.width.saturating_sub(self.margin_x.saturating_mul(2))
    }

    pub fn working_height(&self) -> u32 {
        self.height.saturating_sub(self.margin_y.saturating_mul(2))
    }

    pub fn working_area(&self) -> Rect {
        Rect::new(self.working_width(), self.working_height())
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }
        if self.working_width() == 0 || self.working_height() == 0 {
            return Err(ConfigError::MarginsTooLarge {
                width: self.width,
                height: self.height,
                margin_x: self.margin_x,
                margin_y: self.margin_y,
            });
        }
        Ok(())
    }
}

/// Non-functional knobs of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Wall-clock budget in milliseconds (0 = unlimited).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_grid_step")]
    pub grid_step: u32,

    #[serde(skip)]
    pub cancel: Option<CancelToken>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_grid_step() -> u32 {
    DEFAULT_GRID_STEP
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            grid_step: DEFAULT_GRID_STEP,
            cancel: None,
        }
    }
}

impl EngineOptions {
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn with_grid_step(mut self, step: u32) -> Self {
        self.grid_step = step;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_step == 0 {
            return Err(ConfigError::ZeroGridStep);
        }
        Ok(())
    }
}

/// Root of a JSON job file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub board: BoardConfig,
    pub pieces: Vec<PieceRequest>,
    #[serde(default)]
    pub options: EngineOptions,
}

impl Job {
    pub fn validate(&self) -> Result<()> {
        self.board.validate()?;
        self.options.validate()?;
        validate_requests(&self.pieces)
    }
}

pub fn validate_requests(requests: &[PieceRequest]) -> Result<()> {
    for req in requests {
        if req.width == 0 || req.height == 0 {
            return Err(ConfigError::EmptyPiece {
                name: req.name.clone(),
                width: req.width,
                height: req.height,
            });
        }
        if req.quantity == 0 {
            return Err(ConfigError::ZeroQuantity {
                name: req.name.clone(),
            });
        }
    }
    Ok(())
}
