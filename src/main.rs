use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use panel_nester::config::{DEFAULT_GRID_STEP, DEFAULT_KERF, DEFAULT_TIMEOUT_MS};
use panel_nester::{BoardConfig, EngineOptions, Job, PieceRequest, Rect, RunResult, Solver};

#[derive(Parser)]
#[command(
    name = "panel_nester",
    version,
    about = "Nest rectangular panel pieces onto stock boards"
)]
struct Cli {
    /// JSON job file with board, pieces and options
    #[arg(short, long, conflicts_with_all = ["board", "pieces"])]
    input: Option<PathBuf>,

    /// Board dimensions (WxH, e.g. 2440x1830)
    #[arg(long, value_parser = parse_dimensions, required_unless_present = "input")]
    board: Option<Rect>,

    /// Pieces as NAME:WxH[:QTY][:free] (e.g. side:720x560:2 shelf:764x540:3:free)
    #[arg(long = "piece", num_args = 1.., value_parser = parse_piece)]
    pieces: Vec<PieceRequest>,

    /// Edge margin on the left and right in mm
    #[arg(long, default_value_t = 0)]
    margin_x: u32,

    /// Edge margin on the top and bottom in mm
    #[arg(long, default_value_t = 0)]
    margin_y: u32,

    /// Blade kerf in mm
    #[arg(long, default_value_t = DEFAULT_KERF)]
    kerf: u32,

    /// Time budget in milliseconds (0 = unlimited)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Step of the fallback grid scan in mm
    #[arg(long, default_value_t = DEFAULT_GRID_STEP)]
    grid_step: u32,

    /// Write the result as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the result as JSON instead of a listing
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_dimensions(s: &str) -> Result<Rect, String> {
    let Some((w, h)) = s.split_once('x') else {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    };
    let width = w
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = h
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    if width == 0 || height == 0 {
        return Err(format!("dimensions must be non-zero in '{}'", s));
    }
    Ok(Rect::new(width, height))
}

fn parse_piece(s: &str) -> Result<PieceRequest, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if !(2..=4).contains(&parts.len()) || parts[0].is_empty() {
        return Err(format!("invalid piece '{}', expected NAME:WxH[:QTY][:free]", s));
    }
    let size = parse_dimensions(parts[1])?;

    let mut quantity = 1;
    let mut grain_free = false;
    for extra in &parts[2..] {
        if *extra == "free" {
            grain_free = true;
        } else {
            quantity = extra
                .parse::<u32>()
                .map_err(|_| format!("invalid quantity in '{}'", s))?;
        }
    }
    if quantity == 0 {
        return Err(format!("quantity must be non-zero in '{}'", s));
    }

    let req = PieceRequest::new(parts[0], size.width, size.height, quantity);
    Ok(if grain_free { req.grain_free() } else { req })
}

fn load_job(cli: &Cli) -> Result<Job> {
    if let Some(path) = &cli.input {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let job: Job = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse job file {}", path.display()))?;
        return Ok(job);
    }

    let Some(board) = cli.board else {
        bail!("either --input or --board is required");
    };
    Ok(Job {
        board: BoardConfig::new(board.width, board.height)
            .with_margins(cli.margin_x, cli.margin_y)
            .with_kerf(cli.kerf),
        pieces: cli.pieces.clone(),
        options: EngineOptions::default()
            .with_timeout_ms(cli.timeout_ms)
            .with_grid_step(cli.grid_step),
    })
}

fn print_listing(result: &RunResult) {
    for board in &result.boards {
        println!(
            "Board {} ({}x{}, {:.2}% used):",
            board.index, board.width, board.height, board.efficiency_percent
        );
        for p in &board.pieces {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("  {} {}x{} @ ({}, {}){}", p.id, p.width, p.height, p.x, p.y, rot);
        }
        println!();
    }

    for u in &result.unplaced {
        println!("Unplaced: {} ({:?})", u.id, u.reason);
    }

    println!(
        "Summary: {} board{} used, {} placed, {} unplaced, {:.2}% efficiency, {:.3}s",
        result.total_boards,
        if result.total_boards == 1 { "" } else { "s" },
        result.total_pieces_placed,
        result.pieces_unplaced,
        result.efficiency_percent,
        result.elapsed_seconds,
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let job = load_job(&cli)?;
    job.validate().context("Invalid job")?;
    info!(
        board = %Rect::new(job.board.width, job.board.height),
        pieces = job.pieces.len(),
        kerf = job.board.kerf,
        "starting optimization"
    );

    let solver = Solver::new(job.board, job.options)?;
    let result = solver.try_solve(&job.pieces)?;

    if let Some(path) = &cli.output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_listing(&result);
    }

    Ok(())
}
