use std::path::PathBuf;

use casement_common::Shape;
use clap::Parser;

/// Casement: keep a simulated window in a shared registry and watch its peers.
#[derive(Parser, Debug)]
#[command(name = "casement", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store directory override. Implies the file backend.
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Log filter override (e.g. `debug` or `casement_registry=trace`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Initial window geometry as `x,y,w,h`.
    #[arg(long, value_parser = parse_shape, default_value = "0,0,800,600")]
    pub shape: Shape,

    /// JSON metadata attached to this window's entry.
    #[arg(long, value_parser = parse_meta, default_value = "null")]
    pub meta: serde_json::Value,

    /// Drift the window a little every frame.
    #[arg(long)]
    pub wander: bool,

    /// Print the registered windows and exit.
    #[arg(long)]
    pub list: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

fn parse_shape(s: &str) -> Result<Shape, String> {
    Shape::parse(s).ok_or_else(|| format!("expected x,y,w,h but got {s:?}"))
}

fn parse_meta(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON metadata: {e}"))
}
