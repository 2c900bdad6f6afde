//! One simulated window living in the shared registry until it is
//! interrupted or terminated.

use std::path::PathBuf;

use casement_common::{CasementError, WindowEntry};
use casement_config::{resolve_store_dir, CasementConfig, StoreBackend};
use casement_registry::{SharedShape, WindowRegistry, WINDOWS_KEY};
use casement_store::{FileStore, MemoryStore, SharedStore};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cli::Args;
use crate::shutdown::Shutdown;

/// Pixels moved per frame while wandering.
const WANDER_STEP: f64 = 2.0;

/// Frames per full wander loop.
const WANDER_PERIOD: u64 = 240;

/// Open the store named by `--store` or the config.
fn open_store(args: &Args, config: &CasementConfig) -> Result<Box<dyn SharedStore>, CasementError> {
    let capacity = config.store.channel_capacity as usize;
    let dir: Option<PathBuf> = match (&args.store, config.store.backend) {
        (Some(dir), _) => Some(dir.clone()),
        (None, StoreBackend::File) => Some(resolve_store_dir(&config.store)?),
        (None, StoreBackend::Memory) => None,
    };

    match dir {
        Some(dir) => Ok(Box::new(FileStore::open_with_capacity(dir, capacity)?)),
        None => {
            warn!("using an in-memory store; no other process will see this window");
            Ok(Box::new(MemoryStore::with_capacity(capacity)))
        }
    }
}

/// Print the stored window list, one entry per line.
fn print_windows(store: &dyn SharedStore) -> Result<(), CasementError> {
    let Some(raw) = store.get(WINDOWS_KEY)? else {
        println!("no windows registered");
        return Ok(());
    };
    let windows: Vec<WindowEntry> = serde_json::from_str::<Option<_>>(&raw)
        .map_err(|e| CasementError::Other(format!("stored {WINDOWS_KEY} is unreadable: {e}")))?
        .unwrap_or_default();

    if windows.is_empty() {
        println!("no windows registered");
    }
    for window in &windows {
        println!("{}\t{}\t{}", window.id, window.shape, window.meta_data);
    }
    Ok(())
}

/// Step along a square loop so peers see steady movement.
fn wander_offset(frame: u64) -> (f64, f64) {
    match (frame % WANDER_PERIOD) * 4 / WANDER_PERIOD {
        0 => (WANDER_STEP, 0.0),
        1 => (0.0, WANDER_STEP),
        2 => (-WANDER_STEP, 0.0),
        _ => (0.0, -WANDER_STEP),
    }
}

fn describe(windows: &[WindowEntry]) -> String {
    windows
        .iter()
        .map(|w| w.id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn run(args: &Args, config: &CasementConfig) -> Result<(), CasementError> {
    let store = open_store(args, config)?;
    if args.list {
        return print_windows(store.as_ref());
    }

    let mut shutdown = Shutdown::install()?;
    let shapes = SharedShape::new(args.shape);
    let mut registry = WindowRegistry::new(store, shapes.clone());

    registry.set_peer_list_changed_callback(|windows| {
        info!(windows = windows.len(), "peers changed: [{}]", describe(windows));
    });
    registry.set_shape_changed_callback(|entry| {
        debug!(window = %entry.id, shape = %entry.shape, "moved");
    });

    let entry = registry.register(args.meta.clone())?;
    info!(
        window = %entry.id,
        context = registry.context_id().short(),
        "joined with {} window(s): [{}]",
        registry.windows().len(),
        describe(registry.windows())
    );

    let mut ticker = tokio::time::interval(config.sync.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut frame: u64 = 0;
    let result = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = registry.pump_events() {
                    break Err(e);
                }
                if args.wander {
                    let (dx, dy) = wander_offset(frame);
                    shapes.move_by(dx, dy);
                }
                frame = frame.wrapping_add(1);
                if let Err(e) = registry.poll_shape_change() {
                    break Err(e);
                }
            }
            signal = shutdown.recv() => {
                info!("received {signal}, leaving registry");
                break Ok(());
            }
        }
    };

    // Leave the registry even if the loop failed.
    let left = registry.deregister();
    result?;
    if !left? {
        debug!("own entry was already gone on exit");
    }
    Ok(())
}
