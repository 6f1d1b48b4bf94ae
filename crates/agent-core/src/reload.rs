//! Config-driven reload: watch the configuration file and swap in a fresh
//! session supervisor whenever it changes.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tether_types::TetherConfig;
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{config, error::AgentResult, supervisor};

/// Delay between seeing a config event and re-reading the file, so editors
/// that write in several steps do not hand us a half-written document.
const SETTLE_DELAY: Duration = Duration::from_millis(500);

struct SupervisorHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

fn start_supervisor(config: TetherConfig) -> SupervisorHandle {
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(supervisor::run(config.ssh, shutdown.clone()));
    SupervisorHandle { shutdown, task }
}

async fn stop_supervisor(handle: SupervisorHandle) {
    handle.shutdown.cancel();
    if let Err(err) = handle.task.await {
        warn!(?err, "session supervisor task panicked");
    }
}

/// Run the initial supervisor and restart it under a freshly loaded
/// configuration every time the config file changes. The previous
/// supervisor is cancelled and joined before its replacement starts, so a
/// reload never leaks the old session's listeners.
pub async fn run(config_path: PathBuf, initial: TetherConfig) -> AgentResult<()> {
    let (tx, mut rx) = mpsc::channel::<notify::Result<Event>>(16);
    let mut watcher = RecommendedWatcher::new(
        move |event| {
            let _ = tx.blocking_send(event);
        },
        notify::Config::default(),
    )?;
    // watch the parent directory: editors that replace the file on save
    // would silently drop a watch on the file itself
    let watch_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let mut current = start_supervisor(initial);

    while let Some(event) = rx.recv().await {
        match event {
            Ok(event) if touches(&event, &config_path) => {}
            Ok(_) => continue,
            Err(err) => {
                warn!(error = %err, "config watcher error");
                continue;
            }
        }
        sleep(SETTLE_DELAY).await;
        // collapse the burst of events a single save produces
        while rx.try_recv().is_ok() {}

        match config::load_config(&config_path) {
            Ok(config) => {
                info!("configuration changed; restarting session supervisor");
                stop_supervisor(current).await;
                current = start_supervisor(config);
            }
            Err(err) => error!(error = %err, "ignoring config update that failed to load"),
        }
    }

    stop_supervisor(current).await;
    Ok(())
}

/// True when `event` refers to the watched config file.
fn touches(event: &Event, config_path: &Path) -> bool {
    let Some(name) = config_path.file_name() else {
        return false;
    };
    event.paths.iter().any(|path| path.file_name() == Some(name))
}
