use tracing::{error, info, warn};

use crate::{
    WatchArgs,
    build::{Builder, ChangeFilter, DEFAULT_DEBOUNCE, FileWatcher, WatchEvent},
};

pub async fn run(args: &WatchArgs) -> Result<(), anyhow::Error> {
    let root = std::env::current_dir()?;

    // Build once up front; a broken project is reported before watching starts
    let builder = Builder::new(root.clone(), args.build.options());
    let report = builder.build().await?;

    let filter = ChangeFilter::new(&root, report.output_dir.clone(), args.build.git);
    let watcher = FileWatcher::new(&root, filter, DEFAULT_DEBOUNCE)?;
    info!("Watching {} for changes...", root.display());

    // The watcher blocks, so it lives on the blocking pool and drives
    // rebuilds through the current runtime
    let handle = tokio::runtime::Handle::current();
    tokio::task::spawn_blocking(move || {
        while let Some(event) = watcher.recv() {
            match event {
                WatchEvent::FilesChanged(changes) => {
                    info!("Detected {} change(s), rebuilding...", changes.len());
                    if let Err(e) = handle.block_on(builder.build()) {
                        error!("Build error: {}", e);
                    }
                }
                WatchEvent::Error(e) => {
                    warn!("Watch error: {}", e);
                }
            }
        }
    })
    .await?;

    Ok(())
}
