//! Check content and stylesheet

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use crate::check::Report;
use crate::Site;

/// Run all checks and print the report
///
/// Returns whether the site is clean (no errors, and no warnings when `strict`).
pub fn run(site: &Site, strict: bool) -> Result<bool> {
    let report = site.check()?;
    print_report(&report);
    Ok(report.is_clean(strict))
}

fn print_report(report: &Report) {
    for diagnostic in report.sorted() {
        println!("{}", diagnostic);
    }
    println!("{}", report.summary());
}

/// Re-run the checks whenever the source directory or config changes
///
/// Runs until Ctrl+C. The watcher thread polls `stop`, so it has exited by
/// the time this returns.
pub async fn watch(site: &Site, strict: bool) -> Result<()> {
    let site = site.clone();
    let stop = Arc::new(AtomicBool::new(false));
    let mut task = tokio::task::spawn_blocking({
        let stop = stop.clone();
        move || watch_blocking(site, strict, &stop)
    });

    tokio::select! {
        result = &mut task => return result?,
        _ = tokio::signal::ctrl_c() => {}
    }

    stop.store(true, Ordering::SeqCst);
    task.await??;
    tracing::info!("Stopped watching");
    Ok(())
}

fn watch_blocking(site: Site, strict: bool, stop: &AtomicBool) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Debounce so an editor's save burst triggers one check
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if site.source_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.source_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", site.source_dir);
    }

    let config_path = site.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    while !stop.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|e| {
                    let path = e.path.to_string_lossy();
                    !path.contains(".git") && !path.contains(".DS_Store") && !path.ends_with('~')
                });
                if !relevant {
                    continue;
                }

                for event in &events {
                    tracing::info!("Changed: {}", event.path.display());
                }

                // Config may have changed too
                let site = match Site::new(&site.base_dir) {
                    Ok(site) => site,
                    Err(e) => {
                        tracing::error!("Failed to reload config: {}", e);
                        continue;
                    }
                };
                match run(&site, strict) {
                    Ok(true) => tracing::info!("Check passed"),
                    Ok(false) => tracing::warn!("Check failed"),
                    Err(e) => tracing::error!("Check failed to run: {}", e),
                }
            }
            Ok(Err(e)) => tracing::error!("Watch error: {:?}", e),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}
