use super::service::{now_ms, App};
use std::{sync::Arc, thread::sleep, time::Duration};

/// Arm the periodic incremental import. Each tick asks every source for
/// records inside the configured recency window, then re-reads bookmarks.
/// The loop sleeps only after a tick has settled, so ticks never overlap.
pub fn start(app: Arc<App>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || run(app))
}

fn run(app: Arc<App>) {
    loop {
        let (interval, window_secs) = {
            let config = app.config();
            let config = config.read().unwrap();
            (
                Duration::from_secs(config.import_interval_secs),
                config.recent_window_secs,
            )
        };

        let since = now_ms() - window_secs as i64 * 1000;
        match app.import_recent_history(since) {
            Ok(outcome) if outcome.new_records > 0 => {
                log::info!(
                    "imported {} new records ({} total)",
                    outcome.new_records,
                    outcome.total
                );
            }
            Ok(_) => log::debug!("no new history this tick"),
            Err(err) => log::error!("periodic history import failed: {err}"),
        }

        if let Err(err) = app.import_bookmarks() {
            log::error!("periodic bookmark import failed: {err}");
        }

        sleep(interval);
    }
}
