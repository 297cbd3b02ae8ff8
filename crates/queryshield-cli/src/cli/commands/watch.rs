use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::time::{interval, sleep, MissedTickBehavior};

use super::evaluate::evaluate_files;
use super::output;
use crate::cli::args::WatchArgs;
use crate::exit_codes;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run(args: WatchArgs) -> Result<i32> {
    let mut inputs = WatchedInputs::new(collect_watch_paths(&args));
    let debounce = Duration::from_millis(args.debounce_ms);

    eprintln!("Watching {} input(s):", inputs.entries.len());
    for path in inputs.paths() {
        eprintln!("  - {}", path.display());
    }
    eprintln!("Press Ctrl+C to stop.\n");

    evaluate_and_report(&args, "initial");

    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                eprintln!("Stopping watch loop.");
                return Ok(exit_codes::SUCCESS);
            }
            _ = ticker.tick() => {}
        }

        let mut changed = inputs.changed();
        if changed.is_empty() {
            continue;
        }
        changed.extend(inputs.settle(debounce).await);
        changed.sort();
        changed.dedup();

        if args.clear {
            print!("\x1B[2J\x1B[H");
            let _ = std::io::stdout().flush();
        }
        evaluate_and_report(&args, &describe_trigger(&changed));
    }
}

fn describe_trigger(changed: &[PathBuf]) -> String {
    match changed {
        [] => "filesystem change".to_string(),
        [one] => format!("triggered by {}", one.display()),
        [first, rest @ ..] => format!("triggered by {} and {} more", first.display(), rest.len()),
    }
}

/// One evaluation pass. Failures are reported and the loop keeps going, so a
/// half-written report does not end the session.
fn evaluate_and_report(args: &WatchArgs, reason: &str) {
    let stamp = || chrono::Local::now().format("%H:%M:%S");
    eprintln!("[{}] Evaluating ({reason})", stamp());

    match evaluate_files(&args.as_evaluate()) {
        Ok(eval) => {
            print!("{}", output::evaluation_text(&eval));
            let code = if eval.has_violations() {
                exit_codes::VIOLATIONS
            } else {
                exit_codes::SUCCESS
            };
            eprintln!("Result: exit {code}");
        }
        Err(e) => {
            tracing::warn!(error = %e, "evaluation failed");
            eprintln!("evaluation failed: {e:#} (exit {})", exit_codes::for_error(&e));
        }
    }
    eprintln!("[{}] Waiting for changes...", stamp());
}

/// Size and mtime of a file, or `None` when it does not exist.
type Fingerprint = Option<(u64, Option<SystemTime>)>;

fn fingerprint(path: &Path) -> Fingerprint {
    std::fs::metadata(path)
        .ok()
        .map(|meta| (meta.len(), meta.modified().ok()))
}

/// Input files plus the fingerprint each had at the last look.
struct WatchedInputs {
    entries: Vec<(PathBuf, Fingerprint)>,
}

impl WatchedInputs {
    fn new(paths: Vec<PathBuf>) -> Self {
        let entries = paths
            .into_iter()
            .map(|p| {
                let fp = fingerprint(&p);
                (p, fp)
            })
            .collect();
        Self { entries }
    }

    fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter().map(|(p, _)| p)
    }

    /// Paths whose fingerprint moved since the last call; records the new state.
    fn changed(&mut self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for (path, last) in &mut self.entries {
            let now = fingerprint(path);
            if now != *last {
                *last = now;
                out.push(path.clone());
            }
        }
        out
    }

    /// Wait until a whole `quiet` window passes without changes; returns
    /// everything that changed meanwhile.
    async fn settle(&mut self, quiet: Duration) -> Vec<PathBuf> {
        let mut seen = Vec::new();
        loop {
            sleep(quiet).await;
            let more = self.changed();
            if more.is_empty() {
                return seen;
            }
            seen.extend(more);
        }
    }
}

pub(crate) fn collect_watch_paths(args: &WatchArgs) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = std::iter::once(args.report.report.clone())
        .chain(args.budgets.clone())
        .chain(args.baseline.clone())
        .collect();
    paths.sort();
    paths.dedup();
    paths
}
