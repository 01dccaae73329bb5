//! Operator-facing diagnostics.
//!
//! The assembler never logs on its own; it reports through a `Reporter`
//! handed to it by the caller. `Quiet` drops everything, `Tracing` forwards
//! to the `tracing` subscriber installed by `init_tracing`.

use tracing_subscriber::EnvFilter;

pub trait Reporter {
    /// Progress of a discovery step, e.g. "fetched 3 zones".
    fn progress(&self, message: &str);

    /// A non-fatal failure: the step yields nothing and the run continues.
    fn warn(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Quiet;

impl Reporter for Quiet {
    fn progress(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tracing;

impl Reporter for Tracing {
    fn progress(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Install a stderr subscriber. `RUST_LOG` wins when set; otherwise
/// `--verbose` shows progress and the default shows only warnings.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Collects messages in memory so tests can assert on what was reported.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorder {
    pub warnings: std::cell::RefCell<Vec<String>>,
    pub progress: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl Reporter for Recorder {
    fn progress(&self, message: &str) {
        self.progress.borrow_mut().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }
}
