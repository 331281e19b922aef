use async_trait::async_trait;

use crate::error::PrinterError;

/// External label rendering/printing program
///
/// Runs once per call with the given argument vector and returns stdout and
/// stderr combined. A non-zero exit is the only failure signal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabelRenderer: Send + Sync {
    async fn run(&self, args: &[String]) -> Result<String, PrinterError>;
}
