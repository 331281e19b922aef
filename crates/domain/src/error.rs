use thiserror::Error;

/// Failure of a relay output write
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("Failed to initialize relay on GPIO{pin}: {reason}")]
    InitFailed { pin: u32, reason: String },

    #[error("Failed to write relay on GPIO{pin}: {reason}")]
    WriteFailed { pin: u32, reason: String },
}

/// Errors surfaced by printer operations
///
/// Every variant names the stage that failed. Only the liveness probe inside
/// power-on is retried; everything else reaches the caller as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrinterError {
    #[error("Failed to turn on printer via relay: {0}")]
    RelayWrite(#[from] RelayError),

    #[error("Printer did not respond after {attempts} attempt(s): {last_error}")]
    LivenessTimeout { attempts: u32, last_error: String },

    #[error("Error executing command '{command}', output: {output}")]
    Render { command: String, output: String },

    #[error("Failed to launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    #[error("Failed to {stage} '{path}': {reason}")]
    FileSystem {
        stage: &'static str,
        path: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, PrinterError>;
