use std::process::Stdio;

use async_trait::async_trait;
use domain::printer::LabelRenderer;
use domain::PrinterError;
use tokio::process::Command;
use tracing::{debug, error};

pub const DEFAULT_PROGRAM: &str = "ptouch-print";

/// Runs the external label printing program (`ptouch-print` by default)
///
/// No timeout is applied: a hung program blocks the calling request.
pub struct ProcessRenderer {
    program: String,
}

impl ProcessRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ProcessRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

#[async_trait]
impl LabelRenderer for ProcessRenderer {
    async fn run(&self, args: &[String]) -> Result<String, PrinterError> {
        debug!(program = %self.program, ?args, "Executing command");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                error!(program = %self.program, error = %e, "Failed to launch printer program");
                PrinterError::Launch {
                    program: self.program.clone(),
                    reason: e.to_string(),
                }
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(PrinterError::Render {
                command: format!("{} {}", self.program, args.join(" ")),
                output: format!("{} ({})", combined.trim_end(), output.status),
            });
        }

        Ok(combined)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_combines_stdout_and_stderr() {
        let renderer = ProcessRenderer::new("sh");
        let output = renderer
            .run(&args(&["-c", "echo out; echo err 1>&2"]))
            .await
            .unwrap();
        assert_eq!(output, "out\nerr\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_render_error_with_output() {
        let renderer = ProcessRenderer::new("sh");
        let result = renderer
            .run(&args(&["-c", "echo 'no printer found' 1>&2; exit 3"]))
            .await;

        match result {
            Err(PrinterError::Render { command, output }) => {
                assert!(command.starts_with("sh -c"));
                assert!(output.contains("no printer found"));
            }
            other => panic!("expected render error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let renderer = ProcessRenderer::new("definitely-not-a-real-ptouch-binary");
        let result = renderer.run(&args(&["--version"])).await;
        assert!(matches!(result, Err(PrinterError::Launch { .. })));
    }

    #[test]
    fn test_default_program() {
        assert_eq!(ProcessRenderer::default().program(), "ptouch-print");
    }
}
