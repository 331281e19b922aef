use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use domain::printer::LabelRenderer;
use domain::PrinterError;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// PNG signature written in front of fake preview images
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone)]
pub struct RendererCall {
    pub args: Vec<String>,
    pub at: Instant,
}

/// Scriptable stand-in for the printing program
///
/// Answers `--version` and `--info`/`--status`, fails a configurable number of
/// probes first, and writes a fake PNG for `--writepng <path>`.
#[derive(Clone)]
pub struct MockRenderer {
    pub calls: Arc<Mutex<Vec<RendererCall>>>,
    probe_failures: Arc<AtomicU32>,
    fail_renders: Arc<AtomicBool>,
    fail_version: Arc<AtomicBool>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            probe_failures: Arc::new(AtomicU32::new(0)),
            fail_renders: Arc::new(AtomicBool::new(false)),
            fail_version: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fail the next `count` status probes
    pub fn fail_probes(&self, count: u32) {
        self.probe_failures.store(count, Ordering::SeqCst);
    }

    pub fn set_fail_renders(&self, fail: bool) {
        self.fail_renders.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_version(&self, fail: bool) {
        self.fail_version.store(fail, Ordering::SeqCst);
    }

    pub async fn probe_times(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| is_probe(&c.args))
            .map(|c| c.at)
            .collect()
    }

    pub async fn recorded_args(&self) -> Vec<Vec<String>> {
        self.calls.lock().await.iter().map(|c| c.args.clone()).collect()
    }

    fn failure(args: &[String], output: &str) -> PrinterError {
        PrinterError::Render {
            command: format!("mock {}", args.join(" ")),
            output: output.to_string(),
        }
    }
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_probe(args: &[String]) -> bool {
    args.iter().any(|a| a == "--info" || a == "--status")
}

#[async_trait]
impl LabelRenderer for MockRenderer {
    async fn run(&self, args: &[String]) -> Result<String, PrinterError> {
        self.calls.lock().await.push(RendererCall {
            args: args.to_vec(),
            at: Instant::now(),
        });

        if args.iter().any(|a| a == "--version") {
            if self.fail_version.load(Ordering::SeqCst) {
                return Err(Self::failure(args, "version unavailable"));
            }
            return Ok("mock-ptouch-print 1.0\n".to_string());
        }

        if is_probe(args) {
            let remaining = self.probe_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.probe_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(Self::failure(args, "No P-Touch printer found on USB"));
            }
            return Ok("PT-P710BT found on USB bus\nmaximum printing width is 128 px\n".to_string());
        }

        if self.fail_renders.load(Ordering::SeqCst) {
            return Err(Self::failure(args, "simulated render failure"));
        }

        if let Some(pos) = args.iter().position(|a| a == "--writepng") {
            let path = args
                .get(pos + 1)
                .ok_or_else(|| Self::failure(args, "--writepng needs a path"))?;
            let mut image = PNG_SIGNATURE.to_vec();
            image.extend_from_slice(args.join(" ").as_bytes());
            tokio::fs::write(path, image)
                .await
                .map_err(|e| Self::failure(args, &e.to_string()))?;
        }

        Ok(String::new())
    }
}
