use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use domain::{LabelRenderer, Preset, PrinterError, RelayPort, RequesterId, RetryPolicy};
use tracing::{debug, error, info, warn};

use super::builder::LabelArgs;
use super::power_manager::PowerManager;

pub const UNKNOWN_VERSION: &str = "Unknown version";

/// Caller-supplied knobs for a printer session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub retry: RetryPolicy,
    pub shutdown_delay: Duration,
    pub drafts_folder: PathBuf,
    /// Permission bits for a newly created drafts folder (unix only)
    pub folder_permissions: u32,
    pub default_font_size: u32,
}

/// Every printer action available to the rest of the application
///
/// Each operation first makes sure the printer is powered; a power failure
/// fails the whole operation. Operations must not be called after `close`.
pub struct PrinterSession {
    power: Arc<PowerManager>,
    renderer: Arc<dyn LabelRenderer>,
    drafts_folder: PathBuf,
    folder_permissions: u32,
    default_font_size: u32,
}

impl PrinterSession {
    /// Must be called from within a Tokio runtime when a relay is given
    pub fn new(
        renderer: Arc<dyn LabelRenderer>,
        relay: Option<Arc<dyn RelayPort>>,
        settings: SessionSettings,
    ) -> Self {
        if relay.is_none() {
            info!("No relay configured, printer assumed always powered");
        }

        let power = PowerManager::new(
            relay,
            renderer.clone(),
            settings.retry,
            settings.shutdown_delay,
        );

        Self {
            power,
            renderer,
            drafts_folder: settings.drafts_folder,
            folder_permissions: settings.folder_permissions,
            default_font_size: settings.default_font_size,
        }
    }

    pub fn power(&self) -> &PowerManager {
        &self.power
    }

    pub fn default_font_size(&self) -> u32 {
        self.default_font_size
    }

    /// Power up, log the driver version and return the printer info
    ///
    /// A failed power-on is only logged here; a failed info request means the
    /// printer is unusable and is returned.
    pub async fn initialize(&self) -> Result<String, PrinterError> {
        if let Err(e) = self.power.ensure_power_on().await {
            warn!(error = %e, "Could not ensure printer is on during initialization");
        }

        let version = self.version().await;
        info!(version = %version.trim(), "Printer version");

        let info = self.info().await.inspect_err(|e| {
            error!(error = %e, "Error getting printer info");
        })?;
        info!(info = %info.trim(), "Printer info");
        Ok(info)
    }

    /// Driver version; never fails, falls back to "Unknown version"
    pub async fn version(&self) -> String {
        match self.exec(LabelArgs::new().version().build()).await {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "Version request failed");
                UNKNOWN_VERSION.to_string()
            }
        }
    }

    pub async fn info(&self) -> Result<String, PrinterError> {
        self.exec(LabelArgs::new().info().build()).await
    }

    pub async fn print_label(&self, text: &str, font_size: u32) -> Result<(), PrinterError> {
        let args = LabelArgs::new().font_size(font_size).text(text).build();
        let output = self.exec(args).await?;

        debug!(output = %output.trim(), "Printer output");
        info!(label = %text, font_size, "Label printed successfully");
        Ok(())
    }

    pub async fn print_default(&self, text: &str) -> Result<(), PrinterError> {
        self.print_label(text, self.default_font_size).await
    }

    pub async fn print_with_preset(&self, text: &str, preset: &Preset) -> Result<(), PrinterError> {
        let args = LabelArgs::new().preset(preset).text(text).build();
        let output = self.exec(args).await?;

        debug!(output = %output.trim(), "Printer output");
        info!(
            label = %text,
            font_size = preset.font_size,
            font = preset.font_family().unwrap_or("default"),
            "Label printed successfully with preset"
        );
        Ok(())
    }

    /// Render a PNG preview with the default font size and return its bytes
    pub async fn preview_label(&self, text: &str, requester: RequesterId) -> Result<Vec<u8>, PrinterError> {
        let path = self.draft_path(requester);
        let args = LabelArgs::new()
            .font_size(self.default_font_size)
            .text(text)
            .write_png(&path)
            .build();
        self.render_preview(text, args, &path).await
    }

    pub async fn preview_with_preset(
        &self,
        text: &str,
        requester: RequesterId,
        preset: &Preset,
    ) -> Result<Vec<u8>, PrinterError> {
        let path = self.draft_path(requester);
        let args = LabelArgs::new()
            .preset(preset)
            .text(text)
            .write_png(&path)
            .build();
        self.render_preview(text, args, &path).await
    }

    /// Where the preview for `requester` is rendered
    pub fn draft_path(&self, requester: RequesterId) -> PathBuf {
        self.drafts_folder.join(requester.draft_file_name())
    }

    /// Disarm auto-shutdown and power the printer down; never fails
    pub async fn close(&self) {
        self.power.shutdown().await;
        info!("Printer session closed");
    }

    async fn render_preview(
        &self,
        text: &str,
        args: Vec<String>,
        path: &Path,
    ) -> Result<Vec<u8>, PrinterError> {
        self.ensure_drafts_folder().await?;
        self.exec(args).await?;

        let image = tokio::fs::read(path)
            .await
            .map_err(|e| PrinterError::FileSystem {
                stage: "read label preview",
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        info!(label = %text, bytes = image.len(), "Label previewed successfully");
        Ok(image)
    }

    async fn ensure_drafts_folder(&self) -> Result<(), PrinterError> {
        if tokio::fs::try_exists(&self.drafts_folder).await.unwrap_or(false) {
            return Ok(());
        }

        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(self.folder_permissions);

        builder
            .create(&self.drafts_folder)
            .await
            .map_err(|e| PrinterError::FileSystem {
                stage: "create drafts folder",
                path: self.drafts_folder.display().to_string(),
                reason: e.to_string(),
            })?;

        info!(path = %self.drafts_folder.display(), "Created drafts folder");
        Ok(())
    }

    async fn exec(&self, args: Vec<String>) -> Result<String, PrinterError> {
        self.power.ensure_power_on().await?;
        self.renderer.run(&args).await
    }
}
