use std::path::Path;

use domain::Preset;

pub const VERSION_ARG: &str = "--version";
pub const INFO_ARG: &str = "--info";
pub const TEXT_ARG: &str = "--text";
pub const FONT_SIZE_ARG: &str = "--fontsize";
pub const FONT_ARG: &str = "--font";
pub const WRITE_PNG_ARG: &str = "--writepng";

/// Argument vector for one invocation of the label printing program
pub struct LabelArgs {
    args: Vec<String>,
}

impl LabelArgs {
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    pub fn version(self) -> Self {
        self.flag(VERSION_ARG)
    }

    /// Status inquiry, also used as the liveness probe
    pub fn info(self) -> Self {
        self.flag(INFO_ARG)
    }

    pub fn font(self, family: &str) -> Self {
        self.flag(FONT_ARG).value(family)
    }

    pub fn font_size(self, size: u32) -> Self {
        self.flag(FONT_SIZE_ARG).value(&size.to_string())
    }

    /// Font family (if any) followed by the preset's size
    pub fn preset(self, preset: &Preset) -> Self {
        let with_font = match preset.font_family() {
            Some(family) => self.font(family),
            None => self,
        };
        with_font.font_size(preset.font_size)
    }

    pub fn text(self, text: &str) -> Self {
        self.flag(TEXT_ARG).value(text)
    }

    /// Render to a PNG file instead of printing
    pub fn write_png(self, path: &Path) -> Self {
        self.flag(WRITE_PNG_ARG).value(&path.to_string_lossy())
    }

    pub fn build(self) -> Vec<String> {
        self.args
    }

    fn flag(mut self, flag: &str) -> Self {
        self.args.push(flag.to_string());
        self
    }

    fn value(mut self, value: &str) -> Self {
        self.args.push(value.to_string());
        self
    }
}

impl Default for LabelArgs {
    fn default() -> Self {
        Self::new()
    }
}
