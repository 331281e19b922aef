use serde::{Deserialize, Serialize};

/// Named font settings referenced from print and preview requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub font_size: u32,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl Preset {
    pub fn new(font_size: u32) -> Self {
        Self {
            font_size,
            font_family: None,
            description: String::new(),
        }
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Font family, if one is set and non-blank
    pub fn font_family(&self) -> Option<&str> {
        self.font_family
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }

    /// One-line summary used in preset listings
    pub fn summary(&self) -> String {
        match self.font_family() {
            Some(family) => format!("font size: {}, font: {}", self.font_size, family),
            None => format!("font size: {}", self.font_size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_font_family_is_absent() {
        let preset = Preset::new(24).with_font_family("  ");
        assert_eq!(preset.font_family(), None);
        assert_eq!(preset.summary(), "font size: 24");
    }

    #[test]
    fn test_summary_includes_family() {
        let preset = Preset::new(40)
            .with_font_family("DejaVu Sans")
            .with_description("Kitchen jars");
        assert_eq!(preset.font_family(), Some("DejaVu Sans"));
        assert_eq!(preset.summary(), "font size: 40, font: DejaVu Sans");
        assert_eq!(preset.description, "Kitchen jars");
    }
}
