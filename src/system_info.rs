//! System metadata written alongside each benchmark run
//!
//! The file is free text. Only the `Desktop:` and `Run Type:` lines are
//! interpreted; the report embeds the rest verbatim.

use crate::BenchError;
use std::fs;
use std::path::Path;

const DESKTOP_PREFIX: &str = "Desktop:";
const RUN_TYPE_PREFIX: &str = "Run Type:";

/// Raw system description plus the two fields the pipeline consumes
#[derive(Debug, Clone, PartialEq)]
pub struct SystemInfo {
    /// Full file content, `None` when the file was absent
    pub raw: Option<String>,
    /// Desktop environment name (`Unknown` when not recorded)
    pub desktop: String,
    /// Run type (`unknown` when not recorded)
    pub run_type: String,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            raw: None,
            desktop: "Unknown".to_string(),
            run_type: "unknown".to_string(),
        }
    }
}

impl SystemInfo {
    pub fn parse(content: &str) -> Self {
        let mut info = SystemInfo {
            raw: Some(content.to_string()),
            ..Default::default()
        };

        for line in content.lines() {
            if let Some(value) = field_value(line, DESKTOP_PREFIX) {
                info.desktop = value;
            }
            if let Some(value) = field_value(line, RUN_TYPE_PREFIX) {
                info.run_type = value;
            }
        }

        info
    }

    /// Load from disk; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BenchError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no system info at {}", path.display());
            return Ok(Self::default());
        }
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Text for the report's metadata block
    pub fn display_text(&self) -> &str {
        self.raw.as_deref().map(str::trim).unwrap_or("N/A")
    }
}

/// Text after the first `:` of a prefixed line, trimmed
///
/// Later colons stay in the value (`Desktop: GNOME: Wayland` gives
/// `GNOME: Wayland`); the older shell tooling cut at the second colon.
fn field_value(line: &str, prefix: &str) -> Option<String> {
    if !line.starts_with(prefix) {
        return None;
    }
    line.split_once(':').map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_fields() {
        let content = "Hostname: tux\nDesktop: KDE Plasma\nRun Type: full\nKernel: 6.8.0\n";
        let info = SystemInfo::parse(content);

        assert_eq!(info.desktop, "KDE Plasma");
        assert_eq!(info.run_type, "full");
        assert_eq!(info.raw.as_deref(), Some(content));
    }

    #[test]
    fn test_value_keeps_text_after_first_colon() {
        let info = SystemInfo::parse("Desktop: GNOME: Wayland\n");
        assert_eq!(info.desktop, "GNOME: Wayland");
    }

    #[test]
    fn test_prefix_must_start_line() {
        let info = SystemInfo::parse("  Desktop: XFCE\nPrevious Desktop: LXQt\n");
        assert_eq!(info.desktop, "Unknown");
        assert_eq!(info.run_type, "unknown");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let info = SystemInfo::load(dir.path().join("system_info.txt")).unwrap();
        assert_eq!(info, SystemInfo::default());
        assert_eq!(info.display_text(), "N/A");
    }

    #[test]
    fn test_display_text_is_trimmed() {
        let info = SystemInfo::parse("\nDesktop: Sway\n\n");
        assert_eq!(info.display_text(), "Desktop: Sway");
    }
}
