//! Shared CLI definitions for datavis.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

/// Named chart palette
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum PaletteName {
    /// Sky blue lines on a translucent blue fill
    #[default]
    Ocean,
    /// Emerald lines with a high-contrast slice set
    Neon,
    /// Orange and rose tones
    Sunset,
    /// Purple and lavender tones
    Violet,
}

impl PaletteName {
    pub const ALL: [Self; 4] = [Self::Ocean, Self::Neon, Self::Sunset, Self::Violet];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ocean => "ocean",
            Self::Neon => "neon",
            Self::Sunset => "sunset",
            Self::Violet => "violet",
        }
    }

    /// Parse a palette name (case-insensitive). Returns None for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ocean" => Some(Self::Ocean),
            "neon" => Some(Self::Neon),
            "sunset" => Some(Self::Sunset),
            "violet" => Some(Self::Violet),
            _ => None,
        }
    }
}

/// Command-line arguments for datavis
#[derive(Clone, Parser, Debug, Default)]
#[command(
    name = "datavis",
    version,
    about = "Data Visualization Studio in the Terminal",
    long_about = "Upload a CSV or Excel file to a datavis backend, preview the rows it returns, \
                  and chart them as bar, line, pie or scatter plots with summary statistics, \
                  palettes, zoom/pan and PNG export."
)]
pub struct Args {
    /// Base URL of the backend that parses uploaded files (default: http://127.0.0.1:8000)
    #[arg(long = "backend-url", value_name = "URL")]
    pub backend_url: Option<String>,

    /// Upload this file as soon as the application starts
    #[arg(long = "upload", value_name = "PATH")]
    pub upload: Option<PathBuf>,

    /// Query the backend liveness endpoint and show its message on the landing page
    #[arg(long = "check-backend", action)]
    pub check_backend: bool,

    /// Directory where exported PNG charts are written (default: current directory)
    #[arg(long = "export-dir", value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Initial chart palette
    #[arg(long = "palette", value_enum)]
    pub palette: Option<PaletteName>,

    /// Enable debug mode to show operational information and verbose logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Log filter written to the log file (e.g. "info", "datavis=debug"). Overrides config and RUST_LOG
    #[arg(long = "log-level", value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Remove the stored dataset and log file, then exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/datavis/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let mut parts = Vec::new();
        if let Some(s) = arg.get_short() {
            parts.push(format!("-{s}"));
        }
        if let Some(l) = arg.get_long() {
            parts.push(format!("--{l}"));
        }
        let op = parts.join(", ");
        let placeholder: String = if arg.get_action().takes_values() {
            arg.get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default()
        } else {
            String::new()
        };
        let option_str = if placeholder.is_empty() {
            op
        } else {
            format!("{op} {placeholder}")
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_from_name() {
        assert_eq!(PaletteName::from_name("ocean"), Some(PaletteName::Ocean));
        assert_eq!(PaletteName::from_name(" Neon "), Some(PaletteName::Neon));
        assert_eq!(PaletteName::from_name("SUNSET"), Some(PaletteName::Sunset));
        assert_eq!(PaletteName::from_name("violet"), Some(PaletteName::Violet));
        assert_eq!(PaletteName::from_name("plaid"), None);
    }

    #[test]
    fn test_palette_names_round_trip() {
        for p in PaletteName::ALL {
            assert_eq!(PaletteName::from_name(p.as_str()), Some(p));
        }
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "datavis",
            "--backend-url",
            "http://localhost:9000",
            "--upload",
            "people.csv",
            "--palette",
            "sunset",
            "--debug",
        ]);
        assert_eq!(args.backend_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(args.upload, Some(PathBuf::from("people.csv")));
        assert_eq!(args.palette, Some(PaletteName::Sunset));
        assert!(args.debug);
        assert!(!args.clear_cache);
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["datavis", "--force"]).is_err());
        assert!(Args::try_parse_from(["datavis", "--generate-config", "--force"]).is_ok());
    }

    #[test]
    fn test_options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("`--backend-url <URL>`"));
        assert!(md.contains("`--clear-cache`"));
        assert!(!md.contains("`--help`"));
    }
}
