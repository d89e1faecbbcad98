use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::cli::Args;
use crate::palette::Palette;

/// Location of the user's `config.toml` (`~/.config/datavis` unless overridden).
#[derive(Clone, Debug)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

const CONFIG_FILE: &str = "config.toml";

impl ConfigManager {
    /// Use `config_dir` instead of the platform config directory (tests)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn new(app_name: &str) -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| eyre!("No config directory on this platform"))?;
        Ok(Self::with_dir(base.join(app_name)))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// `name` inside the config directory
    pub fn config_path(&self, name: &str) -> PathBuf {
        self.config_dir.join(name)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        Ok(())
    }

    /// The commented default `config.toml`
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write the default template. An existing file is kept unless `force` is set.
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let path = self.config_path(CONFIG_FILE);
        if path.exists() && !force {
            return Err(eyre!(
                "{} already exists; pass --force to overwrite it",
                path.display()
            ));
        }
        self.ensure_config_dir()?;
        std::fs::write(&path, self.generate_default_config())?;
        tracing::info!(path = %path.display(), "default config written");
        Ok(path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub backend: BackendConfig,
    pub display: DisplayConfig,
    pub export: ExportConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub upload_path: String,
    /// Request timeout in seconds; 0 waits indefinitely.
    pub timeout_secs: u64,
    pub check_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub default_row_count: usize,
    pub default_palette: String,
    pub preview_page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub directory: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub error: String,
    pub warning: String,
    pub dimmed: String,
    pub background: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub keybind_hints: String,
    pub table_header: String,
    pub table_border: String,
    pub modal_border: String,
    pub modal_border_active: String,
    pub nav_active: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive such as "info" or "datavis=debug". None means "warn".
    pub level: Option<String>,
    /// Log file path. None means datavis.log in the cache directory.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            backend: BackendConfig::default(),
            display: DisplayConfig::default(),
            export: ExportConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".to_string(),
            upload_path: "/upload".to_string(),
            timeout_secs: 0,
            check_on_start: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_row_count: crate::chart_data::DEFAULT_SHOW_COUNT,
            default_palette: "ocean".to_string(),
            preview_page_size: 10,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            width: 900,
            height: 500,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            dimmed: "dark_gray".to_string(),
            background: "reset".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            keybind_hints: "cyan".to_string(),
            table_header: "white".to_string(),
            table_border: "cyan".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_active: "yellow".to_string(),
            nav_active: "#38bdf8".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_from(&manager)
    }

    /// Load configuration using the config file managed by `manager`
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(Self::load_user_config(manager)?);
        config.validate()?;
        tracing::debug!(dir = %manager.config_dir().display(), "configuration loaded");
        Ok(config)
    }

    fn load_user_config(manager: &ConfigManager) -> Result<AppConfig> {
        let config_path = manager.config_path(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.backend.merge(other.backend);
        self.display.merge(other.display);
        self.export.merge(other.export);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.logging.merge(other.logging);
    }

    /// Apply command-line overrides (CLI takes precedence over config files)
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(url) = &args.backend_url {
            self.backend.url = url.clone();
        }
        if args.check_backend {
            self.backend.check_on_start = true;
        }
        if let Some(dir) = &args.export_dir {
            self.export.directory = Some(dir.clone());
        }
        if let Some(palette) = args.palette {
            self.display.default_palette = palette.as_str().to_string();
        }
        if let Some(level) = &args.log_level {
            self.logging.level = Some(level.clone());
        } else if args.debug && self.logging.level.is_none() {
            self.logging.level = Some("debug".to_string());
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        if !self.backend.url.starts_with("http://") && !self.backend.url.starts_with("https://")
        {
            return Err(eyre!(
                "Invalid backend url: {}. Must start with http:// or https://",
                self.backend.url
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if self.display.default_row_count == 0 {
            return Err(eyre!("default_row_count must be greater than 0"));
        }

        if Palette::from_name(&self.display.default_palette).is_none() {
            return Err(eyre!(
                "Invalid default_palette: {}. Must be one of ocean, neon, sunset, violet",
                self.display.default_palette
            ));
        }

        if self.export.width == 0 || self.export.height == 0 {
            return Err(eyre!("export width and height must be greater than 0"));
        }

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }

    /// Full upload endpoint URL
    pub fn upload_url(&self) -> String {
        join_url(&self.backend.url, &self.backend.upload_path)
    }

    pub fn default_palette(&self) -> Palette {
        Palette::from_name(&self.display.default_palette).unwrap_or_default()
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Join a base URL and a path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl BackendConfig {
    pub fn merge(&mut self, other: Self) {
        let default = BackendConfig::default();
        if other.url != default.url {
            self.url = other.url;
        }
        if other.upload_path != default.upload_path {
            self.upload_path = other.upload_path;
        }
        if other.timeout_secs != default.timeout_secs {
            self.timeout_secs = other.timeout_secs;
        }
        if other.check_on_start != default.check_on_start {
            self.check_on_start = other.check_on_start;
        }
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.default_row_count != default.default_row_count {
            self.default_row_count = other.default_row_count;
        }
        if other.default_palette != default.default_palette {
            self.default_palette = other.default_palette;
        }
        if other.preview_page_size != default.preview_page_size {
            self.preview_page_size = other.preview_page_size;
        }
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ExportConfig::default();
        if other.directory.is_some() {
            self.directory = other.directory;
        }
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.file.is_some() {
            self.file = other.file;
        }
    }
}

impl ColorConfig {
    /// Theme key and configured value of every color
    fn entries(&self) -> [(&'static str, &String); 16] {
        [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("success", &self.success),
            ("error", &self.error),
            ("warning", &self.warning),
            ("dimmed", &self.dimmed),
            ("background", &self.background),
            ("controls_bg", &self.controls_bg),
            ("text_primary", &self.text_primary),
            ("text_secondary", &self.text_secondary),
            ("keybind_hints", &self.keybind_hints),
            ("table_header", &self.table_header),
            ("table_border", &self.table_border),
            ("modal_border", &self.modal_border),
            ("modal_border_active", &self.modal_border_active),
            ("nav_active", &self.nav_active),
        ]
    }

    fn entries_mut(&mut self) -> [(&'static str, &mut String); 16] {
        [
            ("primary", &mut self.primary),
            ("secondary", &mut self.secondary),
            ("success", &mut self.success),
            ("error", &mut self.error),
            ("warning", &mut self.warning),
            ("dimmed", &mut self.dimmed),
            ("background", &mut self.background),
            ("controls_bg", &mut self.controls_bg),
            ("text_primary", &mut self.text_primary),
            ("text_secondary", &mut self.text_secondary),
            ("keybind_hints", &mut self.keybind_hints),
            ("table_header", &mut self.table_header),
            ("table_border", &mut self.table_border),
            ("modal_border", &mut self.modal_border),
            ("modal_border_active", &mut self.modal_border_active),
            ("nav_active", &mut self.nav_active),
        ]
    }

    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        let defaults = default.entries();
        let theirs = other.entries();
        for (i, (_, mine)) in self.entries_mut().into_iter().enumerate() {
            if theirs[i].1 != defaults[i].1 {
                *mine = theirs[i].1.clone();
            }
        }
    }
}

/// Turns configured color strings into terminal colors, downsampling RGB to what the terminal supports.
pub struct ColorParser {
    true_color: bool,
    ansi_256: bool,
    no_color: bool,
}

/// Accepted color names after normalization (lowercase, `_` separators, `grey` spelled `gray`).
const NAMED_COLORS: [(&str, Color); 21] = [
    ("black", Color::Black),
    ("red", Color::Red),
    ("green", Color::Green),
    ("yellow", Color::Yellow),
    ("blue", Color::Blue),
    ("magenta", Color::Magenta),
    ("cyan", Color::Cyan),
    ("white", Color::White),
    ("bright_black", Color::Indexed(8)),
    ("bright_red", Color::Indexed(9)),
    ("bright_green", Color::Indexed(10)),
    ("bright_yellow", Color::Indexed(11)),
    ("bright_blue", Color::Indexed(12)),
    ("bright_magenta", Color::Indexed(13)),
    ("bright_cyan", Color::Indexed(14)),
    ("bright_white", Color::Indexed(15)),
    ("gray", Color::Indexed(8)),
    ("dark_gray", Color::Indexed(8)),
    ("light_gray", Color::Indexed(7)),
    ("reset", Color::Reset),
    ("default", Color::Reset),
];

fn normalize_color_name(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| c == ' ' || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| if part == "grey" { "gray" } else { part })
        .collect::<Vec<_>>()
        .join("_")
}

impl ColorParser {
    /// Detect capabilities from `NO_COLOR` and the stdout stream.
    pub fn new() -> Self {
        let support = supports_color::on(Stream::Stdout);
        Self {
            true_color: support.as_ref().is_some_and(|s| s.has_16m),
            ansi_256: support.as_ref().is_some_and(|s| s.has_256),
            no_color: std::env::var_os("NO_COLOR").is_some(),
        }
    }

    /// Parser with fixed capabilities (primarily for testing)
    pub fn with_capabilities(true_color: bool, ansi_256: bool, no_color: bool) -> Self {
        Self {
            true_color,
            ansi_256,
            no_color,
        }
    }

    /// Accepts `#rrggbb`, `indexed(N)` or a color name.
    pub fn parse(&self, s: &str) -> Result<Color> {
        let value = s.trim();
        let color = if value.starts_with('#') {
            let (r, g, b) = parse_hex(value)?;
            self.rgb(r, g, b)
        } else if let Some(index) = value
            .to_lowercase()
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let n = index
                .trim()
                .parse::<u8>()
                .map_err(|_| eyre!("Invalid indexed color '{}': expected indexed(0-255)", value))?;
            Color::Indexed(n)
        } else {
            let name = normalize_color_name(value);
            NAMED_COLORS
                .iter()
                .find(|(known, _)| *known == name)
                .map(|(_, color)| *color)
                .ok_or_else(|| {
                    eyre!(
                        "Unknown color '{}'. Use a name (red, bright_blue, dark_gray, ...), \
                         indexed(N) or #rrggbb",
                        value
                    )
                })?
        };
        Ok(if self.no_color { Color::Reset } else { color })
    }

    /// Best terminal color for an RGB triple.
    pub fn rgb(&self, r: u8, g: u8, b: u8) -> Color {
        match (self.no_color, self.true_color, self.ansi_256) {
            (true, _, _) => Color::Reset,
            (false, true, _) => Color::Rgb(r, g, b),
            (false, false, true) => Color::Indexed(rgb_to_256_color(r, g, b)),
            (false, false, false) => rgb_to_basic_ansi(r, g, b),
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `#rrggbb` to its components.
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let digits = s
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| eyre!("Invalid hex color '{}': expected #rrggbb", s))?;
    let packed = u32::from_str_radix(digits, 16)
        .map_err(|e| eyre!("Invalid hex color '{}': {}", s, e))?;
    Ok(((packed >> 16) as u8, (packed >> 8) as u8, packed as u8))
}

fn spread(r: u8, g: u8, b: u8) -> u8 {
    r.max(g).max(b) - r.min(g).min(b)
}

fn mean(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r) + u16::from(g) + u16::from(b)) / 3
}

/// Nearest xterm 256-color index: the 24-step gray ramp for near-grays, else the 6x6x6 cube.
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    if spread(r, g, b) < 10 {
        return match mean(r, g, b) {
            0..=7 => 16,
            248.. => 231,
            gray => 232 + ((gray - 8) * 24 / 240) as u8,
        };
    }
    let level = |v: u8| (u16::from(v) * 5 / 255) as u8;
    16 + 36 * level(r) + 6 * level(g) + level(b)
}

/// Nearest of the 8 basic ANSI colors.
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    const ANSI: [Color; 8] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::White,
    ];
    if spread(r, g, b) < 30 {
        return if mean(r, g, b) < 64 {
            Color::Black
        } else {
            Color::White
        };
    }
    let bit = |v: u8, shift: u8| usize::from(v > 128) << shift;
    ANSI[bit(r, 0) | bit(g, 1) | bit(b, 2)]
}

/// Parsed UI colors, looked up by config key.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        let parser = ColorParser::new();
        let colors = config
            .colors
            .entries()
            .into_iter()
            .map(|(name, value)| parser.parse(value).map(|color| (name.to_string(), color)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { colors })
    }

    /// Color for `name`, or `Color::Reset` for unknown keys.
    pub fn get(&self, name: &str) -> Color {
        self.get_optional(name).unwrap_or(Color::Reset)
    }

    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
