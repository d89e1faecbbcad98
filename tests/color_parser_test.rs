use datavis::config::{rgb_to_256_color, rgb_to_basic_ansi, ColorParser, ThemeConfig};
use datavis::Theme;
use ratatui::style::Color;

fn true_color() -> ColorParser {
    ColorParser::with_capabilities(true, true, false)
}

#[test]
fn test_parse_named_colors() {
    let parser = true_color();
    assert_eq!(parser.parse("red").unwrap(), Color::Red);
    assert_eq!(parser.parse("CYAN").unwrap(), Color::Cyan);
    assert_eq!(parser.parse("bright_blue").unwrap(), Color::Indexed(12));
    assert_eq!(parser.parse("dark gray").unwrap(), Color::Indexed(8));
    assert_eq!(parser.parse("reset").unwrap(), Color::Reset);
}

#[test]
fn test_parse_hex_by_capability() {
    assert_eq!(
        true_color().parse("#38bdf8").unwrap(),
        Color::Rgb(0x38, 0xbd, 0xf8)
    );
    assert_eq!(
        ColorParser::with_capabilities(false, true, false)
            .parse("#ff0000")
            .unwrap(),
        Color::Indexed(rgb_to_256_color(255, 0, 0))
    );
    assert_eq!(
        ColorParser::with_capabilities(false, false, false)
            .parse("#ff0000")
            .unwrap(),
        Color::Red
    );
}

#[test]
fn test_parse_indexed() {
    let parser = true_color();
    assert_eq!(parser.parse("indexed(236)").unwrap(), Color::Indexed(236));
    assert!(parser.parse("indexed(300)").is_err());
}

#[test]
fn test_invalid_colors() {
    let parser = true_color();
    assert!(parser.parse("chartreuse-ish").is_err());
    assert!(parser.parse("#12345").is_err());
    assert!(parser.parse("#gg0000").is_err());
}

#[test]
fn test_no_color_resets_everything() {
    let parser = ColorParser::with_capabilities(true, true, true);
    assert_eq!(parser.parse("red").unwrap(), Color::Reset);
    assert_eq!(parser.rgb(1, 2, 3), Color::Reset);
}

#[test]
fn test_rgb_downsampling() {
    assert_eq!(rgb_to_256_color(0, 0, 0), 16);
    assert_eq!(rgb_to_256_color(255, 255, 255), 231);
    assert_eq!(rgb_to_256_color(255, 0, 0), 196);
    assert_eq!(rgb_to_basic_ansi(10, 10, 10), Color::Black);
    assert_eq!(rgb_to_basic_ansi(0, 200, 200), Color::Cyan);
}

#[test]
fn test_theme_has_every_configured_key() {
    let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
    for key in [
        "primary",
        "error",
        "controls_bg",
        "table_border",
        "modal_border_active",
        "nav_active",
    ] {
        assert!(theme.get_optional(key).is_some(), "missing {}", key);
    }
}
