//! Named chart palettes.

pub use datavis_cli::PaletteName as Palette;

/// RGBA color with alpha in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Blend onto an opaque background, for targets that have no alpha channel.
    pub fn over(self, bg: (u8, u8, u8)) -> (u8, u8, u8) {
        let mix = |fg: u8, bg: u8| -> u8 {
            (fg as f64 * self.a + bg as f64 * (1.0 - self.a)).round() as u8
        };
        (mix(self.r, bg.0), mix(self.g, bg.1), mix(self.b, bg.2))
    }
}

/// Colors a palette supplies to a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteColors {
    pub border: Rgba,
    pub fill: Rgba,
    pub point: Rgba,
    /// Pie slice colors, cycled by slice index.
    pub slices: [Rgba; 5],
}

/// Border drawn around every pie slice.
pub const SLICE_BORDER: Rgba = Rgba::rgba(255, 255, 255, 0.06);

/// Grid line color on cartesian charts.
pub const GRID_COLOR: Rgba = Rgba::rgba(0, 0, 0, 0.06);

const OCEAN: PaletteColors = PaletteColors {
    border: Rgba::rgba(56, 189, 248, 0.95),
    fill: Rgba::rgba(56, 189, 248, 0.25),
    point: Rgba::rgb(0x06, 0xb6, 0xd4),
    slices: [
        Rgba::rgb(0x0e, 0xa5, 0xe9),
        Rgba::rgb(0x3b, 0x82, 0xf6),
        Rgba::rgb(0x06, 0xb6, 0xd4),
        Rgba::rgb(0x60, 0xa5, 0xfa),
        Rgba::rgb(0x02, 0x84, 0xc7),
    ],
};

const NEON: PaletteColors = PaletteColors {
    border: Rgba::rgba(52, 211, 153, 0.95),
    fill: Rgba::rgba(16, 185, 129, 0.18),
    point: Rgba::rgb(0x34, 0xd3, 0x99),
    slices: [
        Rgba::rgb(0x07, 0x0f, 0x34),
        Rgba::rgb(0x10, 0xb9, 0x81),
        Rgba::rgb(0x03, 0x13, 0xa6),
        Rgba::rgb(0x84, 0xcc, 0x16),
        Rgba::rgb(0xf7, 0x15, 0xab),
    ],
};

const SUNSET: PaletteColors = PaletteColors {
    border: Rgba::rgba(249, 115, 22, 0.95),
    fill: Rgba::rgba(249, 115, 22, 0.18),
    point: Rgba::rgb(0xfb, 0x92, 0x3c),
    slices: [
        Rgba::rgb(0xfb, 0x92, 0x3c),
        Rgba::rgb(0xf9, 0x73, 0x16),
        Rgba::rgb(0xf4, 0x3f, 0x5e),
        Rgba::rgb(0xfb, 0x71, 0x85),
        Rgba::rgb(0xfc, 0xa5, 0xa5),
    ],
};

const VIOLET: PaletteColors = PaletteColors {
    border: Rgba::rgba(139, 92, 246, 0.95),
    fill: Rgba::rgba(139, 92, 246, 0.18),
    point: Rgba::rgb(0xa7, 0x8b, 0xfa),
    slices: [
        Rgba::rgb(0xa7, 0x8b, 0xfa),
        Rgba::rgb(0x8b, 0x5c, 0xf6),
        Rgba::rgb(0x7c, 0x3a, 0xed),
        Rgba::rgb(0xc4, 0xb5, 0xfd),
        Rgba::rgb(0xdd, 0xd6, 0xfe),
    ],
};

pub fn colors(palette: Palette) -> &'static PaletteColors {
    match palette {
        Palette::Ocean => &OCEAN,
        Palette::Neon => &NEON,
        Palette::Sunset => &SUNSET,
        Palette::Violet => &VIOLET,
    }
}

/// Color of pie slice `index`; wraps around the palette's slice list.
pub fn slice_color(palette: Palette, index: usize) -> Rgba {
    let slices = &colors(palette).slices;
    slices[index % slices.len()]
}

/// Next palette in declaration order, wrapping around.
pub fn next(palette: Palette) -> Palette {
    let all = Palette::ALL;
    let pos = all.iter().position(|p| *p == palette).unwrap_or(0);
    all[(pos + 1) % all.len()]
}
