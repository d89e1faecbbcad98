pub use datavis_cli::{Args, PaletteName};
