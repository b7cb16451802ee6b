/// Level-load errors.
///
/// Everything that can go wrong happens before the first entity is placed:
/// reading the tower file, parsing it, picking a floor, and validating its
/// coordinates. The tick loop itself has no error paths.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tower document: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("tower document contains no floors")]
    NoFloors,

    #[error("floor index {index} does not exist (tower has {count} floors)")]
    FloorIndex { index: usize, count: usize },

    #[error("block direction {token:?} is not one of \"left\" or \"right\"")]
    InvalidDirection { token: String },

    #[error("{what} at ({x}, {y}) lies outside the addressable floor")]
    OutOfBounds { what: &'static str, x: i32, y: i32 },

    #[error("floor height {height} is out of range ({min}..={max} tiles)")]
    InvalidHeight { height: i32, min: i32, max: i32 },

    #[error("floor width {width} is out of range ({min}..={max} tiles)")]
    InvalidWidth { width: i32, min: i32, max: i32 },

    #[error("tile size must be positive")]
    InvalidTileSize,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
