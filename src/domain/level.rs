/// Tower documents and the per-floor level configuration.
///
/// ## Tower format (TOML)
///   ```toml
///   [[floors]]
///   name   = "1F - Entrance"
///   height = 12
///   power  = 20              # optional, falls back to the game default
///   indy   = { x = 2, y = 0 }
///   gates  = [{ x = 26, y = 0 }]
///   ivys   = [{ x = 10, y = 20 }]
///   floors = [{ x = 0, y = 2 }, { x = 2, y = 2 }]
///   blocks = [{ x = 4, y = 2, d = "left" }]
///   ```
///
/// Floors are listed in order; the first tower document's floor 0 is the
/// default level. Every field except `power` is required. All coordinates
/// are on the half-tile grid (see `domain::grid`).

use std::path::Path;

use serde::Deserialize;

use super::entity::Direction;
use super::grid::{GridBounds, GridCoord, FLOOR_HEIGHTS, FLOOR_WIDTHS};
use crate::error::{ConfigError, ConfigResult};

// ── Raw document (serde) ──

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TowerDoc {
    floors: Vec<FloorDoc>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FloorDoc {
    name: String,
    height: i32,
    power: Option<i32>,
    indy: GridCoord,
    gates: Vec<GridCoord>,
    ivys: Vec<GridCoord>,
    floors: Vec<GridCoord>,
    blocks: Vec<BlockDoc>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct BlockDoc {
    x: i32,
    y: i32,
    d: String,
}

// ── Validated model ──

/// A directional block entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockSpec {
    pub coord: GridCoord,
    pub direction: Direction,
}

/// One floor of a tower, ready for the level builder.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelConfig {
    pub name: String,
    pub tile_count_height: i32,
    pub start_power: i32,
    pub player_start: GridCoord,
    pub gates: Vec<GridCoord>,
    pub hazards: Vec<GridCoord>,
    pub floors: Vec<GridCoord>,
    pub blocks: Vec<BlockSpec>,
}

/// A parsed tower: an ordered list of floors.
#[derive(Clone, Debug)]
pub struct TowerConfig {
    pub floors: Vec<LevelConfig>,
}

impl TowerConfig {
    /// Parse a tower document. `default_power` fills floors without `power`.
    pub fn from_toml_str(text: &str, default_power: i32) -> ConfigResult<Self> {
        let doc: TowerDoc = toml::from_str(text)?;
        if doc.floors.is_empty() {
            return Err(ConfigError::NoFloors);
        }
        let floors = doc
            .floors
            .into_iter()
            .map(|f| f.into_level(default_power))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(TowerConfig { floors })
    }

    pub fn load(path: &Path, default_power: i32) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tower = Self::from_toml_str(&text, default_power)?;
        log::info!("loaded tower {} ({} floors)", path.display(), tower.floors.len());
        Ok(tower)
    }

    /// Select a floor by index.
    pub fn floor(&self, index: usize) -> ConfigResult<&LevelConfig> {
        self.floors.get(index).ok_or(ConfigError::FloorIndex {
            index,
            count: self.floors.len(),
        })
    }
}

impl FloorDoc {
    fn into_level(self, default_power: i32) -> ConfigResult<LevelConfig> {
        let blocks = self
            .blocks
            .into_iter()
            .map(|b| {
                Ok(BlockSpec {
                    coord: GridCoord::new(b.x, b.y),
                    direction: Direction::from_token(&b.d)?,
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(LevelConfig {
            name: self.name,
            tile_count_height: self.height,
            start_power: self.power.unwrap_or(default_power),
            player_start: self.indy,
            gates: self.gates,
            hazards: self.ivys,
            floors: self.floors,
            blocks,
        })
    }
}

impl LevelConfig {
    /// Check every coordinate against the addressable area of a floor
    /// `floor_width` tiles wide. Runs before anything is built.
    pub fn validate(&self, floor_width: i32) -> ConfigResult<()> {
        if !FLOOR_WIDTHS.contains(&floor_width) {
            return Err(ConfigError::InvalidWidth {
                width: floor_width,
                min: *FLOOR_WIDTHS.start(),
                max: *FLOOR_WIDTHS.end(),
            });
        }
        if !FLOOR_HEIGHTS.contains(&self.tile_count_height) {
            return Err(ConfigError::InvalidHeight {
                height: self.tile_count_height,
                min: *FLOOR_HEIGHTS.start(),
                max: *FLOOR_HEIGHTS.end(),
            });
        }
        let bounds = GridBounds::for_floor(floor_width, self.tile_count_height);

        let check = |what: &'static str, c: GridCoord| {
            if bounds.contains(c) {
                Ok(())
            } else {
                Err(ConfigError::OutOfBounds { what, x: c.x, y: c.y })
            }
        };

        check("player start", self.player_start)?;
        for &c in &self.gates { check("gate", c)?; }
        for &c in &self.hazards { check("ivy", c)?; }
        for &c in &self.floors { check("floor segment", c)?; }
        for b in &self.blocks { check("block", b.coord)?; }
        Ok(())
    }
}
