/// Level builder: turns one validated floor config into placed entities.
///
/// Build order (and therefore id order):
///   1. Perimeter: side walls, ceiling, needle row
///   2. Floor segments
///   3. Directional blocks (with their quadrant probes)
///   4. Ivys (hazard markers)
///   5. Gates
///   6. The player
///
/// The perimeter is tile-aligned (`tile * tile_size`); everything else is
/// placed through the half-tile grid mapping. Validation runs first, so a
/// bad config never yields a partial level.

use std::path::Path;

use crate::config::GameConfig;
use crate::domain::entity::{
    BlockEntity, Direction, Entity, EntityId, EntityKind, Placeable, WallKind,
};
use crate::domain::grid::{map_to_world, tile_to_world, GridCoord, WorldPos};
use crate::domain::level::{LevelConfig, TowerConfig};
use crate::domain::player::{PlayerEntity, PlayerStateMachine};
use crate::domain::sensor::{block_sensors, player_sensors};
use crate::error::{ConfigError, ConfigResult};

/// Everything the builder needs besides the floor itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildSettings {
    pub tile_size: u32,
    pub floor_width: i32,
    pub fall_bias: f64,
}

impl BuildSettings {
    pub fn from_config(config: &GameConfig) -> Self {
        BuildSettings {
            tile_size: config.sim.tile_size,
            floor_width: config.sim.floor_width,
            fall_bias: config.sim.fall_bias,
        }
    }
}

/// A fully placed floor.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub tile_size: u32,
    pub floor_width: i32,
    pub floor_height: i32,
    /// Static entities, indexed by id.
    pub entities: Vec<Entity>,
    pub player: PlayerEntity,
}

impl Level {
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize).filter(|e| e.id == id)
    }

    /// Orientation of `id` if it is a directional block.
    pub fn direction_of(&self, id: EntityId) -> Option<Direction> {
        self.entity(id).and_then(|e| e.block()).map(|b| b.direction)
    }

    pub fn kind_of(&self, id: EntityId) -> Option<&EntityKind> {
        if id == self.player.id {
            return Some(&EntityKind::Player);
        }
        self.entity(id).map(|e| &e.kind)
    }

    pub fn count(&self, pred: impl Fn(&EntityKind) -> bool) -> usize {
        self.entities.iter().filter(|e| pred(&e.kind)).count()
    }
}

/// Validate and build a floor.
pub fn build_level(cfg: &LevelConfig, settings: BuildSettings) -> ConfigResult<Level> {
    if settings.tile_size == 0 {
        return Err(ConfigError::InvalidTileSize);
    }
    cfg.validate(settings.floor_width)?;

    let mut b = Builder::new(settings.tile_size);
    let w = settings.floor_width;
    let h = cfg.tile_count_height;

    // 1. Perimeter
    for row in 0..=h {
        b.push_tile(EntityKind::Wall(WallKind::Side), 0, row);
        b.push_tile(EntityKind::Wall(WallKind::Side), w - 1, row);
    }
    for col in 1..w - 1 {
        b.push_tile(EntityKind::Wall(WallKind::Ceiling), col, 0);
        b.push_tile(EntityKind::Wall(WallKind::Needle), col, h);
    }

    // 2-5. Layout
    for &c in &cfg.floors {
        b.push_grid(EntityKind::FloorSegment, c);
    }
    for block in &cfg.blocks {
        let kind = EntityKind::Block(BlockEntity {
            direction: block.direction,
            sensors: block_sensors(b.tile, block.direction),
        });
        b.push_grid(kind, block.coord);
    }
    for &c in &cfg.hazards {
        b.push_grid(EntityKind::Hazard, c);
    }
    for &c in &cfg.gates {
        b.push_grid(EntityKind::Gate, c);
    }

    // 6. Player
    let body_w = b.tile / 2.0;
    let player = PlayerEntity {
        id: b.next_id(),
        pos: map_to_world(cfg.player_start, settings.tile_size),
        extent: b.tile,
        body_w,
        sensors: player_sensors(b.tile, body_w),
        machine: PlayerStateMachine::spawn(cfg.start_power, settings.fall_bias),
    };

    let level = Level {
        name: cfg.name.clone(),
        tile_size: settings.tile_size,
        floor_width: w,
        floor_height: h,
        entities: b.entities,
        player,
    };
    log::info!(
        "built {:?}: {} walls, {} floors, {} blocks, {} ivys, {} gates, player at ({}, {})",
        level.name,
        level.count(|k| matches!(k, EntityKind::Wall(_))),
        level.count(|k| matches!(k, EntityKind::FloorSegment)),
        level.count(|k| matches!(k, EntityKind::Block(_))),
        level.count(|k| matches!(k, EntityKind::Hazard)),
        level.count(|k| matches!(k, EntityKind::Gate)),
        level.player.position().x,
        level.player.position().y,
    );
    Ok(level)
}

/// Load a tower file, pick a floor, build it.
pub fn load_floor(path: &Path, config: &GameConfig) -> ConfigResult<Level> {
    let tower = TowerConfig::load(path, config.sim.default_power)?;
    let floor = tower.floor(config.floor_index)?;
    build_level(floor, BuildSettings::from_config(config))
}

struct Builder {
    tile_size: u32,
    tile: f64,
    entities: Vec<Entity>,
}

impl Builder {
    fn new(tile_size: u32) -> Self {
        Builder { tile_size, tile: tile_size as f64, entities: Vec::with_capacity(128) }
    }

    fn next_id(&self) -> EntityId {
        EntityId(self.entities.len() as u32)
    }

    fn push(&mut self, kind: EntityKind, pos: WorldPos) {
        let id = self.next_id();
        self.entities.push(Entity { id, kind, pos, extent: self.tile });
    }

    fn push_tile(&mut self, kind: EntityKind, col: i32, row: i32) {
        self.push(kind, tile_to_world(col, row, self.tile_size));
    }

    fn push_grid(&mut self, kind: EntityKind, coord: GridCoord) {
        self.push(kind, map_to_world(coord, self.tile_size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::PlayerState;
    use crate::domain::level::BlockSpec;

    fn settings() -> BuildSettings {
        BuildSettings { tile_size: 32, floor_width: 17, fall_bias: 1.0 }
    }

    fn floor() -> LevelConfig {
        LevelConfig {
            name: "test".into(),
            tile_count_height: 12,
            start_power: 20,
            player_start: GridCoord::new(2, 0),
            gates: vec![GridCoord::new(26, 0)],
            hazards: vec![GridCoord::new(10, 20)],
            floors: vec![GridCoord::new(0, 2), GridCoord::new(2, 2)],
            blocks: vec![BlockSpec { coord: GridCoord::new(4, 2), direction: Direction::Left }],
        }
    }

    #[test]
    fn builds_every_configured_entity() {
        let level = build_level(&floor(), settings()).unwrap();
        // 2 * 13 side walls + 15 ceiling + 15 needles
        assert_eq!(level.count(|k| matches!(k, EntityKind::Wall(_))), 56);
        assert_eq!(level.count(|k| matches!(k, EntityKind::Wall(WallKind::Needle))), 15);
        assert_eq!(level.count(|k| matches!(k, EntityKind::FloorSegment)), 2);
        assert_eq!(level.count(|k| matches!(k, EntityKind::Block(_))), 1);
        assert_eq!(level.count(|k| matches!(k, EntityKind::Hazard)), 1);
        assert_eq!(level.count(|k| matches!(k, EntityKind::Gate)), 1);
        assert_eq!(level.player.id, EntityId(level.entities.len() as u32));
    }

    #[test]
    fn player_spawns_from_config() {
        let level = build_level(&floor(), settings()).unwrap();
        let p = &level.player;
        assert_eq!(p.position(), WorldPos::new(64.0, 32.0));
        assert_eq!(p.machine.state(), PlayerState::Starting);
        assert_eq!(p.machine.power(), 20);
        assert_eq!(p.sensors.len(), 3);
        assert_eq!(level.kind_of(p.id), Some(&EntityKind::Player));
    }

    #[test]
    fn blocks_carry_quadrant_probes() {
        let level = build_level(&floor(), settings()).unwrap();
        let block = level.entities.iter().find(|e| e.block().is_some()).unwrap();
        assert_eq!(block.pos, WorldPos::new(96.0, 64.0));
        assert_eq!(block.block().unwrap().sensors.len(), 4);
        assert_eq!(level.direction_of(block.id), Some(Direction::Left));
        assert_eq!(level.direction_of(EntityId(0)), None);
    }

    #[test]
    fn perimeter_is_tile_aligned() {
        let level = build_level(&floor(), settings()).unwrap();
        let needle_y: Vec<f64> = level
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Wall(WallKind::Needle))
            .map(|e| e.pos.y)
            .collect();
        assert!(needle_y.iter().all(|&y| y == 12.0 * 32.0));
        let right_side = level
            .entities
            .iter()
            .any(|e| e.kind == EntityKind::Wall(WallKind::Side) && e.pos.x == 16.0 * 32.0);
        assert!(right_side);
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let mut cfg = floor();
        cfg.floors.push(GridCoord::new(-1, 0));
        assert!(matches!(
            build_level(&cfg, settings()),
            Err(ConfigError::OutOfBounds { what: "floor segment", .. })
        ));
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        let s = BuildSettings { tile_size: 0, ..settings() };
        assert!(matches!(build_level(&floor(), s), Err(ConfigError::InvalidTileSize)));
    }

    #[test]
    fn oversized_floor_is_rejected_before_building() {
        for height in [i32::MAX, 100_000_000] {
            let cfg = LevelConfig { tile_count_height: height, ..floor() };
            assert!(matches!(
                build_level(&cfg, settings()),
                Err(ConfigError::InvalidHeight { .. })
            ));
        }
        let wide = BuildSettings { floor_width: i32::MAX, ..settings() };
        assert!(matches!(build_level(&floor(), wide), Err(ConfigError::InvalidWidth { .. })));
    }

    #[test]
    fn shipped_tower_builds_every_floor() {
        let text = include_str!("../../towers/tower1.toml");
        let tower = TowerConfig::from_toml_str(text, 20).unwrap();
        assert_eq!(tower.floors.len(), 2);
        for floor in &tower.floors {
            let level = build_level(floor, settings()).unwrap();
            assert!(level.count(|k| matches!(k, EntityKind::Gate)) >= 1);
        }
    }

    #[test]
    fn missing_tower_file_is_io_error() {
        let cfg = GameConfig::default();
        let err = load_floor(Path::new("/nonexistent/tower.toml"), &cfg).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
