/// Game settings: tile geometry, physics tuning, animation pacing and the
/// tower to load.
///
/// Read from `config.toml` next to the executable, else in the CWD. Any
/// missing file, section or key takes its default.
/// Tower documents are loaded separately (see `domain::level`) and never
/// fall back.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub sim: SimConfig,
    pub physics: PhysicsConfig,
    pub animation: AnimationConfig,
    pub tower: PathBuf,
    pub floor_index: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    pub tile_size: u32,
    pub floor_width: i32,
    pub default_power: i32,
    pub tick_rate_ms: u64,
    pub fall_bias: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub walk_speed: f64,     // world units per tick at unit intent
    pub gravity: f64,        // added to fall speed per tick while biased
    pub max_fall_speed: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationConfig {
    pub frame_ticks: u32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    sim: TomlSim,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    animation: TomlAnimation,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSim {
    #[serde(default = "default_tile_size")]
    tile_size: u32,
    #[serde(default = "default_floor_width")]
    floor_width: i32,
    #[serde(default = "default_power")]
    default_power: i32,
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_fall_bias")]
    fall_bias: f64,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_walk_speed")]
    walk_speed: f64,
    #[serde(default = "default_gravity")]
    gravity: f64,
    #[serde(default = "default_max_fall")]
    max_fall_speed: f64,
}

#[derive(Deserialize, Debug)]
struct TomlAnimation {
    #[serde(default = "default_frame_ticks")]
    frame_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tower")]
    tower: String,
    #[serde(default)]
    floor_index: usize,
}

// ── Defaults ──

fn default_tile_size() -> u32 { 32 }
fn default_floor_width() -> i32 { 17 }
fn default_power() -> i32 { 20 }
fn default_tick_rate() -> u64 { 33 }
fn default_fall_bias() -> f64 { 1.0 }
fn default_walk_speed() -> f64 { 2.0 }
fn default_gravity() -> f64 { 0.5 }
fn default_max_fall() -> f64 { 8.0 }
fn default_frame_ticks() -> u32 { 6 }
fn default_tower() -> String { "towers/tower1.toml".into() }

impl Default for TomlSim {
    fn default() -> Self {
        TomlSim {
            tile_size: default_tile_size(),
            floor_width: default_floor_width(),
            default_power: default_power(),
            tick_rate_ms: default_tick_rate(),
            fall_bias: default_fall_bias(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            walk_speed: default_walk_speed(),
            gravity: default_gravity(),
            max_fall_speed: default_max_fall(),
        }
    }
}

impl Default for TomlAnimation {
    fn default() -> Self {
        TomlAnimation { frame_ticks: default_frame_ticks() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { tower: default_tower(), floor_index: 0 }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Search the exe directory, then the CWD, for `config.toml`.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse settings text directly; malformed text yields defaults.
    pub fn from_str_or_default(text: &str) -> Self {
        let cfg = match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("config parse error: {e}; using default settings");
                TomlConfig::default()
            }
        };
        Self::from_toml(cfg, &[])
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            sim: SimConfig {
                tile_size: cfg.sim.tile_size,
                floor_width: cfg.sim.floor_width,
                default_power: cfg.sim.default_power,
                tick_rate_ms: cfg.sim.tick_rate_ms,
                fall_bias: cfg.sim.fall_bias,
            },
            physics: PhysicsConfig {
                walk_speed: cfg.physics.walk_speed,
                gravity: cfg.physics.gravity,
                max_fall_speed: cfg.physics.max_fall_speed,
            },
            animation: AnimationConfig { frame_ticks: cfg.animation.frame_ticks },
            tower: resolve_path(&cfg.general.tower, search_dirs),
            floor_index: cfg.general.floor_index,
        }
    }
}

/// Absolute paths pass through; relative ones resolve against the first
/// candidate directory that contains them, else stay relative to CWD.
fn resolve_path(path: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        return p.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(p))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| p.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First readable `config.toml` among `search_dirs`, else defaults.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    log::info!("settings loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    log::warn!("config.toml parse error: {e}; using default settings");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
            }
        }
    }
    TomlConfig::default()
}
