use crate::actor::Priority;
use crate::gate::MovementRules;
use crate::{ActorId, ActorKind, Direction, Error, Grid, Result, ShapeSpec, Tile, World};
use serde::Deserialize;
use std::fs;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub actors: Vec<ActorConfig>,
}

#[derive(Debug, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default)]
    pub loop_horizontal: bool,
    #[serde(default)]
    pub loop_vertical: bool,
    /// Text layout to load instead of an empty map (`■` blocked)
    #[serde(default)]
    pub layout_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovementConfig {
    #[serde(default = "default_diagonal_blocking")]
    pub diagonal_blocking: bool,
    #[serde(default = "default_search_limit")]
    pub search_limit: i32,
    #[serde(default = "default_move_speed")]
    pub default_move_speed: u8,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter level: error, warn, info, debug or trace
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_enable_action_log")]
    pub enable_action_log: bool,
    #[serde(default = "default_action_log_path")]
    pub action_log_path: String,
}

#[derive(Debug, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
}

/// One actor placed on the map at startup
#[derive(Debug, Deserialize)]
pub struct ActorConfig {
    #[serde(flatten)]
    pub kind: ActorKind,
    pub x: i32,
    pub y: i32,
    #[serde(default = "default_facing")]
    pub facing: Direction,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub through: bool,
    #[serde(default)]
    pub move_speed: Option<u8>,
    #[serde(default)]
    pub shape: ShapeSpec,
}

// Default values
fn default_width() -> i32 { 30 }
fn default_height() -> i32 { 20 }
fn default_diagonal_blocking() -> bool { true }
fn default_search_limit() -> i32 { 12 }
fn default_move_speed() -> u8 { 4 }
fn default_level() -> String { "info".to_string() }
fn default_enable_action_log() -> bool { true }
fn default_action_log_path() -> String { "action_log.json".to_string() }
fn default_window_title() -> String { "Big Sprites - Occupancy Viewer".to_string() }
fn default_cell_size() -> f32 { 24.0 }
fn default_bg_r() -> u8 { 30 }
fn default_bg_g() -> u8 { 30 }
fn default_bg_b() -> u8 { 30 }
fn default_facing() -> Direction { Direction::Down }

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            loop_horizontal: false,
            loop_vertical: false,
            layout_file: None,
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            diagonal_blocking: default_diagonal_blocking(),
            search_limit: default_search_limit(),
            default_move_speed: default_move_speed(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            enable_action_log: default_enable_action_log(),
            action_log_path: default_action_log_path(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            cell_size: default_cell_size(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            movement: MovementConfig::default(),
            logging: LoggingConfig::default(),
            visual: VisualConfig::default(),
            actors: Vec::new(),
        }
    }
}

impl MovementConfig {
    pub fn rules(&self) -> MovementRules {
        MovementRules {
            diagonal_blocking: self.diagonal_blocking,
            search_limit: self.search_limit,
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Self {
        match Self::from_file("config.toml") {
            Ok(config) => {
                info!("Loaded configuration from config.toml");
                config
            }
            Err(Error::Io { .. }) => {
                info!("No config.toml found, using default configuration");
                Config::default()
            }
            Err(e) => {
                warn!("Failed to load config.toml: {}", e);
                warn!("Using default configuration");
                Config::default()
            }
        }
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.map.width <= 0 || self.map.height <= 0 {
            return Err(Error::InvalidConfig(format!(
                "map size must be positive, got {}x{}",
                self.map.width, self.map.height
            )));
        }
        if !(1..=6).contains(&self.movement.default_move_speed) {
            return Err(Error::InvalidConfig(format!(
                "default_move_speed must be 1..=6, got {}",
                self.movement.default_move_speed
            )));
        }
        Ok(())
    }

    /// Build the map: the layout file when one is set and readable, an empty
    /// grid of the configured size otherwise
    pub fn build_grid(&self) -> Grid {
        let grid = match &self.map.layout_file {
            Some(path) => match fs::read_to_string(path) {
                Ok(layout) => Grid::from_layout(&layout),
                Err(e) => {
                    warn!("Failed to read layout {}: {}, using an empty map", path, e);
                    Grid::new(self.map.width, self.map.height)
                }
            },
            None => Grid::new(self.map.width, self.map.height),
        };
        grid.with_loops(self.map.loop_horizontal, self.map.loop_vertical)
    }

    /// Spawn every configured actor. A malformed shape falls back to a
    /// single-tile body with a warning instead of failing the whole load.
    pub fn populate<M: crate::MapView>(&self, world: &mut World<M>) -> Result<Vec<ActorId>> {
        let mut ids = Vec::with_capacity(self.actors.len());
        for entry in &self.actors {
            let shape = match entry.shape.validate() {
                Ok(()) => entry.shape.clone(),
                Err(e) => {
                    warn!("Actor at ({}, {}) has an invalid shape ({}), using a single tile", entry.x, entry.y, e);
                    ShapeSpec::default()
                }
            };
            let id = world.spawn(entry.kind, Tile::new(entry.x, entry.y), entry.facing, shape)?;
            world.set_move_speed(id, entry.move_speed.unwrap_or(self.movement.default_move_speed))?;
            if entry.priority != Priority::Same {
                world.set_priority(id, entry.priority)?;
            }
            if entry.through {
                world.set_through(id, true)?;
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Map, rules, actors and (if enabled) the action log, ready to run
    pub fn build_world(&self) -> Result<World<Grid>> {
        let mut world = World::new(self.build_grid(), self.movement.rules());
        if self.logging.enable_action_log {
            world = world.with_action_log();
        }
        self.populate(&mut world)?;
        Ok(world)
    }
}
