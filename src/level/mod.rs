//! Level data: panning chain, player spawn, floor and enemies.
//!
//! Levels are RON files in `data/levels/`; the first one by name is played.
//! A level is validated completely on load (panning chain and every enemy
//! path are built once) so a bad file fails at startup instead of mid-game.
//!
//! ```ron
//! (
//!     name: "Gorge",
//!     player_spawn: (0.0, 1.0),
//!     ground_y: 0.0,
//!     panning_points: [(0.0, 4.0), (30.0, 4.0), (30.0, 20.0)],
//!     enemies: [(position: (8.0, 1.0), path: [Linear([(8.0, 1.0), (12.0, 1.0)])])],
//! )
//! ```
pub mod loader;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{PanningError, ScenePanning};
use crate::enemy::EnemyConfig;
use crate::path::{EnemyPath, PathError};

pub use loader::*;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("no level files in {0}")]
    NoLevels(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid panning chain: {0}")]
    Panning(#[from] PanningError),
    #[error("enemy {index} has an invalid path: {source}")]
    EnemyPath {
        index: usize,
        #[source]
        source: PathError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub name: String,
    pub player_spawn: Vec2,
    #[serde(default)]
    pub ground_y: f32,
    pub panning_points: Vec<Vec2>,
    #[serde(default)]
    pub enemies: Vec<EnemyConfig>,
}

impl LevelData {
    /// Build everything that can fail so errors surface before spawning.
    ///
    /// # Errors
    /// The first panning or enemy path error.
    pub fn validate(&self) -> Result<(), LevelError> {
        ScenePanning::from_positions(&self.panning_points)?;
        for (index, enemy) in self.enemies.iter().enumerate() {
            if !enemy.path.is_empty() {
                EnemyPath::from_configs(&enemy.path).map_err(|source| LevelError::EnemyPath { index, source })?;
            }
        }
        Ok(())
    }

    /// # Errors
    /// `Panning` when the level has fewer than two panning points.
    pub fn panning(&self) -> Result<ScenePanning, LevelError> {
        Ok(ScenePanning::from_positions(&self.panning_points)?)
    }
}

/// The level being played.
#[derive(Resource, Debug, Clone)]
pub struct ActiveLevel {
    pub data: LevelData,
    pub source: String,
}

impl ActiveLevel {
    #[must_use]
    pub fn ground_y(&self) -> f32 {
        self.data.ground_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSectionConfig;

    const LEVEL: &str = r#"(
        name: "Test",
        player_spawn: (0.0, 1.0),
        panning_points: [(0.0, 0.0), (10.0, 0.0)],
        enemies: [
            (position: (3.0, 1.0), path: [Linear([(3.0, 1.0), (5.0, 1.0)])]),
            (position: (6.0, 1.0), shooter: Some((interval: 1.5))),
        ],
    )"#;

    #[test]
    fn parses_and_validates() {
        let level: LevelData = ron::from_str(LEVEL).unwrap();
        assert_eq!(level.name, "Test");
        assert_eq!(level.ground_y, 0.0);
        assert_eq!(level.enemies.len(), 2);
        assert_eq!(level.enemies[1].shooter.as_ref().map(|s| s.projectile_speed), Some(8.0));
        level.validate().unwrap();
    }

    #[test]
    fn single_panning_point_is_rejected() {
        let mut level: LevelData = ron::from_str(LEVEL).unwrap();
        level.panning_points.truncate(1);
        assert!(matches!(level.validate(), Err(LevelError::Panning(PanningError::TooFewPoints(1)))));
    }

    #[test]
    fn bad_enemy_path_names_the_enemy() {
        let mut level: LevelData = ron::from_str(LEVEL).unwrap();
        level.enemies[0].path = vec![PathSectionConfig::Linear(Vec::new())];
        assert!(matches!(
            level.validate(),
            Err(LevelError::EnemyPath { index: 0, source: PathError::EmptyLinearPath })
        ));
    }
}
