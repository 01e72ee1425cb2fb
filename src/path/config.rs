//! Serializable description of enemy path sections as authored in level files.
//!
//! Level RON files describe each section as one variant of
//! [`PathSectionConfig`]; [`EnemyPathSection::from_config`] turns it into a
//! runtime section. Example:
//!
//! ```ron
//! Random(
//!     origin: (12.0, 3.0),
//!     points_range: 6.0,
//!     source: Range(count: 4, collider: Box(size: (1.0, 2.0))),
//! )
//! ```
//!
//! [`EnemyPathSection::from_config`]: crate::path::EnemyPathSection::from_config
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Footprint of the enemy's detection collider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Box { size: Vec2 },
    Circle { radius: f32 },
    Capsule { size: Vec2 },
    /// Authored polygons are accepted by the parser but cannot be used for
    /// random point placement.
    Polygon { points: Vec<Vec2> },
}

impl ColliderShape {
    /// Name used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ColliderShape::Box { .. } => "box",
            ColliderShape::Circle { .. } => "circle",
            ColliderShape::Capsule { .. } => "capsule",
            ColliderShape::Polygon { .. } => "polygon",
        }
    }
}

/// Where a random section takes its points from after the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointSourceConfig {
    /// Hand-placed candidates, visited once each in random order.
    Manual(Vec<Vec2>),
    /// `count` points generated on the `points_range` circle around the origin.
    Range { count: u32, collider: ColliderShape },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathSectionConfig {
    Random {
        origin: Vec2,
        #[serde(default = "default_points_range")]
        points_range: f32,
        source: PointSourceConfig,
    },
    /// Fixed waypoints, visited in order.
    Linear(Vec<Vec2>),
}

fn default_points_range() -> f32 {
    5.0
}

/// Upper bound of the authored `points_range` slider.
pub const MAX_POINTS_RANGE: f32 = 20.0;
