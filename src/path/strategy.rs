//! Point generation strategies for a single path section.
//!
//! A strategy only decides *which position* occupies a slot the first time
//! the cursor reaches it. Chain bookkeeping (links, memoization, cursor
//! movement) lives in [`EnemyPathSection`](super::EnemyPathSection).
use bevy::math::Vec2;
use rand::Rng;

use super::config::{ColliderShape, MAX_POINTS_RANGE, PathSectionConfig, PointSourceConfig};
use super::{PathContext, PathError, PointKind};

/// Rejection-sampling bound for a single random point.
pub const RANDOM_POINT_MAX_ATTEMPTS: u32 = 64;

#[derive(Debug, Clone)]
pub enum PathStrategy {
    Random(RandomStrategy),
    Linear(LinearStrategy),
}

impl PathStrategy {
    #[must_use]
    pub fn from_config(config: &PathSectionConfig) -> Self {
        match config {
            PathSectionConfig::Random { origin, points_range, source } => {
                PathStrategy::Random(RandomStrategy::new(*origin, *points_range, source.clone()))
            }
            PathSectionConfig::Linear(points) => PathStrategy::Linear(LinearStrategy::new(points.clone())),
        }
    }

    pub(super) fn initialize(&mut self) -> Result<(), PathError> {
        match self {
            PathStrategy::Random(random) => random.initialize(),
            PathStrategy::Linear(linear) => linear.initialize(),
        }
    }

    /// Kind recorded on every point this strategy materializes.
    #[must_use]
    pub fn kind(&self) -> PointKind {
        match self {
            PathStrategy::Random(_) => PointKind::Random,
            PathStrategy::Linear(_) => PointKind::Linear,
        }
    }

    pub(super) fn section_length(&self) -> usize {
        match self {
            PathStrategy::Random(random) => random.section_length(),
            PathStrategy::Linear(linear) => linear.points.len(),
        }
    }

    /// Position for slot `index`, or `None` when the strategy is exhausted.
    pub(super) fn generate<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        ctx: &PathContext,
        rng: &mut R,
    ) -> Result<Option<Vec2>, PathError> {
        match self {
            PathStrategy::Random(random) => random.generate(index, ctx, rng),
            PathStrategy::Linear(linear) => linear.generate(index),
        }
    }

    pub(super) fn reset(&mut self) {
        if let PathStrategy::Random(random) = self {
            random.reset();
        }
    }
}

#[derive(Debug, Clone)]
pub enum PointSource {
    Manual {
        points: Vec<Vec2>,
        used: usize,
    },
    Range {
        count: u32,
        remaining: u32,
        collider: ColliderShape,
        footprint: Option<f32>,
    },
}

#[derive(Debug, Clone)]
pub struct RandomStrategy {
    pub origin: Vec2,
    pub points_range: f32,
    pub source: PointSource,
}

impl RandomStrategy {
    #[must_use]
    pub fn new(origin: Vec2, points_range: f32, source: PointSourceConfig) -> Self {
        let source = match source {
            PointSourceConfig::Manual(points) => PointSource::Manual { points, used: 0 },
            PointSourceConfig::Range { count, collider } => PointSource::Range {
                count,
                remaining: count,
                collider,
                footprint: None,
            },
        };
        Self {
            origin,
            points_range: points_range.clamp(0.0, MAX_POINTS_RANGE),
            source,
        }
    }

    fn initialize(&mut self) -> Result<(), PathError> {
        let range = self.points_range;
        if let PointSource::Range { collider, footprint, .. } = &mut self.source {
            let diagonal = collider_max_length(collider)?;
            if diagonal > range {
                return Err(PathError::RangeSmallerThanCollider { range, footprint: diagonal });
            }
            *footprint = Some(diagonal);
        }
        Ok(())
    }

    fn section_length(&self) -> usize {
        match &self.source {
            PointSource::Manual { points, .. } => points.len(),
            PointSource::Range { count, .. } => *count as usize,
        }
    }

    fn generate<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        ctx: &PathContext,
        rng: &mut R,
    ) -> Result<Option<Vec2>, PathError> {
        if index == 0 {
            return Ok(Some(self.origin));
        }
        match &mut self.source {
            PointSource::Manual { points, used } => Ok(draw_manual_point(points, used, rng)),
            PointSource::Range { remaining, footprint, .. } => {
                let Some(footprint) = *footprint else {
                    return Err(PathError::NotInitialized);
                };
                if *remaining == 0 {
                    return Ok(None);
                }
                let point = sample_point_outside_footprint(self.origin, self.points_range, footprint, ctx, rng)?;
                *remaining -= 1;
                Ok(Some(point))
            }
        }
    }

    fn reset(&mut self) {
        match &mut self.source {
            PointSource::Manual { used, .. } => *used = 0,
            PointSource::Range { count, remaining, .. } => *remaining = *count,
        }
    }
}

/// Pick a uniformly random unused point and move it behind the unused prefix.
fn draw_manual_point<R: Rng + ?Sized>(points: &mut [Vec2], used: &mut usize, rng: &mut R) -> Option<Vec2> {
    if *used == points.len() {
        return None;
    }
    let unused = points.len() - *used;
    let index = rng.gen_range(0..unused);
    let point = points[index];
    points.swap(index, unused - 1);
    *used += 1;
    Some(point)
}

/// Sample a point on the `range` circle around `origin`, restricted to the
/// quadrant facing the target, that lies at least `footprint` away from it.
fn sample_point_outside_footprint<R: Rng + ?Sized>(
    origin: Vec2,
    range: f32,
    footprint: f32,
    ctx: &PathContext,
    rng: &mut R,
) -> Result<Vec2, PathError> {
    let signs = direction_signs(ctx.enemy, ctx.target);
    for _ in 0..RANDOM_POINT_MAX_ATTEMPTS {
        let unit = Vec2::new(
            rng.gen_range(0.0..=1.0) * -signs.x,
            rng.gen_range(0.0..=1.0) * -signs.y,
        )
        .normalize_or_zero();
        let candidate = origin + unit * range;
        if candidate.distance(ctx.target) >= footprint {
            return Ok(candidate);
        }
    }
    Err(PathError::PlacementExhausted { attempts: RANDOM_POINT_MAX_ATTEMPTS })
}

fn direction_signs(enemy: Vec2, target: Vec2) -> Vec2 {
    let delta = enemy - target;
    Vec2::new(delta.x.signum(), delta.y.signum())
}

/// Longest extent of a collider, used as the keep-out distance around the target.
pub fn collider_max_length(collider: &ColliderShape) -> Result<f32, PathError> {
    match collider {
        ColliderShape::Box { size } | ColliderShape::Capsule { size } => Ok(size.length()),
        ColliderShape::Circle { radius } => Ok(radius * 2.0),
        other => Err(PathError::UnsupportedCollider(other.name())),
    }
}

#[derive(Debug, Clone)]
pub struct LinearStrategy {
    pub points: Vec<Vec2>,
}

impl LinearStrategy {
    #[must_use]
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    fn initialize(&self) -> Result<(), PathError> {
        if self.points.is_empty() {
            return Err(PathError::EmptyLinearPath);
        }
        Ok(())
    }

    fn generate(&self, index: usize) -> Result<Option<Vec2>, PathError> {
        if self.points.is_empty() {
            return Err(PathError::EmptyLinearPath);
        }
        Ok(self.points.get(index).copied())
    }
}
