//! Enemy path sections: a bidirectional cursor over a lazily built chain of
//! waypoints.
//!
//! Each [`EnemyPathSection`] owns an arena of [`LinkedPoint`]s. Slot `i` of
//! the path is arena index `i`; a slot is materialized the first time the
//! cursor moves forward onto it and reused on every later visit. Running out
//! of points is not an error: `next_point` returns `None` (the end-of-path
//! sentinel) and the cursor parks one past the last node.
//!
//! # Example:
//!
//! ```
//! use bevy::math::Vec2;
//! use sidestep::path::{EnemyPathSection, PathContext, PathSectionConfig};
//!
//! let config = PathSectionConfig::Linear(vec![Vec2::ZERO, Vec2::X]);
//! let mut section = EnemyPathSection::from_config(&config).unwrap();
//! let ctx = PathContext::default();
//! let mut rng = rand::thread_rng();
//! assert_eq!(section.next_point(&ctx, &mut rng).unwrap().map(|p| p.position), Some(Vec2::ZERO));
//! ```
pub mod config;
pub mod strategy;

use bevy::math::Vec2;
use rand::Rng;
use thiserror::Error;

pub use config::{ColliderShape, PathSectionConfig, PointSourceConfig};
pub use strategy::{LinearStrategy, PathStrategy, PointSource, RandomStrategy, RANDOM_POINT_MAX_ATTEMPTS};

/// Index of a node inside its section's arena.
pub type PointId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Random,
    Linear,
}

/// One waypoint of a path. `previous`/`next` are arena indices, not owners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkedPoint {
    pub id: PointId,
    pub position: Vec2,
    pub kind: PointKind,
    pub previous: Option<PointId>,
    pub next: Option<PointId>,
}

/// Positions the random strategy needs from the outside world.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathContext {
    /// Current position of the enemy walking the path.
    pub enemy: Vec2,
    /// Position the enemy is facing off against (the player).
    pub target: Vec2,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error(
        "points range {range} cannot be smaller than the collider max length {footprint}; \
         decrease the collider size or increase the points range"
    )]
    RangeSmallerThanCollider { range: f32, footprint: f32 },
    #[error("incompatible collider type: {0}")]
    UnsupportedCollider(&'static str),
    #[error("linear section contains no points")]
    EmptyLinearPath,
    #[error("path section used before initialize()")]
    NotInitialized,
    #[error("no random point outside the collider footprint after {attempts} attempts")]
    PlacementExhausted { attempts: u32 },
    #[error("enemy path contains no sections")]
    EmptyPath,
}

#[derive(Debug, Clone)]
pub struct EnemyPathSection {
    strategy: PathStrategy,
    nodes: Vec<LinkedPoint>,
    /// -1 before the first step, `nodes.len()` once the end has been reached.
    index: isize,
    initialized: bool,
}

impl EnemyPathSection {
    #[must_use]
    pub fn new(strategy: PathStrategy) -> Self {
        Self {
            strategy,
            nodes: Vec::new(),
            index: -1,
            initialized: false,
        }
    }

    /// Build and initialize a section from level data.
    ///
    /// # Arguments
    /// * `config` - one section as authored in the level file
    ///
    /// # Return
    /// * `EnemyPathSection` - a section ready for `next_point`, cursor at -1.
    ///
    /// # Errors
    /// Returns the configuration error reported by [`initialize`](Self::initialize).
    pub fn from_config(config: &PathSectionConfig) -> Result<Self, PathError> {
        let mut section = Self::new(PathStrategy::from_config(config));
        section.initialize()?;
        Ok(section)
    }

    /// Validate the configuration and precompute the collider footprint.
    ///
    /// # Errors
    /// Fails when the collider shape is unsupported, when its diagonal
    /// exceeds the points range, or when a linear section has no points.
    pub fn initialize(&mut self) -> Result<(), PathError> {
        self.strategy.initialize()?;
        self.initialized = true;
        Ok(())
    }

    #[must_use]
    pub fn strategy(&self) -> &PathStrategy {
        &self.strategy
    }

    #[must_use]
    pub fn current_index(&self) -> isize {
        self.index
    }

    #[must_use]
    pub fn section_length(&self) -> usize {
        self.strategy.section_length()
    }

    #[must_use]
    pub fn current_point(&self) -> Option<&LinkedPoint> {
        usize::try_from(self.index).ok().and_then(|i| self.nodes.get(i))
    }

    #[must_use]
    pub fn point(&self, id: PointId) -> Option<&LinkedPoint> {
        self.nodes.get(id)
    }

    /// Nodes materialized so far, in path order.
    #[must_use]
    pub fn materialized(&self) -> &[LinkedPoint] {
        &self.nodes
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.index >= 0 && self.index as usize == self.nodes.len()
    }

    /// Advance the cursor one step.
    ///
    /// # Arguments
    /// * `ctx` - enemy and target positions, read by random range placement only
    /// * `rng` - random source for manual draws and range sampling
    ///
    /// # Return
    /// * `Option<&LinkedPoint>` - the node at the new index, or `None` at the
    ///   end of the path; the cursor then stays put.
    ///
    /// # Errors
    /// `NotInitialized` before [`initialize`](Self::initialize), and
    /// `PlacementExhausted` when random placement gives up. In the latter case
    /// the cursor and point budget are unchanged, so the call can be retried.
    pub fn next_point<R: Rng + ?Sized>(
        &mut self,
        ctx: &PathContext,
        rng: &mut R,
    ) -> Result<Option<&LinkedPoint>, PathError> {
        if !self.initialized {
            return Err(PathError::NotInitialized);
        }
        if self.is_at_end() {
            return Ok(None);
        }

        let slot = (self.index + 1) as usize;
        if slot < self.nodes.len() {
            self.index += 1;
            return Ok(self.nodes.get(slot));
        }

        match self.strategy.generate(slot, ctx, rng)? {
            Some(position) => {
                let previous = slot.checked_sub(1);
                if let Some(prev) = previous {
                    self.nodes[prev].next = Some(slot);
                }
                self.nodes.push(LinkedPoint {
                    id: slot,
                    position,
                    kind: self.strategy.kind(),
                    previous,
                    next: None,
                });
                self.index += 1;
                Ok(self.nodes.get(slot))
            }
            None => {
                self.index += 1;
                Ok(None)
            }
        }
    }

    /// Step back through already materialized nodes. Never generates.
    ///
    /// Returns `None` when the cursor moves before the first node, and stays
    /// at -1 if it is already there.
    pub fn previous_point(&mut self) -> Option<&LinkedPoint> {
        if self.index < 0 {
            return None;
        }
        self.index -= 1;
        self.current_point()
    }

    /// Forget the materialized chain and restore the point budget.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.index = -1;
        self.strategy.reset();
    }
}

/// Sections chained one after another, walked as a single path.
#[derive(Debug, Clone)]
pub struct EnemyPath {
    sections: Vec<EnemyPathSection>,
    active: usize,
}

impl EnemyPath {
    /// # Errors
    /// `EmptyPath` for an empty list, otherwise the first section error.
    pub fn from_configs(configs: &[PathSectionConfig]) -> Result<Self, PathError> {
        if configs.is_empty() {
            return Err(PathError::EmptyPath);
        }
        let sections = configs
            .iter()
            .map(EnemyPathSection::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sections, active: 0 })
    }

    #[must_use]
    pub fn sections(&self) -> &[EnemyPathSection] {
        &self.sections
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn active_section(&self) -> &EnemyPathSection {
        &self.sections[self.active]
    }

    #[must_use]
    pub fn current_point(&self) -> Option<&LinkedPoint> {
        self.active_section().current_point()
    }

    /// Advance, rolling over into the next section when the active one ends.
    ///
    /// # Errors
    /// Propagates the active section's error.
    pub fn next_point<R: Rng + ?Sized>(
        &mut self,
        ctx: &PathContext,
        rng: &mut R,
    ) -> Result<Option<&LinkedPoint>, PathError> {
        loop {
            let id = self.sections[self.active].next_point(ctx, rng)?.map(|p| p.id);
            if let Some(id) = id {
                return Ok(self.sections[self.active].point(id));
            }
            if self.active + 1 >= self.sections.len() {
                return Ok(None);
            }
            self.active += 1;
        }
    }

    /// Step back, rolling over into the previous section past its start.
    pub fn previous_point(&mut self) -> Option<&LinkedPoint> {
        loop {
            let id = self.sections[self.active].previous_point().map(|p| p.id);
            if let Some(id) = id {
                return self.sections[self.active].point(id);
            }
            if self.active == 0 {
                return None;
            }
            self.active -= 1;
        }
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
        self.active = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::strategy::collider_max_length;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn linear(points: &[Vec2]) -> EnemyPathSection {
        EnemyPathSection::from_config(&PathSectionConfig::Linear(points.to_vec())).unwrap()
    }

    fn positions(section: &mut EnemyPathSection, ctx: &PathContext, rng: &mut StdRng) -> Vec<Vec2> {
        let mut out = Vec::new();
        while let Some(p) = section.next_point(ctx, rng).unwrap() {
            out.push(p.position);
        }
        out
    }

    #[test]
    fn linear_walks_forward_then_reports_end() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(4.0, 3.0)];
        let mut section = linear(&pts);
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = PathContext::default();

        for (i, expected) in pts.iter().enumerate() {
            let p = section.next_point(&ctx, &mut rng).unwrap().unwrap();
            assert_eq!(p.position, *expected);
            assert_eq!(p.kind, PointKind::Linear);
            assert_eq!(section.current_index(), i as isize);
        }
        assert!(section.next_point(&ctx, &mut rng).unwrap().is_none());
        assert_eq!(section.current_index(), 3);
        // parked at the end
        assert!(section.next_point(&ctx, &mut rng).unwrap().is_none());
        assert_eq!(section.current_index(), 3);
        assert!(section.current_point().is_none());
    }

    #[test]
    fn linear_previous_retraces_the_same_nodes() {
        let pts = [Vec2::new(1.0, 1.0), Vec2::new(2.0, 5.0), Vec2::new(-3.0, 5.0)];
        let mut section = linear(&pts);
        let mut rng = StdRng::seed_from_u64(2);
        let ctx = PathContext::default();

        let mut forward = Vec::new();
        while let Some(p) = section.next_point(&ctx, &mut rng).unwrap() {
            forward.push((p.id, p.position));
        }

        let mut backward = Vec::new();
        while let Some(p) = section.previous_point() {
            backward.push((p.id, p.position));
        }
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(section.materialized()[1].previous, Some(0));
        assert_eq!(section.materialized()[1].next, Some(2));
        assert_eq!(section.current_index(), -1);
        assert!(section.previous_point().is_none());
        assert_eq!(section.current_index(), -1);
    }

    #[test]
    fn revisiting_a_slot_reuses_the_node() {
        let mut section = linear(&[Vec2::ZERO, Vec2::X, Vec2::Y]);
        let mut rng = StdRng::seed_from_u64(3);
        let ctx = PathContext::default();

        section.next_point(&ctx, &mut rng).unwrap();
        let second = *section.next_point(&ctx, &mut rng).unwrap().unwrap();
        section.previous_point();
        let again = *section.next_point(&ctx, &mut rng).unwrap().unwrap();
        assert_eq!(second, again);
        assert_eq!(section.materialized().len(), 2);
        assert_eq!(section.materialized()[0].next, Some(1));
        assert_eq!(section.materialized()[1].previous, Some(0));
    }

    #[test]
    fn empty_linear_section_is_rejected() {
        let err = EnemyPathSection::from_config(&PathSectionConfig::Linear(Vec::new())).unwrap_err();
        assert_eq!(err, PathError::EmptyLinearPath);
    }

    #[test]
    fn uninitialized_section_refuses_to_advance() {
        let mut section = EnemyPathSection::new(PathStrategy::Linear(LinearStrategy::new(vec![Vec2::ZERO])));
        let mut rng = StdRng::seed_from_u64(4);
        let err = section.next_point(&PathContext::default(), &mut rng).unwrap_err();
        assert_eq!(err, PathError::NotInitialized);
    }

    #[test]
    fn manual_points_are_each_visited_once() {
        let manual = vec![Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(4.0, 0.0)];
        let config = PathSectionConfig::Random {
            origin: Vec2::new(0.0, 10.0),
            points_range: 5.0,
            source: PointSourceConfig::Manual(manual.clone()),
        };
        let mut section = EnemyPathSection::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let ctx = PathContext::default();

        for _ in 0..3 {
            let visited = positions(&mut section, &ctx, &mut rng);
            assert_eq!(visited[0], Vec2::new(0.0, 10.0));
            let mut rest: Vec<_> = visited[1..].iter().map(|v| v.x as i32).collect();
            rest.sort_unstable();
            assert_eq!(rest, vec![1, 2, 3, 4]);
            section.reset();
        }
        assert_eq!(section.section_length(), 4);
    }

    #[test]
    fn range_points_stay_on_circle_and_clear_the_target() {
        let origin = Vec2::ZERO;
        let config = PathSectionConfig::Random {
            origin,
            points_range: 2.0,
            source: PointSourceConfig::Range { count: 20, collider: ColliderShape::Circle { radius: 0.5 } },
        };
        let mut section = EnemyPathSection::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let ctx = PathContext { enemy: Vec2::new(5.0, 5.0), target: Vec2::new(-1.2, -1.2) };

        let visited = positions(&mut section, &ctx, &mut rng);
        assert_eq!(visited.len(), 21);
        for p in &visited[1..] {
            assert!((p.distance(origin) - 2.0).abs() < 1e-4);
            assert!(p.distance(ctx.target) >= 1.0);
            assert!(p.x <= 0.0 && p.y <= 0.0);
        }
    }

    #[test]
    fn unsatisfiable_placement_gives_up_and_keeps_budget() {
        let config = PathSectionConfig::Random {
            origin: Vec2::ZERO,
            points_range: 2.0,
            source: PointSourceConfig::Range { count: 3, collider: ColliderShape::Box { size: Vec2::new(2.0, 0.0) } },
        };
        let mut section = EnemyPathSection::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let ctx = PathContext { enemy: Vec2::new(5.0, 5.0), target: Vec2::new(-1.2, -1.2) };

        assert!(section.next_point(&ctx, &mut rng).unwrap().is_some());
        let err = section.next_point(&ctx, &mut rng).unwrap_err();
        assert_eq!(err, PathError::PlacementExhausted { attempts: RANDOM_POINT_MAX_ATTEMPTS });
        assert_eq!(section.current_index(), 0);
        match section.strategy() {
            PathStrategy::Random(RandomStrategy { source: PointSource::Range { remaining, .. }, .. }) => {
                assert_eq!(*remaining, 3);
            }
            other => panic!("unexpected strategy {other:?}"),
        }
    }

    #[test]
    fn collider_larger_than_range_is_fatal() {
        let config = PathSectionConfig::Random {
            origin: Vec2::ZERO,
            points_range: 1.0,
            source: PointSourceConfig::Range { count: 2, collider: ColliderShape::Box { size: Vec2::new(3.0, 4.0) } },
        };
        let err = EnemyPathSection::from_config(&config).unwrap_err();
        assert_eq!(err, PathError::RangeSmallerThanCollider { range: 1.0, footprint: 5.0 });
    }

    #[test]
    fn polygon_collider_is_unsupported() {
        let config = PathSectionConfig::Random {
            origin: Vec2::ZERO,
            points_range: 4.0,
            source: PointSourceConfig::Range {
                count: 2,
                collider: ColliderShape::Polygon { points: vec![Vec2::ZERO, Vec2::X, Vec2::Y] },
            },
        };
        let err = EnemyPathSection::from_config(&config).unwrap_err();
        assert_eq!(err, PathError::UnsupportedCollider("polygon"));
    }

    #[test]
    fn collider_footprints() {
        assert_eq!(collider_max_length(&ColliderShape::Box { size: Vec2::new(3.0, 4.0) }), Ok(5.0));
        assert_eq!(collider_max_length(&ColliderShape::Capsule { size: Vec2::new(6.0, 8.0) }), Ok(10.0));
        assert_eq!(collider_max_length(&ColliderShape::Circle { radius: 0.75 }), Ok(1.5));
        assert_eq!(
            collider_max_length(&ColliderShape::Polygon { points: vec![Vec2::ZERO] }),
            Err(PathError::UnsupportedCollider("polygon"))
        );
    }

    #[test]
    fn capsule_diagonal_is_checked_against_the_range() {
        let capsule = |points_range| PathSectionConfig::Random {
            origin: Vec2::ZERO,
            points_range,
            source: PointSourceConfig::Range { count: 1, collider: ColliderShape::Capsule { size: Vec2::new(3.0, 4.0) } },
        };
        assert!(EnemyPathSection::from_config(&capsule(5.0)).is_ok());
        let err = EnemyPathSection::from_config(&capsule(4.0)).unwrap_err();
        assert_eq!(err, PathError::RangeSmallerThanCollider { range: 4.0, footprint: 5.0 });
    }

    #[test]
    fn manual_order_changes_across_resets() {
        let manual: Vec<Vec2> = (1..=6).map(|i| Vec2::new(i as f32, 0.0)).collect();
        let config = PathSectionConfig::Random {
            origin: Vec2::ZERO,
            points_range: 5.0,
            source: PointSourceConfig::Manual(manual),
        };
        let mut section = EnemyPathSection::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let ctx = PathContext::default();

        let mut orders = Vec::new();
        for _ in 0..8 {
            let visited = positions(&mut section, &ctx, &mut rng);
            let order: Vec<i32> = visited[1..].iter().map(|v| v.x as i32).collect();
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6]);
            orders.push(order);
            section.reset();
        }
        // 8 passes over 720 permutations; all equal would mean no reshuffle
        assert!(orders.iter().any(|o| *o != orders[0]));
    }

    #[test]
    fn reset_discards_the_old_chain() {
        let config = PathSectionConfig::Random {
            origin: Vec2::ZERO,
            points_range: 3.0,
            source: PointSourceConfig::Range { count: 4, collider: ColliderShape::Circle { radius: 0.25 } },
        };
        let mut section = EnemyPathSection::from_config(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        let ctx = PathContext { enemy: Vec2::new(-4.0, 2.0), target: Vec2::new(6.0, -3.0) };

        let before = positions(&mut section, &ctx, &mut rng);
        section.reset();
        assert!(section.current_point().is_none());
        assert!(section.materialized().is_empty());
        assert!(section.previous_point().is_none());

        let after = positions(&mut section, &ctx, &mut rng);
        assert_eq!(before.len(), after.len());
        assert_ne!(before[1..], after[1..]);
    }

    #[test]
    fn chained_sections_roll_over_both_ways() {
        let configs = vec![
            PathSectionConfig::Linear(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)]),
            PathSectionConfig::Linear(vec![Vec2::new(2.0, 0.0)]),
        ];
        let mut path = EnemyPath::from_configs(&configs).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let ctx = PathContext::default();

        let mut xs = Vec::new();
        while let Some(p) = path.next_point(&ctx, &mut rng).unwrap() {
            xs.push(p.position.x);
        }
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        assert_eq!(path.active_index(), 1);

        let mut back = Vec::new();
        while let Some(p) = path.previous_point() {
            back.push(p.position.x);
        }
        assert_eq!(back, vec![2.0, 1.0, 0.0]);
        assert_eq!(path.active_index(), 0);
        assert!(EnemyPath::from_configs(&[]).is_err());
    }
}
