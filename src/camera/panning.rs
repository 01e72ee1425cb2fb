//! Segment-locked follow camera.
//!
//! The camera always sits between a *previous* and a *next* panning point.
//! The pair's dominant axis (larger coordinate delta) is the axis the camera
//! follows the target on; the other axis is pinned to the segment. Crossing
//! either endpoint snaps the camera onto it and tries to move the cursor to
//! the adjacent segment. When that segment runs along the other axis, the
//! move waits until the target has crossed the junction in the new
//! segment's flow direction.
use bevy::math::Vec2;
use thiserror::Error;

use super::smoothing::smooth_damp;

/// Response time of the follow smoothing, in seconds.
pub const DEFAULT_SMOOTH_TIME: f32 = 0.1;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanningError {
    #[error("scene panning needs at least two panning points, got {0}")]
    TooFewPoints(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanningPoint {
    pub position: Vec2,
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

/// Panning points laid out by level design, linked in authoring order.
#[derive(Debug, Clone, PartialEq)]
pub struct PanningPath {
    points: Vec<PanningPoint>,
}

impl PanningPath {
    /// Link `positions` in the order given.
    ///
    /// # Arguments
    /// * `positions` - panning points in world units, first to last
    ///
    /// # Errors
    /// `TooFewPoints` when fewer than two positions are given.
    pub fn from_positions(positions: &[Vec2]) -> Result<Self, PanningError> {
        if positions.len() < 2 {
            return Err(PanningError::TooFewPoints(positions.len()));
        }
        let last = positions.len() - 1;
        let points = positions
            .iter()
            .enumerate()
            .map(|(i, &position)| PanningPoint {
                position,
                previous: i.checked_sub(1),
                next: (i < last).then_some(i + 1),
            })
            .collect();
        Ok(Self { points })
    }

    #[must_use]
    pub fn points(&self) -> &[PanningPoint] {
        &self.points
    }

    #[must_use]
    pub fn get(&self, index: usize) -> &PanningPoint {
        &self.points[index]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanningType {
    Vertical,
    Horizontal,
}

impl PanningType {
    /// Vertical when the pair differs more in height than in width.
    #[must_use]
    pub fn between(previous: Vec2, next: Vec2) -> Self {
        let height = (previous.y - next.y).abs();
        let width = (previous.x - next.x).abs();
        if height > width {
            PanningType::Vertical
        } else {
            PanningType::Horizontal
        }
    }

    /// Coordinate of `v` along the followed axis.
    #[must_use]
    pub fn along(self, v: Vec2) -> f32 {
        match self {
            PanningType::Vertical => v.y,
            PanningType::Horizontal => v.x,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    Up,
    Down,
    Left,
    Right,
}

impl FlowDirection {
    /// Direction the coordinate grows in, going from `previous` to `next`.
    #[must_use]
    pub fn between(panning_type: PanningType, previous: Vec2, next: Vec2) -> Self {
        match panning_type {
            PanningType::Horizontal if previous.x < next.x => FlowDirection::Right,
            PanningType::Horizontal => FlowDirection::Left,
            PanningType::Vertical if previous.y < next.y => FlowDirection::Up,
            PanningType::Vertical => FlowDirection::Down,
        }
    }

    #[must_use]
    pub fn as_vec2(self) -> Vec2 {
        match self {
            FlowDirection::Up => Vec2::Y,
            FlowDirection::Down => Vec2::NEG_Y,
            FlowDirection::Left => Vec2::NEG_X,
            FlowDirection::Right => Vec2::X,
        }
    }

    /// `+1` for up/right, `-1` for down/left.
    #[must_use]
    pub fn sign(self) -> f32 {
        match self {
            FlowDirection::Up | FlowDirection::Right => 1.0,
            FlowDirection::Down | FlowDirection::Left => -1.0,
        }
    }

    /// Whether `target` lies strictly past `junction` when moving this way.
    #[must_use]
    pub fn is_past(self, target: Vec2, junction: Vec2) -> bool {
        match self {
            FlowDirection::Up => target.y > junction.y,
            FlowDirection::Down => target.y < junction.y,
            FlowDirection::Left => target.x < junction.x,
            FlowDirection::Right => target.x > junction.x,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shift {
    Forward,
    Backward,
}

/// Cursor over a [`PanningPath`] plus the follow smoothing state.
#[derive(Debug, Clone)]
pub struct ScenePanning {
    path: PanningPath,
    previous: usize,
    next: usize,
    panning_type: PanningType,
    flow: FlowDirection,
    velocity: f32,
    pub smooth_time: f32,
}

impl ScenePanning {
    /// Start on the first segment of `path`.
    #[must_use]
    pub fn new(path: PanningPath) -> Self {
        let mut panning = Self {
            path,
            previous: 0,
            next: 1,
            panning_type: PanningType::Horizontal,
            flow: FlowDirection::Right,
            velocity: 0.0,
            smooth_time: DEFAULT_SMOOTH_TIME,
        };
        panning.refresh_segment();
        panning
    }

    /// # Errors
    /// `TooFewPoints` when fewer than two positions are given.
    pub fn from_positions(positions: &[Vec2]) -> Result<Self, PanningError> {
        PanningPath::from_positions(positions).map(Self::new)
    }

    /// Camera position when the scene starts: the first panning point.
    #[must_use]
    pub fn start_position(&self) -> Vec2 {
        self.path.get(0).position
    }

    #[must_use]
    pub fn path(&self) -> &PanningPath {
        &self.path
    }

    #[must_use]
    pub fn previous_index(&self) -> usize {
        self.previous
    }

    #[must_use]
    pub fn next_index(&self) -> usize {
        self.next
    }

    #[must_use]
    pub fn panning_type(&self) -> PanningType {
        self.panning_type
    }

    #[must_use]
    pub fn flow(&self) -> FlowDirection {
        self.flow
    }

    fn point(&self, index: usize) -> Vec2 {
        self.path.get(index).position
    }

    /// Physics-step follow: damp the free axis toward the target and pin the
    /// other axis to the next point.
    ///
    /// # Arguments
    /// * `camera` - current camera position
    /// * `target` - position being followed (the player)
    /// * `dt` - fixed timestep in seconds
    ///
    /// # Return
    /// * `Vec2` - the new camera position.
    pub fn follow(&mut self, camera: Vec2, target: Vec2, dt: f32) -> Vec2 {
        let anchor = self.point(self.next);
        match self.panning_type {
            PanningType::Vertical => Vec2::new(
                anchor.x,
                smooth_damp(camera.y, target.y, &mut self.velocity, self.smooth_time, dt),
            ),
            PanningType::Horizontal => Vec2::new(
                smooth_damp(camera.x, target.x, &mut self.velocity, self.smooth_time, dt),
                anchor.y,
            ),
        }
    }

    /// Per-frame boundary check.
    ///
    /// # Arguments
    /// * `camera` - camera position after `follow`
    /// * `target` - followed position, used to hold back an axis switch at a junction
    ///
    /// # Return
    /// * `Vec2` - the camera position, snapped to a point when one was reached.
    pub fn lock(&mut self, camera: Vec2, target: Vec2) -> Vec2 {
        let next = self.point(self.next);
        let previous = self.point(self.previous);
        let sign = self.flow.sign();
        let axis = self.panning_type;

        if (axis.along(camera) - axis.along(next)) * sign >= 0.0 {
            if let Some(after) = self.path.get(self.next).next {
                self.try_shift(Shift::Forward, self.next, after, target);
            }
            next
        } else if (axis.along(camera) - axis.along(previous)) * sign <= 0.0 {
            if let Some(before) = self.path.get(self.previous).previous {
                self.try_shift(Shift::Backward, self.previous, before, target);
            }
            previous
        } else {
            camera
        }
    }

    fn try_shift(&mut self, shift: Shift, junction: usize, beyond: usize, target: Vec2) {
        let start = self.point(junction);
        let end = self.point(beyond);
        let upcoming = PanningType::between(start, end);
        if upcoming != self.panning_type {
            let upcoming_flow = FlowDirection::between(upcoming, start, end);
            if !upcoming_flow.is_past(target, start) {
                return;
            }
        }
        match shift {
            Shift::Forward => {
                self.previous = self.next;
                self.next = beyond;
            }
            Shift::Backward => {
                self.next = self.previous;
                self.previous = beyond;
            }
        }
        self.refresh_segment();
    }

    fn refresh_segment(&mut self) {
        let previous = self.point(self.previous);
        let next = self.point(self.next);
        self.panning_type = PanningType::between(previous, next);
        self.flow = FlowDirection::between(self.panning_type, previous, next);
    }
}
