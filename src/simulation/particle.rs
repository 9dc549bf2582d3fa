//! Particle state: position, velocity, trail history and derived temperature

use std::collections::VecDeque;

use cgmath::{InnerSpace, Vector2};

/// Temperature given to freshly seeded particles, before the first step
pub const INITIAL_TEMPERATURE: f32 = 1.0;

/// Bounded FIFO of past positions, oldest first
///
/// Pushing beyond `max_len` evicts the oldest entry. A trail with
/// `max_len == 0` never stores anything.
#[derive(Clone, Debug, Default)]
pub struct Trail {
    points: VecDeque<Vector2<f32>>,
    max_len: usize,
}

impl Trail {
    pub fn new(max_len: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    pub fn push(&mut self, point: Vector2<f32>) {
        if self.max_len == 0 {
            return;
        }
        if self.points.len() == self.max_len {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Points from oldest to newest
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Vector2<f32>> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// A single test particle orbiting the attractor
#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vector2<f32>,
    pub velocity: Vector2<f32>,
    pub(crate) trail: Trail,
    pub(crate) temperature: f32,
}

impl Particle {
    /// Creates a particle with an empty trail holding at most `trail_length` points
    pub fn new(position: Vector2<f32>, velocity: Vector2<f32>, trail_length: usize) -> Self {
        Self {
            position,
            velocity,
            trail: Trail::new(trail_length),
            temperature: INITIAL_TEMPERATURE,
        }
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Temperature derived from speed and distance on the last step
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }
}
