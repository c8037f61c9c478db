use crate::config::RingSpec;
use glam::Vec3;

/// A checkpoint of the course.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    position: Vec3,
    order_index: usize,
    radius: f32,
    has_passed: bool,
    active: bool,
}

impl Ring {
    pub fn position(&self) -> Vec3 { self.position }
    pub fn order_index(&self) -> usize { self.order_index }
    pub fn radius(&self) -> f32 { self.radius }
    pub fn has_passed(&self) -> bool { self.has_passed }
    pub fn is_active(&self) -> bool { self.active }
}

/// The ordered rings of one level.
///
/// The passed flags are set by whatever detects the vehicle flying through a ring; the
/// session reads them and resets those that were set out of order.
#[derive(Debug, Clone, PartialEq)]
pub struct RingCourse {
    rings: Vec<Ring>,
}

impl RingCourse {
    pub fn new(specs: &[RingSpec]) -> Self {
        let rings = specs
            .iter()
            .enumerate()
            .map(|(order_index, spec)| Ring {
                position: spec.position,
                order_index,
                radius: spec.radius,
                has_passed: false,
                active: true,
            })
            .collect();
        Self { rings }
    }

    pub fn len(&self) -> usize { self.rings.len() }
    pub fn is_empty(&self) -> bool { self.rings.is_empty() }
    pub fn ring(&self, index: usize) -> Option<&Ring> { self.rings.get(index) }
    pub fn rings(&self) -> &[Ring] { &self.rings }

    /// Raises the passed flag of ring `index`. Out-of-range indices are ignored.
    pub fn mark_passed(&mut self, index: usize) {
        if let Some(ring) = self.rings.get_mut(index) {
            ring.has_passed = true;
        }
    }

    /// Clears the passed flag of every ring after `next`, the ring that has to be passed
    /// next.
    pub fn enforce_order(&mut self, next: usize) {
        for ring in self.rings.iter_mut().skip(next + 1) {
            ring.has_passed = false;
        }
    }

    /// Deactivates ring `next` if its passed flag is set.
    ///
    /// # Returns
    /// - `true` if the ring was passed and is now deactivated.
    pub fn take_passage(&mut self, next: usize) -> bool {
        match self.rings.get_mut(next) {
            Some(ring) if ring.has_passed && ring.active => {
                ring.active = false;
                true
            }
            _ => false,
        }
    }

    /// Trigger-volume check: raises the passed flag of every active ring whose sphere
    /// contains `position`.
    ///
    /// # Returns
    /// - The order indices of the rings whose flag was newly raised.
    pub fn trigger_at(&mut self, position: Vec3) -> Vec<usize> {
        let mut hit = Vec::new();
        for ring in self.rings.iter_mut().filter(|r| r.active && !r.has_passed) {
            if ring.position.distance(position) <= ring.radius {
                ring.has_passed = true;
                hit.push(ring.order_index);
            }
        }
        hit
    }
}
