//! Scripted navigator for state machine tests.

use std::cell::RefCell;

use bevy::prelude::*;
use rand::RngCore;

use super::Navigator;

#[derive(Debug, Default)]
pub struct MockNavigator {
    pub destination: Option<Vec3>,
    pub halted: bool,
    pub speed: f32,
    pub arrived: bool,
    pub reject_destinations: bool,
    pub sample_fails: bool,
    pub accepted: Vec<Vec3>,
    pub rejected: usize,
    pub halts: usize,
    /// Radius of every `try_sample_navigable_point` call, in order
    pub sampled_radii: RefCell<Vec<f32>>,
}

impl Navigator for MockNavigator {
    fn set_destination(&mut self, point: Vec3) -> bool {
        if self.reject_destinations {
            self.rejected += 1;
            return false;
        }
        self.destination = Some(point);
        self.accepted.push(point);
        true
    }

    fn has_arrived(&self) -> bool {
        self.arrived
    }

    fn halt(&mut self) {
        self.halted = true;
        self.halts += 1;
    }

    fn resume(&mut self) {
        self.halted = false;
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    fn try_sample_navigable_point(
        &self,
        center: Vec3,
        radius: f32,
        _max_attempts: u32,
        _rng: &mut dyn RngCore,
    ) -> Option<Vec3> {
        self.sampled_radii.borrow_mut().push(radius);
        (!self.sample_fails).then_some(center)
    }
}
