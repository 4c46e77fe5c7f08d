//! Lecturer assignment policies

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::SliceRandom;

use crate::config::AssignmentPolicyKind;

/// Picks the responding lecturer for a new complaint.
pub trait AssignmentPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Choose one of `lecturers`. Returns `None` only when the slice is empty.
    fn choose(&self, course_code: &str, lecturers: &[String]) -> Option<String>;
}

/// Uniform random choice among eligible lecturers
#[derive(Debug, Default)]
pub struct UniformRandomAssignment;

impl AssignmentPolicy for UniformRandomAssignment {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(&self, _course_code: &str, lecturers: &[String]) -> Option<String> {
        lecturers.choose(&mut rand::thread_rng()).cloned()
    }
}

/// Rotates through a course's lecturers, one counter per course
#[derive(Debug, Default)]
pub struct RoundRobinAssignment {
    cursors: Mutex<HashMap<String, usize>>,
}

impl RoundRobinAssignment {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssignmentPolicy for RoundRobinAssignment {
    fn name(&self) -> &'static str {
        "round_robin"
    }

    fn choose(&self, course_code: &str, lecturers: &[String]) -> Option<String> {
        if lecturers.is_empty() {
            return None;
        }
        let mut cursors = self.cursors.lock();
        let cursor = cursors.entry(course_code.to_string()).or_insert(0);
        let picked = lecturers[*cursor % lecturers.len()].clone();
        *cursor = cursor.wrapping_add(1);
        Some(picked)
    }
}

pub fn policy_for(kind: AssignmentPolicyKind) -> Arc<dyn AssignmentPolicy> {
    match kind {
        AssignmentPolicyKind::Random => Arc::new(UniformRandomAssignment),
        AssignmentPolicyKind::RoundRobin => Arc::new(RoundRobinAssignment::new()),
    }
}
