//! People-related components: Worker and Crew.

use serde::{Deserialize, Serialize};
use sitework_logic::resources::Profession;

use super::{CrewId, JobId, WorkerId};

/// Morale a freshly formed crew starts with.
pub const DEFAULT_MORALE: u8 = 70;

/// A hired worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub profession: Profession,
    /// True while the worker's crew is bound to an Active job.
    pub engaged: bool,
}

impl Worker {
    pub fn new(id: WorkerId, profession: Profession) -> Self {
        Self {
            id,
            profession,
            engaged: false,
        }
    }
}

/// A named group of workers that takes on one job at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crew {
    pub id: CrewId,
    pub name: String,
    /// Member workers; order carries no meaning.
    pub workers: Vec<WorkerId>,
    pub capacity: u32,
    /// 0-100
    pub morale: u8,
    pub engaged: bool,
    /// Job holding this crew while engaged.
    pub job: Option<JobId>,
}

impl Crew {
    pub fn new(id: CrewId, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            workers: Vec::new(),
            capacity,
            morale: DEFAULT_MORALE,
            engaged: false,
            job: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.workers.len() as u32 >= self.capacity
    }

    /// Apply a morale delta, clamped to 0-100.
    pub fn adjust_morale(&mut self, delta: i32) {
        self.morale = (self.morale as i32 + delta).clamp(0, 100) as u8;
    }
}
