//! Ordered list of train schedules.

use gridprint_core::error::BlueprintError;
use gridprint_core::id::{EntityId, ListId};
use gridprint_core::schedule::Schedule;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleList {
    schedules: Vec<Schedule>,
}

fn out_of_range(index: usize, len: usize) -> BlueprintError {
    BlueprintError::IndexOutOfRange { index, len }
}

impl ScheduleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Schedule> {
        self.schedules.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Schedule> {
        self.schedules.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Schedule> {
        self.schedules.get_mut(index)
    }

    pub fn append(&mut self, schedule: Schedule) {
        self.schedules.push(schedule);
    }

    pub fn insert(&mut self, index: usize, schedule: Schedule) -> Result<(), BlueprintError> {
        if index > self.schedules.len() {
            return Err(out_of_range(index, self.schedules.len()));
        }
        self.schedules.insert(index, schedule);
        Ok(())
    }

    /// Replace the schedule at `index`, returning the old one.
    pub fn set(&mut self, index: usize, schedule: Schedule) -> Result<Schedule, BlueprintError> {
        let len = self.schedules.len();
        let slot = self.schedules.get_mut(index).ok_or_else(|| out_of_range(index, len))?;
        Ok(std::mem::replace(slot, schedule))
    }

    pub fn remove(&mut self, index: usize) -> Result<Schedule, BlueprintError> {
        if index >= self.schedules.len() {
            return Err(out_of_range(index, self.schedules.len()));
        }
        Ok(self.schedules.remove(index))
    }

    pub fn clear(&mut self) {
        self.schedules.clear();
    }

    /// Move locomotive references made in `from` over to `to`.
    pub fn rescope(&mut self, from: ListId, to: ListId) {
        for schedule in &mut self.schedules {
            for locomotive in &mut schedule.locomotives {
                locomotive.rescope(from, to);
            }
        }
    }

    /// Drop `locomotive` from every schedule that runs it.
    pub fn forget_locomotive(&mut self, locomotive: EntityId) {
        for schedule in &mut self.schedules {
            schedule.remove_locomotive(locomotive);
        }
    }
}

impl<'a> IntoIterator for &'a ScheduleList {
    type Item = &'a Schedule;
    type IntoIter = std::slice::Iter<'a, Schedule>;

    fn into_iter(self) -> Self::IntoIter {
        self.schedules.iter()
    }
}
