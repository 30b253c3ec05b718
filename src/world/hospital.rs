//! Hospital triage - capacity enforcement and admission queueing
//!
//! Each hospital holds `occupancy <= capacity` at all times. Admissions
//! beyond capacity queue (ordered by severity, then arrival) and the world
//! records one overflow event per queued admission; nothing is silently
//! dropped.

use ordered_float::NotNan;

use crate::core::types::{GridPos, HospitalId, SurvivorId, Tick};

/// Outcome of one admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// Bed free, survivor rescued immediately
    Admitted,
    /// At capacity; queued for the next free bed
    Queued,
}

#[derive(Debug, Clone)]
struct QueueEntry {
    survivor: SurvivorId,
    /// Health at arrival; lower = more severe = served first
    severity: NotNan<f32>,
    arrival: Tick,
}

#[derive(Debug, Clone)]
pub struct Hospital {
    pub id: HospitalId,
    pub pos: GridPos,
    pub capacity: u32,
    pub occupancy: u32,
    queue: Vec<QueueEntry>,
}

impl Hospital {
    pub fn new(id: HospitalId, pos: GridPos, capacity: u32) -> Self {
        assert!(capacity > 0, "hospital capacity must be positive");
        Self {
            id,
            pos,
            capacity,
            occupancy: 0,
            queue: Vec::new(),
        }
    }

    pub fn has_free_bed(&self) -> bool {
        self.occupancy < self.capacity
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Admit or queue one survivor. `health` is the severity key.
    pub fn admit(&mut self, survivor: SurvivorId, health: f32, tick: Tick) -> AdmitOutcome {
        if self.has_free_bed() {
            self.occupancy += 1;
            return AdmitOutcome::Admitted;
        }
        let severity = NotNan::new(health).unwrap_or_default();
        self.queue.push(QueueEntry {
            survivor,
            severity,
            arrival: tick,
        });
        // most severe (lowest health) first, earliest arrival breaks ties;
        // stable sort keeps same-key entries in insertion order
        self.queue.sort_by_key(|e| (e.severity, e.arrival));
        AdmitOutcome::Queued
    }

    /// Free one bed (patient discharged by the service process).
    pub fn discharge(&mut self) {
        debug_assert!(self.occupancy > 0, "discharge from empty hospital");
        self.occupancy = self.occupancy.saturating_sub(1);
    }

    /// Promote the highest-priority queued survivor into a free bed.
    pub fn promote(&mut self) -> Option<SurvivorId> {
        if !self.has_free_bed() || self.queue.is_empty() {
            return None;
        }
        let entry = self.queue.remove(0);
        self.occupancy += 1;
        Some(entry.survivor)
    }

    /// Drop a survivor from the queue (died while waiting).
    pub fn purge(&mut self, survivor: SurvivorId) {
        self.queue.retain(|e| e.survivor != survivor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hospital(capacity: u32) -> Hospital {
        Hospital::new(HospitalId(0), GridPos::new(0, 0), capacity)
    }

    #[test]
    fn admits_until_capacity_then_queues() {
        let mut h = hospital(2);
        assert_eq!(h.admit(SurvivorId(0), 50.0, 1), AdmitOutcome::Admitted);
        assert_eq!(h.admit(SurvivorId(1), 60.0, 1), AdmitOutcome::Admitted);
        assert_eq!(h.admit(SurvivorId(2), 70.0, 2), AdmitOutcome::Queued);
        assert_eq!(h.occupancy, 2);
        assert_eq!(h.queue_len(), 1);
        assert!(h.occupancy <= h.capacity);
    }

    #[test]
    fn queue_orders_by_severity_then_arrival() {
        let mut h = hospital(1);
        h.admit(SurvivorId(0), 90.0, 0);
        h.admit(SurvivorId(1), 50.0, 3); // later but more severe
        h.admit(SurvivorId(2), 80.0, 1);
        h.admit(SurvivorId(3), 50.0, 2); // same severity, earlier arrival
        h.discharge();
        assert_eq!(h.promote(), Some(SurvivorId(3)));
        h.discharge();
        assert_eq!(h.promote(), Some(SurvivorId(1)));
        h.discharge();
        assert_eq!(h.promote(), Some(SurvivorId(2)));
    }

    #[test]
    fn promote_respects_capacity() {
        let mut h = hospital(1);
        h.admit(SurvivorId(0), 50.0, 0);
        h.admit(SurvivorId(1), 40.0, 1);
        assert_eq!(h.promote(), None); // no free bed yet
        h.discharge();
        assert_eq!(h.promote(), Some(SurvivorId(1)));
        assert_eq!(h.occupancy, 1);
    }

    #[test]
    fn purge_removes_dead_from_queue() {
        let mut h = hospital(1);
        h.admit(SurvivorId(0), 50.0, 0);
        h.admit(SurvivorId(1), 40.0, 1);
        h.purge(SurvivorId(1));
        h.discharge();
        assert_eq!(h.promote(), None);
    }
}
