//! Resource ledger - workers, crews, equipment units and warehouse stock.
//!
//! Workers, crews and equipment units are entities in a `hecs` world keyed
//! by stable ids; material stock lives in a capacity-bounded [`Warehouse`].
//! Availability queries are read-only. The directory mutations here refuse
//! to touch anything an Active job currently holds; commit and release go
//! through [`crate::reservation`].

use std::collections::{BTreeMap, BTreeSet};

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use sitework_logic::feasibility::AvailabilitySnapshot;
use sitework_logic::resources::{EquipmentType, MaterialType, Profession};

use crate::components::*;

/// Material stock bounded by a total capacity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Warehouse {
    stock: BTreeMap<MaterialType, u32>,
    capacity: u32,
}

impl Warehouse {
    pub fn new(capacity: u32) -> Self {
        Self {
            stock: BTreeMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn quantity(&self, material: MaterialType) -> u32 {
        self.stock.get(&material).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.stock.values().sum()
    }

    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    /// Add stock; rejected whole if it would overflow capacity.
    pub fn receive(&mut self, material: MaterialType, quantity: u32) -> Result<(), LedgerError> {
        let free = self.free_space();
        if quantity > free {
            return Err(LedgerError::WarehouseFull {
                requested: quantity,
                free,
            });
        }
        *self.stock.entry(material).or_insert(0) += quantity;
        Ok(())
    }

    /// Remove stock. Callers check availability first.
    pub(crate) fn debit(&mut self, material: MaterialType, quantity: u32) {
        let entry = self.stock.entry(material).or_insert(0);
        *entry = entry.saturating_sub(quantity);
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialType, u32)> + '_ {
        self.stock.iter().map(|(m, q)| (*m, *q))
    }
}

/// Directory of everything the company owns.
pub struct ResourceLedger {
    pub(crate) world: World,
    pub(crate) warehouse: Warehouse,
    pub(crate) next_worker_id: u32,
    pub(crate) next_crew_id: u32,
    pub(crate) next_unit_id: u32,
}

impl ResourceLedger {
    pub fn new(warehouse_capacity: u32) -> Self {
        Self {
            world: World::new(),
            warehouse: Warehouse::new(warehouse_capacity),
            next_worker_id: 0,
            next_crew_id: 0,
            next_unit_id: 0,
        }
    }

    // ── Directory mutations ────────────────────────────────────────────

    /// Hire a worker. New hires belong to no crew.
    pub fn hire_worker(&mut self, name: Name, profession: Profession) -> WorkerId {
        let id = WorkerId(self.next_worker_id);
        self.next_worker_id += 1;
        self.world.spawn((Worker::new(id, profession), name));
        id
    }

    pub fn form_crew(&mut self, name: impl Into<String>, capacity: u32) -> CrewId {
        let id = CrewId(self.next_crew_id);
        self.next_crew_id += 1;
        self.world.spawn((Crew::new(id, name, capacity),));
        id
    }

    /// Put a worker on a crew. A worker belongs to at most one crew.
    pub fn assign_to_crew(&mut self, worker: WorkerId, crew: CrewId) -> Result<(), LedgerError> {
        if self.worker_entity(worker).is_none() {
            return Err(LedgerError::UnknownWorker(worker));
        }
        if let Some(current) = self.crew_of(worker) {
            return Err(LedgerError::WorkerAlreadyInCrew {
                worker,
                crew: current,
            });
        }
        let entity = self.crew_entity(crew).ok_or(LedgerError::UnknownCrew(crew))?;
        let mut record = self
            .world
            .get::<&mut Crew>(entity)
            .map_err(|_| LedgerError::UnknownCrew(crew))?;
        if record.engaged {
            return Err(LedgerError::CrewEngaged(crew));
        }
        if record.is_full() {
            return Err(LedgerError::CrewFull {
                crew,
                capacity: record.capacity,
            });
        }
        record.workers.push(worker);
        Ok(())
    }

    /// Take a worker off their crew.
    pub fn remove_from_crew(&mut self, worker: WorkerId) -> Result<(), LedgerError> {
        let crew = self.crew_of(worker).ok_or(LedgerError::NotInCrew(worker))?;
        let entity = self.crew_entity(crew).ok_or(LedgerError::UnknownCrew(crew))?;
        let mut record = self
            .world
            .get::<&mut Crew>(entity)
            .map_err(|_| LedgerError::UnknownCrew(crew))?;
        if record.engaged {
            return Err(LedgerError::CrewEngaged(crew));
        }
        record.workers.retain(|w| *w != worker);
        Ok(())
    }

    /// Set a crew's morale directly (e.g. after a team event in the host).
    pub fn set_crew_morale(&mut self, crew: CrewId, morale: u8) -> Result<(), LedgerError> {
        let entity = self.crew_entity(crew).ok_or(LedgerError::UnknownCrew(crew))?;
        let mut record = self
            .world
            .get::<&mut Crew>(entity)
            .map_err(|_| LedgerError::UnknownCrew(crew))?;
        if record.engaged {
            return Err(LedgerError::CrewEngaged(crew));
        }
        record.morale = morale.min(100);
        Ok(())
    }

    pub fn add_equipment(&mut self, equipment_type: EquipmentType) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        self.world.spawn((EquipmentUnit::new(id, equipment_type),));
        id
    }

    /// Pull an idle unit into the repair shop.
    pub fn send_to_repair(&mut self, unit: UnitId) -> Result<(), LedgerError> {
        self.set_unit_state(unit, EquipmentState::Available, EquipmentState::UnderRepair)
    }

    pub fn finish_repair(&mut self, unit: UnitId) -> Result<(), LedgerError> {
        self.set_unit_state(unit, EquipmentState::UnderRepair, EquipmentState::Available)
    }

    fn set_unit_state(
        &mut self,
        unit: UnitId,
        from: EquipmentState,
        to: EquipmentState,
    ) -> Result<(), LedgerError> {
        let entity = self.unit_entity(unit).ok_or(LedgerError::UnknownUnit(unit))?;
        let mut record = self
            .world
            .get::<&mut EquipmentUnit>(entity)
            .map_err(|_| LedgerError::UnknownUnit(unit))?;
        if record.state == EquipmentState::Deployed {
            return Err(LedgerError::UnitDeployed(unit));
        }
        if record.state != from {
            return Err(LedgerError::UnexpectedUnitState {
                unit,
                state: record.state,
            });
        }
        record.state = to;
        Ok(())
    }

    /// Deliver material into the warehouse.
    pub fn receive_material(&mut self, material: MaterialType, quantity: u32) -> Result<(), LedgerError> {
        self.warehouse.receive(material, quantity)
    }

    // ── Availability queries ───────────────────────────────────────────

    /// Idle workers of a profession across all crews not bound to a job.
    pub fn idle_worker_count(&self, profession: Profession) -> u32 {
        self.idle_workers_by_profession()
            .get(&profession)
            .copied()
            .unwrap_or(0)
    }

    pub fn available_equipment_count(&self, equipment_type: EquipmentType) -> u32 {
        self.world
            .query::<&EquipmentUnit>()
            .iter()
            .filter(|(_, u)| u.equipment_type == equipment_type && u.is_available())
            .count() as u32
    }

    pub fn stock_quantity(&self, material: MaterialType) -> u32 {
        self.warehouse.quantity(material)
    }

    /// Everything idle right now, in one pass.
    pub fn availability(&self) -> AvailabilitySnapshot {
        let mut available_equipment = BTreeMap::new();
        for (_, unit) in self.world.query::<&EquipmentUnit>().iter() {
            if unit.is_available() {
                *available_equipment.entry(unit.equipment_type).or_insert(0) += 1;
            }
        }
        AvailabilitySnapshot {
            idle_workers: self.idle_workers_by_profession(),
            available_equipment,
            stock: self.warehouse.iter().collect(),
        }
    }

    fn idle_workers_by_profession(&self) -> BTreeMap<Profession, u32> {
        let idle_members: BTreeSet<WorkerId> = self
            .world
            .query::<&Crew>()
            .iter()
            .filter(|(_, c)| !c.engaged)
            .flat_map(|(_, c)| c.workers.iter().copied())
            .collect();

        let mut counts = BTreeMap::new();
        for (_, worker) in self.world.query::<&Worker>().iter() {
            if !worker.engaged && idle_members.contains(&worker.id) {
                *counts.entry(worker.profession).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Members of one crew counted by profession.
    pub fn crew_composition(&self, crew: CrewId) -> Option<BTreeMap<Profession, u32>> {
        let record = self.crew(crew)?;
        let mut counts = BTreeMap::new();
        for member in &record.workers {
            if let Some(worker) = self.worker(*member) {
                *counts.entry(worker.profession).or_insert(0) += 1;
            }
        }
        Some(counts)
    }

    // ── Lookups ────────────────────────────────────────────────────────

    pub fn worker(&self, id: WorkerId) -> Option<Worker> {
        self.world
            .query::<&Worker>()
            .iter()
            .find(|(_, w)| w.id == id)
            .map(|(_, w)| w.clone())
    }

    pub fn worker_name(&self, id: WorkerId) -> Option<Name> {
        let entity = self.worker_entity(id)?;
        self.world.get::<&Name>(entity).ok().map(|n| (*n).clone())
    }

    pub fn crew(&self, id: CrewId) -> Option<Crew> {
        self.world
            .query::<&Crew>()
            .iter()
            .find(|(_, c)| c.id == id)
            .map(|(_, c)| c.clone())
    }

    pub fn unit(&self, id: UnitId) -> Option<EquipmentUnit> {
        self.world
            .query::<&EquipmentUnit>()
            .iter()
            .find(|(_, u)| u.id == id)
            .map(|(_, u)| u.clone())
    }

    /// All crews, ordered by id.
    pub fn crews(&self) -> Vec<Crew> {
        let mut crews: Vec<Crew> = self
            .world
            .query::<&Crew>()
            .iter()
            .map(|(_, c)| c.clone())
            .collect();
        crews.sort_by_key(|c| c.id);
        crews
    }

    pub fn idle_crews(&self) -> Vec<CrewId> {
        self.crews()
            .into_iter()
            .filter(|c| !c.engaged)
            .map(|c| c.id)
            .collect()
    }

    /// The crew listing this worker, if any.
    pub fn crew_of(&self, worker: WorkerId) -> Option<CrewId> {
        self.world
            .query::<&Crew>()
            .iter()
            .find(|(_, c)| c.workers.contains(&worker))
            .map(|(_, c)| c.id)
    }

    pub fn worker_count(&self) -> usize {
        self.world.query::<&Worker>().iter().count()
    }

    pub fn unit_count(&self) -> usize {
        self.world.query::<&EquipmentUnit>().iter().count()
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    pub(crate) fn worker_entity(&self, id: WorkerId) -> Option<Entity> {
        self.world
            .query::<&Worker>()
            .iter()
            .find(|(_, w)| w.id == id)
            .map(|(e, _)| e)
    }

    pub(crate) fn crew_entity(&self, id: CrewId) -> Option<Entity> {
        self.world
            .query::<&Crew>()
            .iter()
            .find(|(_, c)| c.id == id)
            .map(|(e, _)| e)
    }

    pub(crate) fn unit_entity(&self, id: UnitId) -> Option<Entity> {
        self.world
            .query::<&EquipmentUnit>()
            .iter()
            .find(|(_, u)| u.id == id)
            .map(|(e, _)| e)
    }

    // ── Invariants ─────────────────────────────────────────────────────

    /// Verify the ledger's own invariants. Violations are programming
    /// errors; they are reported, never repaired.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut owner: BTreeMap<WorkerId, CrewId> = BTreeMap::new();

        for (_, crew) in self.world.query::<&Crew>().iter() {
            if crew.engaged != crew.job.is_some() {
                return Err(InvariantViolation::CrewBindingMismatch { crew: crew.id });
            }
            for member in &crew.workers {
                if let Some(first) = owner.insert(*member, crew.id) {
                    return Err(InvariantViolation::WorkerInTwoCrews {
                        worker: *member,
                        first,
                        second: crew.id,
                    });
                }
                let worker = self
                    .worker(*member)
                    .ok_or(InvariantViolation::MissingWorker {
                        worker: *member,
                        crew: crew.id,
                    })?;
                if worker.engaged != crew.engaged {
                    return Err(InvariantViolation::WorkerEngagementMismatch {
                        worker: *member,
                        crew: crew.id,
                    });
                }
            }
        }

        for (_, worker) in self.world.query::<&Worker>().iter() {
            if worker.engaged && !owner.contains_key(&worker.id) {
                return Err(InvariantViolation::EngagedWithoutCrew { worker: worker.id });
            }
        }

        let total = self.warehouse.total();
        if total > self.warehouse.capacity() {
            return Err(InvariantViolation::WarehouseOverCapacity {
                total,
                capacity: self.warehouse.capacity(),
            });
        }

        Ok(())
    }
}

/// Rejected directory mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    UnknownWorker(WorkerId),
    NotInCrew(WorkerId),
    UnknownCrew(CrewId),
    UnknownUnit(UnitId),
    /// The crew is bound to an Active job.
    CrewEngaged(CrewId),
    /// The unit is deployed on an Active job.
    UnitDeployed(UnitId),
    UnexpectedUnitState { unit: UnitId, state: EquipmentState },
    WorkerAlreadyInCrew { worker: WorkerId, crew: CrewId },
    CrewFull { crew: CrewId, capacity: u32 },
    WarehouseFull { requested: u32, free: u32 },
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::UnknownWorker(id) => write!(f, "unknown {}", id),
            LedgerError::NotInCrew(id) => write!(f, "{} belongs to no crew", id),
            LedgerError::UnknownCrew(id) => write!(f, "unknown {}", id),
            LedgerError::UnknownUnit(id) => write!(f, "unknown {}", id),
            LedgerError::CrewEngaged(id) => write!(f, "{} is engaged on a job", id),
            LedgerError::UnitDeployed(id) => write!(f, "{} is deployed on a job", id),
            LedgerError::UnexpectedUnitState { unit, state } => {
                write!(f, "{} is {:?}", unit, state)
            }
            LedgerError::WorkerAlreadyInCrew { worker, crew } => {
                write!(f, "{} already belongs to {}", worker, crew)
            }
            LedgerError::CrewFull { crew, capacity } => {
                write!(f, "{} is at capacity ({})", crew, capacity)
            }
            LedgerError::WarehouseFull { requested, free } => {
                write!(f, "warehouse full: {} requested, {} free", requested, free)
            }
        }
    }
}

impl std::error::Error for LedgerError {}

/// Broken ledger or reservation invariant. Always a programming error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    WorkerInTwoCrews {
        worker: WorkerId,
        first: CrewId,
        second: CrewId,
    },
    MissingWorker { worker: WorkerId, crew: CrewId },
    WorkerEngagementMismatch { worker: WorkerId, crew: CrewId },
    EngagedWithoutCrew { worker: WorkerId },
    CrewBindingMismatch { crew: CrewId },
    CrewDoubleBooked { crew: CrewId, first: JobId, second: JobId },
    UnitNotHeld { unit: UnitId },
    UnitDoubleBooked { unit: UnitId, first: JobId, second: JobId },
    /// An Active job lists a unit the ledger does not mark Deployed.
    HeldUnitNotDeployed { unit: UnitId, job: JobId },
    MissingUnit { unit: UnitId, job: JobId },
    /// An Active job's crew is gone or was never recorded.
    MissingCrew { job: JobId },
    WarehouseOverCapacity { total: u32, capacity: u32 },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::WorkerInTwoCrews {
                worker,
                first,
                second,
            } => write!(f, "{} listed in both {} and {}", worker, first, second),
            InvariantViolation::MissingWorker { worker, crew } => {
                write!(f, "{} lists missing {}", crew, worker)
            }
            InvariantViolation::WorkerEngagementMismatch { worker, crew } => {
                write!(f, "{} engagement differs from {}", worker, crew)
            }
            InvariantViolation::EngagedWithoutCrew { worker } => {
                write!(f, "{} is engaged but belongs to no crew", worker)
            }
            InvariantViolation::CrewBindingMismatch { crew } => {
                write!(f, "{} engaged flag disagrees with its job binding", crew)
            }
            InvariantViolation::CrewDoubleBooked { crew, first, second } => {
                write!(f, "{} bound to both {} and {}", crew, first, second)
            }
            InvariantViolation::UnitNotHeld { unit } => {
                write!(f, "{} is deployed but no active job holds it", unit)
            }
            InvariantViolation::UnitDoubleBooked { unit, first, second } => {
                write!(f, "{} held by both {} and {}", unit, first, second)
            }
            InvariantViolation::HeldUnitNotDeployed { unit, job } => {
                write!(f, "{} holds {} but it is not deployed", job, unit)
            }
            InvariantViolation::MissingUnit { unit, job } => {
                write!(f, "{} holds missing {}", job, unit)
            }
            InvariantViolation::MissingCrew { job } => {
                write!(f, "{} is active without a crew", job)
            }
            InvariantViolation::WarehouseOverCapacity { total, capacity } => {
                write!(f, "warehouse holds {} over capacity {}", total, capacity)
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_crew() -> (ResourceLedger, CrewId) {
        let mut ledger = ResourceLedger::new(500);
        let crew = ledger.form_crew("Alpha", 4);
        for profession in [Profession::Mason, Profession::Mason, Profession::Laborer] {
            let w = ledger.hire_worker(Name::new("Test", "Worker"), profession);
            ledger.assign_to_crew(w, crew).unwrap();
        }
        (ledger, crew)
    }

    #[test]
    fn test_idle_worker_count() {
        let (mut ledger, _) = ledger_with_crew();
        assert_eq!(ledger.idle_worker_count(Profession::Mason), 2);
        assert_eq!(ledger.idle_worker_count(Profession::Laborer), 1);
        assert_eq!(ledger.idle_worker_count(Profession::Welder), 0);

        // Workers outside any crew are not idle capacity.
        ledger.hire_worker(Name::new("Free", "Agent"), Profession::Mason);
        assert_eq!(ledger.idle_worker_count(Profession::Mason), 2);
    }

    #[test]
    fn test_worker_in_one_crew_only() {
        let (mut ledger, first) = ledger_with_crew();
        let second = ledger.form_crew("Beta", 4);
        let worker = ledger.crew(first).unwrap().workers[0];
        assert_eq!(
            ledger.assign_to_crew(worker, second),
            Err(LedgerError::WorkerAlreadyInCrew {
                worker,
                crew: first
            })
        );
    }

    #[test]
    fn test_crew_capacity_enforced() {
        let (mut ledger, crew) = ledger_with_crew();
        let w = ledger.hire_worker(Name::new("Fourth", "Member"), Profession::Welder);
        ledger.assign_to_crew(w, crew).unwrap();
        let w = ledger.hire_worker(Name::new("Fifth", "Member"), Profession::Welder);
        assert_eq!(
            ledger.assign_to_crew(w, crew),
            Err(LedgerError::CrewFull { crew, capacity: 4 })
        );
    }

    #[test]
    fn test_equipment_states() {
        let mut ledger = ResourceLedger::new(10);
        let a = ledger.add_equipment(EquipmentType::Crane);
        ledger.add_equipment(EquipmentType::Crane);
        assert_eq!(ledger.available_equipment_count(EquipmentType::Crane), 2);

        ledger.send_to_repair(a).unwrap();
        assert_eq!(ledger.available_equipment_count(EquipmentType::Crane), 1);
        assert!(ledger.send_to_repair(a).is_err());

        ledger.finish_repair(a).unwrap();
        assert_eq!(ledger.available_equipment_count(EquipmentType::Crane), 2);
    }

    #[test]
    fn test_warehouse_capacity() {
        let mut ledger = ResourceLedger::new(100);
        ledger.receive_material(MaterialType::Cement, 60).unwrap();
        assert_eq!(
            ledger.receive_material(MaterialType::Steel, 41),
            Err(LedgerError::WarehouseFull {
                requested: 41,
                free: 40
            })
        );
        ledger.receive_material(MaterialType::Steel, 40).unwrap();
        assert_eq!(ledger.warehouse().total(), 100);
        assert_eq!(ledger.stock_quantity(MaterialType::Steel), 40);
    }

    #[test]
    fn test_availability_snapshot() {
        let (mut ledger, _) = ledger_with_crew();
        ledger.add_equipment(EquipmentType::Excavator);
        ledger.receive_material(MaterialType::Gravel, 30).unwrap();

        let snapshot = ledger.availability();
        assert_eq!(snapshot.idle_workers(Profession::Mason), 2);
        assert_eq!(snapshot.available_equipment(EquipmentType::Excavator), 1);
        assert_eq!(snapshot.stock(MaterialType::Gravel), 30);
    }

    #[test]
    fn test_invariants_hold_and_detect_double_membership() {
        let (mut ledger, first) = ledger_with_crew();
        assert!(ledger.check_invariants().is_ok());

        // Corrupt the ledger behind the API's back.
        let worker = ledger.crew(first).unwrap().workers[0];
        let second = ledger.form_crew("Beta", 4);
        let entity = ledger.crew_entity(second).unwrap();
        ledger.world.get::<&mut Crew>(entity).unwrap().workers.push(worker);

        assert!(matches!(
            ledger.check_invariants(),
            Err(InvariantViolation::WorkerInTwoCrews { .. })
        ));
    }

    #[test]
    fn test_crew_composition() {
        let (ledger, crew) = ledger_with_crew();
        let composition = ledger.crew_composition(crew).unwrap();
        assert_eq!(composition[&Profession::Mason], 2);
        assert_eq!(composition[&Profession::Laborer], 1);
    }
}
