//! Company snapshots: one bincode blob holding the ledger, job board,
//! funds, config and clock.
//!
//! Ledger entities are flattened component by component and respawned on
//! load. Ids survive a round trip; hecs entity handles do not.

use hecs::World;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::components::*;
use crate::config::CompanyConfig;
use crate::jobs::JobBoard;
use crate::ledger::{InvariantViolation, ResourceLedger, Warehouse};
use crate::reservation::check_reservations;
use crate::treasury::Funds;

/// Bumped whenever the layout of [`SaveData`] changes.
pub const SAVE_VERSION: u32 = 1;

/// Everything written to disk.
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub clock: Clock,
    pub config: CompanyConfig,
    pub funds: Funds,
    pub board: JobBoard,
    pub warehouse: Warehouse,
    pub next_ids: NextIds,
    pub entities: Vec<EntityRecord>,
}

/// Simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    pub day: u64,
    pub seconds_into_day: f64,
    pub time_scale: f32,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            day: 0,
            seconds_into_day: 0.0,
            time_scale: 1.0,
        }
    }
}

/// Id counters, so ids are never reused after a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextIds {
    pub worker: u32,
    pub crew: u32,
    pub unit: u32,
}

/// One ledger entity, flattened. Absent components stay `None`.
#[derive(Serialize, Deserialize, Default)]
pub struct EntityRecord {
    pub worker: Option<Worker>,
    pub name: Option<Name>,
    pub crew: Option<Crew>,
    pub equipment: Option<EquipmentUnit>,
}

fn collect_entities(world: &World) -> Vec<EntityRecord> {
    let mut entities: Vec<EntityRecord> = world
        .iter()
        .map(|entity| EntityRecord {
            worker: entity.get::<&Worker>().map(|c| (*c).clone()),
            name: entity.get::<&Name>().map(|c| (*c).clone()),
            crew: entity.get::<&Crew>().map(|c| (*c).clone()),
            equipment: entity.get::<&EquipmentUnit>().map(|c| (*c).clone()),
        })
        .collect();

    // World iteration order is unspecified; sort for stable output.
    entities.sort_by_key(|record| {
        (
            record.worker.as_ref().map(|w| w.id),
            record.crew.as_ref().map(|c| c.id),
            record.equipment.as_ref().map(|u| u.id),
        )
    });
    entities
}

fn restore_entity(world: &mut World, record: EntityRecord) {
    let entity = world.spawn(());

    if let Some(c) = record.worker {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = record.name {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = record.crew {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = record.equipment {
        let _ = world.insert_one(entity, c);
    }
}

/// Write a snapshot of the company to `writer`.
pub fn save_company<W: Write>(
    writer: W,
    ledger: &ResourceLedger,
    board: &JobBoard,
    funds: &Funds,
    config: &CompanyConfig,
    clock: Clock,
) -> Result<(), SaveError> {
    let snapshot = SaveData {
        version: SAVE_VERSION,
        clock,
        config: config.clone(),
        funds: *funds,
        board: board.clone(),
        warehouse: ledger.warehouse.clone(),
        next_ids: NextIds {
            worker: ledger.next_worker_id,
            crew: ledger.next_crew_id,
            unit: ledger.next_unit_id,
        },
        entities: collect_entities(&ledger.world),
    };

    bincode::serialize_into(writer, &snapshot)?;
    Ok(())
}

/// Load a company from a reader. The restored state is checked before it
/// is handed back.
pub fn load_company<R: Read>(reader: R) -> Result<LoadedCompany, SaveError> {
    let snapshot: SaveData = bincode::deserialize_from(reader)?;

    if snapshot.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: snapshot.version,
        });
    }

    let mut world = World::new();
    for record in snapshot.entities {
        restore_entity(&mut world, record);
    }
    let ledger = ResourceLedger {
        world,
        warehouse: snapshot.warehouse,
        next_worker_id: snapshot.next_ids.worker,
        next_crew_id: snapshot.next_ids.crew,
        next_unit_id: snapshot.next_ids.unit,
    };
    check_reservations(&ledger, &snapshot.board)?;

    Ok(LoadedCompany {
        ledger,
        board: snapshot.board,
        funds: snapshot.funds,
        config: snapshot.config,
        clock: snapshot.clock,
    })
}

/// A company restored by [`load_company`].
pub struct LoadedCompany {
    pub ledger: ResourceLedger,
    pub board: JobBoard,
    pub funds: Funds,
    pub config: CompanyConfig,
    pub clock: Clock,
}

#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
    /// The file decoded but describes an inconsistent company.
    Invariant(InvariantViolation),
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<InvariantViolation> for SaveError {
    fn from(v: InvariantViolation) -> Self {
        SaveError::Invariant(v)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "save file I/O failed: {}", e),
            SaveError::Bincode(e) => write!(f, "save file is malformed: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "save format {} is not supported (expected {})",
                    found, expected
                )
            }
            SaveError::Invariant(v) => write!(f, "save describes an inconsistent company: {}", v),
        }
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ContractCatalog;
    use crate::reservation::{commit, CommitContext};
    use crate::treasury::Treasury;
    use sitework_logic::resources::{EquipmentType, MaterialType, Profession};

    fn company() -> (ResourceLedger, JobBoard, CrewId) {
        let mut ledger = ResourceLedger::new(500);
        let crew = ledger.form_crew("Alpha", 4);
        for profession in [Profession::Carpenter, Profession::Laborer] {
            let w = ledger.hire_worker(Name::new("Ada", "Stone"), profession);
            ledger.assign_to_crew(w, crew).unwrap();
        }
        ledger.add_equipment(EquipmentType::Crane);
        ledger.receive_material(MaterialType::Lumber, 40).unwrap();
        (ledger, JobBoard::new(), crew)
    }

    #[test]
    fn test_snapshot_restores_active_job() {
        let (mut ledger, mut board, crew) = company();
        let shed = ContractCatalog::builtin().get(1).unwrap().clone();
        let job = board.propose(&shed);
        let config = CompanyConfig::default();
        commit(
            &mut ledger,
            &mut board,
            job,
            crew,
            CommitContext {
                tuning: &config.tuning,
                temporary_hire_limit: 0,
                day: 3,
            },
        )
        .unwrap();
        let clock = Clock {
            day: 3,
            seconds_into_day: 12.5,
            time_scale: 2.0,
        };

        let mut buffer = Vec::new();
        save_company(&mut buffer, &ledger, &board, &Funds::new(1_234), &config, clock)
            .unwrap();

        let loaded = load_company(&buffer[..]).unwrap();
        assert_eq!(loaded.clock, clock);
        assert_eq!(loaded.funds.balance(), 1_234);
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.ledger.worker_count(), 2);
        assert_eq!(loaded.ledger.unit_count(), 1);
        assert_eq!(loaded.ledger.stock_quantity(MaterialType::Lumber), 20);
        assert!(loaded.ledger.crew(crew).unwrap().engaged);
        assert_eq!(
            loaded.ledger.worker_name(WorkerId(0)).unwrap().full_name(),
            "Ada Stone"
        );

        let restored = loaded.board.get(job).unwrap();
        let original = board.get(job).unwrap();
        assert_eq!(restored.state(), original.state());
        assert_eq!(restored.planned_duration(), original.planned_duration());
        assert_eq!(restored.requirements(), original.requirements());
        assert_eq!(restored.committed_on(), Some(3));
    }

    #[test]
    fn test_ids_continue_after_load() {
        let (ledger, board, _) = company();
        let mut buffer = Vec::new();
        save_company(
            &mut buffer,
            &ledger,
            &board,
            &Funds::default(),
            &CompanyConfig::default(),
            Clock::default(),
        )
        .unwrap();

        let mut loaded = load_company(&buffer[..]).unwrap();
        let id = loaded
            .ledger
            .hire_worker(Name::new("New", "Hire"), Profession::Welder);
        assert_eq!(id, WorkerId(2));
    }

    #[test]
    fn test_version_mismatch() {
        let (ledger, board, _) = company();
        let mut buffer = Vec::new();
        save_company(
            &mut buffer,
            &ledger,
            &board,
            &Funds::default(),
            &CompanyConfig::default(),
            Clock::default(),
        )
        .unwrap();
        // The version is the leading little-endian u32.
        buffer[0] = buffer[0].wrapping_add(1);

        assert!(matches!(
            load_company(&buffer[..]),
            Err(SaveError::VersionMismatch { expected: SAVE_VERSION, .. })
        ));
    }

    #[test]
    fn test_truncated_input() {
        assert!(matches!(
            load_company(&[0u8, 1, 2][..]),
            Err(SaveError::Bincode(_))
        ));
    }
}
