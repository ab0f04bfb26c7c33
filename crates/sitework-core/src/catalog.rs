//! Contract catalog - the canonical job offers a company can accept.
//!
//! Templates are never mutated by the simulation: proposing a job copies
//! the template's requirements into the job.

use serde::{Deserialize, Serialize};
use sitework_logic::requirements::RequirementSet;
use sitework_logic::resources::{EquipmentType, MaterialType, Profession};

/// One contract offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub id: u32,
    pub location: String,
    pub payment: i64,
    /// Days the client allows.
    pub deadline_days: u32,
    /// Nominal duration at standard settings.
    pub base_duration: u32,
    pub requirements: RequirementSet,
}

/// A list of offers, typically loaded from a data file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractCatalog {
    pub contracts: Vec<ContractTemplate>,
}

impl ContractCatalog {
    /// Parse a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn get(&self, id: u32) -> Option<&ContractTemplate> {
        self.contracts.iter().find(|c| c.id == id)
    }

    /// Built-in offers used by the harness and tests.
    pub fn builtin() -> Self {
        Self {
            contracts: vec![
                ContractTemplate {
                    id: 1,
                    location: "Garden shed, Elm Street".to_string(),
                    payment: 2_500,
                    deadline_days: 6,
                    base_duration: 4,
                    requirements: RequirementSet::new()
                        .with_crew(Profession::Carpenter, 1)
                        .with_crew(Profession::Laborer, 1)
                        .with_material(MaterialType::Lumber, 20),
                },
                ContractTemplate {
                    id: 2,
                    location: "Family house, Birch Lane".to_string(),
                    payment: 10_000,
                    deadline_days: 25,
                    base_duration: 20,
                    requirements: RequirementSet::new()
                        .with_crew(Profession::Mason, 2)
                        .with_crew(Profession::Carpenter, 1)
                        .with_crew(Profession::Laborer, 2)
                        .with_equipment(EquipmentType::ConcreteMixer, 1)
                        .with_equipment(EquipmentType::Scaffolding, 2)
                        .with_material(MaterialType::Cement, 100)
                        .with_material(MaterialType::Bricks, 80)
                        .with_material(MaterialType::Lumber, 30),
                },
                ContractTemplate {
                    id: 3,
                    location: "Warehouse extension, Dock 4".to_string(),
                    payment: 24_000,
                    deadline_days: 35,
                    base_duration: 30,
                    requirements: RequirementSet::new()
                        .with_crew(Profession::Welder, 2)
                        .with_crew(Profession::Operator, 1)
                        .with_crew(Profession::Electrician, 1)
                        .with_crew(Profession::Laborer, 3)
                        .with_equipment(EquipmentType::Crane, 1)
                        .with_equipment(EquipmentType::Excavator, 1)
                        .with_material(MaterialType::Steel, 120)
                        .with_material(MaterialType::Cement, 60)
                        .with_material(MaterialType::Wiring, 25),
                },
                ContractTemplate {
                    id: 4,
                    location: "Bathroom refit, Harbor flats".to_string(),
                    payment: 4_200,
                    deadline_days: 8,
                    base_duration: 5,
                    requirements: RequirementSet::new()
                        .with_crew(Profession::Plumber, 1)
                        .with_crew(Profession::Electrician, 1)
                        .with_material(MaterialType::Pipe, 12)
                        .with_material(MaterialType::Wiring, 6),
                },
            ],
        }
    }
}
