//! Resource kinds - professions, equipment types, material types.
//!
//! These are plain tags with no ledger dependency. Both the engine and the
//! headless harness key their requirement maps on them.

use serde::{Deserialize, Serialize};

/// Trade a worker is hired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Profession {
    Laborer,
    Mason,
    Carpenter,
    Electrician,
    Plumber,
    Welder,
    Operator,
}

impl Profession {
    pub const ALL: [Profession; 7] = [
        Profession::Laborer,
        Profession::Mason,
        Profession::Carpenter,
        Profession::Electrician,
        Profession::Plumber,
        Profession::Welder,
        Profession::Operator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Profession::Laborer => "laborer",
            Profession::Mason => "mason",
            Profession::Carpenter => "carpenter",
            Profession::Electrician => "electrician",
            Profession::Plumber => "plumber",
            Profession::Welder => "welder",
            Profession::Operator => "operator",
        }
    }
}

/// Kind of equipment unit in the yard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentType {
    Excavator,
    Crane,
    ConcreteMixer,
    Scaffolding,
    Bulldozer,
    DumpTruck,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 6] = [
        EquipmentType::Excavator,
        EquipmentType::Crane,
        EquipmentType::ConcreteMixer,
        EquipmentType::Scaffolding,
        EquipmentType::Bulldozer,
        EquipmentType::DumpTruck,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EquipmentType::Excavator => "excavator",
            EquipmentType::Crane => "crane",
            EquipmentType::ConcreteMixer => "concrete mixer",
            EquipmentType::Scaffolding => "scaffolding",
            EquipmentType::Bulldozer => "bulldozer",
            EquipmentType::DumpTruck => "dump truck",
        }
    }
}

/// Kind of stock held in the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MaterialType {
    Cement,
    Bricks,
    Lumber,
    Steel,
    Gravel,
    Pipe,
    Wiring,
}

impl MaterialType {
    pub const ALL: [MaterialType; 7] = [
        MaterialType::Cement,
        MaterialType::Bricks,
        MaterialType::Lumber,
        MaterialType::Steel,
        MaterialType::Gravel,
        MaterialType::Pipe,
        MaterialType::Wiring,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MaterialType::Cement => "cement",
            MaterialType::Bricks => "bricks",
            MaterialType::Lumber => "lumber",
            MaterialType::Steel => "steel",
            MaterialType::Gravel => "gravel",
            MaterialType::Pipe => "pipe",
            MaterialType::Wiring => "wiring",
        }
    }
}
