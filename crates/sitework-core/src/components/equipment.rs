//! Equipment components.

use serde::{Deserialize, Serialize};
use sitework_logic::resources::EquipmentType;

use super::UnitId;

/// State of one equipment unit. The three states are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentState {
    Available,
    Deployed,
    UnderRepair,
}

/// One physical piece of equipment owned by the company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentUnit {
    pub id: UnitId,
    pub equipment_type: EquipmentType,
    pub state: EquipmentState,
}

impl EquipmentUnit {
    pub fn new(id: UnitId, equipment_type: EquipmentType) -> Self {
        Self {
            id,
            equipment_type,
            state: EquipmentState::Available,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == EquipmentState::Available
    }
}
