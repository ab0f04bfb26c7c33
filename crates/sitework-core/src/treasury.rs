//! Company funds, as seen by the simulation core.

use serde::{Deserialize, Serialize};

/// Read/write view of the company's money. Hosts with their own
/// accounting implement this; [`Funds`] is the in-memory default.
pub trait Treasury {
    fn balance(&self) -> i64;
    fn credit(&mut self, amount: i64);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Funds {
    balance: i64,
}

impl Funds {
    pub fn new(balance: i64) -> Self {
        Self { balance }
    }
}

impl Treasury for Funds {
    fn balance(&self) -> i64 {
        self.balance
    }

    fn credit(&mut self, amount: i64) {
        self.balance += amount;
    }
}
