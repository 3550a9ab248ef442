use core::fmt;

use crate::{Error, Result, SlotflakeId};

/// A (datacenter, worker) pair identifying one generator within the fleet.
///
/// Stored in the coordination store as the JSON array `[datacenter, worker]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u64; 2]", into = "[u64; 2]")]
pub struct Slot {
    pub datacenter_id: u64,
    pub worker_id: u64,
}

impl Slot {
    pub const fn new(datacenter_id: u64, worker_id: u64) -> Self {
        Self {
            datacenter_id,
            worker_id,
        }
    }

    /// Checks that both halves fit the 5-bit fields of [`SlotflakeId`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSlot`] naming the first field out of range.
    pub fn validate(&self) -> Result<()> {
        if self.datacenter_id > SlotflakeId::max_datacenter_id() {
            return Err(Error::InvalidSlot {
                field: "datacenter_id",
                value: self.datacenter_id,
                max: SlotflakeId::max_datacenter_id(),
            });
        }
        if self.worker_id > SlotflakeId::max_worker_id() {
            return Err(Error::InvalidSlot {
                field: "worker_id",
                value: self.worker_id,
                max: SlotflakeId::max_worker_id(),
            });
        }
        Ok(())
    }
}

impl From<[u64; 2]> for Slot {
    fn from([datacenter_id, worker_id]: [u64; 2]) -> Self {
        Self::new(datacenter_id, worker_id)
    }
}

impl From<Slot> for [u64; 2] {
    fn from(slot: Slot) -> Self {
        [slot.datacenter_id, slot.worker_id]
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.datacenter_id, self.worker_id)
    }
}
