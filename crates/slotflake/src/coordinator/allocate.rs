use std::collections::{BTreeMap, BTreeSet};

use crate::{KeySpace, Result, Slot, SlotflakeId};

/// Number of values each half of a [`Slot`] can take (`0..=31`).
pub const SLOTS_PER_FIELD: u64 = SlotflakeId::max_worker_id() + 1;

/// Listed leases grouped by datacenter.
pub(crate) type Occupancy = BTreeMap<u64, BTreeSet<u64>>;

/// Groups the slots named by `keys` by datacenter.
///
/// Keys that do not parse, or that name a slot outside the encodable range,
/// play no part in allocation.
pub(crate) fn occupancy<'a>(keys: &KeySpace, listed: impl IntoIterator<Item = &'a str>) -> Occupancy {
    let mut occupied = Occupancy::new();
    for key in listed {
        match keys.parse(key) {
            Some(slot) if slot.validate().is_ok() => {
                occupied
                    .entry(slot.datacenter_id)
                    .or_default()
                    .insert(slot.worker_id);
            }
            Some(slot) => tracing::debug!(key, %slot, "ignoring lease outside the encodable range"),
            None => tracing::debug!(key, "ignoring unparsable lease key"),
        }
    }
    occupied
}

/// Finds the first free slot.
///
/// Datacenters already in use are filled first, lowest worker first. Only
/// when every used datacenter is full does the search open worker 0 of the
/// lowest unused datacenter. `is_taken` is asked about every candidate before
/// it is returned, since the listing may be stale by the time it is read.
///
/// Returns `None` when the slot space is exhausted; `is_taken` is never
/// called in that case if the listing alone proves it.
pub(crate) fn find_free_slot(
    occupied: &Occupancy,
    mut is_taken: impl FnMut(Slot) -> Result<bool>,
) -> Result<Option<Slot>> {
    for (&datacenter_id, workers) in occupied {
        if workers.len() as u64 >= SLOTS_PER_FIELD {
            continue;
        }
        for worker_id in (0..SLOTS_PER_FIELD).filter(|w| !workers.contains(w)) {
            let slot = Slot::new(datacenter_id, worker_id);
            if !is_taken(slot)? {
                return Ok(Some(slot));
            }
        }
    }

    if occupied.len() as u64 >= SLOTS_PER_FIELD {
        return Ok(None);
    }
    for datacenter_id in (0..SLOTS_PER_FIELD).filter(|d| !occupied.contains_key(d)) {
        let slot = Slot::new(datacenter_id, 0);
        if !is_taken(slot)? {
            return Ok(Some(slot));
        }
    }
    Ok(None)
}
