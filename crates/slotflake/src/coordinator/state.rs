use core::fmt;

use crate::Slot;

/// Lifecycle of a coordinator's lease.
///
/// ```text
/// Unbound --acquire--> Bound --release--> Released
///                        |
///                        +--renewal finds key gone--> Expired
/// ```
///
/// `Released` and `Expired` are terminal: the coordinator stops issuing IDs
/// and a new one must be built to lease again.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotState {
    Unbound,
    Bound(Slot),
    Released(Slot),
    Expired(Slot),
}

impl SlotState {
    /// The slot this state refers to, if one was ever acquired.
    pub const fn slot(&self) -> Option<Slot> {
        match self {
            Self::Unbound => None,
            Self::Bound(slot) | Self::Released(slot) | Self::Expired(slot) => Some(*slot),
        }
    }

    pub const fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Released(_) | Self::Expired(_))
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => f.write_str("unbound"),
            Self::Bound(slot) => write!(f, "bound to {slot}"),
            Self::Released(slot) => write!(f, "released {slot}"),
            Self::Expired(slot) => write!(f, "lost lease on {slot}"),
        }
    }
}
