//! KNX addressing types.
//!
//! Every KNX device carries a 16-bit individual address; logical functions
//! are reached through 16-bit group addresses. Both are thin wrappers around
//! the raw value with component accessors, validated constructors and the
//! 2-byte big-endian wire codec.
//!
//! Equality and ordering follow the raw 16-bit value, so addresses can be
//! used directly as map keys or sorted for display.

mod group;
mod individual;

pub use group::GroupAddress;
pub use individual::IndividualAddress;

/// Destination of a link-layer frame: a single device or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Destination {
    /// Point-to-point, addressed to one device.
    Individual(IndividualAddress),
    /// Multicast, addressed to a group of communication objects.
    Group(GroupAddress),
}

impl Destination {
    /// Raw 16-bit address value regardless of destination kind.
    pub const fn raw(self) -> u16 {
        match self {
            Destination::Individual(a) => a.raw(),
            Destination::Group(a) => a.raw(),
        }
    }

    /// True for group destinations.
    pub const fn is_group(self) -> bool {
        matches!(self, Destination::Group(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_raw() {
        let ind = IndividualAddress::new(1, 1, 10).unwrap();
        let grp = GroupAddress::new(1, 2, 3).unwrap();
        assert_eq!(Destination::Individual(ind).raw(), ind.raw());
        assert_eq!(Destination::Group(grp).raw(), grp.raw());
        assert!(Destination::Group(grp).is_group());
        assert!(!Destination::Individual(ind).is_group());
    }
}
