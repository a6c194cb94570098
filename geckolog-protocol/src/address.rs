//! Console address-space policy.
//!
//! Every request is checked against a fixed table of eight disjoint ranges
//! before it reaches the wire. A request must fit entirely inside a single
//! range; requests straddling two ranges are rejected even when both ranges
//! would individually allow the access.

use crate::error::ProtocolError;
use std::fmt;

/// Kind of memory access being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

/// A region of the remote address space with static permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    /// First address of the range.
    pub start: u32,
    /// One past the last address of the range.
    pub end: u32,
    pub readable: bool,
    pub writable: bool,
}

impl AddressRange {
    const fn read_only(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            readable: true,
            writable: false,
        }
    }

    const fn read_write(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            readable: true,
            writable: true,
        }
    }

    /// Returns whether `[address, address + length)` lies inside this range.
    pub fn contains(&self, address: u32, length: u32) -> bool {
        let end = address as u64 + length as u64;
        self.start <= address && end <= self.end as u64
    }

    /// Returns whether the range allows the given access.
    pub fn permits(&self, access: Access) -> bool {
        match access {
            Access::Read => self.readable,
            Access::Write => self.writable,
        }
    }
}

/// Addressable memory of the console.
pub static ADDRESS_SPACE: [AddressRange; 8] = [
    AddressRange::read_only(0x0100_0000, 0x0180_0000),
    // Upper bound depends on the title.
    AddressRange::read_only(0x0E00_0000, 0x1000_0000),
    AddressRange::read_write(0x1000_0000, 0x5000_0000),
    AddressRange::read_only(0xE000_0000, 0xE400_0000),
    AddressRange::read_only(0xE800_0000, 0xEA00_0000),
    AddressRange::read_only(0xF400_0000, 0xF680_0000),
    AddressRange::read_only(0xF800_0000, 0xFB80_0000),
    AddressRange::read_write(0xFFFE_0000, 0xFFFF_FFFF),
];

/// Finds the table entry that fully contains the request.
pub fn find_range(address: u32, length: u32) -> Option<&'static AddressRange> {
    ADDRESS_SPACE.iter().find(|r| r.contains(address, length))
}

/// Returns whether the request fits inside a single table entry.
pub fn is_valid(address: u32, length: u32) -> bool {
    find_range(address, length).is_some()
}

/// Returns whether the request is valid and its entry allows `access`.
pub fn is_permitted(address: u32, length: u32, access: Access) -> bool {
    find_range(address, length).is_some_and(|r| r.permits(access))
}

/// Validates a request, distinguishing out-of-range from access-denied.
pub fn check(address: u32, length: u32, access: Access) -> Result<(), ProtocolError> {
    if length == 0 {
        return Err(ProtocolError::InvalidLength);
    }

    let range = find_range(address, length).ok_or(ProtocolError::OutOfRange { address, length })?;
    if !range.permits(access) {
        return Err(ProtocolError::AccessDenied {
            address,
            length,
            access,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_table_is_sorted_and_disjoint() {
        for pair in ADDRESS_SPACE.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        assert!(ADDRESS_SPACE.iter().all(|r| r.readable));
    }

    #[test]
    fn test_range_bounds() {
        assert!(is_valid(0x0100_0000, 4));
        assert!(is_valid(0x017F_FFFC, 4));
        assert!(!is_valid(0x017F_FFFD, 4));
        assert!(!is_valid(0x00FF_FFFF, 1));
        assert!(is_valid(0xFFFF_FFFB, 4));
        assert!(!is_valid(0xFFFF_FFFC, 4));
    }

    #[test]
    fn test_straddling_adjacent_ranges_is_invalid() {
        // 0x0E000000..0x10000000 and 0x10000000..0x50000000 are adjacent.
        assert!(is_valid(0x0FFF_FFFC, 4));
        assert!(is_valid(0x1000_0000, 4));
        assert!(!is_valid(0x0FFF_FFFE, 4));
        assert_eq!(
            check(0x0FFF_FFFE, 4, Access::Read),
            Err(ProtocolError::OutOfRange {
                address: 0x0FFF_FFFE,
                length: 4
            })
        );
    }

    #[test]
    fn test_write_permissions() {
        assert!(is_permitted(0x1000_0000, 4, Access::Write));
        assert!(is_permitted(0xFFFE_0000, 4, Access::Write));
        assert!(!is_permitted(0x0100_0000, 4, Access::Write));
        assert!(!is_permitted(0xF400_0000, 4, Access::Write));
        assert!(is_permitted(0xF400_0000, 4, Access::Read));
    }

    #[test]
    fn test_check_distinguishes_errors() {
        assert_eq!(check(0x1000_0000, 0, Access::Read), Err(ProtocolError::InvalidLength));
        assert!(matches!(
            check(0x0000_1000, 4, Access::Read),
            Err(ProtocolError::OutOfRange { .. })
        ));
        assert!(matches!(
            check(0xE000_0000, 4, Access::Write),
            Err(ProtocolError::AccessDenied {
                access: Access::Write,
                ..
            })
        ));
        assert!(check(0xE000_0000, 4, Access::Read).is_ok());
    }

    #[test]
    fn test_huge_length_does_not_overflow() {
        assert!(!is_valid(0xFFFF_0000, u32::MAX));
    }

    proptest! {
        #[test]
        fn prop_read_only_ranges_deny_writes(idx in 0usize..8, offset in 0u32..0x1000, len in 1u32..0x100) {
            let range = ADDRESS_SPACE[idx];
            let address = range.start + offset;
            prop_assume!(range.contains(address, len));
            prop_assert!(check(address, len, Access::Read).is_ok());
            if range.writable {
                prop_assert!(check(address, len, Access::Write).is_ok());
            } else {
                let denied = matches!(check(address, len, Access::Write), Err(ProtocolError::AccessDenied { .. }));
                prop_assert!(denied);
            }
        }

        #[test]
        fn prop_valid_means_single_entry(address in any::<u32>(), len in 1u32..0x10000) {
            let hits = ADDRESS_SPACE.iter().filter(|r| r.contains(address, len)).count();
            prop_assert!(hits <= 1);
            prop_assert_eq!(is_valid(address, len), hits == 1);
        }
    }
}
