//! Classic TCPGecko binary codec.
//!
//! Request frame (9 bytes):
//!
//! ```text
//! +--------+---------------+------------------------+
//! | opcode | start address | end address (exclusive)|
//! | 1 byte | 4 bytes BE    | 4 bytes BE             |
//! +--------+---------------+------------------------+
//! ```
//!
//! The stub answers with one status byte, followed by exactly
//! `end - start` bytes of memory when the status is [`Status::Data`].

use bytes::{BufMut, BytesMut};

/// Opcode of the memory read command.
pub const CMD_READ_MEMORY: u8 = 0x04;

/// Largest payload the stub returns for a single request.
pub const MAX_CHUNK: u32 = 0x400;

/// Size of an encoded read request.
pub const REQUEST_SIZE: usize = 9;

/// Status byte announcing that memory follows.
pub const STATUS_DATA: u8 = 0xBD;

/// Status byte for an unmapped region (no payload follows).
pub const STATUS_UNMAPPED: u8 = 0xB0;

/// One read request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub address: u32,
    pub length: u32,
}

impl ReadRequest {
    pub fn new(address: u32, length: u32) -> Self {
        Self { address, length }
    }

    /// Exclusive end address sent on the wire.
    pub fn end(&self) -> u32 {
        self.address.wrapping_add(self.length)
    }

    /// Encodes the request frame.
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(REQUEST_SIZE);
        buf.put_u8(CMD_READ_MEMORY);
        buf.put_u32(self.address);
        buf.put_u32(self.end());
        buf
    }
}

/// Response status of a read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `length` bytes of memory follow.
    Data,
    /// The region is unmapped; the caller substitutes zeros.
    Unmapped,
    /// Anything else; the read failed.
    Unknown(u8),
}

impl Status {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            STATUS_DATA => Status::Data,
            STATUS_UNMAPPED => Status::Unmapped,
            other => Status::Unknown(other),
        }
    }
}

/// Splits a read into wire-sized requests.
///
/// Produces `length / MAX_CHUNK` full chunks followed by one chunk for the
/// remainder, which is skipped when the remainder is zero.
pub fn chunks(address: u32, length: u32) -> Chunks {
    Chunks {
        address,
        remaining: length,
    }
}

/// Iterator returned by [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks {
    address: u32,
    remaining: u32,
}

impl Iterator for Chunks {
    type Item = ReadRequest;

    fn next(&mut self) -> Option<ReadRequest> {
        if self.remaining == 0 {
            return None;
        }

        let length = self.remaining.min(MAX_CHUNK);
        let request = ReadRequest::new(self.address, length);
        self.address = self.address.wrapping_add(length);
        self.remaining -= length;
        Some(request)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.div_ceil(MAX_CHUNK) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_request() {
        let request = ReadRequest::new(0x1070_0000, 0x10);
        let encoded = request.encode();
        assert_eq!(
            &encoded[..],
            &[0x04, 0x10, 0x70, 0x00, 0x00, 0x10, 0x70, 0x00, 0x10]
        );
    }

    #[test]
    fn test_status_bytes() {
        assert_eq!(Status::from_byte(0xBD), Status::Data);
        assert_eq!(Status::from_byte(0xB0), Status::Unmapped);
        assert_eq!(Status::from_byte(0x00), Status::Unknown(0x00));
    }

    #[test]
    fn test_chunks_2500_bytes() {
        let plan: Vec<_> = chunks(0x1000_0000, 2500).collect();
        assert_eq!(
            plan,
            vec![
                ReadRequest::new(0x1000_0000, 1024),
                ReadRequest::new(0x1000_0400, 1024),
                ReadRequest::new(0x1000_0800, 452),
            ]
        );
    }

    #[test]
    fn test_chunks_exact_multiple_has_no_empty_tail() {
        let plan: Vec<_> = chunks(0x1000_0000, 2048).collect();
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|r| r.length == MAX_CHUNK));
    }

    #[test]
    fn test_chunks_small_read_is_single_frame() {
        let plan: Vec<_> = chunks(0x1000_0000, 4).collect();
        assert_eq!(plan, vec![ReadRequest::new(0x1000_0000, 4)]);
    }

    proptest! {
        #[test]
        fn prop_chunk_count_and_coverage(address in 0x1000_0000u32..0x2000_0000, length in 1u32..20_000) {
            let plan: Vec<_> = chunks(address, length).collect();
            prop_assert_eq!(plan.len() as u32, length.div_ceil(MAX_CHUNK));
            prop_assert_eq!(plan.iter().map(|r| r.length).sum::<u32>(), length);
            let mut next = address;
            for request in &plan {
                prop_assert_eq!(request.address, next);
                prop_assert!(request.length <= MAX_CHUNK);
                next = request.end();
            }
        }
    }
}
