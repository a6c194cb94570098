//! In-memory doubles for driver tests.

use bytes::Bytes;
use geckolog_client::{ClientError, MemoryLink, Sleeper, Variant};
use geckolog_protocol::{address, Access};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

/// A sparse memory image served through [`MemoryLink`].
///
/// Unset bytes read as zero. Scripted contents are applied in order, one
/// per access starting at that exact address, and then stick.
#[derive(Debug, Clone)]
pub(crate) struct MockLink {
    variant: Variant,
    memory: HashMap<u32, u8>,
    scripted: HashMap<u32, VecDeque<Vec<u8>>>,
    reads: usize,
    fail_after: Option<usize>,
}

impl MockLink {
    pub(crate) fn new() -> Self {
        Self::with_variant(Variant::Classic)
    }

    pub(crate) fn with_variant(variant: Variant) -> Self {
        Self {
            variant,
            memory: HashMap::new(),
            scripted: HashMap::new(),
            reads: 0,
            fail_after: None,
        }
    }

    pub(crate) fn write(&mut self, address: u32, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            self.memory.insert(address + i as u32, *byte);
        }
    }

    pub(crate) fn write_u16(&mut self, address: u32, value: u16) {
        self.write(address, &value.to_be_bytes());
    }

    pub(crate) fn write_u32(&mut self, address: u32, value: u32) {
        self.write(address, &value.to_be_bytes());
    }

    pub(crate) fn script_read(&mut self, address: u32, bytes: Vec<u8>) {
        self.scripted.entry(address).or_default().push_back(bytes);
    }

    /// Fails every access once `reads` accesses have succeeded.
    pub(crate) fn fail_after(&mut self, reads: usize) {
        self.fail_after = Some(reads);
    }

    /// Number of successful accesses.
    pub(crate) fn reads(&self) -> usize {
        self.reads
    }

    fn access(&mut self, address: u32, length: u32) -> Result<Vec<u8>, ClientError> {
        address::check(address, length, Access::Read)?;
        if let Some(next) = self.scripted.get_mut(&address).and_then(VecDeque::pop_front) {
            self.write(address, &next);
        }
        if self.fail_after.is_some_and(|limit| self.reads >= limit) {
            return Err(ClientError::ConnectionClosed);
        }
        self.reads += 1;
        Ok((0..length)
            .map(|i| self.memory.get(&(address + i)).copied().unwrap_or(0))
            .collect())
    }
}

impl MemoryLink for MockLink {
    fn variant(&self) -> Variant {
        self.variant
    }

    async fn read_bytes(&mut self, address: u32, length: u32) -> Result<Bytes, ClientError> {
        Ok(Bytes::from(self.access(address, length)?))
    }

    async fn peek8(&mut self, address: u32) -> Result<u8, ClientError> {
        Ok(self.access(address + 3, 1)?[0])
    }

    async fn peek16(&mut self, address: u32) -> Result<u16, ClientError> {
        let raw = self.access(address + 2, 2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    async fn peek32(&mut self, address: u32) -> Result<u32, ClientError> {
        let raw = self.access(address, 4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    async fn peek_float(&mut self, address: u32) -> Result<f32, ClientError> {
        Ok(f32::from_bits(self.peek32(address).await?))
    }
}

/// Records requested sleeps instead of waiting.
#[derive(Debug, Default)]
pub(crate) struct FakeSleeper {
    slept: RefCell<Vec<Duration>>,
}

impl FakeSleeper {
    pub(crate) fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

impl Sleeper for FakeSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.borrow_mut().push(duration);
    }
}
