//! Flat addressable memory
//!
//! One contiguous, zero-initialised byte region. The register file occupies
//! its low addresses and the stack grows upward right after it. Valid
//! addresses are `[0, len)`; every access outside that range is reported as a
//! [`MemoryError`] instead of being truncated or wrapped.
//!
//! # Growth
//!
//! [`FlatMemory::reserve`] doubles the length until a pending write fits.
//! Growth is bounded by the limit given at construction; hitting it is a
//! [`MemoryError::LimitExceeded`].

use crate::interpreter::errors::ReturnCode;
use std::fmt;
use tracing::debug;

/// Memory access faults
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Address outside `[0, len)`
    OutOfBounds { address: usize, len: usize },

    /// Range with `low > high`
    InvalidRange { low: usize, high: usize },

    /// Growth would exceed the configured limit
    LimitExceeded { requested: usize, limit: usize },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::OutOfBounds { address, len } => {
                write!(
                    f,
                    "Address 0x{:x} out of bounds for memory of {} bytes",
                    address, len
                )
            }
            MemoryError::InvalidRange { low, high } => {
                write!(f, "Invalid memory range 0x{:x}..0x{:x}", low, high)
            }
            MemoryError::LimitExceeded { requested, limit } => {
                write!(
                    f,
                    "Memory limit exceeded: requested {} bytes, limit is {}",
                    requested, limit
                )
            }
        }
    }
}

impl std::error::Error for MemoryError {}

impl From<MemoryError> for ReturnCode {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::LimitExceeded { .. } => ReturnCode::StackOverflow,
            MemoryError::OutOfBounds { .. } | MemoryError::InvalidRange { .. } => {
                ReturnCode::InvalidMemoryAccess
            }
        }
    }
}

/// The machine's flat memory
#[derive(Debug, Clone)]
pub struct FlatMemory {
    bytes: Vec<u8>,
    limit: usize,
}

impl FlatMemory {
    /// Create zero-filled memory of `size` bytes that may grow up to `limit`
    pub fn new(size: usize, limit: usize) -> Self {
        FlatMemory {
            bytes: vec![0; size],
            limit: limit.max(size),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Resize to exactly `size` bytes; new bytes are zero
    pub fn resize(&mut self, size: usize) -> Result<(), MemoryError> {
        if size > self.limit {
            return Err(MemoryError::LimitExceeded {
                requested: size,
                limit: self.limit,
            });
        }
        self.bytes.resize(size, 0);
        Ok(())
    }

    /// Make room for `n` bytes written at `offset`.
    ///
    /// Doubles the length until `offset + n < len`.
    pub fn reserve(&mut self, n: usize, offset: usize) -> Result<(), MemoryError> {
        let needed = offset.saturating_add(n);
        if needed < self.bytes.len() {
            return Ok(());
        }

        let mut new_len = self.bytes.len().max(1);
        while needed >= new_len {
            new_len = new_len.saturating_mul(2);
        }
        if new_len > self.limit {
            // The doubling overshoots; settle for the limit if it still fits
            if needed < self.limit {
                new_len = self.limit;
            } else {
                return Err(MemoryError::LimitExceeded {
                    requested: needed + 1,
                    limit: self.limit,
                });
            }
        }

        debug!(from = self.bytes.len(), to = new_len, "growing memory");
        self.bytes.resize(new_len, 0);
        Ok(())
    }

    fn check_range(&self, low: usize, high: usize) -> Result<(), MemoryError> {
        if low > high {
            return Err(MemoryError::InvalidRange { low, high });
        }
        if high > self.bytes.len() {
            return Err(MemoryError::OutOfBounds {
                address: high.saturating_sub(1).max(low),
                len: self.bytes.len(),
            });
        }
        Ok(())
    }

    pub fn write_byte(&mut self, offset: usize, value: u8) -> Result<(), MemoryError> {
        let len = self.bytes.len();
        let slot = self
            .bytes
            .get_mut(offset)
            .ok_or(MemoryError::OutOfBounds {
                address: offset,
                len,
            })?;
        *slot = value;
        Ok(())
    }

    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), MemoryError> {
        let high = offset.saturating_add(bytes.len());
        self.check_range(offset, high)?;
        self.bytes[offset..high].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_byte(&self, offset: usize) -> Result<u8, MemoryError> {
        self.bytes
            .get(offset)
            .copied()
            .ok_or(MemoryError::OutOfBounds {
                address: offset,
                len: self.bytes.len(),
            })
    }

    /// Copy `[low, high)` out into a new vector
    pub fn read_bytes(&self, low: usize, high: usize) -> Result<Vec<u8>, MemoryError> {
        Ok(self.slice(low, high)?.to_vec())
    }

    /// Copy `[low, low + out.len())` into `out`
    pub fn read_into(&self, low: usize, out: &mut [u8]) -> Result<(), MemoryError> {
        let high = low.saturating_add(out.len());
        out.copy_from_slice(self.slice(low, high)?);
        Ok(())
    }

    /// Borrow `[low, high)`
    pub fn slice(&self, low: usize, high: usize) -> Result<&[u8], MemoryError> {
        self.check_range(low, high)?;
        Ok(&self.bytes[low..high])
    }

    /// Zero `[low, high)`
    pub fn clear_range(&mut self, low: usize, high: usize) -> Result<(), MemoryError> {
        self.check_range(low, high)?;
        self.bytes[low..high].fill(0);
        Ok(())
    }

    /// Zero every byte
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_memory_is_zeroed() {
        let memory = FlatMemory::new(16, 64);
        assert_eq!(memory.len(), 16);
        assert_eq!(memory.read_bytes(0, 16).unwrap(), vec![0; 16]);
    }

    #[test]
    fn test_reserve_doubles_until_write_fits() {
        let mut memory = FlatMemory::new(8, 1024);
        memory.reserve(4, 6).unwrap();
        assert_eq!(memory.len(), 16);
        memory.reserve(40, 10).unwrap();
        assert_eq!(memory.len(), 64);
        // Already fits, no growth
        memory.reserve(1, 0).unwrap();
        assert_eq!(memory.len(), 64);
    }

    #[test]
    fn test_reserve_respects_limit() {
        let mut memory = FlatMemory::new(8, 12);
        memory.reserve(2, 8).unwrap();
        assert_eq!(memory.len(), 12);
        assert!(matches!(
            memory.reserve(8, 8),
            Err(MemoryError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_out_of_bounds_access_is_reported() {
        let mut memory = FlatMemory::new(4, 4);
        assert!(matches!(
            memory.write_byte(4, 1),
            Err(MemoryError::OutOfBounds { address: 4, len: 4 })
        ));
        assert!(memory.write_bytes(3, &[1, 2]).is_err());
        assert!(memory.read_byte(9).is_err());
        assert!(matches!(
            memory.read_bytes(3, 1),
            Err(MemoryError::InvalidRange { .. })
        ));
        // Nothing was partially written
        assert_eq!(memory.read_bytes(0, 4).unwrap(), vec![0; 4]);
    }

    #[test]
    fn test_write_read_and_clear() {
        let mut memory = FlatMemory::new(8, 8);
        memory.write_bytes(2, &[7, 8, 9]).unwrap();
        assert_eq!(memory.read_byte(3).unwrap(), 8);

        let mut out = [0u8; 3];
        memory.read_into(2, &mut out).unwrap();
        assert_eq!(out, [7, 8, 9]);

        memory.clear_range(2, 3).unwrap();
        assert_eq!(memory.read_bytes(2, 5).unwrap(), vec![0, 8, 9]);

        memory.clear();
        assert_eq!(memory.read_bytes(0, 8).unwrap(), vec![0; 8]);
    }

    #[test]
    fn test_memory_errors_map_to_return_codes() {
        let overflow: ReturnCode = MemoryError::LimitExceeded {
            requested: 10,
            limit: 8,
        }
        .into();
        assert_eq!(overflow, ReturnCode::StackOverflow);

        let bounds: ReturnCode = MemoryError::OutOfBounds { address: 9, len: 8 }.into();
        assert_eq!(bounds, ReturnCode::InvalidMemoryAccess);
    }
}
