//! Non-volatile byte store abstraction.
//!
//! Implementations provide the platform-specific medium:
//! - `MemoryStore` for tests and simulation (this module)
//! - a file-backed store on Linux hosts
//! - EEPROM emulation / NVS on the microcontroller
//!
//! All methods are synchronous and blocking. There is no timeout: a store
//! call that hangs stalls its caller.

use thiserror::Error;

/// Capacity of the configuration store in bytes.
pub const STORE_CAPACITY: usize = 1024;

/// Value of a byte that has never been written (erased EEPROM/flash).
pub const ERASED_BYTE: u8 = 0xFF;

/// Errors raised by the underlying byte store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Access outside the store's capacity.
    #[error("access of {len} bytes at offset {offset} exceeds store capacity {capacity}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// The medium refused the write (hardware fault, power loss, worn cell).
    #[error("store rejected write at offset {offset}: {reason}")]
    Rejected { offset: usize, reason: String },

    /// I/O failure of a host-backed store.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte-addressable persistent storage of fixed capacity.
pub trait NonVolatileStore: Send + Sync {
    /// Total number of addressable bytes.
    fn capacity(&self) -> usize;

    /// Fill `buf` with the bytes starting at `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError>;

    /// Write `data` starting at `offset`.
    ///
    /// Writes may be buffered until [`commit`](Self::commit).
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError>;

    /// Flush buffered writes to the medium.
    fn commit(&mut self) -> Result<(), StoreError>;
}

impl<S: NonVolatileStore + ?Sized> NonVolatileStore for Box<S> {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        (**self).read(offset, buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        (**self).write(offset, data)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }
}

/// Check that `len` bytes at `offset` fit into `capacity`.
pub fn check_bounds(offset: usize, len: usize, capacity: usize) -> Result<(), StoreError> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(StoreError::OutOfBounds {
            offset,
            len,
            capacity,
        }),
    }
}

/// In-memory store for testing and simulation.
///
/// Starts in the erased state (all bytes `0xFF`). Supports:
/// - Write rejection for testing `StoreWrite` handling
/// - Power-loss simulation: only a given number of further bytes reach the
///   medium, everything after that is dropped
/// - Write and commit counters
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Vec<u8>,
    reject_writes: bool,
    /// Remaining bytes before simulated power loss.
    power_budget: Option<usize>,
    writes: usize,
    commits: usize,
}

impl MemoryStore {
    /// Create an erased store of [`STORE_CAPACITY`] bytes.
    pub fn new() -> Self {
        Self::with_capacity(STORE_CAPACITY)
    }

    /// Create an erased store of arbitrary size.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![ERASED_BYTE; capacity],
            reject_writes: false,
            power_budget: None,
            writes: 0,
            commits: 0,
        }
    }

    /// Create a store from raw bytes (e.g. a foreign image).
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::with_capacity(0)
        }
    }

    /// Raw contents (for test verification).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Overwrite bytes directly, bypassing fault injection.
    pub fn poke(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Make every following write fail.
    pub fn reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Let only `bytes` more bytes reach the medium, then lose power.
    pub fn simulate_power_loss_after(&mut self, bytes: usize) {
        self.power_budget = Some(bytes);
    }

    /// Restore power (the store keeps whatever was written).
    pub fn restore_power(&mut self) {
        self.power_budget = None;
    }

    /// Number of successful write calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NonVolatileStore for MemoryStore {
    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        check_bounds(offset, buf.len(), self.data.len())?;
        buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StoreError> {
        check_bounds(offset, data.len(), self.data.len())?;

        if self.reject_writes {
            return Err(StoreError::Rejected {
                offset,
                reason: "write protected".to_string(),
            });
        }

        if let Some(budget) = self.power_budget {
            let written = budget.min(data.len());
            self.data[offset..offset + written].copy_from_slice(&data[..written]);
            self.power_budget = Some(budget - written);
            if written < data.len() {
                return Err(StoreError::Rejected {
                    offset: offset + written,
                    reason: "power lost".to_string(),
                });
            }
        } else {
            self.data[offset..offset + data.len()].copy_from_slice(data);
        }

        self.writes += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.reject_writes || self.power_budget == Some(0) {
            return Err(StoreError::Rejected {
                offset: 0,
                reason: "commit failed".to_string(),
            });
        }
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_erased() {
        let store = MemoryStore::new();
        assert_eq!(store.capacity(), STORE_CAPACITY);
        assert!(store.as_bytes().iter().all(|&b| b == ERASED_BYTE));
    }

    #[test]
    fn test_write_read() {
        let mut store = MemoryStore::new();
        store.write(10, &[1, 2, 3]).unwrap();

        let mut buf = [0u8; 3];
        store.read(10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut store = MemoryStore::new();
        let mut buf = [0u8; 4];

        assert!(matches!(
            store.read(STORE_CAPACITY - 2, &mut buf),
            Err(StoreError::OutOfBounds { .. })
        ));
        assert!(matches!(
            store.write(usize::MAX, &[0]),
            Err(StoreError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_rejected_write_leaves_data() {
        let mut store = MemoryStore::new();
        store.write(0, &[7]).unwrap();
        store.reject_writes(true);

        assert!(matches!(
            store.write(0, &[9]),
            Err(StoreError::Rejected { .. })
        ));
        assert_eq!(store.as_bytes()[0], 7);
        assert!(store.commit().is_err());
    }

    #[test]
    fn test_power_loss_truncates_write() {
        let mut store = MemoryStore::new();
        store.simulate_power_loss_after(2);

        assert!(store.write(0, &[1, 2, 3, 4]).is_err());
        assert_eq!(&store.as_bytes()[..4], &[1, 2, ERASED_BYTE, ERASED_BYTE]);

        // Nothing else reaches the medium
        assert!(store.write(8, &[5]).is_err());
        assert_eq!(store.as_bytes()[8], ERASED_BYTE);

        store.restore_power();
        store.write(8, &[5]).unwrap();
        assert_eq!(store.as_bytes()[8], 5);
    }
}
