use tracing::trace;

use crate::error::{Error, Result};

/// The [`Memory`] struct represents the linear memory of a single execution context.
///
/// Memory never grows implicitly: a write past the end of the buffer is an error, and the caller
/// (normally the [`MemoryGrowthAdvisor`](super::advisor::MemoryGrowthAdvisor)) must [`resize`]
/// first. This keeps every growth step visible to the dispatch loop, which prices it with
/// [`expansion_cost`].
///
/// [`resize`]: Memory::resize
/// [`expansion_cost`]: Memory::expansion_cost
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    /// Vector storing memory data
    memory: Vec<u8>,
}

impl Memory {
    /// Creates a new, empty [`Memory`].
    pub fn new() -> Memory {
        Memory { memory: Vec::with_capacity(2048) }
    }

    /// Gets the current size of the memory in bytes.
    ///
    /// ```
    /// use evmstate_vm::core::memory::Memory;
    ///
    /// let memory = Memory::new();
    /// assert_eq!(memory.length(), 0);
    /// ```
    pub fn length(&self) -> usize {
        self.memory.len()
    }

    /// A view of the whole buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }

    /// Grows the memory to at least `size` bytes, zero-filling the new region. Memory never
    /// shrinks, so a `size` at or below the current length is a no-op.
    ///
    /// ```
    /// use evmstate_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.resize(33);
    /// assert_eq!(memory.length(), 33);
    ///
    /// memory.resize(8);
    /// assert_eq!(memory.length(), 33);
    /// ```
    pub fn resize(&mut self, size: usize) {
        if size > self.memory.len() {
            trace!("growing memory from {} to {} bytes", self.memory.len(), size);
            self.memory.resize(size, 0u8);
        }
    }

    /// Writes exactly `size` bytes of `value` at `offset`.
    ///
    /// Fails without touching the buffer if `offset + size` is past the end of memory, or if
    /// `value` is not exactly `size` bytes long. A zero-sized write is always a no-op.
    ///
    /// ```
    /// use evmstate_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.resize(4);
    /// memory.write(1, 2, &[0xaa, 0xbb]).expect("write is in bounds");
    /// assert_eq!(memory.read(0, 4), vec![0x00, 0xaa, 0xbb, 0x00]);
    ///
    /// assert!(memory.write(3, 2, &[0xaa, 0xbb]).is_err());
    /// ```
    pub fn write(&mut self, offset: usize, size: usize, value: &[u8]) -> Result<()> {
        if size == 0 {
            return Ok(());
        }

        let end = offset.checked_add(size).filter(|end| *end <= self.memory.len()).ok_or(
            Error::InvalidMemoryAccess { offset, size, length: self.memory.len() },
        )?;
        if value.len() != size {
            return Err(Error::MemorySizeMismatch { size, value_len: value.len() });
        }

        self.memory[offset..end].copy_from_slice(value);
        Ok(())
    }

    /// Writes at most `size` bytes of `value` at `offset`. If `value` is shorter than `size`,
    /// only `value.len()` bytes are written and the rest of the region is left untouched.
    ///
    /// Used where the source may be shorter than the nominal length, e.g. copying return data.
    ///
    /// ```
    /// use evmstate_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.resize(4);
    /// memory.write_clamped(0, 4, &[0xff]).expect("write is in bounds");
    /// assert_eq!(memory.read(0, 4), vec![0xff, 0x00, 0x00, 0x00]);
    /// ```
    pub fn write_clamped(&mut self, offset: usize, size: usize, value: &[u8]) -> Result<()> {
        let size = size.min(value.len());
        self.write(offset, size, &value[..size])
    }

    /// Read `size` bytes from the memory at the given offset. Bytes past the end of the buffer
    /// read as zero, so the result is always exactly `size` bytes long.
    ///
    /// ```
    /// use evmstate_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.resize(2);
    /// memory.write(0, 2, &[0x11, 0x22]).expect("write is in bounds");
    /// assert_eq!(memory.read(1, 3), vec![0x22, 0x00, 0x00]);
    /// assert!(memory.read(1000, 0).is_empty());
    /// ```
    pub fn read(&self, offset: usize, size: usize) -> Vec<u8> {
        if size == 0 {
            return Vec::new();
        }

        let mut value = vec![0u8; size];
        if offset < self.memory.len() {
            let end = offset.saturating_add(size).min(self.memory.len());
            value[..end - offset].copy_from_slice(&self.memory[offset..end]);
        }
        value
    }

    /// Calculate the gas cost of the current memory size, using the quadratic word formula
    /// `3 * words + words^2 / 512`.
    ///
    /// ```
    /// use evmstate_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.resize(32);
    /// assert_eq!(memory.memory_cost(), 3);
    /// ```
    pub fn memory_cost(&self) -> u128 {
        cost_of(self.memory.len())
    }

    /// Calculate the additional gas cost of growing the memory to `new_length` bytes. Zero if
    /// the memory is already at least that large.
    ///
    /// ```
    /// use evmstate_vm::core::memory::Memory;
    ///
    /// let mut memory = Memory::new();
    /// memory.resize(32);
    /// assert_eq!(memory.expansion_cost(32), 0);
    /// assert_eq!(memory.expansion_cost(64), 3);
    /// ```
    pub fn expansion_cost(&self, new_length: usize) -> u128 {
        cost_of(new_length).saturating_sub(self.memory_cost())
    }
}

fn cost_of(length: usize) -> u128 {
    let words = (length as u128).div_ceil(32);
    (words.saturating_mul(words) / 512).saturating_add(words.saturating_mul(3))
}
