//! Flat little-endian memory behind a single bounds-checked accessor.

/// Access descriptors and fetch alignment policy.
pub mod access;
/// Memory window placement and address translation.
pub mod map;

pub use access::{validate_fetch_alignment, AccessKind, AccessWidth, INSTRUCTION_BYTES};
pub use map::{MemoryWindow, DEFAULT_BASE_ADDRESS, DEFAULT_MEMORY_BYTES};

use crate::{LoadError, MemoryFault};

/// Fixed-capacity byte memory addressed relative to a base address.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Memory {
    window: MemoryWindow,
    bytes: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(MemoryWindow::default())
    }
}

impl Memory {
    /// Allocates zeroed memory covering `window`.
    #[must_use]
    pub fn new(window: MemoryWindow) -> Self {
        Self {
            window,
            bytes: vec![0; window.capacity].into_boxed_slice(),
        }
    }

    /// Returns the placement of this memory in the address space.
    #[must_use]
    pub const fn window(&self) -> MemoryWindow {
        self.window
    }

    /// Absolute address of the first byte.
    #[must_use]
    pub const fn base(&self) -> u32 {
        self.window.base
    }

    /// Capacity in bytes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.window.capacity
    }

    /// Raw backing bytes, index 0 at the base address.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copies a program image into memory starting `at_offset` bytes past the base.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ImageTooLarge`] when the image does not fit.
    pub fn load(&mut self, bytes: &[u8], at_offset: usize) -> Result<(), LoadError> {
        let too_large = LoadError::ImageTooLarge {
            len: bytes.len(),
            offset: at_offset,
            capacity: self.capacity(),
        };
        let end = at_offset.checked_add(bytes.len()).ok_or(too_large)?;
        let target = self.bytes.get_mut(at_offset..end).ok_or(too_large)?;
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Reads `width` bytes at `address` as a zero-extended little-endian value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfBounds`] when the access leaves the window.
    pub fn read(
        &self,
        address: u32,
        width: AccessWidth,
        operation: AccessKind,
    ) -> Result<u32, MemoryFault> {
        let index = self.window.translate(address, width, operation)?;
        let value = self.bytes[index..index + width.bytes()]
            .iter()
            .rev()
            .fold(0_u32, |acc, byte| (acc << 8) | u32::from(*byte));
        Ok(value)
    }

    /// Writes the low `width` bytes of `value` at `address`, little-endian.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfBounds`] when the access leaves the window.
    /// Nothing is written in that case.
    pub fn write(&mut self, address: u32, width: AccessWidth, value: u32) -> Result<(), MemoryFault> {
        let index = self.window.translate(address, width, AccessKind::Store)?;
        let bytes = value.to_le_bytes();
        self.bytes[index..index + width.bytes()].copy_from_slice(&bytes[..width.bytes()]);
        Ok(())
    }

    /// Fetches the instruction word at `pc`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::MisalignedFetch`] for a non word-aligned `pc` and
    /// [`MemoryFault::OutOfBounds`] when the word lies outside the window.
    pub fn fetch(&self, pc: u32) -> Result<u32, MemoryFault> {
        validate_fetch_alignment(pc)?;
        self.read(pc, AccessWidth::Word, AccessKind::Fetch)
    }

    /// Reads a byte.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfBounds`] when `address` is outside the window.
    pub fn read_u8(&self, address: u32) -> Result<u8, MemoryFault> {
        let index = self
            .window
            .translate(address, AccessWidth::Byte, AccessKind::Load)?;
        Ok(self.bytes[index])
    }

    /// Reads a little-endian half-word.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfBounds`] when the access leaves the window.
    pub fn read_u16(&self, address: u32) -> Result<u16, MemoryFault> {
        let index = self
            .window
            .translate(address, AccessWidth::Half, AccessKind::Load)?;
        Ok(u16::from_le_bytes([self.bytes[index], self.bytes[index + 1]]))
    }

    /// Reads a little-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfBounds`] when the access leaves the window.
    pub fn read_u32(&self, address: u32) -> Result<u32, MemoryFault> {
        self.read(address, AccessWidth::Word, AccessKind::Load)
    }

    /// Writes a little-endian word.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfBounds`] when the access leaves the window.
    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<(), MemoryFault> {
        self.write(address, AccessWidth::Word, value)
    }

    /// Reads the aligned word at `address` without faulting, for neighbour inspection.
    #[must_use]
    pub fn peek_word(&self, address: u32) -> Option<u32> {
        self.fetch(address).ok()
    }
}
