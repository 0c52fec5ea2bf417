//! Memory window placement and address translation.

use crate::{AccessKind, AccessWidth, MemoryFault};

/// Default absolute address of the first memory byte (and the reset `PC`).
pub const DEFAULT_BASE_ADDRESS: u32 = 0x8000_0000;
/// Default memory capacity (32 KiB).
pub const DEFAULT_MEMORY_BYTES: usize = 32 * 1024;

/// Placement of the flat memory array inside the 32-bit address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryWindow {
    /// Absolute address mapped to index 0.
    pub base: u32,
    /// Number of addressable bytes.
    pub capacity: usize,
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_ADDRESS,
            capacity: DEFAULT_MEMORY_BYTES,
        }
    }
}

impl MemoryWindow {
    /// Creates a window of `capacity` bytes starting at `base`.
    #[must_use]
    pub const fn new(base: u32, capacity: usize) -> Self {
        Self { base, capacity }
    }

    /// Translates an absolute address into an array index for an access of `width`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryFault::OutOfBounds`] when any byte of the access lies
    /// outside `[0, capacity)` after subtracting the base.
    pub fn translate(
        self,
        address: u32,
        width: AccessWidth,
        operation: AccessKind,
    ) -> Result<usize, MemoryFault> {
        let fault = MemoryFault::OutOfBounds {
            address,
            width,
            operation,
        };
        let index = usize::try_from(address.wrapping_sub(self.base)).map_err(|_| fault)?;
        let end = index.checked_add(width.bytes()).ok_or(fault)?;
        if end <= self.capacity {
            Ok(index)
        } else {
            Err(fault)
        }
    }

    /// Returns `true` when the whole access fits inside the window.
    #[must_use]
    pub fn contains(self, address: u32, width: AccessWidth) -> bool {
        self.translate(address, width, AccessKind::Load).is_ok()
    }
}
