//! Access width/kind descriptors and fetch alignment policy.

use std::fmt;

use crate::MemoryFault;

/// Byte count of an instruction word.
pub const INSTRUCTION_BYTES: u32 = 4;

/// Width of a single memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessWidth {
    /// 8-bit access.
    Byte,
    /// 16-bit access.
    Half,
    /// 32-bit access.
    Word,
}

impl AccessWidth {
    /// Number of bytes covered by this width.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Mask selecting the low bits of a register that this width stores.
    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0x0000_00FF,
            Self::Half => 0x0000_FFFF,
            Self::Word => 0xFFFF_FFFF,
        }
    }
}

impl fmt::Display for AccessWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte => f.write_str("1 byte"),
            Self::Half => f.write_str("2 bytes"),
            Self::Word => f.write_str("4 bytes"),
        }
    }
}

/// Which pipeline stage issued a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessKind {
    /// Instruction fetch.
    Fetch,
    /// Data load.
    Load,
    /// Data store.
    Store,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Load => f.write_str("load"),
            Self::Store => f.write_str("store"),
        }
    }
}

/// Validates that an instruction fetch address is word aligned.
///
/// # Errors
///
/// Returns [`MemoryFault::MisalignedFetch`] when `pc` is not a multiple of four.
pub const fn validate_fetch_alignment(pc: u32) -> Result<(), MemoryFault> {
    if pc % INSTRUCTION_BYTES == 0 {
        Ok(())
    } else {
        Err(MemoryFault::MisalignedFetch { address: pc })
    }
}
