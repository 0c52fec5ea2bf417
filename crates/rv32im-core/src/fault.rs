use thiserror::Error;

use crate::memory::{AccessKind, AccessWidth};

/// Fault classes used for reporting and run-status decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Decoder rejected an instruction encoding.
    Decode,
    /// Fetch, load or store fell outside the memory window or violated alignment.
    Memory,
}

/// Decoder failure for a fetched instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DecodeError {
    /// Opcode, or opcode/funct3/funct7 combination, matches no defined instruction.
    #[error("unknown instruction encoding 0x{word:08x} at 0x{address:08x}")]
    UnknownEncoding {
        /// Address the word was fetched from (zero until the fetch stage fills it in).
        address: u32,
        /// Raw instruction word.
        word: u32,
    },
}

impl DecodeError {
    /// Attaches the fetch address to a decode failure.
    #[must_use]
    pub const fn at(self, address: u32) -> Self {
        match self {
            Self::UnknownEncoding { word, .. } => Self::UnknownEncoding { address, word },
        }
    }

    /// Returns the address the offending word was fetched from.
    #[must_use]
    pub const fn address(self) -> u32 {
        match self {
            Self::UnknownEncoding { address, .. } => address,
        }
    }
}

/// Memory access policy violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum MemoryFault {
    /// The translated range `[address - base, address - base + width)` leaves the window.
    #[error("{operation} of {width} at 0x{address:08x} is outside the memory window")]
    OutOfBounds {
        /// Absolute address of the first byte accessed.
        address: u32,
        /// Access width.
        width: AccessWidth,
        /// Kind of access that faulted.
        operation: AccessKind,
    },
    /// Instruction fetch from an address that is not a multiple of four.
    #[error("instruction fetch from misaligned address 0x{address:08x}")]
    MisalignedFetch {
        /// Program counter at the time of the fetch.
        address: u32,
    },
}

impl MemoryFault {
    /// Returns the absolute address that caused the fault.
    #[must_use]
    pub const fn address(self) -> u32 {
        match self {
            Self::OutOfBounds { address, .. } | Self::MisalignedFetch { address } => address,
        }
    }
}

/// Failure to place a program image into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LoadError {
    /// The image does not fit between `offset` and the end of memory.
    #[error("image of {len} bytes at offset {offset} exceeds memory capacity of {capacity} bytes")]
    ImageTooLarge {
        /// Image length in bytes.
        len: usize,
        /// Requested load offset relative to the memory base.
        offset: usize,
        /// Memory capacity in bytes.
        capacity: usize,
    },
}

/// Terminal fault raised by the fetch/decode/execute pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Fetched word did not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Fetch, load or store violated the memory policy.
    #[error(transparent)]
    Memory(#[from] MemoryFault),
}

impl Fault {
    /// Returns the reporting class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::Decode(_) => FaultClass::Decode,
            Self::Memory(_) => FaultClass::Memory,
        }
    }

    /// Returns the address carried by the fault (fetch PC or data address).
    #[must_use]
    pub const fn address(self) -> u32 {
        match self {
            Self::Decode(err) => err.address(),
            Self::Memory(fault) => fault.address(),
        }
    }
}
