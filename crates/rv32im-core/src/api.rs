//! Public host-facing API contracts for embedding the core.

use crate::decoder::Operation;
use crate::memory::{AccessWidth, Memory, MemoryWindow, DEFAULT_BASE_ADDRESS, DEFAULT_MEMORY_BYTES};
use crate::state::{ArchitecturalState, Register, RunState};
use crate::{Fault, LoadError};

/// Word that must precede `ebreak` under [`HaltPolicy::SemihostingMarker`] (`slli zero,zero,0x1f`).
pub const SEMIHOSTING_ENTRY_WORD: u32 = 0x01F0_1013;
/// Word that must follow `ebreak` under [`HaltPolicy::SemihostingMarker`] (`srai zero,zero,7`).
pub const SEMIHOSTING_EXIT_WORD: u32 = 0x4070_5013;

/// How `ebreak` terminates a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HaltPolicy {
    /// Every `ebreak` halts.
    #[default]
    Ebreak,
    /// `ebreak` halts only between [`SEMIHOSTING_ENTRY_WORD`] and
    /// [`SEMIHOSTING_EXIT_WORD`]; elsewhere it retires as a no-op.
    SemihostingMarker,
}

/// Top-level immutable configuration for a core instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Absolute address of memory byte 0 and the reset `PC`.
    pub base_address: u32,
    /// Memory capacity in bytes.
    pub memory_bytes: usize,
    /// Halt convention applied to `ebreak`.
    pub halt_policy: HaltPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            base_address: DEFAULT_BASE_ADDRESS,
            memory_bytes: DEFAULT_MEMORY_BYTES,
            halt_policy: HaltPolicy::Ebreak,
        }
    }
}

impl CoreConfig {
    /// Returns the memory placement described by this configuration.
    #[must_use]
    pub const fn memory_window(&self) -> MemoryWindow {
        MemoryWindow::new(self.base_address, self.memory_bytes)
    }
}

/// Complete host-visible core state used by stepping APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreState {
    /// Integer register file and `PC`.
    pub arch: ArchitecturalState,
    /// Flat memory image.
    pub memory: Memory,
    /// Current execution state.
    pub run_state: RunState,
    /// Instructions retired since construction or the last reset.
    pub retired: u64,
}

impl Default for CoreState {
    fn default() -> Self {
        Self::with_config(&CoreConfig::default())
    }
}

impl CoreState {
    /// Creates zeroed registers and memory with `PC` at the configured base.
    #[must_use]
    pub fn with_config(config: &CoreConfig) -> Self {
        let window = config.memory_window();
        Self {
            arch: ArchitecturalState::with_pc(window.base),
            memory: Memory::new(window),
            run_state: RunState::Running,
            retired: 0,
        }
    }

    /// Copies a program image to the start of memory.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ImageTooLarge`] when the image exceeds memory capacity.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), LoadError> {
        self.memory.load(image, 0)
    }

    /// Restores registers, `PC` and run state; the memory image is preserved.
    pub fn reset(&mut self) {
        self.arch = ArchitecturalState::with_pc(self.memory.base());
        self.run_state = RunState::Running;
        self.retired = 0;
    }

    /// Returns `true` while instructions can still execute.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !self.run_state.is_terminal()
    }
}

/// Output status from one instruction retirement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// Instruction retired and the core keeps running.
    Retired,
    /// Instruction retired and requested a halt.
    Halted,
    /// Fetch, decode or execute raised a fault; nothing was committed.
    Fault {
        /// Raised fault.
        fault: Fault,
    },
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunStatus {
    /// Program executed its halt instruction at `pc`.
    Halted {
        /// Address of the halting instruction.
        pc: u32,
    },
    /// A fault ended the run.
    Fault {
        /// `PC` of the faulting instruction.
        pc: u32,
        /// Raised fault.
        fault: Fault,
    },
    /// The caller's instruction budget ran out before the program halted.
    StepLimitReached {
        /// Address of the next instruction to execute.
        pc: u32,
    },
}

impl RunStatus {
    /// Returns the `PC` reported with this status.
    #[must_use]
    pub const fn pc(self) -> u32 {
        match self {
            Self::Halted { pc } | Self::Fault { pc, .. } | Self::StepLimitReached { pc } => pc,
        }
    }

    /// Returns `true` for a normal halt.
    #[must_use]
    pub const fn is_normal_halt(self) -> bool {
        matches!(self, Self::Halted { .. })
    }
}

/// Aggregated outcome from running until a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Number of instructions retired during this run call.
    pub steps: u64,
    /// Why the run stopped.
    pub status: RunStatus,
}

/// Source register values read by a retired instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SourceOperands {
    /// `rs1` and its value, when the format has one.
    pub rs1: Option<(Register, u32)>,
    /// `rs2` and its value, when the format has one.
    pub rs2: Option<(Register, u32)>,
}

/// Architecturally visible effect of a retired instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Effect {
    /// Nothing beyond the `PC` advance.
    #[default]
    None,
    /// ALU or upper-immediate result. Computed even when `rd` is `x0`.
    RegisterWrite {
        /// Destination register.
        rd: Register,
        /// Computed value.
        value: u32,
    },
    /// Memory read into `rd`.
    Load {
        /// Destination register.
        rd: Register,
        /// Effective address.
        address: u32,
        /// Access width.
        width: AccessWidth,
        /// Value after sign or zero extension.
        value: u32,
    },
    /// Memory write.
    Store {
        /// Effective address.
        address: u32,
        /// Access width.
        width: AccessWidth,
        /// Stored value, truncated to `width`.
        value: u32,
    },
    /// Conditional branch resolution.
    Branch {
        /// Whether the comparison held.
        taken: bool,
        /// `PC` of the next instruction.
        target: u32,
    },
    /// `jal`/`jalr` link and redirect.
    Jump {
        /// Link register.
        rd: Register,
        /// Return address written to `rd`.
        link: u32,
        /// Jump target.
        target: u32,
    },
    /// Halt request.
    Halt,
}

/// Trace record for one retired instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RetiredInstruction {
    /// Address the word was fetched from.
    pub pc: u32,
    /// Raw instruction word.
    pub word: u32,
    /// Decoded operation.
    pub operation: Operation,
    /// Source register values read before execution.
    pub sources: SourceOperands,
    /// Committed effect.
    pub effect: Effect,
    /// `PC` after the instruction.
    pub next_pc: u32,
}

/// Deterministic trace events emitted in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// An instruction retired.
    Retired(RetiredInstruction),
    /// A fault ended the run.
    FaultRaised {
        /// `PC` active when the fault was observed.
        pc: u32,
        /// Raised fault.
        fault: Fault,
    },
}

/// Sink trait for deterministic trace hooks.
pub trait TraceSink {
    /// Records an event in execution order.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}
