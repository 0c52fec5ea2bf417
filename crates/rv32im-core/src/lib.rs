//! Fetch-decode-execute core for an RV32IM teaching simulator.

/// Flat little-endian memory behind a single bounds-checked accessor.
pub mod memory;
pub use memory::{
    validate_fetch_alignment, AccessKind, AccessWidth, Memory, MemoryWindow, DEFAULT_BASE_ADDRESS,
    DEFAULT_MEMORY_BYTES, INSTRUCTION_BYTES,
};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CoreConfig, CoreState, Effect, HaltPolicy, NullSink, RetiredInstruction, RunOutcome,
    RunStatus, SourceOperands, StepOutcome, TraceEvent, TraceSink, SEMIHOSTING_ENTRY_WORD,
    SEMIHOSTING_EXIT_WORD,
};

/// Architectural CPU state model primitives.
pub mod state;
pub use state::{
    ArchitecturalState, InvalidRegister, Register, RunState, ABI_NAMES, GENERAL_REGISTER_COUNT,
};

/// Instruction field layout and the `(opcode, funct3, funct7)` table.
pub mod encoding;
pub use encoding::{classify, Format, Mnemonic, EBREAK_WORD, ENCODING_TABLE};

/// Instruction decoder producing one tagged operation per mnemonic.
pub mod decoder;
pub use decoder::{BType, Decoder, IType, JType, Operation, RType, SType, UType};

/// Decode, memory and image-load error types.
pub mod fault;
pub use fault::{DecodeError, Fault, FaultClass, LoadError, MemoryFault};

/// Instruction execution and the step/run driving loop.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, run, step_one, AluOp, BranchOp, ExecuteOutcome,
    ExecuteState, LoadOp, PendingStore,
};

/// Human-readable instruction disassembly.
pub mod disasm;
pub use disasm::{disassemble, disassemble_window, format_operands, DisassemblyRow};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
