//! Architectural CPU state model primitives.

/// Integer register file and `PC`.
pub mod registers;
/// Running/halted/faulted state machine.
pub mod run_state;

pub use registers::{
    ArchitecturalState, InvalidRegister, Register, ABI_NAMES, GENERAL_REGISTER_COUNT,
};
pub use run_state::RunState;
