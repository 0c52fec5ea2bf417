//! End-of-run summary: status line and JSON state dump.

use rv32im_core::{CoreState, FaultClass, Register, RunStatus};
use serde::{Deserialize, Serialize};

/// One-line description of how a run ended.
#[must_use]
pub fn status_line(status: RunStatus) -> String {
    match status {
        RunStatus::Halted { pc } => format!("halted normally at 0x{pc:08x}"),
        RunStatus::Fault { pc, fault } => match fault.class() {
            FaultClass::Decode => format!("halted on unknown instruction at 0x{pc:08x}"),
            FaultClass::Memory => format!(
                "halted on memory fault at 0x{pc:08x} (address 0x{:08x})",
                fault.address()
            ),
        },
        RunStatus::StepLimitReached { pc } => format!("step limit reached at 0x{pc:08x}"),
    }
}

/// A named register value in the state dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDump {
    /// ABI name.
    pub name: String,
    /// Final value.
    pub value: u32,
}

/// Final architectural state written by `--state-json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDump {
    /// Final program counter.
    pub pc: u32,
    /// Instructions retired, including a halting `ebreak`.
    pub retired: u64,
    /// How the run ended.
    pub status: RunStatus,
    /// `x0..x31` in register order.
    pub registers: Vec<RegisterDump>,
}

impl StateDump {
    /// Snapshots `state` after a run that ended with `status`.
    #[must_use]
    pub fn capture(state: &CoreState, status: RunStatus) -> Self {
        let registers = Register::all()
            .map(|reg| RegisterDump {
                name: reg.abi_name().to_owned(),
                value: state.arch.gpr(reg),
            })
            .collect();
        Self {
            pc: state.arch.pc(),
            retired: state.retired,
            status,
            registers,
        }
    }
}
