//! Instruction execution pipeline for RV32IM.
//!
//! Each step runs a fixed commit sequence:
//! 1. Fetch the word at `PC` and decode it
//! 2. Read source operands
//! 3. Compute the result, effective address or branch target
//! 4. Perform memory reads and validate store bounds
//! 5. Commit the store, the destination register and the next `PC`
//!
//! Faults are precise: a faulting instruction commits nothing.

mod alu;
mod control;
mod helpers;
mod load_store;

pub use alu::AluOp;
pub use control::{halt_requested, BranchOp};
pub use helpers::{effective_address, jalr_target, sequential_pc, sign_extend};
pub use load_store::LoadOp;

use crate::api::{
    CoreConfig, CoreState, Effect, RetiredInstruction, RunOutcome, RunStatus, SourceOperands,
    StepOutcome, TraceEvent, TraceSink,
};
use crate::decoder::{Decoder, IType, Operation, RType};
use crate::memory::{AccessWidth, Memory};
use crate::state::{Register, RunState};
use crate::{Fault, MemoryFault};

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecuteOutcome {
    /// Instruction can be committed and the core keeps running.
    Retired,
    /// Instruction can be committed and requested a halt.
    Halted,
    /// Execution faulted; nothing may be committed.
    Fault {
        /// Raised fault.
        fault: Fault,
    },
}

/// Store validated during execution and applied at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingStore {
    /// Effective address.
    pub address: u32,
    /// Access width.
    pub width: AccessWidth,
    /// Value to write, already truncated to `width`.
    pub value: u32,
}

/// Side effects accumulated while executing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExecuteState {
    /// Source register values read in the operand phase.
    pub sources: SourceOperands,
    /// Destination register and value; discarded at commit when `rd` is `x0`.
    pub dest: Option<(Register, u32)>,
    /// Bounds-checked store awaiting commit.
    pub store: Option<PendingStore>,
    /// `PC` after commit.
    pub next_pc: u32,
    /// Effect reported in the trace.
    pub effect: Effect,
    /// Halt requested by this instruction.
    pub halt: bool,
}

impl ExecuteState {
    /// Creates an execute state that falls through to `next_pc`.
    #[must_use]
    pub fn new(next_pc: u32) -> Self {
        Self {
            next_pc,
            ..Self::default()
        }
    }
}

/// Executes a single decoded instruction against a read-only view of the state.
///
/// Returns both the execution outcome and the execution state. On success, the
/// caller applies the side effects with [`commit_execution`]. On fault nothing
/// has been changed.
#[must_use]
pub fn execute_instruction(
    operation: &Operation,
    state: &CoreState,
    config: &CoreConfig,
) -> (ExecuteOutcome, ExecuteState) {
    let mut exec = ExecuteState::new(sequential_pc(state.arch.pc()));

    match dispatch(*operation, state, config, &mut exec) {
        Ok(()) if exec.halt => (ExecuteOutcome::Halted, exec),
        Ok(()) => (ExecuteOutcome::Retired, exec),
        Err(fault) => (
            ExecuteOutcome::Fault {
                fault: Fault::Memory(fault),
            },
            exec,
        ),
    }
}

fn dispatch(
    operation: Operation,
    state: &CoreState,
    config: &CoreConfig,
    exec: &mut ExecuteState,
) -> Result<(), MemoryFault> {
    match operation {
        Operation::Add(i) => execute_register(i, state, exec, AluOp::Add),
        Operation::Sub(i) => execute_register(i, state, exec, AluOp::Sub),
        Operation::And(i) => execute_register(i, state, exec, AluOp::And),
        Operation::Or(i) => execute_register(i, state, exec, AluOp::Or),
        Operation::Xor(i) => execute_register(i, state, exec, AluOp::Xor),
        Operation::Sll(i) => execute_register(i, state, exec, AluOp::Sll),
        Operation::Srl(i) => execute_register(i, state, exec, AluOp::Srl),
        Operation::Sra(i) => execute_register(i, state, exec, AluOp::Sra),
        Operation::Slt(i) => execute_register(i, state, exec, AluOp::Slt),
        Operation::Sltu(i) => execute_register(i, state, exec, AluOp::Sltu),
        Operation::Mul(i) => execute_register(i, state, exec, AluOp::Mul),
        Operation::Mulh(i) => execute_register(i, state, exec, AluOp::Mulh),
        Operation::Mulhsu(i) => execute_register(i, state, exec, AluOp::Mulhsu),
        Operation::Mulhu(i) => execute_register(i, state, exec, AluOp::Mulhu),
        Operation::Div(i) => execute_register(i, state, exec, AluOp::Div),
        Operation::Divu(i) => execute_register(i, state, exec, AluOp::Divu),
        Operation::Rem(i) => execute_register(i, state, exec, AluOp::Rem),
        Operation::Remu(i) => execute_register(i, state, exec, AluOp::Remu),
        Operation::Addi(i) => execute_immediate(i, state, exec, AluOp::Add),
        Operation::Xori(i) => execute_immediate(i, state, exec, AluOp::Xor),
        Operation::Ori(i) => execute_immediate(i, state, exec, AluOp::Or),
        Operation::Andi(i) => execute_immediate(i, state, exec, AluOp::And),
        Operation::Slti(i) => execute_immediate(i, state, exec, AluOp::Slt),
        Operation::Sltiu(i) => execute_immediate(i, state, exec, AluOp::Sltu),
        Operation::Slli(i) => execute_immediate(i, state, exec, AluOp::Sll),
        Operation::Srli(i) => execute_immediate(i, state, exec, AluOp::Srl),
        Operation::Srai(i) => execute_immediate(i, state, exec, AluOp::Sra),
        Operation::Lb(i) => load_store::execute_load(i, state, exec, LoadOp::BYTE)?,
        Operation::Lh(i) => load_store::execute_load(i, state, exec, LoadOp::HALF)?,
        Operation::Lw(i) => load_store::execute_load(i, state, exec, LoadOp::WORD)?,
        Operation::Lbu(i) => load_store::execute_load(i, state, exec, LoadOp::BYTE_UNSIGNED)?,
        Operation::Lhu(i) => load_store::execute_load(i, state, exec, LoadOp::HALF_UNSIGNED)?,
        Operation::Sb(i) => load_store::execute_store(i, state, exec, AccessWidth::Byte)?,
        Operation::Sh(i) => load_store::execute_store(i, state, exec, AccessWidth::Half)?,
        Operation::Sw(i) => load_store::execute_store(i, state, exec, AccessWidth::Word)?,
        Operation::Beq(i) => control::execute_branch(i, state, exec, BranchOp::Eq),
        Operation::Bne(i) => control::execute_branch(i, state, exec, BranchOp::Ne),
        Operation::Blt(i) => control::execute_branch(i, state, exec, BranchOp::Lt),
        Operation::Bge(i) => control::execute_branch(i, state, exec, BranchOp::Ge),
        Operation::Bltu(i) => control::execute_branch(i, state, exec, BranchOp::Ltu),
        Operation::Bgeu(i) => control::execute_branch(i, state, exec, BranchOp::Geu),
        Operation::Jal(i) => control::execute_jal(i, state, exec),
        Operation::Jalr(i) => control::execute_jalr(i, state, exec),
        Operation::Lui(i) => control::execute_lui(i, exec),
        Operation::Auipc(i) => control::execute_auipc(i, state, exec),
        Operation::Ebreak(_) => control::execute_ebreak(state, config, exec),
    }
    Ok(())
}

fn execute_register(instr: RType, state: &CoreState, exec: &mut ExecuteState, op: AluOp) {
    let a = state.arch.gpr(instr.rs1);
    let b = state.arch.gpr(instr.rs2);
    exec.sources = SourceOperands {
        rs1: Some((instr.rs1, a)),
        rs2: Some((instr.rs2, b)),
    };
    write_result(exec, instr.rd, op.apply(a, b));
}

fn execute_immediate(instr: IType, state: &CoreState, exec: &mut ExecuteState, op: AluOp) {
    let a = state.arch.gpr(instr.rs1);
    exec.sources.rs1 = Some((instr.rs1, a));
    write_result(exec, instr.rd, op.apply(a, instr.imm));
}

fn write_result(exec: &mut ExecuteState, rd: Register, value: u32) {
    exec.dest = Some((rd, value));
    exec.effect = Effect::RegisterWrite { rd, value };
}

/// Applies the accumulated side effects: store, destination register, then `PC`.
///
/// # Errors
///
/// Returns the memory fault if the pending store leaves the window. Stores are
/// validated during execution, so this only fires when the state changed between
/// [`execute_instruction`] and commit; nothing is written in that case.
pub fn commit_execution(state: &mut CoreState, exec: &ExecuteState) -> Result<(), MemoryFault> {
    if let Some(store) = exec.store {
        state.memory.write(store.address, store.width, store.value)?;
    }

    if let Some((rd, value)) = exec.dest {
        state.arch.set_gpr(rd, value);
    }

    state.arch.set_pc(exec.next_pc);
    Ok(())
}

/// Executes exactly one instruction and reports it to `sink`.
///
/// A terminal state is sticky: once halted or fault-latched, further calls
/// return the same outcome without touching the state.
pub fn step_one(state: &mut CoreState, config: &CoreConfig, sink: &mut dyn TraceSink) -> StepOutcome {
    match state.run_state {
        RunState::FaultLatched(fault) => return StepOutcome::Fault { fault },
        RunState::Halted => return StepOutcome::Halted,
        RunState::Running => {}
    }

    let pc = state.arch.pc();
    let (word, operation) = match fetch_and_decode(pc, &state.memory) {
        Ok(fetched) => fetched,
        Err(fault) => return latch_fault(state, sink, pc, fault),
    };

    let (outcome, exec) = execute_instruction(&operation, state, config);
    if let ExecuteOutcome::Fault { fault } = outcome {
        return latch_fault(state, sink, pc, fault);
    }
    if let Err(fault) = commit_execution(state, &exec) {
        return latch_fault(state, sink, pc, fault.into());
    }

    state.retired += 1;
    tracing::trace!(
        pc = format_args!("{pc:#010x}"),
        mnemonic = operation.mnemonic().name(),
        "retired"
    );
    sink.on_event(TraceEvent::Retired(RetiredInstruction {
        pc,
        word,
        operation,
        sources: exec.sources,
        effect: exec.effect,
        next_pc: exec.next_pc,
    }));

    if outcome == ExecuteOutcome::Halted {
        tracing::debug!("halted at {pc:#010x} after {} instructions", state.retired);
        state.run_state = RunState::Halted;
        StepOutcome::Halted
    } else {
        StepOutcome::Retired
    }
}

/// Runs until the program halts, faults, or `max_steps` instructions have retired.
pub fn run(
    state: &mut CoreState,
    config: &CoreConfig,
    sink: &mut dyn TraceSink,
    max_steps: Option<u64>,
) -> RunOutcome {
    let mut steps = 0;
    loop {
        if let Some(status) = terminal_status(state) {
            return RunOutcome { steps, status };
        }
        if max_steps.is_some_and(|limit| steps >= limit) {
            return RunOutcome {
                steps,
                status: RunStatus::StepLimitReached {
                    pc: state.arch.pc(),
                },
            };
        }
        match step_one(state, config, sink) {
            StepOutcome::Retired | StepOutcome::Halted => steps += 1,
            StepOutcome::Fault { .. } => {}
        }
    }
}

const fn terminal_status(state: &CoreState) -> Option<RunStatus> {
    let pc = state.arch.pc();
    match state.run_state {
        RunState::Running => None,
        RunState::Halted => Some(RunStatus::Halted { pc }),
        RunState::FaultLatched(fault) => Some(RunStatus::Fault { pc, fault }),
    }
}

fn latch_fault(
    state: &mut CoreState,
    sink: &mut dyn TraceSink,
    pc: u32,
    fault: Fault,
) -> StepOutcome {
    tracing::warn!("fault at {pc:#010x}: {fault}");
    state.run_state = RunState::FaultLatched(fault);
    sink.on_event(TraceEvent::FaultRaised { pc, fault });
    StepOutcome::Fault { fault }
}

fn fetch_and_decode(pc: u32, memory: &Memory) -> Result<(u32, Operation), Fault> {
    let word = memory.fetch(pc)?;
    let operation = Decoder::decode(word).map_err(|err| err.at(pc))?;
    Ok((word, operation))
}
