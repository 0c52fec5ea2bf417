//! Branches, jumps, upper-immediate forms and halt detection.

use super::helpers::{effective_address, jalr_target};
use super::ExecuteState;
use crate::api::{
    CoreConfig, CoreState, Effect, HaltPolicy, SourceOperands, SEMIHOSTING_ENTRY_WORD,
    SEMIHOSTING_EXIT_WORD,
};
use crate::decoder::{BType, IType, JType, UType};
use crate::memory::{Memory, INSTRUCTION_BYTES};

/// Conditional branch comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BranchOp {
    Eq,
    Ne,
    Lt,
    Ge,
    Ltu,
    Geu,
}

impl BranchOp {
    /// Evaluates the comparison; `Lt`/`Ge` are signed, `Ltu`/`Geu` unsigned.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn taken(self, a: u32, b: u32) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Lt => (a as i32) < (b as i32),
            Self::Ge => (a as i32) >= (b as i32),
            Self::Ltu => a < b,
            Self::Geu => a >= b,
        }
    }
}

/// Returns `true` when `ebreak` at `pc` halts under `policy`.
#[must_use]
pub fn halt_requested(policy: HaltPolicy, memory: &Memory, pc: u32) -> bool {
    match policy {
        HaltPolicy::Ebreak => true,
        HaltPolicy::SemihostingMarker => {
            let previous = memory.peek_word(pc.wrapping_sub(INSTRUCTION_BYTES));
            let next = memory.peek_word(pc.wrapping_add(INSTRUCTION_BYTES));
            previous == Some(SEMIHOSTING_ENTRY_WORD) && next == Some(SEMIHOSTING_EXIT_WORD)
        }
    }
}

pub(super) fn execute_branch(
    instr: BType,
    state: &CoreState,
    exec: &mut ExecuteState,
    op: BranchOp,
) {
    let a = state.arch.gpr(instr.rs1);
    let b = state.arch.gpr(instr.rs2);
    exec.sources = SourceOperands {
        rs1: Some((instr.rs1, a)),
        rs2: Some((instr.rs2, b)),
    };

    let taken = op.taken(a, b);
    if taken {
        exec.next_pc = state.arch.pc().wrapping_add(instr.imm);
    }
    exec.effect = Effect::Branch {
        taken,
        target: exec.next_pc,
    };
}

pub(super) fn execute_jal(instr: JType, state: &CoreState, exec: &mut ExecuteState) {
    let link = exec.next_pc;
    let target = state.arch.pc().wrapping_add(instr.imm);

    exec.dest = Some((instr.rd, link));
    exec.next_pc = target;
    exec.effect = Effect::Jump {
        rd: instr.rd,
        link,
        target,
    };
}

/// Target is computed from `rs1` before the link write, so `rd == rs1` is safe.
pub(super) fn execute_jalr(instr: IType, state: &CoreState, exec: &mut ExecuteState) {
    let base = state.arch.gpr(instr.rs1);
    exec.sources.rs1 = Some((instr.rs1, base));

    let link = exec.next_pc;
    let target = jalr_target(base, instr.imm);

    exec.dest = Some((instr.rd, link));
    exec.next_pc = target;
    exec.effect = Effect::Jump {
        rd: instr.rd,
        link,
        target,
    };
}

pub(super) fn execute_lui(instr: UType, exec: &mut ExecuteState) {
    exec.dest = Some((instr.rd, instr.imm));
    exec.effect = Effect::RegisterWrite {
        rd: instr.rd,
        value: instr.imm,
    };
}

pub(super) fn execute_auipc(instr: UType, state: &CoreState, exec: &mut ExecuteState) {
    let value = effective_address(state.arch.pc(), instr.imm);
    exec.dest = Some((instr.rd, value));
    exec.effect = Effect::RegisterWrite {
        rd: instr.rd,
        value,
    };
}

/// A halting `ebreak` leaves `PC` on itself; a non-halting one falls through.
pub(super) fn execute_ebreak(state: &CoreState, config: &CoreConfig, exec: &mut ExecuteState) {
    let pc = state.arch.pc();
    if halt_requested(config.halt_policy, &state.memory, pc) {
        exec.halt = true;
        exec.next_pc = pc;
        exec.effect = Effect::Halt;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{halt_requested, BranchOp};
    use crate::api::{HaltPolicy, SEMIHOSTING_ENTRY_WORD, SEMIHOSTING_EXIT_WORD};
    use crate::encoding::EBREAK_WORD;
    use crate::memory::Memory;

    const BASE: u32 = 0x8000_0000;

    #[rstest]
    #[case(BranchOp::Eq, 5, 5, true)]
    #[case(BranchOp::Ne, 5, 5, false)]
    #[case(BranchOp::Lt, 0xFFFF_FFFF, 0, true)]
    #[case(BranchOp::Ltu, 0xFFFF_FFFF, 0, false)]
    #[case(BranchOp::Ge, 0, 0xFFFF_FFFF, true)]
    #[case(BranchOp::Geu, 0, 0xFFFF_FFFF, false)]
    #[case(BranchOp::Ge, 7, 7, true)]
    #[case(BranchOp::Geu, 7, 7, true)]
    fn branch_comparisons(#[case] op: BranchOp, #[case] a: u32, #[case] b: u32, #[case] taken: bool) {
        assert_eq!(op.taken(a, b), taken);
    }

    #[test]
    fn ebreak_policy_always_halts() {
        let memory = Memory::default();
        assert!(halt_requested(HaltPolicy::Ebreak, &memory, BASE));
    }

    #[test]
    fn semihosting_marker_requires_both_neighbours() {
        let mut memory = Memory::default();
        memory.write_u32(BASE + 4, SEMIHOSTING_ENTRY_WORD).unwrap();
        memory.write_u32(BASE + 8, EBREAK_WORD).unwrap();

        assert!(!halt_requested(HaltPolicy::SemihostingMarker, &memory, BASE + 8));

        memory.write_u32(BASE + 12, SEMIHOSTING_EXIT_WORD).unwrap();
        assert!(halt_requested(HaltPolicy::SemihostingMarker, &memory, BASE + 8));
    }

    #[test]
    fn semihosting_marker_at_memory_edge_does_not_fault() {
        let memory = Memory::default();
        assert!(!halt_requested(HaltPolicy::SemihostingMarker, &memory, BASE));
    }
}
