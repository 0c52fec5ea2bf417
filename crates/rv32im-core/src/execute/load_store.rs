//! Load and store execution against the bounds-checked memory accessor.

use super::helpers::{effective_address, sign_extend};
use super::{ExecuteState, PendingStore};
use crate::api::{CoreState, Effect, SourceOperands};
use crate::decoder::{IType, SType};
use crate::memory::{AccessKind, AccessWidth};
use crate::MemoryFault;

/// Width and extension rule of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadOp {
    /// Bytes read.
    pub width: AccessWidth,
    /// Sign-extend (`lb`/`lh`) rather than zero-extend (`lbu`/`lhu`).
    pub signed: bool,
}

impl LoadOp {
    /// `lb`
    pub const BYTE: Self = Self {
        width: AccessWidth::Byte,
        signed: true,
    };
    /// `lh`
    pub const HALF: Self = Self {
        width: AccessWidth::Half,
        signed: true,
    };
    /// `lw`
    pub const WORD: Self = Self {
        width: AccessWidth::Word,
        signed: false,
    };
    /// `lbu`
    pub const BYTE_UNSIGNED: Self = Self {
        width: AccessWidth::Byte,
        signed: false,
    };
    /// `lhu`
    pub const HALF_UNSIGNED: Self = Self {
        width: AccessWidth::Half,
        signed: false,
    };

    /// Extends a zero-extended raw read to 32 bits.
    #[must_use]
    pub const fn extend(self, raw: u32) -> u32 {
        match (self.width, self.signed) {
            (AccessWidth::Byte, true) => sign_extend(raw, 8),
            (AccessWidth::Half, true) => sign_extend(raw, 16),
            _ => raw,
        }
    }
}

/// `rd = extend(mem[x[rs1] + imm])`.
pub(super) fn execute_load(
    instr: IType,
    state: &CoreState,
    exec: &mut ExecuteState,
    load: LoadOp,
) -> Result<(), MemoryFault> {
    let base = state.arch.gpr(instr.rs1);
    exec.sources = SourceOperands {
        rs1: Some((instr.rs1, base)),
        rs2: None,
    };

    let address = effective_address(base, instr.imm);
    let raw = state.memory.read(address, load.width, AccessKind::Load)?;
    let value = load.extend(raw);

    exec.dest = Some((instr.rd, value));
    exec.effect = Effect::Load {
        rd: instr.rd,
        address,
        width: load.width,
        value,
    };
    Ok(())
}

/// `mem[x[rs1] + imm] = low bytes of x[rs2]`.
///
/// Bounds are validated here so the store is only committed when it cannot fault.
pub(super) fn execute_store(
    instr: SType,
    state: &CoreState,
    exec: &mut ExecuteState,
    width: AccessWidth,
) -> Result<(), MemoryFault> {
    let base = state.arch.gpr(instr.rs1);
    let data = state.arch.gpr(instr.rs2);
    exec.sources = SourceOperands {
        rs1: Some((instr.rs1, base)),
        rs2: Some((instr.rs2, data)),
    };

    let address = effective_address(base, instr.imm);
    state
        .memory
        .window()
        .translate(address, width, AccessKind::Store)?;

    let value = data & width.mask();
    exec.store = Some(PendingStore {
        address,
        width,
        value,
    });
    exec.effect = Effect::Store {
        address,
        width,
        value,
    };
    Ok(())
}
