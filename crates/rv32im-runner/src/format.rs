//! Text rendering of trace events.
//!
//! One line per event:
//!
//! ```text
//! 0x80000000:addi   ra,zero,0x001   ra=0x00000000+0x00000001=0x00000001
//! 0x80000004:sw     ra,0x010(sp)   mem[0x80000110]=0x00000001
//! 0x80000008:beq    ra,zero,0x008   (0x00000001==0x00000000)=0->pc=0x8000000c
//! 0x8000000c:ebreak
//! ```

use std::io::{self, Write};

use rv32im_core::{
    disassemble, DecodeError, Effect, Fault, Mnemonic, Operation, RetiredInstruction, TraceEvent,
    TraceSink,
};

/// [`TraceSink`] writing one formatted line per event.
///
/// Write failures do not interrupt the run. The first one is kept and
/// returned by [`TraceFormatter::finish`].
#[derive(Debug)]
pub struct TraceFormatter<W> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TraceFormatter<W> {
    /// Wraps a writer.
    pub const fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Flushes the writer and hands it back.
    ///
    /// # Errors
    ///
    /// Returns the first write error seen during the run, or the flush error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> TraceSink for TraceFormatter<W> {
    fn on_event(&mut self, event: TraceEvent) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{}", render_event(&event)) {
            self.error = Some(err);
        }
    }
}

/// Renders a single trace event without the trailing newline.
#[must_use]
pub fn render_event(event: &TraceEvent) -> String {
    match event {
        TraceEvent::Retired(retired) => render_retired(retired),
        TraceEvent::FaultRaised { pc, fault } => render_fault(*pc, *fault),
    }
}

fn render_retired(retired: &RetiredInstruction) -> String {
    let row = disassemble(retired.pc, retired.word);
    let effect = effect_text(retired);
    if effect.is_empty() {
        format!("0x{:08x}:{row}", retired.pc)
    } else {
        format!("0x{:08x}:{row}   {effect}", retired.pc)
    }
}

fn render_fault(pc: u32, fault: Fault) -> String {
    match fault {
        Fault::Decode(DecodeError::UnknownEncoding { word, .. }) => {
            format!("error: unknown instruction 0x{word:08x} at pc = 0x{pc:08x}")
        }
        Fault::Memory(fault) => format!("error: {fault} at pc = 0x{pc:08x}"),
    }
}

fn effect_text(retired: &RetiredInstruction) -> String {
    let lhs = retired.sources.rs1.map_or(0, |(_, value)| value);
    let rhs = retired.sources.rs2.map_or(0, |(_, value)| value);

    match (retired.operation, retired.effect) {
        (Operation::Lui(_), Effect::RegisterWrite { rd, value }) => format!("{rd}=0x{value:08x}"),
        (Operation::Auipc(u), Effect::RegisterWrite { rd, value }) => {
            format!("{rd}=0x{:08x}+0x{:08x}=0x{value:08x}", retired.pc, u.imm)
        }
        (operation, Effect::RegisterWrite { rd, value }) => {
            let rhs = match operation {
                Operation::Slli(i) | Operation::Srli(i) | Operation::Srai(i) => i.shamt(),
                Operation::Addi(i)
                | Operation::Xori(i)
                | Operation::Ori(i)
                | Operation::Andi(i)
                | Operation::Slti(i)
                | Operation::Sltiu(i) => i.imm,
                _ => rhs,
            };
            let mnemonic = operation.mnemonic();
            match mnemonic {
                Mnemonic::Slt | Mnemonic::Sltu | Mnemonic::Slti | Mnemonic::Sltiu => {
                    format!("{rd}=(0x{lhs:08x}<0x{rhs:08x})={value}")
                }
                Mnemonic::Sll
                | Mnemonic::Slli
                | Mnemonic::Srl
                | Mnemonic::Srli
                | Mnemonic::Sra
                | Mnemonic::Srai => {
                    format!("{rd}=0x{lhs:08x}{}{}=0x{value:08x}", operator(mnemonic), rhs & 0x1F)
                }
                _ => format!("{rd}=0x{lhs:08x}{}0x{rhs:08x}=0x{value:08x}", operator(mnemonic)),
            }
        }
        (_, Effect::Load { rd, address, value, .. }) => {
            format!("{rd}=mem[0x{address:08x}]=0x{value:08x}")
        }
        (_, Effect::Store { address, width, value }) => {
            format!("mem[0x{address:08x}]=0x{value:0digits$x}", digits = width.bytes() * 2)
        }
        (operation, Effect::Branch { taken, target }) => format!(
            "(0x{lhs:08x}{}0x{rhs:08x})={}->pc=0x{target:08x}",
            operator(operation.mnemonic()),
            u8::from(taken)
        ),
        (Operation::Jalr(i), Effect::Jump { rd, link, .. }) => {
            format!("pc=0x{lhs:08x}+0x{:08x},{rd}=0x{link:08x}", i.imm)
        }
        (_, Effect::Jump { rd, link, target }) => format!("pc=0x{target:08x},{rd}=0x{link:08x}"),
        (_, Effect::None | Effect::Halt) => String::new(),
    }
}

const fn operator(mnemonic: Mnemonic) -> &'static str {
    match mnemonic {
        Mnemonic::Add | Mnemonic::Addi => "+",
        Mnemonic::Sub => "-",
        Mnemonic::And | Mnemonic::Andi => "&",
        Mnemonic::Or | Mnemonic::Ori => "|",
        Mnemonic::Xor | Mnemonic::Xori => "^",
        Mnemonic::Sll | Mnemonic::Slli => "<<",
        Mnemonic::Srl | Mnemonic::Srli => ">>",
        Mnemonic::Sra | Mnemonic::Srai => ">>>",
        Mnemonic::Mul | Mnemonic::Mulh | Mnemonic::Mulhsu | Mnemonic::Mulhu => "*",
        Mnemonic::Div | Mnemonic::Divu => "/",
        Mnemonic::Rem | Mnemonic::Remu => "%",
        Mnemonic::Beq => "==",
        Mnemonic::Bne => "!=",
        Mnemonic::Blt
        | Mnemonic::Bltu
        | Mnemonic::Slt
        | Mnemonic::Sltu
        | Mnemonic::Slti
        | Mnemonic::Sltiu => "<",
        Mnemonic::Bge | Mnemonic::Bgeu => ">=",
        _ => "?",
    }
}
