//! Per-family routine generators.
//!
//! Each generator is a pure function from descriptor to routine. Shared
//! plumbing lives here: the signature/tail assembly every family uses and
//! the static family-to-generator dispatch. Dispatch is an exhaustive match
//! over the closed [`Family`] enum; the `Option` return keeps the driver's
//! skip-and-report path honest for any family left without a generator.

mod arithmetic;
mod bits;
mod control;
mod load;
mod misc;
mod rotate;
mod stack;

use crate::error::{LowerError, RowViolation};
use crate::family::Family;
use crate::routine::{GeneratedRoutine, ImmediateShape};
use crate::table::InstructionDescriptor;

/// Generator function shape shared by every family.
pub type Generator = fn(&InstructionDescriptor) -> Result<GeneratedRoutine, LowerError>;

/// Returns the generator for a family.
///
/// The match is exhaustive, so a new family without a generator fails to
/// compile; a `None` arm would make the row a reported coverage gap rather
/// than an error.
#[must_use]
pub fn generator_for(family: Family) -> Option<Generator> {
    match family {
        Family::Ld | Family::Ldi | Family::Ldd | Family::Ldh | Family::Ldc => {
            Some(load::lower_load)
        }
        Family::Ldhl => Some(load::lower_ldhl),
        Family::Add => Some(arithmetic::lower_add),
        Family::Adc => Some(arithmetic::lower_adc),
        Family::Sub => Some(arithmetic::lower_sub),
        Family::Sbc => Some(arithmetic::lower_sbc),
        Family::Cp => Some(arithmetic::lower_compare),
        Family::Inc => Some(arithmetic::lower_increment),
        Family::Dec => Some(arithmetic::lower_decrement),
        Family::And | Family::Or | Family::Xor => Some(arithmetic::lower_bitwise),
        Family::Rlca
        | Family::Rrca
        | Family::Rla
        | Family::Rra
        | Family::Rlc
        | Family::Rrc
        | Family::Rl
        | Family::Rr => Some(rotate::lower_rotate),
        Family::Sla | Family::Sra | Family::Srl => Some(rotate::lower_shift),
        Family::Swap => Some(rotate::lower_swap),
        Family::Bit => Some(bits::lower_bit_test),
        Family::Res => Some(bits::lower_bit_reset),
        Family::Set => Some(bits::lower_bit_set),
        Family::Jr => Some(control::lower_relative_jump),
        Family::Jp => Some(control::lower_absolute_jump),
        Family::Call => Some(control::lower_call),
        Family::Ret | Family::Reti => Some(control::lower_return),
        Family::Rst => Some(control::lower_restart),
        Family::Push => Some(stack::lower_push),
        Family::Pop => Some(stack::lower_pop),
        Family::Nop => Some(misc::lower_nop),
        Family::Halt => Some(misc::lower_halt),
        Family::Stop => Some(misc::lower_stop),
        Family::Di | Family::Ei => Some(misc::lower_interrupt_latch),
        Family::Scf => Some(misc::lower_set_carry),
        Family::Ccf => Some(misc::lower_complement_carry),
        Family::Cpl => Some(misc::lower_complement_accumulator),
        Family::Daa => Some(misc::lower_decimal_adjust),
        Family::Prefix => Some(misc::lower_prefix),
        Family::Unknown => Some(misc::lower_unknown),
    }
}

/// Tail statements appended to a routine body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RoutineTail {
    /// Append the program-counter advance by the instruction length.
    pub advance_pc: bool,
    /// Append the fixed cycle-count return.
    pub return_cycles: bool,
}

impl RoutineTail {
    /// PC advance and cycle return, the default for straight-line families.
    pub(crate) const STANDARD: Self = Self {
        advance_pc: true,
        return_cycles: true,
    };
    /// The body set PC itself; only the cycle return is appended.
    pub(crate) const PC_MANAGED: Self = Self {
        advance_pc: false,
        return_cycles: true,
    };
    /// The body handles both PC and timing (dual-path families, traps).
    pub(crate) const BODY_MANAGED: Self = Self {
        advance_pc: false,
        return_cycles: false,
    };
}

/// Attributes a row violation to the row's opcode.
pub(crate) fn row_error(descriptor: &InstructionDescriptor, violation: RowViolation) -> LowerError {
    LowerError::MalformedRow {
        opcode: descriptor.opcode,
        violation,
    }
}

fn parameter(name: &str, declaration: &str, used: bool) -> String {
    if used {
        format!("{name}{declaration}")
    } else {
        format!("_{name}{declaration}")
    }
}

/// Assembles the final routine from its body statements.
///
/// Parameters that the body never touches are underscore-prefixed so the
/// generated module compiles without unused-variable noise.
pub(crate) fn assemble_routine(
    descriptor: &InstructionDescriptor,
    mut lines: Vec<String>,
    tail: RoutineTail,
) -> GeneratedRoutine {
    if tail.advance_pc {
        lines.push(format!(
            "registers.pc = registers.pc.wrapping_add({}u16);",
            descriptor.byte_length
        ));
    }
    if tail.return_cycles {
        lines.push(format!("return {}u16;", descriptor.cycles_taken));
    }

    let body = lines.join("\n");
    let identifier = format!(
        "{}_{:03x}",
        descriptor.family.identifier_stem(),
        descriptor.opcode
    );
    let signature = format!(
        "pub fn {identifier}({}, {}, {}) -> u16",
        parameter("arguments", ": Arguments", body.contains("arguments")),
        parameter("registers", ": &mut Registers", body.contains("registers")),
        parameter("memory", ": &mut dyn Memory", body.contains("memory")),
    );
    let mnemonic = descriptor.mnemonic();

    let indented: String = body
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    GeneratedRoutine {
        identifier,
        declaration: format!("{signature}; // {mnemonic}"),
        definition: format!("/// {mnemonic}\n{signature} {{\n{indented}\n}}"),
        immediate_shape: ImmediateShape::from_operands(&descriptor.operands),
    }
}
