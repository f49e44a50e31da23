//! Rotate, shift, and nibble-swap generators.
//!
//! All twelve variants share the same skeleton: capture the outgoing bit in
//! a carry temporary, compute the shifted value, optionally recompute zero,
//! write back, update flags. The four single-byte unprefixed rotates carry
//! no explicit operand and fall back to the accumulator.

use crate::error::LowerError;
use crate::family::Family;
use crate::flags::flag_update;
use crate::lower::{assemble_routine, row_error, RoutineTail};
use crate::resolver;
use crate::routine::GeneratedRoutine;
use crate::table::{FlagAction, InstructionDescriptor, OperandSpec, OperandWidth, Operands};

fn rotate_target(descriptor: &InstructionDescriptor) -> Result<OperandSpec, LowerError> {
    match &descriptor.operands {
        Operands::None => Ok(OperandSpec::register("A")),
        Operands::One(operand) => Ok(operand.clone()),
        Operands::Two(_, _) => Err(row_error(
            descriptor,
            crate::error::RowViolation::ArityMismatch {
                family: descriptor.family,
                expected: 1,
                actual: 2,
            },
        )),
    }
}

const fn is_left_rotate(family: Family) -> bool {
    matches!(family, Family::Rlca | Family::Rla | Family::Rlc | Family::Rl)
}

const fn rotates_through_own_carry(family: Family) -> bool {
    matches!(
        family,
        Family::Rlca | Family::Rrca | Family::Rlc | Family::Rrc
    )
}

/// Lowers the eight rotate rows.
pub(super) fn lower_rotate(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let target = rotate_target(descriptor)?;
    let read = resolver::read_operand(&target, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    let left = is_left_rotate(descriptor.family);
    let carried: &str = if rotates_through_own_carry(descriptor.family) {
        "carry_flag"
    } else {
        "(registers.get_carry_flag() as u8)"
    };

    let mut lines = vec![format!("let value: u8 = {read};")];
    if left {
        lines.push("let carry_flag: u8 = (value >> 7u8) & 0b1u8;".to_string());
        lines.push(format!(
            "let result: u8 = ((((value as u16) << 1u16) + ({carried} as u16)) & 0xFFu16) as u8;"
        ));
    } else {
        lines.push("let carry_flag: u8 = value & 0b1u8;".to_string());
        lines.push(format!(
            "let result: u8 = (value >> 1u8) + ({carried} << 7u8);"
        ));
    }
    if descriptor.flags.zero == FlagAction::DataDependent {
        lines.push("let zero_flag: u8 = (result == 0u8) as u8;".to_string());
    }
    let store = resolver::write_operand(&target, "result", OperandWidth::One, None)
        .map_err(|violation| row_error(descriptor, violation))?;
    lines.push(store);
    if let Some(update) = flag_update(descriptor.flags) {
        lines.push(update);
    }

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers the three shift rows (`SLA`, `SRA`, `SRL`).
pub(super) fn lower_shift(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let target = descriptor
        .operands
        .demand_one(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let read = resolver::read_operand(target, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    let (carry, result) = match descriptor.family {
        Family::Sla => (
            "(value >> 7u8) & 0b1u8",
            "(((value as u16) << 1u16) & 0xFFu16) as u8",
        ),
        Family::Sra => ("value & 0b1u8", "(value >> 1u8) + (value & 0x80u8)"),
        _ => ("value & 0b1u8", "value >> 1u8"),
    };

    let mut lines = vec![
        format!("let value: u8 = {read};"),
        format!("let carry_flag: u8 = {carry};"),
        format!("let result: u8 = {result};"),
    ];
    if descriptor.flags.zero == FlagAction::DataDependent {
        lines.push("let zero_flag: u8 = (result == 0u8) as u8;".to_string());
    }
    let store = resolver::write_operand(target, "result", OperandWidth::One, None)
        .map_err(|violation| row_error(descriptor, violation))?;
    lines.push(store);
    if let Some(update) = flag_update(descriptor.flags) {
        lines.push(update);
    }

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers the nibble-swap rows.
pub(super) fn lower_swap(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let target = descriptor
        .operands
        .demand_one(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let read = resolver::read_operand(target, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    let mut lines = vec![
        format!("let value: u8 = {read};"),
        "let result: u8 = (value >> 4u8) | (value << 4u8);".to_string(),
        "let zero_flag: u8 = (result == 0u8) as u8;".to_string(),
    ];
    let store = resolver::write_operand(target, "result", OperandWidth::One, None)
        .map_err(|violation| row_error(descriptor, violation))?;
    lines.push(store);
    if let Some(update) = flag_update(descriptor.flags) {
        lines.push(update);
    }

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}
