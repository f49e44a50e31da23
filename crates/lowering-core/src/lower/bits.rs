//! Bit-manipulation generators: test, reset, and set of a literal bit index.

use crate::error::{LowerError, RowViolation};
use crate::flags::flag_update;
use crate::lower::{assemble_routine, row_error, RoutineTail};
use crate::resolver;
use crate::routine::GeneratedRoutine;
use crate::table::{InstructionDescriptor, OperandSpec, OperandWidth};

fn bit_index(
    descriptor: &InstructionDescriptor,
    operand: &OperandSpec,
) -> Result<u16, LowerError> {
    let index = operand.literal.ok_or_else(|| {
        row_error(
            descriptor,
            RowViolation::MissingLiteral {
                name: operand.name.clone(),
            },
        )
    })?;
    if index > 7 {
        return Err(row_error(
            descriptor,
            RowViolation::BitIndexOutOfRange { index },
        ));
    }
    Ok(index)
}

/// Lowers `BIT` rows: the zero flag becomes the complement of the tested bit.
pub(super) fn lower_bit_test(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let (index_operand, target) = descriptor
        .operands
        .demand_two(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let index = bit_index(descriptor, index_operand)?;
    let read = resolver::read_operand(target, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    let mut lines = vec![format!(
        "let zero_flag: u8 = ((({read} >> {index}u8) & 0b1u8) == 0u8) as u8;"
    )];
    if let Some(update) = flag_update(descriptor.flags) {
        lines.push(update);
    }

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers `RES` rows with a literal clear mask.
pub(super) fn lower_bit_reset(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let (index_operand, target) = descriptor
        .operands
        .demand_two(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let index = bit_index(descriptor, index_operand)?;
    let mask = 0xFFu8 & !(1u8 << index);
    let read = resolver::read_operand(target, None)
        .map_err(|violation| row_error(descriptor, violation))?;
    let value = format!("({read}) & {mask:#010b}u8");
    let store = resolver::write_operand(target, &value, OperandWidth::One, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    Ok(assemble_routine(descriptor, vec![store], RoutineTail::STANDARD))
}

/// Lowers `SET` rows with a literal set mask.
pub(super) fn lower_bit_set(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let (index_operand, target) = descriptor
        .operands
        .demand_two(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let index = bit_index(descriptor, index_operand)?;
    let mask = 1u8 << index;
    let read = resolver::read_operand(target, None)
        .map_err(|violation| row_error(descriptor, violation))?;
    let value = format!("({read}) | {mask:#010b}u8");
    let store = resolver::write_operand(target, &value, OperandWidth::One, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    Ok(assemble_routine(descriptor, vec![store], RoutineTail::STANDARD))
}
