//! Arithmetic-family generators: add/subtract with and without carry,
//! compare, unary increment/decrement, and the accumulator bitwise group.

use crate::error::LowerError;
use crate::family::Family;
use crate::flags::{flag_update, synthesize_arithmetic, ArithmeticRequest, Direction};
use crate::lower::{assemble_routine, row_error, RoutineTail};
use crate::resolver;
use crate::routine::GeneratedRoutine;
use crate::table::{InstructionDescriptor, OperandSpec, Operands};

/// Incoming-carry initializer shared by the with-carry variants.
const CARRY_IN: &str = "(registers.get_carry_flag() as i32)";

/// Shared two-operand add/subtract shape: synthesize flags, store the
/// truncated result back through the first operand.
fn lower_binary(
    descriptor: &InstructionDescriptor,
    direction: Direction,
    extra_init: Option<&str>,
) -> Result<GeneratedRoutine, LowerError> {
    let (first, second) = descriptor
        .operands
        .demand_two(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;

    let first_read = resolver::read_operand(first, None)
        .map_err(|violation| row_error(descriptor, violation))?;
    let second_read = resolver::read_operand(second, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    let parts = synthesize_arithmetic(&ArithmeticRequest {
        descriptor,
        direction,
        first_init: &format!("({first_read} as i32)"),
        second_init: &format!("({second_read} as i32)"),
        extra_init,
        extra_in_half: extra_init.is_some(),
    });

    let mut lines = parts.statements;
    let store = resolver::write_operand(first, &parts.result_expr, first.value_width(), None)
        .map_err(|violation| row_error(descriptor, violation))?;
    lines.push(store);

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Derives the accumulator-normalized copy used by the single-operand
/// subtract shapes: the row operand becomes the subtrahend, `A` the minuend.
/// The shared table row is never touched.
fn normalize_to_accumulator(
    descriptor: &InstructionDescriptor,
) -> Result<InstructionDescriptor, LowerError> {
    let operand = descriptor
        .operands
        .demand_one(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    Ok(descriptor.with_operands(Operands::Two(
        OperandSpec::register("A"),
        operand.clone(),
    )))
}

/// Lowers `ADD` rows (accumulator, `HL`, and `SP` shapes alike).
pub(super) fn lower_add(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    lower_binary(descriptor, Direction::Add, None)
}

/// Lowers `ADC` rows: the incoming carry joins both the result and the
/// half-carry accumulation.
pub(super) fn lower_adc(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    lower_binary(descriptor, Direction::Add, Some(CARRY_IN))
}

/// Lowers `SUB` rows through the normalized accumulator shape.
pub(super) fn lower_sub(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let normalized = normalize_to_accumulator(descriptor)?;
    lower_binary(&normalized, Direction::Subtract, None)
}

/// Lowers `SBC` rows.
pub(super) fn lower_sbc(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    lower_binary(descriptor, Direction::Subtract, Some(CARRY_IN))
}

/// Lowers `CP` rows: subtract flags with the result discarded.
pub(super) fn lower_compare(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let normalized = normalize_to_accumulator(descriptor)?;
    let (first, second) = normalized
        .operands
        .demand_two(normalized.family)
        .map_err(|violation| row_error(&normalized, violation))?;

    let first_read = resolver::read_operand(first, None)
        .map_err(|violation| row_error(&normalized, violation))?;
    let second_read = resolver::read_operand(second, None)
        .map_err(|violation| row_error(&normalized, violation))?;

    let parts = synthesize_arithmetic(&ArithmeticRequest {
        descriptor: &normalized,
        direction: Direction::Subtract,
        first_init: &format!("({first_read} as i32)"),
        second_init: &format!("({second_read} as i32)"),
        extra_init: None,
        extra_in_half: false,
    });

    Ok(assemble_routine(
        &normalized,
        parts.statements,
        RoutineTail::STANDARD,
    ))
}

/// Shared unary shape: add or subtract an implicit literal 1.
fn lower_unary(
    descriptor: &InstructionDescriptor,
    direction: Direction,
) -> Result<GeneratedRoutine, LowerError> {
    let operand = descriptor
        .operands
        .demand_one(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;

    let read = resolver::read_operand(operand, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    let parts = synthesize_arithmetic(&ArithmeticRequest {
        descriptor,
        direction,
        first_init: &format!("({read} as i32)"),
        second_init: "1i32",
        extra_init: None,
        extra_in_half: false,
    });

    let mut lines = parts.statements;
    let store = resolver::write_operand(operand, &parts.result_expr, operand.value_width(), None)
        .map_err(|violation| row_error(descriptor, violation))?;
    lines.push(store);

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers `INC` rows.
pub(super) fn lower_increment(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    lower_unary(descriptor, Direction::Add)
}

/// Lowers `DEC` rows.
pub(super) fn lower_decrement(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    lower_unary(descriptor, Direction::Subtract)
}

/// Lowers the accumulator bitwise group (`AND`, `OR`, `XOR`).
pub(super) fn lower_bitwise(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let operator = match descriptor.family {
        Family::And => "&",
        Family::Or => "|",
        _ => "^",
    };
    let operand = descriptor
        .operands
        .demand_one(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let read = resolver::read_operand(operand, None)
        .map_err(|violation| row_error(descriptor, violation))?;

    let mut lines = vec![
        format!("registers.a = registers.a {operator} ({read});"),
        "let zero_flag: u8 = (registers.a == 0u8) as u8;".to_string(),
    ];
    if let Some(update) = flag_update(descriptor.flags) {
        lines.push(update);
    }

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}
