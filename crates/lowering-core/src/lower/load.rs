//! Load-family generators: plain, post-increment/decrement, high-memory,
//! and the stack-pointer-displacement load.

use crate::error::LowerError;
use crate::family::Family;
use crate::flags::{synthesize_arithmetic, ArithmeticRequest, Direction};
use crate::lower::{assemble_routine, row_error, RoutineTail};
use crate::resolver::{self, HIGH_MEMORY_BIAS};
use crate::routine::GeneratedRoutine;
use crate::table::InstructionDescriptor;

/// Lowers `LD`, `LDI`, `LDD`, `LDH`, and `LDC` rows.
///
/// The high-memory variants bias both effective addresses by `0xFF00`; the
/// post-increment/decrement variants mutate `HL` after the transfer.
pub(super) fn lower_load(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let bias = matches!(descriptor.family, Family::Ldh | Family::Ldc).then_some(HIGH_MEMORY_BIAS);
    let (destination, source) = descriptor
        .operands
        .demand_two(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;

    let value = resolver::read_operand(source, bias)
        .map_err(|violation| row_error(descriptor, violation))?;
    let store = resolver::write_operand(destination, &value, source.value_width(), bias)
        .map_err(|violation| row_error(descriptor, violation))?;

    let mut lines = vec![store];
    match descriptor.family {
        Family::Ldi => {
            lines.push("registers.set_hl(registers.get_hl().wrapping_add(1u16));".to_string());
        }
        Family::Ldd => {
            lines.push("registers.set_hl(registers.get_hl().wrapping_sub(1u16));".to_string());
        }
        _ => {}
    }

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers the `LDHL SP, r8` row: a flag-producing add whose result lands in
/// `HL` instead of back in the first operand.
pub(super) fn lower_ldhl(
    descriptor: &InstructionDescriptor,
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
        direction: Direction::Add,
        first_init: &format!("({first_read} as i32)"),
        second_init: &format!("({second_read} as i32)"),
        extra_init: None,
        extra_in_half: false,
    });

    let mut lines = parts.statements;
    let store = resolver::register_write("HL", &parts.result_expr)
        .map_err(|violation| row_error(descriptor, violation))?;
    lines.push(store);

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

#[cfg(test)]
mod tests {
    use super::{lower_load, lower_ldhl};
    use crate::family::Family;
    use crate::table::{
        FlagAction, FlagPolicy, InstructionDescriptor, OperandKind, OperandSpec, OperandWidth,
        Operands,
    };

    fn load_row(family: Family, operands: Operands) -> InstructionDescriptor {
        InstructionDescriptor {
            opcode: 0x22,
            family,
            operands,
            byte_length: 1,
            cycles_taken: 8,
            cycles_not_taken: 8,
            flags: FlagPolicy::UNAFFECTED,
        }
    }

    fn hl_indirect() -> OperandSpec {
        OperandSpec {
            kind: OperandKind::Register,
            is_address: true,
            width: OperandWidth::Two,
            name: "HL".to_string(),
            literal: None,
        }
    }

    #[test]
    fn post_increment_load_bumps_hl_after_the_transfer() {
        let row = load_row(
            Family::Ldi,
            Operands::Two(hl_indirect(), OperandSpec::register("A")),
        );
        let routine = lower_load(&row).unwrap();
        let store = routine
            .definition
            .find("memory.set(registers.get_hl(), registers.a);")
            .unwrap();
        let bump = routine
            .definition
            .find("registers.set_hl(registers.get_hl().wrapping_add(1u16));")
            .unwrap();
        assert!(store < bump);
    }

    #[test]
    fn high_memory_load_biases_both_sides() {
        let row = load_row(
            Family::Ldh,
            Operands::Two(
                OperandSpec {
                    kind: OperandKind::UInt8,
                    is_address: true,
                    width: OperandWidth::One,
                    name: "a8".to_string(),
                    literal: None,
                },
                OperandSpec::register("A"),
            ),
        );
        let routine = lower_load(&row).unwrap();
        assert!(routine
            .definition
            .contains("memory.set((arguments.uint8() as u16) + 0xFF00u16, registers.a);"));
    }

    #[test]
    fn displacement_load_lands_in_hl_with_byte_ceilings_excluded() {
        let row = InstructionDescriptor {
            opcode: 0xF8,
            family: Family::Ldhl,
            operands: Operands::Two(
                OperandSpec::register("SP"),
                OperandSpec {
                    kind: OperandKind::PcRelInt8,
                    is_address: false,
                    width: OperandWidth::One,
                    name: "r8".to_string(),
                    literal: None,
                },
            ),
            byte_length: 2,
            cycles_taken: 12,
            cycles_not_taken: 12,
            flags: FlagPolicy {
                zero: FlagAction::Reset,
                subtract: FlagAction::Reset,
                half_carry: FlagAction::DataDependent,
                carry: FlagAction::DataDependent,
            },
        };
        let routine = lower_ldhl(&row).unwrap();
        assert!(routine
            .definition
            .contains("registers.set_hl((result & 0xFFFFi32) as u16);"));
        assert!(routine.definition.contains("let lhs: i32 = (registers.sp as i32);"));
    }
}
