//! Control-transfer generators: relative and absolute jumps, calls,
//! returns, and fixed-address restarts.
//!
//! Conditional rows encode two timing paths. The fall-through path advances
//! PC past the instruction exactly once and returns the not-taken count;
//! the acting path performs the transfer and returns the taken count. The
//! return address pushed by calls and restarts is always the post-advance
//! PC, written high byte first with the stack pointer decremented before
//! each byte.

use crate::error::{LowerError, RowViolation};
use crate::lower::{assemble_routine, row_error, RoutineTail};
use crate::resolver;
use crate::routine::GeneratedRoutine;
use crate::table::{InstructionDescriptor, OperandSpec, Operands};

/// Renders the predicate expression for a flag-condition operand.
fn condition_read(operand: &OperandSpec) -> Result<&'static str, RowViolation> {
    match operand.name.as_str() {
        "NZ" => Ok("registers.get_non_zero_flag()"),
        "Z" => Ok("registers.get_zero_flag()"),
        "NC" => Ok("registers.get_non_carry_flag()"),
        "C" => Ok("registers.get_carry_flag()"),
        _ => Err(RowViolation::UnknownCondition {
            name: operand.name.clone(),
        }),
    }
}

/// Statements pushing the current PC, high byte first.
fn push_pc_lines() -> Vec<String> {
    vec![
        "registers.sp = registers.sp.wrapping_sub(1u16);".to_string(),
        "memory.set(registers.sp, ((registers.pc >> 8u16) & 0xFFu16) as u8);".to_string(),
        "registers.sp = registers.sp.wrapping_sub(1u16);".to_string(),
        "memory.set(registers.sp, (registers.pc & 0xFFu16) as u8);".to_string(),
    ]
}

/// Statements popping PC, low byte first.
fn pop_pc_lines() -> Vec<String> {
    vec![
        "let lower: u8 = memory.get(registers.sp);".to_string(),
        "registers.sp = registers.sp.wrapping_add(1u16);".to_string(),
        "let upper: u8 = memory.get(registers.sp);".to_string(),
        "registers.sp = registers.sp.wrapping_add(1u16);".to_string(),
        "registers.pc = ((upper as u16) << 8u16) | (lower as u16);".to_string(),
    ]
}

fn indent(lines: &[String]) -> Vec<String> {
    lines.iter().map(|line| format!("    {line}")).collect()
}

/// Wraps the acting path in the shared conditional skeleton.
fn conditional_paths(
    descriptor: &InstructionDescriptor,
    condition: &str,
    acting: Vec<String>,
) -> Vec<String> {
    let mut lines = vec![format!("if {condition} {{")];
    lines.extend(indent(&acting));
    lines.push(format!("    return {}u16;", descriptor.cycles_taken));
    lines.push("}".to_string());
    lines.push(format!(
        "registers.pc = registers.pc.wrapping_add({}u16);",
        descriptor.byte_length
    ));
    lines.push(format!("return {}u16;", descriptor.cycles_not_taken));
    lines
}

/// Lowers `JR` rows.
pub(super) fn lower_relative_jump(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    match &descriptor.operands {
        Operands::One(target) => {
            let offset = resolver::read_operand(target, None)
                .map_err(|violation| row_error(descriptor, violation))?;
            let lines = vec![format!(
                "registers.pc = ((registers.pc as i32) + {}i32 + (({offset}) as i32)) as u16;",
                descriptor.byte_length
            )];
            Ok(assemble_routine(descriptor, lines, RoutineTail::PC_MANAGED))
        }
        Operands::Two(condition, target) => {
            let predicate = condition_read(condition)
                .map_err(|violation| row_error(descriptor, violation))?;
            let offset = resolver::read_operand(target, None)
                .map_err(|violation| row_error(descriptor, violation))?;
            let lines = vec![
                format!(
                    "registers.pc = registers.pc.wrapping_add({}u16);",
                    descriptor.byte_length
                ),
                format!("if !{predicate} {{"),
                format!("    return {}u16;", descriptor.cycles_not_taken),
                "}".to_string(),
                format!("registers.pc = ((registers.pc as i32) + (({offset}) as i32)) as u16;"),
                format!("return {}u16;", descriptor.cycles_taken),
            ];
            Ok(assemble_routine(
                descriptor,
                lines,
                RoutineTail::BODY_MANAGED,
            ))
        }
        Operands::None => Err(row_error(
            descriptor,
            RowViolation::ArityMismatch {
                family: descriptor.family,
                expected: 1,
                actual: 0,
            },
        )),
    }
}

/// Lowers `JP` rows. The unconditional shape resolves its target through
/// the operand resolver, so register targets read the register directly.
pub(super) fn lower_absolute_jump(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    match &descriptor.operands {
        Operands::One(target) => {
            let read = resolver::read_operand(target, None)
                .map_err(|violation| row_error(descriptor, violation))?;
            let lines = vec![format!("registers.pc = {read};")];
            Ok(assemble_routine(descriptor, lines, RoutineTail::PC_MANAGED))
        }
        Operands::Two(condition, target) => {
            let predicate = condition_read(condition)
                .map_err(|violation| row_error(descriptor, violation))?;
            let read = resolver::read_operand(target, None)
                .map_err(|violation| row_error(descriptor, violation))?;
            let lines = conditional_paths(descriptor, predicate, vec![format!(
                "registers.pc = {read};"
            )]);
            Ok(assemble_routine(
                descriptor,
                lines,
                RoutineTail::BODY_MANAGED,
            ))
        }
        Operands::None => Err(row_error(
            descriptor,
            RowViolation::ArityMismatch {
                family: descriptor.family,
                expected: 1,
                actual: 0,
            },
        )),
    }
}

/// The acting sequence of a call: advance past the instruction, push the
/// return address, jump.
fn call_sequence(descriptor: &InstructionDescriptor, target: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "registers.pc = registers.pc.wrapping_add({}u16);",
        descriptor.byte_length
    )];
    lines.extend(push_pc_lines());
    lines.push(format!("registers.pc = {target};"));
    lines
}

/// Lowers `CALL` rows: unconditional and condition-gated.
pub(super) fn lower_call(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    match &descriptor.operands {
        Operands::One(target) => {
            let read = resolver::read_operand(target, None)
                .map_err(|violation| row_error(descriptor, violation))?;
            Ok(assemble_routine(
                descriptor,
                call_sequence(descriptor, &read),
                RoutineTail::PC_MANAGED,
            ))
        }
        Operands::Two(condition, target) => {
            let predicate = condition_read(condition)
                .map_err(|violation| row_error(descriptor, violation))?;
            let read = resolver::read_operand(target, None)
                .map_err(|violation| row_error(descriptor, violation))?;
            let lines = conditional_paths(descriptor, predicate, call_sequence(descriptor, &read));
            Ok(assemble_routine(
                descriptor,
                lines,
                RoutineTail::BODY_MANAGED,
            ))
        }
        Operands::None => Err(row_error(
            descriptor,
            RowViolation::ArityMismatch {
                family: descriptor.family,
                expected: 1,
                actual: 0,
            },
        )),
    }
}

/// Lowers `RET` and `RETI` rows.
pub(super) fn lower_return(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    if descriptor.family == crate::family::Family::Reti {
        descriptor
            .operands
            .demand_none(descriptor.family)
            .map_err(|violation| row_error(descriptor, violation))?;
        let mut lines = vec!["registers.ime_flag = true;".to_string()];
        lines.extend(pop_pc_lines());
        return Ok(assemble_routine(descriptor, lines, RoutineTail::PC_MANAGED));
    }

    match &descriptor.operands {
        Operands::None => Ok(assemble_routine(
            descriptor,
            pop_pc_lines(),
            RoutineTail::PC_MANAGED,
        )),
        Operands::One(condition) => {
            let predicate = condition_read(condition)
                .map_err(|violation| row_error(descriptor, violation))?;
            let lines = conditional_paths(descriptor, predicate, pop_pc_lines());
            Ok(assemble_routine(
                descriptor,
                lines,
                RoutineTail::BODY_MANAGED,
            ))
        }
        Operands::Two(_, _) => Err(row_error(
            descriptor,
            RowViolation::ArityMismatch {
                family: descriptor.family,
                expected: 1,
                actual: 2,
            },
        )),
    }
}

/// Lowers `RST` rows: push the post-advance PC, jump to the fixed vector.
pub(super) fn lower_restart(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let target = descriptor
        .operands
        .demand_one(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let vector = target.literal.ok_or_else(|| {
        row_error(
            descriptor,
            RowViolation::MissingLiteral {
                name: target.name.clone(),
            },
        )
    })?;

    let mut lines = vec![format!(
        "registers.pc = registers.pc.wrapping_add({}u16);",
        descriptor.byte_length
    )];
    lines.extend(push_pc_lines());
    lines.push(format!("registers.pc = {vector:#04X}u16;"));

    Ok(assemble_routine(descriptor, lines, RoutineTail::PC_MANAGED))
}

#[cfg(test)]
mod tests {
    use super::{lower_absolute_jump, lower_call, lower_relative_jump, lower_restart, lower_return};
    use crate::family::Family;
    use crate::table::{
        FlagPolicy, InstructionDescriptor, OperandKind, OperandSpec, OperandWidth, Operands,
    };

    fn row(
        family: Family,
        operands: Operands,
        byte_length: u8,
        taken: u8,
        not_taken: u8,
    ) -> InstructionDescriptor {
        InstructionDescriptor {
            opcode: 0xC4,
            family,
            operands,
            byte_length,
            cycles_taken: taken,
            cycles_not_taken: not_taken,
            flags: FlagPolicy::UNAFFECTED,
        }
    }

    fn a16() -> OperandSpec {
        OperandSpec {
            kind: OperandKind::Addr16,
            is_address: false,
            width: OperandWidth::Two,
            name: "a16".to_string(),
            literal: None,
        }
    }

    fn r8() -> OperandSpec {
        OperandSpec {
            kind: OperandKind::PcRelInt8,
            is_address: false,
            width: OperandWidth::One,
            name: "r8".to_string(),
            literal: None,
        }
    }

    #[test]
    fn conditional_call_pushes_the_return_address_only_when_taken() {
        let descriptor = row(
            Family::Call,
            Operands::Two(OperandSpec::register("NZ"), a16()),
            3,
            24,
            12,
        );
        let routine = lower_call(&descriptor).unwrap();
        assert!(routine.definition.contains("if registers.get_non_zero_flag() {"));
        assert!(routine.definition.contains("return 24u16;"));
        assert!(routine.definition.contains("return 12u16;"));
        // The fall-through advance appears exactly once outside the branch.
        let advances = routine
            .definition
            .matches("registers.pc = registers.pc.wrapping_add(3u16);")
            .count();
        assert_eq!(advances, 2); // once inside the taken path, once outside
    }

    #[test]
    fn register_jump_reads_the_register_not_an_immediate() {
        let descriptor = row(
            Family::Jp,
            Operands::One(OperandSpec::register("HL")),
            1,
            4,
            4,
        );
        let routine = lower_absolute_jump(&descriptor).unwrap();
        assert!(routine.definition.contains("registers.pc = registers.get_hl();"));
        assert!(!routine.definition.contains("arguments"));
    }

    #[test]
    fn conditional_relative_jump_advances_before_testing() {
        let descriptor = row(
            Family::Jr,
            Operands::Two(OperandSpec::register("Z"), r8()),
            2,
            12,
            8,
        );
        let routine = lower_relative_jump(&descriptor).unwrap();
        let advance = routine
            .definition
            .find("registers.pc = registers.pc.wrapping_add(2u16);")
            .unwrap();
        let test = routine
            .definition
            .find("if !registers.get_zero_flag() {")
            .unwrap();
        assert!(advance < test);
        assert!(routine.definition.contains("return 8u16;"));
        assert!(routine.definition.contains("return 12u16;"));
    }

    #[test]
    fn return_pops_low_byte_first() {
        let descriptor = row(Family::Ret, Operands::None, 1, 16, 16);
        let routine = lower_return(&descriptor).unwrap();
        let low = routine
            .definition
            .find("let lower: u8 = memory.get(registers.sp);")
            .unwrap();
        let high = routine
            .definition
            .find("let upper: u8 = memory.get(registers.sp);")
            .unwrap();
        assert!(low < high);
        assert!(routine
            .definition
            .contains("registers.pc = ((upper as u16) << 8u16) | (lower as u16);"));
    }

    #[test]
    fn restart_jumps_to_the_fixed_vector() {
        let descriptor = row(
            Family::Rst,
            Operands::One(OperandSpec {
                kind: OperandKind::Constant,
                is_address: false,
                width: OperandWidth::One,
                name: "38H".to_string(),
                literal: Some(0x38),
            }),
            1,
            16,
            16,
        );
        let routine = lower_restart(&descriptor).unwrap();
        assert!(routine.definition.contains("registers.pc = 0x38u16;"));
        let advance = routine
            .definition
            .find("registers.pc = registers.pc.wrapping_add(1u16);")
            .unwrap();
        let push = routine.definition.find("memory.set(registers.sp,").unwrap();
        assert!(advance < push);
    }
}
