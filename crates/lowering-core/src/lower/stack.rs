//! Stack push/pop generators for 16-bit register pairs.
//!
//! Byte order is fixed: push decrements SP before each write and stores the
//! high half first; pop reads the low half first, incrementing after each
//! read, so the pair reconstructs as `(high << 8) | low`.

use crate::error::{LowerError, RowViolation};
use crate::lower::{assemble_routine, row_error, RoutineTail};
use crate::routine::GeneratedRoutine;
use crate::table::InstructionDescriptor;

/// Half-register access paths for the pushable pairs, `(lower, upper)`.
fn pair_halves(name: &str) -> Result<(&'static str, &'static str), RowViolation> {
    match name {
        "AF" => Ok(("registers.flags", "registers.a")),
        "BC" => Ok(("registers.c", "registers.b")),
        "DE" => Ok(("registers.e", "registers.d")),
        "HL" => Ok(("registers.l", "registers.h")),
        _ => Err(RowViolation::NotARegisterPair {
            name: name.to_string(),
        }),
    }
}

/// Lowers `PUSH` rows.
pub(super) fn lower_push(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let pair = descriptor
        .operands
        .demand_one(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let (lower, upper) =
        pair_halves(&pair.name).map_err(|violation| row_error(descriptor, violation))?;

    let lines = vec![
        "registers.sp = registers.sp.wrapping_sub(1u16);".to_string(),
        format!("memory.set(registers.sp, {upper});"),
        "registers.sp = registers.sp.wrapping_sub(1u16);".to_string(),
        format!("memory.set(registers.sp, {lower});"),
    ];

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers `POP` rows.
pub(super) fn lower_pop(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let pair = descriptor
        .operands
        .demand_one(descriptor.family)
        .map_err(|violation| row_error(descriptor, violation))?;
    let (lower, upper) =
        pair_halves(&pair.name).map_err(|violation| row_error(descriptor, violation))?;

    let lines = vec![
        format!("{lower} = memory.get(registers.sp);"),
        "registers.sp = registers.sp.wrapping_add(1u16);".to_string(),
        format!("{upper} = memory.get(registers.sp);"),
        "registers.sp = registers.sp.wrapping_add(1u16);".to_string(),
    ];

    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

#[cfg(test)]
mod tests {
    use super::{lower_pop, lower_push};
    use crate::error::{LowerError, RowViolation};
    use crate::family::Family;
    use crate::table::{FlagPolicy, InstructionDescriptor, OperandSpec, Operands};

    fn row(family: Family, pair: &str) -> InstructionDescriptor {
        InstructionDescriptor {
            opcode: 0xE5,
            family,
            operands: Operands::One(OperandSpec::register(pair)),
            byte_length: 1,
            cycles_taken: 16,
            cycles_not_taken: 16,
            flags: FlagPolicy::UNAFFECTED,
        }
    }

    #[test]
    fn push_writes_high_half_first_with_predecrement() {
        let routine = lower_push(&row(Family::Push, "HL")).unwrap();
        let high = routine
            .definition
            .find("memory.set(registers.sp, registers.h);")
            .unwrap();
        let low = routine
            .definition
            .find("memory.set(registers.sp, registers.l);")
            .unwrap();
        assert!(high < low);
        assert_eq!(
            routine
                .definition
                .matches("registers.sp = registers.sp.wrapping_sub(1u16);")
                .count(),
            2
        );
    }

    #[test]
    fn pop_assigns_low_half_first_with_postincrement() {
        let routine = lower_pop(&row(Family::Pop, "BC")).unwrap();
        let low = routine
            .definition
            .find("registers.c = memory.get(registers.sp);")
            .unwrap();
        let high = routine
            .definition
            .find("registers.b = memory.get(registers.sp);")
            .unwrap();
        assert!(low < high);
        assert_eq!(
            routine
                .definition
                .matches("registers.sp = registers.sp.wrapping_add(1u16);")
                .count(),
            2
        );
    }

    #[test]
    fn stack_pointer_itself_is_not_pushable() {
        let result = lower_push(&row(Family::Push, "SP"));
        assert_eq!(
            result,
            Err(LowerError::MalformedRow {
                opcode: 0xE5,
                violation: RowViolation::NotARegisterPair {
                    name: "SP".to_string()
                },
            })
        );
    }
}
