//! Singleton-family generators: no-op, latches, carry-flag operations,
//! accumulator complement, BCD adjust, and the trap stubs.

use crate::error::LowerError;
use crate::family::Family;
use crate::flags::flag_update;
use crate::lower::{assemble_routine, RoutineTail};
use crate::routine::GeneratedRoutine;
use crate::table::InstructionDescriptor;

/// Lowers `NOP`: only the PC advance and cycle return.
pub(super) fn lower_nop(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    Ok(assemble_routine(descriptor, Vec::new(), RoutineTail::STANDARD))
}

/// Lowers `HALT`: sets the halt latch.
pub(super) fn lower_halt(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    Ok(assemble_routine(
        descriptor,
        vec!["registers.halted = true;".to_string()],
        RoutineTail::STANDARD,
    ))
}

/// Lowers `STOP`: sets the stop latch.
pub(super) fn lower_stop(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    Ok(assemble_routine(
        descriptor,
        vec!["registers.stopped = true;".to_string()],
        RoutineTail::STANDARD,
    ))
}

/// Lowers `DI`/`EI`: writes the interrupt-master-enable latch.
pub(super) fn lower_interrupt_latch(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let enabled = descriptor.family == Family::Ei;
    Ok(assemble_routine(
        descriptor,
        vec![format!("registers.ime_flag = {enabled};")],
        RoutineTail::STANDARD,
    ))
}

/// Lowers `SCF`: a purely policy-driven flag write.
pub(super) fn lower_set_carry(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let lines = flag_update(descriptor.flags).into_iter().collect();
    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers `CCF`: complements the carry into the dynamic slot.
pub(super) fn lower_complement_carry(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let mut lines = vec!["let carry_flag: u8 = (!registers.get_carry_flag()) as u8;".to_string()];
    if let Some(update) = flag_update(descriptor.flags) {
        lines.push(update);
    }
    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers `CPL`: bitwise NOT of the accumulator.
pub(super) fn lower_complement_accumulator(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let mut lines = vec!["registers.a = !registers.a;".to_string()];
    if let Some(update) = flag_update(descriptor.flags) {
        lines.push(update);
    }
    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers `DAA`: the two mutually exclusive BCD correction branches, keyed
/// by the previous subtract flag and fed by the previous half-carry/carry.
pub(super) fn lower_decimal_adjust(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    let mut lines = vec![
        "let carry_flag: u8 = if registers.get_add_sub_flag() {".to_string(),
        "    let previous_carry: u8 = registers.get_carry_flag() as u8;".to_string(),
        "    registers.a = registers.a.wrapping_sub((0x60u8 * previous_carry)\
         .wrapping_add(0x6u8 * (registers.get_half_carry_flag() as u8)));"
            .to_string(),
        "    previous_carry".to_string(),
        "} else {".to_string(),
        "    let correction_carry: u8 = ((registers.a > 0x99u8) || registers.get_carry_flag()) as u8;"
            .to_string(),
        "    let low_adjust: u8 = 0x6u8 * ((((registers.a & 0xFu8) > 0xAu8) \
         || registers.get_half_carry_flag()) as u8);"
            .to_string(),
        "    registers.a = registers.a.wrapping_add((0x60u8 * correction_carry)\
         .wrapping_add(low_adjust));"
            .to_string(),
        "    correction_carry".to_string(),
        "};".to_string(),
        "let zero_flag: u8 = (registers.a == 0u8) as u8;".to_string(),
    ];
    if let Some(update) = flag_update(descriptor.flags) {
        lines.push(update);
    }
    Ok(assemble_routine(descriptor, lines, RoutineTail::STANDARD))
}

/// Lowers the prefix-byte row: dispatching it directly is a caller bug.
pub(super) fn lower_prefix(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    Ok(assemble_routine(
        descriptor,
        vec!["panic!(\"opcode 0xCB must be dispatched through the prefixed page\");".to_string()],
        RoutineTail::BODY_MANAGED,
    ))
}

/// Lowers unknown-opcode rows: the routine itself is the trap. No PC
/// update, no cycle return.
pub(super) fn lower_unknown(
    descriptor: &InstructionDescriptor,
) -> Result<GeneratedRoutine, LowerError> {
    Ok(assemble_routine(
        descriptor,
        vec![format!(
            "panic!(\"unknown opcode {:#04X}\");",
            descriptor.opcode
        )],
        RoutineTail::BODY_MANAGED,
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        lower_decimal_adjust, lower_interrupt_latch, lower_nop, lower_set_carry, lower_unknown,
    };
    use crate::family::Family;
    use crate::table::{FlagAction, FlagPolicy, InstructionDescriptor, Operands};

    fn row(family: Family, flags: FlagPolicy) -> InstructionDescriptor {
        InstructionDescriptor {
            opcode: 0x27,
            family,
            operands: Operands::None,
            byte_length: 1,
            cycles_taken: 4,
            cycles_not_taken: 4,
            flags,
        }
    }

    #[test]
    fn nop_only_advances_and_returns() {
        let routine = lower_nop(&row(Family::Nop, FlagPolicy::UNAFFECTED)).unwrap();
        let body: Vec<_> = routine
            .definition
            .lines()
            .filter(|line| line.starts_with("    "))
            .collect();
        assert_eq!(
            body,
            vec![
                "    registers.pc = registers.pc.wrapping_add(1u16);",
                "    return 4u16;"
            ]
        );
    }

    #[test]
    fn interrupt_latch_polarity_follows_the_family() {
        let enable = lower_interrupt_latch(&row(Family::Ei, FlagPolicy::UNAFFECTED)).unwrap();
        assert!(enable.definition.contains("registers.ime_flag = true;"));
        let disable = lower_interrupt_latch(&row(Family::Di, FlagPolicy::UNAFFECTED)).unwrap();
        assert!(disable.definition.contains("registers.ime_flag = false;"));
    }

    #[test]
    fn set_carry_is_a_single_policy_write() {
        let flags = FlagPolicy {
            zero: FlagAction::Unaffected,
            subtract: FlagAction::Reset,
            half_carry: FlagAction::Reset,
            carry: FlagAction::Set,
        };
        let routine = lower_set_carry(&row(Family::Scf, flags)).unwrap();
        assert!(routine
            .definition
            .contains("registers.flags = 0b00010000u8 | (registers.flags & 0b10000000u8);"));
    }

    #[test]
    fn decimal_adjust_branches_on_the_previous_subtract_flag() {
        let flags = FlagPolicy {
            zero: FlagAction::DataDependent,
            subtract: FlagAction::Unaffected,
            half_carry: FlagAction::Reset,
            carry: FlagAction::DataDependent,
        };
        let routine = lower_decimal_adjust(&row(Family::Daa, flags)).unwrap();
        assert!(routine.definition.contains("if registers.get_add_sub_flag() {"));
        assert!(routine.definition.contains("registers.a > 0x99u8"));
        assert!(routine.definition.contains("(registers.a & 0xFu8) > 0xAu8"));
        assert!(routine.definition.contains(
            "registers.flags = (zero_flag << 7u8) | (carry_flag << 4u8) \
             | (registers.flags & 0b01000000u8);"
        ));
    }

    #[test]
    fn unknown_routine_is_solely_a_trap() {
        let routine = lower_unknown(&row(Family::Unknown, FlagPolicy::UNAFFECTED)).unwrap();
        assert!(routine
            .definition
            .contains("panic!(\"unknown opcode 0x27\");"));
        assert!(!routine.definition.contains("registers.pc"));
        assert!(!routine.definition.contains("return"));
    }
}
