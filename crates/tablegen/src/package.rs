//! Rust module packaging for a lowered routine set.
//!
//! Wraps the core's routines in a self-contained module: a fixed prelude
//! (the `Arguments` wrapper, the immediate-shape enum, and the routine type
//! alias), every definition in table order, then the two parallel
//! opcode-indexed dispatch tables. Output is byte-stable so the generated
//! file can be committed and diffed.

use lowering_core::LoweredSet;

/// Module header and the fixed target-environment contract.
///
/// The generated module expects its host crate to provide `Registers`
/// (byte fields `a b c d e h l flags`, word fields `sp pc`, the paired
/// accessors `get_bc`/`set_bc` and friends, the flag getters, and the
/// `halted`/`stopped`/`ime_flag` latches) and a `Memory` trait with
/// `get`/`set`/`get_16_bits`/`set_16_bits`.
const PRELUDE: &str = "\
//! Generated SM83 instruction routines. Do not edit by hand; regenerate
//! with `sm83-tablegen build`.

use crate::memory::Memory;
use crate::memory::registers::Registers;

/// Raw immediate bits fetched by the dispatcher for the current opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arguments(u16);

impl Arguments {
    /// Wraps the raw immediate bits.
    pub fn new(bits: u16) -> Self {
        Self(bits)
    }

    /// The 16-bit immediate.
    pub fn uint16(self) -> u16 {
        self.0
    }

    /// The unsigned 8-bit immediate.
    pub fn uint8(self) -> u8 {
        self.0 as u8
    }

    /// The signed 8-bit immediate.
    pub fn int8(self) -> i8 {
        self.0 as u8 as i8
    }
}

/// Immediate shape each routine expects alongside its opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    /// No immediate bytes follow the opcode.
    None,
    /// One signed byte.
    Int8,
    /// One unsigned byte.
    Uint8,
    /// Two bytes, low first.
    Uint16,
}

/// Instruction routine: returns the consumed machine cycles.
pub type InstructionFunction = fn(Arguments, &mut Registers, &mut dyn Memory) -> u16;
";

/// Renders the complete generated module.
#[must_use]
pub fn render_module(set: &LoweredSet) -> String {
    let mut out = String::from(PRELUDE);
    out.push('\n');

    for routine in &set.routines {
        out.push_str(&routine.definition);
        out.push_str("\n\n");
    }

    let count = set.routines.len();
    out.push_str(&format!(
        "/// Routine for each table row, in table order.\n\
         pub const INSTRUCTION_FUNCTIONS: [InstructionFunction; {count}] = [\n"
    ));
    for reference in set.routine_references() {
        out.push_str("    ");
        out.push_str(reference);
        out.push_str(",\n");
    }
    out.push_str("];\n\n");

    out.push_str(&format!(
        "/// Immediate shape for each table row, in table order.\n\
         pub const INSTRUCTION_ARGUMENT_TYPES: [ArgumentType; {count}] = [\n"
    ));
    for shape in set.immediate_shapes() {
        out.push_str("    ArgumentType::");
        out.push_str(shape.variant_name());
        out.push_str(",\n");
    }
    out.push_str("];\n");

    out
}

/// Renders the one-line declaration listing (the human-readable index of
/// every generated routine).
#[must_use]
pub fn render_listing(set: &LoweredSet) -> String {
    let mut out = String::new();
    for routine in &set.routines {
        out.push_str(&routine.declaration);
        out.push('\n');
    }
    out
}
