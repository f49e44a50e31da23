//! Instruction-semantics lowering core for the SM83 opcode table.
//!
//! One pure, ordered pass turns declarative opcode descriptors into Rust
//! routine text: operand fetch, result computation, status-flag update,
//! timing, and program-counter advance, bit-exact per family. Table
//! acquisition and module packaging live in the `tablegen` collaborator.

/// Opcode table data model.
pub mod table;
pub use table::{
    register_width, FlagAction, FlagPolicy, InstructionDescriptor, OperandKind, OperandSpec,
    OperandWidth, Operands, REGISTER_WIDTHS,
};

/// Closed instruction-family taxonomy.
pub mod family;
pub use family::Family;

/// Lowered routine records and dispatch tags.
pub mod routine;
pub use routine::{GeneratedRoutine, ImmediateShape};

/// Operand access lowering.
pub mod resolver;
pub use resolver::HIGH_MEMORY_BIAS;

/// Status-flag update synthesis.
pub mod flags;
pub use flags::{
    flag_update, synthesize_arithmetic, ArithmeticParts, ArithmeticRequest, Ceilings, Direction,
    CARRY_FLAG_OFFSET, HALF_CARRY_FLAG_OFFSET, SUBTRACT_FLAG_OFFSET, ZERO_FLAG_OFFSET,
};

/// Error taxonomy.
pub mod error;
pub use error::{LowerError, RowViolation};

/// Per-family routine generators.
pub mod lower;
pub use lower::{generator_for, Generator};

/// Emission driver.
pub mod emit;
pub use emit::{lower_table, CoverageReport, LoweredSet};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
