//! Lowered routine records and the immediate-shape dispatch tag.

use crate::table::{OperandKind, Operands};

/// Immediate-value shape the dispatcher must supply alongside an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ImmediateShape {
    /// No immediate follows the opcode.
    None,
    /// Signed 8-bit displacement.
    Int8,
    /// Unsigned 8-bit value.
    Uint8,
    /// 16-bit value.
    Uint16,
}

impl ImmediateShape {
    /// Shape contributed by a single operand kind.
    #[must_use]
    pub const fn from_kind(kind: OperandKind) -> Self {
        match kind {
            OperandKind::Imm8 | OperandKind::UInt8 => Self::Uint8,
            OperandKind::Imm16 | OperandKind::Addr16 => Self::Uint16,
            OperandKind::PcRelInt8 => Self::Int8,
            OperandKind::Register | OperandKind::Constant | OperandKind::Indication => Self::None,
        }
    }

    /// Shape for a whole row: the first operand's shape, falling back to the
    /// second when the first contributes none.
    #[must_use]
    pub fn from_operands(operands: &Operands) -> Self {
        let first = operands
            .first()
            .map_or(Self::None, |spec| Self::from_kind(spec.kind));
        if first != Self::None {
            return first;
        }
        operands
            .second()
            .map_or(Self::None, |spec| Self::from_kind(spec.kind))
    }

    /// Variant name as rendered into the generated dispatch table.
    #[must_use]
    pub const fn variant_name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Int8 => "Int8",
            Self::Uint8 => "Uint8",
            Self::Uint16 => "Uint16",
        }
    }
}

/// One lowered opcode routine.
///
/// Produced exactly once per table row and never edited afterward; the
/// emission driver is the only consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRoutine {
    /// Routine identifier, `<family>_<opcode:03x>`.
    pub identifier: String,
    /// One-line declaration: signature plus mnemonic comment.
    pub declaration: String,
    /// Full routine definition, doc comment included.
    pub definition: String,
    /// Immediate shape the dispatcher must supply for this opcode.
    pub immediate_shape: ImmediateShape,
}
