//! Declarative opcode table model: operand shapes, timing, and flag policy.
//!
//! Descriptors are loaded once from the table boundary and never mutated;
//! every lowering pass works on shared references. Generators that need to
//! reshape a row (compare reusing the subtract path, for example) derive a
//! transient copy with [`InstructionDescriptor::with_operands`].

use crate::error::RowViolation;
use crate::family::Family;

/// Operand shape categories carried by the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandKind {
    /// Named CPU register or flag condition.
    Register,
    /// 8-bit immediate following the opcode.
    Imm8,
    /// 16-bit immediate following the opcode.
    Imm16,
    /// 8-bit unsigned offset (high-memory addressing).
    UInt8,
    /// 16-bit absolute address.
    Addr16,
    /// 8-bit signed program-counter displacement.
    PcRelInt8,
    /// Literal constant baked into the instruction encoding.
    Constant,
    /// Marker operand with no value (the prefix byte).
    Indication,
}

/// Operand value width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandWidth {
    /// Single byte.
    One,
    /// Two bytes.
    Two,
}

impl OperandWidth {
    /// Converts a byte count from the table boundary into a width.
    #[must_use]
    pub const fn from_bytes(bytes: u8) -> Option<Self> {
        match bytes {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// Returns the width as a byte count.
    #[must_use]
    pub const fn as_bytes(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

/// Fixed register-width table. A register operand's width must match this
/// table exactly; condition names decode as one-byte registers.
pub const REGISTER_WIDTHS: &[(&str, OperandWidth)] = &[
    ("AF", OperandWidth::Two),
    ("BC", OperandWidth::Two),
    ("DE", OperandWidth::Two),
    ("HL", OperandWidth::Two),
    ("SP", OperandWidth::Two),
    ("PC", OperandWidth::Two),
    ("A", OperandWidth::One),
    ("B", OperandWidth::One),
    ("C", OperandWidth::One),
    ("D", OperandWidth::One),
    ("E", OperandWidth::One),
    ("H", OperandWidth::One),
    ("L", OperandWidth::One),
    ("NZ", OperandWidth::One),
    ("Z", OperandWidth::One),
    ("NC", OperandWidth::One),
];

/// Looks up the architectural width of a named register.
#[must_use]
pub fn register_width(name: &str) -> Option<OperandWidth> {
    REGISTER_WIDTHS
        .iter()
        .find_map(|(entry, width)| (*entry == name).then_some(*width))
}

/// One source/destination descriptor of an instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct OperandSpec {
    /// Shape category.
    pub kind: OperandKind,
    /// Whether the operand value is dereferenced as a memory address.
    pub is_address: bool,
    /// Width of the operand value itself.
    pub width: OperandWidth,
    /// Display name from the reference table (`A`, `d8`, `a16`, …).
    pub name: String,
    /// Literal value; present exactly when `kind` is [`OperandKind::Constant`].
    pub literal: Option<u16>,
}

impl OperandSpec {
    /// Builds a direct register operand with its architectural width.
    ///
    /// Used for implicit operands (the accumulator in single-operand
    /// arithmetic, the four unprefixed rotates).
    #[must_use]
    pub fn register(name: &str) -> Self {
        Self {
            kind: OperandKind::Register,
            is_address: false,
            width: register_width(name).unwrap_or(OperandWidth::One),
            name: name.to_string(),
            literal: None,
        }
    }

    /// Width of the value that actually moves through the datapath.
    ///
    /// A two-byte operand used as an address still transfers a single byte.
    #[must_use]
    pub const fn value_width(&self) -> OperandWidth {
        if self.is_address {
            OperandWidth::One
        } else {
            self.width
        }
    }

    /// Whether this operand is a directly-accessed 16-bit register.
    ///
    /// Drives carry-ceiling selection: memory-indirect and immediate
    /// operands never widen the ceiling.
    #[must_use]
    pub const fn is_live_wide_register(&self) -> bool {
        matches!(self.kind, OperandKind::Register)
            && !self.is_address
            && matches!(self.width, OperandWidth::Two)
    }

    /// Renders the operand the way the reference table prints it.
    #[must_use]
    pub fn mnemonic_fragment(&self) -> String {
        if self.is_address {
            format!("({})", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Checks the row-level invariants for this operand.
    ///
    /// # Errors
    ///
    /// Returns the violation that makes this operand unusable: a literal
    /// missing or misplaced, or a register outside the width table.
    pub fn validate(&self) -> Result<(), RowViolation> {
        match (self.kind, self.literal) {
            (OperandKind::Constant, None) => {
                return Err(RowViolation::MissingLiteral {
                    name: self.name.clone(),
                });
            }
            (OperandKind::Constant, Some(_)) => {}
            (_, Some(_)) => {
                return Err(RowViolation::UnexpectedLiteral {
                    name: self.name.clone(),
                });
            }
            (_, None) => {}
        }

        if self.kind == OperandKind::Register {
            let expected = register_width(&self.name).ok_or_else(|| {
                RowViolation::UnknownRegister {
                    name: self.name.clone(),
                }
            })?;
            if expected != self.width {
                return Err(RowViolation::RegisterWidthMismatch {
                    name: self.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Operand arity as a tagged variant.
///
/// Generators demand the exact arity their family requires; a mismatch is a
/// malformed row, never a silently-ignored slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operands {
    /// No operands.
    #[default]
    None,
    /// A single operand.
    One(OperandSpec),
    /// Destination-first operand pair.
    Two(OperandSpec, OperandSpec),
}

impl Operands {
    /// Returns the first operand, if any.
    #[must_use]
    pub const fn first(&self) -> Option<&OperandSpec> {
        match self {
            Self::None => None,
            Self::One(first) | Self::Two(first, _) => Some(first),
        }
    }

    /// Returns the second operand, if any.
    #[must_use]
    pub const fn second(&self) -> Option<&OperandSpec> {
        match self {
            Self::None | Self::One(_) => None,
            Self::Two(_, second) => Some(second),
        }
    }

    /// Number of operands present.
    #[must_use]
    pub const fn arity(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::One(_) => 1,
            Self::Two(_, _) => 2,
        }
    }

    /// Demands a zero-operand row.
    ///
    /// # Errors
    ///
    /// Returns [`RowViolation::ArityMismatch`] when operands are present.
    pub fn demand_none(&self, family: Family) -> Result<(), RowViolation> {
        match self {
            Self::None => Ok(()),
            _ => Err(self.arity_mismatch(family, 0)),
        }
    }

    /// Demands exactly one operand.
    ///
    /// # Errors
    ///
    /// Returns [`RowViolation::ArityMismatch`] for any other arity.
    pub fn demand_one(&self, family: Family) -> Result<&OperandSpec, RowViolation> {
        match self {
            Self::One(first) => Ok(first),
            _ => Err(self.arity_mismatch(family, 1)),
        }
    }

    /// Demands exactly two operands.
    ///
    /// # Errors
    ///
    /// Returns [`RowViolation::ArityMismatch`] for any other arity.
    pub fn demand_two(&self, family: Family) -> Result<(&OperandSpec, &OperandSpec), RowViolation> {
        match self {
            Self::Two(first, second) => Ok((first, second)),
            _ => Err(self.arity_mismatch(family, 2)),
        }
    }

    fn arity_mismatch(&self, family: Family, expected: u8) -> RowViolation {
        RowViolation::ArityMismatch {
            family,
            expected,
            actual: self.arity(),
        }
    }
}

/// Per-flag update policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FlagAction {
    /// Flag is forced to 1.
    Set,
    /// Flag is forced to 0.
    Reset,
    /// Flag keeps its previous value.
    Unaffected,
    /// Flag is computed from the operands/result.
    DataDependent,
}

/// Update policy for the four status bits, in fixed table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FlagPolicy {
    /// Zero flag (bit 7).
    pub zero: FlagAction,
    /// Subtract flag (bit 6).
    pub subtract: FlagAction,
    /// Half-carry flag (bit 5).
    pub half_carry: FlagAction,
    /// Carry flag (bit 4).
    pub carry: FlagAction,
}

impl FlagPolicy {
    /// Policy that leaves every flag untouched.
    pub const UNAFFECTED: Self = Self {
        zero: FlagAction::Unaffected,
        subtract: FlagAction::Unaffected,
        half_carry: FlagAction::Unaffected,
        carry: FlagAction::Unaffected,
    };

    /// Whether no flag is touched at all.
    #[must_use]
    pub fn is_all_unaffected(&self) -> bool {
        [self.zero, self.subtract, self.half_carry, self.carry]
            .iter()
            .all(|action| *action == FlagAction::Unaffected)
    }
}

/// One immutable row of the opcode table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InstructionDescriptor {
    /// Numeric opcode: `0x000..=0x0FF` base page, `0x100..=0x1FF` prefixed page.
    pub opcode: u16,
    /// Instruction family.
    pub family: Family,
    /// Operand list.
    pub operands: Operands,
    /// Encoded instruction length in bytes.
    pub byte_length: u8,
    /// Cycle cost when the instruction acts (or always, if unconditional).
    pub cycles_taken: u8,
    /// Cycle cost when a conditional instruction falls through.
    pub cycles_not_taken: u8,
    /// Status-flag update policy.
    pub flags: FlagPolicy,
}

impl InstructionDescriptor {
    /// Renders the human-readable mnemonic used in routine declarations.
    #[must_use]
    pub fn mnemonic(&self) -> String {
        let mut text = format!("{:#04X} {}", self.opcode, self.family.table_token());
        if let Some(first) = self.operands.first() {
            text.push(' ');
            text.push_str(&first.mnemonic_fragment());
        }
        if let Some(second) = self.operands.second() {
            text.push_str(", ");
            text.push_str(&second.mnemonic_fragment());
        }
        text
    }

    /// Derives a transient copy of this row with replacement operands.
    ///
    /// Normalization path for generators that reuse another family's shape;
    /// the shared table row itself is never mutated.
    #[must_use]
    pub fn with_operands(&self, operands: Operands) -> Self {
        Self {
            operands,
            ..self.clone()
        }
    }

    /// Checks the row-level invariants shared by every family.
    ///
    /// # Errors
    ///
    /// Returns the first violation found in the row header or its operands.
    pub fn validate(&self) -> Result<(), RowViolation> {
        if self.byte_length == 0 {
            return Err(RowViolation::ZeroByteLength);
        }
        if self.cycles_not_taken > self.cycles_taken {
            return Err(RowViolation::InvertedCycleCounts {
                taken: self.cycles_taken,
                not_taken: self.cycles_not_taken,
            });
        }
        if let Some(first) = self.operands.first() {
            first.validate()?;
        }
        if let Some(second) = self.operands.second() {
            second.validate()?;
        }
        Ok(())
    }
}
