//! Status-flag update synthesis.
//!
//! Add/subtract-style generators hand this module their resolved operand
//! initializers; it emits the widened intermediate computations for every
//! data-dependent flag and the final flag-register merge. All arithmetic in
//! the generated text runs in `i32` so that carries and borrows survive the
//! ceiling comparisons intact.

use crate::table::{FlagAction, FlagPolicy, InstructionDescriptor, OperandSpec, Operands};

/// Bit position of the zero flag in the flag register.
pub const ZERO_FLAG_OFFSET: u8 = 7;
/// Bit position of the subtract flag in the flag register.
pub const SUBTRACT_FLAG_OFFSET: u8 = 6;
/// Bit position of the half-carry flag in the flag register.
pub const HALF_CARRY_FLAG_OFFSET: u8 = 5;
/// Bit position of the carry flag in the flag register.
pub const CARRY_FLAG_OFFSET: u8 = 4;

/// Arithmetic direction for flag computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Addition: carries when exceeding the ceiling.
    Add,
    /// Subtraction: borrows when going negative.
    Subtract,
}

impl Direction {
    const fn sign(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
        }
    }
}

/// Carry and half-carry ceilings chosen from the operand widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ceilings {
    /// Full-result ceiling (`0xFF` or `0xFFFF`).
    pub carry: u32,
    /// Low-half ceiling (`0xF` or `0xFFF`).
    pub half: u32,
}

impl Ceilings {
    /// Selects ceilings for a row: 16-bit ceilings when either operand is a
    /// directly-accessed 16-bit register, 8-bit ceilings otherwise.
    #[must_use]
    pub fn for_operands(operands: &Operands) -> Self {
        let wide = operands.first().is_some_and(OperandSpec::is_live_wide_register)
            || operands.second().is_some_and(OperandSpec::is_live_wide_register);
        if wide {
            Self {
                carry: 0xFFFF,
                half: 0xFFF,
            }
        } else {
            Self { carry: 0xFF, half: 0xF }
        }
    }

    /// Whether these are the 16-bit ceilings.
    #[must_use]
    pub const fn is_wide(self) -> bool {
        self.carry == 0xFFFF
    }

    fn carry_literal(self) -> String {
        format!("{:#X}i32", self.carry)
    }

    fn half_literal(self) -> String {
        format!("{:#X}i32", self.half)
    }
}

/// Synthesized add/subtract text: intermediate statements plus the masked
/// result expression the caller stores through the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArithmeticParts {
    /// Statements computing the result and every data-dependent flag,
    /// ending with the flag-register merge when the policy calls for one.
    pub statements: Vec<String>,
    /// Result truncated to the operation width, cast for storage.
    pub result_expr: String,
}

/// Inputs for one synthesized add/subtract.
#[derive(Debug, Clone, Copy)]
pub struct ArithmeticRequest<'a> {
    /// Row being lowered; supplies the flag policy and ceiling operands.
    pub descriptor: &'a InstructionDescriptor,
    /// Arithmetic direction.
    pub direction: Direction,
    /// `i32` initializer text for the left operand.
    pub first_init: &'a str,
    /// `i32` initializer text for the right operand.
    pub second_init: &'a str,
    /// Optional third addend/subtrahend (incoming carry), `i32` initializer.
    pub extra_init: Option<&'a str>,
    /// Whether the extra term participates in the half-carry intermediate.
    pub extra_in_half: bool,
}

/// Emits the intermediate computations for an add/subtract row.
#[must_use]
pub fn synthesize_arithmetic(request: &ArithmeticRequest<'_>) -> ArithmeticParts {
    let policy = request.descriptor.flags;
    let ceilings = Ceilings::for_operands(&request.descriptor.operands);
    let sign = request.direction.sign();
    let carry_lit = ceilings.carry_literal();
    let half_lit = ceilings.half_literal();

    let mut statements = vec![
        format!("let lhs: i32 = {};", request.first_init),
        format!("let rhs: i32 = {};", request.second_init),
    ];
    let extra_term = if let Some(extra) = request.extra_init {
        statements.push(format!("let extra: i32 = {extra};"));
        format!(" {sign} extra")
    } else {
        String::new()
    };
    statements.push(format!("let result: i32 = lhs {sign} rhs{extra_term};"));

    if policy.zero == FlagAction::DataDependent {
        statements.push(format!(
            "let zero_flag: u8 = ((result & {carry_lit}) == 0i32) as u8;"
        ));
    }
    if policy.half_carry == FlagAction::DataDependent {
        let half_extra = if request.extra_in_half {
            extra_term.as_str()
        } else {
            ""
        };
        statements.push(format!(
            "let half_value: i32 = (lhs & {half_lit}) {sign} (rhs & {half_lit}){half_extra};"
        ));
        statements.push(match request.direction {
            Direction::Add => format!("let half_flag: u8 = (half_value > {half_lit}) as u8;"),
            Direction::Subtract => "let half_flag: u8 = (half_value < 0i32) as u8;".to_string(),
        });
    }
    if policy.carry == FlagAction::DataDependent {
        statements.push(match request.direction {
            Direction::Add => format!("let carry_flag: u8 = (result > {carry_lit}) as u8;"),
            Direction::Subtract => "let carry_flag: u8 = (result < 0i32) as u8;".to_string(),
        });
    }
    if let Some(update) = flag_update(policy) {
        statements.push(update);
    }

    let result_cast = if ceilings.is_wide() { "u16" } else { "u8" };
    ArithmeticParts {
        statements,
        result_expr: format!("(result & {carry_lit}) as {result_cast}"),
    }
}

/// Renders the final flag-register update for a policy.
///
/// Merges the static set/keep masks with the dynamically computed bits
/// (`zero_flag`, `half_flag`, `carry_flag` intermediates, which the caller
/// must have emitted for every data-dependent flag). Returns `None` when
/// every flag is unaffected: such rows carry no flag statement at all.
#[must_use]
pub fn flag_update(policy: FlagPolicy) -> Option<String> {
    if policy.is_all_unaffected() {
        return None;
    }

    let actions = [
        (policy.zero, ZERO_FLAG_OFFSET, "zero_flag"),
        (policy.subtract, SUBTRACT_FLAG_OFFSET, "subtract_flag"),
        (policy.half_carry, HALF_CARRY_FLAG_OFFSET, "half_flag"),
        (policy.carry, CARRY_FLAG_OFFSET, "carry_flag"),
    ];

    let mut set_mask = 0u8;
    let mut keep_mask = 0u8;
    let mut terms = Vec::new();
    for (action, offset, variable) in actions {
        match action {
            FlagAction::Set => set_mask |= 1 << offset,
            FlagAction::Unaffected => keep_mask |= 1 << offset,
            FlagAction::DataDependent => terms.push(format!("({variable} << {offset}u8)")),
            FlagAction::Reset => {}
        }
    }
    if set_mask != 0 {
        terms.push(format!("{set_mask:#010b}u8"));
    }
    if keep_mask != 0 {
        terms.push(format!("(registers.flags & {keep_mask:#010b}u8)"));
    }

    if terms.is_empty() {
        return Some("registers.flags = 0u8;".to_string());
    }
    Some(format!("registers.flags = {};", terms.join(" | ")))
}
