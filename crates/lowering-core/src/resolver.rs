//! Operand access lowering.
//!
//! Turns an [`OperandSpec`] into the Rust source text that reads or writes
//! that operand at the generated routine's runtime. Paired 16-bit registers
//! always go through their combined accessors; raw half-registers never
//! appear in resolver output. Address-mode operands resolve the inner value,
//! apply the optional uniform bias, then wrap the result in a memory access
//! of the transferred width.

use crate::error::RowViolation;
use crate::table::{OperandKind, OperandSpec, OperandWidth};

/// Address bias applied by the high-memory load families.
pub const HIGH_MEMORY_BIAS: &str = "0xFF00u16";

/// Register pairs that are only reachable through combined accessors.
const PAIRED_REGISTERS: &[&str] = &["AF", "BC", "DE", "HL"];

/// Single registers exposed as plain byte fields.
const BYTE_REGISTERS: &[&str] = &["A", "B", "C", "D", "E", "H", "L"];

/// Renders the expression reading a register's current value.
///
/// # Errors
///
/// Returns [`RowViolation::UnknownRegister`] for names outside the
/// architectural register set (flag conditions included).
pub fn register_read(name: &str) -> Result<String, RowViolation> {
    if PAIRED_REGISTERS.contains(&name) {
        return Ok(format!("registers.get_{}()", name.to_lowercase()));
    }
    if BYTE_REGISTERS.contains(&name) {
        return Ok(format!("registers.{}", name.to_lowercase()));
    }
    match name {
        "SP" => Ok("registers.sp".to_string()),
        "PC" => Ok("registers.pc".to_string()),
        _ => Err(RowViolation::UnknownRegister {
            name: name.to_string(),
        }),
    }
}

/// Renders the statement storing `value` into a register.
///
/// # Errors
///
/// Returns [`RowViolation::UnknownRegister`] for names outside the
/// architectural register set.
pub fn register_write(name: &str, value: &str) -> Result<String, RowViolation> {
    if PAIRED_REGISTERS.contains(&name) {
        return Ok(format!("registers.set_{}({value});", name.to_lowercase()));
    }
    if BYTE_REGISTERS.contains(&name) {
        return Ok(format!("registers.{} = {value};", name.to_lowercase()));
    }
    match name {
        "SP" => Ok(format!("registers.sp = {value};")),
        "PC" => Ok(format!("registers.pc = {value};")),
        _ => Err(RowViolation::UnknownRegister {
            name: name.to_string(),
        }),
    }
}

/// Renders a memory read of the given width.
#[must_use]
pub fn memory_read(address: &str, width: OperandWidth) -> String {
    match width {
        OperandWidth::One => format!("memory.get({address})"),
        OperandWidth::Two => format!("memory.get_16_bits({address})"),
    }
}

/// Renders a memory write of the given width.
#[must_use]
pub fn memory_write(address: &str, value: &str, width: OperandWidth) -> String {
    match width {
        OperandWidth::One => format!("memory.set({address}, {value});"),
        OperandWidth::Two => format!("memory.set_16_bits({address}, {value});"),
    }
}

/// Renders the operand's direct value, ignoring any address indirection.
fn direct_value(spec: &OperandSpec) -> Result<String, RowViolation> {
    match spec.kind {
        OperandKind::Register => register_read(&spec.name),
        OperandKind::Imm8 | OperandKind::UInt8 => Ok("arguments.uint8()".to_string()),
        OperandKind::Imm16 | OperandKind::Addr16 => Ok("arguments.uint16()".to_string()),
        OperandKind::PcRelInt8 => Ok("arguments.int8()".to_string()),
        OperandKind::Constant => {
            let literal = spec.literal.ok_or_else(|| RowViolation::MissingLiteral {
                name: spec.name.clone(),
            })?;
            Ok(format!("{literal}"))
        }
        OperandKind::Indication => Err(RowViolation::UnreadableOperand {
            name: spec.name.clone(),
        }),
    }
}

/// Renders the effective-address expression for an address-mode operand.
fn address_expr(spec: &OperandSpec, bias: Option<&str>) -> Result<String, RowViolation> {
    let inner = direct_value(spec)?;
    let widened = match spec.width {
        OperandWidth::Two => inner,
        OperandWidth::One => format!("({inner} as u16)"),
    };
    Ok(match bias {
        Some(offset) => format!("{widened} + {offset}"),
        None => widened,
    })
}

/// Renders the expression that reads an operand's current value.
///
/// `bias` applies only to address-mode operands and is added to the
/// effective address before the memory access.
///
/// # Errors
///
/// Returns a [`RowViolation`] when the operand carries no readable value.
pub fn read_operand(spec: &OperandSpec, bias: Option<&str>) -> Result<String, RowViolation> {
    if spec.is_address {
        let address = address_expr(spec, bias)?;
        return Ok(memory_read(&address, spec.value_width()));
    }
    direct_value(spec)
}

/// Renders the statement that stores `value` into an operand target.
///
/// Only registers and address-mode operands are writable; anything else is
/// a malformed table row and aborts generation.
///
/// # Errors
///
/// Returns [`RowViolation::NonWritableOperand`] for immediate, constant,
/// and marker operands.
pub fn write_operand(
    spec: &OperandSpec,
    value: &str,
    value_width: OperandWidth,
    bias: Option<&str>,
) -> Result<String, RowViolation> {
    if spec.is_address {
        let address = address_expr(spec, bias)?;
        return Ok(memory_write(&address, value, value_width));
    }
    if spec.kind == OperandKind::Register {
        return register_write(&spec.name, value);
    }
    Err(RowViolation::NonWritableOperand {
        name: spec.name.clone(),
        kind: spec.kind,
    })
}
