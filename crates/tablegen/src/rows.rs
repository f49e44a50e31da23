//! Flat-file codec for opcode table rows.
//!
//! The format is the 19-column CSV produced by the reference scraper: a
//! header line, then one row per opcode with two five-column operand groups
//! using `None` markers for absent fields. Reading and writing are lossless
//! so a table can be regenerated, diffed, and committed.

use thiserror::Error;

use lowering_core::{
    Family, FlagAction, FlagPolicy, InstructionDescriptor, OperandKind, OperandSpec, OperandWidth,
    Operands,
};

/// Column headers, in on-disk order.
pub const HEADER: &str = "Value,Instruction,\
First Argument Type,First Argument Is Address,First Argument Nb Bytes,\
First Argument Name,First Argument Value,\
Second Argument Type,Second Argument Is Address,Second Argument Nb Bytes,\
Second Argument Name,Second Argument Value,\
Length (bytes),Duration (Cycle),Duration no action (Cycle),\
Z flag,N flag,H flag,C flag";

const COLUMNS: usize = 19;
const ABSENT: &str = "None";

/// Byte-length corrections applied at load time.
///
/// The published reference lists these two opcodes as two bytes long; the
/// actual encoding is one byte. Kept as a literal override keyed by opcode
/// value since the scope of the upstream error is unconfirmed.
pub const BYTE_LENGTH_OVERRIDES: &[(u16, u8)] = &[(0xE2, 1), (0xF2, 1)];

/// Failures while reading the flat table file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowParseError {
    /// A row had the wrong number of columns.
    #[error("line {line}: expected {COLUMNS} columns, found {found}")]
    ColumnCount {
        /// 1-indexed line number.
        line: usize,
        /// Number of columns found.
        found: usize,
    },
    /// A field failed to parse.
    #[error("line {line}: invalid {what}: `{value}`")]
    InvalidField {
        /// 1-indexed line number.
        line: usize,
        /// Which field was malformed.
        what: &'static str,
        /// The offending text.
        value: String,
    },
}

fn kind_token(kind: OperandKind) -> &'static str {
    match kind {
        OperandKind::Register => "REGISTER",
        OperandKind::Imm8 => "IMMEDIATE_8_BITS",
        OperandKind::Imm16 => "IMMEDIATE_16_BITS",
        OperandKind::UInt8 => "UNSIGNED_8_BIT",
        OperandKind::Addr16 => "ADDRESS_16_BIT",
        OperandKind::PcRelInt8 => "PC_INCREMENT_8_BIT",
        OperandKind::Constant => "VALUE",
        OperandKind::Indication => "INDICATION",
    }
}

fn kind_from_token(token: &str) -> Option<OperandKind> {
    match token {
        "REGISTER" => Some(OperandKind::Register),
        "IMMEDIATE_8_BITS" => Some(OperandKind::Imm8),
        "IMMEDIATE_16_BITS" => Some(OperandKind::Imm16),
        "UNSIGNED_8_BIT" => Some(OperandKind::UInt8),
        "ADDRESS_16_BIT" => Some(OperandKind::Addr16),
        "PC_INCREMENT_8_BIT" => Some(OperandKind::PcRelInt8),
        "VALUE" => Some(OperandKind::Constant),
        "INDICATION" => Some(OperandKind::Indication),
        _ => None,
    }
}

fn flag_token(action: FlagAction) -> &'static str {
    match action {
        FlagAction::DataDependent => "CUSTOM",
        FlagAction::Set => "SET",
        FlagAction::Reset => "RESET",
        FlagAction::Unaffected => "NONE",
    }
}

fn flag_from_token(token: &str) -> Option<FlagAction> {
    match token {
        "CUSTOM" => Some(FlagAction::DataDependent),
        "SET" => Some(FlagAction::Set),
        "RESET" => Some(FlagAction::Reset),
        "NONE" => Some(FlagAction::Unaffected),
        _ => None,
    }
}

fn parse_flag(line: usize, what: &'static str, token: &str) -> Result<FlagAction, RowParseError> {
    flag_from_token(token).ok_or_else(|| RowParseError::InvalidField {
        line,
        what,
        value: token.to_string(),
    })
}

fn parse_number<T: std::str::FromStr>(
    line: usize,
    what: &'static str,
    token: &str,
) -> Result<T, RowParseError> {
    token.parse().map_err(|_| RowParseError::InvalidField {
        line,
        what,
        value: token.to_string(),
    })
}

fn parse_operand(line: usize, fields: &[&str]) -> Result<Option<OperandSpec>, RowParseError> {
    if fields[0] == ABSENT {
        return Ok(None);
    }
    let kind = kind_from_token(fields[0]).ok_or_else(|| RowParseError::InvalidField {
        line,
        what: "operand type",
        value: fields[0].to_string(),
    })?;
    let is_address = match fields[1] {
        "True" => true,
        "False" => false,
        other => {
            return Err(RowParseError::InvalidField {
                line,
                what: "operand address flag",
                value: other.to_string(),
            });
        }
    };
    let nb_bytes: u8 = parse_number(line, "operand width", fields[2])?;
    let width = OperandWidth::from_bytes(nb_bytes).ok_or_else(|| RowParseError::InvalidField {
        line,
        what: "operand width",
        value: fields[2].to_string(),
    })?;
    let literal = if fields[4] == ABSENT {
        None
    } else {
        Some(parse_number(line, "operand literal", fields[4])?)
    };

    Ok(Some(OperandSpec {
        kind,
        is_address,
        width,
        name: fields[3].to_string(),
        literal,
    }))
}

fn operand_fields(operand: Option<&OperandSpec>) -> [String; 5] {
    operand.map_or_else(
        || std::array::from_fn(|_| ABSENT.to_string()),
        |spec| {
            [
                kind_token(spec.kind).to_string(),
                if spec.is_address { "True" } else { "False" }.to_string(),
                spec.width.as_bytes().to_string(),
                spec.name.clone(),
                spec.literal
                    .map_or_else(|| ABSENT.to_string(), |value| value.to_string()),
            ]
        },
    )
}

fn parse_row(line: usize, text: &str) -> Result<InstructionDescriptor, RowParseError> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() != COLUMNS {
        return Err(RowParseError::ColumnCount {
            line,
            found: fields.len(),
        });
    }

    let opcode: u16 = parse_number(line, "opcode value", fields[0])?;
    if opcode > 0x1FF {
        return Err(RowParseError::InvalidField {
            line,
            what: "opcode value",
            value: fields[0].to_string(),
        });
    }
    let family = Family::from_table_token(fields[1]).ok_or_else(|| RowParseError::InvalidField {
        line,
        what: "instruction family",
        value: fields[1].to_string(),
    })?;

    let first = parse_operand(line, &fields[2..7])?;
    let second = parse_operand(line, &fields[7..12])?;
    let operands = match (first, second) {
        (None, None) => Operands::None,
        (Some(single), None) => Operands::One(single),
        (Some(first), Some(second)) => Operands::Two(first, second),
        (None, Some(_)) => {
            return Err(RowParseError::InvalidField {
                line,
                what: "operand order",
                value: text.to_string(),
            });
        }
    };

    let mut byte_length: u8 = parse_number(line, "byte length", fields[12])?;
    let cycles_taken: u8 = parse_number(line, "duration", fields[13])?;
    let cycles_not_taken: u8 = parse_number(line, "no-action duration", fields[14])?;

    if let Some(corrected) = BYTE_LENGTH_OVERRIDES
        .iter()
        .find_map(|(value, length)| (*value == opcode).then_some(*length))
    {
        byte_length = corrected;
    }

    Ok(InstructionDescriptor {
        opcode,
        family,
        operands,
        byte_length,
        cycles_taken,
        cycles_not_taken,
        flags: FlagPolicy {
            zero: parse_flag(line, "Z flag", fields[15])?,
            subtract: parse_flag(line, "N flag", fields[16])?,
            half_carry: parse_flag(line, "H flag", fields[17])?,
            carry: parse_flag(line, "C flag", fields[18])?,
        },
    })
}

/// Parses the whole table file, header line included.
///
/// # Errors
///
/// Returns the first [`RowParseError`] encountered, with its line number.
pub fn parse_rows(text: &str) -> Result<Vec<InstructionDescriptor>, RowParseError> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_row(index + 1, line))
        .collect()
}

/// Renders rows back to the on-disk format, header line included.
#[must_use]
pub fn render_rows(rows: &[InstructionDescriptor]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for row in rows {
        let first = operand_fields(row.operands.first());
        let second = operand_fields(row.operands.second());
        let fields = [
            row.opcode.to_string(),
            row.family.table_token().to_string(),
            first[0].clone(),
            first[1].clone(),
            first[2].clone(),
            first[3].clone(),
            first[4].clone(),
            second[0].clone(),
            second[1].clone(),
            second[2].clone(),
            second[3].clone(),
            second[4].clone(),
            row.byte_length.to_string(),
            row.cycles_taken.to_string(),
            row.cycles_not_taken.to_string(),
            flag_token(row.flags.zero).to_string(),
            flag_token(row.flags.subtract).to_string(),
            flag_token(row.flags.half_carry).to_string(),
            flag_token(row.flags.carry).to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}
