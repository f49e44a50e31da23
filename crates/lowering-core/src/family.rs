//! Closed instruction-family taxonomy.
//!
//! Every opcode row names exactly one family; lowering dispatches over this
//! enum with an exhaustive match, so adding a family without a generator is
//! a compile-time hole rather than a runtime surprise.

/// Instruction families across both opcode pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Family {
    Unknown,
    Nop,
    Ld,
    Ldi,
    Ldd,
    Ldh,
    Ldc,
    Ldhl,
    Inc,
    Dec,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Or,
    Xor,
    Cp,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit,
    Res,
    Set,
    Jr,
    Jp,
    Call,
    Ret,
    Reti,
    Rst,
    Push,
    Pop,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Halt,
    Stop,
    Di,
    Ei,
    Prefix,
}

/// Family token table: the uppercase tag used by the flat table format and
/// the lowercase stem used in generated routine identifiers.
const FAMILY_TOKENS: &[(Family, &str, &str)] = &[
    (Family::Unknown, "UNKNOWN", "unknown"),
    (Family::Nop, "NOP", "nop"),
    (Family::Ld, "LD", "ld"),
    (Family::Ldi, "LDI", "ldi"),
    (Family::Ldd, "LDD", "ldd"),
    (Family::Ldh, "LDH", "ldh"),
    (Family::Ldc, "LDC", "ldc"),
    (Family::Ldhl, "LDHL", "ldhl"),
    (Family::Inc, "INC", "inc"),
    (Family::Dec, "DEC", "dec"),
    (Family::Add, "ADD", "add"),
    (Family::Adc, "ADC", "adc"),
    (Family::Sub, "SUB", "sub"),
    (Family::Sbc, "SBC", "sbc"),
    (Family::And, "AND", "and"),
    (Family::Or, "OR", "or"),
    (Family::Xor, "XOR", "xor"),
    (Family::Cp, "CP", "cp"),
    (Family::Rlca, "RLCA", "rlca"),
    (Family::Rrca, "RRCA", "rrca"),
    (Family::Rla, "RLA", "rla"),
    (Family::Rra, "RRA", "rra"),
    (Family::Rlc, "RLC", "rlc"),
    (Family::Rrc, "RRC", "rrc"),
    (Family::Rl, "RL", "rl"),
    (Family::Rr, "RR", "rr"),
    (Family::Sla, "SLA", "sla"),
    (Family::Sra, "SRA", "sra"),
    (Family::Swap, "SWAP", "swap"),
    (Family::Srl, "SRL", "srl"),
    (Family::Bit, "BIT", "bit"),
    (Family::Res, "RES", "res"),
    (Family::Set, "SET", "set"),
    (Family::Jr, "JR", "jr"),
    (Family::Jp, "JP", "jp"),
    (Family::Call, "CALL", "call"),
    (Family::Ret, "RET", "ret"),
    (Family::Reti, "RETI", "reti"),
    (Family::Rst, "RST", "rst"),
    (Family::Push, "PUSH", "push"),
    (Family::Pop, "POP", "pop"),
    (Family::Daa, "DAA", "daa"),
    (Family::Cpl, "CPL", "cpl"),
    (Family::Scf, "SCF", "scf"),
    (Family::Ccf, "CCF", "ccf"),
    (Family::Halt, "HALT", "halt"),
    (Family::Stop, "STOP", "stop"),
    (Family::Di, "DI", "di"),
    (Family::Ei, "EI", "ei"),
    (Family::Prefix, "PREFIX", "prefix"),
];

impl Family {
    /// Parses the uppercase family tag used by the flat table format.
    ///
    /// `LDSpecialC`, the original reference's name for the `LD A,(C)` pair,
    /// is accepted as an alias for [`Family::Ldc`].
    #[must_use]
    pub fn from_table_token(token: &str) -> Option<Self> {
        if token == "LDSpecialC" {
            return Some(Self::Ldc);
        }
        FAMILY_TOKENS
            .iter()
            .find_map(|(family, tag, _)| (*tag == token).then_some(*family))
    }

    /// Uppercase tag as printed by the flat table format and mnemonics.
    #[must_use]
    pub fn table_token(self) -> &'static str {
        FAMILY_TOKENS
            .iter()
            .find_map(|(family, tag, _)| (*family == self).then_some(*tag))
            .unwrap_or("UNKNOWN")
    }

    /// Lowercase stem used in generated routine identifiers.
    #[must_use]
    pub fn identifier_stem(self) -> &'static str {
        FAMILY_TOKENS
            .iter()
            .find_map(|(family, _, stem)| (*family == self).then_some(*stem))
            .unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{Family, FAMILY_TOKENS};

    #[test]
    fn token_table_has_unique_entries() {
        let families: HashSet<_> = FAMILY_TOKENS.iter().map(|(family, _, _)| *family).collect();
        assert_eq!(families.len(), FAMILY_TOKENS.len());
        let tags: HashSet<_> = FAMILY_TOKENS.iter().map(|(_, tag, _)| *tag).collect();
        assert_eq!(tags.len(), FAMILY_TOKENS.len());
    }

    #[test]
    fn every_token_roundtrips() {
        for (family, tag, stem) in FAMILY_TOKENS {
            assert_eq!(Family::from_table_token(tag), Some(*family));
            assert_eq!(family.table_token(), *tag);
            assert_eq!(family.identifier_stem(), *stem);
        }
    }

    #[test]
    fn original_reference_alias_is_accepted() {
        assert_eq!(Family::from_table_token("LDSpecialC"), Some(Family::Ldc));
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert_eq!(Family::from_table_token("MUL"), None);
        assert_eq!(Family::from_table_token("ld"), None);
    }
}
