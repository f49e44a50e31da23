//! Emission driver: one ordered pass over the opcode table.
//!
//! Rows are validated and dispatched strictly in table order; the pass is
//! pure, so re-running it over an unchanged table yields byte-identical
//! routines. A malformed row aborts the run; a row whose family has no
//! generator is skipped and surfaces in the coverage report instead.

use crate::error::LowerError;
use crate::lower::generator_for;
use crate::routine::GeneratedRoutine;
use crate::table::InstructionDescriptor;

/// Per-run coverage accounting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageReport {
    /// Number of rows lowered into routines.
    pub lowered: usize,
    /// Opcodes skipped because their family had no generator.
    pub skipped: Vec<u16>,
}

impl CoverageReport {
    /// Whether every row produced a routine.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Everything one lowering pass produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredSet {
    /// Routines in table order, one per resolvable row.
    pub routines: Vec<GeneratedRoutine>,
    /// Coverage accounting for the pass.
    pub coverage: CoverageReport,
}

impl LoweredSet {
    /// The dispatch table: routine references in table order.
    #[must_use]
    pub fn routine_references(&self) -> Vec<&str> {
        self.routines
            .iter()
            .map(|routine| routine.identifier.as_str())
            .collect()
    }

    /// The companion table: the immediate shape each routine expects,
    /// parallel to [`Self::routine_references`].
    #[must_use]
    pub fn immediate_shapes(&self) -> Vec<crate::routine::ImmediateShape> {
        self.routines
            .iter()
            .map(|routine| routine.immediate_shape)
            .collect()
    }
}

/// Lowers an ordered opcode table into routines.
///
/// # Errors
///
/// Returns [`LowerError::MalformedRow`] for the first internally
/// inconsistent row; no partial output is produced.
pub fn lower_table(rows: &[InstructionDescriptor]) -> Result<LoweredSet, LowerError> {
    let mut routines = Vec::with_capacity(rows.len());
    let mut coverage = CoverageReport::default();

    for row in rows {
        row.validate()
            .map_err(|violation| LowerError::MalformedRow {
                opcode: row.opcode,
                violation,
            })?;

        match generator_for(row.family) {
            Some(generate) => {
                routines.push(generate(row)?);
                coverage.lowered += 1;
            }
            None => coverage.skipped.push(row.opcode),
        }
    }

    Ok(LoweredSet { routines, coverage })
}
