//! Direct-edit mutator: validated cell writes with history.

use crate::{cell, Application, Board, CellValue, Cells, Role, ValidationError};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Raw client patch: column key -> JSON value.
pub type CellPatch = Map<String, JsonValue>;

/// Fields that actually changed, with their new values.
pub type Changes = BTreeMap<String, CellValue>;

/// Validate every known key of `patch` against `board`.
///
/// Unknown keys are dropped. The first invalid value fails the whole batch
/// so callers never see a partially coerced patch.
fn coerce_patch(board: &Board, patch: &CellPatch) -> Result<Vec<(String, CellValue)>, ValidationError> {
    let mut coerced = Vec::with_capacity(patch.len());
    for (key, raw) in patch {
        let Some(column) = board.column(key) else {
            continue;
        };
        let value = cell::validate_for_column(raw, column).into_result(key)?;
        coerced.push((key.clone(), value));
    }
    Ok(coerced)
}

fn ensure_required(board: &Board, has_key: impl Fn(&str) -> bool) -> Result<(), ValidationError> {
    match board.required_keys().find(|key| !has_key(*key)) {
        Some(key) => Err(ValidationError::RequiredFieldMissing {
            field: key.to_string(),
        }),
        None => Ok(()),
    }
}

/// Cells for a new row built from client input.
///
/// Every required column must be present in `values` (null is allowed).
pub fn build_cells(board: &Board, values: &CellPatch) -> Result<Cells, ValidationError> {
    let cells: Cells = coerce_patch(board, values)?.into_iter().collect();
    ensure_required(board, |key| cells.contains_key(key))?;
    Ok(cells)
}

/// Apply a direct edit to `row`.
///
/// A history entry is appended for each field whose coerced value differs
/// from the current one (absent reads as null). On error the row is left
/// untouched.
pub fn apply_edit(
    row: &mut Application,
    board: &Board,
    patch: &CellPatch,
    changed_by: Role,
) -> Result<Changes, ValidationError> {
    let coerced = coerce_patch(board, patch)?;
    ensure_required(board, |key| {
        row.cells.contains_key(key) || coerced.iter().any(|(k, _)| k == key)
    })?;

    let mut changes = Changes::new();
    for (key, value) in coerced {
        let current = row.cell(&key);
        if current != value {
            row.record_change(&key, current, value.clone(), changed_by);
            changes.insert(key.clone(), value.clone());
        }
        row.cells.insert(key, value);
    }
    Ok(changes)
}
