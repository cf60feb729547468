//! Trellis Core - Board Types and Row Rules
//!
//! Data types shared by every Trellis crate, plus the pure rules that act on
//! them: cell coercion, direct edits, undo and the suggestion state machine.
//! Nothing here performs I/O.

mod annotations;
mod board;
pub mod cell;
pub mod edit;
mod entities;
mod enums;
mod error;
mod history;
mod identity;
mod suggestion;

pub use annotations::{validate_message, MAX_ACTIVITY_LEN, MAX_TAG_LABEL_LEN};
pub use board::{default_columns, derive_key, validate_key, ColumnPatch, NewColumn, DEFAULT_STATUS_OPTIONS};
pub use cell::{CellValidation, CellValue};
pub use edit::{apply_edit, build_cells, CellPatch, Changes};
pub use entities::*;
pub use enums::*;
pub use error::*;
pub use history::UndoOutcome;
pub use identity::*;
pub use suggestion::{lost_resolution_race, AcceptedChange};
