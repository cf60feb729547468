//! API Request and Response Types
//!
//! Wire shapes of the REST API. All field names are camelCase; entities
//! themselves are serialized straight from `trellis-core`.

mod application;
pub use application::*;

mod board;
pub use board::*;

mod pagination;
pub use pagination::*;

mod suggestion;
pub use suggestion::*;
