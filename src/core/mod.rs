/*!
# Core Module

Core types of the LSL front-end: source ranges, error kinds, file helpers.
*/

pub mod errors;
pub mod position;
pub mod fs_utils;

pub use errors::{ContractError, ContractResult, QueueError, SignatureError};
pub use position::{LineIndex, SourceCodeRange};
pub use fs_utils::read_lsl_file;
