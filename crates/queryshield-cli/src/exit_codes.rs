//! Process exit codes. Part of the public contract: CI pipelines branch on them.

use queryshield_core::CoreError;

pub const SUCCESS: i32 = 0;
pub const RUNTIME_ERROR: i32 = 1; // I/O or other unexpected failure
pub const VIOLATIONS: i32 = 2; // Budget violations (or regression) found
pub const INVALID_INPUT: i32 = 3; // Malformed report or invalid budgets

/// Map a command error to its exit code.
pub fn for_error(err: &anyhow::Error) -> i32 {
    if err.chain().any(|cause| cause.downcast_ref::<CoreError>().is_some()) {
        INVALID_INPUT
    } else {
        RUNTIME_ERROR
    }
}
