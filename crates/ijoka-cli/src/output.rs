//! Output formatting and exit-code mapping (spec.md §6 "CLI surface",
//! §7 error taxonomy): 0 success, 1 user error, 2 store error.

use ijoka_core::CoreError;
use serde::Serialize;

pub enum ExitCode {
    Success = 0,
    UserError = 1,
    StoreError = 2,
}

/// Print `value` as pretty JSON when `json` is set, otherwise hand it to
/// `plain` for a human-readable rendering.
pub fn emit<T: Serialize>(value: &T, json: bool, plain: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        plain(value);
    }
    Ok(())
}

/// Maps a `CoreError` to the exit code §7's taxonomy calls for and prints
/// it to stderr, either as a JSON envelope or a plain message.
pub fn report_error(err: &CoreError, json: bool) -> ExitCode {
    let exit = match err {
        CoreError::Validation(_) | CoreError::ClaimConflict { .. } | CoreError::CycleError(_) | CoreError::NotFound(_) => {
            ExitCode::UserError
        }
        CoreError::StoreTransient(_) | CoreError::StoreUnavailable(_) | CoreError::Internal(_) => ExitCode::StoreError,
    };
    if json {
        eprintln!(
            "{}",
            serde_json::json!({ "error": err.to_string() })
        );
    } else {
        eprintln!("error: {err}");
    }
    exit
}
