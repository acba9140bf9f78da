//! Exit-code and message translation for the external utility
//!
//! The utility reports failures as errno-derived exit codes and free
//! prose. The table here is part of the versioned contract with it;
//! anything the table does not recognize becomes `Internal` and is
//! logged with the raw output so contract drift can be classified
//! later.

use crate::error::RxdError;
use crate::utility::invoker::Invocation;
use tracing::warn;

/// Exit codes the utility emits directly (errno values) and their
/// 8-bit truncations as seen when the utility returns a negative errno
/// from main.
const NOT_FOUND_CODES: [i32; 2] = [2, 254];
const BUSY_CODES: [i32; 2] = [16, 240];
const ALREADY_EXISTS_CODES: [i32; 2] = [17, 239];
const INVALID_ARGUMENT_CODES: [i32; 2] = [22, 234];

/// Map a failed invocation to the API error taxonomy.
///
/// Callers must only pass invocations with a non-zero exit code; exit
/// code 0 is success regardless of stderr noise and never reaches
/// here.
pub fn translate(invocation: &Invocation) -> RxdError {
    let code = invocation.exit_code;
    let message = failure_message(invocation);

    if NOT_FOUND_CODES.contains(&code) {
        return RxdError::NotFound { code, message };
    }
    if BUSY_CODES.contains(&code) {
        return RxdError::Busy { code, message };
    }
    if ALREADY_EXISTS_CODES.contains(&code) {
        return RxdError::AlreadyExists { code, message };
    }
    if INVALID_ARGUMENT_CODES.contains(&code) {
        return RxdError::InvalidArgument { code, message };
    }

    // Older utility builds exit 1 for everything; fall back to the
    // message text.
    let lowered = message.to_lowercase();
    if lowered.contains("does not exist") || lowered.contains("unable to locate") {
        return RxdError::NotFound { code, message };
    }
    if lowered.contains("already exists") || lowered.contains("already mapped") {
        return RxdError::AlreadyExists { code, message };
    }
    if lowered.contains("busy") || lowered.contains("in use") {
        return RxdError::Busy { code, message };
    }
    if lowered.contains("invalid") {
        return RxdError::InvalidArgument { code, message };
    }

    warn!(
        exit_code = code,
        stdout = %invocation.stdout_joined(),
        stderr = %invocation.stderr_joined(),
        "Unrecognized utility failure, treating as internal"
    );
    RxdError::Internal { code, message }
}

fn failure_message(invocation: &Invocation) -> String {
    // The utility writes some diagnostics to stdout and some to
    // stderr; prefer stderr, fall back to stdout, then a placeholder.
    let stderr = invocation.stderr_joined();
    if !stderr.trim().is_empty() {
        return stderr;
    }
    let stdout = invocation.stdout_joined();
    if !stdout.trim().is_empty() {
        return stdout;
    }
    format!("utility exited with code {}", invocation.exit_code)
}
