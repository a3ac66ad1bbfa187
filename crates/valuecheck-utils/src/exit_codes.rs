//! Exit code constants for the valuecheck CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Assessment completed (possibly degraded to fallback) |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `INVALID_INPUT` | Product input failed validation |
//! | 5 | `CONNECTIVITY` | Connectivity probe failed |
//! | 10 | `STAGE_TIMEOUT` | A stage timed out with fallback disabled |
//! | 70 | `STAGE_FAILURE` | A stage failed with fallback disabled |

/// Exit codes matching the documented exit code table.
///
/// # Example
///
/// ```rust
/// use valuecheck_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(70), ExitCode::STAGE_FAILURE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - assessment produced a result
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments or configuration error
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Product input rejected before any LLM call
    pub const INVALID_INPUT: ExitCode = ExitCode(3);

    /// Connectivity probe failed
    pub const CONNECTIVITY: ExitCode = ExitCode(5);

    /// Stage timed out and fallback was disabled
    pub const STAGE_TIMEOUT: ExitCode = ExitCode(10);

    /// Stage failed and fallback was disabled
    pub const STAGE_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    ///
    /// Prefer using the named constants when possible.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
