use flexgemm_math::DivisorError;
use flexgemm_plan::PlanError;

// Exit codes for scripted callers; clap reports usage errors as 2
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
pub const EXIT_DIVISOR_FAIL: i32 = 3;

/// Exit code for a failed command: divisor synthesis or verification failures
/// anywhere in the error chain map to [`EXIT_DIVISOR_FAIL`].
pub fn code_for(err: &anyhow::Error) -> i32 {
    let divisor_failure = err.chain().any(|cause| {
        cause.downcast_ref::<DivisorError>().is_some()
            || cause.downcast_ref::<PlanError>().is_some_and(PlanError::is_divisor_failure)
    });
    if divisor_failure { EXIT_DIVISOR_FAIL } else { EXIT_GENERIC_FAIL }
}
