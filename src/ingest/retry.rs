use tracing::error;

use crate::error::StoreResult;

/// Run `op` up to `max_attempts` times with no backoff. Only retryable
/// errors earn another attempt; the last error is returned once attempts
/// run out. `op` receives the 1-based attempt number.
pub fn run_with_retry<T, F>(max_attempts: usize, job_id: &str, mut op: F) -> StoreResult<T>
where
    F: FnMut(usize) -> StoreResult<T>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                let remaining = max_attempts - attempt;
                error!(
                    target: "canopy::worker",
                    "problem creating entry {} (attempt {}/{}, {} retries left): {}",
                    job_id, attempt, max_attempts, remaining, e
                );
                if remaining == 0 || !e.is_retryable() {
                    return Err(e);
                }
            }
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn always_failing_is_attempted_exactly_max_times() {
        let mut calls = 0;
        let res: StoreResult<()> = run_with_retry(4, "/a", |_| {
            calls += 1;
            Err(StoreError::transient("down"))
        });
        assert_eq!(calls, 4);
        assert_eq!(res.unwrap_err().code_str(), "transient_store_error");
    }

    #[test]
    fn succeeds_on_last_attempt() {
        let res = run_with_retry(4, "/a", |n| if n < 4 { Err(StoreError::transient("x")) } else { Ok(n) });
        assert_eq!(res.unwrap(), 4);
    }

    #[test]
    fn non_retryable_fails_first_time() {
        let mut calls = 0;
        let res: StoreResult<()> = run_with_retry(4, "/a", |_| {
            calls += 1;
            Err(StoreError::InvalidJob("no name".into()))
        });
        assert_eq!(calls, 1);
        assert!(res.is_err());
    }
}
