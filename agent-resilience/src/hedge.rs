//! Hedged requests: race a primary call against a delayed secondary.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use agent_types::ResilienceError;

/// Start `primary` immediately. If it hasn't returned within `delay`, start
/// `secondary` and race both to completion, preferring whichever succeeds
/// first. Both closures receive a cancellation token derived from
/// `cancellation`, canceled as soon as a winner is chosen.
pub async fn hedge<T, E, P, S, Fp, Fs>(
    cancellation: &CancellationToken,
    delay: Duration,
    primary: P,
    secondary: S,
) -> Result<T, ResilienceError<E>>
where
    P: FnOnce(CancellationToken) -> Fp,
    S: FnOnce(CancellationToken) -> Fs,
    Fp: Future<Output = Result<T, E>> + Send + 'static,
    Fs: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let derived = cancellation.child_token();
    let mut primary_task = tokio::spawn(primary(derived.clone()));

    tokio::select! {
        () = cancellation.cancelled() => {
            derived.cancel();
            Err(ResilienceError::Cancelled("cancelled before a winner was chosen".into()))
        }
        result = &mut primary_task => {
            let outcome = result.expect("primary hedge task panicked");
            match outcome {
                Ok(value) => {
                    derived.cancel();
                    Ok(value)
                }
                Err(primary_err) => {
                    let mut secondary_task = tokio::spawn(secondary(derived.clone()));
                    tokio::select! {
                        () = cancellation.cancelled() => {
                            derived.cancel();
                            Err(ResilienceError::Cancelled("cancelled before a winner was chosen".into()))
                        }
                        result = &mut secondary_task => {
                            derived.cancel();
                            match result.expect("secondary hedge task panicked") {
                                Ok(value) => Ok(value),
                                Err(_) => Err(ResilienceError::Inner(primary_err)),
                            }
                        }
                    }
                }
            }
        }
        () = tokio::time::sleep(delay) => {
            let mut secondary_task = tokio::spawn(secondary(derived.clone()));
            loop {
                tokio::select! {
                    () = cancellation.cancelled() => {
                        derived.cancel();
                        return Err(ResilienceError::Cancelled("cancelled before a winner was chosen".into()));
                    }
                    result = &mut primary_task => {
                        match result.expect("primary hedge task panicked") {
                            Ok(value) => {
                                derived.cancel();
                                return Ok(value);
                            }
                            Err(primary_err) => {
                                let outcome = (&mut secondary_task).await.expect("secondary hedge task panicked");
                                derived.cancel();
                                return match outcome {
                                    Ok(value) => Ok(value),
                                    Err(_) => Err(ResilienceError::Inner(primary_err)),
                                };
                            }
                        }
                    }
                    result = &mut secondary_task => {
                        match result.expect("secondary hedge task panicked") {
                            Ok(value) => {
                                derived.cancel();
                                return Ok(value);
                            }
                            Err(_secondary_err) => {
                                let outcome = (&mut primary_task).await.expect("primary hedge task panicked");
                                derived.cancel();
                                return outcome.map_err(ResilienceError::Inner);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fast_primary_wins_without_starting_secondary() {
        let secondary_started = Arc::new(AtomicBool::new(false));
        let secondary_started_clone = secondary_started.clone();
        let ct = CancellationToken::new();

        let result: Result<&str, ResilienceError<&str>> = hedge(
            &ct,
            Duration::from_millis(50),
            |_ct| async { Ok("primary") },
            move |_ct| {
                secondary_started_clone.store(true, Ordering::SeqCst);
                async { Ok("secondary") }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "primary");
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!secondary_started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn slow_primary_timer_fires_and_secondary_wins() {
        let ct = CancellationToken::new();

        let result: Result<&str, ResilienceError<&str>> = hedge(
            &ct,
            Duration::from_millis(5),
            |_ct| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok("primary")
            },
            |_ct| async { Ok("secondary") },
        )
        .await;

        assert_eq!(result.unwrap(), "secondary");
    }

    #[tokio::test]
    async fn both_fail_returns_primary_error() {
        let ct = CancellationToken::new();

        let result: Result<&str, ResilienceError<&str>> = hedge(
            &ct,
            Duration::from_millis(5),
            |_ct| async { Err("primary failed") },
            |_ct| async { Err("secondary failed") },
        )
        .await;

        assert!(matches!(result, Err(ResilienceError::Inner("primary failed"))));
    }

    #[tokio::test]
    async fn primary_error_before_delay_starts_secondary_immediately() {
        let ct = CancellationToken::new();

        let result: Result<&str, ResilienceError<&str>> = hedge(
            &ct,
            Duration::from_millis(50),
            |_ct| async { Err("primary failed") },
            |_ct| async { Ok("secondary") },
        )
        .await;

        assert_eq!(result.unwrap(), "secondary");
    }
}
