use tokio::select;
use tokio::signal;
use tokio::task::{JoinError, JoinHandle};
use tracing::warn;

#[derive(thiserror::Error, Debug)]
pub enum InterruptError<E> {
    #[error("interrupted")]
    Interrupted(#[source] JoinError),
    #[error(transparent)]
    Task(E),
}

/// Wait for a spawned pipeline task, aborting it on Ctrl-C.
///
/// The first Ctrl-C aborts the task, which drops (and kills) any child process it owns.
/// A second Ctrl-C exits the process immediately.
pub async fn interrupt_on_ctrlc<T, E>(
    mut task: JoinHandle<Result<T, E>>,
) -> Result<T, InterruptError<E>> {
    let abort_handle = task.abort_handle();
    let mut interrupted = false;
    loop {
        select! {
            joined = &mut task => return match joined {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(InterruptError::Task(err)),
                Err(err) => Err(InterruptError::Interrupted(err)),
            },
            _ = signal::ctrl_c() => {
                if interrupted {
                    std::process::exit(130);
                }
                warn!("Interrupted, stopping (press Ctrl-C again to force)");
                interrupted = true;
                abort_handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_task_result() {
        let ok = tokio::spawn(async { Ok::<_, String>(7) });
        assert_eq!(interrupt_on_ctrlc(ok).await.unwrap(), 7);

        let failed = tokio::spawn(async { Err::<u8, _>("boom".to_string()) });
        match interrupt_on_ctrlc(failed).await {
            Err(InterruptError::Task(err)) => assert_eq!(err, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
