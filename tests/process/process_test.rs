/*!
 * Process Tests
 * Start/terminate semantics, outcome classification and fault observation
 */

use pretty_assertions::assert_eq;
use process_trigger::{
    CancellationToken, Operation, OperationError, Process, ProcessConfig, ProcessError,
    ProcessState,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn until_cancelled() -> impl Operation {
    |cancel: CancellationToken| async move {
        cancel.cancelled().await;
        Ok(())
    }
}

async fn settle(process: &Process) {
    if let Some(termination) = process.termination() {
        let _ = tokio::time::timeout(Duration::from_secs(2), termination.wait()).await;
    }
}

#[tokio::test]
async fn test_start_and_terminate_cleanly() {
    let process = Process::new("looper", until_cancelled());
    assert_eq!(process.state(), ProcessState::Terminated);

    process.start_async().await.unwrap();
    assert_eq!(process.state(), ProcessState::Running);

    let startup = process.startup().unwrap();
    assert_eq!(startup.peek(), Some(Ok(())));

    process.terminate_async().await.unwrap();

    let termination = process.termination().unwrap();
    assert_eq!(termination.wait().await, Ok(()));
    assert_eq!(process.state(), ProcessState::Terminated);
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let launches = Arc::new(AtomicU32::new(0));
    let counter = launches.clone();
    let process = Process::new("idempotent", move |cancel: CancellationToken| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            cancel.cancelled().await;
            Ok(())
        }
    });

    let first = process.start();
    let generation = process.generation();
    for _ in 0..5 {
        process.start();
    }
    assert_eq!(process.generation(), generation);

    first.wait().await.unwrap();
    process.start_async().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(launches.load(Ordering::SeqCst), 1);
    assert_eq!(process.generation(), generation);

    process.terminate_async().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_start_launches_once() {
    let launches = Arc::new(AtomicU32::new(0));
    let counter = launches.clone();
    let process = Arc::new(Process::new("contended", move |cancel: CancellationToken| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            cancel.cancelled().await;
            Ok(())
        }
    }));

    let starters: Vec<_> = (0..16)
        .map(|_| {
            let process = process.clone();
            tokio::spawn(async move { process.start_async().await })
        })
        .collect();
    for starter in starters {
        assert_eq!(starter.await.unwrap(), Ok(()));
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(launches.load(Ordering::SeqCst), 1);
    assert_eq!(process.generation(), 1);
    assert_eq!(process.state(), ProcessState::Running);

    process.terminate_async().await.unwrap();
    assert_eq!(process.state(), ProcessState::Terminated);
}

#[tokio::test]
async fn test_terminate_before_start_is_noop() {
    let process = Process::new("idle", until_cancelled());

    let termination = process.terminate();
    assert_eq!(termination.peek(), Some(Ok(())));
    assert_eq!(process.terminate_async().await, Ok(()));
    assert_eq!(process.state(), ProcessState::Terminated);
    assert_eq!(process.generation(), 0);
    assert!(process.startup().is_none());
}

#[tokio::test]
async fn test_terminate_when_terminated_returns_completed() {
    let process = Process::new("done", until_cancelled());
    process.start_async().await.unwrap();
    process.terminate_async().await.unwrap();

    let again = process.terminate();
    assert_eq!(again.peek(), Some(Ok(())));
}

#[tokio::test]
async fn test_return_without_cancellation_is_unexpected() {
    let process = Process::new("quitter", |_cancel: CancellationToken| async move { Ok(()) });

    process.start();
    settle(&process).await;
    assert_eq!(process.state(), ProcessState::Failed);

    assert_eq!(
        process.terminate_async().await,
        Err(ProcessError::UnexpectedTermination("quitter".into()))
    );
    assert_eq!(process.state(), ProcessState::Terminated);

    // Observed once; later calls see an empty completion
    assert_eq!(process.terminate_async().await, Ok(()));
}

#[tokio::test]
async fn test_cancellation_error_for_own_token_is_clean() {
    let process = Process::new("polite", |cancel: CancellationToken| async move {
        cancel.cancelled().await;
        Err(OperationError::Cancelled)
    });

    process.start_async().await.unwrap();
    assert_eq!(process.terminate_async().await, Ok(()));
    assert_eq!(process.state(), ProcessState::Terminated);
}

#[tokio::test]
async fn test_cancellation_error_without_request_faults() {
    let process = Process::new("impostor", |_cancel: CancellationToken| async move {
        Err(OperationError::Cancelled)
    });

    process.start();
    settle(&process).await;

    assert_eq!(process.state(), ProcessState::Failed);
    assert_eq!(
        process.terminate_async().await,
        Err(ProcessError::ForeignCancellation("impostor".into()))
    );
}

#[tokio::test]
async fn test_operation_fault_is_observed_once() {
    let process = Process::new("faulty", |_cancel: CancellationToken| async move {
        Err(OperationError::Failed(anyhow::anyhow!("boom")))
    });

    process.start();
    settle(&process).await;
    assert_eq!(process.state(), ProcessState::Failed);

    // Every observer of the completion sees the fault
    let termination = process.termination().unwrap();
    assert!(matches!(
        termination.wait().await,
        Err(ProcessError::Faulted { .. })
    ));

    match process.terminate_async().await {
        Err(ProcessError::Faulted { process, message }) => {
            assert_eq!(process, "faulty");
            assert_eq!(message, "boom");
        }
        other => panic!("Expected fault, got {:?}", other),
    }
    assert_eq!(process.terminate_async().await, Ok(()));

    // The completion itself still reports the resolved outcome
    assert!(termination.wait().await.is_err());
}

#[tokio::test]
async fn test_panicking_operation_fails() {
    let process = Process::new("panicky", |_cancel: CancellationToken| async move {
        panic!("operation exploded");
    });

    process.start();
    settle(&process).await;

    match process.terminate_async().await {
        Err(ProcessError::Panicked { message, .. }) => assert_eq!(message, "operation exploded"),
        other => panic!("Expected panic fault, got {:?}", other),
    }
}

#[tokio::test]
async fn test_terminate_timeout_leaves_operation_running() {
    let process = Process::new("slow", |cancel: CancellationToken| async move {
        cancel.cancelled().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(())
    });

    process.start_async().await.unwrap();

    let outcome = process
        .terminate_async_timeout(Duration::from_millis(20))
        .await;
    assert!(matches!(outcome, Err(ProcessError::Timeout { .. })));
    assert_eq!(process.state(), ProcessState::Running);

    assert_eq!(process.terminate_async_timeout(Duration::from_secs(2)).await, Ok(()));
    assert_eq!(process.state(), ProcessState::Terminated);
}

#[tokio::test]
async fn test_terminate_until_abandoned() {
    let process = Process::new("stubborn", |cancel: CancellationToken| async move {
        cancel.cancelled().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(())
    });
    process.start_async().await.unwrap();

    let abandon = CancellationToken::new();
    abandon.cancel();
    assert_eq!(
        process.terminate_until(&abandon).await,
        Err(ProcessError::Abandoned("termination".into()))
    );

    assert_eq!(process.terminate_until(&CancellationToken::new()).await, Ok(()));
}

#[tokio::test]
async fn test_restart_gets_fresh_generation() {
    let tokens = Arc::new(parking_lot::Mutex::new(Vec::<CancellationToken>::new()));
    let seen = tokens.clone();
    let process = Process::new("restartable", move |cancel: CancellationToken| {
        seen.lock().push(cancel.clone());
        async move {
            cancel.cancelled().await;
            Ok(())
        }
    });

    process.start_async().await.unwrap();
    let first_termination = process.termination().unwrap();
    process.terminate_async().await.unwrap();

    process.start_async().await.unwrap();
    assert_eq!(process.generation(), 2);
    assert_eq!(process.state(), ProcessState::Running);

    {
        let tokens = tokens.lock();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].is_cancelled());
        assert!(!tokens[1].is_cancelled());
    }

    // The old completion keeps its outcome
    assert_eq!(first_termination.peek(), Some(Ok(())));
    process.terminate_async().await.unwrap();
}

#[tokio::test]
async fn test_startup_timeout_configuration() {
    let config = ProcessConfig::fast("configured");
    let process = Process::with_config(config, Arc::new(until_cancelled()));

    assert_eq!(process.name(), "configured");
    assert!(process.start_async().await.is_ok());
    assert!(process.terminate_async().await.is_ok());
}

#[tokio::test]
async fn test_dropping_process_cancels_generation() {
    let tokens = Arc::new(parking_lot::Mutex::new(None::<CancellationToken>));
    let seen = tokens.clone();
    let process = Process::new("dropped", move |cancel: CancellationToken| {
        *seen.lock() = Some(cancel.clone());
        async move {
            cancel.cancelled().await;
            Ok(())
        }
    });

    process.start_async().await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    drop(process);

    let token = tokens.lock().clone().unwrap();
    assert!(token.is_cancelled());
}
