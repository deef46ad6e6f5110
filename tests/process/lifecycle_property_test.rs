/*!
 * Lifecycle Property Tests
 * Arbitrary start/terminate sequences settle into the modelled state
 */

use process_trigger::{CancellationToken, Process, ProcessState};
use proptest::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Call {
    Start,
    StartAsync,
    Terminate,
    TerminateAsync,
}

fn call() -> impl Strategy<Value = Call> {
    prop_oneof![
        Just(Call::Start),
        Just(Call::StartAsync),
        Just(Call::Terminate),
        Just(Call::TerminateAsync),
    ]
}

/// Expected state after each call has settled
#[derive(Debug, Default)]
struct Model {
    running: bool,
    generations: u64,
}

impl Model {
    fn apply(&mut self, call: Call) {
        match call {
            Call::Start | Call::StartAsync => {
                if !self.running {
                    self.running = true;
                    self.generations += 1;
                }
            }
            Call::Terminate | Call::TerminateAsync => self.running = false,
        }
    }
}

async fn settle(process: &Process, call: Call) {
    let waited = match call {
        Call::Start => match process.startup() {
            Some(startup) => tokio::time::timeout(Duration::from_secs(2), startup.wait()).await,
            None => Ok(Ok(())),
        },
        Call::StartAsync => Ok(process.start_async().await),
        Call::Terminate => {
            let termination = process.terminate();
            tokio::time::timeout(Duration::from_secs(2), termination.wait()).await
        }
        Call::TerminateAsync => Ok(process.terminate_async().await),
    };
    assert_eq!(waited, Ok(Ok(())), "{call:?} did not settle cleanly");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_lifecycle_matches_model(calls in prop::collection::vec(call(), 1..24)) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let (state, generation, model) = runtime.block_on(async {
            let process = Process::new("prop", |cancel: CancellationToken| async move {
                cancel.cancelled().await;
                Ok(())
            });
            let mut model = Model::default();

            for call in calls {
                if matches!(call, Call::Start) {
                    process.start();
                }
                settle(&process, call).await;
                model.apply(call);
            }

            (process.state(), process.generation(), model)
        });

        let expected = if model.running {
            ProcessState::Running
        } else {
            ProcessState::Terminated
        };
        prop_assert_eq!(state, expected);
        prop_assert_eq!(generation, model.generations);
    }
}
