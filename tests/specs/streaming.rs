// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token-streaming specs: TOKEN* then exactly one terminal event.

use crate::prelude::*;
use async_trait::async_trait;

/// Runner that emits a fixed token script.
struct ScriptedRunner {
    tokens: &'static [&'static str],
}

#[async_trait]
impl ModelRunner for ScriptedRunner {
    async fn ensure_loaded(&self, _model_id: &str) -> Result<(), RunError> {
        Ok(())
    }

    async fn run_chat(
        &self,
        _messages: &Value,
        _parameters: &Value,
        on_token: &(dyn for<'a> Fn(&'a str) + Send + Sync),
        _cancel: &CancellationToken,
    ) -> Result<ChatOutcome, RunError> {
        for token in self.tokens {
            on_token(token);
        }
        Ok(ChatOutcome {
            result: json!({"role": "assistant", "content": self.tokens.concat()}),
            tokens_per_second: 21.0,
        })
    }
}

/// A subscriber on the task's channel sees the three tokens in order,
/// then exactly one DONE with a positive throughput, then nothing.
#[tokio::test]
async fn tokens_in_order_then_exactly_one_done() {
    let engine = memory_engine().await;
    let id = engine.enqueue_inference(chat("greet")).await.unwrap();
    let mut rx = engine.hub().subscribe(&inference_channel(&id));

    let shutdown = CancellationToken::new();
    let worker = InferenceWorker::new(
        engine.clone(),
        Arc::new(ScriptedRunner { tokens: &["Hello", " ", "world"] }),
    );
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    for expected in ["Hello", " ", "world"] {
        match rx.recv().await.unwrap() {
            StreamEvent::Token { data, .. } => assert_eq!(data.text, expected),
            other => panic!("expected TOKEN, got {other:?}"),
        }
    }
    match rx.recv().await.unwrap() {
        StreamEvent::Done { task_id, data, .. } => {
            assert_eq!(task_id, id);
            assert!(data.tokens_per_second > 0.0);
        }
        other => panic!("expected DONE, got {other:?}"),
    }

    let row = wait_for_task_status(&engine, &id, JobStatus::Completed).await;
    assert_eq!(row.result, Some(json!({"role": "assistant", "content": "Hello world"})));

    shutdown.cancel();
    handle.await.unwrap();
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

/// A failed run emits exactly one ERROR terminal event.
#[tokio::test]
async fn failure_emits_exactly_one_error() {
    struct DoomedRunner;

    #[async_trait]
    impl ModelRunner for DoomedRunner {
        async fn ensure_loaded(&self, model_id: &str) -> Result<(), RunError> {
            Err(RunError::failed(format!("{model_id} is not installed")))
        }

        async fn run_chat(
            &self,
            _messages: &Value,
            _parameters: &Value,
            _on_token: &(dyn for<'a> Fn(&'a str) + Send + Sync),
            _cancel: &CancellationToken,
        ) -> Result<ChatOutcome, RunError> {
            Err(RunError::failed("unreachable"))
        }
    }

    let engine = memory_engine().await;
    let id = engine.enqueue_inference(chat("doomed")).await.unwrap();
    let mut rx = engine.hub().subscribe(&inference_channel(&id));

    let shutdown = CancellationToken::new();
    let worker = InferenceWorker::new(engine.clone(), Arc::new(DoomedRunner));
    let handle = tokio::spawn(worker.run(shutdown.clone()));

    match rx.recv().await.unwrap() {
        StreamEvent::Error { data, .. } => assert!(data.message.contains("not installed")),
        other => panic!("expected ERROR, got {other:?}"),
    }
    let row = wait_for_task_status(&engine, &id, JobStatus::Failed).await;
    assert!(row.error_log.unwrap().contains("not installed"));

    shutdown.cancel();
    handle.await.unwrap();
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}
