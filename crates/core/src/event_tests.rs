// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn channel_names() {
    let exec = ExecutionId::new("exec-1");
    let task = TaskId::new("task-1");
    assert_eq!(execution_channel(&exec), "execution:exec-1");
    assert_eq!(inference_channel(&task), "inference:task-1");
}

#[test]
fn token_wire_format() {
    let ev = StreamEvent::Token {
        task_id: TaskId::new("task-1"),
        data: TokenData { text: "Hello".into() },
        ts: 1000,
    };
    let value = serde_json::to_value(&ev).unwrap();
    assert_eq!(
        value,
        json!({"type": "TOKEN", "task_id": "task-1", "data": {"text": "Hello"}, "ts": 1000})
    );
}

#[test]
fn done_wire_format() {
    let ev = StreamEvent::Done {
        task_id: TaskId::new("task-1"),
        data: DoneData { result: json!({"content": "hi"}), tokens_per_second: 12.5 },
        ts: 2000,
    };
    let value = serde_json::to_value(&ev).unwrap();
    assert_eq!(value["type"], "DONE");
    assert_eq!(value["data"]["tokens_per_second"], 12.5);
}

#[test]
fn error_omits_absent_trace() {
    let ev = StreamEvent::Error {
        task_id: TaskId::new("task-1"),
        data: ErrorData { message: "model crashed".into(), trace: None },
        ts: 3000,
    };
    let value = serde_json::to_value(&ev).unwrap();
    assert!(value["data"].get("trace").is_none());
}

#[test]
fn events_roundtrip() {
    let ev = StreamEvent::Node {
        execution_id: ExecutionId::new("exec-1"),
        data: NodeData {
            node_id: "n1".into(),
            status: NodeEventStatus::Completed,
            output: Some(json!("partial")),
        },
        ts: 4000,
    };
    let json = serde_json::to_string(&ev).unwrap();
    let back: StreamEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ev);
}

#[test]
fn terminal_event_detection() {
    let token = StreamEvent::Token {
        task_id: TaskId::new("t"),
        data: TokenData { text: "x".into() },
        ts: 0,
    };
    let canceled = StreamEvent::Canceled { task_id: TaskId::new("t"), ts: 0 };
    let finished = StreamEvent::Finished {
        execution_id: ExecutionId::new("e"),
        data: FinishedData { status: JobStatus::Completed, final_result: None, error: None },
        ts: 0,
    };
    let node = StreamEvent::Node {
        execution_id: ExecutionId::new("e"),
        data: NodeData { node_id: "n".into(), status: NodeEventStatus::Started, output: None },
        ts: 0,
    };

    assert!(!token.is_terminal());
    assert!(!node.is_terminal());
    assert!(canceled.is_terminal());
    assert!(finished.is_terminal());
}
