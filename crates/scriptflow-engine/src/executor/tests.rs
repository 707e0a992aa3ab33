use super::*;
use scriptflow_core::seed::{demo_rules, demo_store};
use scriptflow_core::{Edge, GraphStore, Node, Position, SubstitutionRule};
use scriptflow_runner::{RunnerError, ScriptRequest};
use serde_json::{Value, json};
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

type Respond = Box<dyn Fn(Option<&str>) -> Result<ScriptOutput, RunnerError> + Send + Sync>;

/// A runner that answers from a closure and records every request it sees,
/// along with whether the executor reported itself busy at that moment.
struct ScriptedRunner {
    respond: Respond,
    requests: Mutex<Vec<ScriptRequest>>,
    busy_at_call: Mutex<Vec<bool>>,
    state_rx: Mutex<Option<watch::Receiver<ExecutorState>>>,
}

impl ScriptedRunner {
    fn new(
        respond: impl Fn(Option<&str>) -> Result<ScriptOutput, RunnerError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
            busy_at_call: Mutex::new(Vec::new()),
            state_rx: Mutex::new(None),
        }
    }

    fn watch(&self, state_rx: watch::Receiver<ExecutorState>) {
        *self.state_rx.lock().unwrap() = Some(state_rx);
    }

    fn scripts(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.script.clone())
            .collect()
    }
}

impl ScriptRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run_script(&self, request: &ScriptRequest) -> Result<ScriptOutput, RunnerError> {
        if let Some(state_rx) = self.state_rx.lock().unwrap().as_ref() {
            let busy = *state_rx.borrow() == ExecutorState::Running;
            self.busy_at_call.lock().unwrap().push(busy);
        }
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request.script.as_deref())
    }
}

/// A runner whose first call blocks until the test opens the gate.
struct GatedRunner {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptRunner for GatedRunner {
    fn name(&self) -> &str {
        "gated"
    }

    async fn run_script(&self, _request: &ScriptRequest) -> Result<ScriptOutput, RunnerError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(output(json!({ "ok": true })))
    }
}

fn output(value: Value) -> ScriptOutput {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn node(id: &str, script: &str) -> Node {
    Node::new(id, Position::default(), format!("node {id}")).with_script(script)
}

/// Stand-in for the remote Python runner, covering the demo graph's scripts.
fn demo_responder(script: Option<&str>) -> Result<ScriptOutput, RunnerError> {
    let Some(script) = script else {
        return Err(RunnerError::Execution("no script provided".to_string()));
    };
    if script.contains("num % 2 == 0") {
        return Ok(output(json!({ "even_numbers": [2, 4, 6, 8, 10] })));
    }
    if script.contains("sum(even_numbers)") {
        let sum = if script.contains("[2,4,6,8,10]") { 30 } else { 0 };
        return Ok(output(json!({ "sum": sum })));
    }
    Err(RunnerError::Execution(format!("unknown script: {script}")))
}

fn drain(rx: &mut mpsc::Receiver<ExecutorEvent>) -> Vec<ExecutorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn demo_graph_threads_even_numbers_into_sum() {
    let (tx, mut rx) = mpsc::channel(256);
    let executor = WorkflowExecutor::with_runner(ScriptedRunner::new(demo_responder), tx);
    executor.runner().watch(executor.subscribe());
    let mut store = demo_store();

    assert!(!executor.is_busy());
    let report = executor.execute(&mut store, &demo_rules()).await.unwrap();
    assert!(!executor.is_busy());

    // Every node was attempted, in declaration order, while busy.
    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.node_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(
        *executor.runner().busy_at_call.lock().unwrap(),
        vec![true, true, true]
    );

    // Node 1 has no script; the runner rejects it and its label stays put.
    assert!(!report.outcome(&"1".into()).unwrap().succeeded());
    assert_eq!(
        store.find_node(&"1".into()).unwrap().label,
        "Generated Numbers: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]"
    );

    assert_eq!(
        store.find_node(&"2".into()).unwrap().label,
        r#"{"even_numbers":[2,4,6,8,10]}"#
    );

    let resolved = report
        .outcome(&"3".into())
        .unwrap()
        .resolved_script
        .clone()
        .unwrap();
    assert!(resolved.contains("even_numbers = [2,4,6,8,10]"));
    assert!(!resolved.contains("even_numbers = []"));
    assert_eq!(store.find_node(&"3".into()).unwrap().label, r#"{"sum":30}"#);

    assert_eq!(report.results.len(), 2);
    assert!(!report.results.contains(&"1".into()));
    assert_eq!(report.failed_count(), 1);

    let events = drain(&mut rx);
    assert_eq!(
        events.first(),
        Some(&ExecutorEvent::StateChanged(ExecutorState::Running))
    );
    assert_eq!(
        events.last(),
        Some(&ExecutorEvent::WorkflowCompleted(report.run_id))
    );
    assert!(events.contains(&ExecutorEvent::StateChanged(ExecutorState::Idle)));
    assert!(events.iter().any(|e| matches!(
        e,
        ExecutorEvent::NodeFailed { node_id, .. } if node_id.as_str() == "1"
    )));
}

#[tokio::test]
async fn upstream_result_replaces_placeholder() {
    let (tx, _rx) = mpsc::channel(256);
    let runner = ScriptedRunner::new(|script| match script {
        Some("produce") => Ok(output(json!({ "x": [2, 4] }))),
        Some(_) => Ok(output(json!({ "done": true }))),
        None => Err(RunnerError::Execution("no script".to_string())),
    });
    let executor = WorkflowExecutor::with_runner(runner, tx);
    let mut store = GraphStore::new(
        vec![node("A", "produce"), node("B", "xs = []")],
        vec![Edge::custom("A", "B")],
    );
    let rules = vec![SubstitutionRule::new("A", "x", "B", "[]")];

    executor.execute(&mut store, &rules).await.unwrap();

    assert_eq!(
        executor.runner().scripts(),
        vec![Some("produce".to_string()), Some("xs = [2,4]".to_string())]
    );
}

#[tokio::test]
async fn failed_upstream_leaves_placeholder_and_run_continues() {
    let (tx, _rx) = mpsc::channel(256);
    let runner = ScriptedRunner::new(|script| match script {
        Some("produce") => Err(RunnerError::Status {
            status: 500,
            body: "boom".to_string(),
        }),
        _ => Ok(output(json!({ "done": true }))),
    });
    let executor = WorkflowExecutor::with_runner(runner, tx);
    let mut store = GraphStore::new(
        vec![node("A", "produce"), node("B", "xs = []")],
        vec![Edge::custom("A", "B")],
    );
    let rules = vec![SubstitutionRule::new("A", "x", "B", "[]")];

    let report = executor.execute(&mut store, &rules).await.unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert!(matches!(
        &report.outcome(&"A".into()).unwrap().status,
        NodeStatus::Failed(e) if e.contains("boom")
    ));
    assert_eq!(
        report.outcome(&"B".into()).unwrap().resolved_script.as_deref(),
        Some("xs = []")
    );
    assert_eq!(store.find_node(&"A".into()).unwrap().label, "node A");
    assert_eq!(store.find_node(&"B".into()).unwrap().label, r#"{"done":true}"#);
}

#[tokio::test]
async fn declaration_order_wins_over_edges() {
    let (tx, mut rx) = mpsc::channel(256);
    let runner = ScriptedRunner::new(|_| Ok(output(json!({ "x": [1] }))));
    let executor = WorkflowExecutor::with_runner(runner, tx);
    let mut store = GraphStore::new(
        vec![node("B", "xs = []"), node("A", "produce")],
        vec![Edge::custom("A", "B")],
    );
    let rules = vec![SubstitutionRule::new("A", "x", "B", "[]")];

    executor.execute(&mut store, &rules).await.unwrap();

    // B runs first and therefore never sees A's result.
    assert_eq!(
        executor.runner().scripts(),
        vec![Some("xs = []".to_string()), Some("produce".to_string())]
    );
    assert!(
        drain(&mut rx)
            .iter()
            .any(|e| matches!(e, ExecutorEvent::Warning(w) if w.contains("declared after")))
    );
}

#[tokio::test]
async fn results_do_not_leak_between_runs() {
    let (tx, _rx) = mpsc::channel(256);
    let calls = Mutex::new(0usize);
    let runner = ScriptedRunner::new(move |script| {
        let mut calls = calls.lock().unwrap();
        *calls += 1;
        match script {
            // Succeeds on the first run only.
            Some("produce") if *calls == 1 => Ok(output(json!({ "x": 5 }))),
            Some("produce") => Err(RunnerError::Execution("flaky".to_string())),
            _ => Ok(output(json!({}))),
        }
    });
    let executor = WorkflowExecutor::with_runner(runner, tx);
    let mut store = GraphStore::new(vec![node("A", "produce"), node("B", "x = X")], vec![]);
    let rules = vec![SubstitutionRule::new("A", "x", "B", "X")];

    executor.execute(&mut store, &rules).await.unwrap();
    let second = executor.execute(&mut store, &rules).await.unwrap();

    assert_eq!(
        executor.runner().scripts(),
        vec![
            Some("produce".to_string()),
            Some("x = 5".to_string()),
            Some("produce".to_string()),
            Some("x = X".to_string()),
        ]
    );
    assert!(second.results.get(&"A".into()).is_none());
}

#[tokio::test]
async fn busy_flag_spans_the_run() {
    let (gate_tx, gate_rx) = oneshot::channel();
    let (tx, _rx) = mpsc::channel(256);
    let executor = WorkflowExecutor::with_runner(
        GatedRunner {
            gate: Mutex::new(Some(gate_rx)),
        },
        tx,
    );
    let mut store = GraphStore::new(vec![node("A", "a")], vec![]);
    let mut state = executor.subscribe();

    assert!(!executor.is_busy());

    let run = executor.execute(&mut store, &[]);
    let probe = async {
        state.changed().await.unwrap();
        let busy = executor.is_busy();
        gate_tx.send(()).unwrap();
        busy
    };
    let (report, busy_during) = tokio::join!(run, probe);

    assert!(busy_during);
    assert!(report.unwrap().outcomes[0].succeeded());
    assert!(!executor.is_busy());
}

#[tokio::test]
async fn second_trigger_while_running_is_rejected() {
    let (gate_tx, gate_rx) = oneshot::channel();
    let (tx, _rx) = mpsc::channel(256);
    let executor = WorkflowExecutor::with_runner(
        GatedRunner {
            gate: Mutex::new(Some(gate_rx)),
        },
        tx,
    );
    let mut store = GraphStore::new(vec![node("A", "a")], vec![]);
    let mut other = GraphStore::new(vec![node("Z", "z")], vec![]);
    let mut state = executor.subscribe();

    let run = executor.execute(&mut store, &[]);
    let probe = async {
        state.changed().await.unwrap();
        let second = executor.execute(&mut other, &[]).await;
        gate_tx.send(()).unwrap();
        second
    };
    let (first, second) = tokio::join!(run, probe);

    assert!(first.is_ok());
    assert!(matches!(second, Err(EngineError::AlreadyRunning)));
    assert_eq!(other.find_node(&"Z".into()).unwrap().label, "node Z");
}

#[tokio::test]
async fn empty_graph_completes_immediately() {
    let (tx, mut rx) = mpsc::channel(256);
    let executor = WorkflowExecutor::with_runner(ScriptedRunner::new(demo_responder), tx);
    let mut store = GraphStore::default();

    let report = executor.execute(&mut store, &[]).await.unwrap();

    assert!(report.outcomes.is_empty());
    assert!(report.results.is_empty());
    assert!(!executor.is_busy());
    assert!(drain(&mut rx).contains(&ExecutorEvent::WorkflowCompleted(report.run_id)));
}

#[tokio::test]
async fn only_log_lines_are_marked_as_traced() {
    let (tx, mut rx) = mpsc::channel(256);
    let executor = WorkflowExecutor::with_runner(ScriptedRunner::new(demo_responder), tx);
    let mut store = demo_store();
    executor.execute(&mut store, &demo_rules()).await.unwrap();

    let events = drain(&mut rx);
    let (traced, forwarded): (Vec<_>, Vec<_>) = events.iter().partition(|e| e.is_traced());
    assert!(!traced.is_empty());
    assert!(
        traced
            .iter()
            .all(|e| matches!(e, ExecutorEvent::Log(_) | ExecutorEvent::Warning(_)))
    );
    assert!(forwarded.iter().any(|e| matches!(e, ExecutorEvent::NodeCompleted { .. })));
    assert!(forwarded.iter().any(|e| matches!(e, ExecutorEvent::WorkflowCompleted(_))));
}
