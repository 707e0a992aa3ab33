use anyhow::{Context, Result};
use clap::Parser;
use scriptflow_core::DiagramEvent;
use scriptflow_core::seed::{demo_rules, demo_store};
use scriptflow_engine::{ExecutorEvent, ExecutorState, Session, WorkflowExecutor};
use scriptflow_runner::RunnerConfig;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "scriptflow",
    about = "Run the demo script workflow against a remote script runner"
)]
struct Args {
    /// Base URL of the script runner.
    #[arg(long, env = "SCRIPTFLOW_RUNNER_URL", default_value = "http://localhost:8000")]
    runner_url: String,

    #[arg(long, env = "SCRIPTFLOW_EXECUTE_PATH", default_value = "/execute")]
    execute_path: String,

    #[arg(long, env = "SCRIPTFLOW_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory for the JSON log files. Defaults to `./logs`.
    #[arg(long, env = "SCRIPTFLOW_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            base_url: self.runner_url.clone(),
            execute_path: self.execute_path.clone(),
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("logs")
        })
    }
}

fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("scriptflow")
        .filename_suffix("txt")
        .build(log_dir)
        .context("Failed to create log file appender")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_filter = EnvFilter::new("trace");

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(console_filter))
        .with(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(file_filter),
        )
        .init();

    Ok(guard)
}

fn report_event(event: ExecutorEvent) {
    match event {
        ExecutorEvent::RunStarted(run_id) => info!(%run_id, "Run started"),
        ExecutorEvent::StateChanged(state) => {
            let busy = state == ExecutorState::Running;
            info!(busy, "Executor state changed")
        }
        ExecutorEvent::Log(_) | ExecutorEvent::Warning(_) => {}
        ExecutorEvent::NodeStarted(node_id) => info!(%node_id, "Node started"),
        ExecutorEvent::NodeCompleted { node_id, label, .. } => {
            info!(%node_id, %label, "Node completed")
        }
        ExecutorEvent::NodeFailed { node_id, error } => {
            error!(%node_id, %error, "Node failed")
        }
        ExecutorEvent::WorkflowCompleted(run_id) => info!(%run_id, "Workflow completed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_logging(&args.log_dir())?;

    let config = args.runner_config();
    info!("Using script runner at {}", config.endpoint());

    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<ExecutorEvent>(256);
    let forwarder = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !event.is_traced() {
                report_event(event);
            }
        }
    });

    let mut session = Session::new(
        demo_store(),
        demo_rules(),
        WorkflowExecutor::new(config, event_tx),
    );

    let report = session
        .dispatch(DiagramEvent::Execute)
        .await?
        .context("Execute trigger did not start a run")?;

    for node in session.store().nodes() {
        println!("{}: {}", node.id, node.label);
    }

    if report.failed_count() > 0 {
        warn!(
            "{} of {} node(s) failed",
            report.failed_count(),
            report.outcomes.len()
        );
    }

    // Closing the session drops the event sender and ends the forwarder.
    drop(session);
    forwarder.await.context("Event forwarder panicked")?;

    Ok(())
}
