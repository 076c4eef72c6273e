use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use stitch::client::{Gateway, HttpGateway, Orchestrator, PipelineState, Rejected};
use stitch::config::Config;
use stitch::server::{self, AppState as ServerState};
use stitch::titles::TitleStore;
use stitch::tui::{self, state::AppState, state::FeedStatus, TuiCommand};
use stitch::upstream::HttpUpstream;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

type SharedState = Arc<watch::Sender<AppState>>;

#[tokio::main]
async fn main() -> Result<()> {
    let browse = std::env::args().any(|arg| arg == "--browse");

    let config = Config::load(Path::new("config.toml"))?;

    // Load saved keys from .env (real env vars take precedence)
    Config::load_env_file();

    if browse {
        run_browser(config).await
    } else {
        run_server(config).await
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

async fn run_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("stitch=info"))
        .init();

    let titles = TitleStore::load(&config.server.titles_path)?;
    tracing::info!(
        path = %titles.path().display(),
        count = titles.book().len(),
        "title corrections loaded"
    );

    let upstream = HttpUpstream::new(&config.upstream, Config::twitch_client_id())?;
    let state = ServerState::new(Arc::new(upstream), titles, config.server.static_dir.clone());
    server::serve(&config.server.bind_addr(), state).await
}

async fn run_browser(config: Config) -> Result<()> {
    // The terminal belongs to the TUI, so tracing goes to a file.
    let log_file = std::fs::File::create("stitch.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("stitch=warn"))
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::new(&config.client)?);
    // Corrections load in the wake task; a failure lands in the status line.
    let orchestrator = Arc::new(Orchestrator::new(gateway, &config.client));

    let (state_tx, state_rx) = watch::channel(AppState::new());
    let state_tx: SharedState = Arc::new(state_tx);
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TuiCommand>(16);

    // Mirror every pipeline transition into the TUI snapshot.
    let mut pipeline_rx = orchestrator.subscribe();
    let mirror = state_tx.clone();
    tokio::spawn(async move {
        while pipeline_rx.changed().await.is_ok() {
            let pipeline = pipeline_rx.borrow_and_update().clone();
            mirror.send_modify(|s| s.pipeline = pipeline);
        }
    });

    spawn_wake(orchestrator.clone(), state_tx.clone());

    let controller = {
        let orchestrator = orchestrator.clone();
        let state_tx = state_tx.clone();
        tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                match cmd {
                    TuiCommand::Quit => return,
                    TuiCommand::Reload => spawn_wake(orchestrator.clone(), state_tx.clone()),
                    TuiCommand::Select(index) => {
                        let orchestrator = orchestrator.clone();
                        let state_tx = state_tx.clone();
                        tokio::spawn(async move {
                            let outcome = orchestrator.select_review(index).await;
                            report(&orchestrator, &state_tx, outcome);
                        });
                    }
                    TuiCommand::SubmitCorrection(title) => {
                        let orchestrator = orchestrator.clone();
                        let state_tx = state_tx.clone();
                        tokio::spawn(async move {
                            let outcome = orchestrator.submit_correction(&title).await;
                            report(&orchestrator, &state_tx, outcome);
                        });
                    }
                    TuiCommand::CancelCorrection => {
                        orchestrator.cancel_correction();
                    }
                }
            }
        })
    };

    tui::run_tui(state_rx, cmd_tx).await?;
    controller.abort();
    Ok(())
}

fn spawn_wake(orchestrator: Arc<Orchestrator>, state_tx: SharedState) {
    state_tx.send_modify(|s| s.feed = FeedStatus::Loading);
    tokio::spawn(async move {
        if let Err(e) = orchestrator.ensure_corrections().await {
            state_tx.send_modify(|s| {
                s.push_log("ERROR", format!("title corrections not loaded: {}", e));
                s.feed = FeedStatus::Failed(e.to_string());
            });
            return;
        }
        match orchestrator.wake().await {
            Ok(entries) => state_tx.send_modify(|s| {
                s.push_log("INFO", format!("loaded {} reviews", entries.len()));
                s.reviews = entries;
                s.feed = FeedStatus::Ready;
            }),
            Err(e) => state_tx.send_modify(|s| {
                s.push_log("ERROR", e.to_string());
                s.feed = FeedStatus::Failed(e.to_string());
            }),
        }
    });
}

/// Log the end of a run and pick up any renamed review titles.
fn report(
    orchestrator: &Orchestrator,
    state_tx: &SharedState,
    outcome: Result<PipelineState, Rejected>,
) {
    let reviews = orchestrator.reviews();
    state_tx.send_modify(|s| {
        s.reviews = reviews;
        match outcome {
            Ok(PipelineState::Done(report)) => s.push_log(
                "INFO",
                format!(
                    "{} (app {}): {} | metacritic {} | {} streams",
                    report.title,
                    report.app_id,
                    report.cost(),
                    report.metacritic(),
                    report.streams.len()
                ),
            ),
            Ok(PipelineState::AwaitingManualCorrection { searched_title, .. }) => {
                s.push_log("WARN", format!("no match for \"{}\"", searched_title))
            }
            Ok(PipelineState::Error { stage, message }) => {
                s.push_log("ERROR", format!("{}: {}", stage.label(), message))
            }
            Ok(_) => {}
            Err(rejected) => s.push_log("WARN", rejected.to_string()),
        }
    });
}
