//! Live feed of a running simulation over HTTP and server-sent events.
//!
//! The run executes on a blocking thread and pushes one frame per round into
//! [`FeedState`]; the handlers only read from it.

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use log::{error, info, warn};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    engine::Engine,
    results::write_run_outputs,
    scenario::Scenario,
    world::{World, WorldSnapshot},
};

const EVENT_BUFFER: usize = 512;

#[derive(Debug, Clone, Serialize)]
pub struct RoundFrame {
    pub snapshot: WorldSnapshot,
    /// Set on the final frame once history is available.
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub total_rounds: u32,
    pub frame: Option<RoundFrame>,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FramesEnvelope {
    pub scenario: String,
    pub total_rounds: u32,
    pub completed: bool,
    pub frames: Vec<RoundFrame>,
}

/// Everything the feed has seen of one run: every frame from round zero on,
/// and the history CSV once the last round is done.
pub struct FeedState {
    scenario_name: String,
    total_rounds: u32,
    frames: Mutex<Vec<RoundFrame>>,
    history_csv: Mutex<Option<Bytes>>,
    completed: AtomicBool,
    events: broadcast::Sender<String>,
}

impl FeedState {
    pub fn new(scenario_name: impl Into<String>, total_rounds: u32) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Arc::new(Self {
            scenario_name: scenario_name.into(),
            total_rounds,
            frames: Mutex::new(Vec::new()),
            history_csv: Mutex::new(None),
            completed: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn latest_frame(&self) -> Option<RoundFrame> {
        self.frames
            .lock()
            .expect("frames lock poisoned")
            .last()
            .cloned()
    }

    fn push_frame(&self, snapshot: WorldSnapshot) {
        let frame = RoundFrame {
            snapshot,
            completed: false,
        };
        self.frames
            .lock()
            .expect("frames lock poisoned")
            .push(frame.clone());
        self.broadcast(&frame);
    }

    /// Stores the history, then re-sends the last frame flagged as completed.
    fn complete(&self, world: &World) {
        *self.history_csv.lock().expect("history lock poisoned") =
            Some(Bytes::from(world.history().to_csv_string()));
        self.completed.store(true, Ordering::SeqCst);

        let last = {
            let mut frames = self.frames.lock().expect("frames lock poisoned");
            frames.last_mut().map(|frame| {
                frame.completed = true;
                frame.clone()
            })
        };
        if let Some(frame) = last {
            self.broadcast(&frame);
        }
    }

    fn broadcast(&self, frame: &RoundFrame) {
        match serde_json::to_string(frame) {
            // No subscribers is fine; late clients read /api/frames.
            Ok(payload) => {
                let _ = self.events.send(payload);
            }
            Err(err) => warn!("dropping round {} frame: {err}", frame.snapshot.round),
        }
    }
}

/// Runs `rounds` rounds on the calling thread, publishing round zero and then
/// every completed round to `state`.
pub fn simulate(
    state: &FeedState,
    engine: &mut Engine,
    world: &mut World,
    rounds: u32,
) -> Result<()> {
    state.push_frame(world.snapshot(&state.scenario_name));
    engine.run_with_hook(world, rounds, |snapshot| state.push_frame(snapshot))?;
    state.complete(world);
    Ok(())
}

pub fn router(state: Arc<FeedState>) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/frames", get(round_frames))
        .route("/api/events", get(event_stream))
        .route("/api/history.csv", get(history_csv))
        .with_state(state)
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub rounds: u32,
    pub snapshot_interval: u32,
    pub snapshot_dir: PathBuf,
    pub results_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

/// Serves the feed while the run executes. The history CSV and manifest are
/// written to `results_dir` as soon as the last round completes.
pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        rounds,
        snapshot_interval,
        snapshot_dir,
        results_dir,
        host,
        port,
    } = config;

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    // Configuration errors surface here, before anything is served.
    let mut world = scenario.build_world()?;
    let mut settings = scenario.engine_settings(snapshot_dir);
    settings.snapshot_interval_rounds = snapshot_interval;
    let mut engine = scenario.build_engine(&world, settings);

    let state = FeedState::new(scenario.name.clone(), rounds);
    let sim_state = state.clone();
    let sim_handle = tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        simulate(&sim_state, &mut engine, &mut world, rounds)?;
        write_run_outputs(&results_dir, &scenario, &world, rounds)
    });

    let scenario_name = state.scenario_name.clone();
    tokio::spawn(async move {
        match sim_handle.await {
            Ok(Ok(out_dir)) => info!(
                "scenario '{scenario_name}' completed, results in {}",
                out_dir.display()
            ),
            Ok(Err(err)) => error!("simulation error: {err:?}"),
            Err(err) => error!("simulation task failed: {err:?}"),
        }
    });

    info!(
        "live feed for '{}' at http://{addr} (Ctrl+C to stop)",
        state.scenario_name
    );
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down live feed");
}

async fn latest_state(State(state): State<Arc<FeedState>>) -> Json<StateEnvelope> {
    Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        total_rounds: state.total_rounds,
        frame: state.latest_frame(),
        completed: state.is_completed(),
    })
}

async fn round_frames(State(state): State<Arc<FeedState>>) -> Json<FramesEnvelope> {
    let frames = state.frames.lock().expect("frames lock poisoned").clone();
    Json(FramesEnvelope {
        scenario: state.scenario_name.clone(),
        total_rounds: state.total_rounds,
        completed: state.is_completed(),
        frames,
    })
}

async fn history_csv(State(state): State<Arc<FeedState>>) -> Response {
    let csv = state
        .history_csv
        .lock()
        .expect("history lock poisoned")
        .clone();
    match csv {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            Body::from(body),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "history is available once the run completes",
        )
            .into_response(),
    }
}

async fn event_stream(
    State(state): State<Arc<FeedState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.subscribe())
        .filter_map(|msg| msg.ok().map(|payload| Ok(Event::default().data(payload))));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(2)))
}
