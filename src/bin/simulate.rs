use chrono::{SecondsFormat, Utc};
use clap::Parser;
use maze_chase_engine::config::EngineConfig;
use maze_chase_engine::constants::{DEFAULT_LAYOUT, TICK_RATE, TILE_SIZE};
use maze_chase_engine::engine::autopilot;
use maze_chase_engine::engine::{GameEngine, GameEngineOptions};
use maze_chase_engine::level::Level;
use maze_chase_engine::types::{Direction, GamePhase, PelletKind, RuntimeEvent, Snapshot};
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless maze-chase session runner")]
struct Cli {
    /// Tick budget for the whole run.
    #[arg(long, default_value_t = 20_000)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u32>,
    /// Layout file, one row per line. Defaults to the built-in stage.
    #[arg(long)]
    level: Option<PathBuf>,
    #[arg(long, default_value_t = TILE_SIZE)]
    tile_size: f64,
    /// JSON tuning overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 3)]
    max_levels: u32,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize)]
struct RunStats {
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    seed: u32,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    ticks: u64,
    #[serde(rename = "tickRate")]
    tick_rate: u32,
    #[serde(rename = "simulatedSeconds")]
    simulated_seconds: f64,
    #[serde(rename = "finalPhase")]
    final_phase: GamePhase,
    score: u32,
    lives: u32,
    level: u32,
    stats: RunStats,
    anomalies: Vec<String>,
}

struct SessionRun {
    final_snapshot: Snapshot,
    stats: RunStats,
    anomaly_records: Vec<AnomalyRecord>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let started_at = timestamp();

    let config = match cli.config.as_deref() {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!(path = %path.display(), %err, "config load failed");
                return ExitCode::from(2);
            }
        },
        None => EngineConfig::default(),
    };

    let level = match cli.level.as_deref() {
        Some(path) => Level::load(path, cli.tile_size),
        None => Level::parse(&DEFAULT_LAYOUT, cli.tile_size),
    };
    let engine = level.and_then(|level| {
        GameEngine::new(
            level,
            GameEngineOptions {
                seed,
                config,
                ..GameEngineOptions::default()
            },
        )
    });
    let engine = match engine {
        Ok(engine) => engine,
        Err(err) => {
            error!(%err, "level load failed");
            return ExitCode::from(2);
        }
    };

    info!(seed, ticks = cli.ticks, max_levels = cli.max_levels, "run started");
    let run = run_session(engine, cli.ticks, cli.max_levels);
    for anomaly in &run.anomaly_records {
        warn!(tick = anomaly.tick, message = %anomaly.message, "anomaly detected");
    }

    let summary = build_run_summary(seed, started_at, timestamp(), &run);
    match serde_json::to_string(&summary) {
        Ok(line) => println!("{line}"),
        Err(err) => {
            error!(%err, "summary serialization failed");
            return ExitCode::from(2);
        }
    }

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(err) = write_summary(path, &summary) {
            error!(path = %path.display(), %err, "summary write failed");
            return ExitCode::from(2);
        }
    }

    info!(
        score = summary.score,
        phase = ?summary.final_phase,
        anomalies = summary.anomalies.len(),
        "run finished"
    );
    if summary.anomalies.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_session(mut engine: GameEngine, tick_budget: u64, max_levels: u32) -> SessionRun {
    let mut stats = RunStats::default();
    let mut anomaly_records = Vec::new();
    let mut last_pellets = engine.level().remaining_pellets();

    for _ in 0..tick_budget {
        let dir = autopilot::choose_direction(engine.level(), engine.player());
        if dir != Direction::None {
            engine.queue_player_direction(dir);
        }
        engine.step();

        for message in collect_anomalies(&engine, last_pellets) {
            anomaly_records.push(AnomalyRecord {
                tick: engine.tick(),
                message,
            });
        }
        last_pellets = engine.level().remaining_pellets();

        let snapshot = engine.build_snapshot(true);
        tally_events(&mut stats, &snapshot.events);

        match engine.phase() {
            GamePhase::GameOver => break,
            GamePhase::Cleared => {
                if engine.level_number() >= max_levels {
                    break;
                }
                engine.advance_level();
                last_pellets = engine.level().remaining_pellets();
            }
            GamePhase::Ready | GamePhase::Playing => {}
        }
    }

    SessionRun {
        final_snapshot: engine.build_snapshot(true),
        stats,
        anomaly_records,
    }
}

fn tally_events(stats: &mut RunStats, events: &[RuntimeEvent]) {
    for event in events {
        match event {
            RuntimeEvent::PelletEaten {
                kind: PelletKind::Power,
                ..
            } => stats.power_pellets_eaten += 1,
            RuntimeEvent::PelletEaten { .. } => stats.pellets_eaten += 1,
            RuntimeEvent::GhostEaten { .. } => stats.ghosts_eaten += 1,
            RuntimeEvent::LifeLost { .. } => stats.lives_lost += 1,
            RuntimeEvent::LevelCleared { .. } => stats.levels_cleared += 1,
            RuntimeEvent::PowerStarted { .. } | RuntimeEvent::GameOver { .. } => {}
        }
    }
}

fn collect_anomalies(engine: &GameEngine, last_pellets: usize) -> Vec<String> {
    let mut anomalies = Vec::new();
    let level = engine.level();
    let player = engine.player();
    if level.collides(player.x(), player.y(), player.size()) {
        anomalies.push(format!("player inside wall at {:?}", player.position()));
    }
    for (idx, ghost) in engine.ghosts().iter().enumerate() {
        let (x, y) = ghost.position();
        if level.collides(x, y, ghost.size()) {
            anomalies.push(format!("ghost {idx} inside wall at ({x}, {y})"));
        }
    }
    if level.remaining_pellets() > last_pellets {
        anomalies.push(format!(
            "pellet count increased: {last_pellets} -> {}",
            level.remaining_pellets()
        ));
    }
    anomalies
}

fn build_run_summary(
    seed: u32,
    started_at: String,
    finished_at: String,
    run: &SessionRun,
) -> RunSummary {
    let mut seen = HashSet::new();
    let anomalies = run
        .anomaly_records
        .iter()
        .filter(|record| seen.insert(record.message.clone()))
        .map(|record| record.message.clone())
        .collect();
    let snapshot = &run.final_snapshot;
    RunSummary {
        seed,
        started_at,
        finished_at,
        ticks: snapshot.tick,
        tick_rate: TICK_RATE,
        simulated_seconds: snapshot.tick as f64 / f64::from(TICK_RATE),
        final_phase: snapshot.phase,
        score: snapshot.score,
        lives: snapshot.lives,
        level: snapshot.level,
        stats: run.stats.clone(),
        anomalies,
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_engine(seed: u32) -> GameEngine {
        let mut config = EngineConfig::default();
        config.session.ready_delay_ticks = 0;
        GameEngine::with_default_level(GameEngineOptions {
            seed,
            config,
            ..GameEngineOptions::default()
        })
        .expect("default level")
    }

    #[test]
    fn autopilot_session_runs_without_anomalies() {
        for seed in 0..3u32 {
            let run = run_session(quick_engine(seed), 5_000, 2);
            assert!(
                run.anomaly_records.is_empty(),
                "seed={seed} anomalies={:?}",
                run.anomaly_records
            );
            assert!(run.stats.pellets_eaten > 0);
            assert!(run.final_snapshot.score >= run.stats.pellets_eaten * 10);
        }
    }

    #[test]
    fn summary_reports_simulated_time() {
        let run = run_session(quick_engine(5), 120, 1);
        let summary = build_run_summary(5, timestamp(), timestamp(), &run);
        assert!(summary.ticks > 0 && summary.ticks <= 120);
        assert!((summary.simulated_seconds - summary.ticks as f64 / 60.0).abs() < 1e-9);
        let json = serde_json::to_value(&summary).expect("summary serializes");
        assert_eq!(json["tickRate"], 60);
        assert!(json["simulatedSeconds"].is_f64());
    }

    #[test]
    fn tally_counts_each_event_kind() {
        let mut stats = RunStats::default();
        tally_events(
            &mut stats,
            &[
                RuntimeEvent::PelletEaten {
                    kind: PelletKind::Small,
                    col: 1,
                    row: 1,
                },
                RuntimeEvent::PelletEaten {
                    kind: PelletKind::Power,
                    col: 1,
                    row: 2,
                },
                RuntimeEvent::PowerStarted { duration_ticks: 600 },
                RuntimeEvent::GhostEaten { ghost: 0, score: 200 },
                RuntimeEvent::LifeLost { lives_left: 2 },
                RuntimeEvent::LevelCleared { level: 1 },
            ],
        );
        assert_eq!(stats.pellets_eaten, 1);
        assert_eq!(stats.power_pellets_eaten, 1);
        assert_eq!(stats.ghosts_eaten, 1);
        assert_eq!(stats.lives_lost, 1);
        assert_eq!(stats.levels_cleared, 1);
    }

    #[test]
    fn summary_deduplicates_anomaly_messages() {
        let mut engine = quick_engine(1);
        let run = SessionRun {
            final_snapshot: engine.build_snapshot(false),
            stats: RunStats::default(),
            anomaly_records: vec![
                AnomalyRecord {
                    tick: 10,
                    message: "same anomaly".to_string(),
                },
                AnomalyRecord {
                    tick: 11,
                    message: "same anomaly".to_string(),
                },
            ],
        };
        let summary = build_run_summary(1, "a".to_string(), "b".to_string(), &run);
        assert_eq!(summary.anomalies, vec!["same anomaly".to_string()]);
        assert_eq!(summary.final_phase, GamePhase::Ready);
        assert_eq!(summary.tick_rate, 60);
        assert_eq!(summary.simulated_seconds, 0.0);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let mut engine = quick_engine(2);
        let run = SessionRun {
            final_snapshot: engine.build_snapshot(false),
            stats: RunStats::default(),
            anomaly_records: Vec::new(),
        };
        let summary = build_run_summary(2, timestamp(), timestamp(), &run);
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{}", Utc::now().timestamp_millis()))
            .join("summary.json");
        assert!(write_summary(&target, &summary).is_err());
    }
}
