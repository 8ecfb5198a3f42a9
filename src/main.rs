use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use perfect_archive::api::{build_router, cors_layer, state::AppState};
use perfect_archive::calculate::GameResult;
use perfect_archive::config::AppConfig;
use perfect_archive::ingest;
use perfect_archive::models::{GameId, Metric, StatisticsSnapshot};
use perfect_archive::storage::{GameStore, StorageConfig};

#[derive(Parser)]
#[command(name = "perfect-archive")]
#[command(about = "Game show statistics archive")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error; overrides config)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Submit a game from a JSON file
    Submit {
        /// Path to the submission JSON
        file: PathBuf,

        /// Recorded as the submitter
        #[arg(long)]
        submitted_by: Option<String>,
    },

    /// Recompute statistics from every stored game
    RebuildStats,

    /// Show the cached statistics
    Stats {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored games, newest first
    ListGames,

    /// Show one game with its outcome
    ShowGame { id: String },

    /// Delete a game and its players
    DeleteGame { id: String },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {:?}", cli.config))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.validate()?;

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting perfect-archive v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::new(StorageConfig::new(config.data_dir.clone()));

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let cors = cors_layer(&config.server.cors_origin)
                .with_context(|| format!("invalid cors_origin {:?}", config.server.cors_origin))?;
            let app = build_router(state).layer(cors);
            let addr = config.server.bind_addr();
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Submit { file, submitted_by } => {
            let body = std::fs::read(&file).with_context(|| format!("reading {:?}", file))?;
            let game = ingest::submit(state.games.as_ref(), &state.cache, &body, submitted_by)?;
            println!(
                "Stored game {} ({} episode {}, {} players)",
                game.id,
                game.air_date,
                game.episode_number,
                game.players.len()
            );
        }
        Commands::RebuildStats => match state.cache.rebuild(state.games.as_ref())? {
            Some(snapshot) => println!(
                "Rebuilt statistics over {} games through {}",
                snapshot.data.totals.games, snapshot.through_game
            ),
            None => println!("No games stored; statistics cleared"),
        },
        Commands::Stats { json } => match state.cache.current()? {
            Some(snapshot) if json => {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            Some(snapshot) => print_statistics(&snapshot),
            None => println!("No statistics available. Submit a game or run rebuild-stats."),
        },
        Commands::ListGames => {
            let games = state.games.list_games()?;
            println!("=== Games ({}) ===", games.len());
            for game in &games {
                let result = GameResult::from_game(game);
                let winners: Vec<&str> = result
                    .players
                    .iter()
                    .filter(|p| p.is_winner)
                    .map(|p| p.player.name.as_str())
                    .collect();
                println!(
                    "{}  {} ep {}  {:<30} winner: {}",
                    game.id,
                    game.air_date,
                    game.episode_number,
                    game.episode_title.as_deref().unwrap_or("-"),
                    if winners.is_empty() {
                        "-".to_string()
                    } else {
                        winners.join(", ")
                    }
                );
            }
        }
        Commands::ShowGame { id } => {
            let Some(game) = state.games.get_game(&GameId::from(id.as_str()))? else {
                bail!("Game '{}' not found", id);
            };
            println!("{}", serde_json::to_string_pretty(&GameResult::from_game(&game))?);
        }
        Commands::DeleteGame { id } => {
            if !ingest::remove_game(state.games.as_ref(), &state.cache, &GameId::from(id.as_str()))? {
                bail!("Game '{}' not found", id);
            }
            println!("Deleted game {}", id);
        }
    }

    Ok(())
}

fn color_of(metric: &Metric) -> &'static str {
    metric.rating.map(|r| r.color()).unwrap_or("-")
}

fn print_statistics(snapshot: &StatisticsSnapshot) {
    let data = &snapshot.data;
    println!("=== Statistics ===");
    println!("Updated: {}", snapshot.updated_at);
    println!(
        "Games: {}  Players: {}  Fast line games: {}",
        data.totals.games, data.totals.players, data.totals.fast_line_games
    );

    println!();
    println!("=== Turn Order ===");
    for turn in &data.turn_performance {
        println!(
            "Turn {}: {:>5.1}% ({}/{})",
            turn.turn, turn.pct, turn.correct, turn.attempts
        );
    }

    println!();
    println!("=== Podiums ===");
    for podium in &data.advancement_stats {
        println!(
            "Podium {}: advanced {:>5.1}% {:<6}  won {:>5.1}% {:<6}  avg score {:>7.1} {}",
            podium.podium,
            podium.advanced_pct.value,
            color_of(&podium.advanced_pct),
            podium.won_pct.value,
            color_of(&podium.won_pct),
            podium.avg_score.value,
            color_of(&podium.avg_score)
        );
    }

    println!();
    println!("=== Comebacks ===");
    println!(
        "{} ({:.1}% of fast line games), avg deficit {:.1}, max {}",
        data.come_from_behind.count,
        data.come_from_behind.pct,
        data.come_from_behind.avg_diff,
        data.come_from_behind.max_diff
    );

    println!();
    println!("=== Top Winnings ===");
    for (rank, entry) in data.leaderboard.iter().take(10).enumerate() {
        println!(
            "{:>2}. {:<24} {:>8}  ({} ep {})",
            rank + 1,
            entry.name,
            entry.total_winnings,
            entry.game.air_date,
            entry.game.episode_number
        );
    }
}
