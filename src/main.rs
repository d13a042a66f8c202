mod ai_client;
mod app;
mod config;
mod db;
mod error;
mod history_store;
mod models;
mod plan_service;
mod plan_store;
mod timer;

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::ai_client::GeminiClient;
use crate::app::{AlwaysConfirm, AppController, Confirm, SessionState};
use crate::config::AppConfig;
use crate::db::Database;
use crate::history_store::HistoryStore;
use crate::models::{Block, Level, Plan};
use crate::plan_service::PlanService;
use crate::plan_store::PlanStore;
use crate::timer::{ExerciseTimer, Ticker};

#[derive(Parser)]
#[command(name = "fuerza-activa", about = "Rutinas de fuerza para mujeres 50+")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current plan, fetching one if none is cached
    Show,
    /// Switch difficulty level (1-3) and fetch a fresh plan
    Level { level: u8 },
    /// Replace the current plan with a newly generated one
    Regenerate {
        #[arg(long)]
        yes: bool,
    },
    /// Run today's routine interactively with countdown timers
    Run,
    /// Mark today as completed
    Complete,
    /// Show the completion history, newest first
    History,
    /// Erase the saved plan and history, then start over at level 1
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

/// Asks the yes/no question on stdin.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [s/N] ");
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "s" | "si" | "sí" | "y" | "yes")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;

    let client = GeminiClient::new(&config.gemini_api_key, &config.gemini_model)
        .context("the plan generator is not available")?;
    let service =
        PlanService::new(Arc::new(client)).with_debug_prompt(config.fitness_debug_prompt);
    let plan_store = PlanStore::new(Database::open(&config.database_url)?);
    let history_store = HistoryStore::new(Database::open(&config.database_url)?);
    let mut app = AppController::new(plan_store, history_store, service);

    match cli.command {
        Command::Show => {
            app.startup().await;
            render_session(&app);
        }
        Command::Level { level } => {
            let level = Level::from_number(level)
                .context("level must be 1 (iniciación), 2 (medio) or 3 (avanzado)")?;
            app.startup().await;
            app.change_level(level).await;
            render_session(&app);
        }
        Command::Regenerate { yes } => {
            app.startup().await;
            let proceeded = if yes {
                app.regenerate(&AlwaysConfirm).await
            } else {
                app.regenerate(&StdinConfirm).await
            };
            if proceeded {
                render_session(&app);
            } else {
                println!("Plan sin cambios.");
            }
        }
        Command::Run => {
            app.startup().await;
            match app.plan().cloned() {
                Some(plan) => run_routine(&plan).await,
                None => render_session(&app),
            }
        }
        Command::Complete => {
            app.startup().await;
            if app.is_today_completed() {
                println!("El día de hoy ya estaba registrado.");
            } else {
                app.complete_today();
                println!("¡Entrenamiento de hoy registrado! ({})", app.level());
            }
        }
        Command::History => {
            app.startup().await;
            let history = app.history();
            if history.is_empty() {
                println!("Aún no has completado ningún entrenamiento. ¡A por ello!");
            } else {
                for entry in history {
                    println!("{}  {}", entry.date, entry.level);
                }
            }
        }
        Command::Clear { yes } => {
            let proceeded = if yes {
                app.clear_all(&AlwaysConfirm).await?
            } else {
                app.clear_all(&StdinConfirm).await?
            };
            if proceeded {
                render_session(&app);
            } else {
                println!("No se ha borrado nada.");
            }
        }
    }

    Ok(())
}

fn render_session(app: &AppController) {
    match app.state() {
        SessionState::Ready => {
            if let Some(plan) = app.plan() {
                println!("Nivel actual: {}\n", app.level());
                for block in &plan.blocks {
                    render_block(block);
                }
                if app.is_today_completed() {
                    println!("Hoy ya está completado. ¡Bien hecho!");
                }
            }
        }
        SessionState::Failed(message) => {
            eprintln!("No se pudo generar el plan de ejercicios: {message}");
            eprintln!("Por favor, inténtalo de nuevo más tarde.");
        }
        SessionState::Initializing | SessionState::Loading => {}
    }
}

fn render_block(block: &Block) {
    println!("=== {} ===", block.title);
    println!("\"{}\"", block.motivational_phrase);
    for exercise in &block.exercises {
        println!("  - {} ({})", exercise.name, exercise.duration);
        println!("    {}", exercise.description);
    }
    println!();
}

/// Walks the plan block by block, running a countdown for every
/// countdown-capable exercise and showing rep-based ones as plain text.
async fn run_routine(plan: &Plan) {
    for block in &plan.blocks {
        println!("=== {} ===", block.title);
        println!("\"{}\"\n", block.motivational_phrase);
        for exercise in &block.exercises {
            println!("{}: {}", exercise.name, exercise.description);
            match ExerciseTimer::from_exercise(exercise) {
                Some(timer) => run_countdown(timer).await,
                None => println!("  {}", exercise.duration),
            }
            println!();
        }
    }
    println!("¡Rutina terminada!");
}

async fn run_countdown(mut timer: ExerciseTimer) {
    println!("  {} segundos:", timer.total_seconds());
    timer.toggle();
    let mut ticker = Ticker::every_second();
    // completion stops the clock, so running doubles as the loop guard
    while timer.is_running() {
        print!("\r  {:>3} s  ({:.0}%)", timer.remaining_seconds(), timer.progress_percent());
        let _ = std::io::stdout().flush();
        ticker.tick().await;
        timer.tick();
    }
    if timer.is_completed() {
        println!("\r  ¡Completado!        ");
    }
    // dropping the ticker cancels the interval task
}
