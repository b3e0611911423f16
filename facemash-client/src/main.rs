//! facemash - terminal host for the leaderboard and duel screens
//!
//! Resolves configuration, wires the persons repository (backend or a JSON
//! roster file) and runs one screen:
//! - `leaderboard`: print one filtered page with photos loaded
//! - `duel`: interactive pairwise voting on stdin
//! - `prefs`: show or change the stored preference flags

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use facemash_client::duo::{DuoScope, DuoState, DuoVotingSession, PickOutcome, ReloadOutcome};
use facemash_client::events::EventBus;
use facemash_client::filter::Tab;
use facemash_client::imaging::DisplayTarget;
use facemash_client::leaderboard::{LeaderboardScreen, LeaderboardView};
use facemash_client::{HttpPersonsApi, PersonsApi, RequestGateway, StaticPersonsApi};
use facemash_common::config::{ClientConfig, ConfigOverrides};
use facemash_common::preferences::{ClassRange, FilePreferenceStore, PreferenceStore};
use facemash_common::{Gender, Person};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for facemash
#[derive(Parser, Debug)]
#[command(name = "facemash")]
#[command(about = "Leaderboard and pairwise voting client")]
#[command(version)]
struct Args {
    /// Alternative TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Init data credential sent as `Authorization: tma <value>`
    #[arg(long)]
    init_data: Option<String>,

    /// Log level (overrides config; RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,

    /// Serve people from a JSON file instead of the backend
    #[arg(long)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of the leaderboard
    Leaderboard(LeaderboardArgs),
    /// Vote interactively on pairs
    Duel(DuelArgs),
    /// Show or change stored preferences
    Prefs(PrefsArgs),
}

#[derive(ClapArgs, Debug)]
struct LeaderboardArgs {
    #[arg(long, value_enum, default_value_t = TabArg::All)]
    tab: TabArg,

    /// Free-text search over name, surname and class
    #[arg(long, default_value = "")]
    search: String,

    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long)]
    only_with_photo: bool,
}

#[derive(ClapArgs, Debug)]
struct DuelArgs {
    #[arg(long, value_enum)]
    gender: GenderArg,

    /// Only senior classes (9-11); stored as a preference
    #[arg(long, conflicts_with = "junior")]
    senior: bool,

    /// Only junior classes (5-8); stored as a preference
    #[arg(long)]
    junior: bool,

    /// Only people with a real photo; stored as a preference
    #[arg(long)]
    only_with_photo: bool,
}

#[derive(ClapArgs, Debug)]
struct PrefsArgs {
    #[arg(long)]
    only_with_photo: Option<bool>,

    #[arg(long, value_enum)]
    class: Option<ClassArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TabArg {
    All,
    Male,
    Female,
}

impl From<TabArg> for Tab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::All => Tab::All,
            TabArg::Male => Tab::Male,
            TabArg::Female => Tab::Female,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GenderArg {
    Male,
    Female,
}

impl From<GenderArg> for Gender {
    fn from(gender: GenderArg) -> Self {
        match gender {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClassArg {
    All,
    Junior,
    Senior,
}

impl From<ClassArg> for ClassRange {
    fn from(class: ClassArg) -> Self {
        match class {
            ClassArg::All => ClassRange::All,
            ClassArg::Junior => ClassRange::Junior,
            ClassArg::Senior => ClassRange::Senior,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ClientConfig::resolve(ConfigOverrides {
        config_path: args.config.clone(),
        api_base_url: args.api_url.clone(),
        init_data: args.init_data.clone(),
        log_level: args.log_level.clone(),
    })
    .context("Failed to resolve configuration")?;

    // Logs go to stderr so screen output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "facemash={level},facemash_client={level},facemash_common={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting facemash v{}", env!("CARGO_PKG_VERSION"));

    let api = build_api(&args, &config)?;
    let events = Arc::new(EventBus::default());

    match args.command {
        Command::Leaderboard(cmd) => run_leaderboard(cmd, api, events, &config).await,
        Command::Duel(cmd) => run_duel(cmd, api, events, &config).await,
        Command::Prefs(cmd) => run_prefs(cmd, &config),
    }
}

fn build_api(args: &Args, config: &ClientConfig) -> Result<Arc<dyn PersonsApi>> {
    if let Some(path) = &args.fixture {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        let persons: Vec<Person> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid fixture {}", path.display()))?;
        info!(count = persons.len(), path = %path.display(), "Using fixture roster");
        return Ok(Arc::new(StaticPersonsApi::new(persons)));
    }

    let gateway = RequestGateway::from_config(config).context("Failed to create HTTP client")?;
    info!("Backend: {}", gateway.base_url());
    Ok(Arc::new(HttpPersonsApi::new(gateway)))
}

async fn run_leaderboard(
    cmd: LeaderboardArgs,
    api: Arc<dyn PersonsApi>,
    events: Arc<EventBus>,
    config: &ClientConfig,
) -> Result<()> {
    let avatar = DisplayTarget::LeaderboardAvatar.photo_size(config.device_pixel_ratio);
    let mut screen = LeaderboardScreen::new(api, events, avatar);

    screen.mount().await.context("Failed to load roster")?;
    screen.set_tab(cmd.tab.into());
    screen.set_search(cmd.search);
    screen.set_page(cmd.page);

    // The roster carries no photos, so the photo filter can only see what
    // has been fetched: load the unfiltered page first
    if cmd.only_with_photo {
        screen.load_visible_photos().await;
        screen.set_only_with_photo(true);
        screen.set_page(cmd.page);
    }

    let report = screen.load_visible_photos().await;
    if report.failed > 0 {
        warn!(failed = report.failed, "Some photos could not be loaded");
    }

    print_leaderboard(&screen.view());
    screen.dispose();
    Ok(())
}

fn print_leaderboard(view: &LeaderboardView) {
    if view.rows.is_empty() {
        println!("Nobody found");
    }
    for row in &view.rows {
        let medal = row.medal.map(|m| m.as_str()).unwrap_or("");
        println!(
            "{:>4} {:<6} {:<32} {:<6} {:>8.1}  [{}]",
            row.rank,
            medal,
            row.display_name,
            row.school_class,
            row.rating,
            row.photo.kind()
        );
    }
    println!(
        "page {}/{} ({} total)",
        view.page, view.total_pages, view.total_results
    );
}

async fn run_duel(
    cmd: DuelArgs,
    api: Arc<dyn PersonsApi>,
    events: Arc<EventBus>,
    config: &ClientConfig,
) -> Result<()> {
    let store = Arc::new(
        FilePreferenceStore::open(&config.preferences_path)
            .context("Failed to open preference store")?,
    );

    let mut preferences = store.preferences();
    if cmd.only_with_photo {
        preferences.only_with_photo = true;
    }
    if cmd.senior {
        preferences.class_range = ClassRange::Senior;
    } else if cmd.junior {
        preferences.class_range = ClassRange::Junior;
    }
    store.save(&preferences).context("Failed to store preferences")?;

    let photo_size = DisplayTarget::DuoCard {
        viewport_width: config.viewport_width,
    }
    .photo_size(config.device_pixel_ratio);
    let scope = DuoScope::new(cmd.gender.into(), photo_size).with_preferences(&preferences);
    let session = Arc::new(DuoVotingSession::new(
        api,
        events,
        scope,
        config.vote_timeout,
    ));

    let cancel = CancellationToken::new();
    let follower = tokio::spawn(
        Arc::clone(&session).follow_preferences(store.subscribe(), cancel.clone()),
    );

    if let Err(e) = session.reload().await {
        println!("Could not load a pair: {} (press r to retry)", e);
    }
    print_duo(&session.state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match line.trim() {
            "q" => break,
            "r" => match session.reload().await {
                Ok(ReloadOutcome::Loaded) => {}
                Ok(ReloadOutcome::Ignored) => println!("Still busy, reload ignored"),
                Err(e) => println!("Could not load a pair: {}", e),
            },
            choice @ ("1" | "2") => {
                let Some(pair) = session.state().pair().cloned() else {
                    println!("No pair yet, press r to retry");
                    continue;
                };
                let picked = if choice == "1" { pair.left().id } else { pair.right().id };
                match session.pick(picked).await {
                    PickOutcome::Ignored => println!("Still busy, pick ignored"),
                    PickOutcome::Accepted { refill, .. } => {
                        println!("Vote counted");
                        if let Err(e) = refill {
                            println!("Could not load the next pair: {} (press r to retry)", e);
                        }
                    }
                    PickOutcome::Rejected { error, .. } => {
                        println!("Vote failed: {}", error);
                    }
                }
            }
            "" => continue,
            other => {
                println!("Unknown command '{}': use 1, 2, r or q", other);
                continue;
            }
        }
        print_duo(&session.state());
    }

    cancel.cancel();
    follower.await.context("Preference follower panicked")?;
    info!("Duel finished");
    Ok(())
}

fn print_duo(state: &DuoState) {
    match state.pair() {
        None => println!("(no pair)"),
        Some(pair) => {
            for (key, person) in [("1", pair.left()), ("2", pair.right())] {
                println!(
                    "[{}] {} ({}) rating {:.1}, photo: {}",
                    key,
                    person.full_name(),
                    person.school_class,
                    person.rating,
                    person.photo.kind()
                );
            }
        }
    }
}

fn run_prefs(cmd: PrefsArgs, config: &ClientConfig) -> Result<()> {
    let store = FilePreferenceStore::open(&config.preferences_path)
        .context("Failed to open preference store")?;

    let mut preferences = store.preferences();
    if cmd.only_with_photo.is_none() && cmd.class.is_none() {
        println!("only_with_photo = {}", preferences.only_with_photo);
        println!("class = {:?}", preferences.class_range);
        return Ok(());
    }

    if let Some(only_with_photo) = cmd.only_with_photo {
        preferences.only_with_photo = only_with_photo;
    }
    if let Some(class) = cmd.class {
        preferences.class_range = class.into();
    }
    store.save(&preferences).context("Failed to store preferences")?;
    info!(path = %store.path().display(), "Preferences saved");
    Ok(())
}
