//! Overland navigation TUI.
//!
//! A terminal front end for the wayfare navigation rules: a party
//! roster, the shared chat transcript, the scene toolbar, and the
//! navigation form as a modal overlay.
//!
//! ```bash
//! cargo run -p wayfare -- --gm --flags camp-flags.json
//! ```

mod app;
mod events;
mod ui;

use crossterm::{
    event, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wayfare_core::{
    sample_party, ActionExecutor, ChatLog, ChatMessage, DiceResolver, JsonFlagStore, Party,
    SavedParty, Settings, Transcript, UsageStore, UserRole,
};

use app::App;
use events::{handle_event, Command, EventResult};
use ui::render::render;

/// Command line options, parsed by hand
struct CliOptions {
    gm: bool,
    party_path: Option<PathBuf>,
    flags_path: PathBuf,
}

impl CliOptions {
    fn from_args(args: &[String]) -> Self {
        let mut options = CliOptions {
            gm: false,
            party_path: None,
            flags_path: PathBuf::from("wayfare-flags.json"),
        };

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--gm" => options.gm = true,
                "--party" => options.party_path = iter.next().map(PathBuf::from),
                "--flags" => {
                    if let Some(path) = iter.next() {
                        options.flags_path = PathBuf::from(path);
                    }
                }
                _ => {}
            }
        }

        options
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Log to stderr; stdout belongs to the terminal UI
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wayfare=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Check for --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let options = CliOptions::from_args(&args);

    let (party, settings) = match load_party(&options).await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: could not load party file: {e}");
            std::process::exit(1);
        }
    };

    let role = if options.gm {
        UserRole::GameMaster
    } else {
        UserRole::Player
    };

    let flag_store = Arc::new(JsonFlagStore::new(&options.flags_path));
    let usage = Arc::new(UsageStore::with_system_clock(flag_store));
    let transcript = Arc::new(Transcript::new());
    let executor = Arc::new(ActionExecutor::new(
        usage.clone(),
        Arc::new(DiceResolver),
        transcript.clone(),
    ));

    tracing::info!(
        party = %party.name,
        gm = options.gm,
        flags = %options.flags_path.display(),
        "wayfare starting"
    );

    let app = App::new(party, settings, role, usage, executor, transcript);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

/// Load the party file, or fall back to the sample party.
async fn load_party(options: &CliOptions) -> Result<(Party, Settings), wayfare_core::PartyError> {
    match &options.party_path {
        Some(path) => {
            let saved = SavedParty::load_json(path).await?;
            Ok((saved.party, saved.settings))
        }
        None => Ok((sample_party(), Settings::default())),
    }
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    // Seed the transcript so the first render is not empty
    let today = app.usage.today();
    app.transcript
        .post(ChatMessage::content("Wayfare", format!("Travel day {today}.")))
        .await
        .ok();
    app.refresh_transcript().await;

    loop {
        // Render
        terminal.draw(|f| render(f, &app))?;

        // Poll for events; the timeout keeps the date display current
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;

            match handle_event(&mut app, ev) {
                EventResult::Quit => {
                    return Ok(());
                }
                EventResult::Command(command) => {
                    run_command(&mut app, command).await;
                }
                EventResult::NeedsRedraw | EventResult::Continue => {
                    // Just continue the loop
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Run deferred work from a keypress on the async runtime.
async fn run_command(app: &mut App, command: Command) {
    match command {
        Command::OpenForm => app.press_navigation().await,
        Command::InvokeRule(index) => app.invoke_rule(index).await,
        Command::ResetAll => app.reset_all().await,
        Command::CloseForm => app.close_form(),
    }
}

fn print_help() {
    println!("Wayfare - overland navigation rules at the table");
    println!();
    println!("USAGE:");
    println!("  wayfare [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help       Show this help message");
    println!("  --gm             Run as the GM (opens the navigation form, can reset)");
    println!("  --party <PATH>   Load a saved party file (default: built-in sample party)");
    println!("  --flags <PATH>   Usage flag file (default: wayfare-flags.json)");
    println!();
    println!("KEYS:");
    println!("  j/k or arrows    Select a traveler in the roster");
    println!("  n                Press the Navigation toolbar button");
    println!("  1-6              Use a navigation rule (inside the form)");
    println!("  r                Reset daily uses for the whole party (GM only)");
    println!("  Esc              Close the form");
    println!("  q                Quit");
    println!();
    println!("EXAMPLES:");
    println!("  wayfare --gm                           # GM view with the sample party");
    println!("  wayfare --gm --party camp.json         # GM view with a saved party");
    println!("  wayfare                                # Player view (form stays closed)");
}
