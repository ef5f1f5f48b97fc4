use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};
use time_humanize::{Accuracy, HumanTime, Tense};

use tsq::{
    app::{App, Flow},
    app_dirs::AppDirs,
    config::FileConfigStore,
    history_db::{write_csv, HistoryDb, StoredEntry},
    runtime::{AppEvent, CrosstermEventSource, Runner},
    sequence::{SequenceDefinition, TimerSpec},
    store::{FileKvStore, KeyValueStore, SequenceStore},
    time_format::secs_to_hms_short,
    ui::screen::current_screen,
};

const REDRAW_MS: u64 = 250;

/// compose count-up and count-down timers into sequences and play them back
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal time sequencer: build an ordered list of count-up and count-down timers, repeat it as many times as you like, and follow along in a playback overlay with history and notifications."
)]
pub struct Cli {
    /// stored sequence to open in the composer
    #[clap(short = 'l', long)]
    load: Option<String>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// play a stored sequence right away
    Play {
        name: String,
        /// override the stored number of executions
        #[clap(short = 'e', long)]
        executions: Option<usize>,
    },
    /// list stored sequences
    List,
    /// store a sequence, replacing any with the same name
    Save {
        name: String,
        /// LABEL:up|down:DURATION, e.g. "Work:down:25m"; repeat for each timer
        #[clap(short = 't', long = "timer", required = true)]
        timers: Vec<TimerSpec>,
        /// how many times the timer list runs
        #[clap(short = 'e', long, default_value_t = 1)]
        executions: usize,
    },
    /// delete a stored sequence
    Remove { name: String },
    /// print a stored sequence as JSON
    Show { name: String },
    /// show recorded playback history
    History {
        /// number of entries to show
        #[clap(short = 'n', long, default_value_t = 20)]
        limit: usize,
        /// write the entries to a CSV file instead
        #[clap(long, conflicts_with = "clear")]
        csv: Option<PathBuf>,
        /// delete all recorded history
        #[clap(long)]
        clear: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let mut store = SequenceStore::new(FileKvStore::new());
    let mut stdout = io::stdout();

    match cli.command {
        None => {
            let mut app = build_app();
            if let Some(name) = cli.load.as_deref() {
                if !app.load_stored(name) {
                    let reason = app.notice.take().unwrap_or_default();
                    Cli::command().error(ErrorKind::InvalidValue, reason).exit();
                }
            }
            run_tui(&mut app)
        }
        Some(Command::Play { name, executions }) => {
            let Some(mut definition) = store.sequence(&name) else {
                exit_unknown(&name);
            };
            if let Some(executions) = executions {
                definition.executions = executions;
            }
            let mut app = build_app();
            if let Err(e) = app.composer.load(&name, definition) {
                Cli::command().error(ErrorKind::InvalidValue, e).exit();
            }
            app.play();
            run_tui(&mut app)
        }
        Some(Command::List) => Ok(list_sequences(&store, &mut stdout)?),
        Some(Command::Save {
            name,
            timers,
            executions,
        }) => {
            let definition = SequenceDefinition::new(timers, executions);
            if let Err(e) = definition.validate() {
                Cli::command().error(ErrorKind::InvalidValue, e).exit();
            }
            store.store_sequence(&name, &definition)?;
            info!("stored sequence '{name}' from the command line");
            writeln!(
                stdout,
                "saved '{name}' ({})",
                describe(&definition)
            )?;
            Ok(())
        }
        Some(Command::Remove { name }) => {
            if !store.remove_sequence(&name)? {
                exit_unknown(&name);
            }
            writeln!(stdout, "removed '{name}'")?;
            Ok(())
        }
        Some(Command::Show { name }) => {
            let Some(definition) = store.sequence(&name) else {
                exit_unknown(&name);
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&definition)?)?;
            Ok(())
        }
        Some(Command::History { limit, csv, clear }) => {
            let db = HistoryDb::new()?;
            if clear {
                db.clear_all()?;
                info!("history cleared from the command line");
                writeln!(stdout, "history cleared")?;
                return Ok(());
            }

            let entries = db.recent(limit)?;
            match csv {
                Some(path) => {
                    write_csv(&entries, File::create(&path)?)?;
                    writeln!(
                        stdout,
                        "wrote {} entries to {}",
                        entries.len(),
                        path.display()
                    )?;
                }
                None => print_history(&entries, &mut stdout)?,
            }
            Ok(())
        }
    }
}

fn exit_unknown(name: &str) -> ! {
    Cli::command()
        .error(
            ErrorKind::InvalidValue,
            format!("no stored sequence named '{name}'"),
        )
        .exit()
}

/// The TUI owns the terminal, so log lines go to a file
fn init_logging() {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init();
}

fn build_app() -> App {
    let config = FileConfigStore::new().load_or_init();

    let history_db = match config.record_history {
        true => HistoryDb::new()
            .map_err(|e| warn!("history will not be recorded: {e}"))
            .ok(),
        false => None,
    };
    let backend: Box<dyn KeyValueStore> = Box::new(FileKvStore::new());

    App::new(config, backend, history_db)
}

fn describe(definition: &SequenceDefinition) -> String {
    format!(
        "{}x [{}] ~{}",
        definition.executions,
        definition.timers.iter().map(|t| t.label.as_str()).join(", "),
        secs_to_hms_short(definition.estimated_secs())
    )
}

fn list_sequences<S: KeyValueStore, W: Write>(
    store: &SequenceStore<S>,
    out: &mut W,
) -> io::Result<()> {
    let sequences = store.sequences();
    if sequences.is_empty() {
        return writeln!(out, "no stored sequences");
    }

    let width = sequences.keys().map(|name| name.len()).max().unwrap_or(0);
    for (name, definition) in &sequences {
        writeln!(out, "{name:<width$}  {}", describe(definition))?;
    }
    Ok(())
}

fn print_history<W: Write>(entries: &[StoredEntry], out: &mut W) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "no history recorded yet");
    }

    let now = chrono::Local::now();
    for entry in entries {
        let age = (now - entry.ended_at).num_seconds().max(0);
        let when = HumanTime::from_seconds(age).to_text_en(Accuracy::Rough, Tense::Past);
        writeln!(
            out,
            "{when:<18} {:<16} {:<20} {:<14} {}",
            entry.sequence,
            entry.title,
            entry.progress.as_deref().unwrap_or("-"),
            secs_to_hms_short(entry.duration_secs)
        )?;
    }
    Ok(())
}

fn run_tui(app: &mut App) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend + Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(REDRAW_MS),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step(app.until_player_tick()) {
            AppEvent::Key(key) => {
                if app.on_key(key) == Flow::Quit {
                    break;
                }
            }
            AppEvent::Resize | AppEvent::Tick => {}
        }

        // keys can keep arriving past a due tick; the player catches up here
        app.on_tick();

        if app.take_bell() {
            execute!(terminal.backend_mut(), Print("\x07"))?;
        }
    }

    if app.player.is_some() {
        app.close_overlay();
    }
    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    current_screen(&app.state).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsq::store::MemoryKvStore;

    #[test]
    fn test_cli_defaults_to_composer() {
        let cli = Cli::parse_from(["tsq"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.load, None);

        let cli = Cli::parse_from(["tsq", "--load", "pomodoro"]);
        assert_eq!(cli.load.as_deref(), Some("pomodoro"));
    }

    #[test]
    fn test_cli_save_parses_timers() {
        let cli = Cli::parse_from([
            "tsq", "save", "drill", "-t", "Work:down:25m", "--timer", "Stretch:up:0", "-e", "3",
        ]);
        match cli.command {
            Some(Command::Save {
                name,
                timers,
                executions,
            }) => {
                assert_eq!(name, "drill");
                assert_eq!(
                    timers,
                    vec![
                        TimerSpec::count_down("Work", 1500),
                        TimerSpec::count_up("Stretch")
                    ]
                );
                assert_eq!(executions, 3);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_save_rejects_bad_timer() {
        let result = Cli::try_parse_from(["tsq", "save", "drill", "-t", "Work:sideways:5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_save_requires_a_timer() {
        assert!(Cli::try_parse_from(["tsq", "save", "drill"]).is_err());
    }

    #[test]
    fn test_cli_play_and_history() {
        let cli = Cli::parse_from(["tsq", "play", "drill", "--executions", "4"]);
        assert!(matches!(
            cli.command,
            Some(Command::Play { executions: Some(4), .. })
        ));

        let cli = Cli::parse_from(["tsq", "history"]);
        assert!(matches!(
            cli.command,
            Some(Command::History {
                limit: 20,
                csv: None,
                clear: false
            })
        ));

        let cli = Cli::parse_from(["tsq", "history", "--clear"]);
        assert!(matches!(
            cli.command,
            Some(Command::History { clear: true, .. })
        ));
        assert!(Cli::try_parse_from(["tsq", "history", "--clear", "--csv", "out.csv"]).is_err());
    }

    #[test]
    fn test_list_sequences_output() {
        let mut store = SequenceStore::new(MemoryKvStore::new());
        let mut out = Vec::new();
        list_sequences(&store, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "no stored sequences\n");

        store
            .store_sequence(
                "pomodoro",
                &SequenceDefinition::new(
                    vec![
                        TimerSpec::count_down("Focus", 1500),
                        TimerSpec::count_down("Break", 300),
                    ],
                    2,
                ),
            )
            .unwrap();
        store
            .store_sequence(
                "go",
                &SequenceDefinition::new(vec![TimerSpec::count_up("Run")], 1),
            )
            .unwrap();

        let mut out = Vec::new();
        list_sequences(&store, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "go        1x [Run] ~0s\npomodoro  2x [Focus, Break] ~1h\n"
        );
    }

    #[test]
    fn test_print_history_empty() {
        let mut out = Vec::new();
        print_history(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "no history recorded yet\n");
    }

    #[test]
    fn test_redraw_faster_than_a_tick() {
        assert!(REDRAW_MS < 1000);
    }
}
