//! CLI entrypoint for AI Roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use roundtable_application::{
    CompositeUpdateSink, CredentialStore, MeetingHandle, MeetingRepository, MeetingUpdate,
    MeetingUpdateSink, RunMeetingInput, RunMeetingUseCase, Seat,
};
use roundtable_domain::{BackendId, EvaluationMode, Language, Participant, Topic, TurnOrder};
use roundtable_infrastructure::{
    BackendRegistry, ConfigLoader, FileConfig, FileOutputFormat, JsonFileMeetingStore,
    JsonlMeetingLogger, TomlCredentialStore, resolve_api_key,
};
use roundtable_presentation::{
    Cli, Command, ConsoleFormatter, HistoryCommand, LiveRenderer, OutputFormat, RunArgs,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    if cli.show_config {
        for line in ConfigLoader::config_sources() {
            println!("{line}");
        }
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!("{e}"))?
    };
    config.validate()?;

    if !config.output.color {
        ConsoleFormatter::set_color(false);
    }

    info!("Starting AI Roundtable");

    match cli.command {
        Some(Command::Run(args)) => run_meeting(&config, args).await,
        Some(Command::History(command)) => history(&config, command).await,
        Some(Command::Backends) => {
            print!("{}", ConsoleFormatter::format_backends(&BackendId::ALL));
            Ok(())
        }
        Some(Command::Check { backends }) => check(&config, &backends).await,
        Some(Command::SetKey { backend, key }) => set_key(&config, &backend, &key),
        None => {
            bail!("No command given. Try `ai-roundtable run \"<topic>\"` or `--help`.")
        }
    }
}

/// Stderr logging chosen by `-v`, plus daily files when `--log-dir` is set
fn init_logging(cli: &Cli) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file, guard) = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "ai-roundtable.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    Ok(guard)
}

fn credential_store(config: &FileConfig) -> Option<TomlCredentialStore> {
    config.storage.credentials_path().map(TomlCredentialStore::new)
}

fn history_store(config: &FileConfig) -> Result<JsonFileMeetingStore> {
    let path = config
        .storage
        .history_path()
        .context("no data directory for the meeting history; set storage.history_path")?;
    Ok(JsonFileMeetingStore::new(path, config.storage.max_records))
}

fn parse_backends(names: &[String]) -> Result<Vec<BackendId>> {
    names
        .iter()
        .map(|name| name.parse::<BackendId>().map_err(anyhow::Error::from))
        .collect()
}

/// Seat every requested backend that has a credential
fn resolve_seats(config: &FileConfig, requested: &[BackendId]) -> Result<Vec<Seat>> {
    let store = credential_store(config);
    let registry = BackendRegistry::default();
    let candidates: Vec<BackendId> = if !requested.is_empty() {
        requested.to_vec()
    } else if !config.meeting.backends.is_empty() {
        config.meeting.backends.clone()
    } else {
        BackendId::ALL.to_vec()
    };

    let mut seats = Vec::new();
    for id in candidates {
        if seats.iter().any(|s: &Seat| s.participant.backend() == id) {
            continue;
        }
        let Some(key) = resolve_api_key(
            &config.backends,
            id,
            |name| std::env::var(name).ok(),
            store.as_ref().map(|s| s as &dyn CredentialStore),
        ) else {
            if !requested.is_empty() {
                warn!(backend = %id, "No API key found; skipping");
            }
            continue;
        };
        let settings = config.backends.settings(id, key);
        let participant = Participant::new(id.as_str(), id, settings.model.clone());
        let backend = registry.create(id, settings)?;
        seats.push(Seat::new(participant, backend));
    }
    Ok(seats)
}

async fn run_meeting(config: &FileConfig, args: RunArgs) -> Result<()> {
    let topic = Topic::try_new(&args.topic)?;
    let mut meeting_config = config.meeting.meeting_config(topic);
    if let Some(rounds) = args.rounds {
        meeting_config = meeting_config.with_rounds(rounds);
    }
    if args.no_eval {
        meeting_config = meeting_config.with_evaluation_mode(EvaluationMode::None);
    }
    if args.random {
        meeting_config = meeting_config.with_turn_order(TurnOrder::Random);
    }
    if let Some(lang) = &args.lang {
        meeting_config = meeting_config.with_language(Language::new(lang.as_str()));
    }

    let seats = resolve_seats(config, &parse_backends(&args.backends)?)?;
    if seats.len() < roundtable_domain::MIN_PARTICIPANTS {
        bail!(
            "At least {} backends with API keys are needed, found {}. \
             Set environment variables (e.g. ANTHROPIC_API_KEY) or use `ai-roundtable set-key`.",
            roundtable_domain::MIN_PARTICIPANTS,
            seats.len()
        );
    }

    let (use_case, updates) = RunMeetingUseCase::new(RunMeetingInput::new(meeting_config, seats))?;
    let use_case = use_case.with_behavior(config.behavior());
    let handle = use_case.handle();

    let renderer = LiveRenderer::new(config.output.show_stream && !args.quiet);
    let events = args.events.as_ref().and_then(JsonlMeetingLogger::new);
    let mut sinks: Vec<&dyn MeetingUpdateSink> = vec![&renderer];
    if let Some(events) = &events {
        sinks.push(events);
    }
    let sink = CompositeUpdateSink::new(sinks);

    println!("Commands: pause | resume | stop  (Ctrl-C stops)");
    let controls = tokio::spawn(read_controls(handle.clone()));
    let interrupt = tokio::spawn(stop_on_ctrl_c(handle.clone()));

    let (result, ()) = tokio::join!(use_case.run(), drain(updates, &sink));
    controls.abort();
    interrupt.abort();
    let record = result?;

    match history_store(config) {
        Ok(store) => match store.save(&record).await {
            Ok(()) => info!(id = %record.id, "Meeting saved to history"),
            Err(e) => warn!(error = %e, "Could not save meeting"),
        },
        Err(e) => warn!(error = %e, "History disabled"),
    }

    if let Some(path) = &args.export {
        tokio::fs::write(path, &record.markdown)
            .await
            .with_context(|| format!("writing transcript to {}", path.display()))?;
        println!("Transcript written to {}", path.display());
    }

    let format = args
        .output
        .unwrap_or_else(|| output_format(config.output.format));
    println!("{}", render(&record, format));
    Ok(())
}

fn output_format(format: Option<FileOutputFormat>) -> OutputFormat {
    match format.unwrap_or_default() {
        FileOutputFormat::Full => OutputFormat::Full,
        FileOutputFormat::Summary => OutputFormat::Summary,
        FileOutputFormat::Json => OutputFormat::Json,
    }
}

fn render(record: &roundtable_domain::MeetingRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Full => ConsoleFormatter::format(record),
        OutputFormat::Summary => ConsoleFormatter::format_summary_only(record),
        OutputFormat::Json => ConsoleFormatter::format_json(record),
    }
}

/// Forward updates to the sinks until the completion update arrives
async fn drain(mut updates: UnboundedReceiver<MeetingUpdate>, sink: &dyn MeetingUpdateSink) {
    while let Some(update) = updates.recv().await {
        sink.on_update(&update);
        if update.is_completion() {
            break;
        }
    }
}

/// Map stdin lines onto the meeting handle
async fn read_controls(handle: MeetingHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim().to_ascii_lowercase().as_str() {
            "pause" | "p" => {
                if !handle.pause() {
                    println!("(pause is only possible during the discussion)");
                }
            }
            "resume" | "r" => {
                if !handle.resume() {
                    println!("(the meeting is not paused)");
                }
            }
            "stop" | "s" | "quit" | "q" => {
                handle.stop();
                return;
            }
            "" => {}
            other => println!("(unknown command: {other})"),
        }
    }
}

async fn stop_on_ctrl_c(handle: MeetingHandle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted; stopping the meeting");
        handle.stop();
    }
}

async fn history(config: &FileConfig, command: HistoryCommand) -> Result<()> {
    let store = history_store(config)?;
    match command {
        HistoryCommand::List => {
            print!("{}", ConsoleFormatter::format_history(&store.list_recent().await?));
        }
        HistoryCommand::Show { id, output } => {
            let Some(record) = store.get(&id).await? else {
                bail!("No saved meeting with id {id}");
            };
            println!("{}", render(&record, output));
        }
        HistoryCommand::Delete { id } => {
            if !store.delete(&id).await? {
                bail!("No saved meeting with id {id}");
            }
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn check(config: &FileConfig, names: &[String]) -> Result<()> {
    let requested = parse_backends(names)?;
    let ids = if requested.is_empty() {
        BackendId::ALL.to_vec()
    } else {
        requested
    };
    let store = credential_store(config);
    let registry = BackendRegistry::default();

    let mut results = Vec::new();
    for id in ids {
        let key = resolve_api_key(
            &config.backends,
            id,
            |name| std::env::var(name).ok(),
            store.as_ref().map(|s| s as &dyn CredentialStore),
        );
        let result = match key {
            Some(key) => {
                let backend = registry.create(id, config.backends.settings(id, key))?;
                Some(backend.validate_credential().await)
            }
            None => None,
        };
        results.push((id, result));
    }
    print!("{}", ConsoleFormatter::format_check(&results));
    Ok(())
}

fn set_key(config: &FileConfig, backend: &str, key: &str) -> Result<()> {
    let id: BackendId = backend.parse()?;
    let store = credential_store(config)
        .context("no config directory for credentials; set storage.credentials_path")?;
    store.set(id, key)?;
    println!("Stored key for {} in {}", id.display_name(), store.path().display());
    Ok(())
}
