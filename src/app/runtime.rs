use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, IsTerminal, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use access_checker_core::session::cookies::load_cookie_file;
use access_checker_core::{
    CheckerRegistry, HttpSession, Pipeline, PipelineStats, ProxySession, Session,
    build_default_checker_registry,
};
use anyhow::{Context, Result};
use clap::Parser;
use reqwest::cookie::Jar;
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{config, exit, progress, terminal};
use crate::cli::Args;

pub(crate) async fn run_checker() -> Result<ProcessExit> {
    let args = Args::parse();

    let no_color = terminal::is_no_color_requested(args.no_color);
    terminal::init_tracing(terminal::default_log_level(args.verbose, args.quiet), no_color);
    debug!(?args, "CLI arguments parsed");

    let registry = build_default_checker_registry()?;
    if args.list_providers {
        print_providers(&registry)?;
        return Ok(ProcessExit::Success);
    }

    let file_config = config::load_default_file_config()?;
    let settings = config::resolve_settings(&args, file_config.as_ref())?;
    let entry = registry.lookup(&settings.provider)?.clone();
    info!(
        provider = entry.key(),
        description = entry.description(),
        "Access checker starting"
    );

    let cookie_jar = match settings.cookies.as_deref() {
        Some(path) => load_cookie_file(path)?,
        None => Arc::new(Jar::default()),
    };
    let session =
        HttpSession::with_cookie_jar(cookie_jar)?.with_navigation_timeout(settings.timeout);

    let mut options = settings.options;
    options.resume = appends_to_existing_rows(settings.append, settings.output.as_deref());
    if options.resume {
        info!("Appending to existing output; header row will not be repeated");
    }

    let input = open_input(settings.input.as_deref())?;
    let output = open_output(settings.output.as_deref(), settings.append)?;

    let interrupt = Arc::new(AtomicBool::new(false));
    spawn_interrupt_listener(Arc::clone(&interrupt));

    let checked = Arc::new(AtomicUsize::new(0));
    let use_spinner = terminal::should_use_spinner(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let (spinner, stop_spinner) =
        progress::spawn_progress_ui(use_spinner, Arc::clone(&checked), entry.key().to_string());

    let pipeline = Pipeline::new(entry, options)
        .with_interrupt(interrupt)
        .with_progress(checked);
    let outcome = match settings.proxy {
        Some(login) => {
            info!(user = login.credentials().username(), "Proxy login enabled");
            let mut session = ProxySession::new(session, login);
            let outcome = run_pipeline(&pipeline, input, output, &mut session).await;
            debug!(logins = session.login_count(), "Proxy session finished");
            outcome
        }
        None => {
            let mut session = session;
            run_pipeline(&pipeline, input, output, &mut session).await
        }
    };

    progress::stop_progress_ui(spinner, &stop_spinner).await;

    let stats = outcome?;
    log_summary(&stats);
    Ok(exit::determine_exit_outcome(&stats))
}

async fn run_pipeline(
    pipeline: &Pipeline,
    input: Box<dyn Read>,
    output: Box<dyn Write>,
    session: &mut dyn Session,
) -> Result<PipelineStats> {
    let stats = pipeline.run(input, output, session).await?;
    Ok(stats)
}

fn print_providers(registry: &CheckerRegistry) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for (key, description) in registry.list_all() {
        writeln!(stdout, "{key}\t{description}")?;
    }
    Ok(())
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file '{}'", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            if io::stdin().is_terminal() {
                warn!("Reading rows from the terminal; pipe a file or pass an input path");
            }
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

fn open_output(path: Option<&Path>, append: bool) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdout().lock()));
    };
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("Failed to open output file '{}'", path.display()))?;
    Ok(Box::new(file))
}

/// True when `--append` targets an output file that already holds rows.
fn appends_to_existing_rows(append: bool, output: Option<&Path>) -> bool {
    append
        && output
            .and_then(|path| std::fs::metadata(path).ok())
            .is_some_and(|metadata| metadata.len() > 0)
}

/// First Ctrl-C stops after the current row; a second one exits immediately.
fn spawn_interrupt_listener(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received; finishing the current row (press Ctrl-C again to abort)");
        flag.store(true, Ordering::SeqCst);

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(i32::from(ProcessExit::Interrupted.code()));
        }
    });
}

fn log_summary(stats: &PipelineStats) {
    if stats.interrupted {
        warn!(
            last_line = ?stats.last_line,
            "Run interrupted; resume by feeding the input after the last line"
        );
    }
    info!(
        checked = stats.checked,
        success = stats.success,
        error = stats.error,
        no_access = stats.no_access,
        "Check complete"
    );
}
