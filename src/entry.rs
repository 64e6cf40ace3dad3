use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};
use tracing::error;

use crate::app::{LoadSession, render_banner, render_report};
use crate::args::{DEFAULT_CONFIG_FILES, OutputFormat, TesterArgs};
use crate::config::{LoadSessionConfig, apply_config, load_config};
use crate::error::AppResult;
use crate::shutdown_handlers::{setup_keyboard_shutdown_handler, setup_signal_shutdown_handler};

/// Parses the command line, runs one session, and prints the report.
///
/// # Errors
///
/// Returns an error for invalid arguments or configuration (before any
/// request is sent) and for session failures such as an unreadable URL file.
pub fn run() -> AppResult<()> {
    let Some((mut args, matches)) = parse_args()? else {
        return Ok(());
    };

    merge_config_file(&mut args, &matches)?;
    crate::logger::init_logging(args.verbose, args.no_color);

    let session_config = LoadSessionConfig::from_args(&args).inspect_err(|err| {
        error!("{}", err);
    })?;

    if args.output_format == OutputFormat::Text {
        println!(
            "{}",
            render_banner(
                session_config.duration,
                &session_config.target_label(),
                session_config.concurrency.get()
            )
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_session(session_config, &args))
}

fn parse_args() -> AppResult<Option<(TesterArgs, ArgMatches)>> {
    let mut cmd = TesterArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = TesterArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

fn merge_config_file(args: &mut TesterArgs, matches: &ArgMatches) -> AppResult<()> {
    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(args, matches, &config)?;
    }
    Ok(())
}

async fn run_session(config: LoadSessionConfig, args: &TesterArgs) -> AppResult<()> {
    let show_progress = !args.no_progress && args.output_format == OutputFormat::Text;
    let session = LoadSession::new(config).with_progress(show_progress, args.no_color);
    let stop = session.stop_handle();

    let signal_handle = setup_signal_shutdown_handler(&stop);
    let keyboard_handle = std::io::stdin()
        .is_terminal()
        .then(|| setup_keyboard_shutdown_handler(&stop));

    let outcome = session.start().await;

    // releases the handlers; the report is already final
    session.stop();
    signal_handle.abort();
    if let Some(handle) = keyboard_handle {
        handle.await?;
    }

    let report = outcome.inspect_err(|err| {
        error!("{}", err);
    })?;
    print!("{}", render_report(&report, args.output_format)?);
    Ok(())
}
