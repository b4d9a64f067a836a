use std::{error::Error, path::PathBuf, process, sync::Arc};

use clap::{command, Parser, ValueHint};
use log::{debug, error, info, LevelFilter};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

use profile_viewer::{
    auth::AuthStore,
    config::Config,
    handoff::Handoff,
    navigation::Location,
    render::{Button, Page},
    storage::FileStorage,
    ui::ProfileController,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Server to use when neither the command line nor a configuration file
/// names one.
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    ///
    /// TOML file overriding the server URL, routes, storage key, handoff
    /// cookie name and storage file.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Identity server URL
    ///
    /// [default: http://localhost:8080]
    #[arg(short, long, value_hint = ValueHint::Url, env = "PROFILE_VIEWER_BASE_URL")]
    base_url: Option<String>,

    /// Session storage file
    ///
    /// Ensure that this file is kept secure and not shared publicly, as it
    /// contains the bearer token of your session.
    ///
    /// [default: session.toml]
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    storage_file: Option<PathBuf>,

    /// Cookie handed off by the login flow
    ///
    /// For example `temp_token=abc123`. May be given more than once.
    #[arg(long, value_name = "COOKIE")]
    cookie: Vec<String>,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module("profile_viewer", level);
    }

    logger.init();
}

/// Builds the configuration: defaults, then the configuration file, then
/// the command line.
fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    let mut config = Config::new(Url::parse(DEFAULT_BASE_URL)?)?;

    if let Some(ref path) = args.config {
        config = config.merge_file(path)?;
    }

    if let Some(ref base_url) = args.base_url {
        config.base_url = Url::parse(base_url)?;
    }

    if let Some(ref storage_file) = args.storage_file {
        config.storage_file.clone_from(storage_file);
    }

    config.validate()?;
    Ok(config)
}

/// Prints what the page shows, or where it went.
///
/// Returns `false` once the page has navigated away.
fn show(controller: &ProfileController, location: &Location) -> bool {
    let page = controller.page();

    for alert in page.take_alerts() {
        eprintln!("! {alert}");
    }

    if let Some(url) = location.redirected_to() {
        println!("Please sign in at {url}");
        return false;
    }

    if page.is_rendered() {
        println!("{page}");
    }

    true
}

/// Main application loop.
///
/// Boots the session, renders the profile and then maps commands read from
/// standard input to the page's buttons until the user quits, logs out or
/// the session is rejected.
///
/// # Errors
///
/// Returns an error when the configuration is invalid or the session cannot
/// be booted.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;
    debug!("storage file: {}", config.storage_file.display());

    let storage = Arc::new(FileStorage::new(config.storage_file.clone()));
    let location = Arc::new(Location::new());

    let handoff = Handoff::with_empty_jar(config.base_url.clone(), &config.handoff_cookie);
    for cookie in &args.cookie {
        handoff.deposit(cookie)?;
    }

    let auth = AuthStore::new(&config, storage, location.clone(), handoff)?;
    if !auth.init()? {
        println!("Please sign in at {}", auth.login_url());
        return Ok(());
    }

    let page = Arc::new(Page::new());
    let controller = ProfileController::new(&config, auth, page)?;

    controller.init().await;
    if !show(&controller, &location) {
        return Ok(());
    }

    info!("commands: [r]efresh, [l]ogout, [q]uit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            // Prioritize shutdown signals.
            biased;

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down gracefully");
                break Ok(());
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break Ok(());
                };

                match line.trim() {
                    "r" | "refresh" => controller.click(Button::Refresh).await,
                    "l" | "logout" => controller.click(Button::Logout).await,
                    "q" | "quit" => break Ok(()),
                    "" => continue,
                    other => {
                        info!("unknown command \"{other}\"; commands: [r]efresh, [l]ogout, [q]uit");
                        continue;
                    }
                }

                if !show(&controller, &location) {
                    break Ok(());
                }
            }
        }
    }
}

/// Main entry point of the application.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}
