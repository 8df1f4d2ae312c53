use std::ffi::OsStr;
use std::path::Path;

use clap::Parser;
use colored::{control::set_override, Colorize};
use is_terminal::IsTerminal;

use schedcache::audit::init_logging;
use schedcache::cli::args::{Cli, Commands, CompletionsArgs};
use schedcache::cli::commands;
use schedcache::config::{current_user, Config};
use schedcache::error::{Result, SchedCacheError};
use schedcache::exec::emulate;
use schedcache::scheduler::CommandKind;

fn main() {
    let mut args = std::env::args_os();
    let argv0 = args.next().unwrap_or_default();

    // Installed as bjobs/bhist: behave exactly like the real command
    if let Some(kind) = CommandKind::from_invocation(&argv0) {
        let code = match emulate(kind, args.collect()) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("schedcache: {}", e);
                e.exit_code()
            }
        };
        std::process::exit(code);
    }

    if !is_admin_name(&argv0) {
        let e = SchedCacheError::UnknownInvocation(argv0.to_string_lossy().into_owned());
        eprintln!("schedcache: {}", e);
        std::process::exit(e.exit_code());
    }

    // Respect NO_COLOR environment variable (https://no-color.org/)
    // Also disable colors when stdout is not a terminal (for piping)
    if std::env::var("NO_COLOR").is_ok() || !std::io::stdout().is_terminal() {
        set_override(false);
    }

    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

fn is_admin_name(argv0: &OsStr) -> bool {
    Path::new(argv0)
        .file_stem()
        .map(|stem| stem.to_string_lossy().starts_with("schedcache"))
        .unwrap_or(false)
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let format = cli.output;

    let mut config = match &cli.command {
        // No config needed
        Commands::Completions(CompletionsArgs { shell }) => {
            Cli::print_completions(*shell);
            return Ok(0);
        }
        // Same path as an installed bjobs/bhist
        Commands::Query(args) => return emulate(args.command, args.args.clone()),
        _ => Config::load()?,
    };

    let user = current_user();
    init_logging(&config, &user);

    let output = match &cli.command {
        Commands::Cache(args) => commands::cache(&config, &user, args, format)?,
        Commands::Watch(args) => commands::watch(&config, &user, args, format)?,
        Commands::Config(args) => commands::config(&mut config, args, format)?,
        Commands::Completions(_) | Commands::Query(_) => unreachable!(), // Handled above
    };

    if !output.is_empty() {
        println!("{output}");
    }

    Ok(0)
}
