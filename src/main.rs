use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use keyseal::cli::commands;
use keyseal::cli::commands::add::AddArgs;
use keyseal::cli::{Cli, Commands};

/// Env var holding the log filter (e.g. `keyseal=debug`).
const LOG_ENV: &str = "KEYSEAL_LOG";

/// Log to stderr so stdout stays clean for secrets and envelopes.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(filter)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Register => commands::register::execute(&cli),
        Commands::Login => commands::login::execute(&cli),
        Commands::Add {
            ref site,
            ref account,
            ref secret,
            generate,
            length,
            ref notes,
            ref category,
            favorite,
        } => commands::add::execute(
            &cli,
            AddArgs {
                site,
                account,
                secret: secret.as_deref(),
                generate,
                length,
                notes: notes.as_deref(),
                category: category.as_deref(),
                favorite,
            },
        ),
        Commands::List { show, json } => commands::list::execute(&cli, show, json),
        Commands::Get { id } => commands::get::execute(&cli, id),
        Commands::Update {
            id,
            ref site,
            ref account,
            ref secret,
            ref notes,
            ref category,
            favorite,
        } => commands::update::execute(
            &cli,
            id,
            commands::update::from_flags(
                site.as_deref(),
                account.as_deref(),
                secret.as_deref(),
                notes.as_deref(),
                category.as_deref(),
                favorite,
            ),
        ),
        Commands::Delete { id, force } => commands::delete::execute(&cli, id, force),
        Commands::Passwd => commands::passwd::execute(&cli),
        Commands::Generate { length, no_symbols } => commands::generate::execute(length, no_symbols),
        Commands::Keygen {
            ref name,
            ref curve,
            encrypt,
        } => commands::keygen::execute(&cli, name, curve.as_deref(), encrypt),
        Commands::Send {
            ref key,
            ref to,
            ref message,
        } => commands::send::execute(&cli, key, to, message.as_deref()),
        Commands::Receive {
            ref key,
            ref from,
            ref envelope,
        } => commands::receive::execute(&cli, key, from, envelope.as_deref()),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "command failed");
        keyseal::cli::output::error(&e.user_message());
        std::process::exit(1);
    }
}
