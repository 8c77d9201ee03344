//! ntfy-e2e CLI - publish (optionally encrypted) messages and follow topics.
//!
//! See the `ntfy_e2e` library for the core functionality.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ntfy_e2e::commands::{self, PublishArgs, SubscribeArgs};
use ntfy_e2e::{Config, Priority};

#[derive(Parser)]
#[command(name = "ntfy-e2e")]
#[command(version, about = "Publish end-to-end encrypted messages to ntfy topics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a message, encrypted when a password is set
    Publish(PublishCli),
    /// Print messages published to a topic
    Subscribe(SubscribeCli),
    /// Show the effective configuration, or set KEY to VALUE
    Config {
        key: Option<String>,
        value: Option<String>,
    },
}

#[derive(Args)]
struct PublishCli {
    /// Shared password (falls back to NTFY_PASSWORD)
    #[arg(long, short = 'p')]
    password: Option<String>,
    /// username[:password] for the server (falls back to NTFY_USER)
    #[arg(long, short = 'u')]
    user: Option<String>,
    /// Notification title
    #[arg(long, short = 't')]
    title: Option<String>,
    /// Priority: 1-5, min, low, default, high, max or urgent
    #[arg(long)]
    priority: Option<Priority>,
    /// Comma-separated tags / emoji shortcodes
    #[arg(long, short = 'T')]
    tags: Option<String>,
    /// URL opened when the notification is tapped
    #[arg(long, short = 'U')]
    click: Option<String>,
    /// Deliver later (e.g. 30m, "tomorrow 10am")
    #[arg(long, short = 'D')]
    delay: Option<String>,
    /// Notification icon URL
    #[arg(long)]
    icon: Option<String>,
    /// URL to send as an external attachment
    #[arg(long, short = 'a')]
    attach: Option<String>,
    /// File name for the attachment
    #[arg(long, short = 'n')]
    filename: Option<String>,
    /// Also send to this e-mail address
    #[arg(long, short = 'e')]
    email: Option<String>,
    /// Render the message as Markdown
    #[arg(long)]
    markdown: bool,
    /// Do not cache the message server-side
    #[arg(long, short = 'C')]
    no_cache: bool,
    /// Do not forward the message to Firebase
    #[arg(long, short = 'F')]
    no_firebase: bool,
    /// Topic name, host/topic or full URL
    topic: String,
    /// Message body
    message: String,
}

impl From<PublishCli> for PublishArgs {
    fn from(cli: PublishCli) -> Self {
        Self {
            topic: cli.topic,
            message: cli.message,
            password: cli.password,
            title: cli.title,
            priority: cli.priority,
            tags: cli.tags,
            click: cli.click,
            delay: cli.delay,
            icon: cli.icon,
            attach: cli.attach,
            filename: cli.filename,
            email: cli.email,
            markdown: cli.markdown,
            no_cache: cli.no_cache,
            no_firebase: cli.no_firebase,
            user: cli.user,
        }
    }
}

#[derive(Args)]
struct SubscribeCli {
    /// Print cached messages and exit
    #[arg(long, short = 'p')]
    poll: bool,
    /// Print raw JSON lines
    #[arg(long)]
    raw: bool,
    /// Return messages since a Unix time, duration (10m), message ID or "all"
    #[arg(long, short = 's')]
    since: Option<String>,
    /// Also return scheduled/delayed messages
    #[arg(long, visible_alias = "sched", short = 'S')]
    scheduled: bool,
    /// username[:password] for the server (falls back to NTFY_USER)
    #[arg(long, short = 'u')]
    user: Option<String>,
    /// Topic name, host/topic or full URL
    topic: String,
}

impl From<SubscribeCli> for SubscribeArgs {
    fn from(cli: SubscribeCli) -> Self {
        Self {
            topic: cli.topic,
            poll: cli.poll,
            raw: cli.raw,
            since: cli.since,
            scheduled: cli.scheduled,
            user: cli.user,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Publish(args) => commands::publish(&config, &args.into())?,
        Commands::Subscribe(args) => commands::subscribe(&config, &args.into())?,
        Commands::Config { key, value } => match (key, value) {
            (None, _) => {
                println!("# {}", Config::config_path()?.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
                println!("# password: {}", if config.password.is_some() { "set" } else { "unset" });
                println!("# token: {}", if config.token.is_some() { "set" } else { "unset" });
                println!("# user: {}", if config.user.is_some() { "set" } else { "unset" });
            }
            (Some(key), None) => {
                let value = serde_json::to_value(&config)?;
                match value.get(&key) {
                    Some(v) => println!("{}", v),
                    None => anyhow::bail!("Unknown config key '{}'", key),
                }
            }
            (Some(key), Some(value)) => {
                // Start from the file alone so env overrides are not persisted.
                let path = Config::config_path()?;
                let mut stored = if path.exists() {
                    Config::load_from_file(&path)?
                } else {
                    Config::default()
                };
                stored.set(&key, &value)?;
                stored.save_to(&path)?;
                println!("Saved {} to {}", key, path.display());
            }
        },
    }

    Ok(())
}
