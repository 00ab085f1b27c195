//! `routerbot` binary.
//!
//! ```bash
//! STUDENT_ID=66070315 WEBEX_TOKEN=... WEBEX_ROOM_ID=... routerbot run
//! routerbot rooms --max 20
//! routerbot once "/66070315 10.0.15.61 gigabit_status"
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use routerbot::config::{BotConfig, Settings};
use routerbot::device::{CliDevice, NetconfClient, RestconfClient};
use routerbot::dispatch::{AllowList, Dispatcher, Reply, Session};
use routerbot::error::GatewayError;
use routerbot::export::{AnsibleRunner, Exporter};
use routerbot::gateway::{Message, MessagingGateway, WebexClient};
use routerbot::Bot;

type LiveDispatcher = Dispatcher<RestconfClient, NetconfClient, CliDevice, AnsibleRunner>;

#[derive(Parser)]
#[command(name = "routerbot", version, about = "Chat-driven router automation bot")]
struct Cli {
    /// TOML configuration file (default: routerbot.toml)
    #[arg(short, long, env = "ROUTERBOT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the room and answer commands (default)
    Run,
    /// List rooms visible to the token
    Rooms {
        #[arg(long, default_value_t = 100)]
        max: u32,
    },
    /// Handle one message and print the reply
    Once {
        /// Message text, e.g. "/66070315 10.0.15.61 status"
        message: String,
        /// Post the reply to the room instead of printing it
        #[arg(long)]
        post: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&settings).await,
        Command::Rooms { max } => rooms(&settings, max).await,
        Command::Once { message, post } => once(&settings, &message, post).await,
    }
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
}

fn dispatcher(config: &BotConfig) -> Result<LiveDispatcher, Box<dyn std::error::Error>> {
    let restconf = RestconfClient::new(
        config.iface.clone(),
        config.credentials.clone(),
        config.restconf_port,
        config.retry,
    )?;
    let netconf = NetconfClient::new(
        config.iface.clone(),
        config.credentials.clone(),
        config.netconf_port,
        config.netconf_timeout,
    );
    let cli = CliDevice::new(config.credentials.clone(), config.ssh_port, config.ssh_timeout);
    let runner = AnsibleRunner::new(
        config.ansible_dir.clone(),
        &config.operator_id,
        &config.router_name,
        config.credentials.clone(),
        config.ansible_timeout,
    );
    let exporter = Exporter::new(runner);

    Ok(Dispatcher::new(
        config.iface.clone(),
        AllowList::new(config.allowed_ips.iter().cloned()),
        restconf,
        netconf,
        cli,
        exporter,
    )
    .with_summary_style(config.summary_style))
}

fn webex(settings: &Settings, require_room: bool) -> Result<WebexClient, Box<dyn std::error::Error>> {
    let webex = settings.webex(require_room)?;
    Ok(WebexClient::new(
        webex.api_url,
        webex.token,
        webex.room_id.unwrap_or_default(),
    )?)
}

async fn run(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let config = settings.bot()?;
    let gateway = webex(settings, true)?;
    info!(
        "routerbot for operator {} in room {}",
        config.operator_id,
        gateway.room_id()
    );

    let mut bot = Bot::new(gateway, dispatcher(&config)?, config.poll_interval);
    tokio::select! {
        _ = bot.run() => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }
    Ok(())
}

async fn rooms(settings: &Settings, max: u32) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = webex(settings, false)?;
    for room in gateway.list_rooms(max).await? {
        println!("{}\t{}\t{}", room.id, room.room_type, room.title);
    }
    Ok(())
}

async fn once(settings: &Settings, message: &str, post: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = settings.bot()?;
    let dispatcher = dispatcher(&config)?;
    let mut session = Session::new();

    let reply = if post {
        let gateway = webex(settings, true)?;
        let reply = dispatcher.dispatch(&mut session, message, &gateway).await?;
        if let Some(Reply::Text(ref text)) = reply {
            gateway.post_text(text).await?;
        }
        reply
    } else {
        dispatcher.dispatch(&mut session, message, &Console).await?
    };

    match reply {
        Some(Reply::Text(text)) if !post => println!("{text}"),
        Some(_) => {}
        None => println!("(not addressed to /{})", config.operator_id),
    }
    Ok(())
}

/// Prints what would be posted. Used by `once` without `--post`.
struct Console;

impl MessagingGateway for Console {
    async fn poll_latest_message(&self) -> Result<Option<Message>, GatewayError> {
        Ok(None)
    }

    async fn post_text(&self, text: &str) -> Result<(), GatewayError> {
        println!("{text}");
        Ok(())
    }

    async fn post_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<(), GatewayError> {
        println!("[{caption}] {filename} ({} bytes)", bytes.len());
        Ok(())
    }
}
