//! fairchain: entry point for playing and checking provably-fair rounds.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use fairchain_protocol::{MessageShape, ProtocolConfig};
use fairchain_utils::{init_logging, LogFormat};
use fairchain_vrf::DerivationMode;

#[derive(Parser)]
#[command(name = "fairchain", about = "Hash-chain commitments with BLS-verified round outcomes")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "FAIRCHAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "FAIRCHAIN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json". Logs go to stderr.
    #[arg(long, env = "FAIRCHAIN_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Play sessions against an in-process signer.
    Run(RunArgs),

    /// Verify a BLS signature.
    Verify {
        /// Compressed G2 signature, hex.
        #[arg(long)]
        signature: String,
        /// Signed message, hex (or UTF-8 with --text).
        #[arg(long)]
        message: String,
        /// Compressed G1 public key, hex.
        #[arg(long)]
        public_key: String,
        /// Treat --message as UTF-8 text.
        #[arg(long)]
        text: bool,
    },

    /// Compute the multiplier a signature yields.
    Derive {
        /// Compressed G2 signature, hex.
        #[arg(long)]
        signature: String,
        /// The following seed in play order (needed by hmac-with-next-seed).
        #[arg(long)]
        next_seed: Option<String>,
        #[command(flatten)]
        settings: SessionArgs,
    },

    /// Print a hash chain in play order.
    Chain {
        /// Chain root, hex.
        #[arg(long)]
        root: String,
        #[arg(long, default_value_t = 10)]
        length: usize,
    },

    /// Re-verify a JSON-lines transcript written by `run --format json`.
    ///
    /// Each session is checked under the settings in its start record; the
    /// flags below only apply to sessions that have none.
    Audit {
        /// Transcript file; `-` reads stdin.
        transcript: PathBuf,
        #[command(flatten)]
        settings: SessionArgs,
    },

    /// Print the effective configuration as TOML.
    Config {
        #[command(flatten)]
        settings: SessionArgs,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Independent sessions to play in parallel.
    #[arg(long, default_value_t = 1, env = "FAIRCHAIN_SESSIONS")]
    sessions: usize,

    /// Output format for the transcript on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(flatten)]
    settings: SessionArgs,
}

/// Session settings shared by every subcommand that plays or rechecks rounds.
#[derive(clap::Args)]
struct SessionArgs {
    /// Seeds per chain.
    #[arg(long, env = "FAIRCHAIN_CHAIN_LENGTH")]
    chain_length: Option<usize>,

    /// Player seed mixed into every round message.
    #[arg(long, env = "FAIRCHAIN_CLIENT_SEED")]
    client_seed: Option<String>,

    /// Round message shape.
    #[arg(long, value_enum, env = "FAIRCHAIN_MESSAGE_SHAPE")]
    shape: Option<ShapeArg>,

    /// How a signature becomes an outcome.
    #[arg(long, value_enum, env = "FAIRCHAIN_DERIVATION")]
    derivation: Option<DerivationArg>,

    /// Fraction kept by the house, in [0, 1).
    #[arg(long, env = "FAIRCHAIN_HOUSE_EDGE")]
    house_edge: Option<f64>,
}

impl SessionArgs {
    fn apply(&self, config: &mut ProtocolConfig) {
        if let Some(length) = self.chain_length {
            config.chain_length = length;
        }
        if let Some(client_seed) = &self.client_seed {
            config.message.client_seed = Some(client_seed.clone());
        }
        if let Some(shape) = self.shape {
            config.message.shape = shape.into();
        }
        if let Some(derivation) = self.derivation {
            config.outcome.derivation = derivation.into();
        }
        if let Some(edge) = self.house_edge {
            config.outcome.house_edge = edge;
        }
    }
}

impl Command {
    fn settings(&self) -> Option<&SessionArgs> {
        match self {
            Command::Run(args) => Some(&args.settings),
            Command::Derive { settings, .. }
            | Command::Audit { settings, .. }
            | Command::Config { settings } => Some(settings),
            Command::Verify { .. } | Command::Chain { .. } => None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ShapeArg {
    Commitment,
    Contribution,
}

#[derive(Clone, Copy, ValueEnum)]
enum DerivationArg {
    HmacWithNextSeed,
    HashOfSignature,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

impl From<ShapeArg> for MessageShape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Commitment => MessageShape::Commitment,
            ShapeArg::Contribution => MessageShape::Contribution,
        }
    }
}

impl From<DerivationArg> for DerivationMode {
    fn from(arg: DerivationArg) -> Self {
        match arg {
            DerivationArg::HmacWithNextSeed => DerivationMode::HmacWithNextSeed,
            DerivationArg::HashOfSignature => DerivationMode::HashOfSignature,
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ProtocolConfig> {
    let mut config = match &cli.config {
        Some(path) => ProtocolConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ProtocolConfig::default(),
    };

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }

    if let Some(settings) = cli.command.settings() {
        settings.apply(&mut config);
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let format: LogFormat = config
        .log_format
        .parse()
        .map_err(anyhow::Error::msg)?;
    init_logging(format, &config.log_level).map_err(anyhow::Error::msg)?;

    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Run(args) => {
            config.validate().context("invalid configuration")?;
            commands::run(&config, args.sessions, args.format)
        }
        Command::Verify {
            signature,
            message,
            public_key,
            text,
        } => commands::verify(&signature, &message, &public_key, text),
        Command::Derive {
            signature,
            next_seed,
            ..
        } => commands::derive(&config, &signature, next_seed.as_deref()),
        Command::Chain { root, length } => commands::chain(&root, length),
        Command::Audit { transcript, .. } => commands::audit(&config, &transcript),
        Command::Config { .. } => {
            print!("{}", config.to_toml_string());
            Ok(())
        }
    }
}
