mod app;
mod config;
mod logging;
mod persistence;
mod terminal;

use std::path::PathBuf;

use batchsync_core::TranslateOptions;
use clap::{Args, Parser, Subcommand};
use sync_logging::sync_info;

use crate::app::Action;
use crate::config::AppConfig;
use crate::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "batchsync")]
#[command(version = "0.1.0")]
#[command(about = "Submit batch image translations and follow their progress")]
struct Cli {
    /// Where log output goes
    #[arg(long, value_name = "DEST", value_enum, default_value = "terminal")]
    log: LogDestination,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow one batch until it finishes
    Watch {
        job_id: String,
    },
    /// Show all batches, newest first
    Jobs {
        /// Keep polling until every batch has finished
        #[arg(long)]
        follow: bool,
    },
    /// Upload images as a new batch
    Submit {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
        /// Target language code; repeat for several
        #[arg(long = "lang", required = true, value_name = "CODE")]
        languages: Vec<String>,
        #[command(flatten)]
        options: OptionArgs,
        /// Return right after the batch is accepted
        #[arg(long)]
        no_watch: bool,
    },
    /// Translate a single image right away
    Translate {
        file: PathBuf,
        #[arg(long = "lang", value_name = "CODE")]
        language: String,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Single translations and batches, newest first
    History,
    /// Cancel a batch
    Cancel {
        job_id: String,
    },
    /// Retry one failed image of a batch
    Retry {
        job_id: String,
        image_id: String,
    },
}

#[derive(Args, Debug)]
struct OptionArgs {
    /// Source language code, detected when omitted
    #[arg(long = "source", value_name = "CODE")]
    source_language: Option<String>,
    /// Text the translator should leave untouched
    #[arg(long, value_name = "TEXT")]
    exclude_text: Option<String>,
    /// URL the server calls when the batch finishes
    #[arg(long, value_name = "URL")]
    webhook_url: Option<String>,
}

impl From<OptionArgs> for TranslateOptions {
    fn from(args: OptionArgs) -> Self {
        TranslateOptions {
            source_language: args.source_language,
            exclude_text: args.exclude_text,
            webhook_url: args.webhook_url,
        }
    }
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        match command {
            Command::Watch { job_id } => Action::Watch { job_id },
            Command::Jobs { follow } => Action::Jobs { follow },
            Command::Submit {
                files,
                languages,
                options,
                no_watch,
            } => Action::Submit {
                files,
                languages,
                options: options.into(),
                watch: !no_watch,
            },
            Command::Translate {
                file,
                language,
                options,
            } => Action::Translate {
                file,
                language,
                options: options.into(),
            },
            Command::History => Action::History,
            Command::Cancel { job_id } => Action::Cancel { job_id },
            Command::Retry { job_id, image_id } => Action::Retry {
                job_id,
                item_id: image_id,
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, AppConfig::log_level_from_env());

    let config = AppConfig::from_env()?;
    sync_info!(
        "batchsync starting against {} ({:?})",
        config.settings.base_url,
        config.environment
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run(config, cli.command.into()))
}
