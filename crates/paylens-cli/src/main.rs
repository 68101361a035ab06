use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use paylens_client::BackendClient;
use paylens_core::Dictionary;
use paylens_proxy::ProxyConfig;
use paylens_proxy::config::{BACKEND_URL_ENV, DEFAULT_LISTEN, PUBLIC_BACKEND_URL_ENV};
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "paylens", about = "Payroll compliance analysis: laws, rules and reports")]
#[command(version)]
struct Cli {
    /// Base URL of the PayLens proxy
    #[arg(long, env = "PAYLENS_API_URL", default_value = "http://127.0.0.1:3000")]
    api_url: String,

    /// Locale dictionary (JSON); English when omitted
    #[arg(long, env = "PAYLENS_DICTIONARY")]
    dictionary: Option<PathBuf>,

    /// Session cookie sent with every request
    #[arg(long, env = "PAYLENS_COOKIE")]
    cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the same-origin proxy in front of the analysis backend
    Serve {
        /// Address to listen on
        #[arg(long, env = "PAYLENS_LISTEN", default_value = DEFAULT_LISTEN)]
        listen: SocketAddr,
        /// Server-side backend URL
        #[arg(long, env = BACKEND_URL_ENV)]
        backend_url: Option<String>,
        /// Public backend URL, used when no server-side URL is set
        #[arg(long, env = PUBLIC_BACKEND_URL_ENV)]
        public_backend_url: Option<String>,
    },
    /// Manage the law collection
    Laws {
        #[command(subcommand)]
        command: commands::LawCommand,
    },
    /// Manage compliance rules
    Rules {
        #[command(subcommand)]
        command: commands::RuleCommand,
    },
    /// List stored analysis reports
    History,
    /// Summarise a stored report
    Summarise {
        /// Report id from `paylens history`
        report_id: String,
    },
    /// Ask a question about a stored report
    Ask {
        report_id: String,
        question: String,
    },
    /// Suggest dynamic parameters and formulas for a law description
    Suggest {
        description: String,
    },
    /// List the sections dynamic parameters may refer to
    Sections,
    /// Download analysis data as a spreadsheet
    Export {
        /// JSON file with the export selection; `-` for stdin
        #[arg(long)]
        selection: PathBuf,
        /// Output file; defaults to the name the server suggests
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Check a manually entered employee record before submission
    Entry {
        /// JSON file with one employee's payslips, attendance and contract
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("paylens v{}", env!("CARGO_PKG_VERSION"));

    let dict = match &cli.dictionary {
        Some(path) => Dictionary::load(path)
            .with_context(|| format!("loading dictionary {}", path.display()))?,
        None => Dictionary::english(),
    };

    let mut client = BackendClient::new(cli.api_url.clone());
    if let Some(cookie) = cli.cookie.clone() {
        client = client.with_cookie(cookie);
    }

    match cli.command {
        Command::Serve {
            listen,
            backend_url,
            public_backend_url,
        } => {
            let config = ProxyConfig::resolve(backend_url, public_backend_url, listen)?;
            eprintln!(
                "Proxying http://{} -> {}",
                config.listen, config.backend_url
            );
            paylens_proxy::serve(config).await?;
            Ok(())
        }
        Command::Laws { command } => commands::laws(client, dict, command).await,
        Command::Rules { command } => commands::rules(client, dict, command).await,
        Command::History => commands::history(&client, &dict).await,
        Command::Summarise { report_id } => commands::summarise(&client, &dict, &report_id).await,
        Command::Ask {
            report_id,
            question,
        } => commands::ask(&client, &dict, &report_id, &question).await,
        Command::Suggest { description } => commands::suggest(&client, &dict, &description).await,
        Command::Sections => commands::sections(&client, &dict).await,
        Command::Export { selection, out } => {
            commands::export(&client, &dict, &selection, out.as_deref()).await
        }
        Command::Entry { file } => commands::entry(&file),
    }
}
