//! House price server entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use house_price::{example_form, Predictor, MODEL_COLUMNS};
use house_price_server::config::{resolve_model_path, ConfigOverrides, ServerConfig};

#[derive(Parser)]
#[command(
    name = "house-price-server",
    about = "Three-page web form that estimates house prices with a pre-trained model",
    version
)]
struct Cli {
    /// Path to the ONNX price model.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the estimator form over HTTP (default).
    Serve {
        /// Listen address (host:port). Also reads HOUSE_PRICE_ADDR.
        #[arg(long)]
        addr: Option<String>,

        /// Idle seconds before a form session expires.
        #[arg(long)]
        session_ttl_secs: Option<u64>,

        /// Maximum number of concurrent form sessions.
        #[arg(long)]
        max_sessions: Option<usize>,
    },

    /// Load the model and run a probe prediction.
    Validate,

    /// Print the form schema and model column order as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   house-price-server completions bash > ~/.local/share/bash-completion/completions/house-price-server
    ///   house-price-server completions zsh > ~/.zfunc/_house-price-server
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        addr: None,
        session_ttl_secs: None,
        max_sessions: None,
    }) {
        Commands::Serve {
            addr,
            session_ttl_secs,
            max_sessions,
        } => {
            let config = ServerConfig::resolve(ConfigOverrides {
                addr,
                model: cli.model,
                session_ttl_secs,
                max_sessions,
            })?;
            tracing::info!("House price server v{}", env!("CARGO_PKG_VERSION"));
            house_price_server::serve(config).await?;
        }

        Commands::Validate => {
            let model_path = resolve_model_path(cli.model.as_deref());
            let predictor = Predictor::load(&model_path);
            if !predictor.has_model() {
                eprintln!("No usable model at {}", model_path.display());
                std::process::exit(1);
            }
            match predictor.estimate(&example_form()) {
                Ok(estimate) => {
                    println!("Valid model: {}", model_path.display());
                    println!("  Columns: {}", MODEL_COLUMNS.len());
                    println!("  Probe estimate: {}", estimate.formatted);
                }
                Err(e) => {
                    eprintln!("Probe prediction failed: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let mut info = house_price::describe();
            info["name"] = serde_json::json!("house-price-server");
            info["version"] = serde_json::json!(env!("CARGO_PKG_VERSION"));
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "house-price-server",
                &mut std::io::stdout(),
            );
        }

        Commands::Repl => {
            house_price_server::repl::run(cli.model.as_deref())?;
        }
    }

    Ok(())
}
