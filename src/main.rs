//! scribe-relay: LLM relay for a writing assistant
//!
//! Serves a same-origin relay to hosted and local LLM providers, plus
//! command-line access to the same generation, polish and model-list flows.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogFormat {
    #[default]
    Pretty,
    Json,
}

use scribe_relay::{
    api::{PolishRequest, PolishType, WritingRequest},
    client::{GenerationClient, HttpTransport, InProcessTransport, RelayTransport},
    config::{AppConfig, ConfigError},
    prompt::PromptStyle,
    providers::Provider,
    proxy::build_http_client,
    relay::{ModelLister, RelayOptions, RelayService},
    run_server,
    settings::{open_store, SettingsHandle},
};

#[derive(Parser)]
#[command(name = "scribe-relay")]
#[command(version = "0.1.0")]
#[command(about = "LLM relay and generation pipeline for a writing assistant")]
#[command(long_about = "
scribe-relay relays generation requests to LLM providers on behalf of a
browser UI and exposes the same pipeline on the command line:
  - Same-origin relay with credential-redacted logging
  - Provider-specific request shaping (OpenAI, Grok, DeepSeek, Anthropic,
    Google, Ollama, custom OpenAI-compatible endpoints)
  - Text polishing with line diff markup
  - Ollama model discovery

Example usage:
  scribe-relay run --config config.yaml
  scribe-relay generate --provider ollama --topic 春天 --keywords 花,雨
  scribe-relay polish draft.txt --polish-type academic --diff
")]
struct Cli {
    /// Path to config file (defaults: config.yaml, config.yml, ./config/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Provider settings file (overrides settings.path)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Run {
        /// Override listen port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override listen address
        #[arg(long)]
        host: Option<String>,
    },

    /// Validate configuration file
    CheckConfig,

    /// List known providers and their defaults
    ListProviders {
        /// Show detailed information
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate an article
    Generate {
        #[arg(long)]
        provider: Provider,
        #[arg(long, default_value = "")]
        topic: String,
        /// Comma-separated keywords
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,
        /// Target length in characters; 0 lets the model decide
        #[arg(long, default_value_t = 0)]
        word_count: u32,
        /// JSON file with a (partial) writing style
        #[arg(long)]
        style: Option<PathBuf>,
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Polish the text in a file
    Polish {
        /// File holding the text to polish
        input: PathBuf,
        #[arg(long, default_value = "standard")]
        polish_type: PolishType,
        /// Defaults to an OpenAI-compatible custom endpoint
        #[arg(long)]
        provider: Option<Provider>,
        /// Print the HTML diff markup instead of the polished text
        #[arg(long)]
        diff: bool,
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// List models available on an Ollama server
    ListModels {
        /// Ollama base URL (defaults to ollama.default_url)
        ollama_url: Option<String>,
    },
}

#[derive(clap::Args)]
struct EndpointArgs {
    /// API URL (falls back to stored settings, then the provider default)
    #[arg(long, default_value = "")]
    url: String,
    #[arg(long, default_value = "")]
    api_key: String,
    #[arg(long, default_value = "")]
    model: String,
    /// Send through a running relay (e.g. http://127.0.0.1:3000) instead of in-process
    #[arg(long)]
    proxy: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level_filter = if let Some(level) = cli.log_level {
        level.to_string()
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            .to_string()
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&level_filter))
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Pretty => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    match cli.command {
        Commands::Run { port, host } => {
            let mut config = load_config_or_exit(cli.config.as_deref());
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(path) = cli.settings {
                config.settings.path = Some(path);
            }
            let settings = open_settings(&config)?;
            run_server(config, settings).await?;
        }
        Commands::CheckConfig => {
            check_config(cli.config.as_deref());
        }
        Commands::ListProviders { verbose } => {
            list_providers(verbose);
        }
        Commands::Generate {
            provider,
            topic,
            keywords,
            word_count,
            style,
            endpoint,
        } => {
            let config = load_config_or_exit(cli.config.as_deref());
            let prompt_style = match style {
                Some(path) => PromptStyle::from_json(&std::fs::read_to_string(&path)?)?,
                None => PromptStyle::default(),
            };
            let request = WritingRequest {
                prompt_style,
                topic,
                keywords: keywords.into_iter().map(|k| k.trim().to_string()).filter(|k| !k.is_empty()).collect(),
                word_count,
                llm_api_url: endpoint.url.clone(),
                llm_api_key: endpoint.api_key.clone(),
                model: endpoint.model.clone(),
                api_provider: provider,
            };

            let client = build_client(&config, cli.settings.as_deref(), endpoint.proxy.as_deref())?;
            let response = client.generate(&request).await;
            match response.error {
                Some(error) => {
                    eprintln!("✗ {}", error);
                    std::process::exit(1);
                }
                None => println!("{}", response.content),
            }
        }
        Commands::Polish {
            input,
            polish_type,
            provider,
            diff,
            endpoint,
        } => {
            let config = load_config_or_exit(cli.config.as_deref());
            let request = PolishRequest {
                original_text: std::fs::read_to_string(&input)?,
                llm_api_url: endpoint.url.clone(),
                llm_api_key: endpoint.api_key.clone(),
                model: endpoint.model.clone(),
                polish_type,
                api_provider: provider,
            };

            let client = build_client(&config, cli.settings.as_deref(), endpoint.proxy.as_deref())?;
            let response = client.polish(&request).await;
            if let Some(error) = response.error {
                eprintln!("✗ {}", error);
                std::process::exit(1);
            }
            if diff {
                println!("{}", response.diff_markup.unwrap_or_default());
            } else {
                println!("{}", response.polished_text);
            }
        }
        Commands::ListModels { ollama_url } => {
            let config = load_config_or_exit(cli.config.as_deref());
            list_models(&config, ollama_url).await?;
        }
    }

    Ok(())
}

/// Open provider settings from the configured store
fn open_settings(config: &AppConfig) -> Result<Arc<SettingsHandle>, Box<dyn std::error::Error>> {
    let store = open_store(config.settings.path.as_deref());
    Ok(Arc::new(SettingsHandle::load(store)?))
}

/// Pipeline client over the in-process relay or a running server
fn build_client(
    config: &AppConfig,
    settings_override: Option<&Path>,
    proxy: Option<&str>,
) -> Result<GenerationClient, Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if let Some(path) = settings_override {
        config.settings.path = Some(path.to_path_buf());
    }
    let settings = open_settings(&config)?;
    let http_client = build_http_client(&config)?;

    let transport: Arc<dyn RelayTransport> = match proxy {
        Some(base) => Arc::new(HttpTransport::new(http_client, base)),
        None => Arc::new(InProcessTransport::new(Arc::new(RelayService::new(
            http_client,
            RelayOptions::from_config(&config),
        )))),
    };

    Ok(GenerationClient::new(transport, settings))
}

/// List known providers
fn list_providers(verbose: bool) {
    println!("Available providers:\n");

    for provider in Provider::ALL {
        let config = provider.config();
        let key = if provider.requires_api_key() {
            "[key required]"
        } else {
            "[no key]"
        };
        let model = if config.default_model.is_empty() {
            "-"
        } else {
            config.default_model
        };

        if verbose {
            println!("  {}:", provider);
            println!("    URL:    {}", if config.base_url.is_empty() { "(set per request)" } else { config.base_url });
            println!("    Model:  {}", model);
            if !config.available_models.is_empty() {
                println!("    Models: {}", config.available_models.join(", "));
            }
            println!("    Key:    {}", key);
            println!("    {}", config.help_text);
            println!();
        } else {
            println!("  {:10} {:15} {}", provider.as_str(), key, model);
        }
    }

    if verbose {
        println!("Stored settings override these defaults; request fields override both.");
    }
}

/// Validate configuration file
fn check_config(config_path: Option<&Path>) {
    match AppConfig::load_or_default(config_path) {
        Ok(config) => {
            println!("✓ Configuration file is valid\n");
            println!("Server:");
            println!("  Listen: {}:{}", config.server.host, config.server.port);
            println!("  Permissive CORS: {}", config.server.cors_permissive);
            println!("\nRelay:");
            println!("  Timeout: {}s", config.relay.timeout_seconds);
            println!("  Max body: {} bytes", config.relay.max_body_bytes);
            println!("  Log bodies: {}", config.relay.log_bodies);
            if let Some(ref tls) = config.relay.tls {
                if tls.accept_invalid_certs {
                    println!("  TLS: Accepting invalid certificates");
                }
                if let Some(ref ca) = tls.ca_cert_path {
                    println!("  TLS CA: {}", ca);
                }
            }
            println!("\nOllama:");
            println!("  Default URL: {}", config.ollama.default_url);
            println!("  Model list timeout: {}s", config.ollama.timeout_seconds);
            println!("\nSettings:");
            match config.settings.path {
                Some(ref path) => println!("  File: {}", path.display()),
                None => println!("  In memory (not persisted)"),
            }
            println!("\nStats:");
            println!("  Enabled: {}", config.stats.enabled);
            println!("  Format: {:?}", config.stats.format);
        }
        Err(e) => {
            eprintln!("✗ Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// List models on an Ollama server
async fn list_models(config: &AppConfig, ollama_url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let url = ollama_url.unwrap_or_else(|| config.ollama.default_url.clone());
    let lister = ModelLister::new(build_http_client(config)?, Duration::from_secs(config.ollama.timeout_seconds));

    println!("Listing models on {}", url);
    match lister.list(&url).await {
        Ok(models) if models.is_empty() => println!("  (no models installed)"),
        Ok(models) => {
            for model in models {
                println!("  - {}", model);
            }
        }
        Err(e) => {
            eprintln!("✗ {} (status {})", e, e.status());
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Load configuration or exit with error. Without an explicit path, a
/// missing file means defaults.
fn load_config_or_exit(config_path: Option<&Path>) -> AppConfig {
    match AppConfig::load_or_default(config_path) {
        Ok(config) => config,
        Err(ConfigError::NotFound(msg)) if config_path.is_none() => {
            tracing::info!("{}; using built-in defaults", msg);
            AppConfig::default()
        }
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            eprintln!("\nYou can copy config.yaml.default and modify it:");
            eprintln!("  cp config.yaml.default config.yaml");
            std::process::exit(1);
        }
    }
}
