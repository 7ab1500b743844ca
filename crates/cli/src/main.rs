//! connectctl - command-line surface over the subscription backend engine
//! Presentation only: every operation is a straight call into the core
//! Backend selected once at startup.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tabled::{Table, Tabled};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use connectctl_core::application::constants::{SUSECONNECT_PATH, TRANSACTIONAL_UPDATE_PATH};
use connectctl_core::application::{reboot_advised, select_backend, Backend, RegisterRequest};
use connectctl_core::domain::{Extension, ProductKey, Subscription};
use connectctl_core::port::ProcessRunner;
use connectctl_infra_system::{SystemHostProbe, SystemProcessRunner};

use settings::{Settings, DEFAULT_SETTINGS_PATH};

#[derive(Parser)]
#[command(name = "connectctl")]
#[command(about = "Manage subscription registration state", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Subscription manager settings file
    #[arg(
        long,
        global = true,
        env = "CONNECTCTL_SETTINGS_PATH",
        default_value = DEFAULT_SETTINGS_PATH
    )]
    settings_path: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered subscriptions
    Status,

    /// List extensions available for activation
    Extensions,

    /// Register the system or activate a product
    Register {
        /// Registration code
        #[arg(short = 'r', long)]
        regcode: Option<String>,

        /// Email address tied to the registration
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Product key as identifier/version/arch
        #[arg(short = 'p', long)]
        product: Option<String>,

        /// Registration server URL (written to the manager configuration)
        #[arg(long)]
        url: Option<String>,
    },

    /// Deregister a product, or the whole system when no product is given
    Deregister {
        /// Product key as identifier/version/arch
        #[arg(short = 'p', long)]
        product: Option<String>,
    },

    /// Show or change subscription manager settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,

    /// Update one or more settings
    Set {
        /// Registration server / proxy URL
        #[arg(long)]
        url: Option<String>,

        /// Language country code
        #[arg(long)]
        language: Option<String>,

        /// Allow insecure proxies
        #[arg(long)]
        insecure: Option<bool>,
    },
}

#[derive(Tabled)]
struct SubscriptionRow {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Expires")]
    expires: String,
}

impl From<&Subscription> for SubscriptionRow {
    fn from(sub: &Subscription) -> Self {
        Self {
            product: sub.name.clone().unwrap_or_else(|| sub.identifier.clone()),
            key: sub.product_key().to_string(),
            status: sub
                .subscription_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| sub.status.clone()),
            expires: sub
                .expires()
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn init_logging() {
    let log_format = std::env::var("CONNECTCTL_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("connectctl=warn"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

/// Probe the host once; failing both probes is the unavailable state
async fn backend_or_bail() -> Result<Arc<dyn Backend>> {
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemProcessRunner::new());
    let probe = SystemHostProbe::new();

    match select_backend(&probe, runner).await {
        Some(backend) => Ok(backend),
        None => bail!(
            "neither {} nor {} exists; managing subscriptions requires one of them \
             (and administrative access)",
            TRANSACTIONAL_UPDATE_PATH,
            SUSECONNECT_PATH
        ),
    }
}

fn parse_product(product: Option<&str>) -> Result<Option<ProductKey>> {
    product
        .map(|raw| ProductKey::parse(raw).context("invalid --product value"))
        .transpose()
}

fn print_extension_tree(extension: &Extension, depth: usize) {
    let indent = "  ".repeat(depth);
    let expiry = extension
        .expires()
        .map(|t| format!("  (expires {})", t.format("%Y-%m-%d")))
        .unwrap_or_default();
    println!(
        "{}{}  {}{}",
        indent,
        extension.name.bold(),
        extension.product_key().to_string().dimmed(),
        expiry
    );
    for nested in &extension.extensions {
        print_extension_tree(nested, depth + 1);
    }
}

fn print_reboot_advisory() {
    println!();
    println!(
        "{}",
        "Please reboot your machine to finish applying the change."
            .yellow()
            .bold()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => {
            let backend = backend_or_bail().await?;
            let subscriptions = backend.subscriptions().await?;

            if subscriptions.is_empty() {
                println!("{}", "No registered subscriptions.".yellow());
            } else {
                let rows: Vec<SubscriptionRow> =
                    subscriptions.iter().map(SubscriptionRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Extensions => {
            let backend = backend_or_bail().await?;
            let extensions = backend.extensions().await?;

            if extensions.is_empty() {
                println!("{}", "No extensions available for activation.".yellow());
            } else {
                println!("{}", "Available extensions".cyan().bold());
                println!();
                for extension in &extensions {
                    print_extension_tree(extension, 0);
                }
            }
        }

        Commands::Register {
            regcode,
            email,
            product,
            url,
        } => {
            let backend = backend_or_bail().await?;
            // An explicit --url wins over the persisted settings value
            let saved = Settings::load(&cli.settings_path).await?;
            let request = RegisterRequest {
                regcode,
                email,
                product: parse_product(product.as_deref())?,
                server_url: url.or(saved.url),
            };

            let outcome = backend.register(&request).await?;
            if outcome.succeeded {
                println!("{}", "✓ Successfully registered".green().bold());
                if outcome.reboot_required {
                    print_reboot_advisory();
                }
            } else {
                if outcome.reboot_required {
                    print_reboot_advisory();
                }
                bail!("registration failed: {}", outcome.message);
            }
        }

        Commands::Deregister { product } => {
            let backend = backend_or_bail().await?;
            let key = parse_product(product.as_deref())?;

            let output = backend.deregister(key.as_ref()).await?;
            match &key {
                Some(key) => println!("{}", format!("✓ Deactivated {key}").green().bold()),
                None => println!("{}", "✓ System deregistered".green().bold()),
            }
            if reboot_advised(&output) {
                print_reboot_advisory();
            }
        }

        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                let settings = Settings::load(&cli.settings_path).await?;
                println!("{} {}", "URL:".bold(), settings.url.as_deref().unwrap_or("-"));
                println!(
                    "{} {}",
                    "Language:".bold(),
                    settings.language.as_deref().unwrap_or("-")
                );
                println!("{} {}", "Insecure proxies:".bold(), settings.insecure);
            }
            SettingsAction::Set {
                url,
                language,
                insecure,
            } => {
                let mut settings = Settings::load(&cli.settings_path).await?;
                if let Some(url) = url {
                    settings.url = (!url.is_empty()).then_some(url);
                }
                if let Some(language) = language {
                    settings.language = (!language.is_empty()).then_some(language);
                }
                if let Some(insecure) = insecure {
                    settings.insecure = insecure;
                }
                settings.save(&cli.settings_path).await?;
                println!("{}", "✓ Settings saved".green().bold());
            }
        },
    }

    Ok(())
}
