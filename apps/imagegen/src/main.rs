use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use generation_core::{
    FailurePolicy, HttpGenerationTransport, HttpRefresh, NoopRefresh, RefreshHandle,
    SubmissionController, SubmitError, SubmitOutcome,
};
use shared::{
    catalog::{OptionCatalog, OptionEntry},
    validation::DraftRequest,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings, DEFAULT_CONFIG_FILE};

/// Turn a prompt into images.
#[derive(Parser, Debug)]
struct Args {
    /// What to draw, e.g. "Spongebob riding a horse".
    #[arg(long, required_unless_present = "list_options")]
    prompt: Option<String>,
    /// Number of images; one of the values shown by --list-options.
    #[arg(long)]
    amount: Option<String>,
    /// Image size; one of the values shown by --list-options.
    #[arg(long)]
    resolution: Option<String>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    refresh_url: Option<String>,
    /// Exit with an error when the generation service fails.
    #[arg(long)]
    surface_failures: bool,
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Print the selectable amounts and resolutions and exit.
    #[arg(long)]
    list_options: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();
    let catalog = OptionCatalog::standard();

    if args.list_options {
        print_catalog(&catalog);
        return Ok(ExitCode::SUCCESS);
    }

    let settings = apply_args(load_settings(&args.config)?, &args);
    info!(endpoint = %settings.endpoint, "using generation endpoint");

    let transport = HttpGenerationTransport::with_timeout(&settings.endpoint, settings.timeout())
        .context("failed to set up generation transport")?;
    let refresher: Arc<dyn RefreshHandle> = match &settings.refresh_url {
        Some(url) => Arc::new(HttpRefresh::with_timeout(url, settings.timeout())?),
        None => Arc::new(NoopRefresh),
    };
    let policy = if settings.surface_failures {
        FailurePolicy::Surface
    } else {
        FailurePolicy::Silent
    };
    let controller = SubmissionController::new_with_dependencies(
        catalog,
        Arc::new(transport),
        refresher,
        policy,
    );

    let mut draft = DraftRequest::new(&catalog).with_prompt(args.prompt.unwrap_or_default());
    if let Some(amount) = args.amount {
        draft.amount = amount;
    }
    if let Some(resolution) = args.resolution {
        draft.resolution = resolution;
    }

    match controller.submit(&mut draft).await {
        Ok(SubmitOutcome::Completed(artifacts)) if !artifacts.is_empty() => {
            for artifact in artifacts {
                println!("{artifact}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(_) => {
            println!("No images generated.");
            Ok(ExitCode::SUCCESS)
        }
        Err(SubmitError::Invalid(_)) => {
            for err in draft.errors() {
                eprintln!("{err}");
            }
            Ok(ExitCode::from(2))
        }
        Err(SubmitError::Transport(err)) => {
            if err.is_quota_exhausted() {
                eprintln!("Your free generations are used up; upgrade to Pro to continue.");
            }
            Err(err).context("image generation failed")
        }
    }
}

fn apply_args(mut settings: Settings, args: &Args) -> Settings {
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(refresh_url) = &args.refresh_url {
        settings.refresh_url = Some(refresh_url.clone());
    }
    if args.surface_failures {
        settings.surface_failures = true;
    }
    settings
}

fn print_catalog(catalog: &OptionCatalog) {
    print_entries("amounts", catalog.amounts(), catalog.default_amount().value());
    print_entries(
        "resolutions",
        catalog.resolutions(),
        catalog.default_resolution().value(),
    );
}

fn print_entries(title: &str, entries: &[OptionEntry], default_value: &str) {
    println!("{title}:");
    for entry in entries {
        let marker = if entry.value == default_value {
            " (default)"
        } else {
            ""
        };
        println!("  {:<10} {}{marker}", entry.value, entry.label);
    }
}
