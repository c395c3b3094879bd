//! `lottomate` - command-line access to the LottoMate backend.
//!
//! ```text
//! lottomate plans     list plans currently on sale
//! lottomate session   show the stored session
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use lottomate_core::adapters::ChannelPaymentGateway;
use lottomate_core::config::AppConfig;
use lottomate_core::LottoMate;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: lottomate <plans|session>";

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.api.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn list_plans(client: &LottoMate) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = client.subscriptions().plan_catalog().await?;
    if catalog.is_empty() {
        println!("No plans on sale.");
        return Ok(());
    }

    let default_key = catalog.default_selection().map(|o| o.plan.key());
    for offer in catalog.offers() {
        let marker = if Some(offer.plan.key()) == default_key { "*" } else { " " };
        println!(
            "{} {:<12} {:>8} KRW/month {:>9} KRW/year  {}",
            marker,
            offer.plan.display_name(),
            offer.monthly_price,
            offer.yearly_price,
            offer.plan.feature_list.join(", ")
        );
    }
    Ok(())
}

async fn show_session(client: &LottoMate) -> Result<(), Box<dyn std::error::Error>> {
    let facade = client.facade();
    let Some(session) = facade.session() else {
        println!("Not signed in.");
        return Ok(());
    };

    let valid = facade.ensure_valid().await;
    println!("Signed in as {}", session.subject_id());
    println!("Persistence: {:?}", session.persistence());
    println!(
        "Credential:  {}",
        if valid { "valid" } else { "expired, session ended" }
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    let command = std::env::args().nth(1);

    // No UI host is attached; checkout is not offered from the command line.
    let (gateway, _prompts) = ChannelPaymentGateway::new(config.gateway.prompt_buffer);
    let client = match LottoMate::connect(&config, Arc::new(gateway)).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match command.as_deref() {
        Some("plans") => list_plans(&client).await,
        Some("session") => show_session(&client).await,
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
