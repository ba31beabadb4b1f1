use clap::Parser;
use serve_apk::utils::{error::ShareError, logger, validation::Validate};
use serve_apk::{CliConfig, ShareEngine};

fn report(e: &ShareError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::debug!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("{}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

/// Ctrl+C 是正常結束，不是錯誤
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C ({}); stop the process another way", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.share_config() {
        Ok(config) => config,
        Err(e) => report(&e),
    };
    if let Err(e) = config.validate() {
        report(&e);
    }

    let engine = ShareEngine::new(config);
    match engine.run(ctrl_c()).await {
        Ok(outcome) => {
            tracing::debug!("Finished {:?} share of {}", outcome.mode, outcome.url);
        }
        Err(e) => report(&e),
    }
}
