use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` 優先，否則依 `--verbose` 決定
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "serve_apk=debug,info"
    } else {
        "serve_apk=info"
    }
}

fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Status lines only: the URL and QR art go to stdout separately, so the
/// fmt layer drops targets, thread ids and source locations.
pub fn init_cli_logger(verbose: bool) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    tracing_subscriber::registry()
        .with(log_filter(verbose))
        .with(fmt_layer)
        .init();
}
