//! Compensator sizing entry point: CLI wiring and config-driven engine construction.

mod cli;

use std::process;

use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::{CliOptions, Input};
use kompensator::config::EngineConfig;
use kompensator::io::export::export_results_csv;
use kompensator::io::invoices::read_invoices;
use kompensator::recommend::{CalculationResult, Recommender};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kompensator=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &CliOptions) -> EngineConfig {
    let loaded = if let Some(ref path) = cli.config {
        EngineConfig::from_toml_file(path)
    } else if let Some(ref name) = cli.preset {
        EngineConfig::from_preset(name)
    } else {
        Ok(EngineConfig::tiered())
    };
    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn build_recommender(cfg: &EngineConfig) -> Recommender {
    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg.build().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    })
}

fn print_devices(rec: &Recommender) {
    println!("{:<20} {:>10} {:>10} {:>12}", "model", "kvar", "kind", "price (PLN)");
    for m in rec.list_devices() {
        println!(
            "{:<20} {:>10} {:>10} {:>12.0}",
            m.model_name,
            m.rating_kvar,
            m.kind.to_string(),
            m.unit_price
        );
    }
}

fn run(rec: &Recommender, input: &Input) -> CalculationResult {
    let outcome = match input {
        Input::Manual(record) => rec.compute(record),
        Input::Invoices {
            path,
            has_photovoltaic,
        } => {
            let outcomes = read_invoices(path).unwrap_or_else(|e| {
                eprintln!("error: failed to read \"{}\": {e}", path.display());
                process::exit(1);
            });
            rec.compute_from_extractions(&outcomes, *has_photovoltaic)
        }
    };
    outcome.unwrap_or_else(|e| {
        error!(error = %e, "calculation failed");
        eprintln!("error: {e}");
        process::exit(1);
    })
}

fn main() {
    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });
    init_tracing();

    let cfg = load_config(&cli);
    let recommender = build_recommender(&cfg);

    if cli.list_devices {
        print_devices(&recommender);
    }

    if let Some(ref input) = cli.input {
        let result = run(&recommender, input);
        println!("{result}");

        if let Some(ref path) = cli.report_out {
            if let Err(e) = export_results_csv(std::slice::from_ref(&result), path) {
                eprintln!("error: failed to write CSV: {e}");
                process::exit(1);
            }
            eprintln!("Report written to {}", path.display());
        }
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(kompensator::api::AppState { recommender });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(kompensator::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
