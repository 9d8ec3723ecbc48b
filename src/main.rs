use std::process;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use k3dnode::cli::{
    format_dry_run, format_report, load_nodes, plan_nodes, resolve_runtime, run_create,
    run_delete, Cli, Commands,
};
use k3dnode::config::{default_config_path, load_config, serialize_config};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config {}: {}", config_path.display(), e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Create(args) => {
            let kind = resolve_runtime(args.runtime, &config);

            if args.dry_run {
                let planned = load_nodes(&args.file, &config)
                    .and_then(|nodes| plan_nodes(nodes, &config));
                match planned {
                    Ok(nodes) => print!("{}", format_dry_run(&nodes, kind)),
                    Err(e) => {
                        error!("{}", e);
                        process::exit(1);
                    }
                }
                return;
            }

            info!("Using {} runtime", kind);
            let runtime = kind.runtime();
            match run_create(&args, &config, runtime.as_ref()).await {
                Ok(report) => {
                    print!("{}", format_report(&report, "Created"));
                    if !report.is_complete() {
                        process::exit(1);
                    }
                }
                Err(e) => {
                    error!("{}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Delete(args) => {
            let kind = resolve_runtime(args.runtime, &config);
            let runtime = kind.runtime();
            match run_delete(&args, runtime.as_ref()).await {
                Ok(report) => {
                    print!("{}", format_report(&report, "Deleted"));
                    if !report.is_complete() {
                        process::exit(1);
                    }
                }
                Err(e) => {
                    error!("{}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Config => match serialize_config(&config) {
            Ok(yaml) => {
                println!("# {}", config_path.display());
                print!("{}", yaml);
            }
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        },
    }
}
