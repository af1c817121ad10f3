use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// lodestar: UI test automation with smart element resolution
#[derive(Parser)]
#[command(name = "lodestar", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one or more test scripts
    Run {
        /// Script files to execute, in order
        scripts: Vec<PathBuf>,
        /// Run Chrome with a visible window (default: headless)
        #[arg(long)]
        headed: bool,
        /// Config file (default: ./lodestar.json when present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where to write report.json / report.html
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// Scaffold a starter config and example script
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr only; stdout carries the run summary
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();

    match Cli::parse().command {
        Command::Init { dir } => {
            lodestar::scaffold::init(&dir)?;
            println!("Scaffolded lodestar project in {}", dir.display());
            Ok(())
        }
        Command::Run {
            scripts,
            headed,
            config,
            report_dir,
        } => {
            let mut config = lodestar::config::Config::load(config.as_deref())?;
            if headed {
                config.headless = false;
            }
            if let Some(dir) = report_dir {
                config.report_dir = dir;
            }

            let report = lodestar::runner::run(&config, &scripts).await?;
            report.write(&config.report_dir)?;

            println!(
                "{} passed, {} failed in {}ms — report in {}",
                report.passed,
                report.failed,
                report.elapsed_ms,
                config.report_dir.display()
            );
            if report.failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
