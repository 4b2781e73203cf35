use clap::{CommandFactory, Parser};
use diff_scraper::cli::{init_tracing, run, Cli};
use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    if std::env::args_os().len() <= 1 {
        let mut stderr = std::io::stderr();
        let _ = Cli::command().write_help(&mut stderr);
        let _ = writeln!(stderr);
        return ExitCode::from(1);
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::info!("CLI arguments parsed, invoking run");

    let start = Instant::now();
    let result = run(cli).await;
    match result {
        Ok(summary) => {
            tracing::info!(
                output_dir = %summary.output_dir.display(),
                written = summary.report.written.len(),
                "CLI completed successfully"
            );
            println!("\n{:.3} [s]", start.elapsed().as_secs_f64());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("[ERROR] {e:#}");
            ExitCode::FAILURE
        }
    }
}
