mod args;
mod output;

use std::fs;
use std::io::{self, BufRead, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use mailprobe_lib::{
    BulkJob, BulkRunner, DisposableDomains, ProbeConfig, Summary, Verifier,
};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands, OutFormat};

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.cmd {
        Commands::Check { email, json, probe } => {
            let config = probe.to_config(cli.verbose)?;
            check(&email, json, config)
        }
        Commands::Bulk {
            input,
            concurrency,
            out,
            disposable_list,
            probe,
        } => {
            let config = probe.to_config(cli.verbose)?;
            let disposable = match disposable_list {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("read {}", path.display()))?;
                    DisposableDomains::from_list(&text)
                }
                None => DisposableDomains::builtin(),
            };
            let addresses = read_addresses(&input)?;
            bulk(addresses, concurrency, out, disposable, config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check(email: &str, json: bool, config: ProbeConfig) -> Result<ExitCode> {
    let verifier = Verifier::system(config).context("initialise DNS resolver")?;
    let result = verifier.verify(email);
    let mut stdout = io::stdout().lock();
    if json {
        output::write_json(&mut stdout, &result)?;
    } else {
        output::write_human(&mut stdout, &result)?;
    }
    Ok(output::exit_code(result.status))
}

fn read_addresses(input: &str) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = fs::File::open(input).with_context(|| format!("open {input}"))?;
        Box::new(io::BufReader::new(file))
    };
    let mut addresses = Vec::new();
    for line in reader.lines() {
        let line = line.context("read input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        addresses.push(line.to_string());
    }
    Ok(addresses)
}

fn bulk(
    addresses: Vec<String>,
    concurrency: usize,
    out: OutFormat,
    disposable: DisposableDomains,
    config: ProbeConfig,
) -> Result<()> {
    let runner = BulkRunner::system(config.timeout())
        .context("initialise DNS resolver")?
        .with_disposable(disposable);
    let job = BulkJob::new(addresses, concurrency)
        .with_config(config)
        .streaming(out == OutFormat::Ndjson);
    let mut stdout = BufWriter::new(io::stdout().lock());

    let summary = match out {
        OutFormat::Ndjson => {
            let mut summary = Summary::default();
            for completed in runner.run_streaming(job)? {
                summary.record(completed.result.status);
                output::write_ndjson_line(&mut stdout, &completed.result)?;
                stdout.flush()?;
            }
            summary
        }
        OutFormat::Json => {
            let report = runner.run_aggregate(job)?;
            output::write_json(&mut stdout, &report)?;
            report.summary
        }
        OutFormat::Csv => {
            let report = runner.run_aggregate(job)?;
            output::write_csv(&mut stdout, &report.results)?;
            report.summary
        }
    };
    stdout.flush()?;
    eprintln!("{}", output::summary_line(&summary));
    Ok(())
}
