use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use imgdedup::history::read_history;
use imgdedup::{Action, Cli, Config, Deduper, Processed};

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let outcome = if cli.history {
        list_history(&cli.destination)
    } else {
        run(cli.into())
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ Error : {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: Config) -> Result<()> {
    println!(
        "▶ Searching for image perceptual similarities in: {}",
        config.source.display()
    );
    let dry_run = config.dry_run;
    let source = config.source.clone();

    let summary = Deduper::new(config)
        .run(report)
        .with_context(|| format!("Dedup of {:?} aborted", source))?;

    println!(
        "\n✅ {} image(s) scanned, {} unique, {} relocated",
        summary.scanned, summary.indexed, summary.relocated
    );
    if dry_run {
        println!("⚠️  Dry-run only; no files were changed.");
    }
    Ok(())
}

fn report(processed: &Processed<'_>) {
    let candidate = processed.candidate;
    println!(
        "{} ({}x{})",
        candidate.path.display(),
        candidate.width,
        candidate.height
    );

    let (marker, m) = match &processed.resolution.action {
        Action::InsertOnly => return,
        Action::RelocateNew(m) if m.verdict.is_eq() => ("🟰", m),
        Action::RelocateNew(m) => ("🔼", m),
        Action::RelocateExisting(m) => ("🔽", m),
    };
    println!(
        "\t=> Found ! (sim = {}) {} ({}x{}) {}",
        m.similarity,
        m.path.display(),
        m.width,
        m.height,
        marker
    );
    if let Some((from, to)) = &processed.relocated {
        if processed.dry_run {
            println!("\t📦 [dry-run] MOVE {} → {}", from.display(), to.display());
        } else {
            println!("\t📦 Moved {} → {}", from.display(), to.display());
        }
    }
}

fn list_history(holding: &Path) -> Result<()> {
    let records = read_history(holding)
        .with_context(|| format!("Could not read history in {:?}", holding))?;

    println!("🗂️  Relocation History:");
    for (i, rec) in records.iter().enumerate() {
        println!(
            "[{}] {}\n     kept: {}\n     moved: {} → {}\n     sim: {} ({})\n",
            i, rec.timestamp, rec.kept, rec.relocated, rec.destination, rec.similarity, rec.verdict
        );
    }
    Ok(())
}
