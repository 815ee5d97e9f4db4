use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kpipdf::{ReportOptions, SummaryInput, generate, verify};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "KPI report utility using kpipdf")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a report from a JSON summary
    Generate {
        /// JSON summary; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Report file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// JSON file with layout and label options
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Report date when the summary carries none
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Check offsets and references of a generated report
    Verify {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn read_input(path: Option<&PathBuf>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Command::Generate {
            input,
            output,
            config,
            date,
        } => {
            let options = match config {
                Some(path) => serde_json::from_slice::<ReportOptions>(&fs::read(path)?)?,
                None => ReportOptions::default(),
            };
            let mut summary = SummaryInput::from_json(&read_input(input.as_ref())?)?;
            if summary.generated_on.is_none() {
                summary.generated_on = date;
            }
            let bytes = generate(&summary, &options)?;
            match output {
                Some(path) => {
                    fs::write(&path, &bytes)?;
                    info!("saved {} bytes to {}", bytes.len(), path.display());
                }
                None => io::stdout().write_all(&bytes)?,
            }
        }
        Command::Verify { input } => {
            let layout = verify(&fs::read(&input)?)?;
            println!("PDF-{} with {} xref entries", layout.version, layout.size);
            for (id, offset) in &layout.offsets {
                println!("{:>4} 0 obj at byte {}", id, offset);
            }
            println!("xref at byte {}", layout.xref_start);
            for line in layout.text_lines() {
                println!("  {}", line);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
