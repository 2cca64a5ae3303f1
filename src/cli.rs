//! Command-line front end.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use crate::automation::{Call, Document, DocumentKind, MemoryConnector};
use crate::config::{Args, Command, Config};
use crate::handler::{DocHandler, ExitOutcome};
use crate::units::{convert_between, LengthUnit};

/// Result of a `convert` invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub value: f64,
    pub from: LengthUnit,
    pub to: LengthUnit,
    pub result: f64,
}

/// Record of a scoped session against the in-memory application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub file: Option<PathBuf>,
    pub kind: Option<DocumentKind>,
    pub document: Option<String>,
    pub outcome: ExitOutcome,
    pub journal: Vec<Call>,
}

/// Parse arguments, set up logging and run the requested command
pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(&args)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    if let Some(path) = &config.config_path {
        log::debug!("loaded configuration from {}", path.display());
    }

    match args.command {
        Command::Convert {
            value,
            unit,
            to,
            json,
        } => {
            let conversion = convert(value, unit.unwrap_or(config.default_unit), to);
            if json {
                println!("{}", serde_json::to_string_pretty(&conversion)?);
            } else {
                println!(
                    "{} {} = {} {}",
                    conversion.value, conversion.from, conversion.result, conversion.to
                );
            }
        }
        Command::Session { file, new, json } => {
            let kind = if file.is_none() {
                new.or(config.default_kind)
            } else {
                new
            };
            let report = session(&config, file, kind)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }

    Ok(())
}

pub fn convert(value: f64, from: LengthUnit, to: LengthUnit) -> Conversion {
    Conversion {
        value,
        from,
        to,
        result: convert_between(value, from, to),
    }
}

/// Run one scoped session and report the document that was handled
pub fn session(
    config: &Config,
    file: Option<PathBuf>,
    kind: Option<DocumentKind>,
) -> Result<SessionReport> {
    let connector = MemoryConnector::new();
    let mut handler =
        DocHandler::with_options(connector.clone(), file.clone(), kind, config.handler)?;

    let scope = handler.enter()?;
    let document = scope.document().map(|d| d.name()).transpose()?;
    let outcome = scope.exit()?;

    Ok(SessionReport {
        file,
        kind,
        document,
        outcome,
        journal: connector.journal(),
    })
}

fn print_report(report: &SessionReport) {
    match &report.document {
        Some(name) => println!("document: {}", name),
        None => println!("document: <none>"),
    }
    println!("outcome:  {:?}", report.outcome);
    println!("calls:");
    for call in &report.journal {
        println!("  {:?}", call);
    }
}
