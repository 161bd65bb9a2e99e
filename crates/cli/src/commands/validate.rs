use std::path::Path;
use std::process;

use workhist_session::{Clock, SystemClock};
use workhist_validate::{ValidationContext, ValidationEngine, ValidationMode};

use super::{load_rules, read_record};
use crate::config::WorkhistConfig;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_validate(
    file: &Path,
    mode: Option<ValidationMode>,
    step: Option<u32>,
    rules: Option<&Path>,
    config: &WorkhistConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let record = match read_record(file) {
        Ok(record) => record,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let engine = match load_rules(rules) {
        Ok(rules) => ValidationEngine::new(rules),
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let mut ctx = ValidationContext::new(SystemClock.today())
        .with_mode(mode.unwrap_or(config.session.validation_mode));
    if let Some(step) = step {
        ctx = ctx.reached(step);
    }
    let report = engine.validate(&record, &ctx);

    match output {
        OutputFormat::Text => {
            if !quiet {
                print!("{}", report);
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                report_error(&format!("could not render report: {}", e), output, quiet);
                process::exit(1);
            }
        },
    }

    if !report.is_valid {
        process::exit(1);
    }
}
