use std::path::Path;
use std::process;

use super::load_rules;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_rules(path: Option<&Path>, output: OutputFormat, quiet: bool) {
    let rules = match load_rules(path) {
        Ok(rules) => rules,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let rendered = match output {
        OutputFormat::Text => rules.to_toml_string().map_err(|e| e.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(&rules).map_err(|e| e.to_string()),
    };
    match rendered {
        Ok(text) => println!("{}", text.trim_end()),
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}
