use std::process;

use crate::config::WorkhistConfig;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_config(config: &WorkhistConfig, output: OutputFormat) {
    let rendered = match output {
        OutputFormat::Text => toml::to_string_pretty(config).map_err(|e| e.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
    };
    match rendered {
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => {
            report_error(&format!("could not render configuration: {}", e), output, false);
            process::exit(1);
        }
    }
}
