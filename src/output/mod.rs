//! Output formatting for CLI results

use colored::Colorize;
use devreg::Outcome;
use devreg::error::Result;

use crate::cli::OutputFormat;

pub mod json;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Format and print data to stdout
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

impl Formattable for Outcome {
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(json::format_json(self)?),
            OutputFormat::Pretty => {
                let mut out = String::new();
                if self.is_success() {
                    out.push_str(&format!(
                        "{} {} returned {}",
                        "✓".green(),
                        self.operation(),
                        self.status_code()
                    ));
                } else {
                    out.push_str(&format!(
                        "{} {} returned {} (expected {})",
                        "✗".red(),
                        self.operation(),
                        self.status_code(),
                        self.operation().expected_status()
                    ));
                }
                if !self.data().is_empty() {
                    out.push('\n');
                    out.push_str(self.data());
                }
                Ok(out)
            }
        }
    }
}
