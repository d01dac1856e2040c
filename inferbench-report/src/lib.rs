#![warn(missing_docs)]
//! inferbench Report - Results and Interchange
//!
//! - [`Results`]: the record produced by one runner invocation
//! - Tagged JSON codec ([`dump`], [`dumps`], [`load`], [`loads`]) where every
//!   node names its type under `"type"`
//! - [`OutputFormat`] selection for the command line

mod error;
mod json;
mod results;

pub use error::SerializationError;
pub use json::{
    REGISTERED_TYPES, Record, TYPE_KEY, Tagged, decode, decode_any, dump, dumps, encode, load,
    load_results, loads, save_results,
};
pub use results::{Results, TIMESTAMP_FORMAT, format_timestamp, now_millis, parse_timestamp};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal summary
    #[default]
    Human,
    /// Tagged JSON document
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
