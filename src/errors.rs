//! Error types for the sweep harness.
#![allow(missing_docs)]

use csv;
use toml;

/// Creates the Error, ErrorKind, ResultExt, and Result types
error_chain!{
    errors {
        Invocation(seed: u64, reason: String) {
            description("error in invoking the algorithm")
            display("algorithm invocation failed for seed {}: {}", seed, reason)
        }
        Schema(origin: String, line: u64, reason: String) {
            description("captured row does not match the trial schema")
            display("schema violation in {} (line {}): {}", origin, line, reason)
        }
        Setting(reason: String) {
            description("invalid setting")
            display("invalid setting: {}", reason)
        }
        Plot(reason: String) {
            description("error in rendering a plot")
            display("plot rendering failed: {}", reason)
        }
    }

    foreign_links {
        Io(::std::io::Error);
        Csv(csv::Error);
        Toml(toml::de::Error);
    }
}

impl Error {
    /// Returns the seed this error is attributed to, if any.
    pub fn seed(&self) -> Option<u64> {
        match *self.kind() {
            ErrorKind::Invocation(seed, _) => Some(seed),
            _ => None,
        }
    }
}
