use std::io::Write;
use std::process;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

pub const USAGE_EXIT_CODE: i32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing required argument <{0}>")]
    Missing(&'static str),
    #[error("argument <{name}> must be a non-negative integer, got {value:?}")]
    NotAnInteger { name: &'static str, value: String },
    #[error("unexpected extra argument {0:?}")]
    Unexpected(String),
}

/// Positional arguments of a binary, program name excluded.
pub struct Positional {
    args: Vec<String>,
}

impl Positional {
    pub fn new<I: IntoIterator<Item = String>>(args: I) -> Self {
        Positional {
            args: args.into_iter().collect(),
        }
    }

    pub fn from_env() -> Self {
        Positional::new(std::env::args().skip(1))
    }

    pub fn optional<T: FromStr>(&self, position: usize, name: &'static str) -> Result<Option<T>, UsageError> {
        match self.args.get(position) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| UsageError::NotAnInteger {
                    name,
                    value: raw.clone(),
                }),
        }
    }

    pub fn required<T: FromStr>(&self, position: usize, name: &'static str) -> Result<T, UsageError> {
        self.optional(position, name)?.ok_or(UsageError::Missing(name))
    }

    /// Fails when more than `expected` arguments were given.
    pub fn at_most(&self, expected: usize) -> Result<(), UsageError> {
        match self.args.get(expected) {
            Some(extra) => Err(UsageError::Unexpected(extra.clone())),
            None => Ok(()),
        }
    }
}

/// Reports a usage problem on stderr and exits with status 2.
pub fn exit_with_usage(usage: &str, error: &UsageError) -> ! {
    eprintln!("error: {}", error);
    eprintln!("usage: {}", usage);
    process::exit(USAGE_EXIT_CODE)
}

/// Writes `value` as one line of JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod cli_test {
    use super::*;

    fn args(values: &[&str]) -> Positional {
        Positional::new(values.iter().map(|v| v.to_string()))
    }

    #[test]
    fn should_parse_required_and_optional_integers() {
        let positional = args(&["42", "7"]);
        assert_eq!(Ok(42_u64), positional.required(0, "user_id"));
        assert_eq!(Ok(Some(7_usize)), positional.optional(1, "count"));
        assert_eq!(Ok(None::<usize>), positional.optional(2, "seed"));
        assert_eq!(Ok(()), positional.at_most(2));
    }

    #[test]
    fn should_report_missing_and_malformed_arguments() {
        assert_eq!(
            Err(UsageError::Missing("user_id")),
            args(&[]).required::<u64>(0, "user_id")
        );
        assert_eq!(
            Err(UsageError::NotAnInteger {
                name: "user_id",
                value: "alice".to_string()
            }),
            args(&["alice"]).required::<u64>(0, "user_id")
        );
        assert!(args(&["-3"]).required::<u64>(0, "user_id").is_err());
        assert_eq!(
            Err(UsageError::Unexpected("extra".to_string())),
            args(&["1", "2", "extra"]).at_most(2)
        );
    }
}
