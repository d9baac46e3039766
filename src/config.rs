//! Configuration types for multi-lookup
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum requester threads
pub const MAX_REQUESTER_THREADS: usize = 10;

/// Maximum resolver threads
pub const MAX_RESOLVER_THREADS: usize = 10;

/// Maximum number of input files per run
pub const MAX_INPUT_FILES: usize = 100;

/// Default capacity of the shared hostname queue
pub const DEFAULT_QUEUE_SIZE: usize = 8;

/// Minimum queue size
const MIN_QUEUE_SIZE: usize = 1;

/// Resolve hostnames from input files with parallel requester and resolver pools
#[derive(Parser, Debug, Clone)]
#[command(
    name = "multi-lookup",
    version,
    about = "Resolve hostnames from input files with parallel requester and resolver pools",
    long_about = "Reads hostnames (one per line) from the input files with a pool of requester \
                  threads and resolves them with a pool of resolver threads. The two pools are \
                  connected by a bounded queue.\n\n\
                  Requested hostnames are written to the requester log; resolutions are written \
                  to the resolver log as 'hostname, address' or 'hostname, NOT_RESOLVED'.",
    after_help = "EXAMPLES:\n    \
        multi-lookup 3 5 serviced.txt results.txt input/names1.txt input/names2.txt\n    \
        multi-lookup 10 10 req.log res.log input/*.txt --queue-size 32 -p\n    \
        multi-lookup 2 4 req.log res.log names.txt --timeout 2000 --exclude '\\.invalid$'"
)]
pub struct CliArgs {
    /// Number of requester threads
    #[arg(value_name = "REQUESTERS")]
    pub requesters: usize,

    /// Number of resolver threads
    #[arg(value_name = "RESOLVERS")]
    pub resolvers: usize,

    /// Log of every hostname read by the requesters
    #[arg(value_name = "REQUESTER_LOG")]
    pub requester_log: PathBuf,

    /// Log of resolution results
    #[arg(value_name = "RESOLVER_LOG")]
    pub resolver_log: PathBuf,

    /// Input files, one hostname per line
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Capacity of the queue between the two pools
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE, value_name = "NUM")]
    pub queue_size: usize,

    /// Per-hostname resolution timeout in milliseconds (0 = no timeout)
    #[arg(long, default_value = "0", value_name = "MS")]
    pub timeout: u64,

    /// Skip hostnames matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Show a live progress spinner
    #[arg(short = 'p', long)]
    pub progress: bool,

    /// Quiet mode - suppress header and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Number of requester threads
    pub requester_count: usize,

    /// Number of resolver threads
    pub resolver_count: usize,

    /// Requester log path
    pub requester_log: PathBuf,

    /// Resolver log path
    pub resolver_log: PathBuf,

    /// Input files, claimed in this order
    pub input_files: Vec<PathBuf>,

    /// Queue capacity
    pub queue_size: usize,

    /// Upper bound for one resolution
    pub resolve_timeout: Option<Duration>,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Show progress spinner
    pub show_progress: bool,

    /// Suppress header and summary
    pub quiet: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl LookupConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.requesters == 0 || args.requesters > MAX_REQUESTER_THREADS {
            return Err(ConfigError::InvalidRequesterCount {
                count: args.requesters,
                max: MAX_REQUESTER_THREADS,
            });
        }

        if args.resolvers == 0 || args.resolvers > MAX_RESOLVER_THREADS {
            return Err(ConfigError::InvalidResolverCount {
                count: args.resolvers,
                max: MAX_RESOLVER_THREADS,
            });
        }

        if args.files.len() > MAX_INPUT_FILES {
            return Err(ConfigError::TooManyFiles {
                count: args.files.len(),
                max: MAX_INPUT_FILES,
            });
        }

        if args.queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        // Both logs are truncated at startup, so they must not alias
        if args.requester_log == args.resolver_log {
            return Err(ConfigError::InvalidLogPath {
                path: args.resolver_log.clone(),
                reason: "requester and resolver logs must be different files".into(),
            });
        }

        for log in [&args.requester_log, &args.resolver_log] {
            if let Some(parent) = log.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(ConfigError::InvalidLogPath {
                        path: log.clone(),
                        reason: format!("Parent directory '{}' does not exist", parent.display()),
                    });
                }
            }
        }

        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            requester_count: args.requesters,
            resolver_count: args.resolvers,
            requester_log: args.requester_log,
            resolver_log: args.resolver_log,
            input_files: args.files,
            queue_size: args.queue_size,
            resolve_timeout: (args.timeout > 0).then(|| Duration::from_millis(args.timeout)),
            exclude_patterns,
            show_progress: args.progress,
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }

    /// Check if a hostname should be skipped
    pub fn is_excluded(&self, hostname: &str) -> bool {
        self.exclude_patterns.iter().any(|re| re.is_match(hostname))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("multi-lookup").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_parse_positional_args() {
        let args = parse(&["3", "5", "req.txt", "res.txt", "a.txt", "b.txt"]);
        let config = LookupConfig::from_args(args).unwrap();

        assert_eq!(config.requester_count, 3);
        assert_eq!(config.resolver_count, 5);
        assert_eq!(config.requester_log, PathBuf::from("req.txt"));
        assert_eq!(config.resolver_log, PathBuf::from("res.txt"));
        assert_eq!(
            config.input_files,
            vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]
        );
        assert_eq!(config.queue_size, DEFAULT_QUEUE_SIZE);
        assert_eq!(config.resolve_timeout, None);
    }

    #[test]
    fn test_missing_positional_args() {
        let result = CliArgs::try_parse_from(["multi-lookup", "3", "5", "req.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_thread_count_bounds() {
        let err = LookupConfig::from_args(parse(&["0", "1", "req.txt", "res.txt"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRequesterCount { count: 0, .. }));

        let err = LookupConfig::from_args(parse(&["1", "11", "req.txt", "res.txt"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidResolverCount { count: 11, .. }));

        assert!(LookupConfig::from_args(parse(&["10", "10", "req.txt", "res.txt"])).is_ok());
    }

    #[test]
    fn test_too_many_files() {
        let files: Vec<String> = (0..=MAX_INPUT_FILES).map(|i| format!("f{i}.txt")).collect();
        let mut argv = vec!["1", "1", "req.txt", "res.txt"];
        argv.extend(files.iter().map(String::as_str));

        let err = LookupConfig::from_args(parse(&argv)).unwrap_err();
        assert!(matches!(err, ConfigError::TooManyFiles { count: 101, max: 100 }));
    }

    #[test]
    fn test_queue_size_and_timeout() {
        let err = LookupConfig::from_args(parse(&["1", "1", "r.txt", "s.txt", "--queue-size", "0"]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQueueSize { size: 0, .. }));

        let config =
            LookupConfig::from_args(parse(&["1", "1", "r.txt", "s.txt", "--timeout", "1500"]))
                .unwrap();
        assert_eq!(config.resolve_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_log_paths_validated() {
        let err = LookupConfig::from_args(parse(&["1", "1", "same.txt", "same.txt"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogPath { .. }));

        let err = LookupConfig::from_args(parse(&[
            "1",
            "1",
            "/nonexistent-dir-for-test/req.txt",
            "res.txt",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogPath { .. }));
    }

    #[test]
    fn test_exclude_pattern() {
        let config = LookupConfig::from_args(parse(&[
            "1",
            "1",
            "r.txt",
            "s.txt",
            "--exclude",
            r"\.invalid$",
            "--exclude",
            "^localhost$",
        ]))
        .unwrap();

        assert!(config.is_excluded("foo.invalid"));
        assert!(config.is_excluded("localhost"));
        assert!(!config.is_excluded("example.com"));

        let err = LookupConfig::from_args(parse(&["1", "1", "r.txt", "s.txt", "--exclude", "("]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidExcludePattern { .. }));
    }
}
