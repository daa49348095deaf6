use std::{
    error::Error,
    ffi::OsString,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::{error::ErrorKind, ArgAction, Parser};
use tracing::level_filters::LevelFilter;

use crate::{
    config::{FlattenConfig, MissingTextPolicy},
    flatten::{flatten_file, FlattenError},
};

/// Flatten a MediaWiki XML export into `PAGE: <title>` headers and revision texts.
///
/// Meant to be registered as a git textconv filter, e.g.
/// `git config diff.mediawiki.textconv mwxml-flatten` together with
/// `*.mwxml diff=mediawiki` in `.gitattributes`.
#[derive(Debug, clap::Parser)]
#[command(version)]
pub struct CommandLine {
    /// MediaWiki XML export to flatten.
    pub input_file: PathBuf,

    /// Namespace URI of the export schema to match.
    #[arg(long, value_name = "URI", conflicts_with = "export_version")]
    pub namespace: Option<String>,

    /// Export schema version to match, e.g. `0.10` [default: 0.9].
    #[arg(long, value_name = "VERSION")]
    pub export_version: Option<String>,

    /// What to emit for pages whose first revision has no text.
    #[arg(long, value_enum, default_value_t = MissingTextPolicy::Skip)]
    pub missing_text: MissingTextPolicy,

    /// Log more details to stderr (repeat for more).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl CommandLine {
    /// Parse the arguments, `args` includes the program name.
    ///
    /// On invalid arguments the error is printed to stderr and `None` is returned, so that a
    /// textconv caller sees an empty stdout. `--help` and `--version` exit the process as usual.
    pub fn parse_or_usage<I, T>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(command_line) => Some(command_line),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => {
                // stdout must stay clean, clap prints usage errors to stderr
                let _ = e.print();
                None
            }
        }
    }

    pub fn config(&self) -> FlattenConfig {
        let config = match (&self.namespace, &self.export_version) {
            (Some(namespace), _) => FlattenConfig::default().with_namespace(namespace.as_str()),
            (None, Some(version)) => FlattenConfig::for_export_version(version),
            (None, None) => FlattenConfig::default(),
        };
        config.with_missing_text(self.missing_text)
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Flatten the input file into `sink`.
    pub fn run<W: Write>(&self, sink: W) -> Result<(), FlattenError> {
        flatten_file(&self.input_file, &self.config(), BufWriter::new(sink))
    }
}

/// `err` and all of its sources, joined with `: `.
pub fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
