// SPDX-License-Identifier: GPL-3.0-or-later
//! # mwxml-flatten
//!
//! Flattens MediaWiki XML exports into plain text that diffs well.
//!
//! ## Overview
//!
//! A MediaWiki export (`Special:Export`, `dumpBackup.php`) wraps every page in a lot of
//! metadata: page and revision ids, timestamps, contributors, sha1 hashes, byte counts. When
//! such exports are kept under version control, a diff between two of them is dominated by that
//! noise. `mwxml-flatten` reduces an export to what a human wants to compare:
//!
//! ```text
//! PAGE: TestPage001
//! [[Category:TestDiff]]
//!
//! Lorem ipsum.
//! PAGE: TestPage002
//! ...
//! ```
//!
//! For every `<page>` it prints a `PAGE: <title>` line followed by the text of the page's first
//! revision, verbatim. The transformation is lossy and only meant for reading diffs.
//!
//! ## Using it as a git textconv filter
//!
//! ```text
//! # .gitattributes
//! *.mwxml diff=mediawiki
//!
//! $ git config diff.mediawiki.textconv mwxml-flatten
//! ```
//!
//! git then runs `mwxml-flatten <file>` for both sides of a diff and compares the outputs. The
//! binary therefore takes exactly one positional argument, writes nothing but the flattened
//! export to stdout and sends every diagnostic to stderr. Invalid arguments lead to an empty
//! stdout and a successful exit, errors while reading the export to a failing exit status.
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use mwxml_flatten::config::{FlattenConfig, MissingTextPolicy};
//! use mwxml_flatten::flatten::flatten_file;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FlattenConfig::for_export_version("0.10")
//!         .with_missing_text(MissingTextPolicy::BlankLine);
//!     flatten_file("export.mwxml", &config, std::io::stdout().lock())?;
//!     Ok(())
//! }
//! ```
//!
//! Pages can also be read one by one:
//!
//! ```rust,no_run
//! use mwxml_flatten::config::FlattenConfig;
//! use mwxml_flatten::export_parser::ExportParser;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reader = BufReader::new(File::open("export.mwxml")?);
//!     let mut parser = ExportParser::new(reader, &FlattenConfig::default());
//!
//!     while let Some(page) = parser.parse_page()? {
//!         println!("{}: {} bytes", page.title, page.text().map_or(0, str::len));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules and API
//!
//! - [`config`]: which export schema namespace to match and what to do with pages that have no
//!   revision text.
//! - [`export_parser`]: streaming reader that turns `<page>` elements into [`export_parser::FlatPage`]s.
//! - [`flatten`]: writes pages in the flattened format, plus the one-call entry points
//!   [`flatten::flatten`] and [`flatten::flatten_file`].
//! - [`cli`]: the command line of the `mwxml-flatten` binary.
//!
//! ## Matching rules
//!
//! - Elements are matched by namespace-qualified name. Only the namespace configured in
//!   [`config::FlattenConfig::namespace_uri`] counts, by default the one of export schema 0.9
//!   (`http://www.mediawiki.org/xml/export-0.9/`). Exports of other schema versions produce no
//!   output unless the matching version is configured.
//! - Every `page` element below the root is one block, in the order of the start tags. Pages
//!   nested in a page are blocks of their own, after the enclosing page.
//! - The title is the first `title` element inside the page.
//! - The text is the first `text` element inside any `revision` of the page. Only the first
//!   revision in document order is shown, even if the export contains the full history.
//! - Text is written exactly as the XML parser reports it: entities are resolved and line
//!   endings normalized to `\n`, nothing else is changed.
//!
//! ## Logging and Error Handling
//!
//! - Uses the `tracing` crate for warnings (e.g. pages without text, unexpected root element)
//!   and debugging output. The binary installs a `tracing-subscriber` writing to stderr.
//! - The whole export is parsed before anything is written, so an error never leaves partial
//!   output behind.
//!
//! ## Licensing
//!
//! This program is free software: you can redistribute it and/or modify it under the terms of
//! the GNU General Public License as published by the Free Software Foundation, either version 3
//! of the License, or (at your option) any later version.

pub mod cli;
pub mod config;
pub mod export_parser;
pub mod flatten;
#[cfg(test)]
mod test_support;
mod utils;
