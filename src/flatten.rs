use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use tracing::instrument;

use crate::{
    config::{FlattenConfig, MissingTextPolicy},
    export_parser::{ExportParser, FlatPage, ParsingError},
};

/// Prefix of the header line emitted for every page.
pub const PAGE_HEADER_PREFIX: &str = "PAGE: ";

#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    #[error("failed to open `{}`", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse export")]
    Parsing(#[from] ParsingError),
    #[error("page `{title}` has no revision text")]
    MissingText { title: String },
    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}

/// Sequential writer of flattened page blocks.
///
/// Every block is a `PAGE: <title>` line followed by the revision text and a line break.
/// Lines always end in `\n` and the output is UTF-8, independent of the platform.
pub struct PageWriter<W: Write> {
    sink: W,
    missing_text: MissingTextPolicy,
}

impl<W: Write> PageWriter<W> {
    pub fn new(sink: W, missing_text: MissingTextPolicy) -> Self {
        Self { sink, missing_text }
    }

    pub fn write_page(&mut self, page: &FlatPage) -> Result<(), FlattenError> {
        let text = page.text();
        if text.is_none() && self.missing_text == MissingTextPolicy::Abort {
            return Err(FlattenError::MissingText {
                title: page.title.clone(),
            });
        }

        self.sink.write_all(PAGE_HEADER_PREFIX.as_bytes())?;
        self.sink.write_all(page.title.as_bytes())?;
        self.sink.write_all(b"\n")?;

        match text {
            Some(text) => {
                self.sink.write_all(text.as_bytes())?;
                self.sink.write_all(b"\n")?;
            }
            None => {
                tracing::warn!(message = "Page has no revision text", title = page.title.as_str(), policy = ?self.missing_text);
                if self.missing_text == MissingTextPolicy::BlankLine {
                    self.sink.write_all(b"\n")?;
                }
            }
        }

        Ok(())
    }

    pub fn finish(mut self) -> Result<W, FlattenError> {
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Flatten the export read from `reader` into `sink`.
///
/// The whole document is parsed before anything is written, so on error `sink` stays untouched.
#[instrument(skip_all)]
pub fn flatten<R: BufRead, W: Write>(
    reader: R,
    config: &FlattenConfig,
    sink: W,
) -> Result<(), FlattenError> {
    let pages = ExportParser::new(reader, config).parse_all()?;

    if config.missing_text == MissingTextPolicy::Abort {
        if let Some(page) = pages.iter().find(|page| page.text().is_none()) {
            tracing::error!(
                message = "Aborting, page has no revision text",
                title = page.title.as_str()
            );
            return Err(FlattenError::MissingText {
                title: page.title.clone(),
            });
        }
    }

    let mut writer = PageWriter::new(sink, config.missing_text);
    for page in &pages {
        writer.write_page(page)?;
    }
    writer.finish()?;

    tracing::info!(message = "Flattened export", pages = pages.len());
    Ok(())
}

/// Flatten the export stored at `path` into `sink`.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn flatten_file<W: Write>(
    path: impl AsRef<Path>,
    config: &FlattenConfig,
    sink: W,
) -> Result<(), FlattenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FlattenError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    flatten(BufReader::new(file), config, sink)
}
