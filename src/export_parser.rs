use std::{
    any::type_name_of_val, collections::VecDeque, fmt::Debug, io::BufRead, str::Utf8Error,
};

use quick_xml::{
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
    NsReader,
};
use tracing::instrument;

use crate::{config::FlattenConfig, utils::normalize_line_endings};

// the tags relevant for flattening, all in the configured export namespace
// every other element (and every element in another namespace) is `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    MediaWiki, // <mediawiki version="0.9" ...other attributes>...</mediawiki> is the root tag
    Page,      // <page>...tags are (title, ns, id, revision)</page>
    Title,     // <title>blah</title>
    Revision,  // <revision>...tags are (id, timestamp, contributor, text, sha1, comment, )</revision>
    Text { deleted: bool }, // <text xml:space="preserve" bytes="20">blah</text> or <text deleted="deleted" />
    Other,
}

impl Tag {
    fn from_start_bytes(e: &BytesStart, in_namespace: bool) -> Result<Self, ParsingError> {
        if !in_namespace {
            return Ok(Tag::Other);
        }

        match e.local_name().as_ref() {
            b"mediawiki" => Ok(Tag::MediaWiki),
            b"page" => Ok(Tag::Page),
            b"title" => Ok(Tag::Title),
            b"revision" => Ok(Tag::Revision),
            b"text" => {
                let mut deleted = false;
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    if attr.key.local_name().as_ref() == b"deleted" {
                        deleted = true;
                    }
                }
                Ok(Tag::Text { deleted })
            }
            _ => Ok(Tag::Other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RevisionText {
    Normal(String),
    /// The revision text was suppressed in the export (`<text deleted="deleted" />`).
    Deleted,
}

/// One `<page>` of the export, reduced to what the flattened output shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlatPage {
    pub title: String,
    /// Text of the first revision in document order, `None` if the page has no revision text.
    pub text: Option<RevisionText>,
}

impl FlatPage {
    /// The revision text, if there is one that wasn't deleted.
    pub fn text(&self) -> Option<&str> {
        match &self.text {
            Some(RevisionText::Normal(text)) => Some(text.as_str()),
            Some(RevisionText::Deleted) | None => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("XML error")]
    XmlError(#[from] quick_xml::Error),
    #[error("invalid escape sequence in character data")]
    EscapeError(#[from] quick_xml::escape::EscapeError),
    #[error("character data is not valid UTF-8")]
    NonUtf8Text(#[from] Utf8Error),
    #[error("undeclared namespace prefix `{0}`")]
    UnknownPrefix(String),
    #[error("document has no root element")]
    MissingRoot,
    #[error("unexpected end of file")]
    Eof,
    #[error("page #{index} has no <title> element")]
    MissingTitle { index: usize },
}

// leading character data of a `<title>` or `<text>` element
#[derive(Debug)]
struct Capture {
    // length of the tag path while inside the element
    depth: usize,
    value: String,
    // set once a child node shows up, later character data belongs to the child's tail
    interrupted: bool,
}

impl Capture {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            value: String::new(),
            interrupted: false,
        }
    }

    fn wants(&self, depth: usize) -> bool {
        self.depth == depth && !self.interrupted
    }
}

#[derive(Debug)]
struct PageBuilder {
    index: usize,
    // position of the `<page>` tag in the tag path
    depth: usize,
    title: Option<String>,
    text: Option<RevisionText>,
    title_capture: Option<Capture>,
    text_capture: Option<Capture>,
}

impl PageBuilder {
    fn new(index: usize, depth: usize) -> Self {
        Self {
            index,
            depth,
            title: None,
            text: None,
            title_capture: None,
            text_capture: None,
        }
    }

    fn captures_mut(&mut self) -> impl Iterator<Item = &mut Capture> {
        self.title_capture
            .iter_mut()
            .chain(self.text_capture.iter_mut())
    }

    /// Read up to and including the next `<page>` element.
    ///
    /// Returns `Ok(None)` once the document is exhausted.
    pub fn parse_page(&mut self) -> Result<Option<FlatPage>, ParsingError> {
        let span = tracing::span!(tracing::Level::DEBUG, "parse_page", index = self.pages_read, title = tracing::field::Empty);
        let _entered = span.enter();

        loop {
            if let Some(flat_page) = self.ready_pages.pop_front() {
                self.pages_read += 1;
                span.record("title", flat_page.title.as_str());
                tracing::trace!(message = "Parsed page", has_text = flat_page.text().is_some());
                return Ok(Some(flat_page));
            }

            self.buf.clear();
            let (resolved, event) = self.xml_parser.read_resolved_event_into(&mut self.buf)?;
            let in_namespace = match resolved {
                ResolveResult::Bound(Namespace(ns)) => ns == self.namespace.as_slice(),
                ResolveResult::Unbound => false,
                ResolveResult::Unknown(prefix) => {
                    return Err(ParsingError::UnknownPrefix(
                        String::from_utf8_lossy(&prefix).into_owned(),
                    ));
                }
            };

            match event {
                Event::Start(ref e) => {
                    let tag = Tag::from_start_bytes(e, in_namespace)?;
                    if self.current_path.is_empty() && !self.seen_root {
                        self.seen_root = true;
                        Self::check_root(tag, e, &self.namespace);
                    }

                    for page in &mut self.open_pages {
                        page.start_element(tag, &self.current_path, false);
                    }
                    // the root element itself is never a page
                    if tag == Tag::Page && !self.current_path.is_empty() {
                        self.pages_started += 1;
                        self.open_pages
                            .push(PageBuilder::new(self.pages_started, self.current_path.len()));
                    }

                    self.current_path.push(tag);
                }
                Event::Empty(ref e) => {
                    let tag = Tag::from_start_bytes(e, in_namespace)?;
                    if self.current_path.is_empty() && !self.seen_root {
                        self.seen_root = true;
                        Self::check_root(tag, e, &self.namespace);
                    }

                    for page in &mut self.open_pages {
                        page.start_element(tag, &self.current_path, true);
                    }
                    if tag == Tag::Page && !self.current_path.is_empty() {
                        // <page /> has no title
                        self.pages_started += 1;
                        tracing::error!(
                            message = "Empty page element",
                            position = self.xml_parser.buffer_position()
                        );
                        return Err(ParsingError::MissingTitle {
                            index: self.pages_started,
                        });
                    }
                }
                Event::Text(ref e) => {
                    let depth = self.current_path.len();
                    if self.open_pages.iter().any(|p| p.wants_character_data(depth)) {
                        let raw = std::str::from_utf8(e)?;
                        let normalized = normalize_line_endings(raw);
                        let text = quick_xml::escape::unescape(&normalized)?;
                        for page in &mut self.open_pages {
                            page.character_data(&text, depth);
                        }
                    }
                }
                Event::CData(ref e) => {
                    let depth = self.current_path.len();
                    if self.open_pages.iter().any(|p| p.wants_character_data(depth)) {
                        let raw = std::str::from_utf8(e)?;
                        let text = normalize_line_endings(raw);
                        for page in &mut self.open_pages {
                            page.character_data(&text, depth);
                        }
                    }
                }
                Event::Comment(_) | Event::PI(_) => {
                    let depth = self.current_path.len();
                    for page in &mut self.open_pages {
                        page.child_node(depth);
                    }
                }
                Event::End(_) => {
                    let depth = self.current_path.len();
                    for page in &mut self.open_pages {
                        page.end_element(depth);
                    }
                    self.current_path.pop();

                    let depth = self.current_path.len();
                    if !self.open_pages.last().is_some_and(|p| p.depth == depth) {
                        continue;
                    }
                    let Some(builder) = self.open_pages.pop() else {
                        continue;
                    };

                    let index = builder.index;
                    let flat_page = builder.try_build().inspect_err(|_| {
                        tracing::error!(
                            message = "Page without title",
                            index,
                            page_end_position = self.xml_parser.buffer_position()
                        );
                    })?;
                    self.closed_pages.push((index, flat_page));

                    // enclosing pages come first, release once the outermost page is closed
                    if self.open_pages.is_empty() {
                        self.closed_pages.sort_unstable_by_key(|(index, _)| *index);
                        self.ready_pages
                            .extend(self.closed_pages.drain(..).map(|(_, page)| page));
                    }
                }
                Event::Eof => {
                    if !self.current_path.is_empty() {
                        tracing::error!(open_pages = ?self.open_pages, current_path = ?self.current_path);
                        return Err(ParsingError::Eof);
                    }
                    if !self.seen_root {
                        return Err(ParsingError::MissingRoot);
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Read the whole document.
    #[instrument(skip(self), fields(namespace = %String::from_utf8_lossy(&self.namespace)))]
    pub fn parse_all(mut self) -> Result<Vec<FlatPage>, ParsingError> {
        let mut pages = Vec::new();
        while let Some(page) = self.parse_page()? {
            pages.push(page);
        }
        tracing::debug!(message = "Finished parsing export", pages = pages.len());
        Ok(pages)
    }
}
