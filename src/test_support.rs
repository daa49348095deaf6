use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::{
    config::FlattenConfig,
    flatten::{flatten, FlattenError, PAGE_HEADER_PREFIX},
};

pub mod prelude {
    pub(crate) use super::proptest as proptest_support;
    pub(crate) use super::{expected_output, export_to_xml, flatten_str, TestPage};
    pub(crate) use proptest::prelude::*;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPage {
    pub title: String,
    /// Revision texts in document order.
    pub revisions: Vec<String>,
}

impl TestPage {
    pub fn new(title: &str, revisions: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            revisions: revisions.iter().map(|text| text.to_string()).collect(),
        }
    }
}

fn write_text_element(writer: &mut quick_xml::Writer<Cursor<&mut Vec<u8>>>, name: &str, text: &str) {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .unwrap();
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .unwrap();
    writer.write_event(Event::End(BytesEnd::new(name))).unwrap();
}

/// Serialize `pages` as a MediaWiki export in `namespace`, including the metadata noise
/// (`siteinfo`, ids, timestamps, contributors, hashes) a real export carries.
pub fn export_to_xml(pages: &[TestPage], namespace: &str) -> String {
    let mut xml = Vec::new();
    let mut writer = quick_xml::Writer::new(Cursor::new(&mut xml));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .unwrap();

    writer
        .write_event(Event::Start(BytesStart::new("mediawiki").with_attributes([
            ("xmlns", namespace),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
            ("version", "0.9"),
            ("xml:lang", "en"),
        ])))
        .unwrap();

    writer
        .write_event(Event::Start(BytesStart::new("siteinfo")))
        .unwrap();
    write_text_element(&mut writer, "sitename", "Test Wiki");
    write_text_element(&mut writer, "generator", "MediaWiki 1.24.2");
    writer
        .write_event(Event::End(BytesEnd::new("siteinfo")))
        .unwrap();

    let mut revision_id = 978;
    for (page_id, page) in (809..).zip(pages) {
        writer
            .write_event(Event::Start(BytesStart::new("page")))
            .unwrap();
        write_text_element(&mut writer, "title", &page.title);
        write_text_element(&mut writer, "ns", "0");
        write_text_element(&mut writer, "id", &page_id.to_string());

        for text in &page.revisions {
            revision_id += 1;
            writer
                .write_event(Event::Start(BytesStart::new("revision")))
                .unwrap();
            write_text_element(&mut writer, "id", &revision_id.to_string());
            write_text_element(&mut writer, "timestamp", "2015-06-05T11:40:53Z");

            writer
                .write_event(Event::Start(BytesStart::new("contributor")))
                .unwrap();
            write_text_element(&mut writer, "username", "Josef");
            write_text_element(&mut writer, "id", "1");
            writer
                .write_event(Event::End(BytesEnd::new("contributor")))
                .unwrap();

            write_text_element(&mut writer, "comment", "edit");

            let bytes_str = text.len().to_string();
            writer
                .write_event(Event::Start(BytesStart::new("text").with_attributes([
                    ("xml:space", "preserve"),
                    ("bytes", bytes_str.as_str()),
                ])))
                .unwrap();
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .unwrap();
            writer
                .write_event(Event::End(BytesEnd::new("text")))
                .unwrap();

            write_text_element(&mut writer, "sha1", "ooip0v8ejgrf3bxz3nmpbk4vwe93tu3");
            write_text_element(&mut writer, "model", "wikitext");
            write_text_element(&mut writer, "format", "text/x-wiki");
            writer
                .write_event(Event::End(BytesEnd::new("revision")))
                .unwrap();
        }

        writer
            .write_event(Event::End(BytesEnd::new("page")))
            .unwrap();
    }

    writer
        .write_event(Event::End(BytesEnd::new("mediawiki")))
        .unwrap();

    String::from_utf8(xml).unwrap()
}

/// Output the flattener must produce for `pages` with the default configuration.
pub fn expected_output(pages: &[TestPage]) -> String {
    let mut output = String::new();
    for page in pages {
        output.push_str(PAGE_HEADER_PREFIX);
        output.push_str(&page.title);
        output.push('\n');
        if let Some(text) = page.revisions.first() {
            output.push_str(text);
            output.push('\n');
        }
    }
    output
}

pub fn flatten_str(xml: &str, config: &FlattenConfig) -> Result<String, FlattenError> {
    let mut output = Vec::new();
    flatten(xml.as_bytes(), config, &mut output)?;
    Ok(String::from_utf8(output).unwrap())
}

pub mod proptest {
    use proptest::prelude::*;

    use super::TestPage;

    // no carriage returns: XML line-ending normalization would turn them into `\n`
    pub fn text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 \t\n<>&'\"\\[\\]:=|{}*#äß☺]{0,80}"
    }

    pub fn title() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 _:()&äß]{1,30}"
    }

    pub fn page() -> impl Strategy<Value = TestPage> {
        (title(), prop::collection::vec(text(), 0..4))
            .prop_map(|(title, revisions)| TestPage { title, revisions })
    }

    pub fn pages() -> impl Strategy<Value = Vec<TestPage>> {
        prop::collection::vec(page(), 0..8)
    }
}
