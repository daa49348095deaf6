/// Namespace of the MediaWiki export schema version 0.9.
///
/// This is what `Special:Export` produced around MediaWiki 1.22-1.25 and is the schema matched
/// unless another one is configured.
pub const EXPORT_NAMESPACE_0_9: &str = "http://www.mediawiki.org/xml/export-0.9/";

const EXPORT_NAMESPACE_PREFIX: &str = "http://www.mediawiki.org/xml/export-";

/// What to do with a page whose first revision has no text.
///
/// This happens when a page has no `<revision>` at all, when its revisions carry no `<text>`,
/// or when the first text is revision-deleted (`<text deleted="deleted" />`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MissingTextPolicy {
    /// Emit only the `PAGE:` header and log a warning.
    #[default]
    Skip,
    /// Emit the `PAGE:` header followed by an empty line and log a warning.
    BlankLine,
    /// Fail the whole run without writing anything.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenConfig {
    /// Only elements in this namespace are matched (`page`, `title`, `revision`, `text`).
    pub namespace_uri: String,
    pub missing_text: MissingTextPolicy,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            namespace_uri: EXPORT_NAMESPACE_0_9.to_string(),
            missing_text: MissingTextPolicy::default(),
        }
    }
}

impl FlattenConfig {
    /// Configuration matching the export schema `version`, e.g. `"0.10"` or `"0.11"`.
    pub fn for_export_version(version: &str) -> Self {
        Self::default().with_namespace(export_namespace(version))
    }

    pub fn with_namespace(mut self, namespace_uri: impl Into<String>) -> Self {
        self.namespace_uri = namespace_uri.into();
        self
    }

    pub fn with_missing_text(mut self, policy: MissingTextPolicy) -> Self {
        self.missing_text = policy;
        self
    }
}

/// Namespace URI of the MediaWiki export schema `version`.
pub fn export_namespace(version: &str) -> String {
    format!("{EXPORT_NAMESPACE_PREFIX}{version}/")
}
