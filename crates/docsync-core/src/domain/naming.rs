//! File name normalization and extension filtering
//!
//! Source systems store extensions with inconsistent casing (`report.PDF`).
//! Downstream matching in the index expects the lowercase form, so names are
//! normalized before upload and the extension check is case-insensitive.

/// Set of file extensions the index accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    /// Lowercase extensions including the leading dot, longest first
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Builds a filter from extensions such as `".pdf"` or `"docx"`
    ///
    /// A missing leading dot is added and casing is folded.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref().trim().to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .filter(|ext| ext.len() > 1)
            .collect();
        // Longest first so compound extensions win over their suffixes
        extensions.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        extensions.dedup();
        Self { extensions }
    }

    /// Returns the configured extensions
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns the supported extension `name` ends with, compared case-insensitively
    fn matching_extension(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.extensions
            .iter()
            .find(|ext| lower.ends_with(ext.as_str()))
            .map(String::as_str)
    }

    /// Returns true if the lowercase name ends with a supported extension
    pub fn is_supported(&self, name: &str) -> bool {
        self.matching_extension(name).is_some()
    }

    /// Rewrites a supported extension to its lowercase form
    ///
    /// Names with an unsupported extension are returned unchanged.
    pub fn normalize(&self, name: &str) -> String {
        match self.matching_extension(name) {
            Some(ext) => {
                let split = name
                    .char_indices()
                    .rev()
                    .nth(ext.chars().count() - 1)
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                format!("{}{}", &name[..split], ext)
            }
            None => name.to_string(),
        }
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new([".pdf", ".txt", ".docx", ".doc"])
    }
}
