//! Import-path normalization
//!
//! Schema bundles are often authored for a directory layout different from the one they
//! are validated in (`../../CommonTypes/v14/CommonTypes-Schema.xsd`). Inside the sandbox
//! every bundle file is a flat sibling, so each `schemaLocation` that points at a known
//! bundle file is rewritten to that file's bare name.
//!
//! Only the values of `schemaLocation` attributes are ever rewritten. A value is matched
//! against the bundle files with these rules, stopping at the first hit:
//!
//! 1. the value contains a bundle file name starting a path segment
//!    (`../v1/Common-Schema.xsd`), tried for every file before any base-name rule;
//!    this also covers values ending in `/<file name>`;
//! 2. the value ends in `<base><suffix>.xsd` right after a path separator;
//! 3. the value has a directory segment equal to `<base>` (`CommonTypes/v14/...`).
//!
//! A file name embedded inside a longer segment (`MoreTypes.xsd` for `Types.xsd`) does
//! not count as a match.
//!
//! `<base>` is the file name without its `-Schema.xsd` or `.xsd` suffix. Values matching
//! nothing are left untouched, as is all text outside `schemaLocation` values, so a
//! document that only uses bare names comes back unchanged.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Cached regex for `schemaLocation` attributes (preceded by whitespace, so
/// `xsi:schemaLocation` is left alone)
static SCHEMA_LOCATION_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_schema_location_regex() -> &'static Regex {
    SCHEMA_LOCATION_REGEX.get_or_init(|| {
        Regex::new(r#"(\s)schemaLocation(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#)
            .expect("Failed to compile schemaLocation regex")
    })
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Strip the `-Schema.xsd` or `.xsd` suffix from a schema file name
pub fn base_name(file_name: &str) -> &str {
    file_name
        .strip_suffix("-Schema.xsd")
        .or_else(|| file_name.strip_suffix(".xsd"))
        .unwrap_or(file_name)
}

#[derive(Debug, Clone)]
struct BundleFile {
    file_name: String,
    base: String,
}

impl BundleFile {
    fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            base: base_name(file_name).to_string(),
        }
    }

    /// Rule 1: the file name appears in the value at the start of a path segment
    fn named_in(&self, value: &str) -> bool {
        value.match_indices(&self.file_name).any(|(i, _)| {
            value[..i]
                .chars()
                .next_back()
                .is_none_or(is_separator)
        })
    }

    /// Rule 2: `<sep><base><anything>.xsd` at the end of the value
    fn versioned_file_in(&self, value: &str) -> bool {
        if self.base.is_empty() {
            return false;
        }
        match value.rfind(is_separator) {
            Some(sep) => {
                let last = &value[sep + 1..];
                last.starts_with(&self.base) && last.ends_with(".xsd")
            }
            None => false,
        }
    }

    /// Rule 3: a directory segment of the value equals the base name
    fn folder_in(&self, value: &str) -> bool {
        if self.base.is_empty() {
            return false;
        }
        let mut segments: Vec<&str> = value.split(is_separator).collect();
        segments.pop();
        segments.iter().any(|segment| *segment == self.base)
    }
}

/// Rewrites `schemaLocation` values to bare bundle file names
#[derive(Debug, Clone)]
pub struct ImportNormalizer {
    files: Vec<BundleFile>,
}

impl ImportNormalizer {
    /// Normalizer for references to `file_names`
    pub fn new<I, S>(file_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            files: file_names
                .into_iter()
                .map(|name| BundleFile::new(name.as_ref()))
                .filter(|file| !file.file_name.is_empty())
                .collect(),
        }
    }

    /// Bare file name a `schemaLocation` value should point at, if it names a bundle file
    pub fn resolve_location(&self, value: &str) -> Option<&str> {
        let file = self
            .files
            .iter()
            .find(|file| file.named_in(value))
            .or_else(|| {
                self.files
                    .iter()
                    .find(|file| file.versioned_file_in(value) || file.folder_in(value))
            })?;
        Some(file.file_name.as_str())
    }

    /// Rewrite every `schemaLocation` in `content` that refers to a bundle file
    pub fn normalize<'a>(&self, content: &'a str) -> Cow<'a, str> {
        get_schema_location_regex().replace_all(content, |caps: &Captures| {
            let whole = &caps[0];
            let (value, quote) = match (caps.get(3), caps.get(4)) {
                (Some(value), _) => (value.as_str(), '"'),
                (None, Some(value)) => (value.as_str(), '\''),
                (None, None) => return whole.to_string(),
            };

            match self.resolve_location(value) {
                Some(file_name) if file_name != value => {
                    tracing::trace!(from = %value, to = %file_name, "rewriting schemaLocation");
                    format!(
                        "{}schemaLocation{}{quote}{file_name}{quote}",
                        &caps[1], &caps[2]
                    )
                }
                _ => whole.to_string(),
            }
        })
    }
}
