//! Path normalization
//!
//! Every path the driver hands us goes through [`normalize`] before a backend
//! ever sees it. Normalization is a pure string transform; it never consults a
//! filesystem.
//!
//! # Canonical form
//!
//! | Rule | Example |
//! |------|---------|
//! | `\` becomes `/` | `a\b` → `a/b` |
//! | Adjacent separators collapse | `a//b` → `a/b` |
//! | `.` segments are dropped | `a/./b` → `a/b` |
//! | `..` removes the preceding segment | `a/b/../c` → `a/c` |
//! | `..` above the root fails | `a/../../b` → [`NormalizationError::EscapesRoot`] |
//! | Trailing `/` iff the input named a directory | `a/b/` stays, `a/b` stays |
//!
//! # Prefixes
//!
//! A prefix is never resolved through: the root `/`, a drive (`C:` or `C:/`),
//! or a home reference (`~` / `~name/`). Home references are kept opaque and
//! are not expanded.

use std::fmt;

use thiserror::Error;

/// The canonical separator.
pub const SEPARATOR: char = '/';

/// The separator rewritten to [`SEPARATOR`].
const OTHER_SEPARATOR: char = '\\';

/// Why a raw path could not be normalized.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationError {
    /// The path contains a null character.
    #[error("path contains a null byte")]
    IllegalByte,

    /// A `..` segment tried to climb above the root.
    #[error("path escapes the root")]
    EscapesRoot,

    /// The path starts with a malformed prefix (e.g. a leading `:`).
    #[error("path has an invalid prefix")]
    InvalidPrefix,
}

/// A path in canonical form.
///
/// Only [`normalize`] and the helpers on this type construct one, so holding a
/// `NormalizedPath` means the invariants in the module docs hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath(String);

/// Normalize a raw path.
///
/// The empty string normalizes to itself. See the module docs for the rules.
pub fn normalize(raw: &str) -> Result<NormalizedPath, NormalizationError> {
    if raw.is_empty() {
        return Ok(NormalizedPath(String::new()));
    }
    if raw.contains('\0') {
        return Err(NormalizationError::IllegalByte);
    }

    let unified: String = raw
        .chars()
        .map(|c| if c == OTHER_SEPARATOR { SEPARATOR } else { c })
        .collect();
    let (prefix, rest) = split_prefix(&unified)?;

    let mut trailing = rest.ends_with(SEPARATOR);
    let mut stack: Vec<&str> = Vec::new();
    let mut segments = rest.split(SEPARATOR).filter(|s| !s.is_empty()).peekable();

    while let Some(segment) = segments.next() {
        let last = segments.peek().is_none();
        match segment {
            "." => trailing |= last,
            ".." => {
                if stack.pop().is_none() {
                    return Err(NormalizationError::EscapesRoot);
                }
                trailing |= last;
            }
            name => stack.push(name),
        }
    }

    if stack.is_empty() {
        return Ok(NormalizedPath(prefix));
    }

    let mut out = prefix;
    let relative = out.is_empty();
    out.push_str(&stack.join("/"));
    if trailing {
        out.push(SEPARATOR);
    }

    // `x/../~` resolves to a string that now starts with a prefix; give it the
    // prefix treatment so a second pass is a no-op.
    if relative && !split_prefix(&out)?.0.is_empty() {
        return normalize(&out);
    }

    Ok(NormalizedPath(out))
}

/// Normalize a path known to denote a directory.
///
/// Same as [`normalize`] but the result always carries exactly one trailing
/// separator.
pub fn normalize_directory(raw: &str) -> Result<NormalizedPath, NormalizationError> {
    normalize(raw).map(NormalizedPath::into_directory)
}

/// Split a separator-unified path into its opaque prefix and the remainder.
fn split_prefix(s: &str) -> Result<(String, &str), NormalizationError> {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return Ok((String::new(), s));
    };

    match first {
        ':' => Err(NormalizationError::InvalidPrefix),
        SEPARATOR => Ok((SEPARATOR.to_string(), &s[1..])),
        '~' => match s[1..].find(SEPARATOR) {
            // `~name` with nothing after it: the whole input is the prefix
            None => Ok((format!("{s}{SEPARATOR}"), "")),
            Some(idx) => {
                let end = idx + 2;
                Ok((s[..end].to_string(), &s[end..]))
            }
        },
        _ => {
            if chars.next() != Some(':') {
                return Ok((String::new(), s));
            }
            if !first.is_ascii_alphabetic() {
                return Err(NormalizationError::InvalidPrefix);
            }
            let end = if s[2..].starts_with(SEPARATOR) { 3 } else { 2 };
            Ok((s[..end].to_string(), &s[end..]))
        }
    }
}

impl NormalizedPath {
    /// The root directory.
    pub fn root() -> Self {
        Self(SEPARATOR.to_string())
    }

    /// Borrow the canonical string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the canonical string.
    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the path carries a trailing separator.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with(SEPARATOR)
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1 && self.is_directory()
    }

    /// The path without its trailing separator (the root stays `/`).
    pub fn trimmed(&self) -> &str {
        if self.0.len() > 1 {
            self.0.strip_suffix(SEPARATOR).unwrap_or(&self.0)
        } else {
            &self.0
        }
    }

    /// The last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() || self.is_empty() {
            return None;
        }
        let trimmed = self.trimmed();
        let name = match trimmed.rfind(SEPARATOR) {
            Some(idx) => &trimmed[idx + 1..],
            None => trimmed,
        };
        (!name.is_empty()).then_some(name)
    }

    /// The containing directory, in directory form.
    pub fn parent(&self) -> Option<NormalizedPath> {
        if self.is_root() {
            return None;
        }
        let trimmed = self.trimmed();
        trimmed
            .rfind(SEPARATOR)
            .map(|idx| NormalizedPath(trimmed[..=idx].to_string()))
    }

    /// Append a child name and normalize the result.
    pub fn join(&self, name: &str) -> Result<NormalizedPath, NormalizationError> {
        if self.is_empty() {
            return normalize(name);
        }
        normalize(&format!("{}{SEPARATOR}{name}", self.trimmed()))
    }

    /// This path with exactly one trailing separator.
    pub fn into_directory(mut self) -> Self {
        if !self.is_directory() {
            self.0.push(SEPARATOR);
        }
        self
    }

    /// A copy of this path in directory form.
    pub fn as_directory(&self) -> Self {
        self.clone().into_directory()
    }

    /// Non-empty segments, prefix included.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NormalizedPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NormalizedPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        normalize(raw).unwrap().into_string()
    }

    #[test]
    fn empty_is_identity() {
        assert_eq!(norm(""), "");
    }

    #[test]
    fn root_only() {
        assert_eq!(norm("/"), "/");
        assert_eq!(norm("\\"), "/");
    }

    #[test]
    fn separators_only_collapse_to_root() {
        assert_eq!(norm("//"), "/");
        assert_eq!(norm("\\\\\\"), "/");
        assert_eq!(norm("/\\/"), "/");
    }

    #[test]
    fn separator_equivalence() {
        assert_eq!(normalize("a\\b/c"), normalize("a/b/c"));
        assert_eq!(norm("\\docs\\a.txt"), "/docs/a.txt");
    }

    #[test]
    fn adjacent_separators_collapse() {
        assert_eq!(norm("/a//b///c"), "/a/b/c");
    }

    #[test]
    fn dot_segments_are_removed() {
        assert_eq!(norm("/a/./b"), "/a/b");
        assert_eq!(norm("./a"), "a");
        assert_eq!(norm("/a/."), "/a/");
        assert_eq!(norm("."), "");
    }

    #[test]
    fn dot_dot_resolves_against_sibling() {
        assert_eq!(norm("a/b/../c"), "a/c");
        assert_eq!(normalize("a/b/../c"), normalize("a/c"));
        assert_eq!(norm("/a/b/.."), "/a/");
        assert_eq!(norm("/a/.."), "/");
    }

    #[test]
    fn escaping_the_root_fails() {
        assert_eq!(
            normalize("a/../../b"),
            Err(NormalizationError::EscapesRoot)
        );
        assert_eq!(normalize("/.."), Err(NormalizationError::EscapesRoot));
        assert_eq!(normalize(".."), Err(NormalizationError::EscapesRoot));
        assert_eq!(
            normalize("/a/b/../../../c"),
            Err(NormalizationError::EscapesRoot)
        );
    }

    #[test]
    fn null_byte_is_rejected() {
        assert_eq!(
            normalize("/a\0b"),
            Err(NormalizationError::IllegalByte)
        );
    }

    #[test]
    fn trailing_separator_policy() {
        assert_eq!(norm("/docs/"), "/docs/");
        assert_eq!(norm("/docs//"), "/docs/");
        assert_eq!(norm("/docs"), "/docs");
        assert_eq!(
            normalize_directory("/docs").unwrap().as_str(),
            "/docs/"
        );
        assert_eq!(
            normalize_directory("/docs/").unwrap().as_str(),
            "/docs/"
        );
    }

    #[test]
    fn home_prefix_is_opaque() {
        assert_eq!(norm("~"), "~/");
        assert_eq!(norm("~user"), "~user/");
        assert_eq!(norm("~user/a/../b"), "~user/b");
        assert_eq!(
            normalize("~/.."),
            Err(NormalizationError::EscapesRoot)
        );
    }

    #[test]
    fn drive_prefix() {
        assert_eq!(norm("C:\\Users\\..\\data"), "C:/data");
        assert_eq!(norm("C:"), "C:");
        assert_eq!(norm("C:a\\b"), "C:a/b");
        assert_eq!(normalize("C:/.."), Err(NormalizationError::EscapesRoot));
    }

    #[test]
    fn invalid_prefix() {
        assert_eq!(normalize(":a"), Err(NormalizationError::InvalidPrefix));
        assert_eq!(normalize("1:a"), Err(NormalizationError::InvalidPrefix));
    }

    #[test]
    fn resolved_prefix_is_stable() {
        let once = normalize("x/../~").unwrap();
        assert_eq!(once.as_str(), "~/");
        assert_eq!(normalize(once.as_str()).unwrap(), once);
    }

    #[test]
    fn idempotent_on_samples() {
        for raw in [
            "", "/", "a", "a/", "/a/b/../c/", "\\x\\.\\y", "~", "~u", "C:", "C:/x/",
            "./././", "a/b/c/../..", "/a//./b/",
        ] {
            let once = normalize(raw).unwrap();
            assert_eq!(normalize(once.as_str()).unwrap(), once, "input {raw:?}");
        }
    }

    #[test]
    fn helpers() {
        let p = normalize("/docs/a.txt").unwrap();
        assert_eq!(p.file_name(), Some("a.txt"));
        assert_eq!(p.parent().unwrap().as_str(), "/docs/");
        assert!(!p.is_directory());

        let dir = normalize("/docs/").unwrap();
        assert_eq!(dir.file_name(), Some("docs"));
        assert_eq!(dir.trimmed(), "/docs");
        assert_eq!(dir.parent().unwrap(), NormalizedPath::root());

        let root = NormalizedPath::root();
        assert!(root.is_root());
        assert_eq!(root.file_name(), None);
        assert_eq!(root.parent(), None);
        assert_eq!(root.join("a.txt").unwrap().as_str(), "/a.txt");
        assert_eq!(
            dir.join("../.."),
            Err(NormalizationError::EscapesRoot)
        );
        assert_eq!(dir.segments().collect::<Vec<_>>(), vec!["docs"]);
    }
}
