use crate::error::VfsError;
use std::fmt;

/// A normalized, site-rooted virtual path such as `/Views/Home/Index.cshtml`.
///
/// Parsing accepts the application-relative `~/` prefix and backslash separators, folds `.`
/// and `..` segments and refuses anything that would climb above the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath {
    normalized: String,
}

impl VirtualPath {
    /// The site root, `/`.
    #[must_use]
    pub fn root() -> Self {
        Self { normalized: "/".to_owned() }
    }

    /// # Errors
    /// * [`VfsError::InvalidPath`] for an empty path or one containing NUL.
    /// * [`VfsError::PathTraversalAttempt`] when `..` segments escape the root.
    pub fn parse(raw: &str) -> Result<Self, VfsError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains('\0') {
            return Err(VfsError::InvalidPath { message: raw.to_owned().into(), context: None });
        }

        let unified = trimmed.replace('\\', "/");
        let relative = unified.strip_prefix('~').unwrap_or(&unified);

        let mut segments: Vec<&str> = Vec::new();
        for segment in relative.split('/') {
            match segment {
                "" | "." => {},
                ".." => {
                    if segments.pop().is_none() {
                        return Err(VfsError::PathTraversalAttempt {
                            message: raw.to_owned().into(),
                            context: Some("Virtual path attempted to climb above the site root".into()),
                        });
                    }
                },
                other => segments.push(other),
            }
        }

        Ok(Self { normalized: format!("/{}", segments.join("/")) })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.normalized == "/"
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.normalized.split('/').filter(|s| !s.is_empty())
    }

    /// The last segment, if the path is not the root.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// The extension of the last segment, without the dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(dot) => Some(&name[dot + 1..]),
        }
    }

    /// Case-insensitive extension check against a whitelist.
    #[must_use]
    pub fn has_extension<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        self.extension()
            .is_some_and(|ext| allowed.iter().any(|a| a.as_ref().eq_ignore_ascii_case(ext)))
    }

    /// Partial views carry a file name starting with `_`.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.file_name().is_some_and(|name| name.starts_with('_'))
    }

    /// The part of the path below `root`, without a leading separator.
    ///
    /// Segment-wise and case-insensitive, so `/Site` owns `/site/a.css` but not `/Sitemap`.
    #[must_use]
    pub fn relative_to(&self, root: &Self) -> Option<&str> {
        if root.is_root() {
            return Some(&self.normalized[1..]);
        }
        let prefix = root.as_str();
        let head = self.normalized.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        match &self.normalized[prefix.len()..] {
            "" => Some(""),
            rest => rest.strip_prefix('/'),
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

impl TryFrom<&str> for VirtualPath {
    type Error = VfsError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_app_relative_and_windows_paths() {
        let path = VirtualPath::parse("~/Views\\Home/./Index.cshtml").unwrap();
        assert_eq!(path.as_str(), "/Views/Home/Index.cshtml");
        assert_eq!(path.file_name(), Some("Index.cshtml"));
        assert_eq!(path.extension(), Some("cshtml"));
        assert!(!path.is_partial());

        let folded = VirtualPath::parse("/Content/css/../img//logo.png").unwrap();
        assert_eq!(folded.as_str(), "/Content/img/logo.png");
    }

    #[test]
    fn rejects_escapes_and_blank_input() {
        assert!(matches!(
            VirtualPath::parse("~/../secret.txt"),
            Err(VfsError::PathTraversalAttempt { .. })
        ));
        assert!(matches!(VirtualPath::parse("  "), Err(VfsError::InvalidPath { .. })));
        assert!(VirtualPath::parse("/").unwrap().is_root());
    }

    #[test]
    fn partials_and_dotfiles() {
        assert!(VirtualPath::parse("/Views/Shared/_Partial.cshtml").unwrap().is_partial());
        assert_eq!(VirtualPath::parse("/.hidden").unwrap().extension(), None);
        assert!(
            VirtualPath::parse("/Views/A.CSHTML").unwrap().has_extension(&["cshtml", "vbhtml"])
        );
    }

    #[test]
    fn relative_to_respects_segment_boundaries() {
        let site = VirtualPath::parse("/Site").unwrap();
        let inside = VirtualPath::parse("/site/Views/Index.cshtml").unwrap();
        let sibling = VirtualPath::parse("/Sitemap.xml").unwrap();

        assert_eq!(inside.relative_to(&site), Some("Views/Index.cshtml"));
        assert_eq!(sibling.relative_to(&site), None);
        assert_eq!(inside.relative_to(&VirtualPath::root()), Some("site/Views/Index.cshtml"));
    }
}
