//! File name normalization and filtering

use std::collections::HashSet;

use bon::Builder;

/// Normalize a single byte of a path.
#[inline]
fn normalize_byte(b: u8) -> char {
    match b {
        b'A'..=b'Z' => (b + 32) as char,
        b'\\' => '/',
        b':' => '_',
        0..=0x1F | 0x7F..=0xFF => '_',
        _ => b as char,
    }
}

/// Normalize a raw archive path.
///
/// ASCII letters are lowercased, backslashes become forward slashes and control characters,
/// non-ASCII bytes and colons are replaced by underscores. The result is always ASCII.
pub fn normalize_bytes(name: &[u8]) -> String {
    name.iter().copied().map(normalize_byte).collect()
}

/// Normalize a path the way archive entries are keyed.
///
/// ```
/// assert_eq!(bgs_archive::normalize_name("Meshes\\X.NIF"), "meshes/x.nif");
/// ```
pub fn normalize_name(name: &str) -> String {
    normalize_bytes(name.as_bytes())
}

/// Selects which archive entries get indexed
///
/// All comparisons happen on normalized names. Patterns are normalized by
/// [`ArchiveFilter::normalized`] before an archive is scanned.
///
/// ```
/// use bgs_archive::ArchiveFilter;
///
/// let filter = ArchiveFilter::builder()
///     .include(vec!["textures/".into()])
///     .exclude(vec!["_n.dds".into()])
///     .build();
///
/// assert!(filter.matches("textures/rock.dds"));
/// assert!(!filter.matches("textures/rock_n.dds"));
/// assert!(!filter.matches("meshes/rock.nif"));
/// ```
#[derive(Debug, Clone, Default, Builder)]
pub struct ArchiveFilter {
    /// When not empty, a name must contain at least one of these substrings
    #[builder(default)]
    pub include: Vec<String>,

    /// A name must contain none of these substrings
    #[builder(default)]
    pub exclude: Vec<String>,

    /// When given, only these names are indexed
    pub names: Option<HashSet<String>>,
}

impl ArchiveFilter {
    /// Copy of this filter with every pattern and name normalized
    pub fn normalized(&self) -> ArchiveFilter {
        let normalize_all = |patterns: &[String]| -> Vec<String> {
            patterns.iter().map(|p| normalize_name(p)).collect()
        };

        ArchiveFilter {
            include: normalize_all(&self.include),
            exclude: normalize_all(&self.exclude),
            names: self
                .names
                .as_ref()
                .map(|names| names.iter().map(|n| normalize_name(n)).collect()),
        }
    }

    /// Whether a normalized name passes the filter
    pub fn matches(&self, name: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|p| name.contains(p.as_str())) {
            return false;
        }
        if self.exclude.iter().any(|p| name.contains(p.as_str())) {
            return false;
        }
        match &self.names {
            Some(names) => names.contains(name),
            None => true,
        }
    }

    /// Whether the filter lets every name through
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty() && self.names.is_none()
    }
}
