//! Region strings of the form `name`, `name:start-end`, `name:start-` or `name:-end`.
//!
//! Only the reference name of a region is honoured; sub-ranges are reported and
//! ignored when regions are reduced to reference names.

use tracing::warn;

/// A parsed region. Coordinates are kept exactly as written (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub ref_name: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl Region {
    /// Parse a region string.
    ///
    /// A trailing `:start-end` is only treated as a range when both sides are
    /// empty or numeric (thousands separators allowed), so contig names that
    /// themselves contain colons survive intact.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if let Some((name, range)) = text.rsplit_once(':') {
            if let Some((start, end)) = range.split_once('-') {
                if let (Some(start), Some(end)) = (parse_coord(start), parse_coord(end)) {
                    if !name.is_empty() {
                        return Self {
                            ref_name: name.to_string(),
                            start,
                            end,
                        };
                    }
                }
            }
        }

        Self {
            ref_name: text.to_string(),
            start: None,
            end: None,
        }
    }

    /// True when the region names a sub-range rather than a whole reference
    #[must_use]
    pub fn has_range(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ref_name)?;
        if self.has_range() {
            let fmt_coord = |c: Option<u64>| c.map(|c| c.to_string()).unwrap_or_default();
            write!(f, ":{}-{}", fmt_coord(self.start), fmt_coord(self.end))?;
        }
        Ok(())
    }
}

/// `Some(None)` for an empty side, `Some(Some(n))` for a number, `None` otherwise.
fn parse_coord(text: &str) -> Option<Option<u64>> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Some(None);
    }
    cleaned.parse().ok().map(Some)
}

/// Reduce region strings to the reference names to process, in order.
///
/// Sub-ranges are logged and ignored; repeated names are kept once.
pub fn reference_names<S: AsRef<str>>(regions: &[S]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for region in regions.iter().map(|r| Region::parse(r.as_ref())) {
        if region.has_range() {
            warn!("Ignoring start:end for '{}'.", region);
        }
        if !names.contains(&region.ref_name) {
            names.push(region.ref_name);
        }
    }
    names
}
