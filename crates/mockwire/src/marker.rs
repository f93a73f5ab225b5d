//! Marker identifiers recognized by the marked-member strategies

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag selecting a field or method for injection.
///
/// Plays the role of an injection annotation; any number of conventions can
/// be active at once by putting several markers in one `MarkerSet`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(Cow<'static, str>);

impl Marker {
    pub const INJECT: Marker = Marker(Cow::Borrowed("inject"));
    pub const AUTOWIRED: Marker = Marker(Cow::Borrowed("autowired"));

    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Marker {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Marker {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered set of markers
pub type MarkerSet = BTreeSet<Marker>;

/// Markers honored when nothing else is configured
pub fn default_markers() -> MarkerSet {
    [Marker::INJECT, Marker::AUTOWIRED].into_iter().collect()
}

/// Build a `MarkerSet` from anything convertible to markers
pub fn markers<I, M>(items: I) -> MarkerSet
where
    I: IntoIterator<Item = M>,
    M: Into<Marker>,
{
    items.into_iter().map(Into::into).collect()
}
