use compact_str::CompactString;
use indexmap::{set, IndexSet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    convert::Infallible,
    fmt::{self, Display},
    str::FromStr,
};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Scope {
    inner: IndexSet<CompactString>,
}

impl FromStr for Scope {
    type Err = Infallible;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.split_whitespace().collect())
    }
}

impl Scope {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn insert<Item>(&mut self, item: Item)
    where
        Item: Into<CompactString>,
    {
        self.inner.insert(item.into());
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Determine whether `self` can be accessed by `resource`
    ///
    /// This implies that `resource` is equal to or a superset of `self`
    #[inline]
    #[must_use]
    pub fn can_be_accessed_by(&self, resource: &Self) -> bool {
        resource.inner.is_superset(&self.inner)
    }

    /// Determine whether `self` is allowed to perform an action
    /// for which you at least need `resource` scope
    #[inline]
    #[must_use]
    pub fn can_perform(&self, resource: &Self) -> bool {
        self.inner.is_superset(&resource.inner)
    }

    /// Intersection of `self` with `entitled`, preserving the order of `self`
    ///
    /// This is the narrowing step of scope validation: the granted set may be
    /// a strict subset of what was requested.
    #[inline]
    #[must_use]
    pub fn narrow(&self, entitled: &Self) -> Self {
        self.inner
            .intersection(&entitled.inner)
            .cloned()
            .collect()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(CompactString::as_str)
    }
}

impl Display for Scope {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in itertools::intersperse(self.iter(), " ") {
            f.write_str(item)?;
        }

        Ok(())
    }
}

impl<Item> FromIterator<Item> for Scope
where
    Item: Into<CompactString>,
{
    #[inline]
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        iter.into_iter().fold(Scope::new(), |mut acc, item| {
            acc.insert(item.into());
            acc
        })
    }
}

impl IntoIterator for Scope {
    type Item = CompactString;
    type IntoIter = set::IntoIter<Self::Item>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl Serialize for Scope {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Scope {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = CompactString::deserialize(deserializer)?;
        Ok(raw.split_whitespace().collect())
    }
}
