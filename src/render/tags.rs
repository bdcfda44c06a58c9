//! Tag-variant selection

use std::collections::BTreeSet;

use crate::fragment::{Fragment, TagEntry};

/// Which tags are active for a render
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveTags {
    /// Every tag is active
    #[default]
    All,
    /// Only the named tags are active
    Only(BTreeSet<String>),
}

impl ActiveTags {
    pub fn only<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ActiveTags::Only(tags.into_iter().map(Into::into).collect())
    }

    /// No tag is active; every entry picks its inverted variant
    pub fn none() -> Self {
        ActiveTags::Only(BTreeSet::new())
    }

    pub fn is_active(&self, tag: &str) -> bool {
        match self {
            ActiveTags::All => true,
            ActiveTags::Only(tags) => tags.contains(tag),
        }
    }
}

/// Pick the variant of `entry` for the active tags: the normal fragment when
/// the tag is active, the inverted one otherwise. `None` means nothing is drawn.
pub fn select<'a>(entry: &'a TagEntry, active: &ActiveTags) -> Option<&'a Fragment> {
    if active.is_active(&entry.tag) {
        entry.normal.as_ref()
    } else {
        entry.inverted.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileId;

    fn entry(normal: Option<&str>, inverted: Option<&str>) -> TagEntry {
        TagEntry {
            tag: "lit".into(),
            normal: normal.map(|id| Fragment::Tile(TileId::from(id))),
            inverted: inverted.map(|id| Fragment::Tile(TileId::from(id))),
        }
    }

    #[test]
    fn active_tag_picks_normal() {
        let e = entry(Some("torch"), Some("sconce"));
        assert_eq!(
            select(&e, &ActiveTags::only(["lit"])),
            Some(&Fragment::Tile(TileId::from("torch")))
        );
        assert_eq!(
            select(&e, &ActiveTags::All),
            Some(&Fragment::Tile(TileId::from("torch")))
        );
    }

    #[test]
    fn inactive_tag_picks_inverted() {
        let e = entry(Some("torch"), Some("sconce"));
        assert_eq!(
            select(&e, &ActiveTags::none()),
            Some(&Fragment::Tile(TileId::from("sconce")))
        );
        assert_eq!(
            select(&e, &ActiveTags::only(["wet"])),
            Some(&Fragment::Tile(TileId::from("sconce")))
        );
    }

    #[test]
    fn absent_variant_selects_nothing() {
        assert_eq!(select(&entry(Some("torch"), None), &ActiveTags::none()), None);
        assert_eq!(select(&entry(None, Some("sconce")), &ActiveTags::All), None);
    }
}
