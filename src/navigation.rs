use crate::{access::Tier, metadata::MetadataIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NavEntry {
    pub major: String,
    pub mid: String,
    pub minor: String,
    pub filename: String,
}

/// Documents `viewer` may see, in index order. No viewer, no entries.
pub(crate) fn build(viewer: Option<Tier>, index: &MetadataIndex) -> Vec<NavEntry> {
    let Some(tier) = viewer else {
        return vec![];
    };
    index
        .iter()
        .filter(|(_, meta)| tier.can_see(&meta.access))
        .map(|(filename, meta)| NavEntry {
            major: meta.major.clone(),
            mid: meta.mid.clone(),
            minor: meta.minor.clone(),
            filename: filename.to_string(),
        })
        .collect()
}
