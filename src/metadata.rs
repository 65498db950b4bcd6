use std::io;

use log::{info, warn};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{error::Result, frontmatter::FrontMatter, storage::Storage};

pub(crate) const METADATA_FILE: &str = "metadata.json";

/// Cached front matter of every document, keyed by filename, in insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MetadataIndex {
    entries: Vec<(String, FrontMatter)>,
}

impl MetadataIndex {
    pub fn get(&self, name: &str) -> Option<&FrontMatter> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FrontMatter> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    /// Replaces an existing entry in place, otherwise appends.
    pub fn insert(&mut self, name: String, entry: FrontMatter) {
        match self.get_mut(&name) {
            Some(existing) => *existing = entry,
            None => self.entries.push((name, entry)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FrontMatter> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrontMatter)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Only unparsable JSON or a non-object top level is an error. A single
    /// entry that is not an object is dropped with a warning.
    fn from_json(s: &str) -> serde_json::Result<Self> {
        let map: Map<String, Value> = serde_json::from_str(s)?;
        let mut index = MetadataIndex::default();
        for (name, value) in map {
            match serde_json::from_value::<FrontMatter>(value) {
                Ok(entry) => index.entries.push((name, entry)),
                Err(e) => warn!("Unreadable metadata entry {name:?}: {e}. skipping..."),
            }
        }
        Ok(index)
    }

    fn to_json(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl Serialize for MetadataIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

/// Absent or unreadable index content is an empty index.
pub(crate) fn load_index(storage: &dyn Storage) -> Result<MetadataIndex> {
    let Some(content) = storage.read(METADATA_FILE)? else {
        info!("Metadata index({METADATA_FILE}) does not exist. starting empty...");
        return Ok(MetadataIndex::default());
    };
    match MetadataIndex::from_json(&content) {
        Ok(index) => Ok(index),
        Err(e) => {
            warn!("Corrupt metadata index({METADATA_FILE}): {e}. treating as empty...");
            Ok(MetadataIndex::default())
        }
    }
}

pub(crate) fn save_index(storage: &dyn Storage, index: &MetadataIndex) -> Result<()> {
    let json = index.to_json()?;
    storage.write(METADATA_FILE, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{access::AccessLevel, storage::FsStorage};

    fn entry(title: &str) -> FrontMatter {
        FrontMatter {
            title: title.to_string(),
            major: "대".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn absent_or_corrupt_index_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        assert!(load_index(&storage).unwrap().is_empty());

        for corrupt in ["{not json", "[1, 2]", "\"a.md\""] {
            storage.write(METADATA_FILE, corrupt).unwrap();
            assert!(load_index(&storage).unwrap().is_empty(), "{corrupt}");
        }
    }

    #[test]
    fn odd_entries_do_not_empty_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage
            .write(
                METADATA_FILE,
                r#"{
                    "a.md": {"title": "A", "tags": "x"},
                    "b.md": {"title": "B", "tags": [3]},
                    "c.md": 5,
                    "d.md": {"title": "D"}
                }"#,
            )
            .unwrap();
        let index = load_index(&storage).unwrap();
        let names: Vec<&str> = index.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a.md", "b.md", "d.md"]);
        assert!(index.get("a.md").unwrap().tags.is_empty());
        assert_eq!(index.get("b.md").unwrap().tags, vec!["3"]);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        storage
            .write(METADATA_FILE, "{\"a.md\": {\"title\": \"A\"}}")
            .unwrap();
        let index = load_index(&storage).unwrap();
        let a = index.get("a.md").unwrap();
        assert_eq!(a.title, "A");
        assert_eq!(a.major, "");
        assert_eq!(a.access, AccessLevel::Personal);
    }

    #[test]
    fn keeps_insertion_order_across_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let mut index = MetadataIndex::default();
        for name in ["z.md", "a.md", "m.md"] {
            index.insert(name.to_string(), entry(name));
        }
        index.insert("a.md".to_string(), entry("replaced"));
        save_index(&storage, &index).unwrap();

        let loaded = load_index(&storage).unwrap();
        let names: Vec<&str> = loaded.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z.md", "a.md", "m.md"]);
        assert_eq!(loaded.get("a.md").unwrap().title, "replaced");
        assert_eq!(loaded, index);
    }

    #[test]
    fn writes_readable_json_with_original_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());
        let mut index = MetadataIndex::default();
        index.insert("a.md".to_string(), entry("제목"));
        save_index(&storage, &index).unwrap();

        let json = storage.read(METADATA_FILE).unwrap().unwrap();
        assert!(json.contains("\n    \"a.md\": {\n        \"title\": \"제목\","));
        assert!(json.contains("\"대분류\": \"대\""));
        assert!(json.contains("\"access_level\": \"personal\""));
    }

    #[test]
    fn remove_reports_missing_entries() {
        let mut index = MetadataIndex::default();
        index.insert("a.md".to_string(), entry("a"));
        assert!(index.remove("b.md").is_none());
        assert_eq!(index.remove("a.md"), Some(entry("a")));
        assert!(index.is_empty());
    }
}
