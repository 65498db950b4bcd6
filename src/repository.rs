use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use regex::Regex;

use crate::{
    access::{AccessLevel, Tier},
    error::{JournalError, Result},
    frontmatter::{self, FrontMatter},
    metadata::{self, MetadataIndex},
    storage::Storage,
};

pub(crate) const DOCS_DIR: &str = "docs";
pub(crate) const INDEX_DOCUMENT: &str = "index.md";

const WELCOME: &str =
    "# Welcome to My Minimal Git Journal\n\nWrite an introduction to your project here.";

fn generated_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})-#(\d+)\.md$").unwrap())
}

fn document_key(filename: &str) -> String {
    format!("{DOCS_DIR}/{filename}")
}

fn check_filename(filename: &str) -> Result<()> {
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
    {
        return Err(JournalError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Sort key putting `YYYY-MM-DD-#n.md` in (date, n) order before other names.
fn name_order(filename: &str) -> (u8, String, u64) {
    match generated_name_pattern().captures(filename) {
        Some(caps) => (0, caps[1].to_string(), caps[2].parse().unwrap_or(u64::MAX)),
        None => (1, filename.to_string(), 0),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Created {
    pub filename: String,
    pub title: String,
    pub access: AccessLevel,
}

/// Markdown documents under `docs/` plus the metadata index that mirrors them.
pub(crate) struct Repository {
    storage: Box<dyn Storage>,
}

impl Repository {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn index(&self) -> Result<MetadataIndex> {
        metadata::load_index(self.storage())
    }

    pub fn create(&self, markdown: &str) -> Result<Created> {
        self.create_on(Local::now().date_naive(), markdown)
    }

    pub fn create_on(&self, date: NaiveDate, markdown: &str) -> Result<Created> {
        let doc = frontmatter::parse(markdown);
        if doc.front.title.is_empty() {
            return Err(JournalError::Validation("title"));
        }
        if doc.front.major.is_empty() {
            return Err(JournalError::Validation("대분류"));
        }

        let filename = self.next_filename(date);
        self.storage.write(
            &document_key(&filename),
            &frontmatter::serialize(&doc.front, &doc.body),
        )?;

        let mut index = self.index()?;
        index.insert(filename.clone(), doc.front.clone());
        metadata::save_index(self.storage(), &index)?;

        self.ensure_index_document()?;

        info!("created {filename} ({:?}, {})", doc.front.title, doc.front.access);
        Ok(Created {
            filename,
            title: doc.front.title,
            access: doc.front.access,
        })
    }

    fn next_filename(&self, date: NaiveDate) -> String {
        let date = date.format("%Y-%m-%d");
        (1..)
            .map(|n| format!("{date}-#{n}.md"))
            .find(|name| !self.storage.exists(&document_key(name)))
            .unwrap_or_default()
    }

    fn ensure_index_document(&self) -> Result<()> {
        let key = document_key(INDEX_DOCUMENT);
        if !self.storage.exists(&key) {
            debug!("writing welcome page {key}");
            self.storage.write(&key, WELCOME)?;
        }
        Ok(())
    }

    /// Idempotent: absent entries and files are not an error.
    pub fn delete(&self, filename: &str) -> Result<()> {
        check_filename(filename)?;

        let mut index = self.index()?;
        if index.remove(filename).is_some() {
            metadata::save_index(self.storage(), &index)?;
        }
        if self.storage.remove(&document_key(filename))? {
            info!("deleted {filename}");
        } else {
            debug!("{filename} was already gone");
        }
        Ok(())
    }

    /// Only the title reaches the index; the rest of the front matter and the
    /// new body go to the file alone. The title must stay on one header line.
    pub fn edit(&self, filename: &str, title: &str, body: &str) -> Result<()> {
        check_filename(filename)?;
        if title.contains(['\n', '\r']) {
            return Err(JournalError::Validation("title"));
        }

        let key = document_key(filename);
        let Some(current) = self.storage.read(&key)? else {
            return Err(JournalError::NotFound(filename.to_string()));
        };
        self.storage.write(
            &key,
            &frontmatter::rewrite_title_and_body(&current, title, body),
        )?;

        let mut index = self.index()?;
        if let Some(entry) = index.get_mut(filename) {
            entry.title = title.to_string();
            metadata::save_index(self.storage(), &index)?;
        } else {
            warn!("{filename} is not in the metadata index; only the file was updated");
        }

        info!("edited {filename}");
        Ok(())
    }

    pub fn read(&self, filename: &str) -> Result<Option<String>> {
        check_filename(filename)?;
        Ok(self.storage.read(&document_key(filename))?)
    }

    pub fn visible(&self, tier: Tier) -> Result<Vec<(String, FrontMatter)>> {
        Ok(self
            .index()?
            .iter()
            .filter(|(_, e)| tier.can_see(&e.access))
            .map(|(n, e)| (n.to_string(), e.clone()))
            .collect())
    }

    /// Rebuilds the index from the files in `docs/`. Returns how many
    /// documents were indexed.
    pub fn reindex(&self) -> Result<usize> {
        let mut names: Vec<String> = self
            .storage
            .list(DOCS_DIR)?
            .into_iter()
            .filter(|n| n.ends_with(".md") && n.as_str() != INDEX_DOCUMENT)
            .collect();
        names.sort_by_key(|n| name_order(n));

        let mut index = MetadataIndex::default();
        for name in names {
            let Some(content) = self.storage.read(&document_key(&name))? else {
                continue;
            };
            let front = frontmatter::parse(&content).front;
            if front.title.is_empty() || front.major.is_empty() {
                warn!("{name} lacks title or 대분류. skipping...");
                continue;
            }
            index.insert(name, front);
        }
        metadata::save_index(self.storage(), &index)?;

        info!("reindexed {} documents", index.len());
        Ok(index.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::METADATA_FILE, storage::FsStorage};
    use tempfile::TempDir;

    fn repository() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(Box::new(FsStorage::new(dir.path())));
        (dir, repo)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn doc(title: &str, major: &str, access: &str) -> String {
        format!(
            "---\ntitle: \"{title}\"\n대분류: \"{major}\"\n중분류: \"mid\"\n소분류: \"{title}\"\ntags: [\"t\"]\naccess_level: \"{access}\"\n---\n\nbody of {title}\n"
        )
    }

    #[test]
    fn create_writes_document_index_entry_and_welcome_page() {
        let (_dir, repo) = repository();
        let created = repo
            .create_on(day(), "---\ntitle:\"T1\"\n대분류:\"Cat\"\naccess_level:\"work\"\n---\nhello")
            .unwrap();
        assert_eq!(created.filename, "2024-03-09-#1.md");
        assert_eq!(created.title, "T1");
        assert_eq!(created.access, AccessLevel::Work);

        let index = repo.index().unwrap();
        assert_eq!(index.len(), 1);
        let entry = index.get("2024-03-09-#1.md").unwrap();
        assert_eq!(entry.title, "T1");
        assert_eq!(entry.access, AccessLevel::Work);

        assert_eq!(
            repo.read("2024-03-09-#1.md").unwrap().unwrap(),
            concat!(
                "---\n",
                "title: \"T1\"\n",
                "대분류: \"Cat\"\n",
                "중분류: \"\"\n",
                "소분류: \"\"\n",
                "tags: []\n",
                "access_level: \"work\"\n",
                "---\n",
                "\n",
                "hello",
            )
        );
        assert_eq!(repo.read(INDEX_DOCUMENT).unwrap().as_deref(), Some(WELCOME));
    }

    #[test]
    fn welcome_page_is_never_overwritten() {
        let (_dir, repo) = repository();
        repo.storage()
            .write(&document_key(INDEX_DOCUMENT), "# mine")
            .unwrap();
        repo.create_on(day(), &doc("a", "A", "personal")).unwrap();
        assert_eq!(repo.read(INDEX_DOCUMENT).unwrap().as_deref(), Some("# mine"));
    }

    #[test]
    fn filenames_count_up_per_day() {
        let (_dir, repo) = repository();
        let names: Vec<String> = (0..12)
            .map(|i| repo.create_on(day(), &doc(&i.to_string(), "A", "work")).unwrap().filename)
            .collect();
        let expected: Vec<String> = (1..=12).map(|n| format!("2024-03-09-#{n}.md")).collect();
        assert_eq!(names, expected);

        let next_day = day().succ_opt().unwrap();
        assert_eq!(
            repo.create_on(next_day, &doc("x", "A", "work")).unwrap().filename,
            "2024-03-10-#1.md"
        );
    }

    #[test]
    fn filename_gaps_are_reused() {
        let (_dir, repo) = repository();
        for i in 0..3 {
            repo.create_on(day(), &doc(&i.to_string(), "A", "work")).unwrap();
        }
        repo.delete("2024-03-09-#2.md").unwrap();
        assert_eq!(
            repo.create_on(day(), &doc("again", "A", "work")).unwrap().filename,
            "2024-03-09-#2.md"
        );
    }

    #[test]
    fn missing_required_fields_write_nothing() {
        let (_dir, repo) = repository();
        repo.create_on(day(), &doc("kept", "A", "work")).unwrap();
        let before = repo.storage().read(METADATA_FILE).unwrap();

        let err = repo
            .create_on(day(), "---\n대분류: \"Cat\"\n---\nbody")
            .unwrap_err();
        assert!(matches!(err, JournalError::Validation("title")));
        let err = repo
            .create_on(day(), "---\ntitle: \"T\"\n---\nbody")
            .unwrap_err();
        assert!(matches!(err, JournalError::Validation(_)));
        let err = repo.create_on(day(), "no front matter").unwrap_err();
        assert!(matches!(err, JournalError::Validation(_)));

        assert!(!repo.storage().exists(&document_key("2024-03-09-#2.md")));
        assert_eq!(repo.storage().read(METADATA_FILE).unwrap(), before);
    }

    #[test]
    fn delete_undoes_create() {
        let (_dir, repo) = repository();
        repo.create_on(day(), &doc("a", "A", "work")).unwrap();
        let before = repo.index().unwrap();

        let created = repo.create_on(day(), &doc("b", "B", "admin")).unwrap();
        repo.delete(&created.filename).unwrap();

        assert_eq!(repo.index().unwrap(), before);
        assert_eq!(repo.read(&created.filename).unwrap(), None);
    }

    #[test]
    fn deleting_unknown_document_changes_nothing() {
        let (_dir, repo) = repository();
        repo.create_on(day(), &doc("a", "A", "work")).unwrap();
        let index = repo.storage().read(METADATA_FILE).unwrap();
        let files = repo.storage().list(DOCS_DIR).unwrap();

        repo.delete("2000-01-01-#1.md").unwrap();
        repo.delete("2000-01-01-#1.md").unwrap();

        assert_eq!(repo.storage().read(METADATA_FILE).unwrap(), index);
        assert_eq!(repo.storage().list(DOCS_DIR).unwrap().len(), files.len());
    }

    #[test]
    fn delete_removes_unindexed_file() {
        let (_dir, repo) = repository();
        repo.storage().write(&document_key("stray.md"), "x").unwrap();
        repo.delete("stray.md").unwrap();
        assert_eq!(repo.read("stray.md").unwrap(), None);
    }

    #[test]
    fn edit_changes_title_and_body_only() {
        let (_dir, repo) = repository();
        let created = repo.create_on(day(), &doc("old", "A", "work")).unwrap();
        let before = repo.read(&created.filename).unwrap().unwrap();

        repo.edit(&created.filename, "new", "replaced body").unwrap();

        let after = repo.read(&created.filename).unwrap().unwrap();
        let header = |s: &str| -> Vec<String> {
            s.lines()
                .skip(1)
                .take_while(|l| *l != "---")
                .filter(|l| !l.starts_with("title:"))
                .map(str::to_string)
                .collect()
        };
        assert_eq!(header(&before), header(&after));
        assert!(after.contains("\ntitle: \"new\"\n"));

        let parsed = frontmatter::parse(&after);
        assert_eq!(parsed.front.title, "new");
        assert_eq!(parsed.body, "replaced body");

        let entry = repo.index().unwrap().get(&created.filename).cloned().unwrap();
        assert_eq!(entry.title, "new");
        assert_eq!(entry.minor, "old");
        assert_eq!(entry.access, AccessLevel::Work);
    }

    #[test]
    fn edit_does_not_reread_other_fields_into_index() {
        let (_dir, repo) = repository();
        let created = repo.create_on(day(), &doc("a", "A", "work")).unwrap();
        let key = document_key(&created.filename);
        let changed = repo
            .storage()
            .read(&key)
            .unwrap()
            .unwrap()
            .replace("access_level: \"work\"", "access_level: \"admin\"");
        repo.storage().write(&key, &changed).unwrap();

        repo.edit(&created.filename, "b", "body").unwrap();
        let entry = repo.index().unwrap().get(&created.filename).cloned().unwrap();
        assert_eq!(entry.title, "b");
        assert_eq!(entry.access, AccessLevel::Work);
    }

    #[test]
    fn edit_rejects_multiline_titles() {
        let (_dir, repo) = repository();
        let created = repo.create_on(day(), &doc("a", "A", "admin")).unwrap();
        let before = repo.read(&created.filename).unwrap();
        let index = repo.storage().read(METADATA_FILE).unwrap();

        for title in ["x\"\naccess_level: \"work", "x\r\ny", "x\r"] {
            let err = repo.edit(&created.filename, title, "b").unwrap_err();
            assert!(matches!(err, JournalError::Validation("title")), "{title:?}");
        }
        assert_eq!(repo.read(&created.filename).unwrap(), before);
        assert_eq!(repo.storage().read(METADATA_FILE).unwrap(), index);
    }

    #[test]
    fn mutations_keep_index_entries_of_unusual_shape() {
        let (_dir, repo) = repository();
        repo.storage()
            .write(
                METADATA_FILE,
                r#"{"2024-03-08-#1.md": {"title": "old", "대분류": "A", "tags": "x"}}"#,
            )
            .unwrap();

        let created = repo.create_on(day(), &doc("new", "A", "work")).unwrap();
        let index = repo.index().unwrap();
        let names: Vec<&str> = index.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["2024-03-08-#1.md", created.filename.as_str()]);
        assert_eq!(index.get("2024-03-08-#1.md").unwrap().title, "old");

        repo.delete(&created.filename).unwrap();
        assert!(repo.index().unwrap().get("2024-03-08-#1.md").is_some());
    }

    #[test]
    fn edit_of_missing_document_fails() {
        let (_dir, repo) = repository();
        let err = repo.edit("2024-03-09-#1.md", "t", "b").unwrap_err();
        assert!(matches!(err, JournalError::NotFound(_)));
        assert!(repo.index().unwrap().is_empty());
    }

    #[test]
    fn path_components_are_rejected() {
        let (_dir, repo) = repository();
        for name in ["../metadata.json", "a/b.md", "..", ""] {
            assert!(matches!(
                repo.read(name).unwrap_err(),
                JournalError::InvalidFilename(_)
            ));
            assert!(repo.delete(name).is_err());
        }
    }

    #[test]
    fn visible_filters_by_tier() {
        let (_dir, repo) = repository();
        repo.create_on(day(), &doc("p", "A", "personal")).unwrap();
        repo.create_on(day(), &doc("w", "A", "work")).unwrap();
        repo.create_on(day(), &doc("a", "A", "admin")).unwrap();

        let titles = |tier| -> Vec<String> {
            repo.visible(tier)
                .unwrap()
                .into_iter()
                .map(|(_, e)| e.title)
                .collect()
        };
        assert_eq!(titles(Tier::Admin), vec!["p", "w", "a"]);
        assert_eq!(titles(Tier::Work), vec!["p", "w"]);
    }

    #[test]
    fn reindex_rebuilds_from_files() {
        let (_dir, repo) = repository();
        for i in 0..11 {
            repo.create_on(day(), &doc(&format!("d{i}"), "A", "work")).unwrap();
        }
        repo.storage()
            .write(&document_key("notes.md"), &doc("notes", "N", "personal"))
            .unwrap();
        repo.storage()
            .write(&document_key("broken.md"), "no front matter")
            .unwrap();
        repo.storage().write(METADATA_FILE, "garbage").unwrap();

        assert_eq!(repo.reindex().unwrap(), 12);
        let index = repo.index().unwrap();
        let names: Vec<&str> = index.iter().map(|(n, _)| n).collect();
        assert_eq!(names[0], "2024-03-09-#1.md");
        assert_eq!(names[1], "2024-03-09-#2.md");
        assert_eq!(names[10], "2024-03-09-#11.md");
        assert_eq!(names[11], "notes.md");
        assert!(index.get(INDEX_DOCUMENT).is_none());
        assert!(index.get("broken.md").is_none());
    }
}
