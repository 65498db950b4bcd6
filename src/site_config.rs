use log::{debug, info};
use serde_yaml::{Mapping, Value};

use crate::{
    error::{JournalError, Result},
    navigation::NavEntry,
    repository::INDEX_DOCUMENT,
    storage::Storage,
};

pub(crate) const MKDOCS_FILE: &str = "mkdocs.yml";

const DEFAULT_CONFIG: &str = "\
site_name: My Minimal Git Journal
theme:
  name: material
nav:
- Home: index.md
plugins:
- search
markdown_extensions:
- admonition
- codehilite
- toc:
    permalink: true
- footnotes
- meta
";

// major -> mid -> minor -> filename, each level in first-seen order
type Tree = Vec<(String, Vec<(String, Vec<(String, String)>)>)>;

fn find_or_push<'a, T: Default>(list: &'a mut Vec<(String, T)>, label: &str) -> &'a mut T {
    let pos = match list.iter().position(|(l, _)| l == label) {
        Some(pos) => pos,
        None => {
            list.push((label.to_string(), T::default()));
            list.len() - 1
        }
    };
    &mut list[pos].1
}

fn item(label: &str, value: Value) -> Value {
    let mut m = Mapping::new();
    m.insert(Value::from(label), value);
    Value::Mapping(m)
}

/// `nav` list: `Home` first, then one nested node per category. A repeated
/// minor label keeps the last filename.
pub(crate) fn navigation_value(entries: &[NavEntry]) -> Value {
    let mut tree: Tree = vec![];
    for e in entries {
        let mids = find_or_push(&mut tree, &e.major);
        let minors = find_or_push(mids, &e.mid);
        *find_or_push(minors, &e.minor) = e.filename.clone();
    }

    let mut nav = vec![item("Home", Value::from(INDEX_DOCUMENT))];
    for (major, mids) in tree {
        let mids = mids
            .into_iter()
            .map(|(mid, minors)| {
                let minors = minors
                    .into_iter()
                    .map(|(minor, filename)| item(&minor, Value::from(filename)))
                    .collect();
                item(&mid, Value::Sequence(minors))
            })
            .collect();
        nav.push(item(&major, Value::Sequence(mids)));
    }
    Value::Sequence(nav)
}

fn parse_config(content: &str) -> Result<Mapping> {
    match serde_yaml::from_str(content) {
        Ok(Value::Mapping(m)) => Ok(m),
        Ok(_) => Err(JournalError::Config(format!("{MKDOCS_FILE} is not a mapping"))),
        Err(e) => Err(JournalError::Config(format!("{MKDOCS_FILE}: {e}"))),
    }
}

/// Reads the site configuration, writing the default one first if absent.
pub(crate) fn load_or_init(storage: &dyn Storage) -> Result<Mapping> {
    match storage.read(MKDOCS_FILE)? {
        Some(content) => parse_config(&content),
        None => {
            info!("{MKDOCS_FILE} does not exist. writing default configuration...");
            storage.write(MKDOCS_FILE, DEFAULT_CONFIG)?;
            parse_config(DEFAULT_CONFIG)
        }
    }
}

pub(crate) fn save(storage: &dyn Storage, config: &Mapping) -> Result<()> {
    let yaml = serde_yaml::to_string(config)
        .map_err(|e| JournalError::Config(format!("{MKDOCS_FILE}: {e}")))?;
    storage.write(MKDOCS_FILE, &yaml)?;
    Ok(())
}

/// Replaces `nav` and leaves every other setting as it was.
pub(crate) fn sync_navigation(storage: &dyn Storage, entries: &[NavEntry]) -> Result<()> {
    let mut config = load_or_init(storage)?;
    config.insert(Value::from("nav"), navigation_value(entries));
    save(storage, &config)?;
    debug!("navigation rebuilt from {} documents", entries.len());
    Ok(())
}
