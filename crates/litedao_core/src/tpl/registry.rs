//! Template registry with mtime-driven refresh.

use super::xml::parse_document;
use super::{TplError, TplResult};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// One registered SQL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Registry key.
    pub name: String,
    /// Raw template text handed to the rendering engine.
    pub text: String,
    /// Backing-file mtime at registration, epoch milliseconds.
    pub last_modified_ms: i64,
    /// Backing file; `None` only for templates put directly into the registry.
    pub source: Option<PathBuf>,
}

/// Engine-facing lookup seam.
///
/// `find_template` may re-read backing files; `last_modified` lets an engine
/// with zero update delay poll for staleness without a full lookup.
pub trait TemplateLoader {
    fn find_template(&mut self, name: &str) -> TplResult<Option<Template>>;
    fn last_modified(&self, name: &str) -> Option<i64>;
}

/// Name-to-template registry backed by XML files on disk.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    entries: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces one template.
    pub fn put(&mut self, template: Template) {
        self.entries.insert(template.name.clone(), template);
    }

    /// Registered names, sorted for deterministic listings.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-parses one backing file and replaces every template it defines.
    pub(crate) fn refresh_from(&mut self, path: &Path) -> TplResult<()> {
        let text = std::fs::read_to_string(path).map_err(|source| TplError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = parse_document(&text).map_err(|source| TplError::Xml {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = mtime_ms(path)?;
        for node in doc.templates {
            debug!(
                "event=template_refresh module=tpl status=ok name={} path={}",
                node.name,
                path.display()
            );
            self.put(Template {
                name: node.name,
                text: node.template,
                last_modified_ms: modified,
                source: Some(path.to_path_buf()),
            });
        }
        Ok(())
    }
}

impl TemplateLoader for TemplateRegistry {
    fn find_template(&mut self, name: &str) -> TplResult<Option<Template>> {
        let backing = self
            .entries
            .get(name)
            .and_then(|entry| entry.source.clone().map(|path| (path, entry.last_modified_ms)));

        if let Some((path, recorded_ms)) = backing {
            // Not `>`: a restored older file must also trigger a refresh.
            if mtime_ms(&path)? != recorded_ms {
                self.refresh_from(&path)?;
            }
        }

        Ok(self.entries.get(name).cloned())
    }

    fn last_modified(&self, name: &str) -> Option<i64> {
        let entry = self.entries.get(name)?;
        match &entry.source {
            Some(path) => mtime_ms(path).ok(),
            None => Some(entry.last_modified_ms),
        }
    }
}

pub(crate) fn mtime_ms(path: &Path) -> TplResult<i64> {
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| TplError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
    Ok(since_epoch.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::{Template, TemplateLoader, TemplateRegistry};

    fn free_template(name: &str, text: &str) -> Template {
        Template {
            name: name.to_string(),
            text: text.to_string(),
            last_modified_ms: 42,
            source: None,
        }
    }

    #[test]
    fn put_and_find_without_backing_file() {
        let mut registry = TemplateRegistry::new();
        registry.put(free_template("q", "SELECT 1"));

        let found = registry.find_template("q").unwrap().unwrap();
        assert_eq!(found.text, "SELECT 1");
        assert_eq!(registry.last_modified("q"), Some(42));
    }

    #[test]
    fn unknown_name_is_none() {
        let mut registry = TemplateRegistry::new();
        assert!(registry.find_template("missing").unwrap().is_none());
        assert_eq!(registry.last_modified("missing"), None);
    }

    #[test]
    fn put_replaces_by_name() {
        let mut registry = TemplateRegistry::new();
        registry.put(free_template("q", "SELECT 1"));
        registry.put(free_template("q", "SELECT 2"));
        assert_eq!(registry.len(), 1);
        let found = registry.find_template("q").unwrap().unwrap();
        assert_eq!(found.text, "SELECT 2");
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = TemplateRegistry::new();
        registry.put(free_template("b", ""));
        registry.put(free_template("a", ""));
        assert_eq!(registry.names(), vec!["a", "b"]);
    }
}
