//! Template loader factory: locations, directory walking, relocation.

use super::registry::TemplateRegistry;
use super::{TplError, TplResult};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const RELOCATE_DIR_NAME: &str = ".litedao";

/// One place templates are loaded from.
#[derive(Debug, Clone)]
pub enum Location {
    /// An XML file, or a directory walked recursively for XML files.
    Path(PathBuf),
    /// Content shipped inside the binary (`include_str!`); relocated to disk
    /// before registration so mtime tracking applies uniformly.
    InMemory { name: String, content: String },
}

/// Builds a `TemplateRegistry` from a list of locations.
#[derive(Debug, Default)]
pub struct TemplateLoaderBuilder {
    locations: Vec<Location>,
    relocate_root: Option<PathBuf>,
}

impl TemplateLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file or directory location.
    pub fn location(mut self, path: impl Into<PathBuf>) -> Self {
        self.locations.push(Location::Path(path.into()));
        self
    }

    /// Adds an in-memory document under the given file name.
    pub fn in_memory(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.locations.push(Location::InMemory {
            name: name.into(),
            content: content.into(),
        });
        self
    }

    /// Overrides the relocation root (default `~/.litedao`).
    pub fn relocate_to(mut self, root: impl Into<PathBuf>) -> Self {
        self.relocate_root = Some(root.into());
        self
    }

    /// Loads every location into a fresh registry.
    ///
    /// Explicit file locations must parse; non-XML entries inside directory
    /// locations are skipped.
    pub fn load(self) -> TplResult<TemplateRegistry> {
        let mut registry = TemplateRegistry::new();
        // One run directory per load, created lazily on first in-memory
        // location, keyed by wall-clock millis like `~/.litedao/1724800000000`.
        let mut run_dir: Option<PathBuf> = None;

        for location in self.locations {
            match location {
                Location::Path(path) if path.is_dir() => {
                    debug!(
                        "event=template_load module=tpl status=start kind=dir path={}",
                        path.display()
                    );
                    load_dir(&mut registry, &path)?;
                }
                Location::Path(path) => {
                    debug!(
                        "event=template_load module=tpl status=start kind=file path={}",
                        path.display()
                    );
                    registry.refresh_from(&path)?;
                }
                Location::InMemory { name, content } => {
                    let dir = match &run_dir {
                        Some(dir) => dir.clone(),
                        None => {
                            let dir = create_run_dir(self.relocate_root.as_deref())?;
                            run_dir = Some(dir.clone());
                            dir
                        }
                    };
                    let target = dir.join(&name);
                    std::fs::write(&target, content).map_err(|source| TplError::Relocate {
                        path: target.clone(),
                        source,
                    })?;
                    debug!(
                        "event=template_relocate module=tpl status=ok name={} path={}",
                        name,
                        target.display()
                    );
                    registry.refresh_from(&target)?;
                }
            }
        }

        info!(
            "event=template_load module=tpl status=ok count={}",
            registry.len()
        );
        Ok(registry)
    }
}

/// Default relocation root: `~/.litedao`, temp dir when home is unknown.
pub fn default_relocate_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(RELOCATE_DIR_NAME)
}

fn create_run_dir(root: Option<&Path>) -> TplResult<PathBuf> {
    let root = root
        .map(Path::to_path_buf)
        .unwrap_or_else(default_relocate_root);
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = root.join(millis.to_string());
    std::fs::create_dir_all(&dir).map_err(|source| TplError::Relocate {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

fn load_dir(registry: &mut TemplateRegistry, dir: &Path) -> TplResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| TplError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| TplError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            load_dir(registry, &path)?;
        } else if path.extension().is_some_and(|ext| ext == "xml") {
            registry.refresh_from(&path)?;
        } else {
            debug!(
                "event=template_load module=tpl status=skipped reason=not_xml path={}",
                path.display()
            );
        }
    }
    Ok(())
}
