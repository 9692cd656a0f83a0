//! XML-backed SQL template registry and loader.
//!
//! # Responsibility
//! - Load named SQL text fragments from XML documents into a registry.
//! - Keep registered templates fresh via file modification time.
//!
//! # Invariants
//! - Refreshing from a backing file replaces entries by name and leaves
//!   unrelated entries intact.
//! - In-memory locations are relocated to disk before registration, so every
//!   registered template has uniform mtime tracking.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod loader;
mod registry;
mod xml;

pub use loader::{default_relocate_root, Location, TemplateLoaderBuilder};
pub use registry::{Template, TemplateLoader, TemplateRegistry};

pub type TplResult<T> = Result<T, TplError>;

/// Template subsystem error for IO, relocation and XML decoding.
#[derive(Debug)]
pub enum TplError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Xml {
        path: PathBuf,
        source: quick_xml::DeError,
    },
    Relocate {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for TplError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "template io failure at `{}`: {source}", path.display())
            }
            Self::Xml { path, source } => {
                write!(f, "invalid template xml in `{}`: {source}", path.display())
            }
            Self::Relocate { path, source } => {
                write!(
                    f,
                    "failed to relocate template to `{}`: {source}",
                    path.display()
                )
            }
        }
    }
}

impl Error for TplError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Xml { source, .. } => Some(source),
            Self::Relocate { source, .. } => Some(source),
        }
    }
}
