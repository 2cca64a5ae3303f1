//! Automation Surface
//!
//! The slice of the CAD application's automation object model that the
//! document handler drives. Bindings implement these traits; errors are
//! reported as `anyhow::Error` and passed through untouched.

pub mod memory;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use memory::{Call, FailPoint, MemoryApplication, MemoryConnector, MemoryDocument, MemoryDocuments};

/// Kind of document the application can create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Part,
    Product,
    Drawing,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Part,
        DocumentKind::Product,
        DocumentKind::Drawing,
    ];

    /// Type name used by the application's `Add` call
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Part => "Part",
            DocumentKind::Product => "Product",
            DocumentKind::Drawing => "Drawing",
        }
    }

    /// Native file extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Part => "CATPart",
            DocumentKind::Product => "CATProduct",
            DocumentKind::Drawing => "CATDrawing",
        }
    }

    /// Infer the kind from a file's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown document kind '{}' (expected Part, Product or Drawing)",
                    s
                )
            })
    }
}

/// Establishes a session with the running application
pub trait Connector {
    type Application: Application;

    fn connect(&self) -> Result<Self::Application>;
}

/// Application-level object
pub trait Application {
    type Documents: Documents;
    type Document: Document;

    /// The application's document collection
    fn documents(&self) -> Result<Self::Documents>;

    /// The currently active document
    fn active_document(&self) -> Result<Self::Document>;
}

/// Document collection
pub trait Documents {
    /// Open an existing file; it becomes the active document
    fn open(&self, path: &Path) -> Result<()>;

    /// Create a new document of `kind`; it becomes the active document
    fn add(&self, kind: DocumentKind) -> Result<()>;

    fn count(&self) -> Result<usize>;
}

/// A single open document
pub trait Document {
    fn name(&self) -> Result<String>;

    /// Path on disk, `None` for documents that were never saved
    fn full_name(&self) -> Result<Option<PathBuf>>;

    /// Close the document, consuming the handle
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("part".parse::<DocumentKind>().unwrap(), DocumentKind::Part);
        assert_eq!("Product".parse::<DocumentKind>().unwrap(), DocumentKind::Product);
        assert_eq!(" DRAWING".parse::<DocumentKind>().unwrap(), DocumentKind::Drawing);

        let err = "Assembly".parse::<DocumentKind>().unwrap_err();
        assert!(err.to_string().contains("Assembly"));
    }

    #[test]
    fn test_kind_from_path() {
        assert_eq!(
            DocumentKind::from_path(Path::new("tests/bracket.CATPart")),
            Some(DocumentKind::Part)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("asm.catproduct")),
            Some(DocumentKind::Product)
        );
        assert_eq!(DocumentKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(DocumentKind::from_path(Path::new("no_extension")), None);
    }
}
