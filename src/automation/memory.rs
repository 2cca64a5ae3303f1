//! In-Memory Application
//!
//! A single-process stand-in for the CAD application. It keeps the set of
//! open documents and the active one, journals every automation call and can
//! be told to fail a chosen call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use serde::Serialize;

use super::{Application, Connector, Document, DocumentKind, Documents};

/// A journalled automation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Call {
    Connect,
    Documents,
    Open(PathBuf),
    Add(DocumentKind),
    ActiveDocument,
    Close(String),
}

/// Automation call that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Connect,
    Documents,
    Open,
    Add,
    ActiveDocument,
    Close,
}

#[derive(Debug, Clone)]
struct OpenDocument {
    id: u64,
    name: String,
    full_name: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct State {
    documents: Vec<OpenDocument>,
    active: Option<u64>,
    next_id: u64,
    created: HashMap<DocumentKind, u32>,
    journal: Vec<Call>,
    fail_on: Option<FailPoint>,
}

impl State {
    fn record(&mut self, call: Call, point: FailPoint) -> Result<()> {
        log::trace!("automation call: {:?}", call);
        self.journal.push(call);
        if self.fail_on == Some(point) {
            self.fail_on = None;
            bail!("automation call {:?} failed", point);
        }
        Ok(())
    }

    fn insert(&mut self, name: String, full_name: Option<PathBuf>) {
        self.next_id += 1;
        let id = self.next_id;
        self.documents.push(OpenDocument {
            id,
            name,
            full_name,
        });
        self.active = Some(id);
    }

    fn find(&self, id: u64) -> Result<&OpenDocument> {
        self.documents
            .iter()
            .find(|doc| doc.id == id)
            .ok_or_else(|| anyhow!("document {} is no longer open", id))
    }
}

/// Connects to the shared in-memory application
///
/// Every connection observes the same documents, so a handler that
/// reconnects sees what an earlier connection opened.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    state: Rc<RefCell<State>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call at `point` fail
    pub fn fail_on(&self, point: FailPoint) {
        self.state.borrow_mut().fail_on = Some(point);
    }

    /// All calls made so far, in order
    pub fn journal(&self) -> Vec<Call> {
        self.state.borrow().journal.clone()
    }

    /// Number of journalled calls matching `pred`
    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().journal.iter().filter(|c| pred(*c)).count()
    }

    /// Names of the documents currently open
    pub fn open_documents(&self) -> Vec<String> {
        self.state
            .borrow()
            .documents
            .iter()
            .map(|doc| doc.name.clone())
            .collect()
    }
}

impl Connector for MemoryConnector {
    type Application = MemoryApplication;

    fn connect(&self) -> Result<MemoryApplication> {
        self.state
            .borrow_mut()
            .record(Call::Connect, FailPoint::Connect)?;
        Ok(MemoryApplication {
            state: Rc::clone(&self.state),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryApplication {
    state: Rc<RefCell<State>>,
}

impl Application for MemoryApplication {
    type Documents = MemoryDocuments;
    type Document = MemoryDocument;

    fn documents(&self) -> Result<MemoryDocuments> {
        self.state
            .borrow_mut()
            .record(Call::Documents, FailPoint::Documents)?;
        Ok(MemoryDocuments {
            state: Rc::clone(&self.state),
        })
    }

    fn active_document(&self) -> Result<MemoryDocument> {
        let mut state = self.state.borrow_mut();
        state.record(Call::ActiveDocument, FailPoint::ActiveDocument)?;
        let id = state
            .active
            .ok_or_else(|| anyhow!("no active document"))?;
        Ok(MemoryDocument {
            id,
            state: Rc::clone(&self.state),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryDocuments {
    state: Rc<RefCell<State>>,
}

impl Documents for MemoryDocuments {
    fn open(&self, path: &Path) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.record(Call::Open(path.to_path_buf()), FailPoint::Open)?;

        if !path.is_file() {
            bail!("file '{}' could not be opened", path.display());
        }
        if DocumentKind::from_path(path).is_none() {
            bail!("unsupported document type: '{}'", path.display());
        }

        let already_open = state
            .documents
            .iter()
            .find(|doc| doc.full_name.as_deref() == Some(path))
            .map(|doc| doc.id);
        if let Some(id) = already_open {
            state.active = Some(id);
            return Ok(());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        state.insert(name, Some(path.to_path_buf()));
        Ok(())
    }

    fn add(&self, kind: DocumentKind) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.record(Call::Add(kind), FailPoint::Add)?;

        let counter = state.created.entry(kind).or_insert(0);
        *counter += 1;
        let name = format!("{}{}.{}", kind, counter, kind.extension());
        state.insert(name, None);
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.state.borrow().documents.len())
    }
}

#[derive(Debug)]
pub struct MemoryDocument {
    id: u64,
    state: Rc<RefCell<State>>,
}

impl Document for MemoryDocument {
    fn name(&self) -> Result<String> {
        Ok(self.state.borrow().find(self.id)?.name.clone())
    }

    fn full_name(&self) -> Result<Option<PathBuf>> {
        Ok(self.state.borrow().find(self.id)?.full_name.clone())
    }

    fn close(self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let name = state.find(self.id)?.name.clone();
        state.record(Call::Close(name), FailPoint::Close)?;

        state.documents.retain(|doc| doc.id != self.id);
        if state.active == Some(self.id) {
            state.active = state.documents.last().map(|doc| doc.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"solid").expect("write fixture");
        path
    }

    #[test]
    fn test_add_names_documents_per_kind() {
        let connector = MemoryConnector::new();
        let app = connector.connect().unwrap();
        let documents = app.documents().unwrap();

        documents.add(DocumentKind::Part).unwrap();
        documents.add(DocumentKind::Part).unwrap();
        documents.add(DocumentKind::Drawing).unwrap();

        assert_eq!(
            connector.open_documents(),
            vec!["Part1.CATPart", "Part2.CATPart", "Drawing1.CATDrawing"]
        );
        assert_eq!(documents.count().unwrap(), 3);
        assert_eq!(app.active_document().unwrap().name().unwrap(), "Drawing1.CATDrawing");
    }

    #[test]
    fn test_open_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "bracket.CATPart");

        let connector = MemoryConnector::new();
        let app = connector.connect().unwrap();
        app.documents().unwrap().open(&path).unwrap();

        let doc = app.active_document().unwrap();
        assert_eq!(doc.name().unwrap(), "bracket.CATPart");
        assert_eq!(doc.full_name().unwrap(), Some(path.clone()));
    }

    #[test]
    fn test_reopen_activates_existing_document() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, "bracket.CATPart");

        let connector = MemoryConnector::new();
        let app = connector.connect().unwrap();
        let documents = app.documents().unwrap();
        documents.open(&path).unwrap();
        documents.add(DocumentKind::Product).unwrap();
        documents.open(&path).unwrap();

        assert_eq!(documents.count().unwrap(), 2);
        assert_eq!(app.active_document().unwrap().name().unwrap(), "bracket.CATPart");
    }

    #[test]
    fn test_open_rejects_missing_and_unknown_files() {
        let dir = TempDir::new().unwrap();
        let text = fixture(&dir, "notes.txt");

        let connector = MemoryConnector::new();
        let documents = connector.connect().unwrap().documents().unwrap();

        let err = documents.open(&dir.path().join("gone.CATPart")).unwrap_err();
        assert!(err.to_string().contains("could not be opened"));

        let err = documents.open(&text).unwrap_err();
        assert!(err.to_string().contains("unsupported document type"));
        assert_eq!(documents.count().unwrap(), 0);
    }

    #[test]
    fn test_close_moves_active_document() {
        let connector = MemoryConnector::new();
        let app = connector.connect().unwrap();
        let documents = app.documents().unwrap();
        documents.add(DocumentKind::Part).unwrap();
        documents.add(DocumentKind::Product).unwrap();

        app.active_document().unwrap().close().unwrap();
        assert_eq!(app.active_document().unwrap().name().unwrap(), "Part1.CATPart");

        app.active_document().unwrap().close().unwrap();
        let err = app.active_document().unwrap_err();
        assert_eq!(err.to_string(), "no active document");
    }

    #[test]
    fn test_stale_handle_cannot_close() {
        let connector = MemoryConnector::new();
        let app = connector.connect().unwrap();
        app.documents().unwrap().add(DocumentKind::Part).unwrap();

        let first = app.active_document().unwrap();
        let second = app.active_document().unwrap();
        first.close().unwrap();

        assert!(second.name().is_err());
        assert!(second.close().is_err());
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let connector = MemoryConnector::new();
        connector.fail_on(FailPoint::Connect);

        let err = connector.connect().unwrap_err();
        assert_eq!(err.to_string(), "automation call Connect failed");
        assert!(connector.connect().is_ok());
        assert_eq!(connector.journal(), vec![Call::Connect, Call::Connect]);
    }
}
