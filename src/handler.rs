//! Scoped Document Handler
//!
//! Opens or creates one document in the CAD application and guarantees it is
//! closed when the caller's block exits, whichever way it exits.
//!
//! ```no_run
//! use cad_doc_handler::automation::{Document, DocumentKind, MemoryConnector};
//! use cad_doc_handler::handler::DocHandler;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut handler = DocHandler::new(MemoryConnector::new(), None, Some(DocumentKind::Part))?;
//! let name = handler.run(|scope| -> anyhow::Result<String> {
//!     let document = scope.document().expect("document was created");
//!     document.name()
//! })?;
//! assert_eq!(name, "Part1.CATPart");
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::automation::{Application, Connector, Document, DocumentKind, Documents};
use crate::error::HandlerError;

type DocumentsOf<C> = <<C as Connector>::Application as Application>::Documents;

/// Lifecycle of the handled document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeState {
    Unopened,
    Open,
    Closed,
}

/// What happened when a scope was left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitOutcome {
    /// The acquired document was closed
    Closed,
    /// No document was acquired, so nothing was closed
    NothingToClose,
}

/// Tuning for [`DocHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Reconnect to the application when entering a scope instead of reusing
    /// the session obtained at construction
    pub reconnect_on_enter: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            reconnect_on_enter: true,
        }
    }
}

/// Opens or creates one document and closes it when the scope ends
pub struct DocHandler<C: Connector> {
    connector: C,
    file_name: Option<PathBuf>,
    new_document: Option<DocumentKind>,
    options: HandlerOptions,
    application: C::Application,
    documents: DocumentsOf<C>,
    state: ScopeState,
}

impl<C: Connector> DocHandler<C> {
    /// Create a handler for `file_name` or, failing that, a new document of
    /// kind `new_document`
    ///
    /// `file_name` must name an existing file; this is checked before the
    /// application is contacted.
    pub fn new(
        connector: C,
        file_name: Option<PathBuf>,
        new_document: Option<DocumentKind>,
    ) -> Result<Self, HandlerError> {
        Self::with_options(connector, file_name, new_document, HandlerOptions::default())
    }

    /// Handler that opens an existing file
    pub fn open(connector: C, file_name: impl Into<PathBuf>) -> Result<Self, HandlerError> {
        Self::new(connector, Some(file_name.into()), None)
    }

    /// Handler that creates a new document
    pub fn create(connector: C, kind: DocumentKind) -> Result<Self, HandlerError> {
        Self::new(connector, None, Some(kind))
    }

    pub fn with_options(
        connector: C,
        file_name: Option<PathBuf>,
        new_document: Option<DocumentKind>,
        options: HandlerOptions,
    ) -> Result<Self, HandlerError> {
        if let Some(path) = &file_name {
            if !path.is_file() {
                return Err(HandlerError::ResourceNotFound { path: path.clone() });
            }
            if let Some(kind) = new_document {
                log::debug!(
                    "both a file and a new {} document were requested, opening {}",
                    kind,
                    path.display()
                );
            }
        }

        let application = connector.connect()?;
        let documents = application.documents()?;

        Ok(Self {
            connector,
            file_name,
            new_document,
            options,
            application,
            documents,
            state: ScopeState::Unopened,
        })
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    pub fn new_document(&self) -> Option<DocumentKind> {
        self.new_document
    }

    pub fn state(&self) -> ScopeState {
        self.state
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Acquire the document and start a scope
    ///
    /// The returned guard closes the document when dropped. Call
    /// [`DocScope::exit`] instead to observe the outcome or a close failure.
    pub fn enter(&mut self) -> Result<DocScope<'_, C::Application>, HandlerError> {
        if self.options.reconnect_on_enter {
            let application = self.connector.connect()?;
            let documents = application.documents()?;
            self.application = application;
            self.documents = documents;
        }

        let document = if let Some(path) = &self.file_name {
            log::debug!("opening document {}", path.display());
            self.documents.open(path)?;
            Some(self.application.active_document()?)
        } else if let Some(kind) = self.new_document {
            log::debug!("creating new {} document", kind);
            self.documents.add(kind)?;
            Some(self.application.active_document()?)
        } else {
            None
        };

        self.state = ScopeState::Open;
        Ok(DocScope {
            application: &self.application,
            documents: &self.documents,
            document,
            state: &mut self.state,
        })
    }

    /// Run `block` inside a scope
    ///
    /// The document is closed (or the missing document reported) before
    /// returning. An error from `block` is returned as-is; a close failure is
    /// only returned when `block` succeeded.
    pub fn run<T, E, F>(&mut self, block: F) -> Result<T, E>
    where
        F: FnOnce(&DocScope<'_, C::Application>) -> Result<T, E>,
        E: From<HandlerError>,
    {
        let scope = self.enter()?;
        match block(&scope) {
            Ok(value) => {
                scope.exit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(close_err) = scope.exit() {
                    log::error!("failed to close document after error: {}", close_err);
                }
                Err(err)
            }
        }
    }
}

/// Handles available while a scope is open
///
/// Dropping the guard closes the document. A close failure during drop is
/// logged, since it cannot be returned.
pub struct DocScope<'h, A: Application> {
    application: &'h A,
    documents: &'h A::Documents,
    document: Option<A::Document>,
    state: &'h mut ScopeState,
}

impl<'h, A: Application> DocScope<'h, A> {
    pub fn application(&self) -> &A {
        self.application
    }

    pub fn documents(&self) -> &A::Documents {
        self.documents
    }

    /// The acquired document, `None` when the handler had nothing to open
    pub fn document(&self) -> Option<&A::Document> {
        self.document.as_ref()
    }

    /// Leave the scope, closing the document if one was acquired
    pub fn exit(mut self) -> Result<ExitOutcome, HandlerError> {
        self.release()
    }

    fn release(&mut self) -> Result<ExitOutcome, HandlerError> {
        *self.state = ScopeState::Closed;
        match self.document.take() {
            Some(document) => {
                log::debug!("closing document");
                document.close()?;
                Ok(ExitOutcome::Closed)
            }
            None => {
                log::warn!("The document handler could not detect a document to close.");
                Ok(ExitOutcome::NothingToClose)
            }
        }
    }
}

impl<A: Application> Drop for DocScope<'_, A> {
    fn drop(&mut self) {
        if *self.state != ScopeState::Open {
            return;
        }
        if let Err(e) = self.release() {
            log::error!("failed to close document: {}", e);
        }
    }
}
