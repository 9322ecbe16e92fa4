//! Sheet listing collaborator seam.
//!
//! A listing backend provides `{uid, name, screenshot}` summaries to
//! populate a selection UI, and persisted wire text per uid. The core
//! model only requires this shape, not how it is fetched or stored.

use std::cell::RefCell;
use std::collections::BTreeMap;

use thiserror::Error;

use gridbook_engine::sheet::{Sheet, SheetSummary};

use crate::native::{self, WireError};

#[derive(Debug, Error)]
#[error("sheet store: {0}")]
pub struct StoreError(pub String);

/// Persistence backend for encoded sheets. Implementations live in the
/// embedding application.
pub trait SheetStore {
    /// Summaries of every stored sheet, for a selection UI.
    fn list_sheets(&self) -> Result<Vec<SheetSummary>, StoreError>;

    /// Persisted wire text for a sheet, `None` when unknown.
    fn load(&self, uid: &str) -> Result<Option<String>, StoreError>;

    /// Persist wire text under a uid, replacing any previous text.
    fn store(&self, uid: &str, text: &str) -> Result<(), StoreError>;
}

/// Load a sheet through a store, constructing a fresh one when the uid
/// has nothing persisted yet.
pub fn load_sheet(store: &impl SheetStore, uid: &str) -> Result<Sheet, StoreError> {
    let text = store.load(uid)?.unwrap_or_default();
    native::get_sheet(&text, uid).map_err(|err: WireError| StoreError(err.to_string()))
}

/// Encode and persist a sheet through a store.
pub fn store_sheet(store: &impl SheetStore, sheet: &Sheet) -> Result<(), StoreError> {
    store.store(sheet.uid(), &native::encode(sheet))
}

/// In-memory store, for tests and headless embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SheetStore for MemoryStore {
    fn list_sheets(&self) -> Result<Vec<SheetSummary>, StoreError> {
        let sheets = self.sheets.borrow();
        let mut summaries = Vec::with_capacity(sheets.len());
        for (uid, text) in sheets.iter() {
            let sheet = native::get_sheet(text, uid).map_err(|err| StoreError(err.to_string()))?;
            summaries.push(sheet.summary());
        }
        Ok(summaries)
    }

    fn load(&self, uid: &str) -> Result<Option<String>, StoreError> {
        Ok(self.sheets.borrow().get(uid).cloned())
    }

    fn store(&self, uid: &str, text: &str) -> Result<(), StoreError> {
        self.sheets
            .borrow_mut()
            .insert(uid.to_string(), text.to_string());
        Ok(())
    }
}
