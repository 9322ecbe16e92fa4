//! The spreadsheet document aggregate.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::address;
use crate::cell::Cell;
use crate::observe::{Change, ChangeDetail, Dispatch, Listener, Observers, RecordKind, RecordRef};
use crate::preview::{Preview, PreviewInit};

pub const DEFAULT_NAME: &str = "Untitled Sheet";
pub const DEFAULT_SELECTED: &str = "A1";
pub const DEFAULT_SCREENSHOT: &str = "/screenshot.png";
pub const DEFAULT_COLUMN_COUNT: u32 = 26;
pub const DEFAULT_ROW_COUNT: u32 = 50;

/// The `{uid, name, screenshot}` shape a listing backend provides to
/// populate a sheet selection UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSummary {
    pub uid: String,
    pub name: String,
    pub screenshot: String,
}

/// A spreadsheet document: addressable cells, floating previews, and
/// metadata. Identity and equality are defined solely by `uid` — two
/// sheets with the same uid compare equal regardless of content.
#[derive(Debug)]
pub struct Sheet {
    uid: String,
    name: String,
    columns: FxHashMap<u32, u32>,
    rows: FxHashMap<u32, u32>,
    cells: FxHashMap<String, Cell>,
    previews: FxHashMap<String, Preview>,
    selected: String,
    screenshot: String,
    created_timestamp: i64,
    updated_timestamp: i64,
    column_count: u32,
    row_count: u32,
    dispatch: Dispatch,
    observers: Observers,
}

/// Metadata fields for restoring a decoded sheet. Cells and previews are
/// inserted separately by the decoder.
#[derive(Debug, Clone)]
pub struct SheetInit {
    pub uid: String,
    pub name: String,
    pub columns: FxHashMap<u32, u32>,
    pub rows: FxHashMap<u32, u32>,
    pub selected: String,
    pub screenshot: String,
    pub created_timestamp: i64,
    pub updated_timestamp: i64,
    pub column_count: u32,
    pub row_count: u32,
}

impl Default for SheetInit {
    fn default() -> Self {
        Self {
            uid: String::new(),
            name: DEFAULT_NAME.to_string(),
            columns: FxHashMap::default(),
            rows: FxHashMap::default(),
            selected: DEFAULT_SELECTED.to_string(),
            screenshot: DEFAULT_SCREENSHOT.to_string(),
            created_timestamp: 0,
            updated_timestamp: 0,
            column_count: DEFAULT_COLUMN_COUNT,
            row_count: DEFAULT_ROW_COUNT,
        }
    }
}

impl Sheet {
    /// Fresh empty sheet with synchronous notification delivery.
    pub fn new(uid: impl Into<String>) -> Self {
        Self::with_dispatch(uid, Dispatch::Direct)
    }

    pub fn with_dispatch(uid: impl Into<String>, dispatch: Dispatch) -> Self {
        Self::from_init(
            SheetInit {
                uid: uid.into(),
                ..SheetInit::default()
            },
            dispatch,
        )
    }

    pub fn from_init(init: SheetInit, dispatch: Dispatch) -> Self {
        Self {
            uid: init.uid,
            name: init.name,
            columns: init.columns,
            rows: init.rows,
            cells: FxHashMap::default(),
            previews: FxHashMap::default(),
            selected: init.selected,
            screenshot: init.screenshot,
            created_timestamp: init.created_timestamp,
            updated_timestamp: init.updated_timestamp,
            column_count: init.column_count,
            row_count: init.row_count,
            observers: Observers::new(dispatch.clone()),
            dispatch,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn screenshot(&self) -> &str {
        &self.screenshot
    }

    pub fn created_timestamp(&self) -> i64 {
        self.created_timestamp
    }

    pub fn updated_timestamp(&self) -> i64 {
        self.updated_timestamp
    }

    pub fn column_count(&self) -> u32 {
        self.column_count
    }

    pub fn row_count(&self) -> u32 {
        self.row_count
    }

    pub fn columns(&self) -> &FxHashMap<u32, u32> {
        &self.columns
    }

    pub fn rows(&self) -> &FxHashMap<u32, u32> {
        &self.rows
    }

    pub fn cells(&self) -> &FxHashMap<String, Cell> {
        &self.cells
    }

    pub fn previews(&self) -> &FxHashMap<String, Preview> {
        &self.previews
    }

    pub fn column_width(&self, column: u32) -> Option<u32> {
        self.columns.get(&column).copied()
    }

    pub fn row_height(&self, row: u32) -> Option<u32> {
        self.rows.get(&row).copied()
    }

    pub fn summary(&self) -> SheetSummary {
        SheetSummary {
            uid: self.uid.clone(),
            name: self.name.clone(),
            screenshot: self.screenshot.clone(),
        }
    }

    pub fn listen(&mut self, listener: Listener) {
        self.observers.listen(listener);
    }

    /// Replace the notification dispatch strategy for this sheet and
    /// every cell and preview it contains. Used after decode, which
    /// constructs with synchronous delivery.
    pub fn set_dispatch(&mut self, dispatch: Dispatch) {
        self.dispatch = dispatch.clone();
        self.observers.set_dispatch(dispatch.clone());
        for cell in self.cells.values_mut() {
            cell.set_dispatch(dispatch.clone());
        }
        for preview in self.previews.values_mut() {
            preview.set_dispatch(dispatch.clone());
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name == name {
            return;
        }
        self.name = name;
        self.notify_field("name");
    }

    pub fn set_selected(&mut self, selected: impl Into<String>) {
        let selected = selected.into();
        if self.selected == selected {
            return;
        }
        self.selected = selected;
        self.notify_field("selected");
    }

    pub fn set_screenshot(&mut self, screenshot: impl Into<String>) {
        let screenshot = screenshot.into();
        if self.screenshot == screenshot {
            return;
        }
        self.screenshot = screenshot;
        self.notify_field("screenshot");
    }

    pub fn set_created_timestamp(&mut self, timestamp: i64) {
        if self.created_timestamp == timestamp {
            return;
        }
        self.created_timestamp = timestamp;
        self.notify_field("created_timestamp");
    }

    pub fn set_updated_timestamp(&mut self, timestamp: i64) {
        if self.updated_timestamp == timestamp {
            return;
        }
        self.updated_timestamp = timestamp;
        self.notify_field("updated_timestamp");
    }

    /// Grown by lazy cell creation; never shrinks through that path.
    pub fn set_column_count(&mut self, count: u32) {
        if self.column_count == count {
            return;
        }
        self.column_count = count;
        self.notify_field("column_count");
    }

    pub fn set_row_count(&mut self, count: u32) {
        if self.row_count == count {
            return;
        }
        self.row_count = count;
        self.notify_field("row_count");
    }

    /// Store a column width and broadcast the structured resize notice.
    /// Resize notices are not equality-filtered.
    pub fn set_column_width(&mut self, column: u32, width: u32) {
        self.columns.insert(column, width);
        self.observers.notify(Change {
            record: self.record_ref(),
            detail: ChangeDetail::Column { column, width },
        });
    }

    /// Store a row height and broadcast the structured resize notice.
    pub fn set_row_height(&mut self, row: u32, height: u32) {
        self.rows.insert(row, height);
        self.observers.notify(Change {
            record: self.record_ref(),
            detail: ChangeDetail::Row { row, height },
        });
    }

    /// Fetch the cell at `key`, creating it on first reference. Creation
    /// derives column/row from the key and grows `column_count` /
    /// `row_count` to cover the new cell. Idempotent by key.
    pub fn get_cell(&mut self, key: &str) -> &mut Cell {
        if !self.cells.contains_key(key) {
            let cell = Cell::new(key, self.dispatch.clone());
            let (column, row) = (cell.column(), cell.row());
            self.cells.insert(key.to_owned(), cell);
            let columns = self.column_count.max(column);
            let rows = self.row_count.max(row);
            self.set_column_count(columns);
            self.set_row_count(rows);
        }
        let dispatch = self.dispatch.clone();
        self.cells
            .entry(key.to_owned())
            .or_insert_with(|| Cell::new(key, dispatch))
    }

    /// Fetch the preview anchored at `key`, creating an empty one on
    /// first reference. No bounds growth.
    pub fn get_preview(&mut self, key: &str) -> &mut Preview {
        let dispatch = self.dispatch.clone();
        self.previews
            .entry(key.to_owned())
            .or_insert_with(|| Preview::new(key, PreviewInit::default(), dispatch))
    }

    /// Insert a restored cell directly. Decoded cells do not grow the
    /// sheet bounds; only lazy creation does.
    pub fn insert_cell(&mut self, cell: Cell) {
        self.cells.insert(cell.key().to_owned(), cell);
    }

    /// Insert a restored preview directly.
    pub fn insert_preview(&mut self, preview: Preview) {
        self.previews.insert(preview.key().to_owned(), preview);
    }

    pub fn remove_preview(&mut self, key: &str) -> Option<Preview> {
        self.previews.remove(key)
    }

    /// Keys for every cell in the inclusive rectangle, column-major.
    pub fn cell_keys(
        &self,
        from_col: u32,
        to_col: u32,
        from_row: u32,
        to_row: u32,
    ) -> impl Iterator<Item = String> {
        address::cell_keys(from_col, to_col, from_row, to_row)
    }

    fn record_ref(&self) -> RecordRef {
        RecordRef {
            kind: RecordKind::Sheet,
            key: self.uid.clone(),
        }
    }

    fn notify_field(&self, name: &'static str) {
        self.observers
            .notify(Change::field(RecordKind::Sheet, &self.uid, name));
    }
}

impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Sheet {}
