//! A single addressable grid position.

use std::collections::BTreeMap;

use crate::address;
use crate::observe::{Change, Dispatch, Listener, Observers, RecordKind};

/// Style properties, sparse: only entries that differ from
/// [`DEFAULT_STYLE`] are worth persisting.
pub type StyleMap = BTreeMap<String, String>;

/// The documented default for each style property. A stored property equal
/// to its default is elided from persisted output.
pub const DEFAULT_STYLE: &[(&str, &str)] = &[
    ("background-color", "white"),
    ("color", "black"),
    ("font-family", "Arial"),
    ("font-size", "14px"),
    ("font-style", "normal"),
    ("font-weight", "normal"),
    ("text-align", "left"),
    ("vertical-align", "middle"),
];

/// Look up the documented default for a style property.
pub fn default_style(property: &str) -> Option<&'static str> {
    DEFAULT_STYLE
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, value)| *value)
}

/// A cell holds a source `script` and its last computed `value`. The
/// script is the source of truth; the value is a cached result.
#[derive(Debug)]
pub struct Cell {
    key: String,
    column: u32,
    row: u32,
    value: String,
    script: String,
    style: StyleMap,
    /// Transient embed flag, toggled by an edit but never persisted.
    embed: bool,
    observers: Observers,
}

/// Field values for restoring a decoded cell.
#[derive(Debug, Default, Clone)]
pub struct CellInit {
    pub key: String,
    pub column: u32,
    pub row: u32,
    pub value: String,
    pub script: String,
    pub style: StyleMap,
}

impl Cell {
    /// Fresh empty cell at `key`, its column/row derived from the key.
    pub fn new(key: impl Into<String>, dispatch: Dispatch) -> Self {
        Self::from_init(
            CellInit {
                key: key.into(),
                ..CellInit::default()
            },
            dispatch,
        )
    }

    /// Restore a cell from decoded fields. Column/row are derived from
    /// the key when not supplied; the script defaults to the value when
    /// absent.
    pub fn from_init(init: CellInit, dispatch: Dispatch) -> Self {
        let (mut column, mut row) = (init.column, init.row);
        if column == 0 || row == 0 {
            let derived = address::col_row_from_key(&init.key);
            column = derived.0;
            row = derived.1;
        }
        let script = if init.script.is_empty() {
            init.value.clone()
        } else {
            init.script
        };
        Self {
            key: init.key,
            column,
            row,
            value: init.value,
            script,
            style: init.style,
            embed: false,
            observers: Observers::new(dispatch),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn style(&self) -> &StyleMap {
        &self.style
    }

    pub fn embed(&self) -> bool {
        self.embed
    }

    /// A blank cell (no script, no value) is eligible for omission from
    /// persisted output.
    pub fn is_blank(&self) -> bool {
        self.script.is_empty() && self.value.is_empty()
    }

    pub fn listen(&mut self, listener: Listener) {
        self.observers.listen(listener);
    }

    pub(crate) fn set_dispatch(&mut self, dispatch: Dispatch) {
        self.observers.set_dispatch(dispatch);
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.value == value {
            return;
        }
        self.value = value;
        self.notify_field("value");
    }

    pub fn set_script(&mut self, script: impl Into<String>) {
        let script = script.into();
        if self.script == script {
            return;
        }
        self.script = script;
        self.notify_field("script");
    }

    pub fn set_style(&mut self, style: StyleMap) {
        if self.style == style {
            return;
        }
        self.style = style;
        self.notify_field("style");
    }

    pub fn set_embed(&mut self, embed: bool) {
        if self.embed == embed {
            return;
        }
        self.embed = embed;
        self.notify_field("embed");
    }

    /// Reset script, value, and style. The cell stays present, so
    /// listeners and identity remain valid.
    pub fn clear(&mut self) {
        self.set_script("");
        self.set_value("");
        self.set_style(StyleMap::new());
    }

    fn notify_field(&self, name: &'static str) {
        self.observers
            .notify(Change::field(RecordKind::Cell, &self.key, name));
    }
}
