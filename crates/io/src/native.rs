//! Native wire format for document entities.
//!
//! The format is a compact, hand-ordered JSON object per entity, tagged
//! with a `_class` discriminator. The encoder elides defaults: blank
//! cells are omitted from the cells map, a cell value equal to its script
//! is dropped (the script is the source of truth), and style properties
//! equal to the documented defaults are never written. The decoder is
//! strict — corrupt text and unknown discriminators fail loudly, after a
//! line-numbered dump of the offending document.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

use gridbook_engine::cell::{default_style, Cell, CellInit, StyleMap};
use gridbook_engine::observe::Dispatch;
use gridbook_engine::preview::{Preview, PreviewInit};
use gridbook_engine::sheet::{
    Sheet, SheetInit, DEFAULT_COLUMN_COUNT, DEFAULT_NAME, DEFAULT_ROW_COUNT, DEFAULT_SCREENSHOT,
    DEFAULT_SELECTED,
};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("corrupt document: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },
    #[error("unknown entity class {class:?}")]
    UnknownClass { class: String },
    #[error("malformed document: {context}")]
    Malformed { context: String },
}

/// Entity serialization seam. The base `encode` wraps the fields in
/// object delimiters; a type without `encode_fields` does not compile.
pub trait Encode {
    /// Append the entity's serialized fields to the buffer.
    fn encode_fields(&self, buffer: &mut Vec<String>);

    fn encode(&self, buffer: &mut Vec<String>) {
        buffer.push("{".to_string());
        self.encode_fields(buffer);
        buffer.push("}".to_string());
    }
}

/// Encode an entity to wire text.
pub fn encode(entity: &impl Encode) -> String {
    let mut buffer = Vec::new();
    entity.encode(&mut buffer);
    buffer.join("\n")
}

/// A decoded entity, one of the built-in kinds.
#[derive(Debug)]
pub enum Entity {
    Sheet(Sheet),
    Cell(Cell),
    Preview(Preview),
}

impl Entity {
    pub fn class_name(&self) -> &'static str {
        match self {
            Entity::Sheet(_) => "Sheet",
            Entity::Cell(_) => "Cell",
            Entity::Preview(_) => "Preview",
        }
    }

    pub fn into_sheet(self) -> Option<Sheet> {
        match self {
            Entity::Sheet(sheet) => Some(sheet),
            _ => None,
        }
    }

    pub fn into_cell(self) -> Option<Cell> {
        match self {
            Entity::Cell(cell) => Some(cell),
            _ => None,
        }
    }
}

type Constructor = Box<dyn Fn(&Map<String, Value>) -> Result<Entity, WireError>>;

/// Extension mapping from discriminator name to constructor, for entity
/// kinds unknown to the built-in decoder. Host applications register
/// their own classes here; an unregistered unknown class is an error,
/// never a silent fallback.
#[derive(Default)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, class: impl Into<String>, constructor: F)
    where
        F: Fn(&Map<String, Value>) -> Result<Entity, WireError> + 'static,
    {
        self.constructors
            .insert(class.into(), Box::new(constructor));
    }

    fn resolve(&self, class: &str) -> Option<&Constructor> {
        self.constructors.get(class)
    }
}

/// Decode wire text against the built-in entity classes only.
pub fn decode(text: &str) -> Result<Entity, WireError> {
    decode_with(text, &Registry::new())
}

/// Decode wire text, resolving discriminators first against the built-in
/// classes, then against the caller's extension registry.
pub fn decode_with(text: &str, env: &Registry) -> Result<Entity, WireError> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(source) => {
            log::error!("Corrupt document:");
            dump(text);
            return Err(WireError::Parse { source });
        }
    };
    let Value::Object(mut fields) = value else {
        return Err(WireError::Malformed {
            context: "top-level value is not an object".to_string(),
        });
    };
    fields.remove("_listeners");
    // A missing discriminator decodes as a Cell, the historical default.
    let class = match fields.remove("_class") {
        Some(Value::String(class)) => class,
        _ => "Cell".to_string(),
    };
    match class.as_str() {
        "Sheet" => Ok(Entity::Sheet(sheet_from_fields(&fields)?)),
        "Cell" => Ok(Entity::Cell(cell_from_fields("", &fields)?)),
        "Preview" => {
            let key = string_field(&fields, "key", "")?;
            Ok(Entity::Preview(preview_from_fields(&key, &fields)?))
        }
        _ => match env.resolve(&class) {
            Some(constructor) => constructor(&fields),
            None => Err(WireError::UnknownClass { class }),
        },
    }
}

/// Decode a sheet from persisted text, or construct a fresh empty sheet
/// with the given uid when there is nothing persisted yet. Corrupt
/// documents fail loudly; there is no auto-repair.
pub fn get_sheet(text: &str, uid: &str) -> Result<Sheet, WireError> {
    if text.is_empty() {
        return Ok(Sheet::new(uid));
    }
    match decode(text) {
        Ok(Entity::Sheet(sheet)) => Ok(sheet),
        Ok(other) => {
            log::error!("Could not load document: expected a Sheet");
            dump(text);
            Err(WireError::Malformed {
                context: format!("expected a Sheet, decoded a {}", other.class_name()),
            })
        }
        Err(err) => {
            log::error!("Could not load document: {err}");
            dump(text);
            Err(err)
        }
    }
}

fn dump(text: &str) {
    for (n, line) in text.lines().enumerate() {
        log::error!("{:5} {}", n + 1, line);
    }
}

// ---------------------------------------------------------------------------
// Encoding

fn json_str(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

fn json_f64(x: f64) -> String {
    Value::from(x).to_string()
}

impl Encode for Cell {
    fn encode_fields(&self, buffer: &mut Vec<String>) {
        // The value is a cached result; elide it when empty or redundant
        // with the script.
        if !self.value().is_empty() && self.value() != self.script() {
            buffer.push(format!("\"value\":{},", json_str(self.value())));
        }
        buffer.push(format!("\"script\":{},", json_str(self.script())));
        encode_style(self.style(), buffer);
        buffer.push("\"_class\":\"Cell\",".to_string());
        buffer.push(format!("\"key\":{}", json_str(self.key())));
    }
}

fn encode_style(style: &StyleMap, buffer: &mut Vec<String>) {
    let entries: Vec<String> = style
        .iter()
        .filter(|(property, value)| default_style(property) != Some(value.as_str()))
        .map(|(property, value)| format!("{}:{}", json_str(property), json_str(value)))
        .collect();
    if !entries.is_empty() {
        buffer.push("\"style\":{".to_string());
        buffer.push(entries.join(","));
        buffer.push("},".to_string());
    }
}

impl Encode for Preview {
    fn encode_fields(&self, buffer: &mut Vec<String>) {
        buffer.push(format!("\"html\":{},", json_str(self.html())));
        buffer.push(format!("\"embed\":{},", self.embed()));
        buffer.push(format!("\"left\":{},", json_f64(self.left())));
        buffer.push(format!("\"top\":{},", json_f64(self.top())));
        buffer.push(format!("\"width\":{},", json_f64(self.width())));
        buffer.push(format!("\"height\":{},", json_f64(self.height())));
        buffer.push("\"_class\":\"Preview\",".to_string());
        buffer.push(format!("\"key\":{}", json_str(self.key())));
    }
}

impl Encode for Sheet {
    fn encode_fields(&self, buffer: &mut Vec<String>) {
        encode_cells(self, buffer);
        encode_previews(self, buffer);
        buffer.push(format!(
            "\"created_timestamp\":{},",
            self.created_timestamp()
        ));
        buffer.push(format!(
            "\"updated_timestamp\":{},",
            self.updated_timestamp()
        ));
        buffer.push(format!("\"rows\":{},", encode_index_map(self.rows())));
        buffer.push(format!("\"columns\":{},", encode_index_map(self.columns())));
        buffer.push(format!("\"row_count\":{},", self.row_count()));
        buffer.push(format!("\"column_count\":{},", self.column_count()));
        buffer.push(format!("\"screenshot\":{},", json_str(self.screenshot())));
        buffer.push(format!("\"selected\":{},", json_str(self.selected())));
        buffer.push(format!("\"uid\":{},", json_str(self.uid())));
        buffer.push("\"_class\":\"Sheet\",".to_string());
        buffer.push(format!("\"name\":{}", json_str(self.name())));
    }
}

fn encode_cells(sheet: &Sheet, buffer: &mut Vec<String>) {
    buffer.push("\"cells\":{".to_string());
    // Blank cells drop out of the persisted map; ordering by (column,
    // row) keeps the output deterministic.
    let mut cells: Vec<&Cell> = sheet.cells().values().filter(|c| !c.is_blank()).collect();
    cells.sort_by_key(|c| (c.column(), c.row()));
    let mut needs_comma = false;
    for cell in cells {
        buffer.push(format!(
            "{}{}:",
            if needs_comma { "," } else { "" },
            json_str(cell.key())
        ));
        cell.encode(buffer);
        needs_comma = true;
    }
    buffer.push("},".to_string());
}

fn encode_previews(sheet: &Sheet, buffer: &mut Vec<String>) {
    buffer.push("\"previews\":{".to_string());
    let mut previews: Vec<&Preview> = sheet.previews().values().collect();
    previews.sort_by(|a, b| a.key().cmp(b.key()));
    let mut needs_comma = false;
    for preview in previews {
        buffer.push(format!(
            "{}{}:",
            if needs_comma { "," } else { "" },
            json_str(preview.key())
        ));
        preview.encode(buffer);
        needs_comma = true;
    }
    buffer.push("},".to_string());
}

fn encode_index_map(map: &FxHashMap<u32, u32>) -> String {
    let mut entries: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    entries.sort_unstable();
    let body: Vec<String> = entries
        .iter()
        .map(|(index, size)| format!("\"{index}\":{size}"))
        .collect();
    format!("{{{}}}", body.join(","))
}

// ---------------------------------------------------------------------------
// Decoding

fn sheet_from_fields(fields: &Map<String, Value>) -> Result<Sheet, WireError> {
    let mut sheet = Sheet::from_init(
        SheetInit {
            uid: string_field(fields, "uid", "")?,
            name: string_field(fields, "name", DEFAULT_NAME)?,
            columns: index_map_field(fields, "columns")?,
            rows: index_map_field(fields, "rows")?,
            selected: string_field(fields, "selected", DEFAULT_SELECTED)?,
            screenshot: string_field(fields, "screenshot", DEFAULT_SCREENSHOT)?,
            created_timestamp: i64_field(fields, "created_timestamp", 0)?,
            updated_timestamp: i64_field(fields, "updated_timestamp", 0)?,
            column_count: u32_field(fields, "column_count", DEFAULT_COLUMN_COUNT)?,
            row_count: u32_field(fields, "row_count", DEFAULT_ROW_COUNT)?,
        },
        Dispatch::Direct,
    );
    for (key, entry) in object_field(fields, "cells")? {
        let cell_fields = entry_object("cells", &key, &entry)?;
        sheet.insert_cell(cell_from_fields(&key, &cell_fields)?);
    }
    for (key, entry) in object_field(fields, "previews")? {
        let preview_fields = entry_object("previews", &key, &entry)?;
        sheet.insert_preview(preview_from_fields(&key, &preview_fields)?);
    }
    Ok(sheet)
}

fn cell_from_fields(default_key: &str, fields: &Map<String, Value>) -> Result<Cell, WireError> {
    let init = CellInit {
        key: string_field(fields, "key", default_key)?,
        column: u32_field(fields, "column", 0)?,
        row: u32_field(fields, "row", 0)?,
        value: string_field(fields, "value", "")?,
        script: string_field(fields, "script", "")?,
        style: style_field(fields)?,
    };
    Ok(Cell::from_init(init, Dispatch::Direct))
}

fn preview_from_fields(key: &str, fields: &Map<String, Value>) -> Result<Preview, WireError> {
    let init = PreviewInit {
        html: string_field(fields, "html", "")?,
        embed: bool_field(fields, "embed", false)?,
        left: f64_field(fields, "left", 0.0)?,
        top: f64_field(fields, "top", 0.0)?,
        width: f64_field(fields, "width", 0.0)?,
        height: f64_field(fields, "height", 0.0)?,
    };
    Ok(Preview::new(key, init, Dispatch::Direct))
}

fn malformed(name: &str, value: &Value) -> WireError {
    WireError::Malformed {
        context: format!("field {name:?} has unexpected value {value}"),
    }
}

fn string_field(
    fields: &Map<String, Value>,
    name: &str,
    default: &str,
) -> Result<String, WireError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(malformed(name, other)),
    }
}

fn u32_field(fields: &Map<String, Value>, name: &str, default: u32) -> Result<u32, WireError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| malformed(name, &Value::Number(n.clone()))),
        Some(other) => Err(malformed(name, other)),
    }
}

fn i64_field(fields: &Map<String, Value>, name: &str, default: i64) -> Result<i64, WireError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| malformed(name, &Value::Number(n.clone()))),
        Some(other) => Err(malformed(name, other)),
    }
}

fn f64_field(fields: &Map<String, Value>, name: &str, default: f64) -> Result<f64, WireError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| malformed(name, &Value::Number(n.clone()))),
        Some(other) => Err(malformed(name, other)),
    }
}

fn bool_field(fields: &Map<String, Value>, name: &str, default: bool) -> Result<bool, WireError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(malformed(name, other)),
    }
}

fn object_field(fields: &Map<String, Value>, name: &str) -> Result<Map<String, Value>, WireError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(malformed(name, other)),
    }
}

fn entry_object(
    map_name: &str,
    key: &str,
    entry: &Value,
) -> Result<Map<String, Value>, WireError> {
    match entry {
        Value::Object(fields) => {
            let mut fields = fields.clone();
            fields.remove("_class");
            fields.remove("_listeners");
            Ok(fields)
        }
        other => Err(WireError::Malformed {
            context: format!("entry {key:?} in {map_name:?} is not an object: {other}"),
        }),
    }
}

fn index_map_field(
    fields: &Map<String, Value>,
    name: &str,
) -> Result<FxHashMap<u32, u32>, WireError> {
    let mut map = FxHashMap::default();
    for (index, size) in object_field(fields, name)? {
        let index: u32 = index.parse().map_err(|_| WireError::Malformed {
            context: format!("index {index:?} in {name:?} is not an integer"),
        })?;
        let size = size
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| malformed(name, &size))?;
        map.insert(index, size);
    }
    Ok(map)
}

fn style_field(fields: &Map<String, Value>) -> Result<StyleMap, WireError> {
    let mut style = StyleMap::new();
    for (property, value) in object_field(fields, "style")? {
        match value {
            Value::String(value) => {
                style.insert(property, value);
            }
            other => return Err(malformed("style", &other)),
        }
    }
    Ok(style)
}
