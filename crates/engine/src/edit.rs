//! Edits: discrete, serializable mutations with apply/undo semantics.
//!
//! A controller builds one edit per user action, applies it immediately,
//! and may keep it on an undo stack it owns. Reversible variants carry
//! explicit `before`/`after` payloads captured at construction time;
//! `undo` reports whether the variant supports reversal at all, and
//! leaves the sheet untouched when it does not.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::cell::StyleMap;
use crate::sheet::Sheet;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("style payload must be a mapping of property to string, got {got}")]
    StylePayload { got: String },
}

/// The closed set of document mutations. The serde tag doubles as the
/// wire discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_class")]
pub enum Edit {
    NameChanged {
        before: String,
        after: String,
    },
    SelectionChanged {
        key: String,
    },
    ScreenshotChanged {
        url: String,
    },
    ColumnChanged {
        column: u32,
        width: u32,
    },
    RowChanged {
        row: u32,
        height: u32,
    },
    CellValueChanged {
        key: String,
        before: String,
        after: String,
    },
    CellEmbedChanged {
        key: String,
        embed: bool,
    },
    CellScriptChanged {
        key: String,
        before: String,
        after: String,
    },
    CellStyleChanged {
        key: String,
        before: StyleMap,
        after: StyleMap,
    },
    PreviewPositionChanged {
        key: String,
        left: f64,
        top: f64,
    },
    PreviewDimensionChanged {
        key: String,
        width: f64,
        height: f64,
    },
    PreviewValueChanged {
        key: String,
        html: String,
    },
    PreviewDeleted {
        key: String,
    },
}

impl Edit {
    /// Build a `CellStyleChanged` from untyped payloads, the shape a
    /// controller receives from a UI event. Fails fast unless both
    /// payloads are mappings of property to string; this defends against
    /// caller bugs, not user input.
    pub fn cell_style_changed(
        key: impl Into<String>,
        before: Value,
        after: Value,
    ) -> Result<Self, EditError> {
        Ok(Edit::CellStyleChanged {
            key: key.into(),
            before: style_map(before)?,
            after: style_map(after)?,
        })
    }

    /// Apply the mutation to the live sheet. Notifications fire through
    /// the observe substrate as a side effect.
    pub fn apply(&self, sheet: &mut Sheet) {
        match self {
            Edit::NameChanged { after, .. } => sheet.set_name(after.clone()),
            Edit::SelectionChanged { key } => sheet.set_selected(key.clone()),
            Edit::ScreenshotChanged { url } => sheet.set_screenshot(url.clone()),
            Edit::ColumnChanged { column, width } => sheet.set_column_width(*column, *width),
            Edit::RowChanged { row, height } => sheet.set_row_height(*row, *height),
            Edit::CellValueChanged { key, after, .. } => {
                sheet.get_cell(key).set_value(after.clone())
            }
            Edit::CellEmbedChanged { key, embed } => sheet.get_cell(key).set_embed(*embed),
            Edit::CellScriptChanged { key, after, .. } => {
                sheet.get_cell(key).set_script(after.clone())
            }
            Edit::CellStyleChanged { key, after, .. } => {
                sheet.get_cell(key).set_style(after.clone())
            }
            Edit::PreviewPositionChanged { key, left, top } => {
                let preview = sheet.get_preview(key);
                preview.set_left(*left);
                preview.set_top(*top);
            }
            Edit::PreviewDimensionChanged { key, width, height } => {
                let preview = sheet.get_preview(key);
                preview.set_width(*width);
                preview.set_height(*height);
            }
            Edit::PreviewValueChanged { key, html } => {
                sheet.get_preview(key).set_html(html.clone())
            }
            Edit::PreviewDeleted { key } => {
                sheet.remove_preview(key);
            }
        }
    }

    /// Reverse the mutation, restoring the `before` payload. Returns
    /// whether this variant supports undo; unsupported variants leave
    /// the sheet unchanged and must not sit on an undo stack.
    pub fn undo(&self, sheet: &mut Sheet) -> bool {
        match self {
            Edit::NameChanged { before, .. } => {
                sheet.set_name(before.clone());
                true
            }
            Edit::CellValueChanged { key, before, .. } => {
                sheet.get_cell(key).set_value(before.clone());
                true
            }
            Edit::CellScriptChanged { key, before, .. } => {
                sheet.get_cell(key).set_script(before.clone());
                true
            }
            Edit::CellStyleChanged { key, before, .. } => {
                sheet.get_cell(key).set_style(before.clone());
                true
            }
            Edit::SelectionChanged { .. }
            | Edit::ScreenshotChanged { .. }
            | Edit::ColumnChanged { .. }
            | Edit::RowChanged { .. }
            | Edit::CellEmbedChanged { .. }
            | Edit::PreviewPositionChanged { .. }
            | Edit::PreviewDimensionChanged { .. }
            | Edit::PreviewValueChanged { .. }
            | Edit::PreviewDeleted { .. } => false,
        }
    }
}

fn style_map(value: Value) -> Result<StyleMap, EditError> {
    let Value::Object(entries) = value else {
        return Err(EditError::StylePayload {
            got: type_name(&value).to_string(),
        });
    };
    let mut style = StyleMap::new();
    for (property, value) in entries {
        let Value::String(value) = value else {
            return Err(EditError::StylePayload {
                got: format!("{} for property {property:?}", type_name(&value)),
            });
        };
        style.insert(property, value);
    }
    Ok(style)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{ChangeDetail, ChangeLog, Dispatch};
    use serde_json::json;

    fn style(entries: &[(&str, &str)]) -> StyleMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn name_apply_then_undo_restores() {
        let mut sheet = Sheet::new("s1");
        sheet.set_name("Before");

        let edit = Edit::NameChanged {
            before: "Before".into(),
            after: "After".into(),
        };
        edit.apply(&mut sheet);
        assert_eq!(sheet.name(), "After");

        assert!(edit.undo(&mut sheet));
        assert_eq!(sheet.name(), "Before");
    }

    #[test]
    fn cell_value_apply_then_undo_restores() {
        let mut sheet = Sheet::new("s1");
        sheet.get_cell("A1").set_value("1");

        let edit = Edit::CellValueChanged {
            key: "A1".into(),
            before: "1".into(),
            after: "2".into(),
        };
        edit.apply(&mut sheet);
        assert_eq!(sheet.get_cell("A1").value(), "2");

        assert!(edit.undo(&mut sheet));
        assert_eq!(sheet.get_cell("A1").value(), "1");
    }

    #[test]
    fn cell_script_and_style_round_trip() {
        let mut sheet = Sheet::new("s1");

        let script = Edit::CellScriptChanged {
            key: "B2".into(),
            before: String::new(),
            after: "=SUM(A1:A9)".into(),
        };
        script.apply(&mut sheet);
        assert_eq!(sheet.get_cell("B2").script(), "=SUM(A1:A9)");
        assert!(script.undo(&mut sheet));
        assert_eq!(sheet.get_cell("B2").script(), "");

        let styled = Edit::CellStyleChanged {
            key: "B2".into(),
            before: StyleMap::new(),
            after: style(&[("color", "red")]),
        };
        styled.apply(&mut sheet);
        assert_eq!(
            sheet.get_cell("B2").style().get("color").map(String::as_str),
            Some("red")
        );
        assert!(styled.undo(&mut sheet));
        assert!(sheet.get_cell("B2").style().is_empty());
    }

    #[test]
    fn irreversible_edits_report_false_and_leave_sheet_alone() {
        let mut sheet = Sheet::new("s1");
        sheet.set_selected("A1");
        sheet.get_preview("C3").set_html("<p>chart</p>");

        let selection = Edit::SelectionChanged { key: "D4".into() };
        selection.apply(&mut sheet);
        assert_eq!(sheet.selected(), "D4");
        assert!(!selection.undo(&mut sheet));
        assert_eq!(sheet.selected(), "D4");

        let screenshot = Edit::ScreenshotChanged {
            url: "/shot2.png".into(),
        };
        screenshot.apply(&mut sheet);
        assert!(!screenshot.undo(&mut sheet));
        assert_eq!(sheet.screenshot(), "/shot2.png");

        let deleted = Edit::PreviewDeleted { key: "C3".into() };
        deleted.apply(&mut sheet);
        assert!(sheet.previews().is_empty());
        assert!(!deleted.undo(&mut sheet));
        assert!(sheet.previews().is_empty());
    }

    #[test]
    fn deleting_absent_preview_is_a_noop() {
        let mut sheet = Sheet::new("s1");
        Edit::PreviewDeleted { key: "Z9".into() }.apply(&mut sheet);
        assert!(sheet.previews().is_empty());
    }

    #[test]
    fn column_and_row_edits_broadcast_structured_notices() {
        let log = ChangeLog::new();
        let mut sheet = Sheet::new("s1");
        sheet.listen(log.listener());

        Edit::ColumnChanged {
            column: 2,
            width: 90,
        }
        .apply(&mut sheet);
        Edit::RowChanged { row: 5, height: 32 }.apply(&mut sheet);

        let changes = log.take();
        assert_eq!(
            changes[0].detail,
            ChangeDetail::Column {
                column: 2,
                width: 90
            }
        );
        assert_eq!(changes[1].detail, ChangeDetail::Row { row: 5, height: 32 });
        assert_eq!(sheet.column_width(2), Some(90));
        assert_eq!(sheet.row_height(5), Some(32));
    }

    #[test]
    fn preview_edits_mutate_lazily_created_previews() {
        let mut sheet = Sheet::new("s1");

        Edit::PreviewPositionChanged {
            key: "E5".into(),
            left: 10.0,
            top: 20.0,
        }
        .apply(&mut sheet);
        Edit::PreviewDimensionChanged {
            key: "E5".into(),
            width: 320.0,
            height: 240.0,
        }
        .apply(&mut sheet);
        Edit::PreviewValueChanged {
            key: "E5".into(),
            html: "<iframe/>".into(),
        }
        .apply(&mut sheet);

        let preview = sheet.get_preview("E5");
        assert_eq!((preview.left(), preview.top()), (10.0, 20.0));
        assert_eq!((preview.width(), preview.height()), (320.0, 240.0));
        assert_eq!(preview.html(), "<iframe/>");
    }

    #[test]
    fn embed_edit_toggles_transient_flag() {
        let mut sheet = Sheet::new("s1");
        Edit::CellEmbedChanged {
            key: "A1".into(),
            embed: true,
        }
        .apply(&mut sheet);
        assert!(sheet.get_cell("A1").embed());
    }

    #[test]
    fn style_payload_validation_fails_fast() {
        let ok = Edit::cell_style_changed("A1", json!({}), json!({"color": "red"}));
        assert!(ok.is_ok());

        let not_a_mapping = Edit::cell_style_changed("A1", json!([1, 2]), json!({}));
        assert!(matches!(
            not_a_mapping,
            Err(EditError::StylePayload { .. })
        ));

        let bad_property = Edit::cell_style_changed("A1", json!({}), json!({"color": 7}));
        assert!(matches!(bad_property, Err(EditError::StylePayload { .. })));
    }

    #[test]
    fn edits_serialize_with_class_discriminator() {
        let edit = Edit::CellValueChanged {
            key: "A1".into(),
            before: "1".into(),
            after: "2".into(),
        };
        let text = serde_json::to_string(&edit).unwrap();
        assert!(text.contains("\"_class\":\"CellValueChanged\""));

        let back: Edit = serde_json::from_str(&text).unwrap();
        assert_eq!(back, edit);
    }

    #[test]
    fn controller_owned_undo_stack() {
        // The model never keeps history; this is the contract a
        // surrounding controller drives.
        let mut sheet = Sheet::new("s1");
        let mut undo_stack: Vec<Edit> = Vec::new();

        for edit in [
            Edit::CellScriptChanged {
                key: "A1".into(),
                before: String::new(),
                after: "=1+1".into(),
            },
            Edit::CellValueChanged {
                key: "A1".into(),
                before: String::new(),
                after: "2".into(),
            },
        ] {
            edit.apply(&mut sheet);
            undo_stack.push(edit);
        }

        while let Some(edit) = undo_stack.pop() {
            assert!(edit.undo(&mut sheet));
        }
        assert!(sheet.get_cell("A1").is_blank());
    }

    #[test]
    fn dispatch_mode_is_inherited_by_edit_targets() {
        let mut sheet = Sheet::with_dispatch("s1", Dispatch::Direct);
        let log = ChangeLog::new();
        sheet.listen(log.listener());

        Edit::NameChanged {
            before: sheet.name().to_string(),
            after: "Renamed".into(),
        }
        .apply(&mut sheet);
        assert_eq!(log.field_names(), vec!["name"]);
    }
}
