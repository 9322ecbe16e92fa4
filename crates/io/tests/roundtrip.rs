//! Round-trip behavior of the native wire format against a live
//! document: sparse elision, lazy re-creation after decode, and the
//! edit/undo flow a controller drives.

use gridbook_engine::cell::StyleMap;
use gridbook_engine::observe::{ChangeLog, Dispatch, NoticeQueue};
use gridbook_engine::{Edit, Sheet};
use gridbook_io::{decode, encode, get_sheet};

#[test]
fn sparse_cells_drop_out_but_stay_addressable() {
    let mut sheet = Sheet::new("uid-1");
    sheet.get_cell("A1").set_script("=1+1");
    sheet.get_cell("A1").set_value("2");
    sheet.get_cell("A2"); // blank: materialized, never persisted

    let text = encode(&sheet);
    let mut decoded = decode(&text).unwrap().into_sheet().unwrap();

    let a1 = decoded.get_cell("A1");
    assert_eq!(a1.script(), "=1+1");
    assert_eq!(a1.value(), "2");

    assert!(!decoded.cells().contains_key("A2"));
    let a2 = decoded.get_cell("A2");
    assert!(a2.is_blank());
    assert_eq!((a2.column(), a2.row()), (1, 2));
}

#[test]
fn full_document_round_trip() {
    let mut sheet = Sheet::new("uid-2");
    sheet.set_name("Quarterly");
    sheet.set_selected("C7");
    sheet.set_screenshot("/q.png");
    sheet.set_created_timestamp(1_700_000_000);
    sheet.set_updated_timestamp(1_700_000_500);
    sheet.set_column_width(2, 140);
    sheet.set_row_height(7, 36);

    sheet.get_cell("C7").set_script("=SUM(A1:A6)");
    sheet.get_cell("C7").set_value("21");
    let mut style = StyleMap::new();
    style.insert("color".into(), "red".into());
    sheet.get_cell("C7").set_style(style);

    let preview = sheet.get_preview("C7");
    preview.set_html("<img src='/chart.png'>");
    preview.set_embed(true);
    preview.set_left(40.0);
    preview.set_top(60.0);
    preview.set_width(320.0);
    preview.set_height(200.0);

    let decoded = decode(&encode(&sheet)).unwrap().into_sheet().unwrap();

    assert_eq!(decoded.name(), "Quarterly");
    assert_eq!(decoded.selected(), "C7");
    assert_eq!(decoded.screenshot(), "/q.png");
    assert_eq!(decoded.created_timestamp(), 1_700_000_000);
    assert_eq!(decoded.updated_timestamp(), 1_700_000_500);
    assert_eq!(decoded.column_width(2), Some(140));
    assert_eq!(decoded.row_height(7), Some(36));

    let cell = &decoded.cells()["C7"];
    assert_eq!(cell.script(), "=SUM(A1:A6)");
    assert_eq!(cell.value(), "21");
    assert_eq!(cell.style().get("color").map(String::as_str), Some("red"));

    let preview = &decoded.previews()["C7"];
    assert_eq!(preview.html(), "<img src='/chart.png'>");
    assert!(preview.embed());
    assert_eq!((preview.left(), preview.top()), (40.0, 60.0));
    assert_eq!((preview.width(), preview.height()), (320.0, 200.0));
}

#[test]
fn second_round_trip_is_byte_stable() {
    let mut sheet = Sheet::new("uid-3");
    sheet.get_cell("B2").set_script("=2*2");
    sheet.get_cell("B2").set_value("4");
    sheet.get_preview("B2").set_html("<p/>");

    let first = encode(&sheet);
    let decoded = decode(&first).unwrap().into_sheet().unwrap();
    let second = encode(&decoded);
    assert_eq!(first, second);
}

#[test]
fn decoded_sheet_keeps_uid_equality_contract() {
    let mut sheet = Sheet::new("uid-4");
    sheet.get_cell("A1").set_value("x");

    let decoded = get_sheet(&encode(&sheet), "ignored").unwrap();
    assert_eq!(decoded, sheet);
    assert_ne!(decoded, Sheet::new("uid-5"));
}

#[test]
fn controller_flow_edit_undo_then_persist() {
    let mut sheet = get_sheet("", "uid-6").unwrap();
    let mut undo_stack = Vec::new();

    let edit = Edit::CellValueChanged {
        key: "A1".into(),
        before: String::new(),
        after: "2".into(),
    };
    edit.apply(&mut sheet);
    undo_stack.push(edit);

    let script = Edit::CellScriptChanged {
        key: "A1".into(),
        before: String::new(),
        after: "=1+1".into(),
    };
    script.apply(&mut sheet);
    undo_stack.push(script);

    // Selection changes are not undoable and stay off the stack.
    let selection = Edit::SelectionChanged { key: "A1".into() };
    selection.apply(&mut sheet);
    assert!(!selection.undo(&mut sheet));

    let persisted = encode(&sheet);
    let decoded = decode(&persisted).unwrap().into_sheet().unwrap();
    assert_eq!(decoded.cells()["A1"].script(), "=1+1");

    while let Some(edit) = undo_stack.pop() {
        assert!(edit.undo(&mut sheet));
    }
    assert!(sheet.get_cell("A1").is_blank());
}

#[test]
fn decoded_sheet_accepts_queued_dispatch() {
    let mut sheet = Sheet::new("uid-7");
    sheet.get_cell("A1").set_script("=1");

    let mut decoded = decode(&encode(&sheet)).unwrap().into_sheet().unwrap();
    let queue = NoticeQueue::new();
    decoded.set_dispatch(Dispatch::Queued(queue.clone()));

    let log = ChangeLog::new();
    decoded.get_cell("A1").listen(log.listener());
    decoded.get_cell("A1").set_value("1");

    assert!(log.is_empty());
    queue.drain();
    assert_eq!(log.field_names(), vec!["value"]);
}
