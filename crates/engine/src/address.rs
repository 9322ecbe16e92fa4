//! Cell address codec.
//!
//! Maps between a human-readable cell key ("B12") and its 1-based
//! (column, row) pair. Columns are bijective base-26: "A"=1, "Z"=26,
//! "AA"=27.

/// Parse a cell key into its (column, row) pair.
///
/// Keys are expected to be well-formed: uppercase letters followed by
/// digits. Malformed input (letters after digits, empty string, other
/// characters) yields an undefined but non-panicking result.
pub fn col_row_from_key(key: &str) -> (u32, u32) {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    for c in key.chars() {
        if c.is_ascii_digit() {
            row = row.wrapping_mul(10).wrapping_add(c as u32 - '0' as u32);
        } else if c.is_ascii_uppercase() {
            col = col.wrapping_mul(26).wrapping_add(c as u32 - 'A' as u32 + 1);
        }
    }
    (col, row)
}

/// Convert a 1-based column index to its letter name: 1="A", 26="Z", 27="AA".
pub fn column_name(col: u32) -> String {
    let mut name = String::new();
    let mut col = col;
    while col > 0 {
        let remainder = (col - 1) % 26;
        name.insert(0, (b'A' + remainder as u8) as char);
        col = (col - 1) / 26;
    }
    name
}

/// Build the cell key for a 1-based (column, row) pair.
pub fn key_from_col_row(col: u32, row: u32) -> String {
    format!("{}{}", column_name(col), row)
}

/// Keys for every cell in the inclusive rectangle, column-major: all rows
/// of a column before moving to the next column. Pure and restartable.
pub fn cell_keys(
    from_col: u32,
    to_col: u32,
    from_row: u32,
    to_row: u32,
) -> impl Iterator<Item = String> {
    (from_col..=to_col)
        .flat_map(move |col| (from_row..=to_row).map(move |row| key_from_col_row(col, row)))
}
