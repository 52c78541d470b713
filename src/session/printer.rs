//! Columnar printer for member listings

use std::io::{self, Write};

/// Grid shape used by [`print_columns`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Items per row
    pub columns: usize,
    /// Width each item is left-justified to
    pub pad: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            columns: 4,
            pad: 24,
        }
    }
}

impl ColumnLayout {
    pub fn new(
        columns: usize,
        pad: usize,
    ) -> Self {
        Self { columns, pad }
    }
}

/// Write `items` as a left-justified grid followed by one final newline
///
/// Items longer than `pad` are written whole. A zero column count is treated
/// as one column.
pub fn print_columns<W, I, S>(
    out: &mut W,
    items: I,
    layout: ColumnLayout,
) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let columns = layout.columns.max(1);
    let pad = layout.pad;
    for (index, item) in items.into_iter().enumerate() {
        write!(out, "{:<pad$}", item.as_ref(), pad = pad)?;
        if index % columns == columns - 1 {
            writeln!(out)?;
        }
    }
    writeln!(out)
}

/// Render a grid to a string
pub fn format_columns<I, S>(
    items: I,
    layout: ColumnLayout,
) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = print_columns(&mut buf, items, layout);
    String::from_utf8_lossy(&buf).into_owned()
}
