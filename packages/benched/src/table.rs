//! Tabular report output.

use std::fmt::Write;

/// One report table: a name, ordered column headers and rows of preformatted cells.
///
/// The name identifies the table towards a [`TableSink`](crate::TableSink) (for example,
/// [`CsvDirectorySink`](crate::CsvDirectorySink) writes `<name>.csv`).
///
/// # Examples
///
/// ```
/// use benched::Table;
///
/// let mut table = Table::new("demo", ["Phase", "Count"]);
/// table.push_row(["render", "3"]);
///
/// assert_eq!(table.to_delimited(';'), "Phase;Count\nrender;3");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table with the given name and column headers and no rows.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        headers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a data row.
    ///
    /// Rows are not required to have as many cells as there are headers, though every table
    /// this crate produces keeps them equal.
    pub fn push_row(&mut self, cells: impl IntoIterator<Item = impl Into<String>>) {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// The table's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column headers, in order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The data rows, in order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Looks up a cell by row index and column header.
    #[must_use]
    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let column = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Renders the header row followed by one line per data row.
    ///
    /// Cells containing the delimiter, a double quote or a line break are quoted, with
    /// embedded quotes doubled. Lines are separated by `\n` without a trailing newline.
    #[must_use]
    pub fn to_delimited(&self, delimiter: char) -> String {
        let mut output = String::new();

        write_line(&mut output, &self.headers, delimiter);

        for row in &self.rows {
            output.push('\n');
            write_line(&mut output, row, delimiter);
        }

        output
    }
}

fn write_line(output: &mut String, cells: &[String], delimiter: char) {
    for (index, cell) in cells.iter().enumerate() {
        if index != 0 {
            output.push(delimiter);
        }

        if cell.contains(delimiter) || cell.contains('"') || cell.contains('\n') {
            write!(output, "\"{}\"", cell.replace('"', "\"\""))
                .expect("we expect writing to String to be infallible");
        } else {
            output.push_str(cell);
        }
    }
}
