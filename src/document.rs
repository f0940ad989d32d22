/// A decoded file: the header columns and the rows in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document<R> {
    /// Column names from the first line of the file.
    pub header: Vec<String>,
    /// One decoded record per body line.
    pub rows: Vec<R>,
}

impl<R> Document<R> {
    pub fn new(header: Vec<String>, rows: Vec<R>) -> Self {
        Self { header, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column` in the header, if present.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.header.iter().position(|c| c == column)
    }

    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }
}
