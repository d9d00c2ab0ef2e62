/// The editor's view of what the user has selected.
///
/// Only plain text goes in and out; document structure stays with the host.
pub trait Document {
    fn selection_count(&self) -> usize;
    fn selection_text(&self, index: usize) -> &str;
    fn replace_selection(&mut self, index: usize, text: String);
}

/// A single selected range in a text document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSelection {
    text: String,
}

impl TextSelection {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl Document for TextSelection {
    fn selection_count(&self) -> usize {
        1
    }

    fn selection_text(&self, _index: usize) -> &str {
        &self.text
    }

    fn replace_selection(&mut self, _index: usize, text: String) {
        self.text = text;
    }
}

/// A rectangular range of spreadsheet cells, visited row by row.
///
/// Cells are exchanged as TSV. Tabs, line breaks and backslashes inside a
/// cell are written as `\t`, `\n`, `\r` and `\\` and read back the same
/// way, so a multi-line reply stays in its own cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid {
    rows: Vec<Vec<String>>,
    width: usize,
    line_ending: &'static str,
    trailing_newline: bool,
}

impl CellGrid {
    /// Parses tab-separated rows; short rows are padded with empty cells.
    pub fn from_tsv(input: &str) -> Self {
        let mut rows: Vec<Vec<String>> = input
            .lines()
            .map(|line| line.split('\t').map(unescape_cell).collect())
            .collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Self {
            rows,
            width,
            line_ending: if input.contains("\r\n") { "\r\n" } else { "\n" },
            trailing_newline: input.ends_with('\n'),
        }
    }

    pub fn to_tsv(&self) -> String {
        let mut out = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| escape_cell(cell)).collect::<Vec<_>>().join("\t"))
            .collect::<Vec<_>>()
            .join(self.line_ending);
        if self.trailing_newline {
            out.push_str(self.line_ending);
        }
        out
    }

    #[cfg(test)]
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    fn position(&self, index: usize) -> (usize, usize) {
        (index / self.width, index % self.width)
    }
}

// A backslash is only doubled when the next character would otherwise read
// as an escape, so paths like `C:\data` pass through untouched.
fn escape_cell(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut chars = cell.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' if matches!(
                chars.peek(),
                Some('t' | 'n' | 'r' | '\\' | '\t' | '\n' | '\r')
            ) =>
            {
                out.push_str("\\\\")
            }
            _ => out.push(c),
        }
    }
    out
}

fn unescape_cell(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.peek() {
            Some('t') => '\t',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('\\') => '\\',
            _ => {
                out.push(c);
                continue;
            }
        };
        chars.next();
        out.push(decoded);
    }
    out
}

impl Document for CellGrid {
    fn selection_count(&self) -> usize {
        self.rows.len() * self.width
    }

    fn selection_text(&self, index: usize) -> &str {
        let (row, col) = self.position(index);
        &self.rows[row][col]
    }

    fn replace_selection(&mut self, index: usize, text: String) {
        let (row, col) = self.position(index);
        self.rows[row][col] = text;
    }
}
