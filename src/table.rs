//! Column-aligned plain text tables.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub title: String,
    pub align: Align,
}

/// Pads every cell to its column's widest value. Columns are separated by two spaces,
/// trailing whitespace is trimmed.
#[derive(Debug, Clone)]
pub struct TextTable {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: titles
                .into_iter()
                .map(|t| Column {
                    title: t.into(),
                    align: Align::Left,
                })
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn align(mut self, column: usize, align: Align) -> Self {
        if let Some(c) = self.columns.get_mut(column) {
            c.align = align;
        }
        self
    }

    /// Add a row. Missing cells render empty, extra cells are dropped.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(c.title.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn format_line<'a>(&self, widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
        let parts: Vec<String> = cells
            .zip(self.columns.iter())
            .zip(widths)
            .map(|((cell, col), &w)| match col.align {
                Align::Left => format!("{:<w$}", cell, w = w),
                Align::Right => format!("{:>w$}", cell, w = w),
            })
            .collect();
        parts.join("  ").trim_end().to_string()
    }

    pub fn header_line(&self) -> String {
        let widths = self.widths();
        self.format_line(&widths, self.columns.iter().map(|c| c.title.as_str()))
    }

    /// One rendered line per row, without the header.
    pub fn row_lines(&self) -> Vec<String> {
        let widths = self.widths();
        self.rows
            .iter()
            .map(|r| self.format_line(&widths, r.iter().map(String::as_str)))
            .collect()
    }

    /// Header followed by all rows.
    pub fn render(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.header_line());
        out.extend(self.row_lines());
        out
    }
}
