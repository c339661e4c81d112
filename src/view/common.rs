//! UI-agnostic view model types.
//!
//! These types represent presentation data without any dependency on a specific
//! rendering framework. The text renderer maps row styles to markers; a richer
//! frontend would map them to colors.

/// Row-level style classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowStyleClass {
    #[default]
    Normal,
    /// Warning level, e.g. medium impact.
    Warning,
    /// Critical level, e.g. high impact.
    Critical,
    /// Dimmed, e.g. SQL text unavailable.
    Dimmed,
}

/// A single table cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewCell {
    pub text: String,
}

impl ViewCell {
    pub fn plain(text: String) -> Self {
        Self { text }
    }
}

/// One table row, parameterized by entity ID type.
#[derive(Debug, Clone)]
pub struct ViewRow<Id> {
    pub id: Id,
    pub cells: Vec<ViewCell>,
    pub style: RowStyleClass,
}

/// Complete table ready to be rendered by any frontend.
#[derive(Debug, Clone)]
pub struct TableViewModel<Id> {
    pub title: String,
    pub headers: Vec<String>,
    pub widths: Vec<u16>,
    pub rows: Vec<ViewRow<Id>>,
}

impl<Id> TableViewModel<Id> {
    /// Renders as fixed-width text. The last column is not padded.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&self.render_line(self.headers.iter().map(String::as_str), ' '));
        for row in &self.rows {
            let marker = match row.style {
                RowStyleClass::Critical => '!',
                RowStyleClass::Warning => '*',
                RowStyleClass::Normal | RowStyleClass::Dimmed => ' ',
            };
            out.push_str(&self.render_line(row.cells.iter().map(|c| c.text.as_str()), marker));
        }
        out
    }

    fn render_line<'a>(&self, cells: impl Iterator<Item = &'a str>, marker: char) -> String {
        let mut line = String::new();
        line.push(marker);
        for (i, cell) in cells.enumerate() {
            line.push(' ');
            match self.widths.get(i) {
                Some(&w) => {
                    let text = crate::fmt::truncate(cell, w as usize);
                    line.push_str(&format!("{:<width$}", text, width = w as usize));
                }
                None => line.push_str(cell),
            }
        }
        line.truncate(line.trim_end().len());
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_text_pads_and_marks_rows() {
        let table = TableViewModel {
            title: "t".to_string(),
            headers: vec!["A".to_string(), "B".to_string()],
            widths: vec![4],
            rows: vec![
                ViewRow {
                    id: 1,
                    cells: vec![ViewCell::plain("x".to_string()), ViewCell::plain("tail".to_string())],
                    style: RowStyleClass::Critical,
                },
                ViewRow {
                    id: 2,
                    cells: vec![
                        ViewCell::plain("toolong".to_string()),
                        ViewCell::plain("y".to_string()),
                    ],
                    style: RowStyleClass::Normal,
                },
            ],
        };
        let text = table.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "t");
        assert_eq!(lines[1], "  A    B");
        assert_eq!(lines[2], "! x    tail");
        assert_eq!(lines[3], "  too… y");
    }
}
