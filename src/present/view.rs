use super::TableOptions;
use crate::table::QueryResult;

/// A query result flattened to strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    /// Metric names followed by the count column header.
    pub header: Vec<String>,
    /// One entry per result row, same width as `header`.
    pub rows: Vec<Vec<String>>,
    /// Index of the total row in `rows`, if any.
    pub total_row: Option<usize>,
}

impl TableView {
    #[must_use]
    pub fn from_result(result: &QueryResult, options: &TableOptions) -> Self {
        let width = result.combination.len();
        let mut header = result.combination.clone();
        header.push(options.count_header.clone());

        let mut total_row = None;
        let rows = result
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if row.is_total() {
                    total_row = Some(i);
                }
                let mut cells = row.cells(width, &options.blank);
                cells.push(row.count().to_string());
                cells
            })
            .collect();

        Self {
            header,
            rows,
            total_row,
        }
    }

    /// Width of each column (max over header and cells), in `char`s.
    ///
    /// Every `char` counts as one column, so East Asian wide characters and
    /// emoji make their cells render wider than the computed width.
    #[must_use]
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        widths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn total_row_gets_blank_cells() {
        let result = QueryResult {
            combination: vec!["direction".into()],
            rows: vec![Row::tuple(["IN"], 2), Row::Total { count: 2 }],
        };
        let view = TableView::from_result(&result, &TableOptions::default());
        assert_eq!(view.header, vec!["direction", "cnt"]);
        assert_eq!(view.rows[1], vec!["", "2"]);
        assert_eq!(view.total_row, Some(1));
        assert_eq!(view.column_widths(), vec![9, 3]);
    }

    #[test]
    fn widths_count_chars_not_bytes() {
        let result = QueryResult {
            combination: vec!["city".into()],
            rows: vec![Row::tuple(["Zürich-Genève"], 1)],
        };
        let view = TableView::from_result(&result, &TableOptions::default());
        assert_eq!(view.column_widths(), vec![13, 3]);
    }
}
