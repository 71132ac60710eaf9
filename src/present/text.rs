use super::{Presenter, TableOptions, TableView};
use crate::table::QueryResult;
use anyhow::Result;
use std::io::Write;

/// Boxed ASCII table.
///
/// Value columns are left-aligned, the count column right-aligned. A total
/// row, when present, is set off by an extra rule. Widths are counted in
/// `char`s (see [`TableView::column_widths`]), so borders only line up for
/// single-width text.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    pub options: TableOptions,
}

impl TextTable {
    #[must_use]
    pub const fn new(options: TableOptions) -> Self {
        Self { options }
    }
}

impl Presenter for TextTable {
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()> {
        let view = TableView::from_result(result, &self.options);
        let widths = view.column_widths();
        let count_col = widths.len() - 1;

        let rule = widths.iter().fold(String::from("+"), |mut s, w| {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
            s
        });

        let line = |cells: &[String]| {
            let mut s = String::from("|");
            for (i, (cell, &w)) in cells.iter().zip(&widths).enumerate() {
                let padded = if i == count_col {
                    format!("{cell:>w$}")
                } else {
                    format!("{cell:<w$}")
                };
                s.push(' ');
                s.push_str(&padded);
                s.push_str(" |");
            }
            s
        };

        writeln!(out, "{rule}")?;
        writeln!(out, "{}", line(view.header.as_slice()))?;
        writeln!(out, "{rule}")?;
        for (i, row) in view.rows.iter().enumerate() {
            if view.total_row == Some(i) && i > 0 {
                writeln!(out, "{rule}")?;
            }
            writeln!(out, "{}", line(row.as_slice()))?;
        }
        writeln!(out, "{rule}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn renders_total_under_its_own_rule() {
        let result = QueryResult {
            combination: vec!["direction".into(), "session".into()],
            rows: vec![
                Row::tuple(["IN", "s1"], 12),
                Row::tuple(["OUT", "s2"], 3),
                Row::Total { count: 15 },
            ],
        };
        let text = TextTable::default().render_to_string(&result).unwrap();
        let expected = "\
+-----------+---------+-----+
| direction | session | cnt |
+-----------+---------+-----+
| IN        | s1      |  12 |
| OUT       | s2      |   3 |
+-----------+---------+-----+
|           |         |  15 |
+-----------+---------+-----+
";
        assert_eq!(text, expected);
    }

    #[test]
    fn accented_values_stay_aligned() {
        let result = QueryResult {
            combination: vec!["city".into()],
            rows: vec![Row::tuple(["Genève"], 2), Row::tuple(["Bern"], 1)],
        };
        let text = TextTable::default().render_to_string(&result).unwrap();
        let expected = "\
+--------+-----+
| city   | cnt |
+--------+-----+
| Genève |   2 |
| Bern   |   1 |
+--------+-----+
";
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_result_is_header_only() {
        let result = QueryResult {
            combination: vec!["a".into()],
            rows: vec![],
        };
        let text = TextTable::default().render_to_string(&result).unwrap();
        assert_eq!(text, "+---+-----+\n| a | cnt |\n+---+-----+\n+---+-----+\n");
    }
}
