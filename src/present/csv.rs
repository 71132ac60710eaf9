use super::{Presenter, TableOptions, TableView};
use crate::table::QueryResult;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::io::Write;

/// CSV with a header line; the total row has empty value fields.
#[derive(Debug, Clone, Default)]
pub struct CsvPresenter {
    pub options: TableOptions,
}

impl CsvPresenter {
    #[must_use]
    pub const fn new(options: TableOptions) -> Self {
        Self { options }
    }
}

impl Presenter for CsvPresenter {
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()> {
        let view = TableView::from_result(result, &self.options);
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(out);
        wtr.write_record(&view.header).context("write CSV header")?;
        for (i, row) in view.rows.iter().enumerate() {
            wtr.write_record(row)
                .with_context(|| format!("write CSV row #{}", i + 1))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn writes_header_rows_and_total() {
        let result = QueryResult {
            combination: vec!["direction".into(), "session".into()],
            rows: vec![
                Row::tuple(["IN", "s1"], 1),
                Row::tuple(["OUT", "s,2"], 1),
                Row::Total { count: 2 },
            ],
        };
        let text = CsvPresenter::default().render_to_string(&result).unwrap();
        assert_eq!(
            text,
            "direction,session,cnt\nIN,s1,1\nOUT,\"s,2\",1\n,,2\n"
        );
    }
}
