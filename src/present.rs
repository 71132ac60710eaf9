//! Rendering query results.
//!
//! Presenters are pure: they turn a [`QueryResult`] into text and never touch
//! the aggregator's counts. Three are provided:
//!
//! - [`TextTable`] -- boxed ASCII grid for terminals
//! - [`JsonPresenter`] -- array of objects keyed by column name
//! - [`CsvPresenter`] -- header plus one line per row (feature `io-csv`)
//!
//! All of them go through [`TableView`], the plain string grid
//! (header = metric names in combination order + count column).
//!
//! # Example
//! ```
//! use crosstally::{Aggregator, Metric};
//! use crosstally::present::{Presenter, TextTable};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut agg = Aggregator::with_all_combinations(vec![Metric::field("direction", "direction")])?;
//! agg.observe(&json!({"direction": "IN"}))?;
//!
//! let text = TextTable::default().render_to_string(&agg.query(&["direction"], false)?)?;
//! assert_eq!(
//!     text,
//!     "+-----------+-----+\n\
//!      | direction | cnt |\n\
//!      +-----------+-----+\n\
//!      | IN        |   1 |\n\
//!      +-----------+-----+\n"
//! );
//! # Ok(())
//! # }
//! ```

mod json;
mod text;
mod view;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
mod csv;

pub use json::JsonPresenter;
pub use text::TextTable;
pub use view::TableView;

#[cfg(feature = "io-csv")]
pub use self::csv::CsvPresenter;

use crate::aggregator::Aggregator;
use crate::table::QueryResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Column labelling shared by all presenters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Header of the count column.
    pub count_header: String,
    /// Text placed in the value cells of the total row.
    pub blank: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            count_header: "cnt".to_string(),
            blank: String::new(),
        }
    }
}

/// Renders one query result.
pub trait Presenter {
    /// Write `result` to `out`.
    ///
    /// # Errors
    /// Propagates write and serialization failures.
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()>;

    /// Render into a `String`.
    ///
    /// # Errors
    /// Same as [`render`](Self::render).
    fn render_to_string(&self, result: &QueryResult) -> Result<String> {
        let mut buf = Vec::new();
        self.render(result, &mut buf)?;
        String::from_utf8(buf).context("presenter produced invalid UTF-8")
    }
}

/// Render every tracked combination, in registration order, separated by a
/// blank line.
///
/// # Errors
/// Propagates presenter and write failures.
pub fn write_report<R, P>(
    aggregator: &Aggregator<R>,
    presenter: &P,
    include_total: bool,
    out: &mut dyn Write,
) -> Result<()>
where
    P: Presenter + ?Sized,
{
    for (i, result) in aggregator.query_all(include_total).iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        presenter
            .render(result, out)
            .with_context(|| format!("render table {}", result.combination.join("/")))?;
    }
    out.flush()?;
    Ok(())
}
