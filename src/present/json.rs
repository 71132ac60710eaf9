use super::{Presenter, TableOptions};
use crate::table::{QueryResult, Row};
use anyhow::{Context, Result};
use serde_json::{Map, Value as JsonValue, json};
use std::io::Write;

/// JSON array with one object per row.
///
/// Values keep their JSON types (`"IN"`, `true`, `7`); the total row carries
/// the configured blank string in each metric column.
#[derive(Debug, Clone, Default)]
pub struct JsonPresenter {
    pub options: TableOptions,
    /// Pretty-print instead of one compact line.
    pub pretty: bool,
}

impl JsonPresenter {
    #[must_use]
    pub const fn new(options: TableOptions, pretty: bool) -> Self {
        Self { options, pretty }
    }

    fn to_json(&self, result: &QueryResult) -> Result<JsonValue> {
        let mut out = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            let mut obj = Map::new();
            match row {
                Row::Tuple { values, .. } => {
                    for (name, v) in result.combination.iter().zip(values.iter()) {
                        let v = serde_json::to_value(v)
                            .with_context(|| format!("serialize value of '{name}'"))?;
                        obj.insert(name.clone(), v);
                    }
                }
                Row::Total { .. } => {
                    for name in &result.combination {
                        obj.insert(name.clone(), json!(self.options.blank));
                    }
                }
            }
            obj.insert(self.options.count_header.clone(), json!(row.count()));
            out.push(JsonValue::Object(obj));
        }
        Ok(JsonValue::Array(out))
    }
}

impl Presenter for JsonPresenter {
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()> {
        let doc = self.to_json(result)?;
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &doc)
        } else {
            serde_json::to_writer(&mut *out, &doc)
        }
        .context("write JSON table")?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn keeps_scalar_types() {
        let result = QueryResult {
            combination: vec!["successful".into(), "type".into()],
            rows: vec![
                Row::tuple(vec![Value::from(true), Value::from("Verify")], 4),
                Row::Total { count: 4 },
            ],
        };
        let text = JsonPresenter::default().render_to_string(&result).unwrap();
        let parsed: JsonValue = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"successful": true, "type": "Verify", "cnt": 4},
                {"successful": "", "type": "", "cnt": 4}
            ])
        );
    }
}
