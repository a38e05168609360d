//! Comparison table over run records, with LaTeX and CSV rendering.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::RunRecord;

/// A displayed column of the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ModelName,
    TrainMrr,
    TrainH1,
    TrainH3,
    TrainH10,
    ValMrr,
    ValH1,
    ValH3,
    ValH10,
    TestMrr,
    TestH1,
    TestH3,
    TestH10,
    Runtime,
    Params,
    Callbacks,
    ScoringTechnique,
}

impl Column {
    /// Every displayed column, in output order.
    pub const ALL: [Column; 17] = [
        Column::ModelName,
        Column::TrainMrr,
        Column::TrainH1,
        Column::TrainH3,
        Column::TrainH10,
        Column::ValMrr,
        Column::ValH1,
        Column::ValH3,
        Column::ValH10,
        Column::TestMrr,
        Column::TestH1,
        Column::TestH3,
        Column::TestH10,
        Column::Runtime,
        Column::Params,
        Column::Callbacks,
        Column::ScoringTechnique,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ModelName => "model_name",
            Self::TrainMrr => "train_mrr",
            Self::TrainH1 => "train_h1",
            Self::TrainH3 => "train_h3",
            Self::TrainH10 => "train_h10",
            Self::ValMrr => "val_mrr",
            Self::ValH1 => "val_h1",
            Self::ValH3 => "val_h3",
            Self::ValH10 => "val_h10",
            Self::TestMrr => "test_mrr",
            Self::TestH1 => "test_h1",
            Self::TestH3 => "test_h3",
            Self::TestH10 => "test_h10",
            Self::Runtime => "runtime",
            Self::Params => "params",
            Self::Callbacks => "callbacks",
            Self::ScoringTechnique => "scoring_technique",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            Self::ModelName | Self::Callbacks | Self::ScoringTechnique
        )
    }

    pub fn cell(&self, record: &RunRecord) -> Cell {
        match self {
            Self::ModelName => Cell::Text(record.model.clone()),
            Self::TrainMrr => Cell::Float(record.train.mrr),
            Self::TrainH1 => Cell::Float(record.train.hits_at_1),
            Self::TrainH3 => Cell::Float(record.train.hits_at_3),
            Self::TrainH10 => Cell::Float(record.train.hits_at_10),
            Self::ValMrr => Cell::Float(record.val.mrr),
            Self::ValH1 => Cell::Float(record.val.hits_at_1),
            Self::ValH3 => Cell::Float(record.val.hits_at_3),
            Self::ValH10 => Cell::Float(record.val.hits_at_10),
            Self::TestMrr => Cell::Float(record.test.mrr),
            Self::TestH1 => Cell::Float(record.test.hits_at_1),
            Self::TestH3 => Cell::Float(record.test.hits_at_3),
            Self::TestH10 => Cell::Float(record.test.hits_at_10),
            Self::Runtime => Cell::Float(record.runtime),
            Self::Params => Cell::Int(record.num_params),
            Self::Callbacks => Cell::Text(value_text(&record.callbacks)),
            Self::ScoringTechnique => Cell::Text(value_text(&record.scoring_technique)),
        }
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::UnknownColumn(s.to_string()))
    }
}

/// Strings print bare, `null` as `None`, anything else as compact JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Float(f64),
    Int(u64),
}

impl Cell {
    /// Floats with 3 decimals, everything else verbatim.
    pub fn format(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Float(v) => format!("{v:.3}"),
            Self::Int(v) => v.to_string(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float(v) => Some(v),
            Self::Int(v) => Some(v as f64),
            Self::Text(_) => None,
        }
    }
}

/// Rows of [`RunRecord`]s rendered through [`Column::ALL`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryTable {
    records: Vec<RunRecord>,
}

impl SummaryTable {
    pub fn new(records: Vec<RunRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stable sort, highest value first, NaN last.
    pub fn sort_descending(&mut self, column: Column) -> Result<()> {
        if !column.is_numeric() {
            return Err(Error::NotSortable(column.name()));
        }
        self.records.sort_by(|a, b| {
            let a = column.cell(a).as_f64().unwrap_or(f64::NAN);
            let b = column.cell(b).as_f64().unwrap_or(f64::NAN);
            match (a.is_nan(), b.is_nan()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
            }
        });
        Ok(())
    }

    /// `tabular` environment with booktabs rules.
    pub fn to_latex(&self) -> String {
        let align: String = Column::ALL
            .iter()
            .map(|c| if c.is_numeric() { 'r' } else { 'l' })
            .collect();

        let mut out = String::new();
        let _ = writeln!(out, "\\begin{{tabular}}{{{align}}}");
        out.push_str("\\toprule\n");
        let header: Vec<String> = Column::ALL.iter().map(|c| latex_escape(c.name())).collect();
        let _ = writeln!(out, "{} \\\\", header.join(" & "));
        out.push_str("\\midrule\n");
        for record in &self.records {
            let row: Vec<String> = Column::ALL
                .iter()
                .map(|c| latex_escape(&c.cell(record).format()))
                .collect();
            let _ = writeln!(out, "{} \\\\", row.join(" & "));
        }
        out.push_str("\\bottomrule\n");
        out.push_str("\\end{tabular}\n");
        out
    }

    /// CSV with a leading `run` column, then [`Column::ALL`].
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(std::iter::once("run").chain(Column::ALL.iter().map(Column::name)))?;
        for record in &self.records {
            let cells = Column::ALL.iter().map(|c| c.cell(record).format());
            csv.write_record(std::iter::once(record.run.clone()).chain(cells))?;
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn latex_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}
