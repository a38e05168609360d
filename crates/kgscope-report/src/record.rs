//! One training run: three JSON documents merged into a [`RunRecord`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub const CONFIGURATION_FILE: &str = "configuration.json";
pub const REPORT_FILE: &str = "report.json";
pub const EVAL_REPORT_FILE: &str = "eval_report.json";

/// Storage paths are shown from this directory name onwards.
pub const DEFAULT_PATH_MARKER: &str = "dice-embeddings";

/// Rank metrics for one split.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SplitMetrics {
    #[serde(rename = "MRR")]
    pub mrr: f64,
    #[serde(rename = "H@1")]
    pub hits_at_1: f64,
    #[serde(rename = "H@3")]
    pub hits_at_3: f64,
    #[serde(rename = "H@10")]
    pub hits_at_10: f64,
}

/// Merged configuration, runtime report and evaluation of one run.
///
/// Configuration values are kept as found; only the report and evaluation
/// numbers feeding numeric columns are typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    /// Run directory name.
    pub run: String,
    pub model: String,
    /// Suffix after the path marker.
    pub full_storage_path: String,
    pub embedding_dim: Value,
    pub normalization: Value,
    pub num_epochs: Value,
    pub batch_size: Value,
    pub lr: Value,
    pub callbacks: Value,
    pub scoring_technique: Value,
    pub path_dataset_folder: Value,
    pub p: Value,
    pub q: Value,
    /// Seconds.
    pub runtime: f64,
    pub num_params: u64,
    pub train: SplitMetrics,
    pub val: SplitMetrics,
    pub test: SplitMetrics,
}

impl RunRecord {
    /// Read the three documents of `dir` and merge them.
    ///
    /// The record is named after the directory's last component.
    pub fn load(dir: impl AsRef<Path>, path_marker: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let run = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        let config = read_json(&dir.join(CONFIGURATION_FILE))?;
        let report = read_json(&dir.join(REPORT_FILE))?;
        let eval = read_json(&dir.join(EVAL_REPORT_FILE))?;
        Self::from_documents(&run, config, report, eval, path_marker)
    }

    /// Merge already-parsed documents.
    ///
    /// Every selected key must be present; the first absent one fails with
    /// [`Error::MissingField`]. A non-numeric value under `Runtime`,
    /// `NumParam` or a split metric fails with [`Error::InvalidField`].
    pub fn from_documents(
        run: &str,
        config: Value,
        report: Value,
        eval: Value,
        path_marker: &str,
    ) -> Result<Self> {
        let mut config = Document::new(run, CONFIGURATION_FILE, config)?;
        let mut report = Document::new(run, REPORT_FILE, report)?;
        let mut eval = Document::new(run, EVAL_REPORT_FILE, eval)?;

        let full_storage_path = config.take_text("full_storage_path")?;
        Ok(Self {
            run: run.to_string(),
            model: config.take_text("model")?,
            full_storage_path: truncate_storage_path(&full_storage_path, path_marker).to_string(),
            embedding_dim: config.take("embedding_dim")?,
            normalization: config.take("normalization")?,
            num_epochs: config.take("num_epochs")?,
            batch_size: config.take("batch_size")?,
            lr: config.take("lr")?,
            callbacks: config.take("callbacks")?,
            scoring_technique: config.take("scoring_technique")?,
            path_dataset_folder: config.take("path_dataset_folder")?,
            p: config.take("p")?,
            q: config.take("q")?,
            runtime: report.take("Runtime")?,
            num_params: report.take("NumParam")?,
            train: eval.take_split("Train")?,
            val: eval.take_split("Val")?,
            test: eval.take_split("Test")?,
        })
    }
}

/// Everything after the first occurrence of `marker`, or the whole path if
/// the marker does not occur.
pub fn truncate_storage_path<'a>(path: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return path;
    }
    match path.find(marker) {
        Some(pos) => &path[pos + marker.len()..],
        None => path,
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| Error::file_access(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// A JSON object from which selected keys are moved out.
struct Document<'a> {
    run: &'a str,
    name: String,
    fields: Map<String, Value>,
}

impl<'a> Document<'a> {
    fn new(run: &'a str, name: &str, value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self {
                run,
                name: name.to_string(),
                fields,
            }),
            _ => Err(Error::NotAnObject {
                run: run.to_string(),
                document: name.to_string(),
            }),
        }
    }

    fn take<T: DeserializeOwned>(&mut self, key: &str) -> Result<T> {
        let value = self.fields.remove(key).ok_or_else(|| Error::MissingField {
            run: self.run.to_string(),
            document: self.name.clone(),
            key: key.to_string(),
        })?;
        serde_json::from_value(value).map_err(|source| Error::InvalidField {
            run: self.run.to_string(),
            document: self.name.clone(),
            key: key.to_string(),
            source,
        })
    }

    /// Strings as-is, `null` as `None`, anything else as compact JSON.
    fn take_text(&mut self, key: &str) -> Result<String> {
        Ok(match self.take::<Value>(key)? {
            Value::String(s) => s,
            Value::Null => "None".to_string(),
            other => other.to_string(),
        })
    }

    /// `{"MRR": .., "H@1": .., "H@3": .., "H@10": ..}` under `key`.
    fn take_split(&mut self, key: &str) -> Result<SplitMetrics> {
        let value: Value = self.take(key)?;
        let mut split = Document::new(self.run, &format!("{}[{key}]", self.name), value)?;
        Ok(SplitMetrics {
            mrr: split.take("MRR")?,
            hits_at_1: split.take("H@1")?,
            hits_at_3: split.take("H@3")?,
            hits_at_10: split.take("H@10")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Value {
        json!({
            "model": "DistMult",
            "full_storage_path": "/home/user/dice-embeddings/Experiments/2022-03-09",
            "embedding_dim": 32,
            "normalization": "LayerNorm",
            "num_epochs": 100,
            "batch_size": 1024,
            "lr": 0.01,
            "callbacks": {},
            "scoring_technique": "KvsAll",
            "path_dataset_folder": "KGs/KINSHIP",
            "p": 0,
            "q": 1,
            "num_core": 4
        })
    }

    fn split(mrr: f64) -> Value {
        json!({"MRR": mrr, "H@1": 0.1, "H@3": 0.2, "H@10": 0.3})
    }

    #[test]
    fn test_merge() {
        let record = RunRecord::from_documents(
            "run-a",
            config(),
            json!({"Runtime": 12.5, "NumParam": 4000, "Other": 1}),
            json!({"Train": split(0.9), "Val": split(0.5), "Test": split(0.42)}),
            DEFAULT_PATH_MARKER,
        )
        .unwrap();

        assert_eq!(record.run, "run-a");
        assert_eq!(record.model, "DistMult");
        assert_eq!(record.full_storage_path, "/Experiments/2022-03-09");
        assert_eq!(record.num_params, 4000);
        assert_eq!(record.test.mrr, 0.42);
        assert_eq!(record.train.hits_at_10, 0.3);
        assert_eq!(record.callbacks, json!({}));
    }

    #[test]
    fn test_missing_key() {
        let mut config = config();
        config.as_object_mut().unwrap().remove("lr");

        let err = RunRecord::from_documents(
            "run-b",
            config,
            json!({"Runtime": 1.0, "NumParam": 1}),
            json!({"Train": split(0.1), "Val": split(0.1), "Test": split(0.1)}),
            DEFAULT_PATH_MARKER,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingField { ref run, ref document, ref key }
                if run == "run-b" && document == CONFIGURATION_FILE && key == "lr"
        ));
    }

    #[test]
    fn test_missing_split_metric() {
        let err = RunRecord::from_documents(
            "run-c",
            config(),
            json!({"Runtime": 1.0, "NumParam": 1}),
            json!({"Train": split(0.1), "Val": split(0.1), "Test": {"MRR": 0.1}}),
            DEFAULT_PATH_MARKER,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingField { ref document, ref key, .. }
                if document == "eval_report.json[Test]" && key == "H@1"
        ));
    }

    #[test]
    fn test_configuration_values_kept_as_found() {
        let mut config = config();
        config["batch_size"] = Value::Null;
        config["num_epochs"] = json!("many");
        config["embedding_dim"] = json!([32, 64]);
        config["path_dataset_folder"] = json!(7);
        config["model"] = Value::Null;

        let record = RunRecord::from_documents(
            "run-f",
            config,
            json!({"Runtime": 1.0, "NumParam": 1}),
            json!({"Train": split(0.1), "Val": split(0.1), "Test": split(0.1)}),
            DEFAULT_PATH_MARKER,
        )
        .unwrap();
        assert_eq!(record.batch_size, Value::Null);
        assert_eq!(record.num_epochs, json!("many"));
        assert_eq!(record.embedding_dim, json!([32, 64]));
        assert_eq!(record.path_dataset_folder, json!(7));
        assert_eq!(record.model, "None");
    }

    #[test]
    fn test_non_numeric_metric() {
        let err = RunRecord::from_documents(
            "run-e",
            config(),
            json!({"Runtime": "fast", "NumParam": 1}),
            json!({"Train": split(0.1), "Val": split(0.1), "Test": split(0.1)}),
            DEFAULT_PATH_MARKER,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidField { ref key, .. } if key == "Runtime"));
    }

    #[test]
    fn test_not_an_object() {
        let err = RunRecord::from_documents(
            "run-d",
            config(),
            json!([1, 2]),
            json!({}),
            DEFAULT_PATH_MARKER,
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotAnObject { ref document, .. } if document == REPORT_FILE));
    }

    #[test]
    fn test_truncate_storage_path() {
        assert_eq!(
            truncate_storage_path("/a/dice-embeddings/Exp/1", "dice-embeddings"),
            "/Exp/1"
        );
        assert_eq!(truncate_storage_path("/a/other/Exp/1", "dice-embeddings"), "/a/other/Exp/1");
        assert_eq!(truncate_storage_path("/a/b", ""), "/a/b");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunRecord::load(dir.path(), DEFAULT_PATH_MARKER).unwrap_err();
        assert!(matches!(err, Error::FileAccess { ref path, .. } if path.ends_with(CONFIGURATION_FILE)));
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIGURATION_FILE), "{not json").unwrap();
        let err = RunRecord::load(dir.path(), DEFAULT_PATH_MARKER).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }
}
