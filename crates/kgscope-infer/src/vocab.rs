//! Bidirectional name <-> id vocabularies.
//!
//! Entity and relation ids are dense (`0..len`) and fixed at training time.
//! A [`Vocabulary`] is loaded once and never mutated; the reverse map is
//! always the exact inverse of the forward map.
//!
//! Two on-disk formats are accepted:
//!
//! | Extension | Layout |
//! |-----------|--------|
//! | `.gzip` / `.parquet` | one name column + one integer id column |
//! | `.json` | `{"name": id, ...}` |
//!
//! Parquet files written by pandas store the names as the frame index
//! (`__index_level_0__`) and the ids in a column named after the kind
//! (`entity` or `relation`).

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};

/// Extensions probed, in order, when loading a vocabulary by stem.
pub const VOCAB_EXTENSIONS: [&str; 3] = ["gzip", "parquet", "json"];

/// Immutable bijection between names and dense ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    name_to_id: HashMap<String, usize>,
    id_to_name: Vec<String>,
}

impl Vocabulary {
    /// Build from `(name, id)` pairs.
    ///
    /// Fails unless names are unique and ids are exactly `0..n`.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut name_to_id = HashMap::new();
        for (name, id) in pairs {
            let name = name.into();
            if name_to_id.insert(name.clone(), id).is_some() {
                return Err(Error::Validation(format!("duplicate name '{name}'")));
            }
        }

        let size = name_to_id.len();
        let mut slots: Vec<Option<String>> = vec![None; size];
        for (name, &id) in &name_to_id {
            let slot = slots.get_mut(id).ok_or_else(|| {
                Error::Validation(format!(
                    "id {id} for '{name}' is not dense (vocabulary size {size})"
                ))
            })?;
            if let Some(other) = slot.replace(name.clone()) {
                return Err(Error::Validation(format!(
                    "id {id} assigned to both '{other}' and '{name}'"
                )));
            }
        }
        // n names, n slots, no collisions: every slot is filled.
        let id_to_name = slots.into_iter().flatten().collect();

        Ok(Self {
            name_to_id,
            id_to_name,
        })
    }

    /// Build from names in id order.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_pairs(names.into_iter().enumerate().map(|(id, name)| (name, id)))
    }

    /// Id of `name`, if present.
    pub fn id(&self, name: &str) -> Option<usize> {
        self.name_to_id.get(name).copied()
    }

    /// Name of `id`, if in range.
    pub fn name(&self, id: usize) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    /// Names in id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.id_to_name.iter().map(String::as_str)
    }

    /// Draw a name uniformly at random. `None` only when empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        self.name(rng.gen_range(0..self.len()))
    }

    /// Load `<dir>/<stem>.{gzip,parquet,json}`, whichever exists first.
    ///
    /// `id_column` names the parquet column holding ids.
    pub fn load(dir: impl AsRef<Path>, stem: &str, id_column: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let path = VOCAB_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|p| p.is_file())
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "{stem}.{{{}}} in {}",
                    VOCAB_EXTENSIONS.join(","),
                    dir.display()
                ))
            })?;

        let vocab = if path.extension().is_some_and(|e| e == "json") {
            Self::from_json_file(&path)?
        } else {
            Self::from_parquet_file(&path, id_column)?
        };
        debug!(path = %path.display(), size = vocab.len(), "loaded vocabulary");
        Ok(vocab)
    }

    /// Load a `{"name": id}` JSON object.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let map: HashMap<String, usize> = serde_json::from_reader(BufReader::new(file))?;
        Self::from_pairs(map)
    }

    /// Load a two-column parquet file: ids from `id_column`, names from the
    /// other column.
    pub fn from_parquet_file(path: impl AsRef<Path>, id_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = SerializedFileReader::new(file)?;

        let mut pairs = Vec::new();
        for row in reader.get_row_iter(None)? {
            let row = row?;
            let mut id = None;
            let mut name = None;
            for (column, field) in row.get_column_iter() {
                if column == id_column {
                    id = Some(field_to_id(field).ok_or_else(|| {
                        invalid_column(path, id_column, "non-negative integer", field)
                    })?);
                } else if name.is_none() {
                    name = Some(field_to_name(field).ok_or_else(|| {
                        invalid_column(path, column, "string or integer", field)
                    })?);
                }
            }
            match (name, id) {
                (Some(name), Some(id)) => pairs.push((name, id)),
                _ => {
                    return Err(Error::Validation(format!(
                        "{}: expected a name column and an id column '{id_column}'",
                        path.display()
                    )))
                }
            }
        }
        Self::from_pairs(pairs)
    }
}

/// Integer-typed names (WN18RR synsets) are read back as strings.
fn field_to_name(field: &Field) -> Option<String> {
    match field {
        Field::Str(s) => Some(s.clone()),
        Field::Bytes(b) => b.as_utf8().ok().map(str::to_owned),
        Field::Int(i) => Some(i.to_string()),
        Field::Long(i) => Some(i.to_string()),
        Field::UInt(i) => Some(i.to_string()),
        Field::ULong(i) => Some(i.to_string()),
        _ => None,
    }
}

fn field_to_id(field: &Field) -> Option<usize> {
    match *field {
        Field::Int(i) => usize::try_from(i).ok(),
        Field::Long(i) => usize::try_from(i).ok(),
        Field::UInt(i) => usize::try_from(i).ok(),
        Field::ULong(i) => usize::try_from(i).ok(),
        _ => None,
    }
}

fn invalid_column(path: &Path, column: &str, expected: &str, field: &Field) -> Error {
    Error::Validation(format!(
        "{}: column '{column}' expected {expected}, got {field}",
        path.display()
    ))
}
