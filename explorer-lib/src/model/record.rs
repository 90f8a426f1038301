//! File record model

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::error::RecordError;

/// Columns that map onto [`FileRecord`] fields rather than annotations.
pub const TOP_LEVEL_FIELDS: [&str; 6] = [
    "file_id",
    "file_name",
    "file_path",
    "file_size",
    "uploaded",
    "thumbnail",
];

/// A named annotation attached to a file, holding one or more values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation name.
    pub name: String,
    /// Annotation values, in source order.
    pub values: Vec<String>,
}

impl Annotation {
    /// Creates a new annotation.
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// The full metadata of one row in the corpus.
///
/// # Example
///
/// ```
/// use explorer_lib::model::FileRecord;
///
/// let record = FileRecord::new("f-1", "/data/plate_01/cell.tiff")
///     .with_size(2048)
///     .with_annotation("Cell Line", ["AICS-11"]);
///
/// assert_eq!(record.file_name, "cell.tiff");
/// assert_eq!(record.values_of("Cell Line"), vec!["AICS-11".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique id of the file.
    pub file_id: String,
    /// Display name of the file.
    pub file_name: String,
    /// Location of the file.
    pub file_path: String,
    /// Size in bytes, when the source knows it.
    pub file_size: Option<u64>,
    /// Upload timestamp, when the source knows it.
    pub uploaded: Option<DateTime<Utc>>,
    /// Thumbnail location, when available.
    pub thumbnail: Option<String>,
    /// Every other column of the row.
    pub annotations: Vec<Annotation>,
}

impl FileRecord {
    /// Creates a record with the given id and path; the name is derived from the path.
    pub fn new(file_id: impl Into<String>, file_path: impl Into<String>) -> Self {
        let file_path = file_path.into();
        Self {
            file_id: file_id.into(),
            file_name: file_name_from_path(&file_path),
            file_path,
            file_size: None,
            uploaded: None,
            thumbnail: None,
            annotations: Vec::new(),
        }
    }

    /// Sets the file size (builder pattern).
    pub fn with_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    /// Sets the upload timestamp (builder pattern).
    pub fn with_uploaded(mut self, uploaded: DateTime<Utc>) -> Self {
        self.uploaded = Some(uploaded);
        self
    }

    /// Adds an annotation (builder pattern).
    pub fn with_annotation(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.annotations.push(Annotation::new(name, values));
        self
    }

    /// Converts a raw row of string columns into a record.
    ///
    /// `file_path` is required. A missing `file_id` falls back to the row number
    /// and a missing `file_name` to the last segment of the path. Columns that
    /// are not top-level fields become annotations whose values are split on
    /// commas.
    pub fn from_row(row: &HashMap<String, String>, row_number: usize) -> Result<Self, RecordError> {
        let file_path = row
            .get("file_path")
            .ok_or_else(|| RecordError::missing("file_path"))?
            .clone();

        let file_id = row
            .get("file_id")
            .filter(|id| !id.is_empty())
            .cloned()
            .unwrap_or_else(|| row_number.to_string());

        let file_name = row
            .get("file_name")
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| file_name_from_path(&file_path));

        let file_size = match row.get("file_size") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| RecordError::invalid("file_size", raw, e))?,
            ),
            None => None,
        };

        let uploaded = match row.get("uploaded") {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw.trim())
                    .map_err(|e| RecordError::invalid("uploaded", raw, e))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let mut annotations: Vec<Annotation> = row
            .iter()
            .filter(|(name, _)| !TOP_LEVEL_FIELDS.contains(&name.as_str()))
            .map(|(name, raw)| Annotation::new(name.as_str(), raw.split(',').map(str::trim)))
            .collect();
        annotations.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self {
            file_id,
            file_name,
            file_path,
            file_size,
            uploaded,
            thumbnail: row.get("thumbnail").cloned(),
            annotations,
        })
    }

    /// Returns the annotation with the given name, if present.
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Returns the values a field or annotation holds, rendered as strings.
    ///
    /// Top-level fields yield at most one value; unknown names yield none.
    pub fn values_of(&self, name: &str) -> Vec<String> {
        match name {
            "file_id" => vec![self.file_id.clone()],
            "file_name" => vec![self.file_name.clone()],
            "file_path" => vec![self.file_path.clone()],
            "file_size" => self.file_size.iter().map(u64::to_string).collect(),
            "uploaded" => self.uploaded.iter().map(DateTime::to_rfc3339).collect(),
            "thumbnail" => self.thumbnail.iter().cloned().collect(),
            _ => self
                .annotation(name)
                .map(|a| a.values.clone())
                .unwrap_or_default(),
        }
    }
}

fn file_name_from_path(path: &str) -> String {
    path.rsplit(['\\', '/'])
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(path)
        .to_string()
}
