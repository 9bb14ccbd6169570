//! Submitted values, keyed by field name
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// An uploaded file as handed over by the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub filename: String,
    #[serde(default)]
    pub mime_type: String,
    /// Where the host keeps the bytes until they are stored
    pub temp_ref: String,
    #[serde(default)]
    pub size: u64,
}

/// One raw submitted value. The shape depends on the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    List(Vec<String>),
    Files(Vec<Option<FileDescriptor>>),
    File(FileDescriptor),
    Map(BTreeMap<String, String>),
}

impl RawValue {
    /// Read one submitted JSON value. Numbers and booleans become text,
    /// `null` is no value; `Err` marks a shape no widget produces.
    fn from_json(value: &Value) -> Result<Option<Self>, ()> {
        match value {
            Value::Null => Ok(None),
            Value::Array(items) if items.iter().all(|v| scalar_text(v).is_some()) => Ok(Some(
                RawValue::List(items.iter().filter_map(scalar_text).collect()),
            )),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => Ok(None),
                    other => descriptor(other).map(Some),
                })
                .collect::<Result<Vec<_>, ()>>()
                .map(|files| Some(RawValue::Files(files))),
            Value::Object(map) if map.contains_key("temp_ref") => {
                descriptor(value).map(|f| Some(RawValue::File(f)))
            }
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::Null => Ok((k.clone(), String::new())),
                    other => scalar_text(other).map(|t| (k.clone(), t)).ok_or(()),
                })
                .collect::<Result<BTreeMap<_, _>, ()>>()
                .map(|map| Some(RawValue::Map(map))),
            other => scalar_text(other).map(|t| Some(RawValue::Text(t))).ok_or(()),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn descriptor(value: &Value) -> Result<FileDescriptor, ()> {
    serde_json::from_value(value.clone()).map_err(|_| ())
}

/// The payload of one form namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionPayload {
    values: HashMap<String, RawValue>,
    /// Fields whose submitted value had no readable shape
    #[serde(skip)]
    malformed: BTreeSet<String>,
}

impl SubmissionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the namespace of `identifier` from full request data
    /// (`{ "<identifier>": { "<field>": ... } }`).
    ///
    /// A present namespace is always a submission. Unreadable values are
    /// left out and listed by [`SubmissionPayload::malformed`].
    pub fn from_request(request: &Value, identifier: &str) -> Option<Self> {
        let section = request.get(identifier)?;
        let mut payload = Self::new();
        if let Value::Object(fields) = section {
            for (name, value) in fields {
                match RawValue::from_json(value) {
                    Ok(Some(raw)) => payload.insert(name.clone(), raw),
                    Ok(None) => {}
                    Err(()) => {
                        tracing::debug!(field = %name, "unreadable submitted value");
                        payload.malformed.insert(name.clone());
                    }
                }
            }
        }
        Some(payload)
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.values.get(name)
    }

    pub fn is_malformed(&self, name: &str) -> bool {
        self.malformed.contains(name)
    }

    pub fn malformed(&self) -> impl Iterator<Item = &str> {
        self.malformed.iter().map(String::as_str)
    }

    /// Every file descriptor of the payload, for hosts that re-measure them.
    pub fn files_mut(&mut self) -> impl Iterator<Item = &mut FileDescriptor> {
        self.values.values_mut().flat_map(|value| {
            let files: Vec<&mut FileDescriptor> = match value {
                RawValue::File(file) => vec![file],
                RawValue::Files(files) => files.iter_mut().flatten().collect(),
                _ => Vec::new(),
            };
            files
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: RawValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: RawValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, RawValue::Text(value.into()))
    }

    pub fn with_list(self, name: impl Into<String>, values: &[&str]) -> Self {
        self.with(
            name,
            RawValue::List(values.iter().map(|v| v.to_string()).collect()),
        )
    }

    pub fn with_map(self, name: impl Into<String>, pairs: &[(&str, &str)]) -> Self {
        self.with(
            name,
            RawValue::Map(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
        )
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<HashMap<String, RawValue>> for SubmissionPayload {
    fn from(values: HashMap<String, RawValue>) -> Self {
        Self {
            values,
            malformed: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shapes_from_json() {
        let request = json!({
            "contact": {
                "name": "Ada",
                "colors": ["red", "blue"],
                "birthday": { "year": "05", "month": "3", "day": "5" },
                "cv": { "filename": "cv.pdf", "temp_ref": "/tmp/php123", "size": 1200 },
                "photos": [null, { "filename": "a.png", "temp_ref": "/tmp/a" }]
            }
        });

        let payload = SubmissionPayload::from_request(&request, "contact").unwrap();
        assert_eq!(payload.get("name"), Some(&RawValue::Text("Ada".into())));
        assert!(matches!(payload.get("colors"), Some(RawValue::List(v)) if v.len() == 2));
        assert!(matches!(payload.get("birthday"), Some(RawValue::Map(m)) if m["year"] == "05"));
        assert!(matches!(payload.get("cv"), Some(RawValue::File(f)) if f.size == 1200));
        assert!(matches!(payload.get("photos"), Some(RawValue::Files(v)) if v[0].is_none()));
    }

    #[test]
    fn test_scalars_and_nulls() {
        let request = json!({
            "c": {
                "name": "",
                "age": 42,
                "agree": true,
                "nickname": null,
                "toppings": { "ham": true, "olives": false, "cheese": null },
                "sizes": [1, "2"]
            }
        });

        let payload = SubmissionPayload::from_request(&request, "c").unwrap();
        assert_eq!(payload.get("name"), Some(&RawValue::Text(String::new())));
        assert_eq!(payload.get("age"), Some(&RawValue::Text("42".into())));
        assert_eq!(payload.get("agree"), Some(&RawValue::Text("true".into())));
        assert_eq!(payload.get("nickname"), None);
        assert!(matches!(
            payload.get("toppings"),
            Some(RawValue::Map(m)) if m["ham"] == "true" && m["olives"] == "false" && m["cheese"].is_empty()
        ));
        assert_eq!(
            payload.get("sizes"),
            Some(&RawValue::List(vec!["1".into(), "2".into()]))
        );
        assert_eq!(payload.malformed().count(), 0);
    }

    #[test]
    fn test_unreadable_values_keep_the_submission() {
        let request = json!({
            "c": {
                "name": "Ada",
                "nested": { "a": { "b": "c" } },
                "cv": { "filename": ["cv.pdf"], "temp_ref": "t1" },
                "mixed": ["a", { "x": 1 }]
            }
        });

        let payload = SubmissionPayload::from_request(&request, "c").unwrap();
        assert_eq!(payload.get("name"), Some(&RawValue::Text("Ada".into())));
        assert!(payload.is_malformed("nested"));
        assert!(payload.is_malformed("cv"));
        assert!(payload.is_malformed("mixed"));
        assert!(!payload.is_malformed("name"));
        assert_eq!(payload.get("nested"), None);

        let empty = SubmissionPayload::from_request(&json!({ "c": "oops" }), "c").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_files_mut_reaches_every_descriptor() {
        let request = json!({
            "c": {
                "cv": { "filename": "cv.pdf", "temp_ref": "a", "size": 1 },
                "photos": [null, { "filename": "b.png", "temp_ref": "b", "size": 1 }]
            }
        });
        let mut payload = SubmissionPayload::from_request(&request, "c").unwrap();
        for file in payload.files_mut() {
            file.size = 99;
        }
        assert!(matches!(payload.get("cv"), Some(RawValue::File(f)) if f.size == 99));
        assert!(matches!(payload.get("photos"), Some(RawValue::Files(v)) if v[1].as_ref().unwrap().size == 99));
    }

    #[test]
    fn test_missing_namespace() {
        let request = json!({ "other": { "name": "Ada" } });
        assert!(SubmissionPayload::from_request(&request, "contact").is_none());
    }
}
