//! Per-channel data sets
use formgate_core::{Channel, FieldType, HeaderStyle, ResolvedValue};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// One field's value as a channel receives it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataEntry {
    pub name: String,
    pub title: String,
    pub field_type: FieldType,
    pub value: ResolvedValue,
}

/// The values of one channel, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSet {
    pub channel: Channel,
    pub entries: Vec<DataEntry>,
}

impl DataSet {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: DataEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&DataEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Value of a field flattened to text.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(|e| e.value.to_text())
    }

    /// Header cells for a file row.
    pub fn header(&self, style: HeaderStyle) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| match style {
                HeaderStyle::Names => e.name.clone(),
                HeaderStyle::Titles => e.title.clone(),
            })
            .collect()
    }

    /// Every value flattened to text, in order.
    pub fn row(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.value.to_text()).collect()
    }

    /// Template data: every field by name, plus `_fields` as a title/value list.
    pub fn to_template_data(&self) -> Value {
        let mut data = Map::new();
        let mut fields = Vec::new();
        for entry in &self.entries {
            let text = entry.value.to_text();
            data.insert(entry.name.clone(), Value::String(text.clone()));
            fields.push(json!({ "name": entry.name, "title": entry.title, "value": text }));
        }
        data.insert("_fields".to_string(), Value::Array(fields));
        Value::Object(data)
    }
}
