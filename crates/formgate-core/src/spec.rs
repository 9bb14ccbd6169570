//! Field specifications: the immutable per-field configuration
//!
//! A `FieldSpec` is deserialized from the `fields:` list of a form
//! definition. Type-specific options live in the `FieldKind` variant; every
//! argument a type needs but may be omitted by the author is an `Option`
//! here and is checked by the setup validator, never by serde.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Complete configuration of one form field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    /// Unique key of the field inside its form
    #[serde(default)]
    pub name: String,
    /// Human-readable title (falls back to the name)
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Boolean, or a minimum count for select/checkbox/upload
    #[serde(default)]
    pub required: Required,
    /// Per-channel representation overrides, validated at setup time
    #[serde(default)]
    pub output: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    /// Title shown to people; the name when no title was configured.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    /// Hidden fields are always required; everything else follows `required`.
    pub fn is_required(&self) -> bool {
        match self.kind {
            FieldKind::Hidden(_) => true,
            FieldKind::Heading(_) => false,
            _ => self.required.is_required(),
        }
    }
}

/// `required:` accepts `true`/`false` or a minimum count.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Required {
    #[default]
    No,
    Yes,
    AtLeast(u32),
    /// A count that is negative or not a whole number; rejected at setup.
    Invalid(String),
}

impl Required {
    /// Minimum number of values/selections/files demanded.
    pub fn minimum(&self) -> u32 {
        match self {
            Required::No => 0,
            Required::Yes | Required::Invalid(_) => 1,
            Required::AtLeast(n) => *n,
        }
    }

    pub fn is_required(&self) -> bool {
        self.minimum() > 0
    }

    fn from_count(count: u64) -> Self {
        match u32::try_from(count) {
            Ok(0) => Required::No,
            Ok(n) => Required::AtLeast(n),
            Err(_) => Required::Invalid(count.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Required {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RequiredVisitor;

        impl<'de> Visitor<'de> for RequiredVisitor {
            type Value = Required;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean or a minimum count")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Required, E> {
                Ok(if v { Required::Yes } else { Required::No })
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Required, E> {
                Ok(Required::from_count(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Required, E> {
                match u64::try_from(v) {
                    Ok(n) => Ok(Required::from_count(n)),
                    Err(_) => Ok(Required::Invalid(v.to_string())),
                }
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Required, E> {
                if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
                    Ok(Required::from_count(v as u64))
                } else {
                    Ok(Required::Invalid(v.to_string()))
                }
            }
        }

        deserializer.deserialize_any(RequiredVisitor)
    }
}

/// Type-tag of a field, without its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Password,
    Email,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
    Upload,
    Hidden,
    Heading,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Password => "password",
            FieldType::Email => "email",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
            FieldType::Upload => "upload",
            FieldType::Hidden => "hidden",
            FieldType::Heading => "heading",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of field types with their specific options.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text(TextOptions),
    Password(TextOptions),
    Email(EmailOptions),
    Textarea(TextareaOptions),
    Select(SelectOptions),
    Radio(RadioOptions),
    #[serde(alias = "checkboxes")]
    Checkbox(CheckboxOptions),
    #[serde(alias = "datetime")]
    Date(DateOptions),
    #[serde(alias = "file")]
    Upload(UploadOptions),
    Hidden(HiddenOptions),
    Heading(HeadingOptions),
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::Text(_) => FieldType::Text,
            FieldKind::Password(_) => FieldType::Password,
            FieldKind::Email(_) => FieldType::Email,
            FieldKind::Textarea(_) => FieldType::Textarea,
            FieldKind::Select(_) => FieldType::Select,
            FieldKind::Radio(_) => FieldType::Radio,
            FieldKind::Checkbox(_) => FieldType::Checkbox,
            FieldKind::Date(_) => FieldType::Date,
            FieldKind::Upload(_) => FieldType::Upload,
            FieldKind::Hidden(_) => FieldType::Hidden,
            FieldKind::Heading(_) => FieldType::Heading,
        }
    }
}

/// Options shared by text and password fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextOptions {
    pub default: Option<String>,
    pub maxlength: Option<usize>,
    /// Pattern the (non-empty) value must match
    pub regexp: Option<String>,
    /// Message used instead of the generic one when `regexp` fails
    pub regexp_message: Option<String>,
    /// Coerce the value to digits, signs, dots and whitespace
    pub numeric: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmailOptions {
    pub default: Option<String>,
    pub maxlength: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextareaMode {
    #[default]
    Normal,
    Lines,
    Coordinates,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextareaOptions {
    pub default: Option<String>,
    pub maxlength: Option<usize>,
    pub mode: TextareaMode,
    /// Coordinates mode: pattern every non-blank line must match
    pub line_regexp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SelectOptions {
    pub values: Option<RawPool>,
    pub force_associative: bool,
    pub multiple: bool,
    /// Placeholder entry ("please choose") submitted as this text
    pub null_option: Option<String>,
    pub default: Vec<String>,
    /// Appended to the selected value when used as an email recipient
    pub email_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RadioOptions {
    pub values: Option<RawPool>,
    pub force_associative: bool,
    pub null_option: Option<String>,
    pub default: Option<String>,
    pub email_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckboxOptions {
    pub values: Option<RawPool>,
    pub force_associative: bool,
    pub default: Vec<String>,
    /// Upper bound on checked boxes
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateLevel {
    #[default]
    Date,
    #[serde(alias = "time")]
    DateTime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DateOptions {
    pub level: DateLevel,
    /// Two-digit years up to this value become 20yy, above it 19yy
    pub year_cutoff: Option<u32>,
    pub expand_years: bool,
    /// `YYYY-MM-DD[ HH:MM[:SS]]` or `today`
    pub default: Option<String>,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            level: DateLevel::Date,
            year_cutoff: None,
            expand_years: true,
            default: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadOptions {
    /// Target directory for stored files
    pub directory: Option<String>,
    /// Number of file slots offered (whole number, at least 1)
    pub subfields: Option<f64>,
    pub allowed_extensions: Vec<String>,
    pub disallowed_extensions: Vec<String>,
    pub require_extension: bool,
    /// Per-file size limit in bytes
    pub max_size: Option<u64>,
    /// Keep a differing existing file by renaming it before storing
    pub version_control: bool,
}

impl UploadOptions {
    pub fn slot_count(&self) -> usize {
        match self.subfields {
            Some(n) if n >= 1.0 => n as usize,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HiddenOptions {
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeadingOptions {
    pub level: u8,
}

impl Default for HeadingOptions {
    fn default() -> Self {
        Self { level: 2 }
    }
}

// ============================================================================
// Value pools
// ============================================================================

/// A `values:` entry exactly as written: a list or an ordered mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPool {
    List(Vec<String>),
    Map(Vec<(String, String)>),
}

impl RawPool {
    /// Decide value/label pairs.
    ///
    /// Lists are positional (value == label). Mappings are associative,
    /// except a mapping keyed exactly `0..n` in order, which is structurally
    /// indistinguishable from a list and is read as one unless
    /// `force_associative` is set. Forcing a plain list makes the indices
    /// the submitted values.
    pub fn resolve(&self, force_associative: bool) -> ValuePool {
        match self {
            RawPool::List(items) if force_associative => ValuePool {
                entries: items
                    .iter()
                    .enumerate()
                    .map(|(i, label)| PoolEntry::new(i.to_string(), label.clone()))
                    .collect(),
                associative: true,
            },
            RawPool::List(items) => ValuePool {
                entries: items
                    .iter()
                    .map(|item| PoolEntry::new(item.clone(), item.clone()))
                    .collect(),
                associative: false,
            },
            RawPool::Map(pairs) => {
                let sequential = pairs
                    .iter()
                    .enumerate()
                    .all(|(i, (key, _))| *key == i.to_string());

                if sequential && !force_associative {
                    ValuePool {
                        entries: pairs
                            .iter()
                            .map(|(_, label)| PoolEntry::new(label.clone(), label.clone()))
                            .collect(),
                        associative: false,
                    }
                } else {
                    ValuePool {
                        entries: pairs
                            .iter()
                            .map(|(value, label)| PoolEntry::new(value.clone(), label.clone()))
                            .collect(),
                        associative: true,
                    }
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for RawPool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PoolVisitor;

        impl<'de> Visitor<'de> for PoolVisitor {
            type Value = RawPool;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of values or a mapping of value to label")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawPool, A::Error> {
                let mut items = Vec::new();
                while let Some(Scalar(item)) = seq.next_element()? {
                    items.push(item);
                }
                Ok(RawPool::List(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawPool, A::Error> {
                let mut pairs = Vec::new();
                while let Some((Scalar(key), Scalar(label))) = map.next_entry()? {
                    pairs.push((key, label));
                }
                Ok(RawPool::Map(pairs))
            }
        }

        deserializer.deserialize_any(PoolVisitor)
    }
}

/// Any YAML scalar read as text (`1` and `"1"` are the same value).
struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Scalar, E> {
                Ok(Scalar(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Scalar, E> {
                Ok(Scalar(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolEntry {
    /// Submitted value
    pub value: String,
    /// Displayed label
    pub label: String,
}

impl PoolEntry {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Resolved choices of a select, radio or checkbox field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValuePool {
    pub entries: Vec<PoolEntry>,
    pub associative: bool,
}

impl ValuePool {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.iter().any(|e| e.value == value)
    }

    /// Label for a value; the value itself when it is not in the pool.
    pub fn label_of<'a>(&'a self, value: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(|e| e.label.as_str())
            .unwrap_or(value)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(yaml: &str) -> FieldSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_field_kind_from_type_tag() {
        let spec = field("name: age\ntype: text\nmaxlength: 3\nnumeric: true\n");
        assert_eq!(spec.field_type(), FieldType::Text);
        match spec.kind {
            FieldKind::Text(opts) => {
                assert_eq!(opts.maxlength, Some(3));
                assert!(opts.numeric);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_checkboxes_alias() {
        let spec = field("name: toppings\ntype: checkboxes\nvalues: [ham, cheese]\n");
        assert_eq!(spec.field_type(), FieldType::Checkbox);
    }

    #[test]
    fn test_required_forms() {
        assert_eq!(field("name: a\ntype: text\nrequired: true\n").required, Required::Yes);
        assert_eq!(
            field("name: a\ntype: checkbox\nrequired: 2\n").required,
            Required::AtLeast(2)
        );
        assert_eq!(field("name: a\ntype: text\nrequired: 0\n").required, Required::No);
        assert!(matches!(
            field("name: a\ntype: upload\nrequired: 1.5\n").required,
            Required::Invalid(_)
        ));
    }

    #[test]
    fn test_positional_pool() {
        let spec = field("name: c\ntype: select\nvalues: [red, green]\n");
        let FieldKind::Select(opts) = spec.kind else { panic!("not a select") };
        let pool = opts.values.unwrap().resolve(false);
        assert!(!pool.associative);
        assert_eq!(pool.entries[1], PoolEntry::new("green", "green"));
    }

    #[test]
    fn test_associative_pool_keeps_order() {
        let spec = field("name: c\ntype: select\nvalues:\n  b: Beta\n  a: Alpha\n");
        let FieldKind::Select(opts) = spec.kind else { panic!("not a select") };
        let pool = opts.values.unwrap().resolve(false);
        assert!(pool.associative);
        assert_eq!(pool.values().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(pool.label_of("a"), "Alpha");
    }

    #[test]
    fn test_sequential_keys_need_forcing() {
        let raw = RawPool::Map(vec![
            ("0".to_string(), "Zero".to_string()),
            ("1".to_string(), "One".to_string()),
        ]);
        assert!(!raw.resolve(false).associative);
        assert!(raw.resolve(false).contains("Zero"));

        let forced = raw.resolve(true);
        assert!(forced.associative);
        assert!(forced.contains("1"));
        assert_eq!(forced.label_of("1"), "One");
    }

    #[test]
    fn test_hidden_is_always_required() {
        let spec = field("name: ref\ntype: hidden\nvalues: {source: web}\n");
        assert!(spec.is_required());
    }
}
