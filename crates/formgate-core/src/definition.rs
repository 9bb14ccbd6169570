//! Form definitions loaded from YAML
//!
//! A definition bundles form-wide settings, the output channel
//! configuration and the ordered field list:
//!
//! ```yaml
//! identifier: contact
//! settings:
//!   year_cutoff: 69
//! channels:
//!   file: { path: submissions.csv, unique_submitter: true, submitter_column: true }
//!   email: { to: office@example.com, subject: "New message from {{name}}" }
//! fields:
//!   - { name: name, type: text, required: true }
//! ```

use crate::error::FormError;
use crate::spec::{FieldKind, FieldSpec};
use crate::HEADING_PREFIX;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct FormDefinition {
    /// Namespace of this form inside the request data
    pub identifier: String,
    #[serde(default)]
    pub settings: FormSettings,
    #[serde(default)]
    pub channels: ChannelSettings,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl FormDefinition {
    /// Load a definition from a YAML file.
    pub fn load(path: &str) -> Result<Self, FormError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FormError::Io(format!("failed to read form definition {}: {}", path, e)))?;
        Self::from_yaml(&content)
    }

    /// Parse a definition from YAML content.
    pub fn from_yaml(yaml: &str) -> Result<Self, FormError> {
        let mut definition: FormDefinition = serde_yaml::from_str(yaml)
            .map_err(|e| FormError::Config(format!("failed to parse form definition: {}", e)))?;
        definition.name_headings();
        tracing::debug!(
            form = %definition.identifier,
            fields = definition.fields.len(),
            "loaded form definition"
        );
        Ok(definition)
    }

    /// Field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that carry a value (everything except headings).
    pub fn value_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(|f| !matches!(f.kind, FieldKind::Heading(_)))
    }

    // Headings without a name get a counter in the reserved namespace.
    fn name_headings(&mut self) {
        let mut counter = 0;
        for field in &mut self.fields {
            if let FieldKind::Heading(_) = field.kind {
                counter += 1;
                if field.name.is_empty() {
                    field.name = format!("{}{}", HEADING_PREFIX, counter);
                }
            }
        }
    }
}

/// Form-wide behaviour switches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Trim surrounding whitespace from scalar values
    pub trim_values: bool,
    /// A value that is only whitespace becomes empty
    pub whitespace_is_empty: bool,
    /// Default cutoff for two-digit year expansion
    pub year_cutoff: u32,
    /// Compare the echoed `_fg_identity` field with the current submitter
    pub identity_check: bool,
    /// Templated display mode
    pub template: Option<TemplateSettings>,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            trim_values: true,
            whitespace_is_empty: true,
            year_cutoff: 69,
            identity_check: false,
            template: None,
        }
    }
}

/// Template text plus the three placeholder patterns (`%s` = field name).
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSettings {
    pub text: String,
    #[serde(default = "default_widget_pattern")]
    pub widget_pattern: String,
    #[serde(default = "default_label_pattern")]
    pub label_pattern: String,
    #[serde(default = "default_special_pattern")]
    pub special_pattern: String,
}

fn default_widget_pattern() -> String {
    "{{%s}}".to_string()
}

fn default_label_pattern() -> String {
    "{{%s.label}}".to_string()
}

fn default_special_pattern() -> String {
    "{{#%s}}".to_string()
}

/// Which output channels are active and how they are addressed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub file: Option<FileChannel>,
    pub email: Option<EmailChannel>,
    pub confirmation_email: Option<ConfirmationChannel>,
    pub screen: bool,
    pub processing: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            file: None,
            email: None,
            confirmation_email: None,
            screen: true,
            processing: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderStyle {
    #[default]
    Names,
    Titles,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileChannel {
    pub path: String,
    #[serde(default)]
    pub header: HeaderStyle,
    /// Prefix every row with the submitter identifier
    #[serde(default)]
    pub submitter_column: bool,
    /// Prefix every row with the submission time (RFC 3339)
    #[serde(default)]
    pub timestamp_column: bool,
    /// Refuse a second row from the same submitter
    #[serde(default)]
    pub unique_submitter: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailChannel {
    /// Fixed recipient
    #[serde(default)]
    pub to: Option<String>,
    /// Field whose value (plus its `email_suffix`) is the recipient
    #[serde(default)]
    pub to_field: Option<String>,
    /// Handlebars template over the email-channel values
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Handlebars template for the body; one `Title: value` line per field when absent
    #[serde(default)]
    pub body: Option<String>,
    /// Email field used as reply-to address
    #[serde(default)]
    pub reply_to_field: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
}

fn default_subject() -> String {
    "Form submission".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationChannel {
    /// Email field holding the submitter's address
    #[serde(default)]
    pub to_field: Option<String>,
    #[serde(default = "default_confirmation_subject")]
    pub subject: String,
    #[serde(default)]
    pub body: Option<String>,
}

fn default_confirmation_subject() -> String {
    "Thank you for your submission".to_string()
}
