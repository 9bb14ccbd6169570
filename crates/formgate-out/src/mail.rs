//! Email composition
//!
//! Subjects and bodies are Handlebars templates rendered over the email
//! channel's data set. Without a body template every value becomes one
//! `Title: value` line.

use crate::dataset::DataSet;
use crate::renderer::MailRenderer;
use formgate_core::{
    ConfirmationChannel, EmailChannel, EmailMessage, FieldKind, FieldState, FormDefinition,
    FormError,
};
use formgate_fields::email;

pub struct EmailComposer {
    renderer: MailRenderer,
}

impl EmailComposer {
    pub fn new() -> Self {
        Self {
            renderer: MailRenderer::new(),
        }
    }

    /// Message for the form owner.
    pub fn notification(
        &self,
        form: &FormDefinition,
        channel: &EmailChannel,
        data: &DataSet,
        states: &[FieldState],
    ) -> Result<EmailMessage, FormError> {
        let to = match (&channel.to, &channel.to_field) {
            (Some(to), _) => to.clone(),
            (None, Some(field)) => resolve_recipient(form, states, field)?,
            (None, None) => return Err(FormError::Mail("email channel has no recipient".into())),
        };

        let reply_to = channel
            .reply_to_field
            .as_deref()
            .and_then(|field| compiled(states, field))
            .filter(|address| email::is_valid(address));

        Ok(EmailMessage {
            to,
            subject: self.subject(&channel.subject, data)?,
            body_lines: self.body(channel.body.as_deref(), data)?,
            reply_to,
            cc: channel.cc.clone(),
        })
    }

    /// Message for the submitter.
    pub fn confirmation(
        &self,
        form: &FormDefinition,
        channel: &ConfirmationChannel,
        data: &DataSet,
        states: &[FieldState],
    ) -> Result<EmailMessage, FormError> {
        let field = channel
            .to_field
            .as_deref()
            .ok_or_else(|| FormError::Mail("confirmation email has no to_field".into()))?;

        Ok(EmailMessage {
            to: resolve_recipient(form, states, field)?,
            subject: self.subject(&channel.subject, data)?,
            body_lines: self.body(channel.body.as_deref(), data)?,
            reply_to: None,
            cc: Vec::new(),
        })
    }

    fn subject(&self, template: &str, data: &DataSet) -> Result<String, FormError> {
        let rendered = self.renderer.render(template, &data.to_template_data())?;
        // Header values stay on one line
        Ok(rendered
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn body(&self, template: Option<&str>, data: &DataSet) -> Result<Vec<String>, FormError> {
        match template {
            Some(template) => {
                let rendered = self.renderer.render(template, &data.to_template_data())?;
                Ok(rendered.lines().map(String::from).collect())
            }
            None => Ok(data
                .entries
                .iter()
                .map(|e| format!("{}: {}", e.title, e.value.to_text()))
                .collect()),
        }
    }
}

impl Default for EmailComposer {
    fn default() -> Self {
        Self::new()
    }
}

fn compiled(states: &[FieldState], field: &str) -> Option<String> {
    states
        .iter()
        .find(|s| s.name == field)
        .and_then(|s| s.representations.compiled.clone())
        .filter(|v| !v.is_empty())
}

/// Address held by a field: its compiled value plus the field's suffix.
pub fn resolve_recipient(
    form: &FormDefinition,
    states: &[FieldState],
    field: &str,
) -> Result<String, FormError> {
    let value = compiled(states, field)
        .ok_or_else(|| FormError::Mail(format!("recipient field '{}' has no value", field)))?;

    let suffix = match form.field(field).map(|f| &f.kind) {
        Some(FieldKind::Select(o)) => o.email_suffix.as_deref(),
        Some(FieldKind::Radio(o)) => o.email_suffix.as_deref(),
        _ => None,
    };
    let address = format!("{}{}", value, suffix.unwrap_or(""));

    if email::is_valid(&address) {
        Ok(address)
    } else {
        Err(FormError::Mail(format!(
            "recipient field '{}' does not hold a valid address",
            field
        )))
    }
}
