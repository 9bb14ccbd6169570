//! Template rendering for outgoing mail.
//!
//! Uses Handlebars without HTML escaping (messages are plain text) and
//! these custom helpers:
//! - join: Join array with separator
//! - default: Fallback for empty or missing values
//! - truncate: Truncate string to max length (in characters)
//! - upper: Uppercase a value

use formgate_core::FormError;
use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use serde_json::Value;

/// Renderer with registered helpers
pub struct MailRenderer {
    handlebars: Handlebars<'static>,
}

impl MailRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("join", Box::new(JoinHelper));
        handlebars.register_helper("default", Box::new(DefaultHelper));
        handlebars.register_helper("truncate", Box::new(TruncateHelper));
        handlebars.register_helper("upper", Box::new(UpperHelper));

        MailRenderer { handlebars }
    }

    /// Render a template string with data
    pub fn render(&self, template: &str, data: &Value) -> Result<String, FormError> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| FormError::Template(format!("render error: {}", e)))
    }
}

impl Default for MailRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Custom Helpers
// ============================================================================

/// Join an array with a separator
struct JoinHelper;

impl HelperDef for JoinHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let array = h.param(0).and_then(|v| v.value().as_array());

        let separator = h.param(1).and_then(|v| v.value().as_str()).unwrap_or(", ");

        if let Some(arr) = array {
            let strings: Vec<String> = arr
                .iter()
                .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                .collect();
            out.write(&strings.join(separator))?;
        }

        Ok(())
    }
}

/// Default value helper: empty strings count as missing
struct DefaultHelper;

impl HelperDef for DefaultHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = h.param(0).map(|v| v.value());
        let default = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");

        match value {
            Some(Value::String(s)) if !s.is_empty() => out.write(s)?,
            Some(v) if !v.is_null() && !v.is_string() => out.write(&v.to_string())?,
            _ => out.write(default)?,
        }

        Ok(())
    }
}

/// Truncate a string to max length with ellipsis
struct TruncateHelper;

impl HelperDef for TruncateHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let text = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");

        let max_len = h.param(1).and_then(|v| v.value().as_u64()).unwrap_or(100) as usize;

        if text.chars().count() > max_len {
            let truncated: String = text.chars().take(max_len).collect();
            out.write(&truncated)?;
            out.write("...")?;
        } else {
            out.write(text)?;
        }
        Ok(())
    }
}

/// Uppercase helper
struct UpperHelper;

impl HelperDef for UpperHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let text = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
        out.write(&text.to_uppercase())?;
        Ok(())
    }
}
