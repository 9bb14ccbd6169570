//! Presentation matrix
//!
//! For every field type and channel, the representations a channel may
//! receive. The first entry is the default; the rest are legal overrides.
//! The table is static and read-only.

use formgate_core::{Channel, FieldSpec, FieldType, Representation};

use Representation::{Compiled as C, Presented as P, RawComponents as R};

/// Ordered representations of `field_type` on `channel`.
pub fn allowed(field_type: FieldType, channel: Channel) -> &'static [Representation] {
    use Channel::*;

    match field_type {
        FieldType::Text | FieldType::Email => match channel {
            Processing => &[C, P],
            _ => &[P, C],
        },
        FieldType::Password => match channel {
            File | Email => &[P, C],
            ConfirmationEmail | Screen => &[P],
            Processing => &[C, P],
        },
        FieldType::Textarea | FieldType::Date => match channel {
            File => &[C, P, R],
            Processing => &[C, R, P],
            _ => &[P, C],
        },
        FieldType::Select | FieldType::Checkbox => match channel {
            File => &[C, P, R],
            Processing => &[R, C, P],
            _ => &[P, C],
        },
        FieldType::Radio => match channel {
            File | Processing => &[C, P],
            _ => &[P, C],
        },
        FieldType::Upload => match channel {
            File => &[C, P],
            ConfirmationEmail => &[P],
            Processing => &[R, C, P],
            _ => &[P, C],
        },
        FieldType::Hidden => match channel {
            File | Email | Processing => &[R, P],
            ConfirmationEmail | Screen => &[P],
        },
        FieldType::Heading => &[],
    }
}

/// Representation a field delivers on a channel.
///
/// A legal `output` override wins; otherwise the first matrix entry the
/// field actually produces. `None` for headings.
pub fn resolve(spec: &FieldSpec, channel: Channel) -> Option<Representation> {
    let allowed = allowed(spec.field_type(), channel);

    let overridden = spec
        .output
        .iter()
        .find(|(key, _)| Channel::parse(key) == Some(channel))
        .and_then(|(_, name)| Representation::parse(name))
        .filter(|r| allowed.contains(r) && formgate_fields::produces(spec, *r));

    overridden.or_else(|| {
        allowed
            .iter()
            .copied()
            .find(|r| formgate_fields::produces(spec, *r))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(yaml: &str) -> FieldSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(allowed(FieldType::Select, Channel::Processing)[0], R);
        assert_eq!(allowed(FieldType::Password, Channel::Screen), &[P]);
        assert!(allowed(FieldType::Heading, Channel::File).is_empty());
    }

    #[test]
    fn test_every_value_type_reaches_every_channel() {
        let value_types = [
            FieldType::Text,
            FieldType::Password,
            FieldType::Email,
            FieldType::Textarea,
            FieldType::Select,
            FieldType::Radio,
            FieldType::Checkbox,
            FieldType::Date,
            FieldType::Upload,
            FieldType::Hidden,
        ];
        for field_type in value_types {
            for channel in Channel::ALL {
                assert!(!allowed(field_type, channel).is_empty(), "{} on {}", field_type, channel);
            }
        }
    }

    #[test]
    fn test_resolve_override() {
        let spec = field("name: t\ntype: checkbox\nvalues: [a]\noutput:\n  file: rawcomponents\n");
        assert_eq!(resolve(&spec, Channel::File), Some(R));
        assert_eq!(resolve(&spec, Channel::Email), Some(P));
    }

    #[test]
    fn test_resolve_skips_unproduced() {
        let normal = field("name: m\ntype: textarea\noutput:\n  file: rawcomponents\n");
        assert_eq!(resolve(&normal, Channel::File), Some(C));

        let hidden = field("name: h\ntype: hidden\n");
        assert_eq!(resolve(&hidden, Channel::File), Some(R));
        assert_eq!(resolve(&hidden, Channel::Screen), Some(P));

        let heading = field("type: heading\n");
        assert_eq!(resolve(&heading, Channel::Screen), None);
    }
}
