//! Output channel configuration checks
use formgate_core::{FieldKind, FileSink, FormDefinition, SetupErrorKind, SetupReport};
use formgate_fields::email;

pub fn check(form: &FormDefinition, file_sink: Option<&dyn FileSink>, report: &mut SetupReport) {
    check_file(form, file_sink, report);
    check_email(form, report);
    check_confirmation(form, report);
}

fn check_file(form: &FormDefinition, file_sink: Option<&dyn FileSink>, report: &mut SetupReport) {
    let Some(file) = &form.channels.file else {
        return;
    };

    if file.path.trim().is_empty() {
        report.add(
            SetupErrorKind::MissingRequiredArgument,
            "file channel needs a 'path'",
        );
    }
    match file_sink {
        None => report.add(
            SetupErrorKind::InvalidChannelConfig,
            "file channel is configured but no file sink is available",
        ),
        Some(sink) if !sink.is_writable() => report.add(
            SetupErrorKind::DirectoryNotWritable,
            format!("file channel target '{}' is not writable", file.path),
        ),
        Some(_) => {}
    }
    if file.unique_submitter && !file.submitter_column {
        report.add(
            SetupErrorKind::InvalidChannelConfig,
            "unique_submitter needs submitter_column to find earlier rows",
        );
    }
}

/// The named field must exist and be of email type.
fn check_email_field(form: &FormDefinition, option: &str, name: &str, report: &mut SetupReport) {
    match form.field(name).map(|f| &f.kind) {
        Some(FieldKind::Email(_)) => {}
        Some(_) => report.add(
            SetupErrorKind::InvalidChannelConfig,
            format!("{} '{}' is not an email field", option, name),
        ),
        None => report.add(
            SetupErrorKind::InvalidChannelConfig,
            format!("{} '{}' names no field", option, name),
        ),
    }
}

fn check_email(form: &FormDefinition, report: &mut SetupReport) {
    let Some(channel) = &form.channels.email else {
        return;
    };

    match (&channel.to, &channel.to_field) {
        (None, None) => report.add(
            SetupErrorKind::MissingRequiredArgument,
            "email channel needs 'to' or 'to_field'",
        ),
        (Some(_), Some(_)) => report.add(
            SetupErrorKind::InvalidChannelConfig,
            "email channel takes either 'to' or 'to_field', not both",
        ),
        (Some(to), None) if !email::is_valid(to) => report.add(
            SetupErrorKind::InvalidChannelConfig,
            format!("email recipient '{}' is not a valid address", to),
        ),
        (None, Some(name)) => match form.field(name) {
            None => report.add(
                SetupErrorKind::InvalidChannelConfig,
                format!("email to_field '{}' names no field", name),
            ),
            Some(spec) if !formgate_fields::email_target(spec).is_suitable() => report.add(
                SetupErrorKind::InvalidChannelConfig,
                format!("email to_field '{}' cannot hold an address", name),
            ),
            Some(_) => {}
        },
        _ => {}
    }

    if let Some(name) = &channel.reply_to_field {
        check_email_field(form, "reply_to_field", name, report);
    }
    for cc in channel.cc.iter().filter(|cc| !email::is_valid(cc)) {
        report.add(
            SetupErrorKind::InvalidChannelConfig,
            format!("cc address '{}' is not valid", cc),
        );
    }
}

fn check_confirmation(form: &FormDefinition, report: &mut SetupReport) {
    let Some(channel) = &form.channels.confirmation_email else {
        return;
    };

    match &channel.to_field {
        None => report.add(
            SetupErrorKind::MissingRequiredArgument,
            "confirmation_email needs a 'to_field'",
        ),
        Some(name) => check_email_field(form, "confirmation to_field", name, report),
    }
}
