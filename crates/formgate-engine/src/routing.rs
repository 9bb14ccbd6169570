//! Channel routing
//!
//! Resolves, through the presentation matrix, which representation of each
//! field a channel receives, and shapes the file channel's record.

use chrono::SecondsFormat;
use formgate_core::{
    Channel, FieldState, FileChannel, FormDefinition, ResolvedValue, SubmissionContext,
};
use formgate_out::{DataEntry, DataSet};
use formgate_policy::matrix;

pub const SUBMITTER_COLUMN: &str = "submitter";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Values of `channel`, in declaration order. `states` parallels `form.fields`.
pub fn data_set(form: &FormDefinition, states: &[FieldState], channel: Channel) -> DataSet {
    let mut data = DataSet::new(channel);

    for (spec, state) in form.fields.iter().zip(states) {
        let Some(representation) = matrix::resolve(spec, channel) else {
            continue;
        };
        let value = state
            .representations
            .get(representation)
            .unwrap_or_else(|| ResolvedValue::Text(String::new()));

        data.push(DataEntry {
            name: spec.name.clone(),
            title: spec.display_title().to_string(),
            field_type: spec.field_type(),
            value,
        });
    }

    data
}

/// Header and row of the file channel, with the optional leading columns.
pub fn file_record(
    channel: &FileChannel,
    data: &DataSet,
    ctx: &SubmissionContext,
) -> (Vec<String>, Vec<String>) {
    let mut header = Vec::new();
    let mut row = Vec::new();

    if channel.submitter_column {
        header.push(SUBMITTER_COLUMN.to_string());
        row.push(ctx.submitter.clone().unwrap_or_default());
    }
    if channel.timestamp_column {
        header.push(TIMESTAMP_COLUMN.to_string());
        row.push(ctx.received_at.to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    header.extend(data.header(channel.header));
    row.extend(data.row());
    (header, row)
}
