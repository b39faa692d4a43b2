//! State and county identifiers against the canonical reference tables.

use pqa_model::IssueRecord;
use pqa_model::reference::{STATE_IDENTITY_COLUMNS, state_field_matches};

use super::{Checked, SkipReason, present_columns, require_columns};
use crate::collector::IssueCollector;
use crate::context::CheckContext;

/// Per-field mismatch check names, keyed by dataset column.
const FIELD_MISMATCHES: [(&str, &str); 4] = [
    ("state_fips", "state_fips_mismatch"),
    ("state", "state_name_mismatch"),
    ("state_ic", "state_ic_mismatch"),
    ("state_cen", "state_cen_mismatch"),
];

/// Validates each row's state identity tuple.
pub fn state_codes(ctx: &CheckContext<'_>) -> Checked<Vec<IssueRecord>> {
    let dataset = ctx.dataset;
    let table = match ctx.references.state_codes.as_present() {
        Some(table) => table,
        None => {
            let reason = ctx
                .references
                .state_codes
                .absent_reason()
                .unwrap_or("state code table absent");
            return Err(SkipReason::new(reason));
        }
    };
    let identity = present_columns(dataset, &STATE_IDENTITY_COLUMNS);
    if identity.is_empty() {
        return Err(SkipReason::new("no state identity columns present"));
    }

    let limit = ctx.config.sample_limit;
    let mut identity_mismatch = IssueCollector::plain("state_identity_mismatch", limit);
    let mut field_mismatch: Vec<(&str, IssueCollector)> = FIELD_MISMATCHES
        .iter()
        .filter(|(column, _)| dataset.has_column(column))
        .map(|&(column, name)| (column, IssueCollector::plain(name, limit)))
        .collect();
    let mut unknown_po = IssueCollector::plain("unknown_state_po", limit);
    let mut not_padded = IssueCollector::plain("state_fips_not_padded", limit);
    let mut detected_mismatch = IssueCollector::plain("detected_state_mismatch", limit);

    for row in 0..dataset.height() {
        let fields: Vec<(&str, &str)> = identity
            .iter()
            .map(|&column| (column, dataset.value_or_empty(column, row)))
            .collect();
        if table.count_matches(&fields) != 1 {
            let tuple: Vec<&str> = fields.iter().map(|(_, value)| value.trim()).collect();
            identity_mismatch.record_row(row, &tuple.join("|"));
        }

        if let Some(po) = dataset.value("state_po", row).map(str::trim)
            && !po.is_empty()
        {
            match table.by_po(po) {
                Some(entry) => {
                    for (column, collector) in &mut field_mismatch {
                        let value = dataset.value_or_empty(column, row);
                        let expected = entry.field(column).unwrap_or_default();
                        if !state_field_matches(column, value, expected) {
                            collector.record_row(row, value);
                        }
                    }
                }
                None => unknown_po.record_row(row, po),
            }
            if let Some(detected) = ctx.detected_state
                && !po.eq_ignore_ascii_case(&detected.state_po)
            {
                detected_mismatch.record_row(row, po);
            }
        }

        if let Some(fips) = dataset.value("state_fips", row)
            && fips.trim().len() == 1
        {
            not_padded.record_row(row, fips);
        }
    }

    let mut records = Vec::new();
    records.extend(identity_mismatch.finish());
    records.extend(field_mismatch.into_iter().filter_map(|(_, c)| c.finish()));
    records.extend(unknown_po.finish());
    records.extend(not_padded.finish());
    records.extend(detected_mismatch.finish());
    Ok(records)
}

/// Left-pads a one-digit state code.
fn pad_state_fips(value: &str) -> String {
    let value = value.trim();
    if value.len() == 1 && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("0{value}")
    } else {
        value.to_string()
    }
}

/// Validates county FIPS codes against the county table and the row's state.
pub fn fips(ctx: &CheckContext<'_>) -> Checked<Vec<IssueRecord>> {
    let dataset = ctx.dataset;
    let table = match ctx.references.county_fips.as_present() {
        Some(table) => table,
        None => {
            let reason = ctx
                .references
                .county_fips
                .absent_reason()
                .unwrap_or("county FIPS table absent");
            return Err(SkipReason::new(reason));
        }
    };
    require_columns(dataset, &["county_fips"])?;

    let detected_fips = ctx.detected_state.and_then(|d| d.state_fips.as_deref());
    let limit = ctx.config.sample_limit;
    let mut invalid = IssueCollector::plain("invalid_county_fips", limit);
    let mut state_mismatch = IssueCollector::plain("county_state_mismatch", limit);
    let mut name_mismatch = IssueCollector::plain("county_name_mismatch", limit);

    for row in 0..dataset.height() {
        let raw = dataset.value_or_empty("county_fips", row);
        let county = raw.trim();
        if ctx.config.is_missing(county) {
            continue;
        }

        match table.get(county) {
            None => invalid.record_row(row, raw),
            Some(entry) => {
                if let Some(name) = dataset.value("county_name", row)
                    && !name.trim().eq_ignore_ascii_case(entry.county_name.trim())
                {
                    name_mismatch.record_row(row, name);
                }
            }
        }

        let expected = match dataset.value("state_fips", row) {
            Some(state_fips) => Some(pad_state_fips(state_fips)),
            None => detected_fips.map(str::to_string),
        };
        if let Some(expected) = expected
            && county.get(..2) != Some(expected.as_str())
        {
            state_mismatch.record_row(row, raw);
        }
    }

    let mut records = Vec::new();
    records.extend(invalid.finish());
    records.extend(state_mismatch.finish());
    records.extend(name_mismatch.finish());
    Ok(records)
}
