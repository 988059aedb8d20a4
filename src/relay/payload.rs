use crate::models::{ApplicantFields, TrackingParams};

/// Flatten applicant fields and tracking parameters into the outbound form body.
///
/// Fields come first in form order, tracking entries after. A tracking key that
/// names an applicant field is dropped: the receiving form reads the first value
/// it sees, so the field must be the only one with that name.
pub fn build(fields: &ApplicantFields, tracking: &TrackingParams) -> Vec<(String, String)> {
    let pairs = fields.pairs();
    let mut payload: Vec<(String, String)> = pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    for (key, value) in tracking.iter() {
        if pairs.iter().any(|(name, _)| *name == key) {
            tracing::debug!("Dropping tracking parameter '{key}': collides with a form field");
            continue;
        }
        payload.push((key.to_string(), value.to_string()));
    }

    payload
}
