//! Page-to-page carry-over for the three-step form.

use house_price::{require_fields, FormFields, Page, PriceError};

use crate::types::{ServerError, ServerResult};

/// Combine a submission with the server's copy of earlier pages.
///
/// Fields of pages before `page` come from `stored` when the session has
/// them; everything else comes from the submission.
pub fn merge_submission(
    page: Page,
    submitted: &FormFields,
    stored: Option<&FormFields>,
) -> FormFields {
    let mut merged = submitted.clone();
    if let Some(stored) = stored {
        for field in page.carried() {
            if let Some(value) = stored.get(field.key) {
                merged.insert(field.key.to_string(), value.clone());
            }
        }
    }
    merged
}

/// Validate the submission of `page` and return the fields the next page
/// must carry forward.
pub fn advance(page: Page, merged: &FormFields) -> ServerResult<FormFields> {
    require_fields(merged, page.required_on_submit()).map_err(|e| match e {
        PriceError::MissingField(key) => ServerError::MissingField(key),
        other => ServerError::PredictionFailed(other.to_string()),
    })?;

    Ok(page
        .required_on_submit()
        .filter_map(|f| merged.get(f.key).map(|v| (f.key.to_string(), v.clone())))
        .collect())
}
