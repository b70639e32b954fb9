/// Trimmed value, or `None` when absent or blank.
pub(super) fn required_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

const MAX_PAGINATION_LIMIT: i64 = 100;

pub(super) fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGINATION_LIMIT), offset.max(0))
}
