//! Per-request context passed explicitly into model calls.

/// Who is acting. The framework treats the user id as opaque and only uses it to stamp
/// `created_by` / `updated_by`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: Option<i64>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        RequestContext { user_id: None }
    }

    pub fn for_user(user_id: i64) -> Self {
        RequestContext {
            user_id: Some(user_id),
        }
    }
}
