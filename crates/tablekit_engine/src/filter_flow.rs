//! Applying and clearing filters against a view's query state.
//!
//! Page 1 is represented canonically by the absence of the `page`
//! parameter, so every way of arriving at "first page of this filter set"
//! produces the same cache key.

use tablekit_forms::FilterForm;
use tablekit_protocol::{QueryState, PARAM_PAGE};

/// Write the form's non-empty parameters into the query state, replacing
/// whatever the form previously contributed, and reset to page 1. Reserved
/// parameters (perPage, trashed, style) pass through untouched.
pub fn apply_filters(query: &mut QueryState, form: &FilterForm) {
    for key in form.known_keys() {
        query.remove(&key);
    }
    for (key, value) in form.params() {
        query.set(key, value);
    }
    query.remove(PARAM_PAGE);
}

/// Remove exactly the filter keys this form owns and reset to page 1,
/// leaving page size, trash toggle and display style as they were.
pub fn clear_filters(query: &mut QueryState, form: &FilterForm) {
    for key in form.known_keys() {
        query.remove(&key);
    }
    query.remove(PARAM_PAGE);
}
