//! Query building: request options and URL construction.

mod builder;
mod options;

pub use builder::{
    append_params, parametrize, prepare_filters, prepare_includes, prepare_query, prepare_sort,
    PreparedQuery,
};
pub use options::{FilterValue, Filters, Param, RequestOptions};
