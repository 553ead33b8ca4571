pub mod config;
pub mod error;
pub mod flatten;
pub mod jsonapi;
pub mod network;
pub mod query;
pub mod record;
pub mod response;
pub mod store;
pub mod utils;

pub use config::{Config, Headers, JSONAPI_CONTENT_TYPE};
pub use error::{Error, NetworkError, Result, StoreError};
pub use flatten::{flatten_record, FlattenedRecord, Internal};
pub use jsonapi::{Document, Id, Identifier, Link, Links, Relationship, ResourceObject};
#[cfg(feature = "http")]
pub use network::ReqwestFetch;
pub use network::{
    BaseFetch, FetchReference, HttpResponse, Method, RawResponse, RequestInit, StandardFetch,
};
pub use query::{FilterValue, Filters, Param, PreparedQuery, RequestOptions};
pub use record::{LinkCache, PendingCreate, Record, Ref};
pub use response::{Response, ResponseData};
pub use store::{
    ChangeKind, Collection, InMemoryCollection, ModelType, Store, StoreChange, WeakStore,
};
pub use utils::OneOrMany;
