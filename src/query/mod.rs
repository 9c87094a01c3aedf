//! # Query Module
//!
//! Request/response translation for the query endpoint.
//!
//! ```text
//! QueryRequest --build_spec--> QuerySpec --QueryExecutor--> Page | QueryFault
//!                                                              |
//!                                   QueryResponse <--normalize-+
//! ```
//!
//! The translator and normalizer are synchronous and side-effect free. All
//! awaiting happens in [`QueryService::execute`], after which the settled
//! outcome is mapped.

pub mod executor;
pub mod model;
pub mod normalizer;
pub mod service;
pub mod translator;

pub use executor::{MockQueryExecutor, Page, ProviderFault, QueryExecutor, QueryFault};
pub use model::{
    CosmosMetadata, ErrorCode, ErrorInfo, QueryData, QueryOptions, QueryRequest, QueryResponse,
    QuerySpec, SqlParameter,
};
pub use normalizer::{error_code_for_status, from_failure, from_success, normalize};
pub use service::{CallContext, QueryService};
pub use translator::{build_spec, normalize_param_name};
