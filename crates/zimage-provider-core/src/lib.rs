//! Core provider abstractions for zimage.
//!
//! This crate does **not** depend on axum or any concrete HTTP client. Adapters
//! build `UpstreamHttpRequest` values and hand them to an [`UpstreamClient`];
//! a higher layer supplies the real IO.

pub mod errors;
pub mod headers;
pub mod provider;
pub mod request;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod upstream;

pub use errors::{ApiError, ApiErrorCode, ApiResult, upstream_error_text};
pub use headers::{
    AUTHORIZATION, CONTENT_TYPE, Headers, content_type_or, header_get, header_set, header_token,
    set_bearer,
};
pub use provider::{
    AuthPolicy, ImageModelSpec, ImageProviderDescriptor, ImageProviderId, LlmProviderDescriptor,
    LlmProviderId, ProviderPrefix,
};
pub use request::{GenerationRequest, GenerationResult};
pub use upstream::{
    HttpMethod, UpstreamClient, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
    UpstreamTransportErrorKind,
};
