//! HTTP client for the Tienda Nube (Nuvemshop) REST API.
//!
//! Every request is scoped to one store: `{base_url}/{store_id}{path}`, with the
//! access token sent as `Authentication: bearer <token>` and a mandatory
//! `User-Agent`. Rate limits (429) and server errors are retried with
//! exponential backoff; everything else is surfaced as [`ApiError`].
//!
//! Tool handlers talk to the [`StoreApi`] trait so tests can substitute a
//! recording fake for [`StoreClient`].

mod client;
mod error;
mod pagination;
mod request;

pub use client::{Credentials, StoreApi, StoreClient, StoreClientBuilder};
pub use error::ApiError;
pub use pagination::{Page, Pagination, DEFAULT_PER_PAGE, MAX_PER_PAGE};
pub use request::{ApiRequest, ApiResponse, ResponseMeta};
pub use reqwest::Method;
