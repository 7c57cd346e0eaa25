//! Copernicus Data Space catalog client.
//!
//! Builds OData queries for Sentinel-2 L1C products over a search polygon,
//! downloads the matching archive with retry/backoff, and unpacks it into
//! the correction tool's input directory. The catalog service itself is an
//! external collaborator; this crate only sequences requests against it.

pub mod client;
pub mod credentials;
pub mod error;
pub mod query;
pub mod unpack;

pub use client::{CatalogClient, ClientConfig, Product};
pub use credentials::Credentials;
pub use error::{CatalogError, CatalogResult};
pub use query::ProductQuery;
pub use unpack::unpack_product;
