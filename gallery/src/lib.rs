//! S3 image gallery: lists a bucket, presigns GET URLs and renders them

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

pub mod gallery;
pub mod image_source;
pub mod key_enumerator;
pub mod media_storage;
pub mod render;
pub mod routes;
pub mod server;
pub mod types;
pub mod url_signer;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
