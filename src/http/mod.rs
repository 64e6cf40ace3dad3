//! HTTP clients, request execution, the URL supplier, and the worker loop.
mod client;
mod execution;
mod request;
mod supplier;
mod tls;
mod worker;


pub use client::build_client;
pub use supplier::{UrlFileSource, UrlQueue, setup_url_supplier};
pub use tls::TlsMaterial;

pub(crate) use request::RequestTemplate;
pub(crate) use worker::{UrlSource, Worker};
