#![allow(missing_docs)]

pub(crate) mod http;
pub(crate) mod store;

pub(crate) use http::parse_json_body;
pub(crate) use store::{FailingStore, Fault};
