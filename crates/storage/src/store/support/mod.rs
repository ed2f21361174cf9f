#![forbid(unsafe_code)]

mod schema;
mod time;

pub(super) use schema::install_schema;
pub(crate) use time::now_ns;
