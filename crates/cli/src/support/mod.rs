#![forbid(unsafe_code)]

mod output;
mod time;

pub(crate) use output::*;
pub(crate) use time::*;
