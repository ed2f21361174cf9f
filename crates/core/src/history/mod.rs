#![forbid(unsafe_code)]

mod object_class;
mod payload;
mod registry;
mod trans_type;

pub use object_class::*;
pub use payload::*;
pub use registry::*;
pub use trans_type::*;
