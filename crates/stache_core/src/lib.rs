mod adapter;
mod error;
mod options;
mod program;
mod structs;
mod tags;

pub use adapter::*;
pub use error::*;
pub use options::*;
pub use program::*;
pub use structs::*;
pub use tags::{is_component_tag, is_pre_text_tag, is_raw_text_tag, is_rcdata_tag, is_void_tag};
