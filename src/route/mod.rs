//! Route templates and the parameter declarations they are derived from.
//!
//! A handler declares its path parameters in order. Each optional parameter
//! splits off a shorter template, so `get(todo_id: Option<i64>)` answers on
//! both `` and `/<todo_id:int>` under its endpoint.

mod param;
mod template;

pub use param::{ParamSpec, ParamType, Params, PathParam, RawSegment};
pub use template::{RouteTemplate, Segment, derive_templates};
