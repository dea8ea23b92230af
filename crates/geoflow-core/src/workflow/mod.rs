//! Workflow document parsing and sequential execution.
//!
//! Parsing turns the planner's JSON into a [`document::Plan`] whose steps
//! carry an explicit [`document::OpKind`]; free text is interpreted exactly
//! once, at parse time. The [`interpreter::Interpreter`] then walks the plan
//! against a [`context::RunContext`], chaining step outputs to later inputs
//! through an artifact table.

pub mod context;
pub mod document;
pub mod interpreter;
