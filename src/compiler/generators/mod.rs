//! Code Generators Module
//!
//! Helper functions the code generator delegates to, split by concern.
//!
//! ## Architecture
//! Each function takes `&mut CodeGen` to reach scopes and registries:
//! - `expression`: expression evaluation (operators, calls, `calc()`, the
//!   `meta` and `string` builtins that need compiler state)
//! - `statement`: declarations, variable assignment, messages and control flow
//!   (`@if`, `@each`, `@for`, `@while`, function bodies)

pub mod expression;
pub mod statement;
