//! # DRL Expression Language - Abstract Syntax Tree
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes, references and their path segments
//! - **[operators]** - Binary and prefix operators with their binding powers
//!
//! ## Quick Start
//!
//! ```text
//! if($(user>age) >= 18 and not $[user>banned], 'welcome', 'denied')
//! ```
//!
//! ## References
//!
//! A reference starts with the reference indicator (`$` by default) and names
//! a path into the context, segments separated by the key delimiter (`>` by
//! default). The bracket after the indicator selects what happens when the
//! path does not resolve:
//!
//! | Form        | Mode              | On a missing path                     |
//! |-------------|-------------------|---------------------------------------|
//! | `$a>b`      | Bare              | error (empty text in templates)       |
//! | `$(a>b)`    | Required          | error                                 |
//! | `$[a>b]`    | Optional          | null                                  |
//! | `${a>b}`    | Literal fallback  | `$a>b` (`${a>b}` in templates)        |
//!
//! Bracketed paths may contain nested references, which are resolved first:
//!
//! ```text
//! $(data>$(keys>$(keys>k1))>value)
//! ```
//!
//! ## Numeric Segments
//!
//! An all-digit segment indexes a sequence when it reaches one, and is an
//! ordinary key when it reaches a mapping.
//!
//! ## Operator Precedence
//!
//! From tightest to loosest: unary `-`, `^` (right-associative), `* / %`,
//! `+ -`, comparisons, `not`, `and`, `or`.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, PathSpec, RefMode, Reference, Segment};
pub use operators::{BinOp, NOT_BINDING, UnaryOp};
pub use tokens::{Op, Token, TokenKind};
