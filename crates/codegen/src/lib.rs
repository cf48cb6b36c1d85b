//! Code-generation core of `tswasm`, lowering a statically-typed TypeScript
//! dialect into an [in-memory WebAssembly module].
//!
//! The crate consumes a parsed [`Program`] and produces a [`module::Module`]
//! ready for an external assembler: declarations drive what gets emitted,
//! statements lower onto labeled blocks and loops, and expressions compile
//! under a contextual type that decides literal widening and conversion
//! insertion. Parsing and binary serialization live outside this crate.
//!
//! [in-memory WebAssembly module]: https://webassembly.github.io/spec/core/syntax/modules.html

#![deny(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_debug_implementations)]

pub mod ast;
pub mod module;

mod codegen;
mod diag;
mod ident;
mod program;
mod types;

#[doc(no_inline)]
pub use anyhow::{Error, Result};

pub use codegen::{Compilation, Compile, MAX_MEMORY_PAGES};
pub use diag::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use program::{ElementId, Program, Source};
pub use types::{NativeType, Target, Type};
