//! Procedural macros for polyforce.
//!
//! `#[polycheck]` derives a checked wrapper from an ordinary function: the
//! parameter types become type hints, `#[poly(...)]` parameter attributes
//! become field declarations and the body is called with arguments
//! converted from the validated call frame.
//!
//! # Example
//!
//! ```rust,ignore
//! use polyforce::prelude::*;
//!
//! #[polycheck(ignored_types = ["Actor"])]
//! fn cast(actor: Value, #[poly(default = "lead")] role: String) -> String {
//!     format!("{actor} as {role}")
//! }
//!
//! let checked = cast_polycheck()?;
//! checked.call(Arguments::new().arg(Object::new("Actor")))?;
//! ```

mod parse;
mod polycheck;

use proc_macro::TokenStream;

/// Generates a checked wrapper next to a function.
///
/// For `fn name(...)` the macro keeps the function and adds
/// `fn name_polycheck() -> DefinitionResult<CheckedFunction>`.
///
/// # Attributes
///
/// - `ignore = true` (or bare `ignore`): skip type checks
/// - `ignored_types = ["Name", ...]`: exempt types
/// - `name = "..."`: callable name reported in failures
/// - `returns = <expr>`: explicit return hint
/// - `crate = "path"`: runtime crate path, `::polyforce` by default; use
///   `crate = "polyforce_core"` when depending on the core crate directly
///
/// # Parameter attributes
///
/// `#[poly(...)]` on a parameter accepts `default = <expr>`,
/// `default_factory = <expr>`, `hint = <expr>`, `title = "..."`,
/// `description = "..."`, `required = <bool>` and `keyword_only`.
///
/// A function without a return type produces a wrapper that fails with
/// `ReturnSignatureMissing` unless checks are ignored.
///
/// A function returning a `Result`-like type (`Result<T, E>`,
/// `PolyResult<T>`, `io::Result<T>`, ...) is checked against `T`. Its error
/// passes through `PolyError::from_body`, so `E` may be any error
/// convertible into `anyhow::Error`.
///
/// On a struct with named fields the macro adds `polycheck()`,
/// `from_frame(&CallFrame)` and `from_arguments(Arguments)` to the struct.
/// Fields take the same `#[poly(...)]` options as parameters.
#[proc_macro_attribute]
pub fn polycheck(attr: TokenStream, item: TokenStream) -> TokenStream {
    polycheck::expand_polycheck(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
