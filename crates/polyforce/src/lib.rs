//! # Polyforce
//!
//! **Runtime signature validation for dynamically typed call boundaries**
//!
//! Polyforce checks every argument of a call against the parameter's
//! declared type before the callable runs:
//!
//! - **Checked functions** – `#[polycheck]` or [`Polycheck::wrap`]
//! - **Checked models** – every method of a [`Model`] validated, with
//!   schemas and policies inherited from parent models
//! - **Aggregated failures** – one [`ValidationFailure`] per mismatched
//!   argument, renderable as JSON
//! - **Policies** – switch checks off or exempt whole types through [`Config`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use polyforce::prelude::*;
//!
//! #[polycheck]
//! fn scale(x: f64, #[poly(default = 2.0)] factor: f64) -> f64 {
//!     x * factor
//! }
//!
//! let scale = scale_polycheck()?;
//! assert_eq!(scale.call(Arguments::new().arg(1.5))?, Value::Float(3.0));
//!
//! let err = scale.call(Arguments::new().arg("wide")).unwrap_err();
//! println!("{}", err.validation_failures().unwrap().to_json());
//! ```
//!
//! ## Models
//!
//! ```rust,ignore
//! let user = Model::builder("User")
//!     .init(
//!         Signature::method(INIT).arg("name", TypeHint::str()).returns(TypeHint::none()),
//!         |frame| {
//!             let name: String = frame.arg("name")?;
//!             frame.instance()?.set("name", name);
//!             Ok(Value::None)
//!         },
//!     )
//!     .build()?;
//!
//! let ada = user.instantiate(Arguments::new().arg("Ada"))?;
//! ```

#![doc(html_root_url = "https://docs.rs/polyforce/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the runtime at the root; `#[polycheck]` expands to `::polyforce::*` paths
pub use polyforce_core::*;

// Re-export core as a module as well
pub use polyforce_core as core;

// Re-export macros - the polycheck attribute macro
pub use polyforce_macros::polycheck;

// Re-export logging setup
pub use polyforce_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use polyforce::prelude::*;
/// ```
pub mod prelude {
    pub use polyforce_core::{
        Arguments, CallFrame, CheckedFunction, Config, FieldOptions, Instance, Model, Object,
        Parameter, PolyError, PolyResult, Polycheck, Signature, TypeHint, Value, INIT,
    };

    // Re-export the polycheck macro
    pub use polyforce_macros::polycheck;

    // Re-export logging setup
    pub use polyforce_telemetry::{init_logging, LogConfig};
}
