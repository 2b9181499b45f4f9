//! dc-core: shared foundation for dircol.
//!
//! Contains:
//! - numeric (Real + tolerances + finiteness checks)
//! - names (fixed-order name -> index maps for states and controls)
//! - error (shared error type)

pub mod error;
pub mod names;
pub mod numeric;

pub use error::{DcError, DcResult};
pub use names::NameMap;
pub use numeric::*;
