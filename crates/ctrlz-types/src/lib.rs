//! Foundation types for ctrlz.
//!
//! Every other ctrlz crate depends on `ctrlz-types`. It carries the
//! content-addressed [`ObjectId`] (a 160-bit SHA-1 digest rendered as 40
//! lowercase hex characters) and the parse errors it can produce.

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::{ObjectId, OBJECT_ID_HEX_LEN, OBJECT_ID_LEN};
