//! Type-directed conversion between JSON documents and typed in-memory
//! records.
//!
//! The engine converts a structural JSON tree ([`serde_json::Value`]) to and
//! from strongly-shaped values, driven entirely by a statically-known
//! [`Shape`] descriptor, with no runtime markup in the data, no host
//! reflection. User-defined record and enum types are described once as
//! data ([`ProductDef`], [`EnumDef`]) and the registry synthesizes their
//! converters on first use, including for generic and self-referential
//! types.
//!
//! Failed conversions never stop at the first problem: every error found in
//! one pass is collected into an [`ErrorTree`] with the field path where it
//! occurred, then flattened into a complete report.
//!
//! ```
//! use jsonshape_core::{Datum, ProductDef, RegistryBuilder, Shape};
//! use serde_json::json;
//!
//! let registry = RegistryBuilder::new()
//!     .product(ProductDef::new(
//!         "User",
//!         vec![
//!             ProductDef::field("id", Shape::I64),
//!             ProductDef::field("name", Shape::String),
//!         ],
//!     ))
//!     .expect("fresh type name")
//!     .seal();
//!
//! let shape = Shape::named("User");
//! let user = registry
//!     .decode(&json!({"id": 7, "name": "ada"}), &shape)
//!     .expect("valid document");
//! assert_eq!(user, Datum::record("User", vec![Datum::I64(7), Datum::str("ada")]));
//! ```

pub mod convert;
pub mod datum;
pub mod error;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod shape;
pub mod value;

pub use convert::{Capability, Converter, Encoded};
pub use datum::Datum;
pub use error::{ConfigError, DecodeError, EncodeError};
pub use registry::{Registry, RegistryBuilder};
pub use report::{ErrorTree, FieldError, INTERNAL_ERROR, MISSING_PROPERTY, UNEXPECTED_PROPERTY};
pub use shape::{Bundle, EnumDef, FieldDef, ProductDef, Shape};
