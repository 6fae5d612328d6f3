//! # mysql-types
//!
//! MySQL/MariaDB to Rust value mappings.
//!
//! This crate provides the driver's value model: every parameter sent to the
//! server and every result cell read back is represented as a [`MySqlValue`].
//!
//! ## Type Mappings
//!
//! | MySQL Type | Rust Type |
//! |------------|-----------|
//! | `TINYINT`..`BIGINT` | `i64` |
//! | unsigned integers | `u64` |
//! | `FLOAT` | `f32` |
//! | `DOUBLE` | `f64` |
//! | `CHAR`/`VARCHAR`/`TEXT` | `String` |
//! | `BINARY`/`VARBINARY`/`BLOB` | `bytes::Bytes` |
//! | `NULL` | [`MySqlValue::Null`] |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod value;

pub use value::MySqlValue;
