//! API description parsing
//!
//! This crate turns Swagger-style API descriptions into the API model
//! (`Model`) defined in `apigen-common`.
//!
//! ## Translation Strategy
//!
//! Every description file is translated on its own:
//! - configured substitutions are applied to the raw text
//! - `definitions` become object schemas, referenced or not
//! - every operation under `paths` becomes a call, grouped into call
//!   classes by the first literal segment of its path
//!
//! Type and identifier spellings come from the configuration tables, see
//! [`TypeMapper`] and [`IdentifierMapper`].

mod description;
mod identifier_mapper;
mod pattern;
mod translator;
mod type_mapper;

pub use identifier_mapper::IdentifierMapper;
pub use translator::{InOut, Translator};
pub use type_mapper::TypeMapper;
