//! Derive macros for `tablemap-core`.
//!
//! - `#[derive(Entity)]` implements `Entity` for a struct with named fields,
//!   reading `#[map(table = "..")]` on the struct and `#[map(key)]`,
//!   `#[map(calculated)]`, `#[map(ignore)]` and `#[map(column = "..")]` on
//!   its fields. `#[map(skip)]` marks a field whose type has no `FieldValue`;
//!   it is described but never read or written.
//! - `#[derive(MapEnum)]` implements `MappedEnum` and `FieldValue` for a
//!   fieldless enum stored through its `#[repr]` (`i32` when absent).
//!
//! Generated code refers to `::tablemap_core`; use the macros through that
//! crate's re-exports.

extern crate proc_macro;

mod entity;
mod enumeration;
mod error;

use proc_macro::TokenStream;

#[proc_macro_derive(Entity, attributes(map))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    match entity::generate(input.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_derive(MapEnum)]
pub fn derive_map_enum(input: TokenStream) -> TokenStream {
    match enumeration::generate(input.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
