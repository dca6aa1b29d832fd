use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;

use crate::error::ErrorSet;

pub(crate) fn generate(input: TokenStream) -> syn::Result<TokenStream> {
    let item: syn::DeriveInput = syn::parse2(input)?;
    let enumeration = EnumDef::from_ast(&item)?;
    Ok(enumeration.expand())
}

#[derive(Debug)]
struct EnumDef {
    ident: syn::Ident,
    /// `IntegralRepr` variant name
    repr: syn::Ident,
    variants: Vec<syn::Ident>,
}

impl EnumDef {
    fn from_ast(ast: &syn::DeriveInput) -> syn::Result<Self> {
        let syn::Data::Enum(data) = &ast.data else {
            return Err(syn::Error::new_spanned(
                &ast.ident,
                "MapEnum can only be derived for enums",
            ));
        };
        if !ast.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &ast.generics,
                "mapped enum generics are not supported",
            ));
        }

        let mut errs = ErrorSet::new();
        let repr = match repr_attr(&ast.attrs) {
            Ok(repr) => repr,
            Err(err) => {
                errs.push(err);
                format_ident!("I32")
            }
        };

        let mut variants = vec![];
        for variant in &data.variants {
            if matches!(variant.fields, syn::Fields::Unit) {
                variants.push(variant.ident.clone());
            } else {
                errs.push(syn::Error::new_spanned(
                    variant,
                    "mapped enum variants cannot carry fields",
                ));
            }
        }

        if let Some(err) = errs.collect() {
            return Err(err);
        }

        Ok(Self {
            ident: ast.ident.clone(),
            repr,
            variants,
        })
    }

    fn expand(&self) -> TokenStream {
        let ident = &self.ident;
        let name = ident.unraw().to_string();
        let repr = &self.repr;
        let variants = &self.variants;

        quote! {
            impl ::tablemap_core::MappedEnum for #ident {
                const NAME: &'static str = #name;
                const REPR: ::tablemap_core::IntegralRepr = ::tablemap_core::IntegralRepr::#repr;

                fn discriminant(self) -> i64 {
                    self as i64
                }

                fn from_discriminant(value: i64) -> ::core::option::Option<Self> {
                    #(
                        if value == Self::#variants as i64 {
                            return ::core::option::Option::Some(Self::#variants);
                        }
                    )*
                    ::core::option::Option::None
                }
            }

            impl ::tablemap_core::FieldValue for #ident {
                fn semantic_type() -> ::tablemap_core::SemanticType {
                    ::tablemap_core::enum_semantic_type::<Self>()
                }

                fn to_value(&self) -> ::tablemap_core::Value {
                    ::tablemap_core::enum_to_value(*self)
                }

                fn from_value(
                    value: ::tablemap_core::Value,
                ) -> ::core::result::Result<Self, ::tablemap_core::ValueError> {
                    ::tablemap_core::enum_from_value(value)
                }
            }
        }
    }
}

/// Maps `#[repr(..)]` onto an `IntegralRepr` variant; `i32` when absent.
fn repr_attr(attrs: &[syn::Attribute]) -> syn::Result<syn::Ident> {
    let mut repr = format_ident!("I32");
    for attr in attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let Some(ident) = meta.path.get_ident() else {
                return Err(meta.error("unsupported repr"));
            };
            repr = match ident.to_string().as_str() {
                "u8" => format_ident!("U8"),
                "i16" => format_ident!("I16"),
                "i32" => format_ident!("I32"),
                "i64" => format_ident!("I64"),
                other => {
                    return Err(meta.error(format!(
                        "repr({other}) is not a storable integral; use u8, i16, i32 or i64"
                    )));
                }
            };
            Ok(())
        })?;
    }
    Ok(repr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_repr() {
        let input: syn::DeriveInput = syn::parse_quote! {
            #[derive(Clone, Copy)]
            #[repr(i16)]
            enum Level { Low = 1, High = 2 }
        };
        let def = EnumDef::from_ast(&input).unwrap();
        assert_eq!(def.repr, "I16");
        assert_eq!(def.variants.len(), 2);
    }

    #[test]
    fn test_defaults_to_i32() {
        let input: syn::DeriveInput = syn::parse_quote! {
            enum Level { Low, High }
        };
        assert_eq!(EnumDef::from_ast(&input).unwrap().repr, "I32");
    }

    #[test]
    fn test_rejects_unstorable_shapes() {
        let input: syn::DeriveInput = syn::parse_quote! {
            #[repr(u32)]
            enum Shape { Point, Circle(f64) }
        };
        let err = EnumDef::from_ast(&input).unwrap_err();
        let messages: Vec<String> = err.into_iter().map(|e| e.to_string()).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("repr(u32)"));
        assert_eq!(messages[1], "mapped enum variants cannot carry fields");
    }
}
