use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::ext::IdentExt;

use crate::error::ErrorSet;

pub(crate) fn generate(input: TokenStream) -> syn::Result<TokenStream> {
    let item: syn::DeriveInput = syn::parse2(input)?;
    let entity = EntityDef::from_ast(&item)?;
    Ok(entity.expand())
}

#[derive(Debug)]
struct EntityDef {
    ident: syn::Ident,
    table: Option<syn::LitStr>,
    fields: Vec<FieldDef>,
}

#[derive(Debug)]
struct FieldDef {
    ident: syn::Ident,
    ty: syn::Type,
    attrs: FieldAttr,
}

#[derive(Debug, Default)]
struct FieldAttr {
    key: bool,
    ignore: bool,
    skip: bool,
    calculated: bool,
    column: Option<syn::LitStr>,
}

impl EntityDef {
    fn from_ast(ast: &syn::DeriveInput) -> syn::Result<Self> {
        let syn::Data::Struct(data) = &ast.data else {
            return Err(syn::Error::new_spanned(
                &ast.ident,
                "Entity can only be derived for structs",
            ));
        };
        let syn::Fields::Named(named) = &data.fields else {
            return Err(syn::Error::new_spanned(
                &data.fields,
                "entity fields must be named",
            ));
        };
        if !ast.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &ast.generics,
                "entity generics are not supported",
            ));
        }

        let mut errs = ErrorSet::new();
        let table = match table_attr(&ast.attrs) {
            Ok(table) => table,
            Err(err) => {
                errs.push(err);
                None
            }
        };

        let mut fields = vec![];
        for field in &named.named {
            let Some(ident) = &field.ident else {
                errs.push(syn::Error::new_spanned(field, "entity fields must be named"));
                continue;
            };
            match FieldAttr::from_attrs(&field.attrs) {
                Ok(attrs) => fields.push(FieldDef {
                    ident: ident.clone(),
                    ty: field.ty.clone(),
                    attrs,
                }),
                Err(err) => errs.push(err),
            }
        }

        if let Some(err) = errs.collect() {
            return Err(err);
        }

        Ok(Self {
            ident: ast.ident.clone(),
            table,
            fields,
        })
    }

    fn expand(&self) -> TokenStream {
        let ident = &self.ident;
        let type_name = ident.unraw().to_string();
        let table = self.table.as_ref().map(|table| quote!(.table(#table)));
        let members = self.fields.iter().map(FieldDef::expand);

        quote! {
            impl ::tablemap_core::Entity for #ident {
                fn describe() -> ::tablemap_core::TypeDescriptor<Self> {
                    ::tablemap_core::TypeDescriptor::new(#type_name)
                        #table
                        #(.member(#members))*
                }
            }
        }
    }
}

impl FieldDef {
    fn member_name(&self) -> String {
        self.ident.unraw().to_string()
    }

    fn expand(&self) -> TokenStream {
        let ident = &self.ident;
        let ty = &self.ty;
        let name = self.member_name();

        if self.attrs.skip {
            let type_name = ty.to_token_stream().to_string().replace(' ', "");
            return quote! {
                ::tablemap_core::Member::<Self>::opaque(#name, #type_name)
            };
        }

        let key = self.attrs.key.then(|| quote!(.key()));
        let ignored = self.attrs.ignore.then(|| quote!(.ignored()));
        let calculated = self.attrs.calculated.then(|| quote!(.calculated()));
        let column = self.attrs.column.as_ref().map(|column| quote!(.column(#column)));

        quote! {
            ::tablemap_core::Member::<Self>::new::<#ty>(
                #name,
                |entity| &entity.#ident,
                |entity| &mut entity.#ident,
            )
            #key
            #ignored
            #calculated
            #column
        }
    }
}

impl FieldAttr {
    fn from_attrs(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();
        for attr in attrs {
            if !attr.path().is_ident("map") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") {
                    result.key = true;
                } else if meta.path.is_ident("ignore") {
                    result.ignore = true;
                } else if meta.path.is_ident("skip") {
                    result.skip = true;
                } else if meta.path.is_ident("calculated") {
                    result.calculated = true;
                } else if meta.path.is_ident("column") {
                    result.column = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error(
                        "expected `key`, `ignore`, `skip`, `calculated` or `column = \"...\"`",
                    ));
                }
                Ok(())
            })?;
        }
        Ok(result)
    }
}

fn table_attr(attrs: &[syn::Attribute]) -> syn::Result<Option<syn::LitStr>> {
    let mut table = None;
    for attr in attrs {
        if !attr.path().is_ident("map") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                table = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `table = \"...\"`"))
            }
        })?;
    }
    Ok(table)
}
