use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitInt, LitStr, parse_macro_input};

use proc_macro_crate::{FoundCrate, crate_name};

fn resolve_hawser_types_path() -> TokenStream2 {
    match crate_name("hawser-types") {
        Ok(FoundCrate::Itself) => quote! { crate },
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote! { ::#ident }
        }
        Err(_) => quote! { ::hawser_types },
    }
}

#[derive(Default)]
struct BoundaryArgs {
    tag: Option<i32>,
    rename: Option<String>,
    name: Option<String>,
}

fn parse_boundary_args(attrs: &[Attribute]) -> syn::Result<BoundaryArgs> {
    let mut args = BoundaryArgs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("boundary")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("tag") {
                let lit: LitInt = meta.value()?.parse()?;
                args.tag = Some(lit.base10_parse()?);
                Ok(())
            } else if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                args.rename = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                args.name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected one of `tag`, `rename`, `name`"))
            }
        })?;
    }
    Ok(args)
}

struct VariantRow {
    ident: Ident,
    tag: i32,
    wire: String,
}

fn collect_rows(input: &DeriveInput) -> syn::Result<Vec<VariantRow>> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "BoundaryEnum can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "BoundaryEnum needs at least one variant",
        ));
    }

    let mut rows = Vec::with_capacity(data.variants.len());
    let mut seen_tags = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut next_tag: i32 = 0;

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "BoundaryEnum variants must not carry data",
            ));
        }
        let args = parse_boundary_args(&variant.attrs)?;
        let tag = args.tag.unwrap_or(next_tag);
        if !seen_tags.insert(tag) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("duplicate boundary tag {tag}"),
            ));
        }
        let wire = args.rename.unwrap_or_else(|| variant.ident.to_string());
        if !seen_names.insert(wire.clone()) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("duplicate boundary name `{wire}`"),
            ));
        }
        next_tag = tag.checked_add(1).ok_or_else(|| {
            syn::Error::new_spanned(variant, "boundary tag overflows i32")
        })?;
        rows.push(VariantRow {
            ident: variant.ident.clone(),
            tag,
            wire,
        });
    }
    Ok(rows)
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let rows = collect_rows(input)?;
    let enum_args = parse_boundary_args(&input.attrs)?;
    let ident = &input.ident;
    let display_name = enum_args.name.unwrap_or_else(|| ident.to_string());
    let krate = resolve_hawser_types_path();

    let idents: Vec<&Ident> = rows.iter().map(|r| &r.ident).collect();
    let tags: Vec<i32> = rows.iter().map(|r| r.tag).collect();
    let wires: Vec<&str> = rows.iter().map(|r| r.wire.as_str()).collect();

    Ok(quote! {
        impl #krate::BoundaryEnum for #ident {
            const NAME: &'static str = #display_name;
            const VARIANTS: &'static [Self] = &[#(Self::#idents),*];

            fn to_tag(self) -> i32 {
                match self {
                    #(Self::#idents => #tags,)*
                }
            }

            fn from_tag(tag: i32) -> ::core::result::Result<Self, #krate::HawserError> {
                match tag {
                    #(#tags => ::core::result::Result::Ok(Self::#idents),)*
                    other => ::core::result::Result::Err(
                        #krate::HawserError::unknown_variant(#display_name, i64::from(other)),
                    ),
                }
            }

            fn as_str(self) -> &'static str {
                match self {
                    #(Self::#idents => #wires,)*
                }
            }

            fn from_name(name: &str) -> ::core::result::Result<Self, #krate::HawserError> {
                match name {
                    #(#wires => ::core::result::Result::Ok(Self::#idents),)*
                    other => ::core::result::Result::Err(#krate::HawserError::invalid_format(
                        ::std::format!("unknown {} name `{}`", #display_name, other),
                    )),
                }
            }
        }

        impl ::core::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(<Self as #krate::BoundaryEnum>::as_str(*self))
            }
        }

        impl ::core::str::FromStr for #ident {
            type Err = #krate::HawserError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                <Self as #krate::BoundaryEnum>::from_name(s)
            }
        }

        impl ::core::convert::TryFrom<i32> for #ident {
            type Error = #krate::HawserError;

            fn try_from(tag: i32) -> ::core::result::Result<Self, Self::Error> {
                <Self as #krate::BoundaryEnum>::from_tag(tag)
            }
        }

        impl ::core::convert::From<#ident> for i32 {
            fn from(value: #ident) -> i32 {
                <#ident as #krate::BoundaryEnum>::to_tag(value)
            }
        }
    })
}

pub fn derive_boundary_enum_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
