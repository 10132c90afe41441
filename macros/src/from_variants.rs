use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Variant};

/// Whether the variant is marked `#[encoding(fallback)]`.
fn is_fallback(variant: &Variant) -> syn::Result<bool> {
    let mut fallback = false;
    for attr in variant.attrs.iter().filter(|a| a.path().is_ident("encoding")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("fallback") {
                fallback = true;
            } else if meta.input.peek(syn::Token![=]) {
                meta.value()?.parse::<syn::Expr>()?;
            }
            Ok(())
        })?;
    }
    Ok(fallback)
}

/// `From` impls for each single-field variant. The fallback variant is
/// skipped, since an unknown packet is not a typed one.
pub fn derive_from_variants_on(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "FromVariants can only be derived for enums",
        ));
    };
    let enum_ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut impls = Vec::new();
    for variant in &data.variants {
        let Fields::Unnamed(fields) = &variant.fields else {
            continue;
        };
        if fields.unnamed.len() != 1 || is_fallback(variant)? {
            continue;
        }
        let variant_ident = &variant.ident;
        let ty = &fields.unnamed[0].ty;
        impls.push(quote! {
            impl #impl_generics ::core::convert::From<#ty> for #enum_ident #ty_generics #where_clause {
                fn from(packet: #ty) -> Self {
                    Self::#variant_ident(packet)
                }
            }
        });
    }

    Ok(quote! { #(#impls)* })
}
