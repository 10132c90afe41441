//! Derives for the wire codec of `minecraft-surrogate`.
//!
//! `Encode` and `Decode` read `#[encoding(...)]` options:
//! * on enums, `discriminant = "byte" | "int" | "varint"`, and on each
//!   variant either `id = N` or `fallback` for the catch-all variant;
//! * on fields, `varint`, `varlong`, `angle`, `bool_prefixed` and
//!   `length_prefix = "varint" | "inferred"`.
//!
//! Generated code refers to `crate::protocol`, so the derives are only
//! usable inside the main crate.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod from_variants;
mod protocol;

fn expand(
    input: TokenStream,
    derive: fn(&DeriveInput) -> syn::Result<proc_macro2::TokenStream>,
) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[proc_macro_derive(Encode, attributes(encoding))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    expand(input, protocol::derive_encode_on)
}

#[proc_macro_derive(Decode, attributes(encoding))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    expand(input, protocol::derive_decode_on)
}

/// `From<Inner>` for every single-field variant of a packet enum.
#[proc_macro_derive(FromVariants, attributes(encoding))]
pub fn derive_from_variants(input: TokenStream) -> TokenStream {
    expand(input, from_variants::derive_from_variants_on)
}
