mod boundary;

use boundary::derive_boundary_enum_impl;

/// Derive `hawser_types::BoundaryEnum` from a single declaration.
///
/// Both directions (variant → tag, tag → variant) and both name lookups are generated from the
/// same variant list, so they cannot drift apart. Tags default to the variant position, C style:
/// each variant takes the previous tag plus one, starting at zero. Override with
/// `#[boundary(tag = N)]`; override the wire name with `#[boundary(rename = "...")]`.
#[proc_macro_derive(BoundaryEnum, attributes(boundary))]
pub fn derive_boundary_enum(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    derive_boundary_enum_impl(input)
}
