mod decode_template;

use decode_template::TemplateParsed;
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Build a `Template` from a JSON like literal.
///
/// Objects use `{ key: value }` with identifiers or string literals as keys, arrays use
/// `[value, ...]`, `null` is the null literal. Any other leaf is a Rust expression converted with
/// `Template::from`, so proxies and literals mix freely:
/// ```rust,ignore
/// shape!({ name: row.get("name"), "tags": ["a", "b"], score: 1, deleted: null })
/// ```
#[proc_macro]
pub fn shape(input: TokenStream) -> TokenStream {
    let parsed = parse_macro_input!(input as TemplateParsed);
    quote!(#parsed).into()
}
