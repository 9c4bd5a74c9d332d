use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{
    Expr, Ident, LitStr, Result, Token, braced, bracketed,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    token::{Brace, Bracket},
};

pub(crate) enum TemplateParsed {
    Object(Vec<(String, TemplateParsed)>),
    Array(Vec<TemplateParsed>),
    Null,
    Expr(Box<Expr>),
}

struct FieldParsed(String, TemplateParsed);

impl Parse for FieldParsed {
    fn parse(input: ParseStream) -> Result<Self> {
        let key = if input.peek(LitStr) {
            input.parse::<LitStr>()?.value()
        } else {
            input.parse::<Ident>()?.to_string()
        };
        input.parse::<Token![:]>()?;
        Ok(FieldParsed(key, input.parse()?))
    }
}

fn at_end_of_value(input: ParseStream) -> bool {
    input.is_empty() || input.peek(Token![,])
}

impl Parse for TemplateParsed {
    fn parse(input: ParseStream) -> Result<Self> {
        if input.peek(Brace) {
            let content;
            braced!(content in input);
            let fields = Punctuated::<FieldParsed, Token![,]>::parse_terminated(&content)?;
            return Ok(TemplateParsed::Object(
                fields.into_iter().map(|v| (v.0, v.1)).collect(),
            ));
        }
        if input.peek(Bracket) {
            let content;
            bracketed!(content in input);
            let items = Punctuated::<TemplateParsed, Token![,]>::parse_terminated(&content)?;
            return Ok(TemplateParsed::Array(items.into_iter().collect()));
        }
        let fork = input.fork();
        if let Ok(ident) = fork.parse::<Ident>()
            && ident == "null"
            && at_end_of_value(&fork)
        {
            input.parse::<Ident>()?;
            return Ok(TemplateParsed::Null);
        }
        Ok(TemplateParsed::Expr(Box::new(input.parse()?)))
    }
}

impl ToTokens for TemplateParsed {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.extend(match self {
            TemplateParsed::Object(fields) => {
                let fields = fields.iter().map(|(k, v)| quote!((::std::string::String::from(#k), #v)));
                quote! {
                    ::quarry::Template::Object(::std::collections::BTreeMap::from([#(#fields),*]))
                }
            }
            TemplateParsed::Array(items) => {
                quote!(::quarry::Template::Array(::std::vec![#(#items),*]))
            }
            TemplateParsed::Null => quote!(::quarry::Template::Literal(::quarry::Value::Null)),
            TemplateParsed::Expr(expr) => quote!(::quarry::Template::from(#expr)),
        });
    }
}
