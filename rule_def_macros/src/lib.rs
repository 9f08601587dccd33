extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Data, DeriveInput, Expr, Field, Fields, Ident, Lit, MetaNameValue, parse_macro_input,
    punctuated::Punctuated, token,
};

/// Rule kinds accepted in `#[rule(...)]`, with the `FieldRules` variant each one builds.
const RULE_KINDS: [(&str, &str); 5] = [
    ("string", "String"),
    ("number", "Number"),
    ("port", "Port"),
    ("query", "Query"),
    ("url", "Url"),
];

#[proc_macro_derive(Validate, attributes(rule))]
pub fn validate_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input).unwrap_or_else(|e| e.to_compile_error().into())
}

/// One `#[rule(...)]` annotated field.
struct RuleField {
    ident: Ident,
    label: Expr,
    variant: Ident,
    rules: Expr,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Only structs with named fields are supported",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Only structs are supported")),
    };

    let mut rule_fields = Vec::new();
    for field in fields {
        if let Some(rule_field) = parse_rule_field(field)? {
            rule_fields.push(rule_field);
        }
    }

    let field_rule_defs = rule_fields.iter().map(|f| {
        let label = &f.label;
        let variant = &f.variant;
        let rules = &f.rules;
        quote! { (#label, ::easy_rules_def::FieldRules::#variant(#rules)) }
    });

    let field_checks = rule_fields.iter().map(|f| {
        let ident = &f.ident;
        let label = &f.label;
        quote! {
            let result = rules.check_field(
                #label,
                ::easy_rules_def::AsFieldInput::as_field_input(&self.#ident),
            )?;
            if !result.is_valid {
                return ::core::result::Result::Ok(result);
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::easy_rules_def::Validate for #name #ty_generics #where_clause {
            fn record_rules() -> ::core::result::Result<
                &'static ::easy_rules_def::RecordRules,
                ::easy_rules_def::RuleError,
            > {
                static RECORD_RULES: ::easy_rules_def::__private::Lazy<
                    ::core::result::Result<::easy_rules_def::RecordRules, ::easy_rules_def::RuleError>,
                > = ::easy_rules_def::__private::Lazy::new(|| {
                    let fields: ::std::vec::Vec<(&'static str, ::easy_rules_def::FieldRules)> =
                        ::std::vec![#(#field_rule_defs),*];
                    <::easy_rules_def::RecordRules as ::core::convert::TryFrom<_>>::try_from(fields)
                });
                RECORD_RULES.as_ref().map_err(::core::clone::Clone::clone)
            }

            fn validate(&self) -> ::core::result::Result<
                ::easy_rules_def::ValidationResult,
                ::easy_rules_def::RuleError,
            > {
                let rules = <Self as ::easy_rules_def::Validate>::record_rules()?;
                #(#field_checks)*
                ::core::result::Result::Ok(::easy_rules_def::ValidationResult::valid())
            }
        }
    };
    Ok(TokenStream::from(expanded))
}

// --- Helper Functions for Attribute Parsing ---

/// Reads the `#[rule(...)]` attribute of a field, if any.
fn parse_rule_field(field: &Field) -> syn::Result<Option<RuleField>> {
    let Some(ident) = field.ident.clone() else {
        return Ok(None);
    };
    let mut label = None;
    let mut kind = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("rule") {
            continue;
        }
        let parsed_attrs =
            attr.parse_args_with(Punctuated::<MetaNameValue, token::Comma>::parse_terminated)?;

        for nv in parsed_attrs {
            let key = nv
                .path
                .get_ident()
                .map(ToString::to_string)
                .ok_or_else(|| syn::Error::new_spanned(&nv.path, "Expected an identifier"))?;

            if key == "name" {
                get_string_lit_from_expr(&nv.value)?;
                label = Some(nv.value.clone());
                continue;
            }
            let Some((_, variant)) = RULE_KINDS.iter().find(|(attr, _)| *attr == key) else {
                return Err(syn::Error::new_spanned(
                    &nv.path,
                    format!("Unknown rule attribute: {key}"),
                ));
            };
            if kind.is_some() {
                return Err(syn::Error::new_spanned(
                    &nv.path,
                    "A field takes exactly one of string, number, port, query or url",
                ));
            }
            kind = Some((format_ident!("{}", variant), nv.value.clone()));
        }
    }

    match kind {
        Some((variant, rules)) => {
            let label = label.unwrap_or_else(|| {
                let field_name = ident.unraw().to_string();
                syn::parse_quote!(#field_name)
            });
            Ok(Some(RuleField {
                ident,
                label,
                variant,
                rules,
            }))
        }
        None if label.is_some() => Err(syn::Error::new_spanned(
            &ident,
            "`name` needs one of string, number, port, query or url",
        )),
        None => Ok(None),
    }
}

/// Extracts a `String` from a string literal expression (e.g., `"hello"`).
/// Returns a `syn::Error` if the expression is not a string literal.
fn get_string_lit_from_expr(expr: &Expr) -> syn::Result<String> {
    if let Expr::Lit(expr_lit) = expr
        && let Lit::Str(lit_str) = &expr_lit.lit
    {
        return Ok(lit_str.value());
    }
    Err(syn::Error::new_spanned(expr, "Expected a string literal"))
}
