//! `#[polycheck]` macro implementation.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Item, Path, Type};

use crate::parse::{PolyFn, PolyParam, PolyStruct, PolycheckAttrs};

/// Expands the `#[polycheck]` attribute macro.
///
/// On a function the original is kept as written. Next to it the macro emits
/// `<name>_polycheck()`, which builds the [`CheckedFunction`] describing the
/// function's signature and calling it with converted arguments.
///
/// On a struct with named fields the macro emits a checked constructor: the
/// fields become the parameters, in declaration order.
///
/// [`CheckedFunction`]: ../polyforce/struct.CheckedFunction.html
pub fn expand_polycheck(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let attrs: PolycheckAttrs = syn::parse2(attr)?;
    match syn::parse2::<Item>(item)? {
        Item::Fn(item_fn) => Ok(generate_wrapper(&attrs, &PolyFn::parse(item_fn)?)),
        Item::Struct(item_struct) => Ok(generate_constructor(
            &attrs,
            &PolyStruct::parse(item_struct)?,
        )),
        other => Err(syn::Error::new(
            other.span(),
            "#[polycheck] applies to functions and structs with named fields",
        )),
    }
}

fn ignore_tokens(attrs: &PolycheckAttrs) -> TokenStream {
    let ignore = attrs.ignore;
    let ignored_types = &attrs.ignored_types;
    if ignored_types.is_empty() {
        quote! { .ignore(#ignore) }
    } else {
        quote! { .ignore(#ignore).ignored_types([#(#ignored_types),*]) }
    }
}

fn generate_wrapper(attrs: &PolycheckAttrs, checked: &PolyFn) -> TokenStream {
    let krate = attrs.crate_path();
    let fn_name = &checked.name;
    let vis = &checked.item.vis;
    let original_fn = &checked.item;
    let wrapper_name = format_ident!("{}_polycheck", fn_name);
    let doc = format!("Builds the checked wrapper for [`{fn_name}`].");

    let callable = attrs
        .name
        .as_ref()
        .map_or_else(|| fn_name.to_string(), syn::LitStr::value);

    let parameters = checked.params.iter().map(|p| generate_parameter(&krate, p));
    let returns = generate_returns(attrs, checked);

    let policy = ignore_tokens(attrs);

    let bindings = checked.params.iter().map(|p| {
        let name = &p.name;
        let ty = &p.ty;
        let key = name.to_string();
        quote! { let #name: #ty = frame.arg(#key)?; }
    });
    let arg_names = checked.params.iter().map(|p| &p.name);
    let call = quote! { #fn_name(#(#arg_names),*) };

    let body = match (&checked.return_type, checked.unwrap_result_type()) {
        (None, _) => quote! {
            #call;
            ::core::result::Result::Ok(#krate::Value::None)
        },
        (Some(_), Some(_)) => quote! {
            let output = #call.map_err(#krate::PolyError::from_body)?;
            ::core::result::Result::Ok(#krate::IntoValue::into_value(output))
        },
        (Some(_), None) => quote! {
            ::core::result::Result::Ok(#krate::IntoValue::into_value(#call))
        },
    };

    quote! {
        #original_fn

        #[doc = #doc]
        #[allow(unused_variables)]
        #vis fn #wrapper_name(
        ) -> #krate::DefinitionResult<#krate::CheckedFunction> {
            let signature = #krate::Signature::function(#callable)
                #(.param(#parameters))*
                #returns;

            #krate::Polycheck::new()
                #policy
                .wrap(signature, |frame: &#krate::CallFrame| {
                    #(#bindings)*
                    #body
                })
        }
    }
}

fn generate_constructor(attrs: &PolycheckAttrs, checked: &PolyStruct) -> TokenStream {
    let krate = attrs.crate_path();
    let struct_name = &checked.name;
    let vis = &checked.item.vis;
    let original_struct = &checked.item;
    let policy = ignore_tokens(attrs);

    let callable = attrs
        .name
        .as_ref()
        .map_or_else(|| struct_name.to_string(), syn::LitStr::value);
    let returns = attrs.returns.as_ref().map_or_else(
        || quote! { #krate::TypeHint::class(#callable) },
        |expr| quote! { #expr },
    );

    let parameters = checked.fields.iter().map(|f| generate_parameter(&krate, f));
    let keys: Vec<String> = checked.fields.iter().map(|f| f.name.to_string()).collect();
    let field_names = checked.fields.iter().map(|f| &f.name);
    let field_keys = keys.iter();

    let polycheck_doc = format!("Builds the checked constructor of [`{struct_name}`].");
    let from_frame_doc = format!("Builds [`{struct_name}`] from an already checked call frame.");
    let from_arguments_doc =
        format!("Checks `args` against the fields of [`{struct_name}`] and builds it.");

    quote! {
        #original_struct

        impl #struct_name {
            #[doc = #polycheck_doc]
            ///
            /// Calling it returns an object of the struct's class holding the
            /// checked field values.
            #vis fn polycheck() -> #krate::DefinitionResult<#krate::CheckedFunction> {
                let signature = #krate::Signature::function(#callable)
                    #(.param(#parameters))*
                    .returns(#returns);

                #krate::Polycheck::new()
                    #policy
                    .wrap(signature, |frame: &#krate::CallFrame| {
                        let object = #krate::Object::new(#callable);
                        #(
                            object.set(
                                #keys,
                                frame.get(#keys).cloned().unwrap_or(#krate::Value::None),
                            );
                        )*
                        ::core::result::Result::Ok(#krate::Value::Object(object))
                    })
            }

            #[doc = #from_frame_doc]
            #vis fn from_frame(frame: &#krate::CallFrame) -> #krate::PolyResult<Self> {
                ::core::result::Result::Ok(Self {
                    #( #field_names: frame.arg(#field_keys)?, )*
                })
            }

            #[doc = #from_arguments_doc]
            #vis fn from_arguments(args: #krate::Arguments) -> #krate::PolyResult<Self> {
                static CHECKED: ::std::sync::OnceLock<
                    #krate::DefinitionResult<#krate::CheckedFunction>,
                > = ::std::sync::OnceLock::new();

                let checked = CHECKED
                    .get_or_init(Self::polycheck)
                    .as_ref()
                    .map_err(|e| #krate::PolyError::from(::core::clone::Clone::clone(e)))?;
                Self::from_frame(&checked.enforce(args)?)
            }
        }
    }
}

fn hint_for_type(krate: &Path, ty: &Type) -> TokenStream {
    quote! { <#ty as #krate::TypeHintOf>::type_hint() }
}

fn generate_parameter(krate: &Path, param: &PolyParam) -> TokenStream {
    let key = param.name.to_string();
    let options = &param.options;

    let hint = options
        .hint
        .as_ref()
        .map_or_else(|| hint_for_type(krate, &param.ty), |expr| quote! { #expr });

    let kind = if options.keyword_only {
        quote! { .keyword_only() }
    } else {
        quote! {}
    };

    let field = if options.declares_field() {
        let default = options.default.as_ref().map(|e| quote! { .with_default(#e) });
        let factory = options
            .default_factory
            .as_ref()
            .map(|e| quote! { .with_default_factory(#e) });
        let title = options.title.as_ref().map(|t| quote! { .title(#t) });
        let description = options
            .description
            .as_ref()
            .map(|d| quote! { .description(#d) });
        let required = options.required.as_ref().map(|r| quote! { .required(#r) });
        quote! {
            .with_field(
                #krate::FieldOptions::new()
                    #default #factory #title #description #required
                    .build()?
            )
        }
    } else {
        quote! {}
    };

    quote! {
        #krate::Parameter::typed(#key, #hint) #kind #field
    }
}

fn generate_returns(attrs: &PolycheckAttrs, checked: &PolyFn) -> TokenStream {
    let krate = attrs.crate_path();
    if let Some(expr) = &attrs.returns {
        return quote! { .returns(#expr) };
    }
    match (&checked.return_type, checked.unwrap_result_type()) {
        // left unannotated so definition reports the missing return
        (None, _) => quote! {},
        (Some(_), Some(ok)) => {
            let hint = hint_for_type(&krate, ok);
            quote! { .returns(#hint) }
        }
        (Some(ty), None) => {
            let hint = hint_for_type(&krate, ty);
            quote! { .returns(#hint) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple() {
        let attr = quote! {};
        let item = quote! {
            fn add(x: i64, y: i64) -> i64 {
                x + y
            }
        };

        let output = expand_polycheck(attr, item).unwrap().to_string();
        assert!(output.contains("fn add_polycheck"));
        assert!(output.contains("Signature :: function (\"add\")"));
        assert!(output.contains(". returns"));
        assert!(output.contains("frame . arg (\"x\")"));
    }

    #[test]
    fn test_expand_with_options() {
        let attr = quote! { name = "cast", ignored_types = ["Actor"] };
        let item = quote! {
            pub fn cast(
                #[poly(default = "lead", title = "Role")] role: String,
                #[poly(keyword_only)] count: i64,
            ) -> String {
                role
            }
        };

        let output = expand_polycheck(attr, item).unwrap().to_string();
        assert!(output.contains("Signature :: function (\"cast\")"));
        assert!(output.contains(". ignored_types ([\"Actor\"])"));
        assert!(output.contains(". with_default (\"lead\")"));
        assert!(output.contains(". title (\"Role\")"));
        assert!(output.contains(". keyword_only ()"));
        assert!(!output.contains("# [poly"));
    }

    #[test]
    fn test_expand_with_crate_path() {
        let attr = quote! { crate = "polyforce_core" };
        let item = quote! {
            fn double(x: i64) -> i64 { x * 2 }
        };

        let output = expand_polycheck(attr, item).unwrap().to_string();
        assert!(output.contains("polyforce_core :: Polycheck :: new ()"));
        assert!(!output.contains(":: polyforce ::"));
    }

    #[test]
    fn test_expand_without_return_type() {
        let attr = quote! {};
        let item = quote! {
            fn log(message: String) {}
        };

        let output = expand_polycheck(attr, item).unwrap().to_string();
        assert!(!output.contains(". returns"));
        assert!(output.contains("Value :: None"));
    }

    #[test]
    fn test_expand_result_return() {
        let attr = quote! {};
        let item = quote! {
            fn parse(text: String) -> PolyResult<i64> {
                Ok(0)
            }
        };

        let output = expand_polycheck(attr, item).unwrap().to_string();
        assert!(output.contains("map_err (:: polyforce :: PolyError :: from_body)"));
        assert!(output.contains("< i64 as :: polyforce :: TypeHintOf >"));
    }

    #[test]
    fn test_expand_struct() {
        let attr = quote! { ignored_types = ["Actor"] };
        let item = quote! {
            pub struct User {
                id: i64,
                #[poly(default = "")]
                name: String,
            }
        };

        let output = expand_polycheck(attr, item).unwrap().to_string();
        assert!(output.contains("impl User"));
        assert!(output.contains("fn polycheck ()"));
        assert!(output.contains("fn from_arguments"));
        assert!(output.contains("Signature :: function (\"User\")"));
        assert!(output.contains("TypeHint :: class (\"User\")"));
        assert!(output.contains(". with_default (\"\")"));
        assert!(output.contains(". ignored_types ([\"Actor\"])"));
        assert!(!output.contains("# [poly"));
    }

    #[test]
    fn test_expand_rejects_other_items() {
        let attr = quote! {};
        let item = quote! {
            enum Shape { Circle, Square }
        };
        assert!(expand_polycheck(attr, item).is_err());
    }

    #[test]
    fn test_expand_rejects_self() {
        let attr = quote! {};
        let item = quote! {
            fn run(&self, x: i64) -> i64 { x }
        };
        assert!(expand_polycheck(attr, item).is_err());
    }

    #[test]
    fn test_expand_rejects_bad_attr() {
        let attr = quote! { operation = "x" };
        let item = quote! {
            fn f(x: i64) -> i64 { x }
        };
        assert!(expand_polycheck(attr, item).is_err());
    }
}
