//! Parsing utilities for the `#[polycheck]` macro.
//!
//! This module parses the attribute arguments, the per-parameter `#[poly]`
//! options, the function signature and the fields of a checked struct.

use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Expr, ExprArray, ExprLit, Field, Fields, FnArg, GenericParam, Ident, ItemFn,
    ItemStruct, Lit, LitBool, LitStr, Meta, Pat, Path, PatIdent, PatType, Token, Type,
};

/// Parsed `#[polycheck(...)]` arguments.
#[derive(Debug, Default)]
pub struct PolycheckAttrs {
    /// Disables type enforcement.
    pub ignore: bool,
    /// Type names exempt from checking.
    pub ignored_types: Vec<LitStr>,
    /// Overrides the callable name reported in failures.
    pub name: Option<LitStr>,
    /// Overrides the return hint.
    pub returns: Option<Expr>,
    /// Path of the runtime crate, `::polyforce` by default.
    pub krate: Option<Path>,
}

impl PolycheckAttrs {
    /// Returns the path generated code uses to reach the runtime.
    pub fn crate_path(&self) -> Path {
        self.krate
            .clone()
            .unwrap_or_else(|| syn::parse_quote!(::polyforce))
    }
}

impl Parse for PolycheckAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attrs = Self::default();

        let meta_list: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in meta_list {
            match meta {
                Meta::Path(path) if path.is_ident("ignore") => attrs.ignore = true,
                Meta::NameValue(nv) => {
                    let ident = nv
                        .path
                        .get_ident()
                        .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                        .to_string();

                    match ident.as_str() {
                        "ignore" => attrs.ignore = expect_bool(&nv.value)?.value,
                        "ignored_types" => attrs.ignored_types = expect_str_array(&nv.value)?,
                        "name" => attrs.name = Some(expect_str(&nv.value)?),
                        "returns" => attrs.returns = Some(nv.value),
                        "crate" => attrs.krate = Some(expect_str(&nv.value)?.parse()?),
                        _ => {
                            return Err(syn::Error::new(
                                nv.path.span(),
                                format!("unknown attribute: {ident}"),
                            ))
                        }
                    }
                }
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "expected `ignore` or name = value",
                    ))
                }
            }
        }

        Ok(attrs)
    }
}

fn expect_bool(expr: &Expr) -> syn::Result<LitBool> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Bool(b), ..
        }) => Ok(b.clone()),
        _ => Err(syn::Error::new(expr.span(), "expected boolean literal")),
    }
}

fn expect_str(expr: &Expr) -> syn::Result<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.clone()),
        _ => Err(syn::Error::new(expr.span(), "expected string literal")),
    }
}

fn expect_str_array(expr: &Expr) -> syn::Result<Vec<LitStr>> {
    match expr {
        Expr::Array(ExprArray { elems, .. }) => elems.iter().map(expect_str).collect(),
        _ => Err(syn::Error::new(
            expr.span(),
            "expected an array of type names, e.g. [\"Actor\"]",
        )),
    }
}

/// Options from a parameter's `#[poly(...)]` attribute.
#[derive(Debug, Default)]
pub struct ParamOptions {
    /// Concrete default expression.
    pub default: Option<Expr>,
    /// Default producer expression.
    pub default_factory: Option<Expr>,
    /// Explicit hint expression.
    pub hint: Option<Expr>,
    /// Field title.
    pub title: Option<LitStr>,
    /// Field description.
    pub description: Option<LitStr>,
    /// Explicit requiredness.
    pub required: Option<LitBool>,
    /// Binds by keyword only.
    pub keyword_only: bool,
}

impl ParamOptions {
    /// Parses and removes the `#[poly(...)]` attributes of `name`.
    fn take_from(attrs: &mut Vec<Attribute>, name: &Ident) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("poly")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    options.default = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("default_factory") {
                    options.default_factory = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("hint") {
                    options.hint = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("title") {
                    options.title = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("description") {
                    options.description = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("required") {
                    options.required = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("keyword_only") {
                    options.keyword_only = true;
                } else {
                    return Err(meta.error("unknown poly option"));
                }
                Ok(())
            })?;
        }
        attrs.retain(|a| !a.path().is_ident("poly"));

        if options.default.is_some() && options.default_factory.is_some() {
            return Err(syn::Error::new(
                name.span(),
                "cannot specify both default and default_factory",
            ));
        }
        Ok(options)
    }

    /// Returns `true` if the options describe a field declaration.
    pub fn declares_field(&self) -> bool {
        self.default.is_some()
            || self.default_factory.is_some()
            || self.title.is_some()
            || self.description.is_some()
            || self.required.is_some()
    }
}

/// A parsed checked parameter.
#[derive(Debug)]
pub struct PolyParam {
    /// The parameter name.
    pub name: Ident,
    /// The parameter type.
    pub ty: Type,
    /// Options from `#[poly(...)]`.
    pub options: ParamOptions,
}

impl PolyParam {
    /// Parses a function argument, removing its `#[poly]` attributes.
    pub fn from_fn_arg(arg: &mut FnArg) -> syn::Result<Self> {
        match arg {
            FnArg::Typed(PatType { attrs, pat, ty, .. }) => {
                let name = match &**pat {
                    Pat::Ident(PatIdent { ident, .. }) => ident.clone(),
                    other => {
                        return Err(syn::Error::new(
                            other.span(),
                            "checked parameters must be plain identifiers",
                        ))
                    }
                };

                check_owned(ty)?;
                let options = ParamOptions::take_from(attrs, &name)?;

                Ok(Self {
                    name,
                    ty: (**ty).clone(),
                    options,
                })
            }
            FnArg::Receiver(_) => Err(syn::Error::new(
                arg.span(),
                "#[polycheck] functions cannot take self; build a Model for methods",
            )),
        }
    }

    /// Parses a named struct field, removing its `#[poly]` attributes.
    pub fn from_field(field: &mut Field) -> syn::Result<Self> {
        let name = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "checked structs need named fields"))?;
        check_owned(&field.ty)?;
        let options = ParamOptions::take_from(&mut field.attrs, &name)?;

        Ok(Self {
            name,
            ty: field.ty.clone(),
            options,
        })
    }
}

fn check_owned(ty: &Type) -> syn::Result<()> {
    if matches!(ty, Type::Reference(_) | Type::ImplTrait(_)) {
        return Err(syn::Error::new(
            ty.span(),
            "checked parameters must be owned, concrete types",
        ));
    }
    Ok(())
}

/// Parsed checked function information.
#[derive(Debug)]
pub struct PolyFn {
    /// The function name.
    pub name: Ident,
    /// The function parameters.
    pub params: Vec<PolyParam>,
    /// The declared return type, if any.
    pub return_type: Option<Type>,
    /// The original function with `#[poly]` attributes removed.
    pub item: ItemFn,
}

impl PolyFn {
    /// Parses an `ItemFn` into a `PolyFn`.
    pub fn parse(mut item: ItemFn) -> syn::Result<Self> {
        if item.sig.asyncness.is_some() {
            return Err(syn::Error::new(
                item.sig.fn_token.span,
                "#[polycheck] functions must be synchronous",
            ));
        }
        if let Some(param) = item
            .sig
            .generics
            .params
            .iter()
            .find(|p| !matches!(p, GenericParam::Lifetime(_)))
        {
            return Err(syn::Error::new(
                param.span(),
                "#[polycheck] functions cannot be generic",
            ));
        }
        if let Some(variadic) = &item.sig.variadic {
            return Err(syn::Error::new(variadic.span(), "variadic functions are not supported"));
        }

        let params = item
            .sig
            .inputs
            .iter_mut()
            .map(PolyParam::from_fn_arg)
            .collect::<syn::Result<Vec<_>>>()?;

        let return_type = match &item.sig.output {
            syn::ReturnType::Default => None,
            syn::ReturnType::Type(_, ty) => Some((**ty).clone()),
        };

        Ok(Self {
            name: item.sig.ident.clone(),
            params,
            return_type,
            item,
        })
    }

    /// Returns the success type if the return type is a `Result`-like
    /// alias (`Result<T, E>`, `PolyResult<T>`, ...).
    pub fn unwrap_result_type(&self) -> Option<&Type> {
        if let Some(Type::Path(type_path)) = &self.return_type {
            if let Some(segment) = type_path.path.segments.last() {
                if segment.ident.to_string().ends_with("Result") {
                    if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                        if let Some(syn::GenericArgument::Type(ok)) = args.args.first() {
                            return Some(ok);
                        }
                    }
                }
            }
        }
        None
    }
}

/// Parsed checked struct information.
#[derive(Debug)]
pub struct PolyStruct {
    /// The struct name.
    pub name: Ident,
    /// The fields, in declaration order.
    pub fields: Vec<PolyParam>,
    /// The original struct with `#[poly]` attributes removed.
    pub item: ItemStruct,
}

impl PolyStruct {
    /// Parses an `ItemStruct` into a `PolyStruct`.
    pub fn parse(mut item: ItemStruct) -> syn::Result<Self> {
        if let Some(param) = item.generics.params.first() {
            return Err(syn::Error::new(
                param.span(),
                "#[polycheck] structs cannot be generic",
            ));
        }
        let Fields::Named(named) = &mut item.fields else {
            return Err(syn::Error::new(
                item.ident.span(),
                "#[polycheck] structs need named fields",
            ));
        };

        let fields = named
            .named
            .iter_mut()
            .map(PolyParam::from_field)
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self {
            name: item.ident.clone(),
            fields,
            item,
        })
    }
}
