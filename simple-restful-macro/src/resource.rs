use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, spanned::Spanned, Expr, ExprArray,
    ExprLit, FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, Lit, LitStr, Pat,
    PathArguments, Token, Type,
};

/// Scan order of verb methods.
const VERBS: [(&str, &str); 7] = [
    ("get", "GET"),
    ("post", "POST"),
    ("put", "PUT"),
    ("head", "HEAD"),
    ("options", "OPTIONS"),
    ("patch", "PATCH"),
    ("delete", "DELETE"),
];

struct ResourceArgs {
    path: String,
    name: Option<String>,
    urls: Option<Vec<String>>,
}

impl Parse for ResourceArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut path = None;
        let mut name = None;
        let mut urls = None;
        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            if key == "path" {
                let lit: LitStr = input.parse()?;
                path = Some(lit.value());
            } else if key == "name" {
                let lit: LitStr = input.parse()?;
                name = Some(lit.value());
            } else if key == "urls" {
                let array: ExprArray = input.parse()?;
                let mut values = Vec::new();
                for elem in array.elems {
                    match elem {
                        Expr::Lit(ExprLit {
                            lit: Lit::Str(lit), ..
                        }) => values.push(lit.value()),
                        other => {
                            return Err(syn::Error::new(
                                other.span(),
                                "expected a string literal URL",
                            ))
                        }
                    }
                }
                urls = Some(values);
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    "unknown argument, expected `path`, `name` or `urls`",
                ));
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(ResourceArgs {
            path: path.unwrap_or_else(|| "/".to_string()),
            name,
            urls,
        })
    }
}

enum Argument {
    Request { by_ref: bool },
    Path { ident: syn::Ident, ty: Type, optional: bool },
}

struct VerbInfo {
    method: &'static str,
    fn_name: syn::Ident,
    arguments: Vec<Argument>,
}

pub fn resource_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ResourceArgs);
    let input = parse_macro_input!(item as ItemImpl);
    match generate_resource_impl(&args, &input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(error) => {
            let error = error.to_compile_error();
            TokenStream::from(quote! {
                #input
                #error
            })
        }
    }
}

fn generate_resource_impl(args: &ResourceArgs, input: &ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, trait_path, _)) = &input.trait_ {
        return Err(syn::Error::new(
            trait_path.span(),
            "#[resource] goes on an inherent impl block",
        ));
    }

    let self_ty = &input.self_ty;
    let name = match &args.name {
        Some(name) => name.clone(),
        None => type_name(self_ty)?,
    };
    let path = &args.path;

    let mut verbs = Vec::new();
    for (fn_name, method) in VERBS {
        let found = input.items.iter().find_map(|item| match item {
            ImplItem::Fn(f) if f.sig.ident == fn_name => Some(f),
            _ => None,
        });
        if let Some(f) = found {
            verbs.push(extract_verb_info(method, f)?);
        }
    }

    let urls = args.urls.as_ref().map(|urls| {
        quote! { .urls([#(#urls),*]) }
    });
    let registrations = verbs.iter().map(generate_registration);

    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics ::simple_restful::Resource for #self_ty #where_clause {
            fn endpoint(self: ::std::sync::Arc<Self>) -> ::simple_restful::Endpoint {
                ::simple_restful::Endpoint::new(#name, #path)
                    #urls
                    #(#registrations)*
            }
        }
    })
}

fn type_name(ty: &Type) -> syn::Result<String> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return Ok(segment.ident.to_string());
        }
    }
    Err(syn::Error::new(
        ty.span(),
        "cannot name this resource, pass `name = \"...\"`",
    ))
}

fn extract_verb_info(method: &'static str, f: &ImplItemFn) -> syn::Result<VerbInfo> {
    if f.sig.asyncness.is_none() {
        return Err(syn::Error::new(
            f.sig.fn_token.span(),
            "resource verb methods must be async",
        ));
    }

    let mut inputs = f.sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new(
                f.sig.ident.span(),
                "resource verb methods must take `&self`",
            ))
        }
    }

    let mut arguments = Vec::new();
    for input in inputs {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        if let Some(by_ref) = request_argument(&pat_type.ty) {
            arguments.push(Argument::Request { by_ref });
            continue;
        }
        let ident = match &*pat_type.pat {
            Pat::Ident(pat_ident) => pat_ident.ident.clone(),
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "path parameters must be plain identifiers",
                ))
            }
        };
        let (ty, optional) = match option_inner(&pat_type.ty) {
            Some(inner) => (inner.clone(), true),
            None => ((*pat_type.ty).clone(), false),
        };
        arguments.push(Argument::Path {
            ident,
            ty,
            optional,
        });
    }

    Ok(VerbInfo {
        method,
        fn_name: f.sig.ident.clone(),
        arguments,
    })
}

/// `Some(by_ref)` when the type is `Request` or `&Request`.
fn request_argument(ty: &Type) -> Option<bool> {
    match ty {
        Type::Reference(reference) => request_argument(&reference.elem).map(|_| true),
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .filter(|segment| segment.ident == "Request")
            .map(|_| false),
        _ => None,
    }
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn generate_registration(verb: &VerbInfo) -> TokenStream2 {
    let method = format_ident!("{}", verb.method);
    let fn_name = &verb.fn_name;

    let declarations = verb.arguments.iter().filter_map(|argument| match argument {
        Argument::Path {
            ident,
            ty,
            optional,
        } => {
            let name = ident.to_string();
            Some(if *optional {
                quote! { .optional::<#ty>(#name) }
            } else {
                quote! { .required::<#ty>(#name) }
            })
        }
        Argument::Request { .. } => None,
    });

    let extractions = verb.arguments.iter().enumerate().filter_map(|(i, argument)| {
        let Argument::Path {
            ident,
            ty,
            optional,
        } = argument
        else {
            return None;
        };
        let name = ident.to_string();
        let local = format_ident!("__p_{}", i);
        let getter = if *optional {
            quote! { optional::<#ty> }
        } else {
            quote! { required::<#ty> }
        };
        Some(quote! {
            let #local = match __req.args().#getter(#name) {
                Ok(value) => value,
                Err(error) => return ::simple_restful::IntoReply::into_reply(error),
            };
        })
    });

    let call_args = verb.arguments.iter().enumerate().map(|(i, argument)| match argument {
        Argument::Request { by_ref: true } => quote! { &__req },
        Argument::Request { by_ref: false } => quote! { __req },
        Argument::Path { .. } => {
            let local = format_ident!("__p_{}", i);
            quote! { #local }
        }
    });

    quote! {
        .on(
            ::simple_restful::http::Method::#method,
            ::simple_restful::Params::new() #(#declarations)*,
            {
                let __this = ::std::sync::Arc::clone(&self);
                move |__req: ::simple_restful::Request| {
                    let __this = ::std::sync::Arc::clone(&__this);
                    async move {
                        #(#extractions)*
                        ::simple_restful::IntoReply::into_reply(__this.#fn_name(#(#call_args),*).await)
                    }
                }
            },
        )
    }
}
