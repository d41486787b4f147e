use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Type};

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = generate_injectable_impl(&input).unwrap_or_else(syn::Error::into_compile_error);
    TokenStream::from(expanded)
}

fn generate_injectable_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Injectable)] can only be applied to structs",
            ))
        }
    };

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let construct = construct_from_injector(fields)?;

    Ok(quote! {
        impl #impl_generics ::scopix::Injectable for #struct_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn inject(
                injector: &::scopix::Injector
            ) -> ::scopix::Result<Self> {
                Ok(#construct)
            }
        }
    })
}

/// Expression building `Self` with every field resolved from `injector`.
///
/// - `#[inject("key")] field: Arc<T>` resolves the string token `key`
/// - `field: Arc<dyn Trait>` resolves the trait binding
/// - `field: Arc<T>` resolves `T` by type
pub(crate) fn construct_from_injector(fields: &Fields) -> syn::Result<TokenStream2> {
    match fields {
        Fields::Unit => Ok(quote!(Self)),
        Fields::Named(named) => {
            let injections = named
                .named
                .iter()
                .map(|field| {
                    let field_name = &field.ident;
                    let resolve = resolve_field(field)?;
                    Ok(quote!(#field_name: #resolve))
                })
                .collect::<syn::Result<Vec<_>>>()?;
            Ok(quote!(Self { #(#injections),* }))
        }
        Fields::Unnamed(unnamed) => {
            let injections = unnamed
                .unnamed
                .iter()
                .map(resolve_field)
                .collect::<syn::Result<Vec<_>>>()?;
            Ok(quote!(Self(#(#injections),*)))
        }
    }
}

fn resolve_field(field: &syn::Field) -> syn::Result<TokenStream2> {
    let inner = arc_inner_type(&field.ty).ok_or_else(|| {
        syn::Error::new_spanned(&field.ty, "injected fields must be `Arc<T>` or `Arc<dyn Trait>`")
    })?;

    if let Some(key) = inject_key(field)? {
        return Ok(quote! {
            injector.get_by::<#inner>(&::scopix::Token::named(#key))?
        });
    }

    Ok(match inner {
        Type::TraitObject(_) => quote!(injector.get_trait::<#inner>()?),
        _ => quote!(injector.get::<#inner>()?),
    })
}

/// The string key of an `#[inject("key")]` attribute, if present.
fn inject_key(field: &syn::Field) -> syn::Result<Option<LitStr>> {
    field
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("inject"))
        .map(|attr| attr.parse_args::<LitStr>())
        .transpose()
}

/// Extract the inner type from Arc<T> or Arc<dyn Trait>
fn arc_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Arc" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner_type)) = args.args.first() {
                        return Some(inner_type);
                    }
                }
            }
        }
    }
    None
}
