use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, Fields, ItemStruct, LitStr, Path, Token,
    Type,
};

use crate::injectable::construct_from_injector;

/// Represents a trait binding: (dyn Trait => Impl)
struct BindingItem {
    trait_type: Type,
    impl_type: Path,
}

impl Parse for BindingItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        // Parse: (dyn Trait => Impl)
        let content;
        syn::parenthesized!(content in input);

        let trait_type: Type = content.parse()?;
        content.parse::<Token![=>]>()?;
        let impl_type: Path = content.parse()?;

        Ok(BindingItem {
            trait_type,
            impl_type,
        })
    }
}

#[derive(Default)]
struct ModuleArgs {
    name: Option<LitStr>,
    imports: Vec<Path>,
    exports: Vec<Type>,
    providers: Vec<Path>,
    controllers: Vec<Path>,
    bindings: Vec<BindingItem>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ModuleArgs::default();

        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            if key == "name" {
                args.name = Some(input.parse()?);
            } else {
                // Parse array: [Item1, Item2, ...]
                let content;
                syn::bracketed!(content in input);

                if key == "imports" {
                    args.imports = content
                        .parse_terminated(Path::parse, Token![,])?
                        .into_iter()
                        .collect();
                } else if key == "exports" {
                    args.exports = content
                        .parse_terminated(Type::parse, Token![,])?
                        .into_iter()
                        .collect();
                } else if key == "providers" {
                    args.providers = content
                        .parse_terminated(Path::parse, Token![,])?
                        .into_iter()
                        .collect();
                } else if key == "controllers" {
                    args.controllers = content
                        .parse_terminated(Path::parse, Token![,])?
                        .into_iter()
                        .collect();
                } else if key == "bindings" {
                    args.bindings = content
                        .parse_terminated(BindingItem::parse, Token![,])?
                        .into_iter()
                        .collect();
                } else {
                    return Err(syn::Error::new_spanned(
                        &key,
                        "expected one of: name, imports, exports, providers, controllers, bindings",
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

pub fn module_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ModuleArgs);
    let input = parse_macro_input!(item as ItemStruct);
    let expanded = generate_module_impl(&args, input).unwrap_or_else(syn::Error::into_compile_error);

    TokenStream::from(expanded)
}

fn generate_module_impl(args: &ModuleArgs, mut input: ItemStruct) -> syn::Result<TokenStream2> {
    let construct = construct_from_injector(&input.fields)?;
    strip_inject_attributes(&mut input.fields);

    let module_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| LitStr::new(&module_name.to_string(), module_name.span()));

    let imports = &args.imports;
    let exports = &args.exports;
    let providers = &args.providers;
    let controllers = &args.controllers;

    let binding_providers = args.bindings.iter().map(|binding| {
        let trait_type = &binding.trait_type;
        let impl_type = &binding.impl_type;
        quote! {
            .provider(::scopix::Provider::bind::<#trait_type, #impl_type, _>(|i| {
                i as ::std::sync::Arc<#trait_type>
            }))
        }
    });

    Ok(quote! {
        #input

        impl #impl_generics ::scopix::Injectable for #module_name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn inject(
                injector: &::scopix::Injector
            ) -> ::scopix::Result<Self> {
                Ok(#construct)
            }
        }

        impl #impl_generics ::scopix::Module for #module_name #ty_generics #where_clause {
            fn metadata() -> ::scopix::ModuleMetadata {
                ::scopix::ModuleMetadata::new(#name)
                    #(.import(::scopix::Token::of::<#imports>()))*
                    #(.export(::scopix::Token::of::<#exports>()))*
                    #(.provider(::scopix::Provider::class::<#providers>()))*
                    #(#binding_providers)*
                    #(.controller(::scopix::Provider::class::<#controllers>()))*
            }

            /// Register this module and every imported module not registered yet
            fn register(registry: &mut ::scopix::MetadataRegistry) {
                if registry.contains(&::scopix::Token::of::<Self>()) {
                    return;
                }
                registry.register::<Self>();
                #(<#imports as ::scopix::Module>::register(registry);)*
            }
        }
    })
}

/// `#[inject]` is only meaningful to the generated impl; the struct itself must not keep it.
fn strip_inject_attributes(fields: &mut Fields) {
    for field in fields.iter_mut() {
        field.attrs.retain(|attr| !attr.path().is_ident("inject"));
    }
}
