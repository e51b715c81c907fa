use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Expr, Fields, LitStr};

/// Derives `verbum::FlagGroup` for a struct with named fields.
///
/// # Usage
///
/// ```ignore
/// #[derive(FlagGroup)]
/// #[flags(prefix = "--", delimiter = " ")]
/// struct Profile {
///     name: String,
///
///     #[flag(default = 18, help = "Age in years")]
///     age: i64,
///
///     #[flag(name = "nick-name")]
///     nick: Option<String>,
///
///     tags: Vec<String>,
/// }
/// ```
///
/// Each field becomes a flag named after the field (or `name = ".."`), typed
/// by the field's `verbum::FlagType`. `Option` fields default to `None` and
/// `Vec` fields to the empty list; `default = expr` takes anything
/// convertible into a `verbum::Value`.
///
/// This will generate:
///
/// ```ignore
/// impl verbum::FlagGroup for Profile {
///     fn flag_converter<C: verbum::Context>() -> verbum::FlagConverter<C> {
///         verbum::FlagConverter::new("Profile")
///             .prefix("--")
///             .delimiter(" ")
///             .flag(verbum::Flag::new("name", <String as verbum::FlagType>::type_spec::<C>()))
///             // ...
///     }
///
///     fn from_flags(values: &verbum::FlagValues) -> Result<Self, verbum::ConversionError> {
///         Ok(Self {
///             name: verbum::flags::extract::<String>(values, "name")?,
///             // ...
///         })
///     }
/// }
/// ```
#[proc_macro_derive(FlagGroup, attributes(flags, flag))]
pub fn derive_flag_group(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// `#[flags(...)]` on the struct.
#[derive(Default)]
struct GroupAttrs {
    name: Option<LitStr>,
    prefix: Option<LitStr>,
    delimiter: Option<LitStr>,
}

/// `#[flag(...)]` on a field.
#[derive(Default)]
struct FieldAttrs {
    name: Option<LitStr>,
    default: Option<Expr>,
    help: Option<LitStr>,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    struct_name,
                    "FlagGroup needs a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "FlagGroup can only be derived for structs",
            ))
        }
    };

    let group = group_attrs(&input.attrs)?;
    let group_name = group
        .name
        .map(|lit| lit.value())
        .unwrap_or_else(|| struct_name.to_string());
    let prefix = group.prefix.map(|lit| quote! { .prefix(#lit) });
    let delimiter = group.delimiter.map(|lit| quote! { .delimiter(#lit) });

    let mut flags = Vec::new();
    let mut inits = Vec::new();
    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let attrs = field_attrs(&field.attrs)?;
        let flag_name = attrs
            .name
            .map(|lit| lit.value())
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
        let default = attrs.default.map(|expr| quote! { .default(#expr) });
        let help = attrs.help.map(|lit| quote! { .help(#lit) });

        flags.push(quote! {
            .flag({
                let flag = ::verbum::Flag::new(
                    #flag_name,
                    <#ty as ::verbum::FlagType>::type_spec::<__VerbumContext>(),
                );
                let flag = match <#ty as ::verbum::FlagType>::implicit_default() {
                    ::core::option::Option::Some(value) => flag.default(value),
                    ::core::option::Option::None => flag,
                };
                flag #default #help
            })
        });
        inits.push(quote! {
            #ident: ::verbum::flags::extract::<#ty>(values, #flag_name)?
        });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::verbum::FlagGroup for #struct_name #ty_generics #where_clause {
            fn flag_converter<__VerbumContext: ::verbum::Context>() -> ::verbum::FlagConverter<__VerbumContext> {
                ::verbum::FlagConverter::new(#group_name)
                    #prefix
                    #delimiter
                    #(#flags)*
            }

            fn from_flags(
                values: &::verbum::FlagValues,
            ) -> ::core::result::Result<Self, ::verbum::ConversionError> {
                ::core::result::Result::Ok(Self {
                    #(#inits,)*
                })
            }
        }
    })
}

/// Read `#[flags(name = "..", prefix = "..", delimiter = "..")]`.
fn group_attrs(attrs: &[syn::Attribute]) -> syn::Result<GroupAttrs> {
    let mut group = GroupAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("flags") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                group.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("prefix") {
                group.prefix = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("delimiter") {
                group.delimiter = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("expected `name`, `prefix` or `delimiter`"));
            }
            Ok(())
        })?;
    }
    Ok(group)
}

/// Read `#[flag(name = "..", default = expr, help = "..")]`.
fn field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut field = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("flag") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                field.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("default") {
                field.default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("help") {
                field.help = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("expected `name`, `default` or `help`"));
            }
            Ok(())
        })?;
    }
    Ok(field)
}
