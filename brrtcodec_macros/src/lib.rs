use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, LitStr, Result as SynResult};

/// Options read from a field's `#[wire(...)]` attributes.
#[derive(Default)]
struct WireAttrs {
    json: Option<LitStr>,
    xml_entity: Option<LitStr>,
    xml_attribute: Option<LitStr>,
    default: bool,
}

impl WireAttrs {
    fn from_field(field: &Field) -> SynResult<Self> {
        let mut attrs = WireAttrs::default();
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("wire")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("json") {
                    attrs.json = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("xml_entity") {
                    attrs.xml_entity = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("xml_attribute") {
                    attrs.xml_attribute = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("default") {
                    attrs.default = true;
                } else {
                    return Err(meta.error("expected `json`, `xml_entity`, `xml_attribute` or `default`"));
                }
                Ok(())
            })?;
        }
        if let (Some(_), Some(attribute)) = (&attrs.xml_entity, &attrs.xml_attribute) {
            return Err(syn::Error::new(
                attribute.span(),
                "a field is either an XML entity or an XML attribute, not both",
            ));
        }
        Ok(attrs)
    }

    fn metadata(&self) -> Vec<TokenStream2> {
        let mut metadata = Vec::new();
        if let Some(tag) = &self.json {
            metadata.push(quote! { ::brrtcodec::schema::WireMetadata::json_property(#tag) });
        }
        if let Some(tag) = &self.xml_entity {
            metadata.push(quote! { ::brrtcodec::schema::WireMetadata::xml_entity(#tag) });
        }
        if let Some(tag) = &self.xml_attribute {
            metadata.push(quote! { ::brrtcodec::schema::WireMetadata::xml_attribute(#tag) });
        }
        metadata
    }
}

fn record_name(input: &DeriveInput) -> SynResult<String> {
    let mut name = input.ident.to_string();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = meta.value()?.parse::<LitStr>()?.value();
                Ok(())
            } else {
                Err(meta.error("expected `name`"))
            }
        })?;
    }
    Ok(name)
}

/// Derive `brrtcodec::typed::Typed` for a struct with named fields.
///
/// The record schema is built on first use and cached for the life of the
/// process.
///
/// ```rust,ignore
/// #[derive(TypedRecord)]
/// #[record(name = "Book")]
/// struct Book {
///     #[wire(json = "bookId", xml_attribute = "id")]
///     book_id: i64,
///     #[wire(xml_entity = "Title")]
///     title: String,
///     #[wire(default)]
///     tags: Vec<String>,
/// }
/// ```
#[proc_macro_derive(TypedRecord, attributes(record, wire))]
pub fn derive_typed_record(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> SynResult<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "TypedRecord cannot be derived for generic structs",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "TypedRecord requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "TypedRecord can only be derived for structs",
            ))
        }
    };
    let record = record_name(input)?;

    let mut members = Vec::new();
    let mut idents = Vec::new();
    let mut names = Vec::new();
    for field in fields {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let name = field_ident.to_string().trim_start_matches("r#").to_string();
        let attrs = WireAttrs::from_field(field)?;
        let metadata = attrs.metadata();
        let annotation = quote! {
            <#ty as ::brrtcodec::typed::Typed>::annotation() #( .with(#metadata) )*
        };
        members.push(if attrs.default {
            quote! {
                ::brrtcodec::schema::MemberDef::with_default(
                    #name,
                    #annotation,
                    ::brrtcodec::typed::Typed::to_value(&<#ty as ::std::default::Default>::default()),
                )
            }
        } else {
            quote! { ::brrtcodec::schema::MemberDef::required(#name, #annotation) }
        });
        idents.push(field_ident.clone());
        names.push(name);
    }

    Ok(quote! {
        impl ::brrtcodec::typed::Typed for #ident {
            fn annotation() -> ::brrtcodec::schema::TypeAnnotation {
                static SCHEMA: ::std::sync::OnceLock<::brrtcodec::schema::TypeAnnotation> =
                    ::std::sync::OnceLock::new();
                SCHEMA
                    .get_or_init(|| {
                        ::brrtcodec::schema::TypeAnnotation::record(
                            ::brrtcodec::schema::RecordDef::new(#record, ::std::vec![#(#members),*]),
                        )
                    })
                    .clone()
            }

            fn to_value(&self) -> ::brrtcodec::Value {
                ::brrtcodec::Value::record::<&str, _>([
                    #( (#names, ::brrtcodec::typed::Typed::to_value(&self.#idents)) ),*
                ])
            }

            fn from_value(value: ::brrtcodec::Value) -> ::brrtcodec::CodecResult<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut record = value.into_record()?;
                ::std::result::Result::Ok(Self {
                    #( #idents: ::brrtcodec::typed::take_member(&mut record, #names)?, )*
                })
            }
        }
    })
}
