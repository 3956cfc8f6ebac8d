use syn::{DeriveInput, Meta, NestedMeta};
use quote::{format_ident, quote};
use proc_macro::TokenStream;

pub fn impl_component(ast: &DeriveInput) -> TokenStream {
    let name = &ast.ident;

    if !ast.generics.params.is_empty() {
        return syn::Error::new_spanned(&ast.generics, "#[derive(Component)] does not support generic types")
            .to_compile_error()
            .into();
    }

    let compact = match is_compact(ast) {
        Ok(compact) => compact,
        Err(err) => return err.to_compile_error().into(),
    };

    let name_str = name.to_string().to_uppercase();
    let id_name = format_ident!("__COMPONENT_TYPE_ID_OF_{}", name_str);

    let gen = quote! {
        turbo_world::lazy_static! {
            static ref #id_name: turbo_world::components::ComponentTypeId =
                turbo_world::components::ComponentManagerFactory::type_id_of::<#name>();
        }

        impl turbo_world::components::Component for #name {
            const COMPACT_STORAGE: bool = #compact;

            #[inline(always)]
            fn component_type_id() -> turbo_world::components::ComponentTypeId {
                *#id_name
            }
        }
    };
    gen.into()
}

fn is_compact(ast: &DeriveInput) -> syn::Result<bool> {
    let mut compact = false;
    for attr in ast.attrs.iter().filter(|a| a.path.is_ident("component")) {
        match attr.parse_meta()? {
            Meta::List(list) => {
                for nested in list.nested.iter() {
                    match nested {
                        NestedMeta::Meta(Meta::Path(path)) if path.is_ident("compact") => compact = true,
                        other => return Err(syn::Error::new_spanned(other, "expected `compact`")),
                    }
                }
            },
            other => return Err(syn::Error::new_spanned(other, "expected #[component(compact)]")),
        }
    }
    Ok(compact)
}
