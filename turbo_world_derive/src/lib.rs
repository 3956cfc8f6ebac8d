mod component;

use proc_macro::TokenStream;

/// Implements `turbo_world::components::Component` for a plain data type.
///
/// Add `#[component(compact)]` to store the type in compact (swap-remove) storage.
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();
    component::impl_component(&ast)
}
