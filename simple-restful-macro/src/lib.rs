use proc_macro::TokenStream;

mod resource;

/// Attribute macro turning the verb methods of an impl block into a resource
///
/// Methods named `get`, `post`, `put`, `head`, `options`, `patch` and `delete`
/// become handlers. Every argument after `&self` is a path parameter named after
/// its binding; `Option<T>` marks it optional, and an argument of type
/// `Request` receives the request itself.
///
/// # Example
/// ```ignore
/// use simple_restful::prelude::*;
///
/// pub struct TodoResource;
///
/// #[resource(path = "/todos")]
/// impl TodoResource {
///     async fn get(&self, todo_id: Option<i64>) -> Value {
///         json!({ "id": todo_id })
///     }
/// }
/// ```
///
/// `name = "..."` overrides the resource name used in route names and
/// `urls = ["/", "/<id>"]` replaces the derived URLs.
#[proc_macro_attribute]
pub fn resource(attr: TokenStream, item: TokenStream) -> TokenStream {
    resource::resource_attribute(attr, item)
}
