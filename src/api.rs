//! The registrar: turns resources into an axum [`Router`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::{
    Router,
    extract::Request as HttpRequest,
    http::Method,
    response::Response,
    routing::{MethodFilter, MethodRouter},
};

use crate::config::DEFAULT_BODY_LIMIT;
use crate::cors::{CorsLayer, CorsPolicy};
use crate::error::{RestfulError, Result};
use crate::exception::{ExceptionFilter, http::HttpExceptionFilter};
use crate::interceptor::{Interceptor, InterceptorLayer};
use crate::request::Request;
use crate::resource::{Endpoint, MethodHandler, Resource, preflight_handler};
use crate::route::{RouteTemplate, derive_templates};

/// Verbs a resource may handle, in the order they are scanned.
pub const HTTP_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::DELETE,
];

fn method_rank(method: &Method) -> usize {
    HTTP_METHODS
        .iter()
        .position(|m| m == method)
        .unwrap_or(HTTP_METHODS.len())
}

/// One URL of the route table with the verbs bound to it.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// `"{resource}/{template}/{METHODS}"`, unique within an api.
    pub name: String,
    pub resource: String,
    /// Template relative to the endpoint's base path.
    pub template: RouteTemplate,
    /// Prefix, base path and template joined.
    pub path: RouteTemplate,
    handlers: Vec<MethodHandler>,
}

impl RouteEntry {
    pub fn methods(&self) -> Vec<Method> {
        self.handlers.iter().map(|h| h.method.clone()).collect()
    }

    pub fn handlers(&self) -> &[MethodHandler] {
        &self.handlers
    }
}

/// Every route an api registers, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn build(prefix: &str, endpoints: &[Endpoint]) -> Result<Self> {
        let prefix = RouteTemplate::parse(prefix)?;
        let mut table = RouteTable::default();
        let mut names = HashSet::new();
        let mut shapes: HashMap<String, String> = HashMap::new();
        let mut registered = HashSet::new();

        for endpoint in endpoints {
            // A resource registered twice under the same name and path is kept once.
            if !registered.insert((endpoint.name(), endpoint.path())) {
                tracing::debug!(resource = endpoint.name(), "Resource already registered, skipping");
                continue;
            }
            for entry in Self::endpoint_entries(&prefix, endpoint)? {
                if !names.insert(entry.name.clone()) {
                    return Err(RestfulError::RouteConflict {
                        name: format!("duplicate route name '{}'", entry.name),
                    });
                }
                if let Some(existing) = shapes.insert(entry.path.shape(), entry.name.clone()) {
                    return Err(RestfulError::RouteConflict {
                        name: format!(
                            "'{}' and '{}' both match {}",
                            existing,
                            entry.name,
                            entry.path.shape()
                        ),
                    });
                }
                tracing::debug!(
                    route = %entry.name,
                    path = %entry.path.to_axum_path(),
                    "Registered route"
                );
                table.entries.push(entry);
            }
        }
        Ok(table)
    }

    fn endpoint_entries(prefix: &RouteTemplate, endpoint: &Endpoint) -> Result<Vec<RouteEntry>> {
        if let Some(handler) = endpoint
            .handlers()
            .iter()
            .find(|h| !HTTP_METHODS.contains(&h.method))
        {
            return Err(RestfulError::UnsupportedMethod(handler.method.clone()));
        }

        let base = RouteTemplate::parse(endpoint.path())?;
        let explicit = endpoint
            .explicit_urls()
            .iter()
            .map(|url| RouteTemplate::parse(url))
            .collect::<Result<Vec<_>>>()?;

        // URL -> handlers, in first-seen order.
        let mut urls: Vec<(RouteTemplate, Vec<MethodHandler>)> = Vec::new();
        for method in HTTP_METHODS.iter() {
            let Some(handler) = endpoint.handler(method) else {
                continue;
            };
            let templates = if explicit.is_empty() {
                derive_templates(&handler.params)
            } else {
                explicit.clone()
            };
            for template in templates {
                match urls.iter_mut().find(|(url, _)| *url == template) {
                    Some((_, handlers)) => handlers.push(handler.clone()),
                    None => urls.push((template, vec![handler.clone()])),
                }
            }
        }

        let mut entries = Vec::with_capacity(urls.len());
        for (template, mut handlers) in urls {
            if !handlers.iter().any(|h| h.method == Method::OPTIONS) {
                handlers.push(preflight_handler());
            }
            handlers.sort_by_key(|h| method_rank(&h.method));

            let path = prefix.join(&base).join(&template);
            path.check_unique_names()?;

            let methods: Vec<&str> = handlers.iter().map(|h| h.method.as_str()).collect();
            let name = format!("{}/{}/{}", endpoint.name(), template, methods.join(","));
            entries.push(RouteEntry {
                name,
                resource: endpoint.name().to_string(),
                template,
                path,
                handlers,
            });
        }
        Ok(entries)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects resources under a common prefix and registers them on a router.
///
/// # Example
/// ```rust,ignore
/// let router = Api::new("/v0.9")
///     .resource(TodoResource::default())
///     .interceptor(LoggingInterceptor)
///     .into_router()?;
/// ```
pub struct Api {
    prefix: String,
    endpoints: Vec<Endpoint>,
    interceptors: Vec<Box<dyn Interceptor>>,
    filter: Arc<dyn ExceptionFilter>,
    cors: Option<CorsPolicy>,
    body_limit: usize,
}

impl Api {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            endpoints: Vec::new(),
            interceptors: Vec::new(),
            filter: Arc::new(HttpExceptionFilter::default()),
            cors: Some(CorsPolicy::default()),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn resource<R: Resource>(self, resource: R) -> Self {
        self.resource_arc(Arc::new(resource))
    }

    pub fn resource_arc<R: Resource>(self, resource: Arc<R>) -> Self {
        self.endpoint(resource.endpoint())
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Decorate every route; the first registered interceptor runs outermost.
    pub fn interceptor<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    pub fn exception_filter<F: ExceptionFilter>(mut self, filter: F) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn cors(mut self, policy: CorsPolicy) -> Self {
        self.cors = Some(policy);
        self
    }

    pub fn without_cors(mut self) -> Self {
        self.cors = None;
        self
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    pub fn routes(&self) -> Result<RouteTable> {
        RouteTable::build(&self.prefix, &self.endpoints)
    }

    pub fn into_router(self) -> Result<Router> {
        let table = self.routes()?;
        let mut router = Router::new();

        for entry in table.entries() {
            let mut method_router: MethodRouter = MethodRouter::new();
            for handler in entry.handlers() {
                let filter = MethodFilter::try_from(handler.method.clone())
                    .map_err(|_| RestfulError::UnsupportedMethod(handler.method.clone()))?;
                let bound = Arc::new(BoundRoute {
                    path: entry.path.clone(),
                    handler: handler.clone(),
                    filter: self.filter.clone(),
                    body_limit: self.body_limit,
                });
                method_router = method_router.on(filter, move |request: HttpRequest| {
                    dispatch(bound.clone(), request)
                });
            }
            router = router.route(&entry.path.to_axum_path(), method_router);
        }

        let fallback_filter = self.filter.clone();
        router = router.fallback(move |request: HttpRequest| {
            let filter = fallback_filter.clone();
            async move {
                filter.catch(RestfulError::NotFound {
                    path: request.uri().path().to_string(),
                })
            }
        });

        if !self.interceptors.is_empty() {
            router = router.layer(InterceptorLayer::new(self.interceptors, self.filter.clone()));
        }
        if let Some(policy) = self.cors {
            router = router.layer(CorsLayer::new(policy));
        }

        tracing::info!(routes = table.len(), prefix = %self.prefix, "Api routes registered");
        Ok(router)
    }
}

struct BoundRoute {
    path: RouteTemplate,
    handler: MethodHandler,
    filter: Arc<dyn ExceptionFilter>,
    body_limit: usize,
}

async fn dispatch(route: Arc<BoundRoute>, request: HttpRequest) -> Response {
    let (parts, body) = request.into_parts();

    // axum matched the shape; typed placeholders are checked here.
    let Some(args) = route.path.capture(parts.uri.path()) else {
        return route.filter.catch(RestfulError::NotFound {
            path: parts.uri.path().to_string(),
        });
    };

    let body = match axum::body::to_bytes(body, route.body_limit).await {
        Ok(body) => body,
        Err(e) => {
            return route.filter.catch(RestfulError::InvalidBody {
                reason: e.to_string(),
            });
        }
    };

    let reply = route.handler.call(Request::new(parts, args, body)).await;
    reply.into_response_with(route.filter.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Params;
    use serde_json::json;

    fn todo_endpoint() -> Endpoint {
        Endpoint::new("TodoResource", "/todos")
            .get(Params::new().optional::<i64>("todo_id"), |_req| async {
                json!({})
            })
            .post(
                Params::new()
                    .required::<i64>("todo_id")
                    .optional::<String>("title"),
                |_req| async { (json!({}), 201) },
            )
    }

    #[test]
    fn test_route_names_and_methods() {
        let table = RouteTable::build("/v0.9/", &[todo_endpoint()]).unwrap();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(
            names,
            vec![
                "TodoResource//GET,OPTIONS",
                "TodoResource//<todo_id:int>/GET,POST,OPTIONS",
                "TodoResource//<todo_id:int>/<title:str>/POST,OPTIONS",
            ]
        );

        let entry = table.get("TodoResource//<todo_id:int>/GET,POST,OPTIONS").unwrap();
        assert_eq!(entry.path.to_axum_path(), "/v0.9/todos/{todo_id}");
        assert_eq!(entry.methods(), vec![Method::GET, Method::POST, Method::OPTIONS]);
        assert_eq!(entry.resource, "TodoResource");
    }

    #[test]
    fn test_explicit_urls_bind_every_handler() {
        let endpoint = todo_endpoint().urls(["/", "/<todo_id>"]);
        let table = RouteTable::build("", &[endpoint]).unwrap();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(
            names,
            vec![
                "TodoResource//GET,POST,OPTIONS",
                "TodoResource//<todo_id>/GET,POST,OPTIONS",
            ]
        );
    }

    #[test]
    fn test_own_options_handler_is_kept() {
        let endpoint = Endpoint::new("Preflight", "/p")
            .options(Params::new(), |_req| async { json!("custom") });
        let table = RouteTable::build("", &[endpoint]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.entries()[0].handlers().len(), 1);
    }

    #[test]
    fn test_repeated_resource_is_registered_once() {
        let table = RouteTable::build("/v0.9", &[todo_endpoint(), todo_endpoint()]).unwrap();
        assert_eq!(table.len(), 3);

        let router = Api::new("/v0.9")
            .endpoint(todo_endpoint())
            .endpoint(todo_endpoint())
            .into_router();
        assert!(router.is_ok());
    }

    #[test]
    fn test_same_name_on_other_path_is_a_conflict() {
        let moved = Endpoint::new("TodoResource", "/tasks")
            .get(Params::new(), |_req| async { json!([]) });
        let result = RouteTable::build("", &[todo_endpoint(), moved]);
        assert!(matches!(result, Err(RestfulError::RouteConflict { .. })));
    }

    #[test]
    fn test_same_shape_is_a_conflict() {
        let a = Endpoint::new("ById", "/items").get(Params::new().required::<i64>("id"), |_req| async {
            json!(1)
        });
        let b = Endpoint::new("BySlug", "/items")
            .get(Params::new().required::<String>("slug"), |_req| async { json!(2) });
        assert!(matches!(
            RouteTable::build("", &[a, b]),
            Err(RestfulError::RouteConflict { .. })
        ));
    }

    #[test]
    fn test_placeholder_reused_across_base_and_params() {
        let endpoint = Endpoint::new("Nested", "/todos/<todo_id>")
            .get(Params::new().required::<i64>("todo_id"), |_req| async { json!(1) });
        assert!(matches!(
            RouteTable::build("", &[endpoint]),
            Err(RestfulError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_unsupported_method() {
        let endpoint = Endpoint::new("Tunnel", "/t").on(Method::CONNECT, Params::new(), |_req| async {
            json!(null)
        });
        assert!(matches!(
            RouteTable::build("", &[endpoint]),
            Err(RestfulError::UnsupportedMethod(_))
        ));
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(matches!(
            Api::new("/v<1").endpoint(todo_endpoint()).into_router(),
            Err(RestfulError::InvalidTemplate { .. })
        ));
    }
}
