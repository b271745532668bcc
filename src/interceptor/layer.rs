use crate::exception::ExceptionFilter;
use crate::interceptor::{Interceptor, InterceptorResult, Next};
use axum::{body::Body, http::Request, response::Response};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer for invoking a chain of Interceptors
#[derive(Clone)]
pub struct InterceptorLayer {
    interceptors: Arc<Vec<Box<dyn Interceptor>>>,
    filter: Arc<dyn ExceptionFilter>,
}

impl InterceptorLayer {
    pub fn new(interceptors: Vec<Box<dyn Interceptor>>, filter: Arc<dyn ExceptionFilter>) -> Self {
        Self {
            interceptors: Arc::new(interceptors),
            filter,
        }
    }
}

impl<S> Layer<S> for InterceptorLayer {
    type Service = InterceptorMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InterceptorMiddleware {
            inner,
            interceptors: self.interceptors.clone(),
            filter: self.filter.clone(),
        }
    }
}

#[derive(Clone)]
pub struct InterceptorMiddleware<S> {
    inner: S,
    interceptors: Arc<Vec<Box<dyn Interceptor>>>,
    filter: Arc<dyn ExceptionFilter>,
}

impl<S> Service<Request<Body>> for InterceptorMiddleware<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let interceptors = self.interceptors.clone();
        let filter = self.filter.clone();
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            // Innermost link: the wrapped route itself.
            let mut chain = Next::new(move |req| {
                Box::pin(async move {
                    match inner.call(req).await {
                        Ok(response) => Ok(response),
                        Err(never) => match never {},
                    }
                })
            });

            // Wrap in reverse so the first registered interceptor runs first.
            for i in (0..interceptors.len()).rev() {
                let interceptors_arc = interceptors.clone();
                let next_chain = chain;

                chain = Next::new(move |req| {
                    Box::pin(async move {
                        let interceptor = &interceptors_arc[i];
                        interceptor.intercept(req, next_chain).await
                    })
                });
            }

            let result: InterceptorResult = chain.run(request).await;
            Ok(result.unwrap_or_else(|error| filter.catch(error)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RestfulError;
    use crate::exception::http::HttpExceptionFilter;
    use async_trait::async_trait;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;
    use std::sync::Mutex;
    use tower::{ServiceExt, service_fn};

    struct Recorder {
        label: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Interceptor for Recorder {
        async fn intercept(&self, request: Request<Body>, next: Next) -> InterceptorResult {
            self.seen.lock().unwrap().push(self.label);
            let mut response = next.run(request).await?;
            response
                .headers_mut()
                .append("x-trail", HeaderValue::from_static(self.label));
            Ok(response)
        }
    }

    struct Deny;

    #[async_trait]
    impl Interceptor for Deny {
        async fn intercept(&self, _request: Request<Body>, _next: Next) -> InterceptorResult {
            Err(RestfulError::http(StatusCode::FORBIDDEN, "denied"))
        }
    }

    fn ok(_req: Request<Body>) -> std::future::Ready<Result<Response, Infallible>> {
        std::future::ready(Ok("ok".into_response()))
    }

    #[tokio::test]
    async fn test_interceptors_run_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let layer = InterceptorLayer::new(
            vec![
                Box::new(Recorder {
                    label: "outer",
                    seen: seen.clone(),
                }),
                Box::new(Recorder {
                    label: "inner",
                    seen: seen.clone(),
                }),
            ],
            Arc::new(HttpExceptionFilter::default()),
        );

        let response = layer
            .layer(service_fn(ok))
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["outer", "inner"]);
        let trail: Vec<_> = response.headers().get_all("x-trail").iter().collect();
        assert_eq!(trail, vec!["inner", "outer"]);
    }

    #[tokio::test]
    async fn test_interceptor_error_goes_through_filter() {
        let layer = InterceptorLayer::new(
            vec![Box::new(Deny)],
            Arc::new(HttpExceptionFilter::default()),
        );
        let response = layer
            .layer(service_fn(ok))
            .oneshot(Request::new(Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
