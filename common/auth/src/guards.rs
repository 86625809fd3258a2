use std::convert::Infallible;
use std::task::{Context, Poll};

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::gate::AuthGate;

/// Wraps a route so its handler only runs for requests the gate authorizes.
///
/// On success the verified [`crate::TokenPayload`] is stored in the request
/// extensions (read it with [`crate::Authorized`]); on failure the
/// [`crate::AuthError`] is rendered and the inner service is never called.
#[derive(Clone)]
pub struct RequireAuthLayer {
    gate: AuthGate,
    permission: &'static str,
}

impl RequireAuthLayer {
    pub fn new(gate: AuthGate, permission: &'static str) -> Self {
        Self { gate, permission }
    }
}

impl<S> Layer<S> for RequireAuthLayer {
    type Service = RequireAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireAuth {
            inner,
            gate: self.gate.clone(),
            permission: self.permission,
        }
    }
}

#[derive(Clone)]
pub struct RequireAuth<S> {
    inner: S,
    gate: AuthGate,
    permission: &'static str,
}

impl<S> Service<Request> for RequireAuth<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // The clone in `self` may not be ready; take the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let gate = self.gate.clone();
        let permission = self.permission;

        Box::pin(async move {
            let decision = gate.authorize(req.headers(), permission).await;
            match decision {
                Ok(payload) => {
                    req.extensions_mut().insert(payload);
                    inner.call(req).await
                }
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}
