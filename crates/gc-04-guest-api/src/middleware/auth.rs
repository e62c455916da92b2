//! Bearer authentication middleware.
//!
//! Resolves the caller from `Authorization: Bearer <token>` and stores the
//! [`Identity`] in the request extensions. Handlers read it back with
//! `Extension<Identity>`. Requests that fail never reach a handler.

use crate::domain::error::ApiError;
use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request},
    response::{IntoResponse, Response},
};
use gc_01_bearer_auth::{AuthError, BearerAuthApi};
use shared_types::{Identity, IdentityCache, IdentityType};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::debug;

/// Identity type accepted on the guest channel.
pub const GUEST_IDENTITY_TYPE: IdentityType = IdentityType::DevLxdBearer;

/// Authentication layer
#[derive(Clone)]
pub struct BearerAuthLayer {
    authenticator: Arc<dyn BearerAuthApi>,
    identities: Arc<dyn IdentityCache>,
    expected_type: IdentityType,
}

impl BearerAuthLayer {
    pub fn new(authenticator: Arc<dyn BearerAuthApi>, identities: Arc<dyn IdentityCache>) -> Self {
        Self {
            authenticator,
            identities,
            expected_type: GUEST_IDENTITY_TYPE,
        }
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            authenticator: Arc::clone(&self.authenticator),
            identities: Arc::clone(&self.identities),
            expected_type: self.expected_type,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct BearerAuthService<S> {
    inner: S,
    authenticator: Arc<dyn BearerAuthApi>,
    identities: Arc<dyn IdentityCache>,
    expected_type: IdentityType,
}

impl<S> BearerAuthService<S> {
    fn authenticate<B>(&self, req: &Request<B>) -> Result<Identity, ApiError> {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::Unauthenticated)?;

        let candidate = self
            .authenticator
            .is_candidate(header)
            .ok_or(AuthError::Unauthenticated)?;

        let identity = self.authenticator.authenticate(
            &candidate.token,
            &candidate.subject,
            self.identities.as_ref(),
            self.expected_type,
        )?;
        Ok(identity)
    }
}

impl<S> Service<Request<Body>> for BearerAuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        match self.authenticate(&req) {
            Ok(identity) => {
                debug!(
                    caller = %identity.identifier,
                    method = %req.method(),
                    path = req.uri().path(),
                    "Authenticated guest request"
                );
                req.extensions_mut().insert(identity);

                // The clone may not be ready; keep the one poll_ready was called on.
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(async move { inner.call(req).await })
            }
            Err(err) => {
                let response = err.into_response();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
