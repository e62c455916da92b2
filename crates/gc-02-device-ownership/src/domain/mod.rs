//! # Domain Layer
//!
//! Ownership bookkeeping, ETags, access validators and the authorizer.
//! Pure: nothing here touches the backend.

pub mod authorizer;
pub mod errors;
pub mod etag;
pub mod ownership;
pub mod validator;
