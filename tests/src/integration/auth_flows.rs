//! # Authentication Flows
//!
//! Tokens issued by `TokenCodec` against identities in the cache, checked
//! end to end by the guest API's bearer layer.

#[cfg(test)]
mod tests {
    use crate::fixtures::{guest_identity, guest_token, Deployment, CLUSTER};
    use axum::http::{Method, StatusCode};
    use chrono::{Duration, Utc};
    use gc_01_bearer_auth::{TokenCodec, TokenScope};
    use shared_crypto::{generate_salt, SALT_LEN};
    use shared_types::{Identity, IdentityType};

    const VM1: &str = "/1.0/instances/vm1";

    async fn status(deployment: &Deployment, token: Option<&str>) -> StatusCode {
        deployment
            .request(token, Method::GET, VM1, None, None)
            .await
            .0
    }

    #[tokio::test]
    async fn test_salted_token_authenticates_with_derived_key() {
        let deployment = Deployment::new();
        let salt = generate_salt();
        assert_eq!(salt.len(), SALT_LEN);

        let token = guest_token(&guest_identity("svc-1"), Some(salt.as_slice()));
        assert_eq!(status(&deployment, Some(&token)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let deployment = Deployment::new();
        assert_eq!(status(&deployment, None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(&deployment, Some("not-a-jwt")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_token_for_another_cluster_is_not_a_candidate() {
        let deployment = Deployment::new();
        let svc1 = guest_identity("svc-1");
        let token = TokenCodec::issue(
            &svc1.secret,
            None,
            "svc-1",
            "cluster-7",
            TokenScope::DevLxd,
            Utc::now() + Duration::hours(1),
        )
        .unwrap();
        assert_eq!(status(&deployment, Some(&token)).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_is_forbidden() {
        let deployment = Deployment::new();
        let svc1 = guest_identity("svc-1");
        let issued = Utc::now() - Duration::hours(2);
        let token = TokenCodec::issue_at(
            issued,
            &svc1.secret,
            None,
            "svc-1",
            CLUSTER,
            TokenScope::DevLxd,
            issued + Duration::minutes(30),
        )
        .unwrap();
        assert_eq!(status(&deployment, Some(&token)).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_administrative_identity_is_forbidden_on_guest_channel() {
        let deployment = Deployment::new();
        let admin = Identity::new("ops", IdentityType::Bearer, b"ops-secret".to_vec());
        deployment.identities.insert(admin.clone());

        let token = guest_token(&admin, None);
        assert_eq!(status(&deployment, Some(&token)).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_revoked_identity_is_unauthenticated() {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);
        assert_eq!(status(&deployment, Some(&token)).await, StatusCode::OK);

        deployment
            .identities
            .remove(IdentityType::DevLxdBearer.authentication_method(), "svc-1");
        assert_eq!(status(&deployment, Some(&token)).await, StatusCode::UNAUTHORIZED);
    }
}
