//! # Device Ownership Flows
//!
//! Guest `svc-1` on `cluster-42` manages volumes on `vm1` through the HTTP
//! surface, under ETag concurrency, next to devices it does not own.

#[cfg(test)]
mod tests {
    use crate::fixtures::{guest_identity, guest_token, volume, Deployment};
    use axum::http::{Method, StatusCode};
    use gc_02_device_ownership::owner_key;
    use serde_json::json;

    const VM1: &str = "/1.0/instances/vm1";

    #[tokio::test]
    async fn test_add_volume_then_stale_etag_is_rejected() {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);

        // E0: nothing owned yet.
        let (status, e0, body) = deployment
            .request(Some(&token), Method::GET, VM1, None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["devices"], json!({}));
        let e0 = e0.expect("etag on GET");

        // PATCH with E0 adds vol-a.
        let add_a = json!({"devices": {"vol-a": volume("vol-a", "/mnt/a")}});
        let (status, _, body) = deployment
            .request(Some(&token), Method::PATCH, VM1, Some(&e0), Some(add_a))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"], json!({}));

        // E1 differs and the device is visible.
        let (_, e1, body) = deployment
            .request(Some(&token), Method::GET, VM1, None, None)
            .await;
        let e1 = e1.expect("etag on GET");
        assert_ne!(e0, e1);
        assert_eq!(body["metadata"]["devices"]["vol-a"]["source"], "vol-a");

        // Reusing E0 fails and changes nothing.
        let add_b = json!({"devices": {"vol-b": volume("vol-b", "/mnt/b")}});
        let (status, _, body) = deployment
            .request(Some(&token), Method::PATCH, VM1, Some(&e0), Some(add_b.clone()))
            .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["error_code"], 412);

        let stored = deployment.instances.get("vm1").expect("vm1 exists");
        assert!(!stored.devices.contains_key("vol-b"));
        assert_eq!(
            stored.config.get(&owner_key("vol-a")).map(String::as_str),
            Some("svc-1")
        );

        // Re-reading and retrying with E1 succeeds.
        let (status, e2, _) = deployment
            .request(Some(&token), Method::PATCH, VM1, Some(&e1), Some(add_b))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(e2.expect("etag on PATCH"), e1);
    }

    #[tokio::test]
    async fn test_foreign_devices_are_invisible_and_untouchable() {
        let deployment = Deployment::new();
        let svc2 = guest_identity("svc-2");
        deployment.identities.insert(svc2.clone());

        let svc1_token = guest_token(&guest_identity("svc-1"), None);
        let svc2_token = guest_token(&svc2, None);

        let add_a = json!({"devices": {"vol-a": volume("vol-a", "/mnt/a")}});
        let (status, _, _) = deployment
            .request(Some(&svc1_token), Method::PATCH, VM1, None, Some(add_a))
            .await;
        assert_eq!(status, StatusCode::OK);

        // svc-2 does not see vol-a, and its ETag is unaffected by it.
        let (_, svc2_etag, body) = deployment
            .request(Some(&svc2_token), Method::GET, VM1, None, None)
            .await;
        assert_eq!(body["metadata"]["devices"], json!({}));

        // Overwriting svc-1's device is forbidden.
        let steal = json!({"devices": {"vol-a": volume("other", "/mnt/x")}});
        let (status, _, _) = deployment
            .request(Some(&svc2_token), Method::PATCH, VM1, svc2_etag.as_deref(), Some(steal))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Removing it is a no-op.
        let remove = json!({"devices": {"vol-a": null}});
        let (status, _, _) = deployment
            .request(Some(&svc2_token), Method::PATCH, VM1, None, Some(remove))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(deployment
            .instances
            .get("vm1")
            .expect("vm1 exists")
            .devices
            .contains_key("vol-a"));
    }

    #[tokio::test]
    async fn test_owner_can_remove_its_device() {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);

        let add = json!({"devices": {"vol-a": volume("vol-a", "/mnt/a")}});
        deployment
            .request(Some(&token), Method::PATCH, VM1, None, Some(add))
            .await;

        let remove = json!({"devices": {"vol-a": null}});
        let (status, _, _) = deployment
            .request(Some(&token), Method::PATCH, VM1, None, Some(remove))
            .await;
        assert_eq!(status, StatusCode::OK);

        let stored = deployment.instances.get("vm1").expect("vm1 exists");
        assert!(!stored.devices.contains_key("vol-a"));
        assert!(!stored.config.contains_key(&owner_key("vol-a")));
    }

    #[tokio::test]
    async fn test_empty_device_name_is_rejected() {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);

        let nameless = json!({"devices": {"": volume("vol-a", "/mnt/a")}});
        let (status, _, body) = deployment
            .request(Some(&token), Method::PATCH, VM1, None, Some(nameless))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], 400);

        let stored = deployment.instances.get("vm1").expect("vm1 exists");
        assert!(!stored.devices.contains_key(""));
        assert!(!stored.config.contains_key(&owner_key("")));
    }

    #[tokio::test]
    async fn test_non_volume_device_is_forbidden() {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);

        let nic = json!({"devices": {"eth1": {"type": "nic", "network": "lxdbr0"}}});
        let (status, _, body) = deployment
            .request(Some(&token), Method::PATCH, VM1, None, Some(nic))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["type"], "error");
    }
}
