//! # Operation Wait Flows
//!
//! Host-side operations completing while a guest long-polls on them.

#[cfg(test)]
mod tests {
    use crate::fixtures::{guest_identity, guest_token, Deployment};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use shared_types::{Operation, OperationStatus};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_guest_sees_completion_and_nothing_else() {
        let deployment = Arc::new(Deployment::new());
        let token = guest_token(&guest_identity("svc-1"), None);

        let mut operation = Operation::new_task("Creating custom volume");
        operation
            .resources
            .insert("storage_volumes".into(), vec!["/1.0/storage-pools/default/volumes/custom/vol-a".into()]);
        operation.metadata = json!({"secret_path": "/var/lib/host"});
        let id = deployment.operations.create(operation);

        let operations = Arc::clone(&deployment.operations);
        let finisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            operations
                .update_status(id, OperationStatus::Running, "")
                .unwrap();
            operations
                .update_status(id, OperationStatus::Failure, "pool is out of space")
                .unwrap();
        });

        let uri = format!("/1.0/operations/{id}/wait?timeout=-1");
        let (status, _, body) = deployment
            .request(Some(&token), Method::GET, &uri, None, None)
            .await;
        finisher.await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["metadata"],
            json!({
                "id": id.to_string(),
                "status": "Failure",
                "status_code": 400,
                "err": "pool is out of space"
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_running_operation() {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);
        let id = deployment.operations.create(Operation::new_task("Long copy"));
        deployment
            .operations
            .update_status(id, OperationStatus::Running, "")
            .unwrap();

        let uri = format!("/1.0/operations/{id}/wait?timeout=2");
        let (status, _, body) = deployment
            .request(Some(&token), Method::GET, &uri, None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["status"], "Running");
        assert_eq!(body["metadata"]["status_code"], 103);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);

        let uri = format!("/1.0/operations/{}/wait?timeout=1", Uuid::new_v4());
        let (status, _, _) = deployment
            .request(Some(&token), Method::GET, &uri, None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, body) = deployment
            .request(Some(&token), Method::GET, "/1.0/operations/42/wait", None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], 400);
    }
}
