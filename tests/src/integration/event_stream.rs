//! # Event Stream
//!
//! A guest connects to `/1.0/events` over a real socket. Host frames pushed
//! into the shared transport come out as text frames, filtered by type.

#[cfg(test)]
mod tests {
    use crate::fixtures::{config, guest_identity, guest_token, Deployment, EVENT_TARGET};
    use futures::StreamExt;
    use gc_04_guest_api::GuestApiService;
    use serde_json::Value;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::http::HeaderValue;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

    struct Server {
        addr: SocketAddr,
        stop: oneshot::Sender<()>,
        handle: JoinHandle<std::io::Result<()>>,
    }

    async fn start(deployment: &Deployment) -> anyhow::Result<Server> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (stop, stopped) = oneshot::channel::<()>();

        let service = GuestApiService::new(config(), deployment.state.clone());
        let handle = tokio::spawn(service.serve(listener, async move {
            let _ = stopped.await;
        }));
        Ok(Server { addr, stop, handle })
    }

    async fn connect(addr: SocketAddr, query: &str, token: &str) -> anyhow::Result<Client> {
        let mut request = format!("ws://{addr}/1.0/events{query}").into_client_request()?;
        request
            .headers_mut()
            .insert("Authorization", HeaderValue::from_str(&format!("Bearer {token}"))?);
        let (client, _) = connect_async(request).await?;
        Ok(client)
    }

    async fn next_event(client: &mut Client) -> anyhow::Result<Value> {
        loop {
            let message = timeout(Duration::from_secs(5), client.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("stream ended"))??;
            match message {
                Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
                Message::Ping(_) | Message::Pong(_) => continue,
                other => anyhow::bail!("unexpected message {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_filtered_events_reach_guest() -> anyhow::Result<()> {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);
        let server = start(&deployment).await?;

        let mut client = connect(server.addr, "?type=config", &token).await?;
        assert_eq!(deployment.transport.connect_count(), 1);

        assert!(deployment
            .transport
            .push_frame(EVENT_TARGET, r#"{"type":"device","metadata":{"name":"vol-a"}}"#));
        assert!(deployment
            .transport
            .push_frame(EVENT_TARGET, r#"{"type":"config","metadata":{"key":"user.x"}}"#));

        let event = next_event(&mut client).await?;
        assert_eq!(event["type"], "config");
        assert_eq!(event["metadata"]["key"], "user.x");

        drop(client);
        let _ = server.stop.send(());
        server.handle.await??;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_guest_stream_keeps_host_order() -> anyhow::Result<()> {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);
        let server = start(&deployment).await?;

        let mut client = connect(server.addr, "", &token).await?;
        for seq in 0..200 {
            deployment.transport.push_frame(
                EVENT_TARGET,
                format!(r#"{{"type":"logging","metadata":{{"seq":{seq}}}}}"#),
            );
        }

        for expected in 0..200u64 {
            let event = next_event(&mut client).await?;
            assert_eq!(event["metadata"]["seq"], expected);
        }

        drop(client);
        let _ = server.stop.send(());
        server.handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_two_guests_share_one_host_connection() -> anyhow::Result<()> {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);
        let server = start(&deployment).await?;

        let mut first = connect(server.addr, "", &token).await?;
        let mut second = connect(server.addr, "", &token).await?;
        assert_eq!(deployment.transport.connect_count(), 1);
        assert_eq!(deployment.state.hub.listener_count(EVENT_TARGET), 2);

        deployment
            .transport
            .push_frame(EVENT_TARGET, r#"{"type":"logging","metadata":{"message":"hi"}}"#);
        assert_eq!(next_event(&mut first).await?["type"], "logging");
        assert_eq!(next_event(&mut second).await?["type"], "logging");

        drop(first);
        drop(second);
        let _ = server.stop.send(());
        server.handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_host_failure_closes_stream() -> anyhow::Result<()> {
        let deployment = Deployment::new();
        let token = guest_token(&guest_identity("svc-1"), None);
        let server = start(&deployment).await?;

        let mut client = connect(server.addr, "", &token).await?;
        assert!(deployment.transport.push_error(EVENT_TARGET, "host went away"));

        let ended = timeout(Duration::from_secs(5), async {
            loop {
                match client.next().await {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await;
        assert!(ended.is_ok(), "stream should close after host failure");

        drop(client);
        let _ = server.stop.send(());
        server.handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_before_upgrade() -> anyhow::Result<()> {
        let deployment = Deployment::new();
        deployment
            .transport
            .refuse_connects(Some("connection refused".into()));
        let token = guest_token(&guest_identity("svc-1"), None);
        let server = start(&deployment).await?;

        assert!(connect(server.addr, "", &token).await.is_err());

        let _ = server.stop.send(());
        server.handle.await??;
        Ok(())
    }

    #[tokio::test]
    async fn test_unauthenticated_upgrade_is_refused() -> anyhow::Result<()> {
        let deployment = Deployment::new();
        let server = start(&deployment).await?;

        let request = format!("ws://{}/1.0/events", server.addr).into_client_request()?;
        assert!(connect_async(request).await.is_err());

        let _ = server.stop.send(());
        server.handle.await??;
        Ok(())
    }
}
