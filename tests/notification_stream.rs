use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};

use staffline::notify::{
    Notification, NotificationStream, ReconnectPolicy, StreamConfig, StreamState, SubscriberKey,
    TcpLineTransport,
};

// ── Test infrastructure ──────────────────────────────────────

/// Server side of one accepted client connection.
struct Peer {
    handshake: String,
    lines: mpsc::UnboundedSender<String>,
}

/// Line server that reports every accepted client. Dropping a `Peer` hangs up.
async fn start_test_server() -> (SocketAddr, mpsc::UnboundedReceiver<Peer>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (peers_tx, peers_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let peers_tx = peers_tx.clone();
            tokio::spawn(async move {
                let mut framed = Framed::new(socket, LinesCodec::new());
                let Some(Ok(handshake)) = framed.next().await else {
                    return;
                };
                let (tx, mut rx) = mpsc::unbounded_channel::<String>();
                if peers_tx.send(Peer { handshake, lines: tx }).is_err() {
                    return;
                }
                while let Some(line) = rx.recv().await {
                    if framed.send(line).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    (addr, peers_rx)
}

fn fast_config(max_attempts: u32) -> StreamConfig {
    StreamConfig {
        reconnect: ReconnectPolicy {
            max_attempts,
            base_delay: Duration::from_millis(20),
        },
    }
}

fn stream_to(addr: SocketAddr, config: StreamConfig) -> NotificationStream {
    let transport = TcpLineTransport::new(addr.to_string(), "/api/v1/notifications/ws");
    NotificationStream::spawn(transport, config)
}

fn forward(stream: &NotificationStream, id: &str) -> mpsc::UnboundedReceiver<Notification> {
    let (tx, rx) = mpsc::unbounded_channel();
    stream.add_listener(id, move |n: &Notification| {
        let _ = tx.send(n.clone());
    });
    rx
}

async fn next_peer(peers: &mut mpsc::UnboundedReceiver<Peer>) -> Peer {
    tokio::time::timeout(Duration::from_secs(5), peers.recv())
        .await
        .expect("no client connected")
        .expect("server stopped")
}

async fn recv_notification(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Option<Notification> {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .ok()
        .flatten()
}

async fn wait_for_state(stream: &NotificationStream, pred: impl Fn(&StreamState) -> bool) {
    let mut rx = stream.subscribe_state();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| pred(s)))
        .await
        .expect("state not reached")
        .expect("stream task gone");
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn handshake_carries_subscriber_key() {
    let (addr, mut peers) = start_test_server().await;
    let stream = stream_to(addr, fast_config(5));
    stream.connect(SubscriberKey::new("17").unwrap()).unwrap();

    let peer = next_peer(&mut peers).await;
    assert_eq!(peer.handshake, "GET /api/v1/notifications/ws?user_id=17");
    wait_for_state(&stream, |s| matches!(s, StreamState::Connected { .. })).await;
}

#[tokio::test]
async fn lines_fan_out_and_bad_lines_are_skipped() {
    let (addr, mut peers) = start_test_server().await;
    let stream = stream_to(addr, fast_config(5));
    let mut page = forward(&stream, "page");
    let mut badge = forward(&stream, "badge");
    stream.connect(SubscriberKey::new("manager").unwrap()).unwrap();

    let peer = next_peer(&mut peers).await;
    peer.lines.send("not json at all".into()).unwrap();
    peer.lines.send(String::new()).unwrap();
    peer.lines
        .send(
            r#"{"type":"assign_alert","assignment_id":4,"employee_id":17,"employee_name":"Lin","project_name":"Dam","region":"West"}"#
                .into(),
        )
        .unwrap();

    let n = recv_notification(&mut page).await.expect("page got nothing");
    assert!(matches!(n, Notification::AssignAlert(ref a) if a.employee_id == 17));
    let n2 = recv_notification(&mut badge).await.expect("badge got nothing");
    assert_eq!(n, n2);
    assert!(matches!(stream.state(), StreamState::Connected { .. }));
}

#[tokio::test]
async fn reconnects_after_server_hangs_up() {
    let (addr, mut peers) = start_test_server().await;
    let stream = stream_to(addr, fast_config(5));
    let mut rx = forward(&stream, "page");
    stream.connect(SubscriberKey::new("17").unwrap()).unwrap();

    let first = next_peer(&mut peers).await;
    drop(first);

    let second = next_peer(&mut peers).await;
    assert_eq!(second.handshake, "GET /api/v1/notifications/ws?user_id=17");
    second
        .lines
        .send(r#"{"type":"reminder","assignment_id":8,"employee_id":3,"project_id":1,"days_before":2}"#.into())
        .unwrap();
    let n = recv_notification(&mut rx).await.expect("expected reminder");
    assert!(matches!(n, Notification::Reminder(ref r) if r.days_before == 2));
}

#[tokio::test]
async fn unreachable_endpoint_gives_up() {
    // Grab a free port and release it so nothing listens there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let stream = stream_to(addr, fast_config(2));
    stream.connect(SubscriberKey::new("17").unwrap()).unwrap();
    wait_for_state(&stream, |s| matches!(s, StreamState::Exhausted { .. })).await;

    stream.disconnect().unwrap();
    wait_for_state(&stream, |s| *s == StreamState::Disconnected).await;
}

#[tokio::test]
async fn switching_subscriber_opens_new_connection() {
    let (addr, mut peers) = start_test_server().await;
    let stream = stream_to(addr, fast_config(5));
    let mut rx = forward(&stream, "page");

    stream.connect(SubscriberKey::new("alice").unwrap()).unwrap();
    let alice = next_peer(&mut peers).await;
    wait_for_state(&stream, |s| matches!(s, StreamState::Connected { .. })).await;

    stream.connect(SubscriberKey::new("bob").unwrap()).unwrap();
    let bob = next_peer(&mut peers).await;
    assert!(bob.handshake.ends_with("user_id=bob"));

    // Alice's server side may still accept the write, but the client no longer reads it.
    let _ = alice.lines.send(r#"{"type":"system","message":"for alice"}"#.into());
    bob.lines
        .send(r#"{"type":"system","message":"for bob"}"#.into())
        .unwrap();
    let n = recv_notification(&mut rx).await.expect("expected bob's message");
    assert_eq!(n.summary(), "for bob");
}
