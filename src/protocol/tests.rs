use super::command::Command;
use super::handler::{Inbound, Step, dispatch, run_session};
use super::reply;
use crate::broker::engine::lock;
use crate::broker::message::{Grant, SubscribeOutcome, UnsubscribeOutcome};
use crate::broker::{Broker, SharedBroker};
use crate::session::Session;
use crate::utils::{BrokerError, TransportError};
use futures_util::stream;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// The client side of an in-memory connection.
struct Peer {
    to_server: UnboundedSender<Inbound>,
    from_server: UnboundedReceiver<String>,
    worker: JoinHandle<Result<(), TransportError>>,
}

impl Peer {
    fn open(broker: &SharedBroker) -> Self {
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Inbound>();
        let (out_tx, out_rx) = mpsc::unbounded_channel::<String>();
        let inbound = Box::pin(stream::unfold(in_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        }));
        let worker = tokio::spawn(run_session(broker.clone(), inbound, out_tx));
        Self {
            to_server: in_tx,
            from_server: out_rx,
            worker,
        }
    }

    /// Open a connection and complete the handshake.
    async fn connect(broker: &SharedBroker) -> Self {
        let mut peer = Self::open(broker);
        assert_eq!(peer.recv().await, "CONN_ACK");
        peer.send("CONN_ACK accepted by client");
        // a reply proves the session is registered
        assert_eq!(peer.request("/LIST").await, "Subscribed to 0 topics. ");
        peer
    }

    fn send(&self, text: &str) {
        self.to_server.send(Ok(text.to_string())).unwrap();
    }

    async fn recv(&mut self) -> String {
        timeout(Duration::from_secs(2), self.from_server.recv())
            .await
            .expect("timed out waiting for the server")
            .expect("server closed the connection")
    }

    async fn request(&mut self, text: &str) -> String {
        self.send(text);
        self.recv().await
    }

    async fn finish(self) -> Result<(), TransportError> {
        timeout(Duration::from_secs(2), self.worker)
            .await
            .expect("worker did not finish")
            .expect("worker panicked")
    }
}

fn shared() -> SharedBroker {
    Broker::new().into_shared()
}

#[test]
fn test_parse_subscribe_and_unsubscribe() {
    assert_eq!(
        Command::parse("/SUB WEATHER").unwrap(),
        Command::Subscribe {
            pattern: "WEATHER".into()
        }
    );
    assert_eq!(
        Command::parse("/UNSUB WEATHER/#").unwrap(),
        Command::Unsubscribe {
            pattern: "WEATHER/#".into()
        }
    );
}

#[test]
fn test_parse_subscribe_requires_exactly_one_argument() {
    assert_eq!(
        Command::parse("/SUB").unwrap_err(),
        BrokerError::InvalidSyntax("/SUB <TOPIC>")
    );
    assert_eq!(
        Command::parse("/SUB A B").unwrap_err(),
        BrokerError::InvalidSyntax("/SUB <TOPIC>")
    );
    assert_eq!(
        Command::parse("/UNSUB").unwrap_err(),
        BrokerError::InvalidSyntax("/UNSUB <TOPIC>")
    );
}

#[test]
fn test_parse_publish_keeps_body_verbatim() {
    assert_eq!(
        Command::parse("/PUB NEWS  big   news today").unwrap(),
        Command::Publish {
            pattern: "NEWS".into(),
            body: "big   news today".into()
        }
    );
}

#[test]
fn test_parse_pubr_is_not_pub() {
    assert_eq!(
        Command::parse("/PUBR WEATHER Storm warning").unwrap(),
        Command::PublishRetain {
            pattern: "WEATHER".into(),
            body: "Storm warning".into()
        }
    );
}

#[test]
fn test_parse_publish_without_body() {
    assert_eq!(
        Command::parse("/PUB NEWS").unwrap_err(),
        BrokerError::InvalidSyntax("/PUB <TOPIC> <MESSAGE>")
    );
    assert_eq!(
        Command::parse("/PUBR").unwrap_err(),
        BrokerError::InvalidSyntax("/PUBR <TOPIC> <MESSAGE>")
    );
}

#[test]
fn test_parse_disconnect_anywhere() {
    assert_eq!(Command::parse("/DISC").unwrap(), Command::Disconnect);
    assert_eq!(
        Command::parse("please /DISC now").unwrap(),
        Command::Disconnect
    );
}

#[test]
fn test_parse_list_and_unknown() {
    assert_eq!(Command::parse("/LIST").unwrap(), Command::List);
    assert_eq!(
        Command::parse("/LIST extra").unwrap_err(),
        BrokerError::InvalidSyntax("/LIST")
    );
    assert_eq!(Command::parse("hello").unwrap(), Command::Unknown);
    assert_eq!(Command::parse("").unwrap(), Command::Unknown);
    assert_eq!(Command::parse("/sub lower").unwrap(), Command::Unknown);
}

#[test]
fn test_reply_rendering() {
    let single = SubscribeOutcome::Subscribed(Grant {
        topic: "WEATHER".into(),
        retained: Some("Storm warning".into()),
    });
    assert_eq!(
        reply::subscribed(&single),
        "Subscribed to [WEATHER] Storm warning"
    );

    let expanded = SubscribeOutcome::Expanded(vec![
        Grant {
            topic: "A/B".into(),
            retained: None,
        },
        Grant {
            topic: "A/C".into(),
            retained: Some("kept".into()),
        },
    ]);
    assert_eq!(
        reply::subscribed(&expanded),
        "Subscribed to: \n[A/B] \n[A/C] kept"
    );

    assert_eq!(
        reply::unsubscribed(&UnsubscribeOutcome::Expanded(vec![
            "A/B".into(),
            "A/C".into()
        ])),
        "Unsubscribed from: A/B, A/C"
    );
    assert_eq!(
        reply::listed(&["NEWS".to_string(), "WEATHER".to_string()]),
        "Subscribed to 2 topics. NEWS, WEATHER"
    );
}

#[test]
fn test_dispatch_turns_errors_into_replies() {
    let broker = shared();
    let (tx, _rx) = mpsc::unbounded_channel::<String>();
    lock(&broker).register_session(Session::with_id("s1", tx));

    assert_eq!(
        dispatch(&broker, "s1", "/PUB NEWS hi"),
        Step::Reply("You are not subscribed to this topic.".into())
    );
    assert_eq!(
        dispatch(&broker, "s1", "/PUB NOWHERE hi"),
        Step::Reply("Invalid topic.".into())
    );
    assert_eq!(
        dispatch(&broker, "s1", "/SUB A+B+C"),
        Step::Reply("Cannot create topic with +, # symbol.".into())
    );
    assert_eq!(
        dispatch(&broker, "s1", "/SUB NOTHING/#"),
        Step::Reply("No topic matches for NOTHING/#.".into())
    );
    assert_eq!(
        dispatch(&broker, "s1", "/SUB"),
        Step::Reply("Invalid syntax: /SUB <TOPIC>".into())
    );
    assert_eq!(
        dispatch(&broker, "s1", "bogus"),
        Step::Reply("Invalid command".into())
    );
}

#[test]
fn test_dispatch_publish_is_silent_and_disconnect_flags_session() {
    let broker = shared();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    lock(&broker).register_session(Session::with_id("s1", tx));

    dispatch(&broker, "s1", "/SUB NEWS");
    assert_eq!(dispatch(&broker, "s1", "/PUB NEWS hi"), Step::Silent);
    assert_eq!(rx.try_recv().unwrap(), "[NEWS]: hi");

    assert_eq!(dispatch(&broker, "s1", "/DISC"), Step::Disconnect);
    assert!(lock(&broker).sessions().get("s1").unwrap().is_disconnecting());
}

#[tokio::test]
async fn test_weather_scenario() {
    let broker = shared();
    let mut s1 = Peer::connect(&broker).await;

    assert_eq!(s1.request("/SUB WEATHER").await, "Subscribed to [WEATHER] ");
    s1.send("/PUBR WEATHER Storm warning");
    assert_eq!(s1.recv().await, "[WEATHER]: Storm warning");

    let mut s2 = Peer::connect(&broker).await;
    assert_eq!(
        s2.request("/SUB WEATHER").await,
        "Subscribed to [WEATHER] Storm warning"
    );
}

#[tokio::test]
async fn test_already_subscribed_reply() {
    let broker = shared();
    let mut s1 = Peer::connect(&broker).await;

    s1.request("/SUB NEWS").await;
    assert_eq!(
        s1.request("/SUB NEWS").await,
        "You are already subscribed to this topic!"
    );
    assert_eq!(s1.request("/LIST").await, "Subscribed to 1 topics. NEWS");
}

#[tokio::test]
async fn test_publish_authorization_and_fan_out() {
    let broker = shared();
    let mut s1 = Peer::connect(&broker).await;
    let mut s2 = Peer::connect(&broker).await;
    let mut s3 = Peer::connect(&broker).await;

    assert_eq!(
        s1.request("/PUB NEWS hello").await,
        "You are not subscribed to this topic."
    );

    s1.request("/SUB NEWS").await;
    s2.request("/SUB NEWS").await;
    s3.request("/SUB HEALTH").await;

    s1.send("/PUB NEWS hello");
    assert_eq!(s1.recv().await, "[NEWS]: hello");
    assert_eq!(s2.recv().await, "[NEWS]: hello");

    // s3 only sees its own reply, not the NEWS broadcast
    assert_eq!(s3.request("/LIST").await, "Subscribed to 1 topics. HEALTH");
}

#[tokio::test]
async fn test_wildcard_round_trip_over_protocol() {
    let broker = shared();
    let mut s1 = Peer::connect(&broker).await;

    assert_eq!(
        s1.request("/SUB WEATHER/+/NINE").await,
        "Subscribed to: \n[WEATHER/MINNESOTA/NINE] \n[WEATHER/WISCONSIN/NINE] "
    );
    assert_eq!(
        s1.request("/UNSUB WEATHER/#").await,
        "Unsubscribed from: WEATHER/MINNESOTA/NINE, WEATHER/WISCONSIN/NINE"
    );
    assert_eq!(
        s1.request("/UNSUB WEATHER").await,
        "You are not subscribed to this topic."
    );
}

#[tokio::test]
async fn test_graceful_disconnect_cleans_up() {
    let broker = shared();
    let mut s1 = Peer::connect(&broker).await;
    let mut s2 = Peer::connect(&broker).await;
    s1.request("/SUB NEWS").await;
    s2.request("/SUB NEWS").await;

    assert_eq!(s2.request("/DISC").await, "DISC_ACK");
    s2.send("DISC_ACK accepted by client");

    let Peer {
        from_server: mut s2_rx,
        worker,
        to_server: _s2_tx,
    } = s2;
    timeout(Duration::from_secs(2), worker)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(lock(&broker).sessions().len(), 1);

    s1.send("/PUB NEWS anyone?");
    assert_eq!(s1.recv().await, "[NEWS]: anyone?");
    // transport closed, nothing more arrives
    assert!(s2_rx.recv().await.is_none());
}

#[tokio::test]
async fn test_abrupt_close_removes_session() {
    let broker = shared();
    let s1 = Peer::connect(&broker).await;
    assert_eq!(lock(&broker).sessions().len(), 1);

    let Peer {
        to_server,
        from_server: _rx,
        worker,
    } = s1;
    drop(to_server);

    let result = timeout(Duration::from_secs(2), worker).await.unwrap().unwrap();
    assert!(matches!(result, Err(TransportError::Closed)));
    assert!(lock(&broker).sessions().is_empty());
}

#[tokio::test]
async fn test_transport_error_removes_session() {
    let broker = shared();
    let mut s1 = Peer::connect(&broker).await;
    s1.request("/SUB NEWS").await;

    s1.to_server.send(Err(TransportError::InvalidUtf8)).unwrap();
    let result = s1.finish().await;
    assert!(matches!(result, Err(TransportError::InvalidUtf8)));
    assert!(lock(&broker).sessions().is_empty());
}

#[tokio::test]
async fn test_missing_handshake_ack_never_registers() {
    let broker = shared();
    let mut peer = Peer::open(&broker);
    assert_eq!(peer.recv().await, "CONN_ACK");

    let Peer {
        to_server, worker, ..
    } = peer;
    drop(to_server);

    let result = timeout(Duration::from_secs(2), worker).await.unwrap().unwrap();
    assert!(matches!(result, Err(TransportError::Closed)));
    assert!(lock(&broker).sessions().is_empty());
}

#[tokio::test]
async fn test_empty_handshake_ack_is_rejected() {
    let broker = shared();
    let mut peer = Peer::open(&broker);
    assert_eq!(peer.recv().await, "CONN_ACK");
    peer.send("");

    let result = peer.finish().await;
    assert!(matches!(result, Err(TransportError::HandshakeRejected)));
    assert!(lock(&broker).sessions().is_empty());
}

#[tokio::test]
async fn test_whitespace_handshake_ack_is_accepted() {
    let broker = shared();
    let mut peer = Peer::open(&broker);
    assert_eq!(peer.recv().await, "CONN_ACK");
    peer.send(" ");

    assert_eq!(peer.request("/LIST").await, "Subscribed to 0 topics. ");
    assert_eq!(lock(&broker).sessions().len(), 1);
}

#[tokio::test]
async fn test_invalid_command_reply() {
    let broker = shared();
    let mut s1 = Peer::connect(&broker).await;
    assert_eq!(s1.request("hello there").await, "Invalid command");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subscribers_create_one_topic() {
    let broker = shared();
    let before = lock(&broker).topics().len();

    let mut peers = Vec::new();
    for _ in 0..16 {
        peers.push(Peer::connect(&broker).await);
    }
    for peer in &peers {
        peer.send("/SUB SPORTS");
    }
    for peer in &mut peers {
        assert_eq!(peer.recv().await, "Subscribed to [SPORTS] ");
    }

    let broker = lock(&broker);
    assert_eq!(broker.topics().len(), before + 1);
    assert_eq!(broker.sessions().len(), 16);
}
