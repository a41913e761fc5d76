use bytes::{BufMut, Bytes, BytesMut};
use futures_util::StreamExt;
use qrflash::artifact::RenderStrategy;
use qrflash::subscriber::protocol::{
    BrokerCodec, DATA_TYPE_JSON, DATA_TYPE_STRING, OP_SUB, PUSH_TYPE_PUBSUB, STATUS_ERR,
    STATUS_OK, TYPE_PUSH, TYPE_REQUEST, TYPE_RESPONSE,
};
use qrflash::subscriber::{Subscriber, SubscriberError};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;

mod helpers;
use helpers::{frame, push_payload, send_frame, setup_engine, setup_picky_engine, CHANNEL};

/// Accepts one client and checks its first frame is a subscribe to `CHANNEL`.
/// Returns the write half for the test to push frames on, plus the request id.
async fn accept_subscriber(listener: &TcpListener) -> (TcpStream, u32) {
    let (socket, _) = listener.accept().await.expect("accept");
    let (reader, writer) = socket.into_split();
    let mut frames = FramedRead::new(reader, BrokerCodec::new());

    let request = frames.next().await.expect("subscribe frame").expect("valid frame");
    assert_eq!(request.header.frame_type, TYPE_REQUEST);
    assert_eq!(request.header.meta, OP_SUB);
    assert_eq!(&request.payload[4..], CHANNEL.as_bytes());

    let socket = frames.into_inner().reunite(writer).expect("same socket");
    (socket, request.header.id())
}

#[cfg(test)]
mod subscriber_tests {
    use super::*;

    #[tokio::test]
    async fn test_push_on_channel_lands_in_slot() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let engine = setup_engine(RenderStrategy::Lazy);

        let subscriber = Subscriber::new(addr, CHANNEL);
        let slots = engine.slots.clone();
        let client = tokio::spawn(async move { subscriber.run(slots).await });

        let (mut broker, id) = accept_subscriber(&listener).await;
        send_frame(&mut broker, frame(TYPE_RESPONSE, STATUS_OK, id, &[])).await;

        // Ignored: other topic, then a non UTF-8 body.
        let other = push_payload("other/topic", DATA_TYPE_STRING, b"nope");
        send_frame(&mut broker, frame(TYPE_PUSH, PUSH_TYPE_PUBSUB, 0, &other)).await;
        let garbage = push_payload(CHANNEL, DATA_TYPE_STRING, &[0xff, 0xfe]);
        send_frame(&mut broker, frame(TYPE_PUSH, PUSH_TYPE_PUBSUB, 0, &garbage)).await;

        let first = push_payload(CHANNEL, DATA_TYPE_STRING, b"order-122");
        send_frame(&mut broker, frame(TYPE_PUSH, PUSH_TYPE_PUBSUB, 0, &first)).await;
        let second = push_payload(CHANNEL, DATA_TYPE_JSON, b"\"order-123\"");
        send_frame(&mut broker, frame(TYPE_PUSH, PUSH_TYPE_PUBSUB, 0, &second)).await;
        drop(broker);

        let result = client.await.expect("subscriber task");
        assert!(matches!(result, Err(SubscriberError::Disconnected)));

        assert_eq!(engine.slots.payload(), Some(Bytes::from("order-123")));
        assert_eq!(engine.slots.slot().generation().0, 2);
    }

    #[tokio::test]
    async fn test_rejected_payload_does_not_stop_subscription() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let engine = setup_picky_engine(RenderStrategy::Lazy);

        let subscriber = Subscriber::new(addr, CHANNEL);
        let slots = engine.slots.clone();
        let client = tokio::spawn(async move { subscriber.run(slots).await });

        let (mut broker, _) = accept_subscriber(&listener).await;
        let bad = push_payload(CHANNEL, DATA_TYPE_STRING, "∅invalid∅".as_bytes());
        send_frame(&mut broker, frame(TYPE_PUSH, PUSH_TYPE_PUBSUB, 0, &bad)).await;
        let good = push_payload(CHANNEL, DATA_TYPE_STRING, b"valid");
        send_frame(&mut broker, frame(TYPE_PUSH, PUSH_TYPE_PUBSUB, 0, &good)).await;
        drop(broker);

        assert!(matches!(client.await.unwrap(), Err(SubscriberError::Disconnected)));
        assert_eq!(engine.slots.payload(), Some(Bytes::from("valid")));
    }

    #[tokio::test]
    async fn test_subscribe_error_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let engine = setup_engine(RenderStrategy::Lazy);

        let subscriber = Subscriber::new(addr, CHANNEL);
        let slots = engine.slots.clone();
        let client = tokio::spawn(async move { subscriber.run(slots).await });

        let (mut broker, id) = accept_subscriber(&listener).await;
        let mut err = BytesMut::new();
        err.put_u32(9);
        err.put_slice(b"forbidden");
        send_frame(&mut broker, frame(TYPE_RESPONSE, STATUS_ERR, id, &err)).await;

        match client.await.unwrap() {
            Err(SubscriberError::Rejected(msg)) => assert_eq!(msg, "forbidden"),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(!engine.slots.is_available());
    }

    #[tokio::test]
    async fn test_connect_failure_is_an_io_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let engine = setup_engine(RenderStrategy::Lazy);
        let result = Subscriber::new(addr, CHANNEL).run(engine.slots.clone()).await;
        assert!(matches!(result, Err(SubscriberError::Io(_))));
    }
}
