//! Real sockets on the loopback interface

use dtc_link::{
    bind_udp, listen_captures, spawn_telemetry_listener, CancelToken, CaptureEvent, CommandSink,
    Link, LinkSettings, TcpCommandSink, TelemetryCache, TransportError,
};
use dtc_script::{CommandEnvelope, ScriptBuilder};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};

async fn wait_for_frame(cache: &TelemetryCache) -> u64 {
    for _ in 0..200 {
        if let Some(seq) = cache.last_seq() {
            return seq;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no telemetry frame arrived");
}

#[tokio::test]
async fn command_sink_writes_json_lines() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let mut received = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            received.push(CommandEnvelope::from_line(&line).unwrap());
        }
        received
    });

    let sent = vec![
        CommandEnvelope::Invoke {
            device: 17,
            action: 3003,
            value: 1.0,
            delay: 100,
        },
        CommandEnvelope::Wait { ms: 250 },
    ];
    let mut sink = TcpCommandSink::connect(&addr, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(sink.addr(), addr);
    for envelope in &sent {
        sink.send(envelope).await.unwrap();
    }
    drop(sink);

    assert_eq!(server.await.unwrap(), sent);
}

#[tokio::test]
async fn connect_to_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let err = TcpCommandSink::connect(&addr, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TransportError::Connect { .. } | TransportError::ConnectTimeout { .. }
    ));
}

#[tokio::test]
async fn telemetry_listener_fills_the_cache_and_skips_garbage() {
    let socket = bind_udp("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let cache = Arc::new(TelemetryCache::new());
    let handle = spawn_telemetry_listener(socket, Arc::clone(&cache));

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(b"not json", addr).await.unwrap();
    sender
        .send_to(br#"{"seq":7,"state":{"IsCockpitPowered":"true"}}"#, addr)
        .await
        .unwrap();

    assert_eq!(wait_for_frame(&cache).await, 7);
    let sample = cache.sample().unwrap();
    assert_eq!(sample.get("IsCockpitPowered"), Some("true"));
    handle.abort();
}

#[tokio::test]
async fn captures_are_forwarded() {
    let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let settings = LinkSettings {
        capture_port: port,
        ..LinkSettings::default()
    };
    let (mut rx, handle) = listen_captures(&settings, 4).await.unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .send_to(
            br#"{"lat":36.2,"lon":-115.03,"elev":1870.0}"#,
            ("127.0.0.1", port),
        )
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        event,
        CaptureEvent {
            lat: 36.2,
            lon: -115.03,
            elev: 1870.0
        }
    );
    handle.abort();
}

#[tokio::test]
async fn connected_link_uploads_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let command_port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let mut count = 0;
        while lines.next_line().await.unwrap().is_some() {
            count += 1;
        }
        count
    });

    let settings = LinkSettings {
        host: "127.0.0.1".into(),
        command_port,
        telemetry_port: 0,
        ..LinkSettings::default()
    };
    let link = Link::connect(settings).await.unwrap();

    let mut b = ScriptBuilder::new();
    b.wait(1).call_function("FlashCaution", &["1"], None);
    let report = link.upload(&b.finish(), &CancelToken::new()).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.calls, 1);
    drop(link);

    assert_eq!(server.await.unwrap(), 1);
}

#[tokio::test]
async fn connected_link_waits_for_periodic_telemetry() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let command_port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        while lines.next_line().await.unwrap().is_some() {}
    });

    let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let telemetry_port = probe.local_addr().unwrap().port();
    drop(probe);

    let publisher = tokio::spawn(async move {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut interval = tokio::time::interval(Duration::from_millis(200));
        for seq in 1u64.. {
            interval.tick().await;
            let frame = format!(r#"{{"seq":{seq},"state":{{"IsCockpitPowered":"true"}}}}"#);
            let _ = socket.send_to(frame.as_bytes(), ("127.0.0.1", telemetry_port)).await;
        }
    });

    let settings = LinkSettings {
        host: "127.0.0.1".into(),
        command_port,
        telemetry_port,
        ..LinkSettings::default()
    };
    let link = Link::connect(settings).await.unwrap();

    let mut b = ScriptBuilder::new();
    b.if_block("IsCockpitPowered", "false", &[], |b| {
        b.abort("Cockpit is not powered");
        Ok::<_, dtc_script::ScriptError>(())
    })
    .unwrap();
    b.wait(1);
    let report = link.upload(&b.finish(), &CancelToken::new()).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.polls, 1);
    publisher.abort();
    drop(link);
    server.await.unwrap();
}
