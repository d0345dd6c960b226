//! Handshake tests over scripted in-memory transports.
//!
//! Both sides of all four dialects, with byte-exact assertions on what
//! goes over the wire.

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use hackvr_net::{
    Binding, Client, Deadline, Listener, NetError, NetStream, Protocol, Received,
    StreamConnector, Transport,
};
use hackvr_proto::{Parser, value::SessionToken};

/// Transport fed from a byte script, recording everything sent.
struct ScriptedTransport {
    incoming: VecDeque<Vec<u8>>,
    eof_after_script: bool,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl Transport for ScriptedTransport {
    fn recv_unbuffered(
        &mut self,
        max_len: usize,
        _deadline: Deadline,
    ) -> Result<Received, NetError> {
        match self.incoming.pop_front() {
            Some(mut data) => {
                if data.len() > max_len {
                    let rest = data.split_off(max_len);
                    self.incoming.push_front(rest);
                }
                Ok(Received::Data(data))
            }
            None if self.eof_after_script => Ok(Received::Closed),
            None => Ok(Received::Pending),
        }
    }

    fn send(&mut self, data: &[u8]) -> Result<(), NetError> {
        self.sent.lock().unwrap().extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) {}
}

fn scripted_stream(incoming: &[&[u8]]) -> (NetStream, Arc<Mutex<Vec<u8>>>) {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let transport = ScriptedTransport {
        incoming: incoming.iter().map(|chunk| chunk.to_vec()).collect(),
        eof_after_script: true,
        sent: Arc::clone(&sent),
    };
    (NetStream::new(Box::new(transport)), sent)
}

/// Connector handing out one prepared stream.
struct ScriptedConnector {
    stream: Option<NetStream>,
    raw_calls: Arc<Mutex<Vec<(String, u16)>>>,
    tls_calls: Arc<Mutex<Vec<(String, u16)>>>,
}

impl ScriptedConnector {
    fn new(stream: NetStream) -> Self {
        Self {
            stream: Some(stream),
            raw_calls: Arc::new(Mutex::new(Vec::new())),
            tls_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl StreamConnector for ScriptedConnector {
    fn connect_raw(&mut self, host: &str, port: u16) -> Result<NetStream, NetError> {
        self.raw_calls.lock().unwrap().push((host.to_string(), port));
        self.stream.take().ok_or(NetError::NotConnected)
    }

    fn connect_tls(
        &mut self,
        host: &str,
        port: u16,
        _config: Option<Arc<rustls::ClientConfig>>,
    ) -> Result<NetStream, NetError> {
        self.tls_calls.lock().unwrap().push((host.to_string(), port));
        self.stream.take().ok_or(NetError::NotConnected)
    }
}

/// Listener handing out one prepared stream.
struct ScriptedListener {
    stream: Option<NetStream>,
}

impl Listener for ScriptedListener {
    fn accept(
        &mut self,
        _deadline: Deadline,
    ) -> Result<Option<(NetStream, SocketAddr)>, NetError> {
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        Ok(self.stream.take().map(|stream| (stream, addr)))
    }

    fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Err(NetError::NotConnected)
    }

    fn close(&mut self) {}
}

fn test_token() -> SessionToken {
    SessionToken(std::array::from_fn(|index| index as u8))
}

#[test]
fn client_hello_handshake_exact_bytes() {
    let token = test_token();
    let (stream, sent) = scripted_stream(&[b"hackvr-hello\tv1\r\n"]);
    let connector = ScriptedConnector::new(stream);
    let raw_calls = Arc::clone(&connector.raw_calls);

    let mut client = Client::with_connector(Box::new(connector));
    let url = format!("hackvr://example.com/world#{token}");
    let connection = client.connect(&url, None).unwrap();

    assert_eq!(connection.source_url.as_str(), "hackvr://example.com/world");
    assert_eq!(connection.protocol, Protocol::Hackvr);
    assert!(!connection.is_secure);
    assert_eq!(connection.session_token, Some(token));

    let expected = format!("hackvr-hello\tv1\thackvr://example.com/world\t{token}\r\n");
    assert_eq!(*sent.lock().unwrap(), expected.into_bytes());
    assert_eq!(*raw_calls.lock().unwrap(), vec![("example.com".to_string(), 1913)]);
}

#[test]
fn server_hello_handshake_exact_bytes() {
    let token = test_token();
    let hello = format!("hackvr-hello\tv1\thackvr://example.com/world\t{token}\r\n");
    let (stream, sent) = scripted_stream(&[hello.as_bytes()]);

    let mut binding = Binding::with_listener(
        Protocol::Hackvr,
        Box::new(ScriptedListener { stream: Some(stream) }),
    );
    let (_stream, _addr, connection) = binding.accept(Deadline::INSTANT).unwrap().unwrap();

    assert_eq!(connection.source_url.as_str(), "hackvr://example.com/world");
    assert_eq!(connection.session_token, Some(token));
    assert_eq!(connection.protocol, Protocol::Hackvr);
    assert_eq!(*sent.lock().unwrap(), b"hackvr-hello\tv1\r\n");
}

#[test]
fn client_hello_without_token() {
    let (stream, sent) = scripted_stream(&[b"hackvr-hello\tv1\r\n"]);
    let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
    let connection = client.connect("hackvr://example.com/world", None).unwrap();
    assert_eq!(connection.session_token, None);
    assert_eq!(
        *sent.lock().unwrap(),
        b"hackvr-hello\tv1\thackvr://example.com/world\r\n"
    );
}

#[test]
fn bytes_past_the_hello_stay_buffered_for_the_parser() {
    // Server hello and a first command arrive in one segment.
    let (stream, _sent) = scripted_stream(&[b"hackvr-hello\tv1\r\nchat\tuser-1\thi\r\n"]);
    let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
    client.connect("hackvr://example.com/world", None).unwrap();

    let mut parser = Parser::new();
    match client.recv(4096, Deadline::INSTANT).unwrap() {
        Received::Data(data) => parser.push(&data),
        other => panic!("expected data, got {other:?}"),
    }
    let frame = parser.pull().unwrap();
    assert_eq!(frame.name, "chat");
    assert_eq!(frame.params, vec!["user-1".to_string(), "hi".to_string()]);
}

#[test]
fn fragment_and_parameter_tokens_must_agree() {
    let token = test_token();
    let other = SessionToken([0xFF; 32]);
    let (stream, _sent) = scripted_stream(&[b"hackvr-hello\tv1\r\n"]);
    let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
    let url = format!("hackvr://example.com/world#{token}");
    let error = client.connect(&url, Some(other)).unwrap_err();
    assert!(matches!(error, NetError::SessionTokenMismatch));
}

#[test]
fn matching_fragment_and_parameter_tokens_are_fine() {
    let token = test_token();
    let (stream, _sent) = scripted_stream(&[b"hackvr-hello\tv1\r\n"]);
    let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
    let url = format!("hackvr://example.com/world#{token}");
    let connection = client.connect(&url, Some(token)).unwrap();
    assert_eq!(connection.session_token, Some(token));
}

#[test]
fn unsupported_scheme_is_rejected() {
    let (stream, _sent) = scripted_stream(&[]);
    let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
    let error = client.connect("https://example.com/", None).unwrap_err();
    assert!(matches!(error, NetError::UnsupportedScheme(_)));
}

#[test]
fn malformed_server_hello_is_a_handshake_error() {
    for bad in [
        b"hackvr-hello\r\n".as_slice(),           // missing version
        b"hackvr-hello\tv1\textra\r\n".as_slice(), // too many fields
        b"hackvr-hullo\tv1\r\n".as_slice(),        // wrong command
        b"hackvr-hello\t1\r\n".as_slice(),         // bad version form
    ] {
        let (stream, _sent) = scripted_stream(&[bad]);
        let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
        let error = client.connect("hackvr://example.com/world", None).unwrap_err();
        assert!(matches!(error, NetError::Handshake(_)), "accepted {bad:?}");
    }
}

#[test]
fn malformed_client_hello_is_a_handshake_error() {
    for bad in [
        b"hackvr-hello\tv1\r\n".as_slice(),               // missing uri
        b"hackvr-hello\tv1\tnot a uri\r\n".as_slice(),    // invalid uri
        b"hackvr-hello\tv1\thackvr://h\tshort\r\n".as_slice(), // bad token
        b"chat\thi\r\n".as_slice(),                        // wrong command
    ] {
        let (stream, _sent) = scripted_stream(&[bad]);
        let mut binding = Binding::with_listener(
            Protocol::Hackvr,
            Box::new(ScriptedListener { stream: Some(stream) }),
        );
        let error = binding.accept(Deadline::INSTANT).unwrap_err();
        assert!(matches!(error, NetError::Handshake(_)), "accepted {bad:?}");
    }
}

#[test]
fn peer_close_during_hello_is_a_handshake_error() {
    let (stream, _sent) = scripted_stream(&[b"hackvr-hel"]);
    let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
    let error = client.connect("hackvr://example.com/world", None).unwrap_err();
    assert!(matches!(error, NetError::Handshake(_)));
}

#[test]
fn upgrade_request_exact_bytes() {
    let token = test_token();
    let response = b"HTTP/1.1 101 Switching Protocols\r\n\
                     Connection: upgrade\r\n\
                     Upgrade: hackvr\r\n\
                     HackVr-Version: v1\r\n\
                     \r\n";
    let (stream, sent) = scripted_stream(&[response]);
    let connector = ScriptedConnector::new(stream);
    let raw_calls = Arc::clone(&connector.raw_calls);
    let mut client = Client::with_connector(Box::new(connector));

    let url = format!("http+hackvr://example.com/world#{token}");
    let connection = client.connect(&url, None).unwrap();
    assert_eq!(connection.protocol, Protocol::HttpHackvr);
    assert!(!connection.is_secure);
    assert_eq!(connection.source_url.as_str(), "http+hackvr://example.com/world");

    let expected = format!(
        "GET /world HTTP/1.1\r\n\
         Host: example.com\r\n\
         Connection: upgrade\r\n\
         Upgrade: hackvr\r\n\
         HackVr-Version: v1\r\n\
         HackVr-Session: {token}\r\n\
         \r\n"
    );
    assert_eq!(*sent.lock().unwrap(), expected.into_bytes());
    // Default port 80 is used and elided from the Host header.
    assert_eq!(*raw_calls.lock().unwrap(), vec![("example.com".to_string(), 80)]);
}

#[test]
fn upgrade_request_with_explicit_port_keeps_it_in_host() {
    let response = b"HTTP/1.1 101 Switching Protocols\r\n\
                     connection: Upgrade, keep-alive\r\n\
                     UPGRADE: HackVR\r\n\
                     HackVr-Version: v1\r\n\
                     \r\n";
    let (stream, sent) = scripted_stream(&[response]);
    let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
    client.connect("http+hackvr://example.com:8080/", None).unwrap();
    let sent = sent.lock().unwrap();
    let text = String::from_utf8(sent.clone()).unwrap();
    assert!(text.starts_with("GET / HTTP/1.1\r\nHost: example.com:8080\r\n"), "{text}");
}

#[test]
fn upgrade_accept_exact_bytes() {
    let token = test_token();
    let request = format!(
        "GET /world HTTP/1.1\r\n\
         Host: example.com\r\n\
         Connection: upgrade\r\n\
         Upgrade: hackvr\r\n\
         HackVr-Version: v1\r\n\
         HackVr-Session: {token}\r\n\
         \r\n"
    );
    let (stream, sent) = scripted_stream(&[request.as_bytes()]);
    let mut binding = Binding::with_listener(
        Protocol::HttpHackvr,
        Box::new(ScriptedListener { stream: Some(stream) }),
    );
    let (_stream, _addr, connection) = binding.accept(Deadline::INSTANT).unwrap().unwrap();

    assert_eq!(connection.source_url.as_str(), "http+hackvr://example.com/world");
    assert_eq!(connection.session_token, Some(token));
    assert_eq!(connection.protocol, Protocol::HttpHackvr);

    let expected = b"HTTP/1.1 101 Switching Protocols\r\n\
                     Connection: upgrade\r\n\
                     Upgrade: hackvr\r\n\
                     HackVr-Version: v1\r\n\
                     \r\n";
    assert_eq!(*sent.lock().unwrap(), expected);
}

#[test]
fn upgrade_rejects_wrong_status_and_missing_headers() {
    let cases: [&[u8]; 3] = [
        b"HTTP/1.1 200 OK\r\nConnection: upgrade\r\nUpgrade: hackvr\r\n\r\n",
        b"HTTP/1.1 101 Switching Protocols\r\nConnection: upgrade\r\n\r\n",
        b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: hackvr\r\n\r\n",
    ];
    for bad in cases {
        let (stream, _sent) = scripted_stream(&[bad]);
        let mut client = Client::with_connector(Box::new(ScriptedConnector::new(stream)));
        let error = client.connect("http+hackvr://example.com/", None).unwrap_err();
        assert!(matches!(error, NetError::Handshake(_)), "accepted {bad:?}");
    }
}

#[test]
fn upgrade_accept_rejects_non_get_and_missing_host() {
    let cases: [&[u8]; 3] = [
        b"POST / HTTP/1.1\r\nHost: h\r\nConnection: upgrade\r\nUpgrade: hackvr\r\n\r\n",
        b"GET / HTTP/1.1\r\nConnection: upgrade\r\nUpgrade: hackvr\r\n\r\n",
        b"GET / HTTP/1.1\r\nHost: h\r\nConnection: keep-alive\r\nUpgrade: hackvr\r\n\r\n",
    ];
    for bad in cases {
        let (stream, _sent) = scripted_stream(&[bad]);
        let mut binding = Binding::with_listener(
            Protocol::HttpHackvr,
            Box::new(ScriptedListener { stream: Some(stream) }),
        );
        let error = binding.accept(Deadline::INSTANT).unwrap_err();
        assert!(matches!(error, NetError::Handshake(_)), "accepted {bad:?}");
    }
}

#[test]
fn hackvrs_uses_the_tls_connector() {
    let (stream, sent) = scripted_stream(&[b"hackvr-hello\tv1\r\n"]);
    let connector = ScriptedConnector::new(stream);
    let tls_calls = Arc::clone(&connector.tls_calls);
    let mut client = Client::with_connector(Box::new(connector));

    let connection = client.connect("hackvrs://secure.example/", None).unwrap();
    assert_eq!(connection.protocol, Protocol::Hackvrs);
    assert!(connection.is_secure);
    assert_eq!(*tls_calls.lock().unwrap(), vec![("secure.example".to_string(), 19133)]);
    assert_eq!(
        *sent.lock().unwrap(),
        b"hackvr-hello\tv1\thackvrs://secure.example/\r\n"
    );
}
