//! Handshake wire logic shared by clients and listeners.
//!
//! Two families: the native hello (`hackvr-hello` command lines, server
//! greets first) and the HTTP/1.1 Upgrade exchange. Both read
//! byte-by-byte through the buffered stream so anything received past
//! the terminator stays queued for the command parser.
//!
//! Every protocol violation here is a [`NetError::Handshake`]; a
//! deadline expiry is [`NetError::Timeout`]. Both are fatal to the
//! connection and only to it.

use std::time::Duration;

use hackvr_proto::{
    codec::{self, MAX_LINE_LENGTH},
    value::{SessionToken, Version},
};
use url::Url;

use crate::{
    deadline::Deadline,
    error::NetError,
    stream::{NetStream, Received},
};

/// Command name opening every native-dialect connection.
pub const HELLO_COMMAND: &str = "hackvr-hello";

/// Default bound on reading a peer's hello or upgrade head.
pub const DEFAULT_HELLO_TIMEOUT: Duration = Duration::from_millis(500);

/// Upper bound on an HTTP Upgrade header block.
const MAX_HEADER_BLOCK: usize = MAX_LINE_LENGTH * 8;

/// Fields of a received client hello.
#[derive(Debug, Clone)]
pub(crate) struct ClientHello {
    /// World URL, fragment stripped.
    pub(crate) source_url: Url,
    /// Session token, when the client presented one.
    pub(crate) session_token: Option<SessionToken>,
}

/// Fields of a received HTTP Upgrade request.
#[derive(Debug, Clone)]
pub(crate) struct UpgradeRequest {
    /// `Host` header value.
    pub(crate) host: String,
    /// Request path including any query.
    pub(crate) path: String,
    /// `HackVr-Session` token, when present.
    pub(crate) session_token: Option<SessionToken>,
}

/// Send a hello line. Clients pass the world URI (and optionally a
/// session token); servers pass neither.
pub(crate) fn send_hello(
    stream: &mut NetStream,
    uri: Option<&str>,
    session_token: Option<&SessionToken>,
) -> Result<(), NetError> {
    let mut params = vec![Version::V1.to_string()];
    if let Some(uri) = uri {
        params.push(uri.to_string());
    }
    if let Some(token) = session_token {
        params.push(token.to_string());
    }
    let bytes = codec::encode(HELLO_COMMAND, &params)?;
    stream.send(&bytes)
}

/// Read and validate the server's hello: exactly `hackvr-hello TAB
/// version`.
pub(crate) fn receive_server_hello(
    stream: &mut NetStream,
    deadline: Deadline,
) -> Result<Version, NetError> {
    let parts = receive_command(stream, deadline)?;
    if parts[0] != HELLO_COMMAND {
        return Err(NetError::Handshake("expected hackvr-hello from server".to_string()));
    }
    if parts.len() != 2 {
        return Err(NetError::Handshake("server hello must include version".to_string()));
    }
    parts[1]
        .parse()
        .map_err(|error| NetError::Handshake(format!("bad server hello version: {error}")))
}

/// Read and validate a client's hello: `hackvr-hello TAB version TAB uri
/// [TAB token]`.
pub(crate) fn receive_client_hello(
    stream: &mut NetStream,
    deadline: Deadline,
) -> Result<ClientHello, NetError> {
    let parts = receive_command(stream, deadline)?;
    if parts[0] != HELLO_COMMAND {
        return Err(NetError::Handshake("expected hackvr-hello from client".to_string()));
    }
    if parts.len() != 3 && parts.len() != 4 {
        return Err(NetError::Handshake(
            "client hello must include version and uri".to_string(),
        ));
    }
    parts[1]
        .parse::<Version>()
        .map_err(|error| NetError::Handshake(format!("bad client hello version: {error}")))?;
    let uri: hackvr_proto::value::Uri = parts[2]
        .parse()
        .map_err(|error| NetError::Handshake(format!("bad client hello uri: {error}")))?;
    let mut source_url = Url::parse(uri.as_str())
        .map_err(|error| NetError::Handshake(format!("bad client hello uri: {error}")))?;
    source_url.set_fragment(None);

    let session_token = if parts.len() == 4 {
        Some(
            parts[3]
                .parse()
                .map_err(|error| NetError::Handshake(format!("bad session token: {error}")))?,
        )
    } else {
        None
    };
    Ok(ClientHello { source_url, session_token })
}

/// Read one command line and split it into validated fields.
fn receive_command(stream: &mut NetStream, deadline: Deadline) -> Result<Vec<String>, NetError> {
    let line = receive_line(stream, deadline)?;
    let parts: Vec<String> = line.split('\t').map(str::to_string).collect();
    if !codec::is_valid_name(&parts[0]) {
        return Err(NetError::Handshake("invalid command name".to_string()));
    }
    if !parts[1..].iter().all(|param| codec::is_valid_param(param)) {
        return Err(NetError::Handshake("invalid command parameter".to_string()));
    }
    Ok(parts)
}

/// Read one CRLF-terminated line, byte by byte, bounded by the frame
/// limit.
fn receive_line(stream: &mut NetStream, deadline: Deadline) -> Result<String, NetError> {
    let mut buffer: Vec<u8> = Vec::new();
    loop {
        deadline.check()?;
        match stream.recv(1, deadline)? {
            Received::Pending => continue,
            Received::Closed => {
                return Err(NetError::Handshake(
                    "connection closed during handshake".to_string(),
                ));
            }
            Received::Data(chunk) => {
                buffer.extend_from_slice(&chunk);
                if buffer.len() > MAX_LINE_LENGTH {
                    return Err(NetError::Handshake(
                        "handshake line exceeds maximum length".to_string(),
                    ));
                }
                if buffer.ends_with(b"\r\n") {
                    buffer.truncate(buffer.len() - 2);
                    if buffer.contains(&b'\r') {
                        return Err(NetError::Handshake(
                            "invalid CR in handshake line".to_string(),
                        ));
                    }
                    let line = String::from_utf8(buffer).map_err(|_| {
                        NetError::Handshake("invalid UTF-8 in handshake line".to_string())
                    })?;
                    if line.is_empty() {
                        return Err(NetError::Handshake("empty handshake line".to_string()));
                    }
                    return Ok(line);
                }
            }
        }
    }
}

/// Send the client side of the HTTP Upgrade exchange.
pub(crate) fn send_upgrade_request(
    stream: &mut NetStream,
    host: &str,
    port: u16,
    path: &str,
    session_token: Option<&SessionToken>,
) -> Result<(), NetError> {
    let host_header =
        if port == 80 || port == 443 { host.to_string() } else { format!("{host}:{port}") };
    let mut request = format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host_header}\r\n\
         Connection: upgrade\r\n\
         Upgrade: hackvr\r\n\
         HackVr-Version: v1\r\n"
    );
    if let Some(token) = session_token {
        request.push_str(&format!("HackVr-Session: {token}\r\n"));
    }
    request.push_str("\r\n");
    stream.send(request.as_bytes())
}

/// Send the `101 Switching Protocols` response.
pub(crate) fn send_upgrade_response(stream: &mut NetStream) -> Result<(), NetError> {
    stream.send(
        b"HTTP/1.1 101 Switching Protocols\r\n\
          Connection: upgrade\r\n\
          Upgrade: hackvr\r\n\
          HackVr-Version: v1\r\n\
          \r\n",
    )
}

/// Read and validate an HTTP Upgrade request head.
pub(crate) fn receive_upgrade_request(
    stream: &mut NetStream,
    deadline: Deadline,
) -> Result<UpgradeRequest, NetError> {
    let data = read_header_block(stream, deadline)?;
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut request = httparse::Request::new(&mut headers);
    let status = request
        .parse(&data)
        .map_err(|error| NetError::Handshake(format!("malformed http request: {error}")))?;
    if status.is_partial() {
        return Err(NetError::Handshake("truncated http request".to_string()));
    }

    let method = request.method.unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        return Err(NetError::Handshake("expected GET request".to_string()));
    }
    let path = request
        .path
        .ok_or_else(|| NetError::Handshake("malformed http request".to_string()))?
        .to_string();

    require_upgrade_headers(request.headers)?;
    let host = find_header(request.headers, "host")
        .ok_or_else(|| NetError::Handshake("missing Host header".to_string()))?;

    let session_token = match find_header(request.headers, "hackvr-session") {
        Some(value) => Some(
            value
                .parse()
                .map_err(|error| NetError::Handshake(format!("bad session token: {error}")))?,
        ),
        None => None,
    };

    Ok(UpgradeRequest { host, path, session_token })
}

/// Read and validate the `101 Switching Protocols` response head.
pub(crate) fn receive_upgrade_response(
    stream: &mut NetStream,
    deadline: Deadline,
) -> Result<(), NetError> {
    let data = read_header_block(stream, deadline)?;
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut response = httparse::Response::new(&mut headers);
    let status = response
        .parse(&data)
        .map_err(|error| NetError::Handshake(format!("malformed http response: {error}")))?;
    if status.is_partial() {
        return Err(NetError::Handshake("truncated http response".to_string()));
    }
    if response.code != Some(101) {
        let code = response.code.map_or_else(String::new, |code| code.to_string());
        return Err(NetError::Handshake(format!("unexpected http status {code}")));
    }
    require_upgrade_headers(response.headers)
}

/// `Upgrade: hackvr` (case-insensitive equality) and `Connection:
/// upgrade` (case-insensitive containment) are required in both
/// directions.
fn require_upgrade_headers(headers: &[httparse::Header<'_>]) -> Result<(), NetError> {
    let upgrade = find_header(headers, "upgrade")
        .ok_or_else(|| NetError::Handshake("missing Upgrade: hackvr header".to_string()))?;
    if !upgrade.eq_ignore_ascii_case("hackvr") {
        return Err(NetError::Handshake("missing Upgrade: hackvr header".to_string()));
    }
    let connection = find_header(headers, "connection")
        .ok_or_else(|| NetError::Handshake("missing Connection: upgrade header".to_string()))?;
    if !connection.to_ascii_lowercase().contains("upgrade") {
        return Err(NetError::Handshake("missing Connection: upgrade header".to_string()));
    }
    Ok(())
}

/// First header with a case-insensitive name match, value decoded
/// latin-1 and trimmed.
fn find_header(headers: &[httparse::Header<'_>], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(name))
        .map(|header| latin1(header.value).trim().to_string())
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Read byte-by-byte until the blank line ending the header block.
fn read_header_block(stream: &mut NetStream, deadline: Deadline) -> Result<Vec<u8>, NetError> {
    let mut buffer: Vec<u8> = Vec::new();
    loop {
        deadline.check()?;
        match stream.recv(1, deadline)? {
            Received::Pending => continue,
            Received::Closed => {
                return Err(NetError::Handshake(
                    "connection closed during http handshake".to_string(),
                ));
            }
            Received::Data(chunk) => {
                buffer.extend_from_slice(&chunk);
                if buffer.ends_with(b"\r\n\r\n") {
                    return Ok(buffer);
                }
                if buffer.len() > MAX_HEADER_BLOCK {
                    return Err(NetError::Handshake("http headers too large".to_string()));
                }
            }
        }
    }
}
