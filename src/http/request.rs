//! Request classification and protocol downgrade.
//!
//! # Responsibilities
//! - Rewrite `HTTP/1.1` to `HTTP/1.0` and `keep-alive` to `close` so the
//!   destination closes after a single response
//! - Extract the method from the request line
//! - Extract the destination from the CONNECT target or the `Host: ` header
//!
//! # Design Decisions
//! - Byte-level matching; the request is never decoded as a whole
//! - Substitutions are case-sensitive and apply anywhere in the buffer
//! - Only the first line and the first `Host: ` occurrence are consulted

use std::fmt;

use http::Method;

use crate::error::ClassifyError;

/// Port assumed when the `Host: ` header carries none.
pub const DEFAULT_HTTP_PORT: u16 = 80;

const HOST_HEADER: &[u8] = b"Host: ";
const CRLF: &[u8] = b"\r\n";

const DOWNGRADE_RULES: [(&[u8], &[u8]); 2] = [
    (b"HTTP/1.1", b"HTTP/1.0"),
    (b"keep-alive", b"close"),
];

const SUPPORTED_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
    Method::PATCH,
];

/// Where a client wants to go, derived once from its first request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub host: String,
    pub port: u16,
}

impl RequestDescriptor {
    /// CONNECT requests become tunnels; everything else is a single exchange.
    pub fn is_tunnel(&self) -> bool {
        self.method == Method::CONNECT
    }

    /// `host:port`, as used for logging and error messages.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.method, self.host, self.port)
    }
}

/// A classified request together with the bytes to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub descriptor: RequestDescriptor,
    /// The downgraded request. Not forwarded for CONNECT.
    pub payload: Vec<u8>,
}

/// Apply the HTTP/1.0 + `close` downgrade to a raw request.
///
/// Total and idempotent: the replacements never produce their own patterns.
pub fn downgrade(request: &[u8]) -> Vec<u8> {
    DOWNGRADE_RULES
        .iter()
        .fold(request.to_vec(), |buf, (from, to)| replace_all(&buf, from, to))
}

/// Classify the first request read from a client connection.
pub fn classify(raw: &[u8]) -> Result<ParsedRequest, ClassifyError> {
    if raw.is_empty() {
        return Err(ClassifyError::Empty);
    }

    let payload = downgrade(raw);

    let mut request_line = payload.split(|&b| b == b'\n').next().unwrap_or_default();
    if let [line @ .., b'\r'] = request_line {
        request_line = line;
    }

    let mut fields = request_line.split(|&b| b == b' ');
    let method = parse_method(fields.next().unwrap_or_default())?;

    let (host, port) = if method == Method::CONNECT {
        let target = fields
            .next()
            .filter(|target| !target.is_empty())
            .ok_or(ClassifyError::MissingConnectTarget)?;
        parse_connect_target(target)?
    } else {
        parse_host_header(&payload)?
    };

    Ok(ParsedRequest {
        descriptor: RequestDescriptor { method, host, port },
        payload,
    })
}

fn parse_method(token: &[u8]) -> Result<Method, ClassifyError> {
    SUPPORTED_METHODS
        .iter()
        .find(|method| method.as_str().as_bytes() == token)
        .cloned()
        .ok_or_else(|| {
            ClassifyError::UnsupportedMethod(String::from_utf8_lossy(token).into_owned())
        })
}

fn parse_connect_target(target: &[u8]) -> Result<(String, u16), ClassifyError> {
    let target = std::str::from_utf8(target).map_err(|_| ClassifyError::InvalidEncoding)?;
    let (host, port) = target
        .split_once(':')
        .ok_or(ClassifyError::MissingConnectTarget)?;

    Ok((non_empty_host(host)?, parse_port(port)?))
}

fn parse_host_header(request: &[u8]) -> Result<(String, u16), ClassifyError> {
    let start =
        find(request, HOST_HEADER).ok_or(ClassifyError::MissingHostHeader)? + HOST_HEADER.len();
    let len = find(&request[start..], CRLF).ok_or(ClassifyError::UnterminatedHostHeader)?;
    let value = std::str::from_utf8(&request[start..start + len])
        .map_err(|_| ClassifyError::InvalidEncoding)?;

    match value.rsplit_once(':') {
        Some((host, port)) => Ok((non_empty_host(host)?, parse_port(port)?)),
        None => Ok((non_empty_host(value)?, DEFAULT_HTTP_PORT)),
    }
}

fn non_empty_host(host: &str) -> Result<String, ClassifyError> {
    if host.is_empty() {
        Err(ClassifyError::EmptyHost)
    } else {
        Ok(host.to_string())
    }
}

fn parse_port(port: &str) -> Result<u16, ClassifyError> {
    port.parse::<u16>()
        .ok()
        .filter(|&port| port != 0)
        .ok_or_else(|| ClassifyError::InvalidPort(port.to_string()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(pos) = find(rest, needle) {
        out.extend_from_slice(&rest[..pos]);
        out.extend_from_slice(replacement);
        rest = &rest[pos + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}
