//! Minimal HTTP/1.x request parser and response serializer
//!
//! Only what a static file server needs: request line, headers, and
//! `Connection: close` responses with a full body.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use nom::{
    bytes::complete::{tag, take_till, take_till1, take_while1},
    character::complete::{char, space0},
    multi::many0,
    sequence::{terminated, tuple},
    IResult,
};

/// Maximum size of the request line plus headers (8 KiB)
pub const MAX_HEADER_SIZE: usize = 8 * 1024;

/// Request method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// HEAD
    Head,
    /// Anything else, kept verbatim
    Other(String),
}

impl Method {
    fn from_bytes(raw: &[u8]) -> Self {
        match raw {
            b"GET" => Method::Get,
            b"HEAD" => Method::Head,
            other => Method::Other(String::from_utf8_lossy(other).into_owned()),
        }
    }
}

/// Parsed request head
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Decoded path, query and fragment stripped
    pub path: String,
    /// Protocol version, e.g. `1.1`
    pub version: String,
    /// Header name/value pairs in arrival order
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// First header value matching `name`, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parse a request head from the front of `buf`
    ///
    /// Returns `Ok(None)` while the blank line ending the head has not
    /// arrived yet. On success the head is consumed from `buf`.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<Request>, String> {
        let end = match find_head_end(buf) {
            Some(end) => end,
            None if buf.len() > MAX_HEADER_SIZE => {
                return Err("request head too large".to_string())
            }
            None => return Ok(None),
        };
        if end > MAX_HEADER_SIZE {
            return Err("request head too large".to_string());
        }

        let head = buf.split_to(end);
        let (_, ((method, target, version), header_lines)) =
            tuple((request_line, terminated(many0(header), crlf)))(&head[..])
                .map_err(|e| format!("malformed request: {:?}", e.map(|e| e.code)))?;

        let path = decode_path(target)?;

        let headers = header_lines
            .into_iter()
            .map(|(name, value)| {
                (
                    String::from_utf8_lossy(name).into_owned(),
                    String::from_utf8_lossy(value).trim().to_string(),
                )
            })
            .collect();

        Ok(Some(Request {
            method: Method::from_bytes(method),
            path,
            version: String::from_utf8_lossy(version).into_owned(),
            headers,
        }))
    }
}

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 408 Request Timeout
    RequestTimeout,
    /// 500 Internal Server Error
    InternalError,
}

impl Status {
    /// Numeric status code
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::RequestTimeout => 408,
            Status::InternalError => 500,
        }
    }

    /// Reason phrase
    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::RequestTimeout => "Request Timeout",
            Status::InternalError => "Internal Server Error",
        }
    }
}

/// Full response, always sent with `Connection: close`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status line
    pub status: Status,
    /// Content-Type header
    pub content_type: String,
    /// Body bytes
    pub body: Vec<u8>,
    /// Omit the body but keep its Content-Length (HEAD)
    pub head_only: bool,
}

impl Response {
    /// Response with an arbitrary status and body
    pub fn new(status: Status, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
            head_only: false,
        }
    }

    /// 200 with the given payload
    pub fn ok(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self::new(Status::Ok, content_type, body)
    }

    /// Plain-text error page
    pub fn error(status: Status) -> Self {
        let body = format!("{} {}\n", status.code(), status.reason()).into_bytes();
        Self::new(status, "text/plain", body)
    }

    /// Drop the body on the wire
    pub fn without_body(mut self) -> Self {
        self.head_only = true;
        self
    }

    /// Serialize with the current time in the Date header
    pub fn serialize(&self) -> Bytes {
        self.serialize_at(Utc::now())
    }

    /// Serialize with an explicit Date header value
    pub fn serialize_at(&self, now: DateTime<Utc>) -> Bytes {
        let head = format!(
            "HTTP/1.1 {} {}\r\n\
             Date: {}\r\n\
             Connection: close\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             \r\n",
            self.status.code(),
            self.status.reason(),
            now.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.content_type,
            self.body.len(),
        );

        let body_len = if self.head_only { 0 } else { self.body.len() };
        let mut out = BytesMut::with_capacity(head.len() + body_len);
        out.put_slice(head.as_bytes());
        if !self.head_only {
            out.put_slice(&self.body);
        }
        out.freeze()
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

fn crlf(input: &[u8]) -> IResult<&[u8], &[u8]> {
    tag("\r\n")(input)
}

fn is_token(c: u8) -> bool {
    c.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&c)
}

/// `METHOD SP target SP HTTP/version CRLF`
fn request_line(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8], &[u8])> {
    let (input, (method, _, target, _, _, version, _)) = tuple((
        take_while1(is_token),
        char(' '),
        take_till1(|c: u8| c == b' ' || c == b'\r'),
        char(' '),
        tag("HTTP/"),
        take_while1(|c: u8| c.is_ascii_digit() || c == b'.'),
        crlf,
    ))(input)?;

    Ok((input, (method, target, version)))
}

/// `name: value CRLF`
fn header(input: &[u8]) -> IResult<&[u8], (&[u8], &[u8])> {
    let (input, (name, _, _, value, _)) = tuple((
        take_while1(is_token),
        char(':'),
        space0,
        take_till(|c: u8| c == b'\r' || c == b'\n'),
        crlf,
    ))(input)?;

    Ok((input, (name, value)))
}

fn decode_path(target: &[u8]) -> Result<String, String> {
    let end = target
        .iter()
        .position(|&c| c == b'?' || c == b'#')
        .unwrap_or(target.len());
    let raw = &target[..end];

    if raw.first() != Some(&b'/') {
        return Err("request target must be an absolute path".to_string());
    }

    let mut decoded = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hex = raw
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| "bad percent-encoding in path".to_string())?;
            decoded.push(hex);
            i += 3;
        } else {
            decoded.push(raw[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).map_err(|_| "path is not valid UTF-8".to_string())
}
