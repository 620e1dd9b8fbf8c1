pub mod server;
pub use server::*;

pub mod request;
pub use request::*;

pub mod response;
pub use response::*;

pub mod client;
pub use client::*;

use crate::errors::{Error, Result};
use std::io::{BufReader, Read};

/// Start line, headers and length of the head of an HTTP message
pub(crate) struct Head<T> {
    pub start: T,
    pub headers: Vec<(String, String)>,
    /// Number of bytes taken by the head, body excluded
    pub len: usize,
}

/// Copy the headers parsed by httparse out of the read buffer
pub(crate) fn collect_headers(headers: &[httparse::Header]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect()
}

/// Value of the Content-Length header, 0 if absent or invalid
fn content_length(headers: &[(String, String)]) -> usize {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0)
}

/// Read an HTTP message from a byte stream, requests and responses alike.
///
/// Bytes are accumulated until `parse_head` recognizes a complete head, then the body is read
/// according to Content-Length. Anything received past the body is dropped, which is fine as
/// long as clients wait for a response before sending their next request.
pub(crate) fn read_message<R, T, F>(mut reader: BufReader<R>, parse_head: F) -> Result<(Head<T>, String)>
where
    R: Read,
    F: Fn(&[u8]) -> Result<Option<Head<T>>>,
{
    let mut buf = [0; 4096];
    let mut data = Vec::new();

    let head = loop {
        let bytes_read = reader.read(&mut buf)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        data.extend_from_slice(&buf[..bytes_read]);

        if let Some(head) = parse_head(&data)? {
            break head;
        }
    };

    let body_len = content_length(&head.headers);
    while data.len() - head.len < body_len {
        let bytes_read = reader.read(&mut buf)?;
        if bytes_read == 0 {
            return Err(Error::ConnectionReset);
        }
        data.extend_from_slice(&buf[..bytes_read]);
    }

    let body = String::from_utf8_lossy(&data[head.len..head.len + body_len]).to_string();
    Ok((head, body))
}
