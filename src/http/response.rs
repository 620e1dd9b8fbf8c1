use std::io::{BufReader, Read};

use crate::api::ErrorBody;
use crate::errors::{Error, Result};
use crate::http::{collect_headers, read_message, Head};
use serde::Serialize;

/// An HTTP response to be sent to a client
#[derive(Debug)]
pub struct Response {
    /// Status code of the response. Optional because that's what httparse returns, but it
    /// shouldn't happen in practice since we control the responses.
    pub status: Option<u16>,
    /// Headers for the response. It is not necessary to add Content-Length to it, this is done
    /// automatically on serialization.
    pub headers: Vec<(String, String)>,
    /// Body of the response. Give an empty string for an empty body
    pub body: String,
}

impl Response {
    /// Creates an empty OK response (204)
    pub fn ok() -> Response {
        Response {
            status: Some(204),
            headers: vec![],
            body: "".to_string(),
        }
    }

    /// Creates an OK (200) response with the given body
    pub fn ok_with_body(str: String) -> Response {
        Response {
            status: Some(200),
            headers: vec![],
            body: str,
        }
    }

    /// Creates a response with the given status and a JSON body
    pub fn json<T: Serialize>(status: u16, body: &T) -> Result<Response> {
        Ok(Response {
            status: Some(status),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_string(body)?,
        })
    }

    /// Creates an error response with the given body.
    ///
    /// The code must be in the 4xx or 5xx range.
    pub fn error(code: u16, message: &str) -> Response {
        assert!((400..600).contains(&code), "Invalid error code");
        let body = ErrorBody {
            error: message.to_string(),
        };
        Response {
            status: Some(code),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: serde_json::to_string(&body).unwrap_or_default(),
        }
    }

    /// Turns an error into a response.
    ///
    /// Client errors carry their message. Server errors are only described in the logs, the
    /// client gets a generic message.
    pub fn from_error(err: &Error) -> Response {
        let code = err.status_code();
        if code >= 500 {
            tracing::error!(error = %err, "Request failed");
            Self::internal_server_error()
        } else {
            tracing::debug!(error = %err, code, "Request rejected");
            Self::error(code, &err.to_string())
        }
    }

    /// Creates an Internal Server Error (500) response.
    pub fn internal_server_error() -> Response {
        Self::error(500, "Internal server error")
    }
}

/// Parse an HTTP response from a byte stream
pub fn parse_response<T>(buf_reader: BufReader<T>) -> Result<Response>
where
    T: Read,
{
    let (head, body) = read_message(buf_reader, |data| {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut resp = httparse::Response::new(&mut headers);
        match resp.parse(data)? {
            httparse::Status::Complete(len) => Ok(Some(Head {
                start: resp.code,
                headers: collect_headers(resp.headers),
                len,
            })),
            httparse::Status::Partial => Ok(None),
        }
    })?;

    Ok(Response {
        status: head.start,
        headers: head.headers,
        body,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_parse_simple_response() {
        let req_str = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_response(buf_reader).unwrap();

        assert_eq!(parsed_req.status, Some(200));
        assert_eq!(parsed_req.headers.len(), 1);
        assert_eq!(parsed_req.body, "");
    }

    #[test]
    fn test_parse_response_with_body() {
        let body = "{ \"order_id\": \"6d4c469f-6bac-4583-9cc5-654712a55973\" }";
        let req_str = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let buf_reader = BufReader::new(req_str.as_bytes());
        let parsed_req = parse_response(buf_reader).unwrap();

        assert_eq!(parsed_req.status, Some(200));
        assert_eq!(parsed_req.headers.len(), 1);
        assert_eq!(parsed_req.body, body);
    }

    #[test]
    fn test_parse_response_with_large_body() {
        let mut rng = rand::thread_rng();
        let mut buffer = [0; 4096];
        for c in buffer.iter_mut() {
            *c = rng.gen_range(b'a'..=b'z')
        }
        let body = String::from_utf8_lossy(&buffer);

        let resp_str = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            buffer.len(),
            body
        );

        let buf_reader = BufReader::new(resp_str.as_bytes());
        let parsed_resp = parse_response(buf_reader).unwrap();

        assert_eq!(parsed_resp.headers.len(), 1);
        assert_eq!(parsed_resp.body, body);
    }

    #[test]
    fn test_error_responses() {
        let response = Response::from_error(&Error::Validation("empty cart".to_string()));
        assert_eq!(response.status, Some(400));
        let body: ErrorBody = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body.error, "Validation failed: empty cart");

        assert_eq!(Response::from_error(&Error::Busy).status, Some(409));

        let response = Response::from_error(&Error::Unavailable("database down".to_string()));
        assert_eq!(response.status, Some(500));
        assert!(!response.body.contains("database down"));
    }

    #[test]
    #[should_panic]
    fn test_error_requires_error_code() {
        Response::error(200, "fine");
    }
}
