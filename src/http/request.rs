use crate::errors::{Error, Result};
use crate::http::{collect_headers, read_message, Head};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::{BufReader, Read};

/// Represents an HTTP request.
#[derive(Debug)]
pub struct Request {
    /// The HTTP method used in the request
    pub method: String,
    /// The full path of the request, query string included
    pub path: String,
    /// Headers of the request
    pub headers: Vec<(String, String)>,
    /// Body of the request
    pub body: String,
}

impl Request {
    /// Create a new request from scratch
    pub fn new(method: &str, path: &str, headers: Vec<(String, String)>, body: String) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            headers,
            body,
        }
    }
    /// Create a new GET request for the given path, with an empty body
    pub fn get(path: &str) -> Request {
        Request::new("GET", path, vec![], String::new())
    }
    /// Create a new POST request for the given path, with the given body
    pub fn post(path: &str, body: String) -> Request {
        Request::new("POST", path, vec![], body)
    }
    /// Create a new PUT request for the given path, with the given body
    pub fn put(path: &str, body: String) -> Request {
        Request::new("PUT", path, vec![], body)
    }
    /// Create a new DELETE request for the given path, with an empty body
    pub fn delete(path: &str) -> Request {
        Request::new("DELETE", path, vec![], String::new())
    }

    /// Path without the query string, the part used for routing
    pub fn route_path(&self) -> &str {
        self.path
            .split_once('?')
            .map_or(self.path.as_str(), |(path, _)| path)
    }

    /// Decoded query string parameters. When a key is repeated, the last value wins.
    pub fn query(&self) -> HashMap<String, String> {
        match self.path.split_once('?') {
            Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => HashMap::new(),
        }
    }

    /// Deserialize the JSON body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .map_err(|err| Error::BadRequest(format!("Invalid body: {}", err)))
    }
}

/// Parse an HTTP request from a byte stream
pub fn parse_request<T>(buf_reader: BufReader<T>) -> Result<Request>
where
    T: Read,
{
    let (head, body) = read_message(buf_reader, |data| {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(data)? {
            httparse::Status::Complete(len) => Ok(Some(Head {
                start: (
                    req.method.unwrap_or("GET").to_string(),
                    req.path.unwrap_or("/").to_string(),
                ),
                headers: collect_headers(req.headers),
                len,
            })),
            httparse::Status::Partial => Ok(None),
        }
    })?;

    let (method, path) = head.start;
    Ok(Request {
        method,
        path,
        headers: head.headers,
        body,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    fn random_text(len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| rng.gen_range(b'a'..=b'z') as char)
            .collect()
    }

    #[test]
    fn test_parse_simple_request() {
        let req_str = b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*\r\n\r\n";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.method, "GET");
        assert_eq!(parsed_req.path, "/");
        assert_eq!(parsed_req.headers.len(), 3);
        assert_eq!(parsed_req.body, "");
    }

    #[test]
    fn test_parse_incomplete_request() {
        let req_str =
            b"GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*";
        let buf_reader = BufReader::new(&req_str[..]);

        let parsed_req = parse_request(buf_reader);

        assert!(matches!(parsed_req, Err(Error::ConnectionReset)));
    }

    #[test]
    fn test_parse_garbage() {
        let buf_reader = BufReader::new(&b"\x01\x02 nope\r\n\r\n"[..]);
        assert!(matches!(parse_request(buf_reader), Err(Error::Http(_))));
    }

    #[test]
    fn test_parse_request_with_body() {
        let body = "{ \"payment_method\": \"cash\" }";
        let req_str = format!(
            "POST /api/v1/checkout HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );

        let buf_reader = BufReader::new(req_str.as_bytes());

        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.method, "POST");
        assert_eq!(parsed_req.path, "/api/v1/checkout");
        assert_eq!(parsed_req.headers.len(), 4);
        assert_eq!(parsed_req.body, body);
    }

    #[test]
    fn test_parse_request_with_large_header() {
        let x_test_header = random_text(4096);

        let req_str = format!(
            "GET / HTTP/1.1\r\nHost: localhost:8080\r\nUser-Agent: curl/7.68.0\r\nAccept: */*\r\nX-Test: {}\r\n\r\n",
            x_test_header
        );

        let buf_reader = BufReader::new(req_str.as_bytes());
        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.headers.len(), 4);
        let x_test = parsed_req
            .headers
            .iter()
            .find(|(k, _)| k == "X-Test")
            .unwrap();
        assert_eq!(x_test.1, x_test_header);
    }

    #[test]
    fn test_parse_request_with_very_large_body_and_header() {
        let body = random_text(40960);
        let x_test_header = random_text(40960);

        let req_str = format!(
            "POST / HTTP/1.1\r\nHost: localhost:8080\r\nContent-Length: {}\r\nX-TEST: {}\r\n\r\n{}",
            body.len(),
            x_test_header,
            body
        );

        let buf_reader = BufReader::new(req_str.as_bytes());
        let parsed_req = parse_request(buf_reader).unwrap();

        assert_eq!(parsed_req.method, "POST");
        assert_eq!(parsed_req.headers.len(), 3);
        assert_eq!(parsed_req.body, body);
    }

    #[test]
    fn test_multibyte_body_split_across_reads() {
        let body = format!("{{\"name\": \"{}Ñyama\"}}", "a".repeat(4090));
        let req_str = format!(
            "POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let parsed_req = parse_request(BufReader::new(req_str.as_bytes())).unwrap();
        assert_eq!(parsed_req.body, body);
    }

    #[test]
    fn test_query_string() {
        let request = Request::get("/api/v1/orders?search=Amina%20K&status=in-progress&search=Juma");
        assert_eq!(request.route_path(), "/api/v1/orders");
        let query = request.query();
        assert_eq!(query.get("search").unwrap(), "Juma");
        assert_eq!(query.get("status").unwrap(), "in-progress");

        let request = Request::get("/api/v1/menu");
        assert_eq!(request.route_path(), "/api/v1/menu");
        assert!(request.query().is_empty());
    }

    #[test]
    fn test_json_body() {
        let request = Request::post("/", "{\"quantity\": 3}".to_string());
        let update: crate::api::QuantityUpdate = request.json().unwrap();
        assert_eq!(update.quantity, 3);

        let request = Request::post("/", "{\"quantity\": -3}".to_string());
        assert!(matches!(
            request.json::<crate::api::QuantityUpdate>(),
            Err(Error::BadRequest(_))
        ));
    }
}
