use crate::http::{parse_request, Request, Response};
use crate::{errors, threadpool::ThreadPool};
use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};

/// Turn an HTTP status code into its reason phrase
pub fn code_to_string(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// This is the main server.
///
/// It listens for incoming connections on a TCP socket, parses the requests and dispatches them
/// to a handler. Whatever the handler produces is then converted in an HTTP response and sent
/// back to the client.
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    /// Create a new server listening on the given address
    pub fn new(addr: &str) -> errors::Result<Self> {
        Ok(HttpServer {
            listener: TcpListener::bind(addr)?,
        })
    }

    /// Start the server
    ///
    /// Calls the handler with the incoming requests, on a threadpool with as many workers as the
    /// system has cores.
    ///
    /// This function is blocking, with no real way of stopping it (except the socket being
    /// forcefully closed by the OS or the program being killed)
    pub fn serve<F>(&self, handler: F)
    where
        F: Fn(Request) -> Response + Send + Sync + 'static + Clone,
    {
        let threadpool = ThreadPool::new(
            std::thread::available_parallelism()
                .map(|x| x.into())
                .unwrap_or(4),
        );
        for stream in self.listener.incoming() {
            match stream {
                Ok(mut stream) => {
                    let handler = handler.clone();
                    threadpool.execute(move || handle_stream(&mut stream, &handler))
                }
                Err(err) => tracing::warn!(error = %err, "Failed to accept connection"),
            }
        }
    }

    /// Utility function for one-shot servers.
    ///
    /// This is mostly for testing, it listens to a single connection, processes the
    /// request and exit.
    pub fn serve_once<F>(&self, handler: F)
    where
        F: Fn(Request) -> Response,
    {
        match self.listener.accept() {
            Ok((mut stream, _)) => handle_stream(&mut stream, &handler),
            Err(err) => tracing::warn!(error = %err, "Failed to accept connection"),
        }
    }
}

/// Parse an HTTP request from a TCP stream, calls the handler and write back the answer
fn handle_stream<F>(mut stream: &mut TcpStream, handler: F)
where
    F: Fn(Request) -> Response,
{
    let buf_reader = BufReader::new(&mut stream);
    let response = match parse_request(buf_reader) {
        Ok(req) => {
            tracing::debug!(method = %req.method, path = %req.path, "Handling request");
            handler(req)
        }
        Err(err) => {
            tracing::debug!(error = %err, "Unreadable request");
            Response::error(400, &err.to_string())
        }
    };
    respond(stream, response);
}

/// Writes an HTTP response to a stream
fn respond(stream: &mut TcpStream, resp: Response) {
    let status = resp.status.unwrap_or(500);
    let result = stream.write_all(
        format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n{}\r\n{}",
            status,
            code_to_string(status),
            resp.body.len(),
            resp.headers
                .iter()
                .map(|(k, v)| format!("{}: {}\r\n", k, v))
                .collect::<Vec<_>>()
                .join(""),
            resp.body
        )
        .as_bytes(),
    );

    if let Err(err) = result {
        tracing::warn!(error = %err, "Failed to respond");
    }
}
