use super::payload::Payload;
use super::NOTIFY_TIMEOUT;
use crate::core::error::{LoggerError, Result};
use std::net::{TcpStream, ToSocketAddrs};
use tungstenite::http::Uri;
use tungstenite::Message;

/// One connection per notification: dial, send one text frame, close.
///
/// `wss://` endpoints are wrapped in rustls over the same timed dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketNotifier {
    endpoint: String,
}

impl WebSocketNotifier {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let uri: Uri = endpoint.parse().map_err(|e| {
            LoggerError::config("websocket notifier", format!("invalid endpoint '{}': {}", endpoint, e))
        })?;
        match uri.scheme_str() {
            Some("ws") | Some("wss") => {}
            _ => {
                return Err(LoggerError::config(
                    "websocket notifier",
                    format!("endpoint '{}' must use ws:// or wss://", endpoint),
                ))
            }
        }
        if uri.host().is_none() {
            return Err(LoggerError::config(
                "websocket notifier",
                format!("endpoint '{}' has no host", endpoint),
            ));
        }
        Ok(Self { endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn send(&self, notifier: &str, payload: &Payload) -> Result<()> {
        let transport = |e: &dyn std::fmt::Display| LoggerError::transport(notifier, e.to_string());
        let text = payload.to_json()?;

        let stream = self.dial().map_err(|e| transport(&e))?;
        let (mut socket, _) =
            tungstenite::client_tls_with_config(self.endpoint.as_str(), stream, None, None)
                .map_err(|e| transport(&e))?;
        socket
            .send(Message::Text(text))
            .map_err(|e| transport(&e))?;
        let _ = socket.close(None);
        let _ = socket.flush();
        Ok(())
    }

    fn dial(&self) -> std::io::Result<TcpStream> {
        let invalid = |msg: &str| std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.to_string());
        let uri: Uri = self
            .endpoint
            .parse()
            .map_err(|_| invalid("invalid endpoint"))?;
        let host = uri.host().ok_or_else(|| invalid("endpoint has no host"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let default_port = if uri.scheme_str() == Some("wss") { 443 } else { 80 };
        let port = uri.port_u16().unwrap_or(default_port);

        let mut last_error = invalid("endpoint did not resolve");
        for address in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&address, NOTIFY_TIMEOUT) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(NOTIFY_TIMEOUT))?;
                    stream.set_write_timeout(Some(NOTIFY_TIMEOUT))?;
                    return Ok(stream);
                }
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_validation() {
        assert!(WebSocketNotifier::new("ws://127.0.0.1:9000/events").is_ok());
        assert!(WebSocketNotifier::new("wss://example.com/ws").is_ok());
        assert!(WebSocketNotifier::new("http://example.com").is_err());
        assert!(WebSocketNotifier::new("not a url").is_err());
    }

    #[test]
    fn test_secure_endpoint_negotiates_tls_over_dial() {
        use std::io::Read;
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("wss://{}/events", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(std::time::Duration::from_secs(5)))
                .unwrap();
            let mut first = [0u8; 1];
            stream.read_exact(&mut first).ok().map(|_| first[0])
        });

        let notifier = WebSocketNotifier::new(endpoint).unwrap();
        let record = crate::core::record::Record::new(crate::core::level::Level::Error, "down");
        let result = notifier.send("secure", &Payload::from_record(&record));

        // 0x16 opens a TLS handshake record; the plain listener then hangs up
        assert_eq!(server.join().unwrap(), Some(0x16));
        assert!(matches!(result, Err(LoggerError::Transport { .. })), "{:?}", result);
    }
}
