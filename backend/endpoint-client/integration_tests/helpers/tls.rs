//! TLS side of the test servers: a self-signed `localhost` certificate
//! (also valid for 127.0.0.1) and a one-shot HTTPS `/login` responder.

use std::net::SocketAddr;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls::crypto::ring;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;

const CERT_PEM: &[u8] = include_bytes!("../fixtures/localhost.crt");
const KEY_PEM: &[u8] = include_bytes!("../fixtures/localhost.key");

pub fn self_signed_acceptor() -> TlsAcceptor {
    let cert = CertificateDer::from_pem_slice(CERT_PEM).expect("Fixture certificate should parse");
    let key = PrivateKeyDer::from_pem_slice(KEY_PEM).expect("Fixture key should parse");

    let config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .expect("ring supports the default protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert], key)
        .expect("Fixture key should match the certificate");

    TlsAcceptor::from(Arc::new(config))
}

pub struct HttpsLogin {
    pub addr: SocketAddr,
    /// Request line of every request that completed the TLS handshake.
    pub requests: mpsc::UnboundedReceiver<String>,
}

impl HttpsLogin {
    pub fn base_url(&self) -> String {
        format!("https://{}", self.addr)
    }
}

/// Answers one request with 200 and `Set-Cookie: {cookie}` over the self-signed certificate.
pub async fn spawn_https_login(cookie: &str) -> HttpsLogin {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test login server");
    let addr = listener.local_addr().expect("Listener has no address");
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let cookie = cookie.to_string();

    tokio::spawn(async move {
        let acceptor = self_signed_acceptor();
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut stream) = acceptor.accept(stream).await else {
            return;
        };

        let Some(head) = read_request(&mut stream).await else {
            return;
        };
        let request_line = head.lines().next().unwrap_or_default().to_string();
        let _ = requests_tx.send(request_line);

        let response = format!(
            "HTTP/1.1 200 OK\r\nset-cookie: {cookie}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    });

    HttpsLogin {
        addr,
        requests: requests_rx,
    }
}

/// Reads headers and a `content-length` body; returns the header block.
async fn read_request<S: AsyncReadExt + Unpin>(stream: &mut S) -> Option<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];

    let header_end = loop {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }

    Some(head)
}
