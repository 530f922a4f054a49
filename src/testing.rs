//! Minimal canned-response HTTP server for exercising the fetchers offline

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
};

/// A route answers every request whose target (path + query) contains `pattern`
#[derive(Debug, Clone)]
pub struct Route {
    pub pattern: &'static str,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn json(pattern: &'static str, body: serde_json::Value) -> Self {
        Self {
            pattern,
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn status(pattern: &'static str, status: u16) -> Self {
        Self {
            pattern,
            status,
            body: "{}".to_string(),
        }
    }
}

/// Client without system proxies, so loopback requests stay local
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(crate::util::HTTP_TIMEOUT)
        .build()
        .unwrap()
}

/// Serves `routes` on a random local port and returns its base URL, e.g. `http://127.0.0.1:4242`.
///
/// The first matching route wins; unmatched requests get a 404.
pub async fn serve(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let target = {
                    let mut reader = BufReader::new(&mut stream);
                    let mut request_line = String::new();
                    reader.read_line(&mut request_line).await.ok();

                    // Drain headers, requests are bodiless GETs
                    loop {
                        let mut line = String::new();
                        match reader.read_line(&mut line).await {
                            Ok(0) | Err(_) => break,
                            Ok(_) if line == "\r\n" => break,
                            Ok(_) => {}
                        }
                    }

                    request_line
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string()
                };

                let (status, body) = routes
                    .iter()
                    .find(|r| target.contains(r.pattern))
                    .map_or((404, "{}".to_string()), |r| (r.status, r.body.clone()));

                let response = format!(
                    "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.ok();
                stream.shutdown().await.ok();
            });
        }
    });

    format!("http://{addr}")
}
