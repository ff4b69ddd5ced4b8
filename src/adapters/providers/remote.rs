//! Adapter for a generative model served over HTTP.
//!
//! The server exposes `POST <base>/generate` taking
//! `{"z": [...], "truncation": psi, "noise_seed": n}` and answering
//! `{"image": "data:image/<fmt>;base64,..."}`.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, StartupError};
use crate::output::decode_image_payload;
use crate::ports::{GenerateFuture, InferenceProvider};

/// Longest response body quoted back in an error.
const MAX_ERROR_BODY: usize = 500;

/// Model server client.
pub struct RemoteProvider {
    client: Client,
    endpoint: String,
    latent_dim: usize,
    noise_seed: u64,
}

impl RemoteProvider {
    /// Create a client for the model server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `latent_dim` is zero or the HTTP client cannot be built.
    pub fn new(base_url: &str, latent_dim: usize) -> Result<Self, StartupError> {
        if latent_dim == 0 {
            return Err(StartupError::Config("latent_dim must be positive".into()));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| StartupError::Resource {
                what: "HTTP client",
                reason: e.to_string(),
            })?;
        let endpoint = format!("{}/generate", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            latent_dim,
            noise_seed: 0,
        })
    }

    /// URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl InferenceProvider for RemoteProvider {
    fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    fn reseed_noise(&mut self, seed: u64) {
        self.noise_seed = seed;
    }

    fn generate<'a>(&'a mut self, latent: &'a [f32], psi: f32) -> GenerateFuture<'a> {
        Box::pin(async move {
            if latent.len() != self.latent_dim {
                return Err(ProviderError::Dimension {
                    expected: self.latent_dim,
                    got: latent.len(),
                });
            }

            let body = serde_json::json!({
                "z": latent,
                "truncation": psi,
                "noise_seed": self.noise_seed,
            });
            debug!(
                endpoint = %self.endpoint,
                psi,
                noise_seed = self.noise_seed,
                "calling model server"
            );

            let response = self.client.post(&self.endpoint).json(&body).send().await?;
            let status = response.status();
            let response_text = response.text().await?;

            if !status.is_success() {
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: truncate_body(&response_text),
                });
            }

            let parsed: GenerateResponse = serde_json::from_str(&response_text).map_err(|e| {
                ProviderError::MalformedOutput(format!(
                    "Failed to parse response: {e}. Body: {}",
                    truncate_body(&response_text)
                ))
            })?;

            decode_image_payload(&parsed.image)
        })
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|&i| body.is_char_boundary(i))
            .unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

// --- Model server response types ---

#[derive(Deserialize)]
struct GenerateResponse {
    image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let provider = RemoteProvider::new("http://localhost:9000/", 512).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9000/generate");
        assert_eq!(provider.latent_dim(), 512);
    }

    #[test]
    fn zero_dim_is_rejected() {
        assert!(RemoteProvider::new("http://localhost:9000", 0).is_err());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(600);
        let t = truncate_body(&body);
        assert_eq!(t.len(), MAX_ERROR_BODY + 3);
        assert!(t.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn wrong_dimension_fails_before_network() {
        let mut provider = RemoteProvider::new("http://127.0.0.1:9", 4).unwrap();
        let err = provider.generate(&[0.0; 3], 1.0).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Dimension {
                expected: 4,
                got: 3
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        // Port 9 (discard) is closed on test machines.
        let mut provider = RemoteProvider::new("http://127.0.0.1:9", 2).unwrap();
        let err = provider.generate(&[0.0, 1.0], 1.0).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    /// Serve exactly one HTTP request with `status` and `body`, returning the request body.
    async fn serve_once(
        status: &'static str,
        body: String,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut chunk = [0_u8; 4096];
            let request_body = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                raw.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some((head, rest)) = text.split_once("\r\n\r\n") {
                    let len = head
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse().ok())?
                        })
                        .unwrap_or(0_usize);
                    if rest.len() >= len {
                        break rest.to_string();
                    }
                }
                assert!(n > 0, "client closed early");
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request_body
        });
        (base, handle)
    }

    #[tokio::test]
    async fn server_image_is_decoded() {
        let img = crate::ports::GenerationResult::from_rgb(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let uri = crate::output::png_data_uri(&img).unwrap();
        let (base, server) =
            serve_once("200 OK", serde_json::json!({ "image": uri }).to_string()).await;

        let mut provider = RemoteProvider::new(&base, 2).unwrap();
        provider.reseed_noise(42);
        let result = provider.generate(&[0.5, -0.5], 0.8).await.unwrap();
        assert_eq!(result, img);

        let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["noise_seed"], 42);
        assert_eq!(sent["z"].as_array().unwrap().len(), 2);
        assert!((sent["truncation"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn server_error_status_is_api_error() {
        let (base, _server) = serve_once("500 Internal Server Error", "boom".to_string()).await;
        let mut provider = RemoteProvider::new(&base, 1).unwrap();
        let err = provider.generate(&[0.0], 1.0).await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_image_field_is_malformed() {
        let (base, _server) = serve_once("200 OK", r#"{"output": 1}"#.to_string()).await;
        let mut provider = RemoteProvider::new(&base, 1).unwrap();
        let err = provider.generate(&[0.0], 1.0).await.unwrap_err();
        assert!(matches!(err, ProviderError::MalformedOutput(_)));
    }
}
