//! Client for the optional REST backend.
//!
//! The backend is an external collaborator: `GET` lists a collection,
//! `POST`/`PUT`/`DELETE` mutate it, and bodies are the same JSON the local
//! storage holds. Nothing here retries; callers log failures and move on.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::models::{BusinessInfo, Client, Document, DocumentStatus, InvoiceStatus, QuoteStatus};
use crate::store::{DocumentCollection, Store};

const BUSINESS_INFO_PATH: &str = "/api/business-info";
const CLIENTS_PATH: &str = "/api/clients";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self::with_http(http, base_url))
    }

    pub(crate) fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.http.get(self.url(path)).send().await?;
        let response = check_status(Method::GET, path, response)?;
        Ok(response.json::<T>().await?)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .request(method.clone(), self.url(path))
            .json(body)
            .send()
            .await?;
        check_status(method, path, response)?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.http.delete(self.url(path)).send().await?;
        check_status(Method::DELETE, path, response)?;
        Ok(())
    }

    // Business info

    /// A `null` body means the profile has not been set yet.
    pub async fn fetch_business_info(&self) -> Result<Option<BusinessInfo>, ApiError> {
        self.get_json(BUSINESS_INFO_PATH).await
    }

    pub async fn save_business_info(&self, info: &BusinessInfo) -> Result<(), ApiError> {
        self.send_json(Method::PUT, BUSINESS_INFO_PATH, info).await
    }

    // Clients

    pub async fn fetch_clients(&self) -> Result<Vec<Client>, ApiError> {
        self.get_json(CLIENTS_PATH).await
    }

    pub async fn create_client(&self, client: &Client) -> Result<(), ApiError> {
        self.send_json(Method::POST, CLIENTS_PATH, client).await
    }

    pub async fn update_client(&self, client: &Client) -> Result<(), ApiError> {
        let path = format!("{}/{}", CLIENTS_PATH, client.id);
        self.send_json(Method::PUT, &path, client).await
    }

    pub async fn delete_client(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("{}/{}", CLIENTS_PATH, id)).await
    }

    // Quotes and invoices

    pub async fn fetch_documents<S: DocumentStatus>(&self) -> Result<Vec<Document<S>>, ApiError> {
        self.get_json(S::KIND.api_path()).await
    }

    pub async fn create_document<S: DocumentStatus>(
        &self,
        document: &Document<S>,
    ) -> Result<(), ApiError> {
        self.send_json(Method::POST, S::KIND.api_path(), document).await
    }

    pub async fn update_document<S: DocumentStatus>(
        &self,
        document: &Document<S>,
    ) -> Result<(), ApiError> {
        let path = format!("{}/{}", S::KIND.api_path(), document.id);
        self.send_json(Method::PUT, &path, document).await
    }

    pub async fn delete_document<S: DocumentStatus>(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("{}/{}", S::KIND.api_path(), id)).await
    }

    /// Fetches every collection and merges the results over `local`.
    /// A collection whose request fails keeps its local value.
    pub async fn pull(&self, local: &Store) -> Store {
        let business_info = match self.fetch_business_info().await {
            Ok(info) => info.or_else(|| local.business_info().cloned()),
            Err(e) => {
                warn!(error = %e, "Failed to fetch business info");
                local.business_info().cloned()
            }
        };

        let clients = match self.fetch_clients().await {
            Ok(clients) => clients,
            Err(e) => {
                warn!(error = %e, "Failed to fetch clients");
                local.clients().to_vec()
            }
        };

        let quotes = self.pull_documents::<QuoteStatus>(local).await;
        let invoices = self.pull_documents::<InvoiceStatus>(local).await;

        debug!(
            clients = clients.len(),
            quotes = quotes.len(),
            invoices = invoices.len(),
            "Pulled collections from backend"
        );
        Store::from_parts(business_info, clients, quotes, invoices)
    }

    async fn pull_documents<S: DocumentCollection>(&self, local: &Store) -> Vec<Document<S>> {
        match self.fetch_documents::<S>().await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(kind = %S::KIND, error = %e, "Failed to fetch documents");
                local.documents::<S>().to_vec()
            }
        }
    }
}

fn check_status(
    method: Method,
    path: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ApiError> {
    let status: StatusCode = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            method: method.to_string(),
            path: path.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves canned responses keyed by request path, one request per
    /// connection, until the test ends.
    async fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => read += n,
                    }
                }
                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                let path = head.split_whitespace().nth(1).unwrap_or("").to_string();

                let (status, body) = routes
                    .iter()
                    .find(|(p, _, _)| *p == path)
                    .map(|(_, status, body)| (*status, *body))
                    .unwrap_or((404, ""));
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}", addr)
    }

    fn local_api(base: &str) -> ApiClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        ApiClient::with_http(http, base)
    }

    #[test]
    fn urls_join_base_and_path_without_double_slash() {
        let api = ApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(api.url(CLIENTS_PATH), "http://localhost:3000/api/clients");
        assert_eq!(
            api.url(QuoteStatus::KIND.api_path()),
            "http://localhost:3000/api/quotes"
        );
    }

    #[tokio::test]
    async fn pull_replaces_fetched_collections_and_keeps_failed_ones() {
        let base = serve(vec![
            ("/api/business-info", 200, r#"{"name":"Remote Co"}"#),
            (
                "/api/clients",
                200,
                r#"[{"id":1,"name":"Remote Client","email":"r@c.test","status":"inactive"}]"#,
            ),
            ("/api/quotes", 500, ""),
            (
                "/api/invoices",
                200,
                r#"[{"id":9,"title":"Remote","date":"2024-02-02","status":"overdue",
                    "lineItems":[{"id":1,"description":"x","quantity":4,"unitPrice":2.5}]}]"#,
            ),
        ])
        .await;
        let local = Store::demo(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).unwrap();
        let api = local_api(&base);

        let merged = api.pull(&local).await;

        assert_eq!(merged.business_info().unwrap().name, "Remote Co");
        assert_eq!(merged.clients()[0].name, "Remote Client");
        assert_eq!(merged.quotes(), local.quotes());
        let invoice = merged.invoice(9).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Overdue);
        assert_eq!(invoice.total_amount, 10.0);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = serve(vec![("/api/clients/3", 404, "")]).await;
        let api = local_api(&base);

        let err = api.delete_client(3).await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::Status { status, .. } if status == StatusCode::NOT_FOUND
        ));
        assert_eq!(err.to_string(), "DELETE /api/clients/3 returned 404 Not Found");
    }

    #[tokio::test]
    async fn unreachable_backend_leaves_local_store_untouched() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let local = Store::demo(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).unwrap();
        let api = local_api(&format!("http://{}", addr));

        assert_eq!(api.pull(&local).await, local);
    }
}
