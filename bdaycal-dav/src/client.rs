//! WebDAV client for the calendar collection.
//!
//! Listing, reads and writes go through libdav; DELETE and the reachability
//! check are plain HTTP requests.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bdaycal_core::config::DavConfig;
use bdaycal_core::remote::{DavEntry, Reachability, RemoteStore};
use bdaycal_core::{BdayCalError, BdayCalResult};
use http::Uri;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use libdav::CalDavClient;
use libdav::caldav::GetCalendarResources;
use libdav::dav::{PutResource, WebDavClient, mime_types};
use reqwest::{Method, RequestBuilder, StatusCode};
use tower::ServiceBuilder;
use tower_http::auth::AddAuthorization;
use tower_http::follow_redirect::{FollowRedirect, FollowRedirectLayer};
use tracing::debug;
use url::Url;

use crate::requests::ListMembers;

/// HTTP stack under the libdav clients: basic auth, redirects followed.
pub(crate) type HttpClient =
    FollowRedirect<AddAuthorization<Client<hyper_rustls::HttpsConnector<HttpConnector>, String>>>;

/// A libdav client rooted at `base_url`, authenticating every request.
pub(crate) fn webdav_client(
    base_url: &str,
    user: &str,
    password: &str,
) -> Result<WebDavClient<HttpClient>> {
    let uri: Uri = base_url
        .parse()
        .with_context(|| format!("Invalid base URL: {}", base_url))?;

    let https_connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("Failed to load native TLS roots")?
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);
    let auth_client = AddAuthorization::basic(http_client, user, password);
    let client = ServiceBuilder::new()
        .layer(FollowRedirectLayer::new())
        .service(auth_client);

    Ok(WebDavClient::new(uri, client))
}

/// Path part of a URL; libdav requests address resources by path.
///
/// "https://dav.example.org/dav/cal/a.ics" becomes "/dav/cal/a.ics".
pub(crate) fn url_to_href(url: &str) -> String {
    match url.parse::<Uri>() {
        Ok(uri) => uri.path().to_string(),
        Err(_) => url.to_string(),
    }
}

/// Collection an href lives in, with its trailing slash.
fn parent_href(href: &str) -> &str {
    match href.trim_end_matches('/').rfind('/') {
        Some(slash) => &href[..=slash],
        None => "/",
    }
}

/// Await a libdav request, giving up after `timeout`.
pub(crate) async fn bounded<F, T, E>(timeout: Duration, request: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => Ok(result?),
        Err(_) => bail!("No response within {:?}", timeout),
    }
}

/// Client for the birthday calendar collection.
pub struct DavClient {
    caldav: CalDavClient<HttpClient>,
    http: reqwest::Client,
    base: Url,
    user: String,
    password: String,
    timeout: Duration,
}

impl std::fmt::Debug for DavClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DavClient")
            .field("base", &self.base.as_str())
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl DavClient {
    /// `base_url` is what relative hrefs from the server are resolved against.
    pub fn new(base_url: &str, user: &str, password: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
        let caldav = CalDavClient::new(webdav_client(base_url, user, password)?);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("bdaycal/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(DavClient {
            caldav,
            http,
            base,
            user: user.to_string(),
            password: password.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &DavConfig) -> Result<Self> {
        Self::new(&config.cal_url, &config.user, &config.password, config.timeout)
    }

    /// Turn a server href (absolute path or URL) into a full URL.
    pub fn resolve(&self, href: &str) -> Result<Url> {
        self.base
            .join(href)
            .with_context(|| format!("Invalid href: {}", href))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
    }

    /// Members of `collection`, excluding the collection itself.
    pub async fn list_members(&self, collection: &str) -> Result<Vec<DavEntry>> {
        let collection_href = url_to_href(collection);

        let request = ListMembers::new(&collection_href);
        let response = bounded(self.timeout, self.caldav.request(request))
            .await
            .with_context(|| format!("Failed to list {}", collection))?;

        let own = collection_href.trim_end_matches('/');
        let entries: Vec<DavEntry> = response
            .entries
            .into_iter()
            .filter(|entry| url_to_href(&entry.href).trim_end_matches('/') != own)
            .collect();

        debug!(collection = %collection_href, members = entries.len(), "PROPFIND");
        Ok(entries)
    }

    /// Calendar data of one resource, via a calendar-multiget on its collection.
    pub async fn fetch(&self, href: &str) -> Result<Vec<u8>> {
        let href = url_to_href(href);
        let collection_href = parent_href(&href);

        let request = GetCalendarResources::new(collection_href).with_hrefs([&href]);
        let response = bounded(self.timeout, self.caldav.request(request))
            .await
            .with_context(|| format!("Failed to fetch {}", href))?;

        let resource = response
            .resources
            .into_iter()
            .next()
            .with_context(|| format!("Server returned nothing for {}", href))?;

        match resource.content {
            Ok(content) => Ok(content.data.into_bytes()),
            Err(status) => bail!("Failed to fetch {} (status {:?})", href, status),
        }
    }

    /// Create a new event resource; fails if something already lives at `href`.
    async fn upload(&self, href: &str, body: Vec<u8>) -> Result<()> {
        let href = url_to_href(href);
        let content = String::from_utf8(body)
            .with_context(|| format!("Event for {} is not valid UTF-8", href))?;

        let request = PutResource::new(&href).create(&content, mime_types::CALENDAR);
        bounded(self.timeout, self.caldav.request(request))
            .await
            .with_context(|| format!("Failed to upload {}", href))?;

        debug!(%href, "PUT");
        Ok(())
    }

    async fn remove(&self, href: &str) -> Result<()> {
        let url = self.resolve(href)?;
        let response = self
            .request(Method::DELETE, url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to delete {}", url))?;

        let status = response.status();
        // Already gone is fine
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        bail!("Failed to delete {} (status {}): {}", url, status, body.trim())
    }
}

fn transport(e: anyhow::Error) -> BdayCalError {
    BdayCalError::Transport(format!("{:#}", e))
}

#[async_trait]
impl RemoteStore for DavClient {
    async fn list(&self, collection: &str) -> BdayCalResult<Vec<DavEntry>> {
        self.list_members(collection).await.map_err(transport)
    }

    async fn get(&self, href: &str) -> BdayCalResult<Vec<u8>> {
        self.fetch(href).await.map_err(transport)
    }

    async fn put(&self, href: &str, body: Vec<u8>) -> BdayCalResult<()> {
        self.upload(href, body).await.map_err(transport)
    }

    async fn delete(&self, href: &str) -> BdayCalResult<()> {
        self.remove(href).await.map_err(transport)
    }

    async fn probe(&self, base_address: &str) -> Reachability {
        let url = match self.resolve(base_address) {
            Ok(url) => url,
            Err(e) => return Reachability::Unreachable(format!("{:#}", e)),
        };

        match self.request(Method::HEAD, url).send().await {
            Ok(response) if response.status().is_server_error() => {
                Reachability::Unreachable(format!("status {}", response.status()))
            }
            Ok(_) => Reachability::Reachable,
            Err(e) => Reachability::Unreachable(e.to_string()),
        }
    }
}
