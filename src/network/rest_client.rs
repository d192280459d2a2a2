use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::request_queue::{NetworkError, RequestQueue};
use crate::domains::account::SessionStore;
use crate::system::versioning::{ApiVersion, VersionError};

/// Handle on one versioned REST namespace.
///
/// Requests go through the shared queue and carry the bearer token of the
/// current session, read at request time.
#[derive(Clone)]
pub struct RestClient {
    version: ApiVersion,
    endpoint: Url,
    queue: Arc<RequestQueue>,
    session: Arc<SessionStore>,
}

impl RestClient {
    pub fn new(
        version: ApiVersion,
        base_url: &Url,
        queue: Arc<RequestQueue>,
        session: Arc<SessionStore>,
    ) -> Result<Self, NetworkError> {
        let endpoint = if version.namespace().is_empty() {
            base_url.clone()
        } else {
            base_url
                .join(&format!("{}/", version.namespace()))
                .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", base_url, e)))?
        };

        Ok(Self {
            version,
            endpoint,
            queue,
            session,
        })
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn endpoint_url(&self) -> &Url {
        &self.endpoint
    }

    /// Resolves `path` under the versioned endpoint. Absolute URLs and
    /// paths leaving the endpoint are rejected, so the session token is only
    /// ever sent to this namespace.
    pub fn url_for(&self, path: &str) -> Result<Url, NetworkError> {
        let invalid = |reason: &str| NetworkError::InvalidUrl(format!("{}: {}", path, reason));
        let relative = path.trim_start_matches(['/', '\\']);

        if Url::parse(relative).is_ok() {
            return Err(invalid("absolute URLs are not allowed"));
        }
        let path_part = relative.split(['?', '#']).next().unwrap_or_default();
        if path_part.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(invalid("parent segments are not allowed"));
        }

        let url = self
            .endpoint
            .join(relative)
            .map_err(|e| invalid(&e.to_string()))?;
        if url.origin() != self.endpoint.origin()
            || !url.path().starts_with(self.endpoint.path())
        {
            return Err(invalid("resolves outside the endpoint"));
        }

        Ok(url)
    }

    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, NetworkError> {
        let url = self.url_for(path)?;
        let builder = self.queue.request(method, url);

        Ok(match self.session.access_token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetworkError> {
        let request = self.request(Method::GET, path).await?;
        let response = self.queue.dispatch(request).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, NetworkError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).await?.json(body);
        let response = self.queue.dispatch(request).await?;
        Ok(response.json::<T>().await?)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("version", &self.version)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

/// Exactly one client per [`ApiVersion`].
#[derive(Debug)]
pub struct RestClientSet {
    clients: Vec<Arc<RestClient>>,
}

impl RestClientSet {
    pub fn build(
        base_url: &str,
        queue: Arc<RequestQueue>,
        session: Arc<SessionStore>,
    ) -> Result<Self, NetworkError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        // Without the trailing slash `join` would replace the last segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let clients = ApiVersion::ALL
            .iter()
            .map(|version| {
                RestClient::new(*version, &base, Arc::clone(&queue), Arc::clone(&session))
                    .map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { clients })
    }

    pub fn get(&self, version: ApiVersion) -> &Arc<RestClient> {
        &self.clients[version.index()]
    }

    pub fn default_client(&self) -> &Arc<RestClient> {
        self.get(ApiVersion::default())
    }

    /// Looks a client up by its version tag (`v1.1`, `2`, ...).
    pub fn resolve(&self, tag: &str) -> Result<&Arc<RestClient>, VersionError> {
        ApiVersion::parse(tag).map(|version| self.get(version))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RestClient>> {
        self.clients.iter()
    }
}
