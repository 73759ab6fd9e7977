use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};
use folio_core::FolioError;

/// Header the upstream auth layer forwards the caller's id in
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolves the calling user from request headers.
///
/// Authentication itself happens upstream; the gateway only needs the id.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> anyhow::Result<Option<i64>>;
}

/// Trusts a numeric id in a forwarded header
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    header: HeaderName,
}

impl HeaderIdentity {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for HeaderIdentity {
    fn default() -> Self {
        Self::new(HeaderName::from_static(USER_ID_HEADER))
    }
}

#[async_trait]
impl IdentityResolver for HeaderIdentity {
    async fn resolve(&self, headers: &HeaderMap) -> anyhow::Result<Option<i64>> {
        let Some(raw) = headers.get(&self.header) else {
            return Ok(None);
        };

        let id = raw
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| {
                FolioError::not_authenticated(format!("Malformed {} header", self.header)).into_anyhow()
            })?;
        Ok(Some(id))
    }
}

/// Resolve the caller or fail with 401
pub async fn require_user(resolver: &dyn IdentityResolver, headers: &HeaderMap) -> anyhow::Result<i64> {
    match resolver.resolve(headers).await? {
        Some(id) => Ok(id),
        None => folio_core::bail_folio!(not_authenticated, "Authentication required"),
    }
}
