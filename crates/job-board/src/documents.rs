//! Resume, portfolio and transcript uploads with time-limited signed retrieval URLs.

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use tracing::{error, info};

use crate::accounts::{AccountId, Actor};
use crate::clock::{Clock, SystemClock};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey(pub String);

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    Portfolio,
    Transcript,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::Portfolio => "portfolio",
            Self::Transcript => "transcript",
        }
    }

    fn accepts(self, content_type: &mime::Mime) -> bool {
        let essence = (content_type.type_(), content_type.subtype());
        match self {
            Self::Resume | Self::Transcript => essence == (mime::APPLICATION, mime::PDF),
            Self::Portfolio => {
                essence == (mime::APPLICATION, mime::PDF)
                    || essence == (mime::IMAGE, mime::PNG)
                    || essence == (mime::IMAGE, mime::JPEG)
            }
        }
    }
}

/// Reference to an uploaded document attached to another record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub key: DocumentKey,
    pub kind: DocumentKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub key: DocumentKey,
    pub owner: AccountId,
    pub kind: DocumentKind,
    pub content_type: String,
    pub size: usize,
    pub stored_at: DateTime<Utc>,
}

/// Upload waiting to be persisted.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub owner: AccountId,
    pub kind: DocumentKind,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

/// Storage backend for uploaded files; the store assigns keys.
pub trait DocumentStore: Send + Sync {
    fn store(&self, document: NewDocument) -> Result<StoredDocument, DocumentError>;
    fn open(&self, key: &DocumentKey) -> Result<Option<(StoredDocument, Vec<u8>)>, DocumentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,
    #[error("document exceeds {max} bytes")]
    TooLarge { max: usize },
    #[error("{kind} uploads do not accept {content_type}")]
    UnsupportedType {
        kind: &'static str,
        content_type: String,
    },
    #[error("document link expired")]
    Expired,
    #[error("document link signature mismatch")]
    BadSignature,
    #[error("document {0} not found")]
    NotFound(DocumentKey),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("document signing key rejected")]
    SigningKey,
}

/// Size and content-type rules applied before anything is stored.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl UploadPolicy {
    pub fn check(
        &self,
        kind: DocumentKind,
        content_type: &mime::Mime,
        size: usize,
    ) -> Result<(), DocumentError> {
        if size == 0 {
            return Err(DocumentError::Empty);
        }
        if size > self.max_bytes {
            return Err(DocumentError::TooLarge {
                max: self.max_bytes,
            });
        }
        if !kind.accepts(content_type) {
            return Err(DocumentError::UnsupportedType {
                kind: kind.label(),
                content_type: content_type.essence_str().to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// HMAC-SHA256 signer for retrieval links over `key:expires`.
#[derive(Clone)]
pub struct UrlSigner {
    keyed: HmacSha256,
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, DocumentError> {
        let keyed =
            HmacSha256::new_from_slice(secret.as_ref()).map_err(|_| DocumentError::SigningKey)?;
        Ok(Self { keyed })
    }

    fn mac(&self, key: &DocumentKey, expires: i64) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(format!("{}:{}", key.0, expires).as_bytes());
        mac
    }

    pub fn sign(&self, key: &DocumentKey, expires: i64) -> String {
        hex::encode(self.mac(key, expires).finalize().into_bytes())
    }

    pub fn signed_url(&self, key: &DocumentKey, expires_at: DateTime<Utc>) -> SignedUrl {
        let expires = expires_at.timestamp();
        SignedUrl {
            url: format!(
                "/api/v1/documents/{}?expires={}&signature={}",
                key.0,
                expires,
                self.sign(key, expires)
            ),
            expires_at,
        }
    }

    pub fn verify(
        &self,
        key: &DocumentKey,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DocumentError> {
        let provided = hex::decode(signature).map_err(|_| DocumentError::BadSignature)?;
        self.mac(key, expires)
            .verify_slice(&provided)
            .map_err(|_| DocumentError::BadSignature)?;
        if now.timestamp() > expires {
            return Err(DocumentError::Expired);
        }
        Ok(())
    }
}

/// Upload result returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub document: StoredDocument,
    pub link: SignedUrl,
}

pub struct DocumentService<S> {
    store: Arc<S>,
    policy: UploadPolicy,
    signer: UrlSigner,
    link_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<S> DocumentService<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>, policy: UploadPolicy, signer: UrlSigner, link_ttl: Duration) -> Self {
        Self::with_clock(store, policy, signer, link_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        policy: UploadPolicy,
        signer: UrlSigner,
        link_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            signer,
            link_ttl,
            clock,
        }
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    pub fn upload(
        &self,
        actor: &Actor,
        kind: DocumentKind,
        content_type: mime::Mime,
        bytes: Vec<u8>,
    ) -> Result<UploadReceipt, DocumentError> {
        self.policy.check(kind, &content_type, bytes.len())?;

        let now = self.clock.now();
        let document = self.store.store(NewDocument {
            owner: actor.account_id,
            kind,
            content_type,
            bytes,
            stored_at: now,
        })?;
        info!(
            key = %document.key,
            owner = %document.owner,
            kind = kind.label(),
            size = document.size,
            "document stored"
        );

        let link = self.signer.signed_url(&document.key, now + self.link_ttl);
        Ok(UploadReceipt { document, link })
    }

    pub fn open(
        &self,
        key: &DocumentKey,
        expires: i64,
        signature: &str,
    ) -> Result<(StoredDocument, Vec<u8>), DocumentError> {
        self.signer.verify(key, expires, signature, self.clock.now())?;
        self.store
            .open(key)?
            .ok_or_else(|| DocumentError::NotFound(key.clone()))
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub kind: DocumentKind,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkParams {
    pub expires: i64,
    pub signature: String,
}

/// Router for uploads and signed downloads; the body limit follows the upload policy.
pub fn document_router<S>(service: Arc<DocumentService<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    let body_limit = service.policy().max_bytes.saturating_add(1);
    Router::new()
        .route("/api/v1/documents", post(upload_handler::<S>))
        .route("/api/v1/documents/:key", get(download_handler::<S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// Header content type unless absent or generic, then a guess from the filename.
fn resolve_content_type(headers: &HeaderMap, filename: Option<&str>) -> mime::Mime {
    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .filter(|value| *value != mime::APPLICATION_OCTET_STREAM);

    declared.unwrap_or_else(|| {
        filename
            .map(|name| mime_guess::from_path(name).first_or_octet_stream())
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    })
}

fn document_error(err: DocumentError) -> Response {
    let status = match &err {
        DocumentError::Empty => StatusCode::BAD_REQUEST,
        DocumentError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        DocumentError::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        DocumentError::Expired | DocumentError::BadSignature => StatusCode::FORBIDDEN,
        DocumentError::NotFound(_) => StatusCode::NOT_FOUND,
        DocumentError::Unavailable(_) | DocumentError::SigningKey => {
            error!(error = %err, "document store failure");
            let payload = json!({ "error": "internal server error" });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };
    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}

pub(crate) async fn upload_handler<S>(
    State(service): State<Arc<DocumentService<S>>>,
    Query(params): Query<UploadParams>,
    actor: Actor,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: DocumentStore + 'static,
{
    let content_type = resolve_content_type(&headers, params.filename.as_deref());
    match service.upload(&actor, params.kind, content_type, body.to_vec()) {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(err) => document_error(err),
    }
}

pub(crate) async fn download_handler<S>(
    State(service): State<Arc<DocumentService<S>>>,
    Path(key): Path<String>,
    Query(params): Query<LinkParams>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match service.open(&DocumentKey(key), params.expires, &params.signature) {
        Ok((document, bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, document.content_type)],
            bytes,
        )
            .into_response(),
        Err(err) => document_error(err),
    }
}
