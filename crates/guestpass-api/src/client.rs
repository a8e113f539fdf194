// Controller API HTTP client
//
// Wraps `reqwest::Client` with the controller's URL layout, envelope
// unwrapping, and in-band error detection. Exposes the four calls a
// rotation needs, in the order it needs them. Nothing here retries:
// each call returns a result or fails once.

use reqwest::header::{ACCEPT, COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::auth::{Session, TenantId};
use crate::error::Error;
use crate::models::{
    Envelope, GuestAccount, GuestUserList, GuestUserListRequest, LoginData, OrgInfo, UpdateAck,
};
use crate::transport::TransportConfig;

/// Page size of the guest list request. There is no pagination: accounts
/// beyond this many are invisible to [`ControllerClient::find_guest_account`].
pub const GUEST_LIST_LIMIT: usize = 50;

const LOGIN_PATH: &str = "/cvcue/keyLogin";
const API_PREFIX: &str = "/api/";
const BODY_PREVIEW_CHARS: usize = 400;

const OP_LOGIN: &str = "keyLogin";
const OP_ORG_INFO: &str = "org.info";
const OP_GUEST_LIST: &str = "identity.guest.user.list";
const OP_GUEST_UPDATE: &str = "identity.guest.user.update";

/// HTTP client for the controller's JSON API.
///
/// Stateless between calls: the [`Session`] returned by
/// [`authenticate`](Self::authenticate) is passed explicitly to every
/// subsequent call and attached as the `Cookie` header.
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    transport: TransportConfig,
}

impl ControllerClient {
    /// Create a client for the controller at `base_url` (without `/api`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            transport: transport.clone(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, transport: TransportConfig) -> Self {
        Self {
            http,
            base_url,
            transport,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn login_url(&self) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{LOGIN_PATH}"))?)
    }

    /// `{base}/api/{path}`
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{API_PREFIX}{path}"))?)
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Log in with an API key and return the session cookie.
    ///
    /// `GET /cvcue/keyLogin?keyID=..&keyValue=..` answers with
    /// `{"data": {"cookie": "name=value; Path=/; ..."}}`; only the part
    /// before the first `;` is kept.
    pub async fn authenticate(
        &self,
        key_id: &str,
        key_secret: &SecretString,
    ) -> Result<Session, Error> {
        let url = self.login_url()?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[("keyID", key_id), ("keyValue", key_secret.expose_secret())])
            .header(ACCEPT, "application/json")
            .timeout(self.transport.login_timeout)
            .send()
            .await
            // The URL carries the key secret in its query string.
            .map_err(|e| Error::Transport {
                operation: OP_LOGIN,
                source: e.without_url(),
            })?;

        let envelope = read_envelope(OP_LOGIN, resp).await.map_err(|e| match e {
            Error::Api { message, .. } => Error::Authentication { message },
            other => other,
        })?;

        let login: Option<LoginData> = decode_data(OP_LOGIN, envelope)?;
        let session = login
            .and_then(|l| l.cookie)
            .as_deref()
            .and_then(Session::from_cookie)
            .ok_or_else(|| Error::Authentication {
                message: "key login response is missing data.cookie".into(),
            })?;

        debug!("key login successful");
        Ok(session)
    }

    /// Resolve the organization the API key belongs to (`data.orgID`).
    pub async fn resolve_tenant(&self, session: &Session) -> Result<TenantId, Error> {
        let envelope = self.post(session, OP_ORG_INFO, &json!({})).await?;
        let info: Option<OrgInfo> = decode_data(OP_ORG_INFO, envelope)?;

        let org_id = info
            .and_then(|i| i.org_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(Error::MissingField {
                operation: OP_ORG_INFO,
                field: "data.orgID",
            })?;

        info!(tenant_id = %org_id, "resolved tenant");
        Ok(TenantId::new(org_id))
    }

    /// Find the guest account whose `loginName` or `email` equals the target.
    ///
    /// The controller's server-side filters reject these fields, so one page
    /// of [`GUEST_LIST_LIMIT`] users is fetched and scanned locally.
    pub async fn find_guest_account(
        &self,
        session: &Session,
        tenant: &TenantId,
        login_or_email: &str,
    ) -> Result<GuestAccount, Error> {
        let request = GuestUserListRequest {
            org_id: tenant.as_str(),
            limit: GUEST_LIST_LIMIT,
        };
        let envelope = self.post(session, OP_GUEST_LIST, &request).await?;
        let users = decode_data::<GuestUserList>(OP_GUEST_LIST, envelope)?
            .and_then(|list| list.users)
            .unwrap_or_default();

        let scanned = users.len();
        debug!(scanned, "scanning guest users");

        let account = users
            .into_iter()
            .find(|u| u.matches(login_or_email))
            .ok_or_else(|| Error::GuestNotFound {
                login: login_or_email.to_owned(),
                scanned,
            })?;

        info!(guest_login = login_or_email, "guest account found");
        Ok(account)
    }

    /// Replace the guest account with a copy carrying the new password.
    ///
    /// See [`GuestAccount::password_update`] for the exact body.
    pub async fn update_guest_password(
        &self,
        session: &Session,
        tenant: &TenantId,
        account: &GuestAccount,
        new_password: &SecretString,
    ) -> Result<UpdateAck, Error> {
        let user_id = account.user_id().ok_or(Error::MissingField {
            operation: OP_GUEST_UPDATE,
            field: "userID",
        })?;
        info!(user_id = %user_id, "updating guest password");

        let body = account.password_update(tenant, new_password.expose_secret());
        let envelope = self.post(session, OP_GUEST_UPDATE, &body).await?;

        Ok(UpdateAck {
            data: envelope.data.filter(|d| !d.is_null()),
        })
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// POST a JSON body to `/api/{path}` with the session cookie attached.
    async fn post(
        &self,
        session: &Session,
        path: &'static str,
        body: &(impl Serialize + Sync),
    ) -> Result<Envelope, Error> {
        let url = self.api_url(path)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .header(COOKIE, session.cookie_header())
            .json(body)
            .timeout(self.transport.request_timeout)
            .send()
            .await
            .map_err(|source| Error::Transport {
                operation: path,
                source,
            })?;

        read_envelope(path, resp).await
    }
}

/// Check the status, parse the body as JSON, and surface in-band errors.
async fn read_envelope(operation: &'static str, resp: reqwest::Response) -> Result<Envelope, Error> {
    let status = resp.status();
    debug!(operation, status = status.as_u16(), "response received");

    let body = resp
        .text()
        .await
        .map_err(|source| Error::Transport { operation, source })?;

    if !status.is_success() {
        return Err(Error::Status {
            operation,
            status: status.as_u16(),
            body_preview: preview(&body),
        });
    }

    let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        operation,
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body: body.clone(),
    })?;

    let envelope = if value.is_object() {
        serde_json::from_value(value).map_err(|e| Error::Deserialization {
            operation,
            message: e.to_string(),
            body: body.clone(),
        })?
    } else {
        Envelope::default()
    };

    if let Some(message) = envelope.business_error() {
        return Err(Error::Api { operation, message });
    }

    Ok(envelope)
}

/// Deserialize the envelope's `data`, treating `null`/absent as `None`.
fn decode_data<T: DeserializeOwned>(
    operation: &'static str,
    envelope: Envelope,
) -> Result<Option<T>, Error> {
    match envelope.data {
        None | Some(Value::Null) => Ok(None),
        Some(data) => T::deserialize(&data)
            .map(Some)
            .map_err(|e| Error::Deserialization {
                operation,
                message: e.to_string(),
                body: data.to_string(),
            }),
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
