// Controller API wire types
//
// Every response shares one envelope: `{ "data": {...}, "error": "..." }`.
// Business failures come back as HTTP 200 with a non-empty `error`, so the
// envelope is inspected before the payload is trusted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::TenantId;

// ── Response Envelope ────────────────────────────────────────────────

/// Standard controller response envelope.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl Envelope {
    /// The in-band error message, if the controller reported one.
    ///
    /// `null`, `false` and `""` all mean "no error"; any other value is
    /// treated as a failure and rendered as text.
    pub fn business_error(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

// ── Payloads ─────────────────────────────────────────────────────────

/// `data` of `GET /cvcue/keyLogin`.
#[derive(Debug, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub cookie: Option<String>,
}

/// `data` of `POST /api/org.info`.
#[derive(Debug, Deserialize)]
pub struct OrgInfo {
    #[serde(default, rename = "orgID")]
    pub org_id: Option<String>,
}

/// `data` of `POST /api/identity.guest.user.list`.
#[derive(Debug, Deserialize)]
pub struct GuestUserList {
    #[serde(default)]
    pub users: Option<Vec<GuestAccount>>,
}

/// Request body for `POST /api/identity.guest.user.list`.
#[derive(Debug, Serialize)]
pub struct GuestUserListRequest<'a> {
    #[serde(rename = "orgID")]
    pub org_id: &'a str,
    pub limit: usize,
}

// ── Guest account ────────────────────────────────────────────────────

/// A guest user exactly as the controller reported it.
///
/// The update endpoint is a full replace, so the account is kept as the
/// raw attribute map: nothing is dropped, defaulted, or reordered between
/// the list call and the update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestAccount(Map<String, Value>);

impl GuestAccount {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// All attributes as returned by the controller.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn user_id(&self) -> Option<&Value> {
        self.0.get("userID").filter(|v| !v.is_null())
    }

    pub fn login_name(&self) -> Option<&str> {
        self.0.get("loginName").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    /// Exact match on either the login name or the email address.
    pub fn matches(&self, login_or_email: &str) -> bool {
        self.login_name() == Some(login_or_email) || self.email() == Some(login_or_email)
    }

    /// Build the full-replace update body.
    ///
    /// Every attribute is echoed verbatim; only `orgID`, `password` and
    /// `sendEmail` are set. `sendEmail` is always `false` so a rotation
    /// never notifies the guest.
    pub fn password_update(&self, tenant: &TenantId, new_password: &str) -> Map<String, Value> {
        let mut body = self.0.clone();
        body.insert("orgID".into(), Value::String(tenant.as_str().to_owned()));
        body.insert("password".into(), Value::String(new_password.to_owned()));
        body.insert("sendEmail".into(), Value::Bool(false));
        body
    }
}

/// Acknowledgement of a successful guest update (`data` echoed back, if any).
#[derive(Debug, Clone, Default)]
pub struct UpdateAck {
    pub data: Option<Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn account(value: Value) -> GuestAccount {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn business_error_ignores_empty_values() {
        for raw in [json!({}), json!({"error": null}), json!({"error": ""}), json!({"error": false})] {
            let env: Envelope = serde_json::from_value(raw).unwrap();
            assert_eq!(env.business_error(), None);
        }
    }

    #[test]
    fn business_error_reports_message() {
        let env: Envelope = serde_json::from_value(json!({"error": "not authorized"})).unwrap();
        assert_eq!(env.business_error().as_deref(), Some("not authorized"));

        let env: Envelope = serde_json::from_value(json!({"error": {"code": 7}})).unwrap();
        assert_eq!(env.business_error().as_deref(), Some(r#"{"code":7}"#));
    }

    #[test]
    fn matches_login_name_or_email() {
        let guest = account(json!({"userID": 1, "loginName": "lobby", "email": "lobby@example.com"}));
        assert!(guest.matches("lobby"));
        assert!(guest.matches("lobby@example.com"));
        assert!(!guest.matches("Lobby"));
        assert!(!guest.matches("other@example.com"));
    }

    #[test]
    fn password_update_echoes_every_other_attribute() {
        let original = json!({
            "userID": "u-42",
            "loginName": "lobby",
            "email": "lobby@example.com",
            "name": "Lobby Screen",
            "company": "",
            "address": "1 Main St",
            "phone": "+1 555 0100",
            "notes": "do not delete",
            "portalID": 9,
            "batchID": 0,
            "deviceLimit": 3,
            "status": "enabled",
            "userType": "guest",
            "validFrom": 1_700_000_000,
            "validTo": 1_900_000_000,
            "pskPassphrase": "",
            "customField": {"nested": [1, 2, 3]},
            "password": "Old-Secret1",
            "sendEmail": true
        });
        let guest = account(original.clone());

        let body = guest.password_update(&TenantId::new("ORG1"), "Forest-Harbor7");

        let mut expected = original.as_object().unwrap().clone();
        expected.insert("orgID".into(), json!("ORG1"));
        expected.insert("password".into(), json!("Forest-Harbor7"));
        expected.insert("sendEmail".into(), json!(false));
        assert_eq!(body, expected);
    }

    #[test]
    fn password_update_does_not_invent_attributes() {
        let guest = account(json!({"userID": 5, "email": "a@b.c"}));
        let body = guest.password_update(&TenantId::new("ORG1"), "x");
        let mut keys: Vec<_> = body.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["email", "orgID", "password", "sendEmail", "userID"]);
    }
}
