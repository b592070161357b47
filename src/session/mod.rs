//! The signed-in user, built once from the authenticate response and passed
//! explicitly to everything that needs identity or credentials.

use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::middleware::ForwardedAuth;
use crate::types::Role;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Authentication response did not include an access token")]
    MissingToken,

    #[error("Authentication response was not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub profile: Profile,
}

impl Session {
    /// Build a session from whatever shape the backend answered with.
    ///
    /// The token may be `access_token`, `accessToken` or `token`; roles
    /// `roles` or `authorities`; the id `id`, `userId` or `user_id`. Fields
    /// may also sit under a nested `user` object. Roles and email missing
    /// from the body are read from the token's claims.
    pub fn from_auth_response(response: &Value) -> Result<Session, SessionError> {
        let body = response.as_object().ok_or(SessionError::NotAnObject)?;
        let user = body.get("user").and_then(Value::as_object);
        let lookup = |keys: &[&str]| -> Option<&Value> {
            keys.iter()
                .find_map(|k| body.get(*k).filter(|v| !v.is_null()))
                .or_else(|| user.and_then(|u| keys.iter().find_map(|k| u.get(*k).filter(|v| !v.is_null()))))
        };

        let access_token = lookup(&["access_token", "accessToken", "token"])
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::MissingToken)?
            .to_string();

        let claims = token_claims(&access_token);

        let mut roles = lookup(&["roles", "authorities"])
            .map(Role::from_claims)
            .unwrap_or_default();
        if roles.is_empty() {
            if let Some(claims) = &claims {
                roles = ["roles", "authorities"]
                    .iter()
                    .find_map(|k| claims.get(*k))
                    .map(Role::from_claims)
                    .unwrap_or_default();
            }
        }

        let email = lookup(&["email"])
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                claims
                    .as_ref()
                    .and_then(|c| c.get("email").or_else(|| c.get("sub")))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .filter(|e| !e.trim().is_empty());

        let user_id = lookup(&["id", "userId", "user_id"]).and_then(scalar_string);

        let text = |key: &str| lookup(&[key]).and_then(scalar_string);
        let profile = Profile {
            firstname: text("firstname"),
            lastname: text("lastname"),
            phone: text("phone"),
            role: text("role"),
        };

        Ok(Session {
            access_token,
            auth: true,
            email,
            user_id,
            roles,
            profile,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth && !self.access_token.trim().is_empty()
    }

    pub fn forwarded_auth(&self) -> ForwardedAuth {
        ForwardedAuth::bearer(&self.access_token)
    }

    /// Refresh cached profile fields from a user record
    pub fn apply_profile(&mut self, user: &Value) {
        let field = |key: &str| user.get(key).and_then(scalar_string);
        self.profile = Profile {
            firstname: field("firstname").or(self.profile.firstname.take()),
            lastname: field("lastname").or(self.profile.lastname.take()),
            phone: field("phone").or(self.profile.phone.take()),
            role: field("role").or(self.profile.role.take()),
        };
        if let Some(email) = field("email") {
            self.email = Some(email);
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Claims of a JWT, read without checking its signature.
///
/// Only used to fill in identity the response body left out; the backend
/// still verifies the token on every request.
pub fn token_claims(token: &str) -> Option<Map<String, Value>> {
    let header = decode_header(token).ok()?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn jwt(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend-secret")).unwrap()
    }

    #[test]
    fn reads_snake_case_response() {
        let session = Session::from_auth_response(&json!({
            "access_token": "abc",
            "email": "hod@example.com",
            "id": 12,
            "roles": ["ROLE_HOD"],
            "firstname": "Ada",
            "lastname": "Lovelace"
        }))
        .unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.email.as_deref(), Some("hod@example.com"));
        assert_eq!(session.user_id.as_deref(), Some("12"));
        assert_eq!(session.roles, vec![Role::Hod]);
        assert_eq!(session.profile.display_name().as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn reads_camel_case_and_authorities() {
        let session = Session::from_auth_response(&json!({
            "accessToken": "abc",
            "user": {"userId": "u-1", "authorities": [{"name": "ROLE_TECHNICALDIRECTOR"}]}
        }))
        .unwrap();
        assert_eq!(session.user_id.as_deref(), Some("u-1"));
        assert_eq!(session.roles, vec![Role::TechnicalDirector]);
    }

    #[test]
    fn falls_back_to_token_claims() {
        let token = jwt(json!({"sub": "legal@example.com", "roles": ["ROLE_PALEGAL"], "exp": 1}));
        let session = Session::from_auth_response(&json!({ "token": token })).unwrap();
        assert_eq!(session.email.as_deref(), Some("legal@example.com"));
        assert_eq!(session.roles, vec![Role::PaLegal]);
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(
            Session::from_auth_response(&json!({"email": "x@y.z"})),
            Err(SessionError::MissingToken)
        ));
        assert!(matches!(
            Session::from_auth_response(&json!("nope")),
            Err(SessionError::NotAnObject)
        ));
    }

    #[test]
    fn opaque_token_has_no_claims() {
        assert!(token_claims("not-a-jwt").is_none());
    }

    #[test]
    fn profile_refresh_keeps_missing_fields() {
        let mut session = Session {
            access_token: "t".into(),
            auth: true,
            profile: Profile {
                firstname: Some("Ada".into()),
                phone: Some("123".into()),
                ..Profile::default()
            },
            ..Session::default()
        };
        session.apply_profile(&json!({"firstname": "Grace", "email": "g@example.com"}));
        assert_eq!(session.profile.firstname.as_deref(), Some("Grace"));
        assert_eq!(session.profile.phone.as_deref(), Some("123"));
        assert_eq!(session.email.as_deref(), Some("g@example.com"));
    }
}
