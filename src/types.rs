/// Shared types used across the codebase

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A role claim, normalized to the upper-case name without `ROLE_`.
/// Claims the workflow does not know about are kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    PaLegal,
    CompanySecretary,
    ManagingDirector,
    ProcurementManager,
    FinanceDirector,
    TechnicalDirector,
    CommercialDirector,
    BusinessManager,
    Hod,
    User,
    Other(String),
}

impl Role {
    /// Every role the workflow recognizes, in display order
    pub const KNOWN: [Role; 11] = [
        Role::Admin,
        Role::PaLegal,
        Role::CompanySecretary,
        Role::ManagingDirector,
        Role::ProcurementManager,
        Role::FinanceDirector,
        Role::TechnicalDirector,
        Role::CommercialDirector,
        Role::BusinessManager,
        Role::Hod,
        Role::User,
    ];

    /// Parse a raw claim name, e.g. `role_hod` or `ROLE_ROLE_ADMIN`
    pub fn from_name(raw: &str) -> Role {
        let name = normalize_role_name(raw);
        match name.as_str() {
            "ADMIN" => Role::Admin,
            "PALEGAL" => Role::PaLegal,
            "COMPANYSECRETARY" => Role::CompanySecretary,
            "MANAGINGDIRECTOR" => Role::ManagingDirector,
            "PROCUREMENTMANAGER" => Role::ProcurementManager,
            "FINANCEDIRECTOR" => Role::FinanceDirector,
            "TECHNICALDIRECTOR" => Role::TechnicalDirector,
            "COMMERCIALDIRECTOR" => Role::CommercialDirector,
            "BUSINESSMANAGER" => Role::BusinessManager,
            "HOD" => Role::Hod,
            "USER" => Role::User,
            _ => Role::Other(name),
        }
    }

    /// Normalize one entry of a `roles`/`authorities` array.
    ///
    /// Strings are used directly, objects through their `name`; any other
    /// shape (or a blank name) yields nothing.
    pub fn from_claim(claim: &Value) -> Option<Role> {
        let name = match claim {
            Value::String(s) => s.as_str(),
            Value::Object(map) => map.get("name")?.as_str()?,
            _ => return None,
        };
        let name = normalize_role_name(name);
        if name.is_empty() {
            return None;
        }
        Some(Role::from_name(&name))
    }

    /// Normalize a whole claim list, dropping entries that are not roles
    pub fn from_claims(claims: &Value) -> Vec<Role> {
        match claims {
            Value::Array(items) => items.iter().filter_map(Role::from_claim).collect(),
            other => Role::from_claim(other).into_iter().collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::PaLegal => "PALEGAL",
            Role::CompanySecretary => "COMPANYSECRETARY",
            Role::ManagingDirector => "MANAGINGDIRECTOR",
            Role::ProcurementManager => "PROCUREMENTMANAGER",
            Role::FinanceDirector => "FINANCEDIRECTOR",
            Role::TechnicalDirector => "TECHNICALDIRECTOR",
            Role::CommercialDirector => "COMMERCIALDIRECTOR",
            Role::BusinessManager => "BUSINESSMANAGER",
            Role::Hod => "HOD",
            Role::User => "USER",
            Role::Other(name) => name,
        }
    }
}

/// Upper-case and strip every leading `ROLE_`
pub fn normalize_role_name(raw: &str) -> String {
    let mut name = raw.trim().to_uppercase();
    while let Some(rest) = name.strip_prefix("ROLE_") {
        name = rest.to_string();
    }
    name
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Role::from_name(&raw)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Role::from_name("hod"), Role::Hod);
        assert_eq!(Role::from_name("Role_PaLegal"), Role::PaLegal);
        assert_eq!(Role::from_name("ROLE_ROLE_ADMIN"), Role::Admin);
        assert_eq!(Role::from_name("auditor"), Role::Other("AUDITOR".into()));
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["role_finance", "ROLE_ROLE_x", "Hod", "  user "] {
            let once = normalize_role_name(raw);
            assert_eq!(normalize_role_name(&once), once);
        }
    }

    #[test]
    fn claims_accept_strings_and_named_objects() {
        let claims = json!(["ROLE_HOD", {"name": "financedirector"}, 7, null, {"id": 1}, ""]);
        assert_eq!(Role::from_claims(&claims), vec![Role::Hod, Role::FinanceDirector]);
    }

    #[test]
    fn non_string_claim_yields_nothing() {
        assert_eq!(Role::from_claim(&json!(true)), None);
        assert_eq!(Role::from_claim(&json!({"name": 3})), None);
    }

    #[test]
    fn serializes_as_plain_name() {
        let v = serde_json::to_value(vec![Role::Admin, Role::Other("X".into())]).unwrap();
        assert_eq!(v, json!(["ADMIN", "X"]));
        let back: Vec<Role> = serde_json::from_value(json!(["role_hod"])).unwrap();
        assert_eq!(back, vec![Role::Hod]);
    }
}
