//! OneRoof wire types
//!
//! Shared by the workflow core and the browser frontend. Field names follow the
//! backend's JSON (camelCase, Mongo-style `_id`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod date;
pub mod protocol;

pub use date::{Month, Timestamp};

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

// =========================================================
// 角色 (Role)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Member,
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

// =========================================================
// 公寓 (Apartment)
// =========================================================

/// Floor/block/number/rent of one apartment, as copied onto a member's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentAttrs {
    pub floor: u32,
    pub block: String,
    pub apartment_no: String,
    pub rent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Apartment {
    #[serde(rename = "_id")]
    pub id: String,
    pub floor: u32,
    pub block: String,
    pub apartment_no: String,
    pub rent: f64,
    #[serde(default)]
    pub image: Option<String>,
}

impl Apartment {
    pub fn attrs(&self) -> ApartmentAttrs {
        ApartmentAttrs {
            floor: self.floor,
            block: self.block.clone(),
            apartment_no: self.apartment_no.clone(),
            rent: self.rent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ApartmentPage {
    pub apartments: Vec<Apartment>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

// =========================================================
// 用户 (UserRecord)
// =========================================================

/// Backend-owned profile of one identity.
///
/// Apartment fields are flat on the wire and all absent for a plain user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub floor: Option<u32>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub apartment_no: Option<String>,
    #[serde(default)]
    pub rent: Option<f64>,
    #[serde(default)]
    pub agreement_at: Option<Timestamp>,
}

impl UserRecord {
    /// The assigned apartment, only when every attribute is present.
    pub fn apartment(&self) -> Option<ApartmentAttrs> {
        Some(ApartmentAttrs {
            floor: self.floor?,
            block: self.block.clone()?,
            apartment_no: self.apartment_no.clone()?,
            rent: self.rent?,
        })
    }

    fn has_any_apartment_field(&self) -> bool {
        self.floor.is_some()
            || self.block.is_some()
            || self.apartment_no.is_some()
            || self.rent.is_some()
    }

    /// Members carry a full apartment, users carry none. Admins are unconstrained.
    pub fn is_consistent(&self) -> bool {
        match self.role {
            Role::Member => self.apartment().is_some(),
            Role::User => !self.has_any_apartment_field(),
            Role::Admin => true,
        }
    }
}

/// Body of `POST /users`, written once after sign-up or first OAuth sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub role: Role,
    pub created_at: Timestamp,
}

// =========================================================
// 租赁申请 (AgreementRequest)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgreementStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl AgreementStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AgreementStatus::Pending => "pending",
            AgreementStatus::Accepted => "accepted",
            AgreementStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        !matches!(self, AgreementStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementRequest {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    #[serde(default)]
    pub user_img: Option<String>,
    pub floor: u32,
    pub block: String,
    pub apartment_no: String,
    pub rent: f64,
    #[serde(default)]
    pub status: AgreementStatus,
    pub created_date: Timestamp,
}

impl AgreementRequest {
    pub fn attrs(&self) -> ApartmentAttrs {
        ApartmentAttrs {
            floor: self.floor,
            block: self.block.clone(),
            apartment_no: self.apartment_no.clone(),
            rent: self.rent,
        }
    }
}

// =========================================================
// 优惠券 (Coupon)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id")]
    pub id: String,
    pub code: String,
    /// Percentage in `(0, 100]`.
    pub discount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

// =========================================================
// 支付 (PaymentRecord)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Completed,
}

/// One persisted rent payment. Written once per confirmed gateway charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "email")]
    pub user_email: String,
    pub floor: u32,
    pub block: String,
    pub apartment_no: String,
    pub month: Month,
    /// Amount actually charged, after any coupon.
    pub rent: f64,
    pub transaction_id: String,
    pub date: Timestamp,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

fn default_payment_method() -> String {
    "card".to_string()
}

// =========================================================
// 公告 (Announcement)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: Timestamp,
}

// =========================================================
// 管理员统计 (AdminSummary)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminInfo {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminSummary {
    pub admin: Option<AdminInfo>,
    pub total_users: u64,
    pub total_members: u64,
    pub total_rooms: u64,
    pub available_rooms: u64,
    pub agreement_percentage: f64,
    pub available_percentage: f64,
}

// =========================================================
// 通用响应 (Mutation acknowledgement)
// =========================================================

/// Whatever the backend returns for a write. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MutationAck {
    pub acknowledged: bool,
    pub inserted_id: Option<String>,
    pub modified_count: Option<u64>,
    pub message: Option<String>,
}

/// Error body shape used by the backend for 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_record_without_apartment() {
        let user: UserRecord = serde_json::from_value(json!({
            "_id": "u1",
            "email": "a@b.c",
            "name": "Ada",
            "role": "user"
        }))
        .unwrap();

        assert_eq!(user.role, Role::User);
        assert!(user.apartment().is_none());
        assert!(user.is_consistent());
    }

    #[test]
    fn test_member_requires_full_apartment() {
        let mut member: UserRecord = serde_json::from_value(json!({
            "email": "m@b.c",
            "role": "member",
            "floor": 3,
            "block": "B",
            "apartmentNo": "302",
            "rent": 1200.0,
            "agreementAt": "2025-03-01T00:00:00Z"
        }))
        .unwrap();

        assert!(member.is_consistent());
        assert_eq!(member.apartment().unwrap().apartment_no, "302");

        member.rent = None;
        assert!(!member.is_consistent());
    }

    #[test]
    fn test_coupon_defaults_to_available() {
        let coupon: Coupon = serde_json::from_value(json!({
            "_id": "c1",
            "code": "WELCOME10",
            "discount": 10
        }))
        .unwrap();
        assert!(coupon.is_available);
    }

    #[test]
    fn test_payment_record_accepts_email_alias() {
        let record: PaymentRecord = serde_json::from_value(json!({
            "email": "m@b.c",
            "floor": 1,
            "block": "A",
            "apartmentNo": "101",
            "month": "March",
            "rent": 800.0,
            "transactionId": "pi_1",
            "date": "2025-03-02T10:00:00Z",
            "status": "completed",
            "paymentMethod": "card"
        }))
        .unwrap();
        assert_eq!(record.user_email, "m@b.c");
        assert_eq!(record.month, Month::March);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }
}
