//! Typed REST endpoints
//!
//! Each request type knows its method, its path (including query string) and
//! its response type. Path parameters are `#[serde(skip)]` so that only the
//! real body is serialized.

use crate::{
    AdminSummary, AgreementRequest, Announcement, ApartmentPage, Coupon, MutationAck,
    NewUserRecord, PaymentRecord, UserRecord,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;
    /// Whether `self` is serialized as the JSON body.
    const SENDS_BODY: bool = false;
    /// Path relative to the API base, with any query string.
    fn path(&self) -> String;
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn with_query<Q: Serialize>(path: &str, query: &Q) -> String {
    match serde_urlencoded::to_string(query) {
        Ok(qs) if !qs.is_empty() => format!("{}?{}", path, qs),
        _ => path.to_string(),
    }
}

// =========================================================
// Apartments
// =========================================================

/// `GET /apartments?page&limit&minRent&maxRent`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rent: Option<f64>,
}

impl ApiRequest for ApartmentQuery {
    type Response = ApartmentPage;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        with_query("/apartments", self)
    }
}

// =========================================================
// Agreements
// =========================================================

/// `POST /agreements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAgreementRequest {
    pub user_name: String,
    pub user_email: String,
    pub floor: u32,
    pub block: String,
    pub apartment_no: String,
    pub rent: f64,
}

impl ApiRequest for NewAgreementRequest {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Post;
    const SENDS_BODY: bool = true;

    fn path(&self) -> String {
        "/agreements".to_string()
    }
}

/// `GET /agreements?status=pending`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListPendingAgreements;

impl ApiRequest for ListPendingAgreements {
    type Response = Vec<AgreementRequest>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/agreements?status=pending".to_string()
    }
}

/// `PATCH /agreements/accept/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptAgreement {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for AcceptAgreement {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Patch;

    fn path(&self) -> String {
        format!("/agreements/accept/{}", segment(&self.id))
    }
}

/// `PATCH /agreements/reject/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectAgreement {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for RejectAgreement {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Patch;

    fn path(&self) -> String {
        format!("/agreements/reject/{}", segment(&self.id))
    }
}

// =========================================================
// Users
// =========================================================

impl ApiRequest for NewUserRecord {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Post;
    const SENDS_BODY: bool = true;

    fn path(&self) -> String {
        "/users".to_string()
    }
}

/// `GET /user/:email`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUser {
    #[serde(skip)]
    pub email: String,
}

impl ApiRequest for GetUser {
    type Response = UserRecord;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/user/{}", segment(&self.email))
    }
}

/// `GET /users/members`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListMembers;

impl ApiRequest for ListMembers {
    type Response = Vec<UserRecord>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/users/members".to_string()
    }
}

/// `PATCH /users/remove-member/:email`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveMember {
    #[serde(skip)]
    pub email: String,
}

impl ApiRequest for RemoveMember {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Patch;

    fn path(&self) -> String {
        format!("/users/remove-member/{}", segment(&self.email))
    }
}

// =========================================================
// Coupons
// =========================================================

/// `GET /coupons`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListCoupons;

impl ApiRequest for ListCoupons {
    type Response = Vec<Coupon>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/coupons".to_string()
    }
}

/// `POST /coupons`; availability is defaulted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCoupon {
    pub code: String,
    pub discount: f64,
    pub description: String,
}

impl ApiRequest for NewCoupon {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Post;
    const SENDS_BODY: bool = true;

    fn path(&self) -> String {
        "/coupons".to_string()
    }
}

/// `PATCH /coupons/:id` with `{"isAvailable": bool}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCouponAvailability {
    #[serde(skip)]
    pub id: String,
    pub is_available: bool,
}

impl ApiRequest for SetCouponAvailability {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Patch;
    const SENDS_BODY: bool = true;

    fn path(&self) -> String {
        format!("/coupons/{}", segment(&self.id))
    }
}

// =========================================================
// Announcements
// =========================================================

/// `POST /announcement`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub description: String,
}

impl ApiRequest for NewAnnouncement {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Post;
    const SENDS_BODY: bool = true;

    fn path(&self) -> String {
        "/announcement".to_string()
    }
}

/// `GET /announcement`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListAnnouncements;

impl ApiRequest for ListAnnouncements {
    type Response = Vec<Announcement>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/announcement".to_string()
    }
}

// =========================================================
// Payments
// =========================================================

impl ApiRequest for PaymentRecord {
    type Response = MutationAck;
    const METHOD: HttpMethod = HttpMethod::Post;
    const SENDS_BODY: bool = true;

    fn path(&self) -> String {
        "/payments".to_string()
    }
}

/// `GET /payments?email=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub email: String,
}

impl ApiRequest for PaymentHistory {
    type Response = Vec<PaymentRecord>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        with_query("/payments", self)
    }
}

/// `POST /create-payment-intent`
///
/// The coupon code travels with the amount so the backend can re-check it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntent {
    pub rent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentSecret {
    pub client_secret: String,
}

impl ApiRequest for CreatePaymentIntent {
    type Response = PaymentIntentSecret;
    const METHOD: HttpMethod = HttpMethod::Post;
    const SENDS_BODY: bool = true;

    fn path(&self) -> String {
        "/create-payment-intent".to_string()
    }
}

// =========================================================
// Admin
// =========================================================

/// `GET /admin/summary`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GetAdminSummary;

impl ApiRequest for GetAdminSummary {
    type Response = AdminSummary;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/admin/summary".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apartment_query_string() {
        let q = ApartmentQuery {
            page: Some(2),
            limit: None,
            min_rent: Some(500.0),
            max_rent: Some(1500.0),
        };
        assert_eq!(q.path(), "/apartments?page=2&minRent=500.0&maxRent=1500.0");
        assert_eq!(ApartmentQuery::default().path(), "/apartments");
    }

    #[test]
    fn test_path_params_are_encoded_and_not_serialized() {
        let req = RemoveMember {
            email: "jo doe@x.io".to_string(),
        };
        assert_eq!(req.path(), "/users/remove-member/jo%20doe%40x.io");
        assert_eq!(serde_json::to_string(&req).unwrap(), "{}");

        let toggle = SetCouponAvailability {
            id: "c1".to_string(),
            is_available: false,
        };
        assert_eq!(toggle.path(), "/coupons/c1");
        assert_eq!(
            serde_json::to_string(&toggle).unwrap(),
            r#"{"isAvailable":false}"#
        );
    }

    #[test]
    fn test_payment_history_query() {
        let req = PaymentHistory {
            email: "m@b.c".to_string(),
        };
        assert_eq!(req.path(), "/payments?email=m%40b.c");
    }
}
