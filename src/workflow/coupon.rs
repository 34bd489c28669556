use super::required;
use crate::client::SecuredClient;
use crate::error::{AppError, AppResult};
use crate::query::{QueryCache, QueryKey};
use crate::request::HttpClient;
use oneroof_shared::Coupon;
use oneroof_shared::protocol::{ListCoupons, NewCoupon, SetCouponAvailability};
use std::rc::Rc;
use tracing::info;

/// Coupon form input, discount still as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CouponDraft {
    pub code: String,
    pub discount: String,
    pub description: String,
}

impl CouponDraft {
    /// Percentage must lie in `(0, 100]`.
    pub fn validate(&self) -> AppResult<NewCoupon> {
        let code = required(&self.code, "Coupon code")?;
        let discount: f64 = self
            .discount
            .trim()
            .parse()
            .map_err(|_| AppError::validation("Discount must be a number"))?;
        if !(discount > 0.0 && discount <= 100.0) {
            return Err(AppError::validation(
                "Discount must be greater than 0 and at most 100",
            ));
        }
        let description = required(&self.description, "Description")?;
        Ok(NewCoupon {
            code,
            discount,
            description,
        })
    }
}

/// Coupons visible to the public marketing section.
pub fn marketing_coupons(coupons: &[Coupon]) -> Vec<Coupon> {
    coupons.iter().filter(|c| c.is_available).cloned().collect()
}

pub struct CouponAdmin<H: HttpClient> {
    client: Rc<SecuredClient<H>>,
    cache: Rc<QueryCache>,
}

impl<H: HttpClient> CouponAdmin<H> {
    pub fn new(client: Rc<SecuredClient<H>>, cache: Rc<QueryCache>) -> Self {
        Self { client, cache }
    }

    pub async fn list(&self) -> AppResult<Vec<Coupon>> {
        self.client.send(&ListCoupons).await
    }

    pub async fn create(&self, draft: &CouponDraft) -> AppResult<NewCoupon> {
        let coupon = draft.validate()?;
        self.client.send(&coupon).await?;
        info!(code = %coupon.code, discount = coupon.discount, "coupon created");
        self.cache.invalidate(QueryKey::Coupons);
        Ok(coupon)
    }

    /// Returns the new availability.
    pub async fn toggle_availability(&self, coupon: &Coupon) -> AppResult<bool> {
        let is_available = !coupon.is_available;
        self.client
            .send(&SetCouponAvailability {
                id: coupon.id.clone(),
                is_available,
            })
            .await?;
        info!(code = %coupon.code, is_available, "coupon availability changed");
        self.cache.invalidate(QueryKey::Coupons);
        Ok(is_available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::MockHttpClient;
    use crate::session::SessionStore;
    use crate::test_support::{BASE_URL, FakeAuthProvider, identity, url};
    use oneroof_shared::protocol::HttpMethod;
    use serde_json::json;

    fn admin() -> (CouponAdmin<MockHttpClient>, Rc<QueryCache>) {
        let session = Rc::new(SessionStore::new(FakeAuthProvider::default()));
        session.handle_auth_state_changed(Some(identity("admin", "admin@b.c")));
        let client = Rc::new(SecuredClient::new(MockHttpClient::new(), BASE_URL, session));
        let cache = Rc::new(QueryCache::new());
        (CouponAdmin::new(client, cache.clone()), cache)
    }

    fn draft(discount: &str) -> CouponDraft {
        CouponDraft {
            code: " WELCOME10 ".to_string(),
            discount: discount.to_string(),
            description: "Ten percent off".to_string(),
        }
    }

    #[test]
    fn test_discount_bounds() {
        assert_eq!(draft("10").validate().unwrap().code, "WELCOME10");
        assert!(draft("100").validate().is_ok());
        for bad in ["0", "-5", "100.5", "ten", ""] {
            assert!(
                matches!(draft(bad).validate(), Err(AppError::Validation(_))),
                "{} accepted",
                bad
            );
        }
        let no_desc = CouponDraft {
            description: " ".to_string(),
            ..draft("10")
        };
        assert!(no_desc.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_posts_without_availability() {
        let (admin, cache) = admin();
        admin
            .client
            .http()
            .mock_response(HttpMethod::Post, &url("/coupons"), 200, json!({"insertedId": "c1"}));

        admin.create(&draft("10")).await.unwrap();
        let body = admin.client.http().requests_to(HttpMethod::Post, &url("/coupons"))[0].body_json();
        assert_eq!(
            body,
            json!({"code": "WELCOME10", "discount": 10.0, "description": "Ten percent off"})
        );
        assert_eq!(cache.version(&QueryKey::Coupons), 1);
    }

    #[tokio::test]
    async fn test_invalid_draft_sends_nothing() {
        let (admin, cache) = admin();
        assert!(admin.create(&draft("0")).await.is_err());
        assert!(admin.client.http().requests.borrow().is_empty());
        assert_eq!(cache.version(&QueryKey::Coupons), 0);
    }

    #[tokio::test]
    async fn test_toggle_flips_and_invalidates() {
        let (admin, cache) = admin();
        admin
            .client
            .http()
            .mock_response(HttpMethod::Patch, &url("/coupons/c1"), 200, json!({"modifiedCount": 1}));
        let coupon = Coupon {
            id: "c1".to_string(),
            code: "SAVE20".to_string(),
            discount: 20.0,
            description: String::new(),
            is_available: true,
        };

        assert!(!admin.toggle_availability(&coupon).await.unwrap());
        let body = admin.client.http().requests_to(HttpMethod::Patch, &url("/coupons/c1"))[0].body_json();
        assert_eq!(body, json!({"isAvailable": false}));
        assert_eq!(cache.version(&QueryKey::Coupons), 1);
    }

    #[test]
    fn test_marketing_hides_unavailable() {
        let mk = |code: &str, available: bool| Coupon {
            id: code.to_string(),
            code: code.to_string(),
            discount: 5.0,
            description: String::new(),
            is_available: available,
        };
        let shown = marketing_coupons(&[mk("A", true), mk("B", false)]);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].code, "A");
    }
}
