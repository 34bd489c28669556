use crate::client::SecuredClient;
use crate::error::{AppError, AppResult};
use crate::request::HttpClient;
use oneroof_shared::protocol::ApartmentQuery;
use oneroof_shared::{Apartment, ApartmentPage};
use std::rc::Rc;

/// Home page "featured" strip.
pub const FEATURED_LIMIT: u32 = 6;
pub const PAGE_SIZE: u32 = 6;

/// Rent range as typed into the filter form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RentFilter {
    pub min_rent: Option<f64>,
    pub max_rent: Option<f64>,
}

impl RentFilter {
    pub fn parse(min: &str, max: &str) -> AppResult<Self> {
        let filter = Self {
            min_rent: parse_amount(min, "Minimum rent")?,
            max_rent: parse_amount(max, "Maximum rent")?,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> AppResult<()> {
        if let (Some(min), Some(max)) = (self.min_rent, self.max_rent) {
            if min > max {
                return Err(AppError::validation(
                    "Minimum rent cannot exceed maximum rent",
                ));
            }
        }
        Ok(())
    }

    pub fn query(&self, page: u32) -> ApartmentQuery {
        ApartmentQuery {
            page: Some(page),
            limit: Some(PAGE_SIZE),
            min_rent: self.min_rent,
            max_rent: self.max_rent,
        }
    }
}

fn parse_amount(raw: &str, field: &str) -> AppResult<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(Some(v)),
        _ => Err(AppError::validation(format!(
            "{} must be a non-negative number",
            field
        ))),
    }
}

pub struct ApartmentCatalog<H: HttpClient> {
    client: Rc<SecuredClient<H>>,
}

impl<H: HttpClient> ApartmentCatalog<H> {
    pub fn new(client: Rc<SecuredClient<H>>) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &ApartmentQuery) -> AppResult<ApartmentPage> {
        if query.page == Some(0) {
            return Err(AppError::validation("Pages start at 1"));
        }
        RentFilter {
            min_rent: query.min_rent,
            max_rent: query.max_rent,
        }
        .validate()?;
        self.client.send(query).await
    }

    pub async fn featured(&self) -> AppResult<Vec<Apartment>> {
        let query = ApartmentQuery {
            page: Some(1),
            limit: Some(FEATURED_LIMIT),
            ..Default::default()
        };
        let mut page = self.list(&query).await?;
        page.apartments.truncate(FEATURED_LIMIT as usize);
        Ok(page.apartments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::MockHttpClient;
    use crate::session::SessionStore;
    use crate::test_support::{BASE_URL, FakeAuthProvider, url};
    use oneroof_shared::protocol::HttpMethod;
    use serde_json::json;

    fn catalog() -> ApartmentCatalog<MockHttpClient> {
        let session = Rc::new(SessionStore::new(FakeAuthProvider::default()));
        ApartmentCatalog::new(Rc::new(SecuredClient::new(
            MockHttpClient::new(),
            BASE_URL,
            session,
        )))
    }

    #[test]
    fn test_rent_filter_parse() {
        assert_eq!(RentFilter::parse("", "").unwrap(), RentFilter::default());
        let f = RentFilter::parse("500", " 1500 ").unwrap();
        assert_eq!(f.max_rent, Some(1500.0));
        assert!(RentFilter::parse("2000", "1000").is_err());
        assert!(RentFilter::parse("-1", "").is_err());
        assert!(RentFilter::parse("abc", "").is_err());
    }

    #[tokio::test]
    async fn test_list_sends_filters_in_query() {
        let c = catalog();
        c.client.http().mock_response(
            HttpMethod::Get,
            &url("/apartments?page=2&limit=6&minRent=500.0"),
            200,
            json!({"apartments": [], "total": 7, "page": 2, "totalPages": 2}),
        );
        let filter = RentFilter {
            min_rent: Some(500.0),
            max_rent: None,
        };
        let page = c.list(&filter.query(2)).await.unwrap();
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_page_zero_is_rejected_locally() {
        let c = catalog();
        let query = ApartmentQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(c.list(&query).await, Err(AppError::Validation(_))));
        assert!(c.client.http().requests.borrow().is_empty());
    }
}
