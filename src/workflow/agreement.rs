//! Agreement requests: a visitor asks to rent an apartment, an admin decides.
//!
//! The one-pending-request-per-user rule is the backend's; a duplicate
//! submission comes back as a backend error and is surfaced as such.

use crate::client::SecuredClient;
use crate::error::{AppError, AppResult};
use crate::query::{QueryCache, QueryKey};
use crate::request::HttpClient;
use crate::route::Navigation;
use crate::session::Identity;
use oneroof_shared::protocol::{
    AcceptAgreement, ListPendingAgreements, NewAgreementRequest, RejectAgreement,
};
use oneroof_shared::{AgreementRequest, AgreementStatus, Apartment};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// Nothing was sent; the caller should navigate.
    SignInRequired(Navigation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    InFlight,
    Decided(AgreementStatus),
}

pub struct AgreementWorkflow<H: HttpClient> {
    client: Rc<SecuredClient<H>>,
    cache: Rc<QueryCache>,
    decisions: RefCell<HashMap<String, Decision>>,
}

impl<H: HttpClient> AgreementWorkflow<H> {
    pub fn new(client: Rc<SecuredClient<H>>, cache: Rc<QueryCache>) -> Self {
        Self {
            client,
            cache,
            decisions: RefCell::new(HashMap::new()),
        }
    }

    pub async fn submit_request(
        &self,
        identity: Option<&Identity>,
        apartment: &Apartment,
        from_path: &str,
    ) -> AppResult<SubmitOutcome> {
        let Some(identity) = identity else {
            debug!(apartment = %apartment.id, "agreement request needs sign-in");
            return Ok(SubmitOutcome::SignInRequired(Navigation::sign_in_from(
                from_path,
            )));
        };

        let attrs = apartment.attrs();
        let request = NewAgreementRequest {
            user_name: identity.name_or_email().to_string(),
            user_email: identity.email.clone(),
            floor: attrs.floor,
            block: attrs.block,
            apartment_no: attrs.apartment_no,
            rent: attrs.rent,
        };
        self.client.send(&request).await?;
        info!(email = %identity.email, apartment = %apartment.apartment_no, "agreement requested");
        self.cache.invalidate(QueryKey::Apartments);
        Ok(SubmitOutcome::Submitted)
    }

    /// Only `pending` requests; decided ones are not listed anywhere.
    pub async fn pending_requests(&self) -> AppResult<Vec<AgreementRequest>> {
        let requests = self.client.send(&ListPendingAgreements).await?;
        Ok(requests
            .into_iter()
            .filter(|r| r.status == AgreementStatus::Pending)
            .collect())
    }

    /// A decision for this id is running or has completed in this session.
    pub fn is_locked(&self, id: &str) -> bool {
        self.decisions.borrow().contains_key(id)
    }

    fn begin_decision(&self, request: &AgreementRequest) -> AppResult<()> {
        let mut decisions = self.decisions.borrow_mut();
        match decisions.get(&request.id) {
            Some(Decision::InFlight) => Err(AppError::validation(
                "A decision for this request is already in progress",
            )),
            Some(Decision::Decided(status)) => Err(AppError::validation(format!(
                "This request was already {}",
                status.as_str()
            ))),
            None if request.status.is_terminal() => Err(AppError::validation(format!(
                "This request was already {}",
                request.status.as_str()
            ))),
            None => {
                decisions.insert(request.id.clone(), Decision::InFlight);
                Ok(())
            }
        }
    }

    fn finish_decision(&self, id: &str, outcome: Option<AgreementStatus>) {
        let mut decisions = self.decisions.borrow_mut();
        match outcome {
            Some(status) => {
                decisions.insert(id.to_string(), Decision::Decided(status));
            }
            // Failed calls may be retried.
            None => {
                decisions.remove(id);
            }
        }
    }

    /// Accept; the backend promotes the requester to member. Returns the
    /// confirmation text naming the new member.
    pub async fn accept_request(&self, request: &AgreementRequest) -> AppResult<String> {
        self.begin_decision(request)?;
        let result = self
            .client
            .send(&AcceptAgreement {
                id: request.id.clone(),
            })
            .await;
        if let Err(e) = result {
            self.finish_decision(&request.id, None);
            return Err(e);
        }
        self.finish_decision(&request.id, Some(AgreementStatus::Accepted));

        info!(id = %request.id, email = %request.user_email, "agreement accepted");
        self.cache.invalidate_all([
            QueryKey::PendingAgreements,
            QueryKey::Members,
            QueryKey::UserProfile(request.user_email.clone()),
            QueryKey::AdminSummary,
            QueryKey::Apartments,
        ]);
        Ok(format!("{} is now a member.", request.user_name))
    }

    pub async fn reject_request(&self, request: &AgreementRequest) -> AppResult<String> {
        self.begin_decision(request)?;
        let result = self
            .client
            .send(&RejectAgreement {
                id: request.id.clone(),
            })
            .await;
        if let Err(e) = result {
            self.finish_decision(&request.id, None);
            return Err(e);
        }
        self.finish_decision(&request.id, Some(AgreementStatus::Rejected));

        info!(id = %request.id, "agreement rejected");
        self.cache.invalidate(QueryKey::PendingAgreements);
        Ok(format!("Request from {} was rejected.", request.user_name))
    }
}
