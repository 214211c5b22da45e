use super::read_json;
use crate::config::StripeConfig;
use crate::error::BlundersError;
use crate::types::billing::{
    CheckoutSession, Customer, Invoice, PortalSession, StripeList, StripeObject, Subscription,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const SERVICE: &str = "payments";
const PAGE_SIZE: &str = "100";

/// Form-encoded client for the payments provider's REST API.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base: Url,
    secret_key: Arc<str>,
}

impl StripeClient {
    pub fn new(http: reqwest::Client, cfg: &StripeConfig) -> Result<Self, BlundersError> {
        Ok(Self {
            http,
            base: cfg.api_base.join("v1/")?,
            secret_key: Arc::from(cfg.secret_key.as_str()),
        })
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, BlundersError> {
        debug!(path, "payments POST");
        let resp = self
            .http
            .post(self.base.join(path)?)
            .bearer_auth(self.secret_key.as_ref())
            .form(form)
            .send()
            .await?;
        read_json(SERVICE, resp).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BlundersError> {
        debug!(path, "payments GET");
        let resp = self
            .http
            .get(self.base.join(path)?)
            .bearer_auth(self.secret_key.as_ref())
            .query(query)
            .send()
            .await?;
        read_json(SERVICE, resp).await
    }

    /// Walk every page of a list endpoint using `starting_after` cursors.
    async fn list_all<T>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>, BlundersError>
    where
        T: DeserializeOwned + StripeObject,
    {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut params: Vec<(&str, String)> = query.to_vec();
            params.push(("limit", PAGE_SIZE.to_string()));
            if let Some(after) = cursor.take() {
                params.push(("starting_after", after));
            }
            let page: StripeList<T> = self.get(path, &params).await?;
            let next = page.data.last().map(|obj| obj.id().to_string());
            items.extend(page.data);
            match next {
                Some(after) if page.has_more => cursor = Some(after),
                _ => break,
            }
        }
        Ok(items)
    }

    pub async fn create_customer(
        &self,
        email: Option<&str>,
        user_id: &str,
    ) -> Result<Customer, BlundersError> {
        let mut form = vec![("metadata[user_id]", user_id.to_string())];
        if let Some(email) = email {
            form.push(("email", email.to_string()));
        }
        let customer: Customer = self.post("customers", &form).await?;
        info!(customer = %customer.id, user_id, "created billing customer");
        Ok(customer)
    }

    pub async fn create_checkout_session(
        &self,
        customer: &str,
        price: &str,
        user_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BlundersError> {
        let form = [
            ("mode", "subscription".to_string()),
            ("customer", customer.to_string()),
            ("client_reference_id", user_id.to_string()),
            ("line_items[0][price]", price.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
        ];
        self.post("checkout/sessions", &form).await
    }

    pub async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, BlundersError> {
        let form = [("cancel_at_period_end", "true".to_string())];
        self.post(&format!("subscriptions/{subscription_id}"), &form)
            .await
    }

    /// Hosted portal session that lands directly on the payment-method form.
    pub async fn create_payment_update_session(
        &self,
        customer: &str,
        return_url: &str,
    ) -> Result<PortalSession, BlundersError> {
        let form = [
            ("customer", customer.to_string()),
            ("return_url", return_url.to_string()),
            ("flow_data[type]", "payment_method_update".to_string()),
        ];
        self.post("billing_portal/sessions", &form).await
    }

    pub async fn list_subscriptions(
        &self,
        price: &str,
        status: &str,
    ) -> Result<Vec<Subscription>, BlundersError> {
        let query = [("price", price.to_string()), ("status", status.to_string())];
        self.list_all("subscriptions", &query).await
    }

    /// Every paid invoice on the account.
    pub async fn list_paid_invoices(&self) -> Result<Vec<Invoice>, BlundersError> {
        self.list_all("invoices", &[("status", "paid".to_string())])
            .await
    }
}
