use serde::{Deserialize, Serialize};

/// Objects returned by list endpoints expose an id used as the page cursor.
pub trait StripeObject {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl StripeObject for Subscription {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub amount_paid: i64,
    pub created: i64,
    #[serde(default)]
    pub lines: Option<StripeList<InvoiceLine>>,
}

impl StripeObject for Invoice {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceLine {
    #[serde(default)]
    pub price: Option<PriceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRef {
    pub id: String,
}

impl Invoice {
    /// True when any line item bills one of `price_ids`.
    pub fn bills_any(&self, price_ids: &[String]) -> bool {
        self.lines
            .iter()
            .flat_map(|lines| lines.data.iter())
            .filter_map(|line| line.price.as_ref())
            .any(|price| price_ids.iter().any(|id| *id == price.id))
    }
}

/// Optional body of `POST /api/stripe/checkout`.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    pub price_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RedirectUrl {
    pub url: String,
}
