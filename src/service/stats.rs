use crate::api::{Access, StripeClient, SupabaseClient};
use crate::error::BlundersError;
use crate::types::billing::Invoice;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use tracing::info;

static COUNTED_STATUSES: [&str; 3] = ["active", "canceled", "past_due"];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionCounts {
    pub active: u64,
    pub canceled: u64,
    pub past_due: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Revenue {
    pub total: i64,
    pub this_month: i64,
    pub last_month: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductStats {
    pub subscriptions: SubscriptionCounts,
    pub mrr_cents: i64,
    pub revenue: Revenue,
    pub profiles: u64,
    pub conversion_pct: f64,
    pub churn_pct: f64,
}

/// Gather subscriber, revenue and signup numbers for the configured prices.
pub async fn collect(
    stripe: &StripeClient,
    db: &SupabaseClient,
    price_ids: &[String],
    price_cents: i64,
    now: DateTime<Utc>,
) -> Result<ProductStats, BlundersError> {
    let lookups = price_ids.iter().flat_map(move |price| {
        COUNTED_STATUSES.iter().map(move |status| async move {
            let subs = stripe.list_subscriptions(price, status).await?;
            Ok::<_, BlundersError>((*status, subs.len() as u64))
        })
    });

    let (counts, invoices, profiles) = futures::try_join!(
        try_join_all(lookups),
        stripe.list_paid_invoices(),
        db.count("profiles", &[], Access::Service),
    )?;

    let mut subscriptions = SubscriptionCounts::default();
    for (status, n) in counts {
        match status {
            "active" => subscriptions.active += n,
            "canceled" => subscriptions.canceled += n,
            _ => subscriptions.past_due += n,
        }
    }
    let revenue = bucket_revenue(&invoices, price_ids, now);
    info!(
        active = subscriptions.active,
        invoices = invoices.len(),
        profiles,
        "collected product stats"
    );
    Ok(reshape(subscriptions, revenue, profiles, price_cents))
}

fn reshape(
    subscriptions: SubscriptionCounts,
    revenue: Revenue,
    profiles: u64,
    price_cents: i64,
) -> ProductStats {
    let mrr_cents = subscriptions.active as i64 * price_cents;
    let conversion_pct = percent(subscriptions.active, profiles);
    let churn_pct = percent(
        subscriptions.canceled,
        subscriptions.active + subscriptions.canceled,
    );
    ProductStats {
        subscriptions,
        mrr_cents,
        revenue,
        profiles,
        conversion_pct,
        churn_pct,
    }
}

/// `part / whole` as a percentage rounded to two places; 0 for an empty whole.
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

/// Sum paid amounts of product invoices into all-time, this calendar month and
/// the previous one (UTC).
pub fn bucket_revenue(invoices: &[Invoice], price_ids: &[String], now: DateTime<Utc>) -> Revenue {
    let this_month = month_start(now.year(), now.month());
    let last_month = if now.month() == 1 {
        month_start(now.year() - 1, 12)
    } else {
        month_start(now.year(), now.month() - 1)
    };

    invoices
        .iter()
        .filter(|inv| inv.bills_any(price_ids))
        .fold(Revenue::default(), |mut acc, inv| {
            acc.total += inv.amount_paid;
            if inv.created >= this_month {
                acc.this_month += inv.amount_paid;
            } else if inv.created >= last_month {
                acc.last_month += inv.amount_paid;
            }
            acc
        })
}

fn month_start(year: i32, month: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp())
        .unwrap_or(i64::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::billing::{InvoiceLine, PriceRef, StripeList};

    fn invoice(amount: i64, created: DateTime<Utc>, price: &str) -> Invoice {
        Invoice {
            id: format!("in_{amount}_{}", created.timestamp()),
            amount_paid: amount,
            created: created.timestamp(),
            lines: Some(StripeList {
                data: vec![InvoiceLine {
                    price: Some(PriceRef { id: price.to_string() }),
                }],
                has_more: false,
            }),
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn buckets_by_calendar_month() {
        let prices = vec!["price_month".to_string()];
        let invoices = vec![
            invoice(499, at(2026, 10, 3), "price_month"),
            invoice(499, at(2026, 9, 30), "price_month"),
            invoice(499, at(2026, 8, 15), "price_month"),
            invoice(10_000, at(2026, 10, 5), "price_unrelated"),
        ];
        let revenue = bucket_revenue(&invoices, &prices, at(2026, 10, 16));
        assert_eq!(
            revenue,
            Revenue {
                total: 1497,
                this_month: 499,
                last_month: 499
            }
        );
    }

    #[test]
    fn january_looks_back_to_previous_december() {
        let prices = vec!["price_month".to_string()];
        let invoices = vec![
            invoice(499, at(2026, 12, 20), "price_month"),
            invoice(499, at(2026, 11, 20), "price_month"),
        ];
        let revenue = bucket_revenue(&invoices, &prices, at(2027, 1, 2));
        assert_eq!(revenue.this_month, 0);
        assert_eq!(revenue.last_month, 499);
        assert_eq!(revenue.total, 998);
    }

    #[test]
    fn ratios_are_rounded_and_safe_on_zero() {
        let stats = reshape(
            SubscriptionCounts {
                active: 2,
                canceled: 1,
                past_due: 0,
            },
            Revenue::default(),
            3,
            499,
        );
        assert_eq!(stats.mrr_cents, 998);
        assert_eq!(stats.conversion_pct, 66.67);
        assert_eq!(stats.churn_pct, 33.33);

        let empty = reshape(SubscriptionCounts::default(), Revenue::default(), 0, 499);
        assert_eq!(empty.conversion_pct, 0.0);
        assert_eq!(empty.churn_pct, 0.0);
    }
}
