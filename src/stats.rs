//! Read-only rollup of the subscriber table for the admin dashboard.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::subscriber::Subscriber;

const RECENT_SUBSCRIPTIONS: usize = 5;
const DAILY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberStats {
    pub total: usize,
    pub verified: usize,
    pub unverified: usize,
    pub recent_subscriptions: Vec<RecentSubscription>,
    pub daily_stats: Vec<DailyCount>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSubscription {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    pub verified: bool,
}

#[derive(Debug, PartialEq, serde::Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

impl SubscriberStats {
    pub fn compute(subscribers: &[Subscriber], now: DateTime<Utc>) -> SubscriberStats {
        let verified = subscribers.iter().filter(|s| s.is_verified()).count();

        let mut newest_first: Vec<&Subscriber> = subscribers.iter().collect();
        newest_first.sort_by(|a, b| b.subscribed_at.cmp(&a.subscribed_at));
        let recent_subscriptions = newest_first
            .into_iter()
            .take(RECENT_SUBSCRIPTIONS)
            .map(|s| RecentSubscription {
                email: mask_email(s.email.as_ref()),
                subscribed_at: s.subscribed_at,
                verified: s.is_verified(),
            })
            .collect();

        SubscriberStats {
            total: subscribers.len(),
            verified,
            unverified: subscribers.len() - verified,
            recent_subscriptions,
            daily_stats: daily_counts(subscribers, now),
        }
    }
}

/// One entry per UTC calendar day, oldest first, ending with `now`'s day.
fn daily_counts(subscribers: &[Subscriber], now: DateTime<Utc>) -> Vec<DailyCount> {
    let today = now.date_naive();

    (0..DAILY_WINDOW_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            let count = subscribers
                .iter()
                .filter(|s| s.subscribed_at.date_naive() == date)
                .count();

            DailyCount { date, count }
        })
        .collect()
}

/// Keeps the first two characters of the local part and the whole domain:
/// `ellie@example.com` becomes `el***@example.com`.
pub fn mask_email(email: &str) -> String {
    let Some(at) = email.rfind('@') else {
        return String::from("***");
    };
    let (local, domain) = email.split_at(at);
    let prefix: String = local.graphemes(true).take(2).collect();

    format!("{}***{}", prefix, domain)
}
