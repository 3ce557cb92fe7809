//! Hebrew-calendar collaborator.
//!
//! The Gregorian/Hebrew conversion itself is external: the `HebrewCalendar`
//! trait is the seam, and `HebcalClient` talks to the Hebcal converter API
//! the way the original web app did. `NullHebrewCalendar` keeps the app
//! usable offline; entries then simply carry no Hebrew enrichment.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use log::debug;
use serde::Deserialize;

/// Enrichment values for a single birth date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HebrewEnrichment {
    /// Hebrew date display string, e.g. "15th of Sivan, 5775"
    pub hebrew_date: Option<String>,
    /// Next Gregorian occurrence of the Hebrew birthday
    pub next_birthday: Option<NaiveDate>,
}

#[async_trait]
pub trait HebrewCalendar: Send + Sync {
    async fn enrich(&self, birth_date: NaiveDate, after_sunset: bool) -> Result<HebrewEnrichment>;
}

/// Collaborator stand-in that performs no conversion.
#[derive(Clone, Default)]
pub struct NullHebrewCalendar;

#[async_trait]
impl HebrewCalendar for NullHebrewCalendar {
    async fn enrich(&self, _birth_date: NaiveDate, _after_sunset: bool) -> Result<HebrewEnrichment> {
        Ok(HebrewEnrichment::default())
    }
}

const DEFAULT_BASE_URL: &str = "https://www.hebcal.com";

/// HTTP client for the Hebcal date converter.
#[derive(Clone)]
pub struct HebcalClient {
    http: reqwest::Client,
    base_url: String,
}

/// Gregorian-to-Hebrew conversion response (the fields we use).
#[derive(Debug, Deserialize)]
struct GregorianToHebrew {
    hebrew: String,
    hd: u32,
    hm: String,
    hy: i32,
}

/// Hebrew-to-Gregorian conversion response.
#[derive(Debug, Deserialize)]
struct HebrewToGregorian {
    gy: i32,
    gm: u32,
    gd: u32,
}

impl HebcalClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn to_hebrew(&self, date: NaiveDate, after_sunset: bool) -> Result<GregorianToHebrew> {
        let mut query = vec![
            ("cfg", "json".to_string()),
            ("gy", date.year().to_string()),
            ("gm", date.month().to_string()),
            ("gd", date.day().to_string()),
            ("g2h", "1".to_string()),
        ];
        if after_sunset {
            query.push(("gs", "on".to_string()));
        }

        let url = format!("{}/converter", self.base_url);
        debug!("Hebcal g2h request for {}", date);
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .context("Hebcal converter request failed")?
            .error_for_status()
            .context("Hebcal converter returned an error status")?;

        response
            .json()
            .await
            .context("Failed to decode Hebcal converter response")
    }

    async fn to_gregorian(&self, hy: i32, hm: &str, hd: u32) -> Result<NaiveDate> {
        let url = format!("{}/converter", self.base_url);
        let response: HebrewToGregorian = self
            .http
            .get(&url)
            .query(&[
                ("cfg", "json".to_string()),
                ("hy", hy.to_string()),
                ("hm", hm.to_string()),
                ("hd", hd.to_string()),
                ("h2g", "1".to_string()),
            ])
            .send()
            .await
            .context("Hebcal converter request failed")?
            .error_for_status()
            .context("Hebcal converter returned an error status")?
            .json()
            .await
            .context("Failed to decode Hebcal converter response")?;

        NaiveDate::from_ymd_opt(response.gy, response.gm, response.gd)
            .context("Hebcal returned an invalid Gregorian date")
    }
}

impl Default for HebcalClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HebrewCalendar for HebcalClient {
    async fn enrich(&self, birth_date: NaiveDate, after_sunset: bool) -> Result<HebrewEnrichment> {
        let hebrew = self.to_hebrew(birth_date, after_sunset).await?;
        let today = Utc::now().date_naive();

        // The anniversary falls in this Hebrew year or the next; take the
        // first occurrence that is still ahead of us.
        let current_hy = self.to_hebrew(today, false).await?.hy;
        let mut next_birthday = None;
        for hy in [current_hy, current_hy + 1] {
            let candidate = self.to_gregorian(hy, &hebrew.hm, hebrew.hd).await?;
            if candidate >= today {
                next_birthday = Some(candidate);
                break;
            }
        }

        Ok(HebrewEnrichment {
            hebrew_date: Some(hebrew.hebrew),
            next_birthday,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_calendar_returns_empty_enrichment() {
        let calendar = NullHebrewCalendar;
        let date = NaiveDate::from_ymd_opt(2015, 6, 15).unwrap();
        let enrichment = calendar.enrich(date, true).await.unwrap();
        assert_eq!(enrichment, HebrewEnrichment::default());
    }

    #[test]
    fn test_g2h_response_decodes() {
        let json = r#"{"gy":2015,"gm":6,"gd":15,"hebrew":"כ״ח בסיון תשע״ה","hd":28,"hm":"Sivan","hy":5775,"events":[]}"#;
        let decoded: GregorianToHebrew = serde_json::from_str(json).unwrap();
        assert_eq!(decoded.hd, 28);
        assert_eq!(decoded.hm, "Sivan");
        assert_eq!(decoded.hy, 5775);
        assert!(!decoded.hebrew.is_empty());
    }

    #[test]
    fn test_h2g_response_decodes() {
        let json = r#"{"hy":5786,"hm":"Sivan","hd":28,"gy":2026,"gm":6,"gd":13}"#;
        let decoded: HebrewToGregorian = serde_json::from_str(json).unwrap();
        assert_eq!((decoded.gy, decoded.gm, decoded.gd), (2026, 6, 13));
    }
}
