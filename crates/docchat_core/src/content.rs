//! Chat-visible text for answers, progress messages and summaries.
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{NewsItem, ScrapeReport};

/// Elapsed time after which scrape progress would reach the cap.
pub const SCRAPE_BASELINE: Duration = Duration::from_secs(30);
/// Estimated scrape progress never exceeds this before the backend answers.
pub const SCRAPE_PROGRESS_CAP: u8 = 90;
/// Number of articles listed in a news digest message.
pub const NEWS_DIGEST_LIMIT: usize = 5;

const SCRAPE_PROGRESS_FLOOR: u64 = 10;

/// Seconds with one decimal, e.g. `"2.5"`.
pub fn format_seconds(elapsed: Duration) -> String {
    format!("{:.1}", elapsed.as_secs_f64())
}

/// Appends the response-time footer to an answer. Sub-second timings keep
/// two decimals.
pub fn answer_with_footer(answer: &str, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    let seconds = if secs < 1.0 {
        format!("{secs:.2}")
    } else {
        format!("{secs:.1}")
    };
    format!("{answer}\n\n⏱️ {seconds}s")
}

/// Rounded percentage of `sent` over `total`, clamped to 100.
/// An unknown (zero) total counts as complete.
pub fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = u128::from(sent.min(total));
    let total = u128::from(total);
    ((sent * 100 + total / 2) / total) as u8
}

/// Time-based guess at scrape progress: starts at 10%, grows linearly over
/// the baseline and stops at the cap.
pub fn estimate_scrape_progress(elapsed: Duration) -> u8 {
    let span = 80 * elapsed.as_millis() / SCRAPE_BASELINE.as_millis();
    let estimate = SCRAPE_PROGRESS_FLOOR.saturating_add(span.min(u128::from(u64::MAX)) as u64);
    estimate.min(u64::from(SCRAPE_PROGRESS_CAP)) as u8
}

pub(crate) fn upload_started(name: &str) -> String {
    format!("📤 Starting upload: {name} (0%)")
}

pub(crate) fn upload_progress(name: &str, percent: u8, elapsed: Duration) -> String {
    format!(
        "📤 Uploading: {name} ({percent}%) [{}s]",
        format_seconds(elapsed)
    )
}

pub(crate) fn upload_done(name: &str, elapsed: Duration) -> String {
    format!("✅ Uploaded: {name} ({}s)", format_seconds(elapsed))
}

pub(crate) fn upload_failed(name: &str, elapsed: Duration, reason: &str) -> String {
    format!(
        "❌ Upload failed: {name} ({}s)\n{reason}",
        format_seconds(elapsed)
    )
}

pub(crate) fn scrape_started(url: &str) -> String {
    format!("🌐 Starting to scrape: {url}\nProgress: 0%")
}

pub(crate) fn scrape_progress(url: &str, percent: u8, elapsed: Duration) -> String {
    format!(
        "🌐 Scraping: {url}\nProgress: ~{percent}% (estimated) [{}s]",
        format_seconds(elapsed)
    )
}

pub(crate) fn scrape_done(requested_url: &str, report: &ScrapeReport, elapsed: Duration) -> String {
    let title = non_empty(report.detail_title.as_deref())
        .or_else(|| non_empty(report.title.as_deref()))
        .unwrap_or("Web content");
    let link = non_empty(report.detail_url.as_deref()).unwrap_or(requested_url);
    let chunks = report.chunks_generated.unwrap_or(0);
    format!(
        "✅ Scraped: {title}\n{link}\nProcessed {chunks} chunks in {}s",
        format_seconds(elapsed)
    )
}

pub(crate) fn scrape_rejection_reason(report: &ScrapeReport) -> &str {
    non_empty(report.message.as_deref())
        .or_else(|| non_empty(report.error.as_deref()))
        .unwrap_or("No content was extracted from the provided URL.")
}

pub(crate) fn scrape_failed(url: &str, reason: &str, elapsed: Duration) -> String {
    format!(
        "❌ Failed to scrape\n{url}\nReason: {reason} ({}s)",
        format_seconds(elapsed)
    )
}

/// Numbered digest of the first few articles, or `None` for an empty list.
pub fn news_digest(query: &str, items: &[NewsItem]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let lines: Vec<String> = items
        .iter()
        .take(NEWS_DIGEST_LIMIT)
        .enumerate()
        .map(|(index, item)| {
            let date = item
                .published_at
                .as_deref()
                .and_then(format_published_at)
                .map(|date| format!(" — {date}"))
                .unwrap_or_default();
            format!(
                "{}. {} — {}{}\n{}",
                index + 1,
                item.title,
                item.source,
                date,
                item.url
            )
        })
        .collect();
    Some(format!(
        "Here are the latest {query} news articles:\n\n{}",
        lines.join("\n\n")
    ))
}

fn format_published_at(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(
            parsed
                .with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M UTC")
                .to_string(),
        );
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(parsed.format("%Y-%m-%d %H:%M").to_string());
        }
    }
    Some(raw.to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
