//! 访客统计
//!
//! | range | 起点 | 分桶 |
//! |-------|------|------|
//! | hour  | now - 1h | 分钟 `%Y-%m-%dT%H:%M` |
//! | day   | now - 1d | 小时 `%Y-%m-%dT%H` |
//! | week  | now - 7d | 天 `%Y-%m-%d` |
//! | month | now - 1 个月 | 天 |
//! | year  | now - 12 个月 | 月 `%Y-%m` |
//! | all   | - | 天 |
//!
//! 所有分桶键均为 UTC，按字典序即时间序。

use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use shared::models::{TimeRange, VisitorChart, VisitorHit, VisitorSummary};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

use crate::db::repository::visitor;
use crate::utils::{AppError, AppResult};

/// 仪表盘默认关注的页面
pub const DEFAULT_PATH: &str = "/speech-to-text";

const MAX_PATH_LEN: usize = 512;

/// 时间范围的起点 (毫秒)，`all` 为 `None`
pub fn since(range: TimeRange, now: DateTime<Utc>) -> Option<i64> {
    let start = match range {
        TimeRange::All => return None,
        TimeRange::Hour => now - Duration::hours(1),
        TimeRange::Day => now - Duration::days(1),
        TimeRange::Week => now - Duration::days(7),
        TimeRange::Month => now.checked_sub_months(Months::new(1))?,
        TimeRange::Year => now.checked_sub_months(Months::new(12))?,
    };
    Some(start.timestamp_millis())
}

fn bucket_format(range: TimeRange) -> &'static str {
    match range {
        TimeRange::Hour => "%Y-%m-%dT%H:%M",
        TimeRange::Day => "%Y-%m-%dT%H",
        TimeRange::Week | TimeRange::Month | TimeRange::All => "%Y-%m-%d",
        TimeRange::Year => "%Y-%m",
    }
}

/// 时间戳所在的分桶键
pub fn bucket_key(range: TimeRange, timestamp_millis: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_millis)
        .single()
        .map(|t| t.format(bucket_format(range)).to_string())
        .unwrap_or_default()
}

/// 按分桶汇总；两条序列共用同一组排好序的标签
pub fn build_chart(range: TimeRange, path: &str, hits: &[VisitorHit]) -> VisitorChart {
    let mut buckets: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for hit in hits {
        let entry = buckets.entry(bucket_key(range, hit.timestamp)).or_default();
        entry.0 += 1;
        if hit.path == path {
            entry.1 += 1;
        }
    }

    let mut chart = VisitorChart {
        range,
        path: path.to_string(),
        labels: Vec::with_capacity(buckets.len()),
        all: Vec::with_capacity(buckets.len()),
        path_series: Vec::with_capacity(buckets.len()),
    };
    for (label, (all, on_path)) in buckets {
        chart.labels.push(label);
        chart.all.push(all);
        chart.path_series.push(on_path);
    }
    chart
}

/// 规范化页面路径
pub fn normalize_path(path: &str) -> AppResult<String> {
    let path = path.trim();
    if path.is_empty() {
        return Err(AppError::validation("path is required").with_detail("field", "path"));
    }
    if path.len() > MAX_PATH_LEN {
        return Err(AppError::validation("path is too long").with_detail("max", MAX_PATH_LEN));
    }
    Ok(path.to_string())
}

/// 记录一次访问
pub async fn record_hit(pool: &SqlitePool, path: &str) -> AppResult<VisitorHit> {
    let path = normalize_path(path)?;
    let hit = visitor::insert(pool, &path, shared::util::now_millis()).await?;
    tracing::debug!(path = %hit.path, "Visitor hit recorded");
    Ok(hit)
}

pub async fn summary(pool: &SqlitePool, range: TimeRange, path: &str) -> AppResult<VisitorSummary> {
    let from = since(range, Utc::now());
    let total = visitor::count_since(pool, from, None).await?;
    let path_count = visitor::count_since(pool, from, Some(path)).await?;
    Ok(VisitorSummary {
        range,
        path: path.to_string(),
        total,
        path_count,
    })
}

pub async fn chart(pool: &SqlitePool, range: TimeRange, path: &str) -> AppResult<VisitorChart> {
    let hits = visitor::find_since(pool, since(range, Utc::now())).await?;
    Ok(build_chart(range, path, &hits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn hit(path: &str, ts: &str) -> VisitorHit {
        VisitorHit {
            id: 0,
            path: path.into(),
            timestamp: at(ts).timestamp_millis(),
        }
    }

    #[test]
    fn test_since_per_range() {
        let now = at("2024-03-31T12:00:00Z");
        assert_eq!(since(TimeRange::All, now), None);
        assert_eq!(
            since(TimeRange::Hour, now),
            Some(at("2024-03-31T11:00:00Z").timestamp_millis())
        );
        assert_eq!(
            since(TimeRange::Week, now),
            Some(at("2024-03-24T12:00:00Z").timestamp_millis())
        );
        // 2 月没有 31 日，落到月末
        assert_eq!(
            since(TimeRange::Month, now),
            Some(at("2024-02-29T12:00:00Z").timestamp_millis())
        );
        assert_eq!(
            since(TimeRange::Year, now),
            Some(at("2023-03-31T12:00:00Z").timestamp_millis())
        );
    }

    #[test]
    fn test_bucket_keys() {
        let ts = at("2024-05-06T07:08:09Z").timestamp_millis();
        assert_eq!(bucket_key(TimeRange::Hour, ts), "2024-05-06T07:08");
        assert_eq!(bucket_key(TimeRange::Day, ts), "2024-05-06T07");
        assert_eq!(bucket_key(TimeRange::Week, ts), "2024-05-06");
        assert_eq!(bucket_key(TimeRange::Month, ts), "2024-05-06");
        assert_eq!(bucket_key(TimeRange::Year, ts), "2024-05");
        assert_eq!(bucket_key(TimeRange::All, ts), "2024-05-06");
    }

    #[test]
    fn test_chart_shares_sorted_labels() {
        let hits = vec![
            hit("/", "2024-05-07T10:00:00Z"),
            hit(DEFAULT_PATH, "2024-05-06T09:00:00Z"),
            hit("/", "2024-05-06T11:00:00Z"),
            hit(DEFAULT_PATH, "2024-05-08T01:00:00Z"),
        ];
        let chart = build_chart(TimeRange::Week, DEFAULT_PATH, &hits);

        assert_eq!(chart.labels, vec!["2024-05-06", "2024-05-07", "2024-05-08"]);
        assert_eq!(chart.all, vec![2, 1, 1]);
        assert_eq!(chart.path_series, vec![1, 0, 1]);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("  /events ").unwrap(), "/events");
        assert!(normalize_path("   ").is_err());
        assert!(normalize_path(&"a".repeat(MAX_PATH_LEN + 1)).is_err());
    }

    #[tokio::test]
    async fn test_summary_counts_paths() {
        let db = DbService::in_memory().await.unwrap();
        for path in [DEFAULT_PATH, "/", DEFAULT_PATH, "/events"] {
            record_hit(&db.pool, path).await.unwrap();
        }
        // 超出范围的旧记录
        visitor::insert(&db.pool, DEFAULT_PATH, at("2001-01-01T00:00:00Z").timestamp_millis())
            .await
            .unwrap();

        let day = summary(&db.pool, TimeRange::Day, DEFAULT_PATH).await.unwrap();
        assert_eq!((day.total, day.path_count), (4, 2));

        let all = summary(&db.pool, TimeRange::All, DEFAULT_PATH).await.unwrap();
        assert_eq!((all.total, all.path_count), (5, 3));

        let chart = chart(&db.pool, TimeRange::All, DEFAULT_PATH).await.unwrap();
        assert_eq!(chart.all.iter().sum::<i64>(), 5);
        assert_eq!(chart.labels.first().map(String::as_str), Some("2001-01-01"));
    }
}
