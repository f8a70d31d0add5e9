//! End-to-end scenarios for dashboard-core.
//!
//! These run against in-memory and on-disk stores; no other setup needed:
//! `cargo test --package dashboard-core --test scenarios`

use std::collections::HashSet;

use dashboard_core::{
    ChartRequest, Dashboard, DashboardOptions, ErrorKind, Freshness, FreshnessToken,
    LabelFormatter, PageCursor,
};
use dashboard_store::{Store, StoreOptions};
use proptest::prelude::*;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

fn utc_dashboard() -> Dashboard {
    let options = DashboardOptions {
        labels: LabelFormatter::from_name("UTC").unwrap(),
        ..Default::default()
    };
    Dashboard::new(Store::open_in_memory().unwrap(), options)
}

/// Walk every page until the last one and return `(recorded_at, id)` of
/// every row in the order served.
async fn drain(dashboard: &Dashboard, limit: u64) -> Vec<(OffsetDateTime, i64)> {
    let mut rows = Vec::new();
    let mut cursor = PageCursor::first(limit);
    loop {
        let page = dashboard.fetch_page(cursor).await.unwrap();
        rows.extend(page.rows.iter().map(|r| (r.recorded_at, r.id)));
        if page.is_last() {
            return rows;
        }
        cursor = page.next_cursor();
    }
}

/// Newest first across page boundaries, ties broken by descending ID.
fn is_strictly_descending(rows: &[(OffsetDateTime, i64)]) -> bool {
    rows.windows(2).all(|w| w[0] > w[1])
}

#[tokio::test]
async fn test_hourly_buckets_scenario() {
    let dashboard = utc_dashboard();
    for (ts, t) in [
        (datetime!(2024-01-01 00:10 UTC), 20.0),
        (datetime!(2024-01-01 00:50 UTC), 22.0),
        (datetime!(2024-01-01 01:10 UTC), 24.0),
    ] {
        dashboard.record_reading_at(ts, t, 50.0).await.unwrap();
    }

    let series = dashboard
        .fetch_chart_at(
            datetime!(2024-01-01 02:00 UTC),
            ChartRequest::new(Duration::hours(2), Duration::hours(1)),
        )
        .await
        .unwrap();

    assert_eq!(series.labels, vec!["01/01 00:00", "01/01 01:00"]);
    assert_eq!(series.temperature, vec![21.0, 24.0]);
    assert_eq!(series.humidity, vec![50.0, 50.0]);
}

#[tokio::test]
async fn test_series_lengths_match() {
    let dashboard = utc_dashboard();
    let start = datetime!(2024-03-01 00:00 UTC);
    for i in 0..50 {
        dashboard
            .record_reading_at(start + Duration::minutes(i * 17), 20.0 + i as f64, 40.0)
            .await
            .unwrap();
    }

    let series = dashboard
        .fetch_chart_at(
            start + Duration::days(1),
            ChartRequest::new(Duration::days(2), Duration::minutes(45)),
        )
        .await
        .unwrap();

    assert!(!series.is_empty());
    assert_eq!(series.labels.len(), series.temperature.len());
    assert_eq!(series.labels.len(), series.humidity.len());
}

#[tokio::test]
async fn test_empty_range_gives_empty_series() {
    let dashboard = utc_dashboard();
    dashboard
        .record_reading_at(datetime!(2020-01-01 00:00 UTC), 20.0, 40.0)
        .await
        .unwrap();

    let series = dashboard
        .fetch_chart_at(datetime!(2024-01-01 00:00 UTC), ChartRequest::default())
        .await
        .unwrap();

    assert!(series.labels.is_empty());
    assert!(series.temperature.is_empty());
    assert!(series.humidity.is_empty());
}

#[tokio::test]
async fn test_bucket_alignment_is_stable_across_windows() {
    let dashboard = utc_dashboard();
    let start = datetime!(2024-01-01 00:00 UTC);
    for i in 0..24 {
        dashboard
            .record_reading_at(start + Duration::minutes(i * 13), i as f64, 50.0)
            .await
            .unwrap();
    }

    let request = ChartRequest::new(Duration::hours(6), Duration::minutes(30));
    let a = dashboard
        .fetch_chart_at(datetime!(2024-01-01 05:00 UTC), request)
        .await
        .unwrap();
    let b = dashboard
        .fetch_chart_at(datetime!(2024-01-01 05:07 UTC), request)
        .await
        .unwrap();

    // Buckets both windows fully cover must agree exactly.
    let shared = ["01/01 01:00", "01/01 02:00", "01/01 03:00", "01/01 04:00"];
    for label in shared {
        let ia = a.labels.iter().position(|l| l == label).unwrap();
        let ib = b.labels.iter().position(|l| l == label).unwrap();
        assert_eq!(a.temperature[ia], b.temperature[ib]);
        assert_eq!(a.humidity[ia], b.humidity[ib]);
    }
}

#[tokio::test]
async fn test_non_positive_interval_is_invalid_argument() {
    let dashboard = utc_dashboard();
    for interval in [Duration::ZERO, Duration::seconds(-1)] {
        let err = dashboard
            .fetch_chart(ChartRequest::new(Duration::days(1), interval))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(!err.is_retryable());
    }
}

#[tokio::test]
async fn test_pagination_is_complete_without_duplicates() {
    let dashboard = utc_dashboard();
    let same_instant = datetime!(2024-01-01 12:00 UTC);
    for i in 0..23 {
        // Every third reading collides on the timestamp
        let ts = if i % 3 == 0 {
            same_instant
        } else {
            same_instant + Duration::seconds(i)
        };
        dashboard.record_reading_at(ts, i as f64, 50.0).await.unwrap();
    }

    let rows = drain(&dashboard, 5).await;
    assert_eq!(rows.len(), 23);
    assert_eq!(rows.iter().map(|r| r.1).collect::<HashSet<_>>().len(), 23);
    assert!(is_strictly_descending(&rows));
}

#[tokio::test]
async fn test_exact_multiple_needs_one_extra_empty_page() {
    let dashboard = utc_dashboard();
    for i in 0..20 {
        dashboard.record_reading(i as f64, 50.0).await.unwrap();
    }

    let second = dashboard.fetch_page(PageCursor::new(10, 10)).await.unwrap();
    assert_eq!(second.rows.len(), 10);
    assert!(!second.is_last());

    let third = dashboard.fetch_page(second.next_cursor()).await.unwrap();
    assert!(third.rows.is_empty());
    assert!(third.is_last());
}

#[tokio::test]
async fn test_zero_limit_on_non_empty_store() {
    let dashboard = utc_dashboard();
    dashboard.record_reading(21.0, 50.0).await.unwrap();

    let page = dashboard.fetch_page(PageCursor::new(0, 0)).await.unwrap();
    assert!(page.rows.is_empty());
    assert!(page.is_last());
}

#[tokio::test]
async fn test_out_of_range_values_are_stored_unchanged() {
    let dashboard = utc_dashboard();
    let id = dashboard.record_reading(-999.0, 50.0).await.unwrap();

    let page = dashboard.fetch_page(PageCursor::default()).await.unwrap();
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].id, id);
    assert_eq!(page.rows[0].temperature, -999.0);
    assert_eq!(page.rows[0].humidity, 50.0);
}

#[tokio::test]
async fn test_last_updated_is_monotonic() {
    let dashboard = utc_dashboard();
    assert_eq!(dashboard.last_updated().await.unwrap(), None);

    let mut previous: Option<OffsetDateTime> = None;
    for _ in 0..5 {
        dashboard.record_reading(20.0, 50.0).await.unwrap();
        let current = dashboard.last_updated().await.unwrap();
        assert!(current.is_some());
        assert!(current >= previous);
        previous = current;
    }
}

#[tokio::test]
async fn test_freshness_round_trip() {
    let dashboard = utc_dashboard();
    dashboard
        .record_reading_at(datetime!(2024-01-01 01:10 UTC), 24.0, 50.0)
        .await
        .unwrap();

    let page = dashboard.fetch_page(PageCursor::default()).await.unwrap();
    let token = page.last_updated.unwrap();

    let freshness = dashboard
        .check_freshness(Some(&token.to_etag()))
        .await
        .unwrap();
    assert_eq!(freshness, Freshness::NotModified);

    dashboard
        .record_reading_at(datetime!(2024-01-01 01:20 UTC), 25.0, 50.0)
        .await
        .unwrap();

    let freshness = dashboard
        .check_freshness(Some(&token.to_etag()))
        .await
        .unwrap();
    let current = freshness.current().unwrap();
    assert!(current > token);
    assert_eq!(
        current,
        FreshnessToken::new(datetime!(2024-01-01 01:20 UTC))
    );
}

#[tokio::test]
async fn test_writes_within_one_second_yield_distinct_tokens() {
    let dashboard = utc_dashboard();
    let base = datetime!(2024-01-01 01:10:00 UTC);
    dashboard.record_reading_at(base, 20.0, 50.0).await.unwrap();
    let first = dashboard.check_freshness(None).await.unwrap().current();

    dashboard
        .record_reading_at(base + Duration::milliseconds(250), 20.0, 50.0)
        .await
        .unwrap();
    let second = dashboard.check_freshness(None).await.unwrap().current();

    assert_ne!(first, second);
}

#[tokio::test]
async fn test_on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("sensor.db");

    {
        let store = Store::open_with_options(&path, StoreOptions::default()).unwrap();
        let dashboard = Dashboard::new(store, DashboardOptions::default());
        dashboard.record_reading(19.5, 60.0).await.unwrap();
    }

    let dashboard = Dashboard::new(Store::open(&path).unwrap(), DashboardOptions::default());
    assert_eq!(dashboard.count_readings().await.unwrap(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn pagination_visits_every_reading_once(count in 0usize..60, limit in 1u64..15) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let rows = runtime.block_on(async {
            let dashboard = utc_dashboard();
            let base = datetime!(2024-01-01 00:00 UTC);
            for i in 0..count {
                // Timestamps collide in pairs to exercise the tie-break
                let ts = base + Duration::seconds((i / 2) as i64);
                dashboard.record_reading_at(ts, i as f64, 50.0).await.unwrap();
            }
            drain(&dashboard, limit).await
        });

        prop_assert_eq!(rows.len(), count);
        prop_assert_eq!(rows.iter().map(|r| r.1).collect::<HashSet<_>>().len(), count);
        prop_assert!(is_strictly_descending(&rows));
    }
}
