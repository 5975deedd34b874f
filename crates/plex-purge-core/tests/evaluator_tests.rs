mod common;

use common::*;
use plex_purge_core::evaluator::{scan_catalog, RetentionEvaluator, ScanOptions};
use plex_purge_core::model::{ExemptReason, MediaDetail, Verdict, MAX_RATING};
use plex_purge_core::{Error, RunContext, SilentReporter};

fn ctx() -> RunContext {
    RunContext::at(test_policy(), fixed_now())
}

#[test]
fn test_old_unplayed_badly_rated_item_is_blacklisted() {
    let entry = make_entry("1", "A", 400);
    let inventory = FakeInventory::new().with_entry(entry.clone(), Some(bad_detail(Some("42"), None)));
    let ctx = ctx();

    let verdict = RetentionEvaluator::new(&ctx).evaluate(&entry, &inventory);

    match verdict {
        Verdict::Blacklist(item) => {
            assert_eq!(item.title, "A");
            assert_eq!(item.external_id.as_deref(), Some("42"));
            assert_eq!(item.critic_rating, 3.0);
            assert_eq!(item.audience_rating, 2.0);
            assert_eq!(item.file_size, 4_000);
        }
        other => panic!("expected blacklist, got {:?}", other),
    }
}

#[test]
fn test_popular_item_is_exempt() {
    let mut entry = make_entry("1", "A", 400);
    entry.play_count = 5;
    let inventory = FakeInventory::new().with_entry(entry.clone(), Some(bad_detail(None, None)));
    let ctx = ctx();

    let verdict = RetentionEvaluator::new(&ctx).evaluate(&entry, &inventory);

    assert_eq!(verdict, Verdict::Keep(ExemptReason::Popular));
    assert!(inventory.detail_requests.borrow().is_empty());
}

#[test]
fn test_missing_ratings_never_blacklist() {
    let ctx = ctx();
    let evaluator = RetentionEvaluator::new(&ctx);

    for (key, added) in [("1", 181), ("2", 400), ("3", 5000)] {
        let entry = make_entry(key, "Unrated", added);
        let detail = MediaDetail {
            external_id: Some("7".into()),
            ..MediaDetail::default()
        };
        assert_eq!(detail.critic_rating, MAX_RATING);
        assert_eq!(detail.audience_rating, MAX_RATING);
        let inventory = FakeInventory::new().with_entry(entry.clone(), Some(detail));

        assert_eq!(
            evaluator.evaluate(&entry, &inventory),
            Verdict::Keep(ExemptReason::WellRated)
        );
    }
}

#[test]
fn test_one_good_rating_is_enough() {
    let ctx = ctx();
    let evaluator = RetentionEvaluator::new(&ctx);
    let entry = make_entry("1", "Cult classic", 400);
    let detail = MediaDetail {
        critic_rating: 2.0,
        audience_rating: 7.0,
        ..MediaDetail::default()
    };
    let inventory = FakeInventory::new().with_entry(entry.clone(), Some(detail));

    assert_eq!(
        evaluator.evaluate(&entry, &inventory),
        Verdict::Keep(ExemptReason::WellRated)
    );
}

#[test]
fn test_too_new_dominates_later_checks() {
    let ctx = ctx();
    let evaluator = RetentionEvaluator::new(&ctx);

    // Bad ratings, no plays, missing metadata or a failing detail fetch: none
    // of them matter while the item is within the minimum age.
    let entry = make_entry("1", "Fresh", 179);
    let with_bad_detail = FakeInventory::new().with_entry(entry.clone(), Some(bad_detail(None, None)));
    let without_detail = FakeInventory::new().with_entry(entry.clone(), None);
    let mut failing = FakeInventory::new().with_entry(entry.clone(), None);
    failing.detail_errors.insert("1".into());

    for inventory in [&with_bad_detail, &without_detail, &failing] {
        assert_eq!(
            evaluator.evaluate(&entry, inventory),
            Verdict::Keep(ExemptReason::TooNew)
        );
        assert!(inventory.detail_requests.borrow().is_empty());
    }
}

#[test]
fn test_whitelist_dominates_everything() {
    let mut policy = test_policy();
    policy.whitelist.insert("Zootopia".to_string());
    let ctx = RunContext::at(policy, fixed_now());
    let evaluator = RetentionEvaluator::new(&ctx);

    let entry = make_entry("1", "Zootopia", 4000);
    let inventory = FakeInventory::new().with_entry(entry.clone(), Some(bad_detail(None, None)));

    assert_eq!(
        evaluator.evaluate(&entry, &inventory),
        Verdict::Keep(ExemptReason::Whitelisted)
    );

    // exact match only
    let other = make_entry("2", "zootopia", 4000);
    let inventory = FakeInventory::new().with_entry(other.clone(), Some(bad_detail(None, None)));
    assert!(matches!(
        evaluator.evaluate(&other, &inventory),
        Verdict::Blacklist(_)
    ));
}

#[test]
fn test_recently_watched_exemption_and_toggle() {
    let mut entry = make_entry("1", "Rewatched", 400);
    entry.play_count = 0;
    entry.last_played = Some(days_ago(30));
    let inventory = FakeInventory::new().with_entry(entry.clone(), Some(bad_detail(None, None)));

    let ctx = ctx();
    assert_eq!(
        RetentionEvaluator::new(&ctx).evaluate(&entry, &inventory),
        Verdict::Keep(ExemptReason::RecentlyWatched)
    );

    let mut policy = test_policy();
    policy.recently_watched_enabled = false;
    let ctx = RunContext::at(policy, fixed_now());
    assert!(matches!(
        RetentionEvaluator::new(&ctx).evaluate(&entry, &inventory),
        Verdict::Blacklist(_)
    ));
}

#[test]
fn test_never_played_is_not_recent() {
    let mut policy = test_policy();
    policy.min_play_count = 10;
    let ctx = RunContext::at(policy, fixed_now());

    let mut old_play = make_entry("1", "Long ago", 400);
    old_play.play_count = 2;
    old_play.last_played = Some(days_ago(366));
    let never = make_entry("2", "Never", 400);

    let inventory = FakeInventory::new()
        .with_entry(old_play.clone(), Some(bad_detail(None, None)))
        .with_entry(never.clone(), Some(bad_detail(None, None)));

    let evaluator = RetentionEvaluator::new(&ctx);
    assert!(matches!(evaluator.evaluate(&old_play, &inventory), Verdict::Blacklist(_)));
    assert!(matches!(evaluator.evaluate(&never, &inventory), Verdict::Blacklist(_)));
}

#[test]
fn test_missing_metadata_is_exempt() {
    let entry = make_entry("1", "Gone", 400);
    let inventory = FakeInventory::new().with_entry(entry.clone(), None);
    let ctx = ctx();

    assert_eq!(
        RetentionEvaluator::new(&ctx).evaluate(&entry, &inventory),
        Verdict::Keep(ExemptReason::MissingMetadata)
    );
}

#[test]
fn test_detail_fetch_error_is_exempt() {
    let entry = make_entry("1", "Flaky", 400);
    let mut inventory = FakeInventory::new().with_entry(entry.clone(), Some(bad_detail(None, None)));
    inventory.detail_errors.insert("1".into());
    let ctx = ctx();

    assert_eq!(
        RetentionEvaluator::new(&ctx).evaluate(&entry, &inventory),
        Verdict::Keep(ExemptReason::DetailUnavailable)
    );
}

#[test]
fn test_scan_catalog_counts_and_orders() {
    let mut popular = make_entry("2", "Popular", 400);
    popular.play_count = 3;
    let inventory = FakeInventory::new()
        .with_entry(make_entry("1", "Zeta", 400), Some(bad_detail(Some("1"), None)))
        .with_entry(popular, Some(bad_detail(None, None)))
        .with_entry(make_entry("3", "Alpha", 400), Some(bad_detail(Some("3"), None)))
        .with_entry(make_entry("4", "New", 10), None)
        .with_entry(make_entry("5", "Stale", 400), None);
    let ctx = ctx();

    let scan = scan_catalog(
        &ctx,
        &inventory,
        "1",
        ScanOptions {
            page_size: 2,
            refresh_cache: true,
        },
        &SilentReporter,
    )
    .unwrap();

    assert_eq!(scan.total_media_count, 5);
    let titles: Vec<&str> = scan.blacklist.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Zeta", "Alpha"]);
    assert_eq!(scan.reclaimable_bytes(), 8_000);
    assert_eq!(scan.exemptions.get(&ExemptReason::Popular), Some(&1));
    assert_eq!(scan.exemptions.get(&ExemptReason::TooNew), Some(&1));
    assert_eq!(scan.exemptions.get(&ExemptReason::MissingMetadata), Some(&1));

    // pages of two, refresh only on the first, stop at the empty page
    let requests = inventory.page_requests.borrow();
    assert_eq!(
        *requests,
        vec![(0, 2, true), (2, 2, false), (4, 2, false), (5, 2, false)]
    );
}

#[test]
fn test_scan_is_deterministic() {
    let inventory = FakeInventory::new()
        .with_entry(make_entry("1", "B", 400), Some(bad_detail(Some("1"), None)))
        .with_entry(make_entry("2", "A", 200), Some(bad_detail(Some("2"), None)))
        .with_entry(make_entry("3", "C", 100), Some(bad_detail(Some("3"), None)));
    let ctx = ctx();

    let first = scan_catalog(&ctx, &inventory, "1", ScanOptions::default(), &SilentReporter).unwrap();
    let second = scan_catalog(&ctx, &inventory, "1", ScanOptions::default(), &SilentReporter).unwrap();

    assert_eq!(first.blacklist, second.blacklist);
    assert_eq!(first.exemptions, second.exemptions);
    assert_eq!(first.blacklist.len(), 2);
}

#[test]
fn test_scan_page_failure_is_source_unavailable() {
    let mut inventory = FakeInventory::new()
        .with_entry(make_entry("1", "A", 400), Some(bad_detail(None, None)))
        .with_entry(make_entry("2", "B", 400), Some(bad_detail(None, None)));
    inventory.fail_page_at = Some(1);
    let ctx = ctx();

    let result = scan_catalog(
        &ctx,
        &inventory,
        "1",
        ScanOptions {
            page_size: 1,
            refresh_cache: false,
        },
        &SilentReporter,
    );

    assert!(matches!(result, Err(Error::SourceUnavailable(_))));
}

#[test]
fn test_empty_catalog() {
    let inventory = FakeInventory::new();
    let ctx = ctx();

    let scan = scan_catalog(&ctx, &inventory, "1", ScanOptions::default(), &SilentReporter).unwrap();

    assert_eq!(scan.total_media_count, 0);
    assert!(scan.blacklist.is_empty());
    assert_eq!(scan.reclaimable_bytes(), 0);
}
