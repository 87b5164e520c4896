// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with FIRESTORE_EMULATOR_HOST pointing at a running emulator.
//!
//! The emulator keeps state for the whole run, so every test works under
//! its own user ID.

use chrono::{Duration, Utc};
use pubcrawl_tracker::db::Datastore;
use pubcrawl_tracker::error::AppError;
use pubcrawl_tracker::models::{Completion, Profile};

mod common;
use common::test_db;

/// Generate a unique user ID for test isolation.
fn unique_user_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("it-user-{}", nanos)
}

fn completion(user_id: &str, activity_id: &str, minutes: i64) -> Completion {
    let checked_in = Utc::now() - Duration::minutes(minutes);
    Completion::new(
        user_id,
        activity_id,
        checked_in,
        Utc::now(),
        format!("https://photos.example.com/{}/{}.jpg", user_id, activity_id),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// CATALOG TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_activities_listed_in_sequence_order() {
    require_emulator!();

    let db = test_db().await;
    for order in [3, 1, 2] {
        db.set_activity(&common::activity(order)).await.unwrap();
    }

    let activities = db.list_activities().await.unwrap();
    let orders: Vec<i32> = activities.iter().map(|a| a.sequence_order).collect();

    let mut sorted = orders.clone();
    sorted.sort();
    assert_eq!(orders, sorted, "Catalog must come back in sequence order");
    assert!(activities.iter().any(|a| a.id == "act-1"));
}

// ═══════════════════════════════════════════════════════════════════════════
// COMPLETION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_completion_insert_and_list() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    let stored = db
        .insert_completion(&completion(&user_id, "act-1", 10))
        .await
        .unwrap();
    assert_eq!(stored.duration_seconds, 600);

    let completions = db.list_completions(&user_id).await.unwrap();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].activity_id, "act-1");
}

#[tokio::test]
async fn test_duplicate_completion_is_rejected() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    db.insert_completion(&completion(&user_id, "act-1", 10))
        .await
        .unwrap();
    let err = db
        .insert_completion(&completion(&user_id, "act-1", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AlreadyCompleted));

    let completions = db.list_completions(&user_id).await.unwrap();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].duration_seconds, 600, "First write must win");
}

#[tokio::test]
async fn test_concurrent_completion_inserts() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    let mut handles = vec![];
    for minutes in 1..=5 {
        let db = db.clone();
        let user_id = user_id.clone();
        handles.push(tokio::spawn(async move {
            db.insert_completion(&completion(&user_id, "act-1", minutes))
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("Task join failed") {
            Ok(_) => successes += 1,
            Err(AppError::AlreadyCompleted) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(db.list_completions(&user_id).await.unwrap().len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// CHECK-IN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_first_checkin_wins() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    assert!(db.get_checkin(&user_id, "act-1").await.unwrap().is_none());

    let first = Utc::now() - Duration::minutes(3);
    db.record_checkin(&user_id, "act-1", first).await.unwrap();
    let again = db
        .record_checkin(&user_id, "act-1", Utc::now())
        .await
        .unwrap();

    assert_eq!(again.checked_in_at.timestamp(), first.timestamp());
    let stored = db.get_checkin(&user_id, "act-1").await.unwrap().unwrap();
    assert_eq!(stored.checked_in_at.timestamp(), first.timestamp());
}

// ═══════════════════════════════════════════════════════════════════════════
// PROFILE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_profile_upsert_and_lookup() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();
    let username = format!("u{}", &user_id[user_id.len() - 12..]);

    let mut profile = Profile {
        id: user_id.clone(),
        username: username.clone(),
        phone: None,
        created_at: Utc::now(),
    };
    db.upsert_profile(&profile).await.unwrap();

    let found = db.find_profile_by_username(&username).await.unwrap();
    assert_eq!(found.map(|p| p.id), Some(user_id.clone()));

    profile.phone = Some("+44 20 7946 0000".to_string());
    db.upsert_profile(&profile).await.unwrap();

    let stored = db.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.phone.as_deref(), Some("+44 20 7946 0000"));
    assert!(db
        .list_profiles()
        .await
        .unwrap()
        .iter()
        .any(|p| p.id == user_id));
}

#[tokio::test]
async fn test_concurrent_username_claims() {
    require_emulator!();

    let db = test_db().await;
    let username = format!("c{}", &unique_user_id()[8..]);

    let mut handles = vec![];
    for n in 0..8 {
        let db = db.clone();
        let username = username.clone();
        handles.push(tokio::spawn(async move {
            db.claim_username(&username, &format!("claimer-{}", n)).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("Task join failed") {
            Ok(()) => successes += 1,
            Err(AppError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_username_release_by_owner_only() {
    require_emulator!();

    let db = test_db().await;
    let username = format!("r{}", &unique_user_id()[8..]);

    db.claim_username(&username, "owner").await.unwrap();
    db.claim_username(&username, "owner").await.unwrap();

    db.release_username(&username, "someone-else").await.unwrap();
    assert!(matches!(
        db.claim_username(&username, "someone-else").await,
        Err(AppError::Conflict(_))
    ));

    db.release_username(&username, "owner").await.unwrap();
    db.claim_username(&username, "someone-else").await.unwrap();
}
