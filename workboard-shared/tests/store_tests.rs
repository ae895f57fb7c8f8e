/// Store-backed tests for the shared domain layer
///
/// These exercise the behavior that only shows up against real
/// Postgres: sort ordinals, the row-locked admin-count guard, unique
/// email enforcement, and clock-driven overdue math. They require
/// `DATABASE_URL` to point at a disposable database and skip
/// themselves when it is unset.
///
/// Policy checks read the role off the `Actor`, not the user row, so
/// every helper account is stored as a developer. The one test that
/// needs real admin rows therefore owns all admin rows in the table.
use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use workboard_shared::auth::password::Argon2Hasher;
use workboard_shared::auth::Actor;
use workboard_shared::clock::{Clock, FixedClock};
use workboard_shared::error::CoreError;
use workboard_shared::models::task::{
    AssigneeSelector, CreateTask, SortDirection, Task, TaskPriority, TaskSortKey, TaskStatus,
};
use workboard_shared::models::user::{CreateUser, Role, User};
use workboard_shared::query::TaskQueries;
use workboard_shared::service::{TaskDraft, TaskPatch, TaskService, UserDraft, UserPatch, UserService};

async fn connect() -> Option<PgPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping store test");
            return None;
        }
    };

    let pool = PgPool::connect(&url)
        .await
        .expect("failed to connect to the test database");

    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("migrations failed");

    Some(pool)
}

async fn seed_developer(db: &PgPool, name: &str) -> User {
    User::create(
        db,
        CreateUser {
            name: name.to_string(),
            email: format!("test-{}@example.com", Uuid::new_v4()),
            role: Role::Developer,
            password_hash: "test_hash".to_string(),
        },
        Utc::now(),
    )
    .await
    .expect("failed to seed user")
}

/// Actor claiming admin rights, regardless of the stored role
fn as_admin(user: &User) -> Actor {
    Actor::new(user.id, Role::Admin)
}

fn as_developer(user: &User) -> Actor {
    Actor::new(user.id, Role::Developer)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seed_task(
    db: &PgPool,
    owner: &User,
    title: &str,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    now: chrono::DateTime<Utc>,
) -> Task {
    Task::create(
        db,
        CreateTask {
            title: title.to_string(),
            description: None,
            assigned_to: Some(owner.id),
            priority: TaskPriority::Medium,
            status,
            start_date: None,
            due_date,
            created_by: owner.id,
        },
        now,
    )
    .await
    .expect("failed to seed task")
}

/// Deletes everything the test created, tasks before users
async fn scrub(db: &PgPool, user_ids: &[Uuid]) {
    sqlx::query("DELETE FROM tasks WHERE created_by = ANY($1) OR assigned_to = ANY($1)")
        .bind(user_ids)
        .execute(db)
        .await
        .expect("failed to scrub tasks");

    sqlx::query("DELETE FROM users WHERE id = ANY($1)")
        .bind(user_ids)
        .execute(db)
        .await
        .expect("failed to scrub users");
}

#[tokio::test]
async fn status_sort_follows_workflow_order() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };
    let dev = seed_developer(&pool, "Sorter").await;

    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    for (offset, (title, status)) in [
        ("pending", TaskStatus::Pending),
        ("in progress", TaskStatus::InProgress),
        ("on hold", TaskStatus::OnHold),
        ("completed", TaskStatus::Completed),
    ]
    .into_iter()
    .enumerate()
    {
        seed_task(
            &pool,
            &dev,
            title,
            status,
            None,
            base + chrono::Duration::minutes(offset as i64),
        )
        .await;
    }

    let desc = Task::list_page(
        &pool,
        AssigneeSelector::User(dev.id),
        TaskSortKey::Status,
        SortDirection::Desc,
        50,
        0,
    )
    .await
    .unwrap();
    let titles: Vec<&str> = desc.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["completed", "on hold", "in progress", "pending"]);

    let asc = Task::list_page(
        &pool,
        AssigneeSelector::User(dev.id),
        TaskSortKey::Status,
        SortDirection::Asc,
        50,
        0,
    )
    .await
    .unwrap();
    let titles: Vec<&str> = asc.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["pending", "in progress", "on hold", "completed"]);

    scrub(&pool, &[dev.id]).await;
}

#[tokio::test]
async fn status_sort_breaks_ties_by_recency() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };
    let dev = seed_developer(&pool, "Tiebreak").await;

    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    seed_task(&pool, &dev, "older", TaskStatus::Pending, None, base).await;
    seed_task(
        &pool,
        &dev,
        "newer",
        TaskStatus::Pending,
        None,
        base + chrono::Duration::hours(1),
    )
    .await;

    let rows = Task::list_page(
        &pool,
        AssigneeSelector::User(dev.id),
        TaskSortKey::Status,
        SortDirection::Asc,
        50,
        0,
    )
    .await
    .unwrap();
    let titles: Vec<&str> = rows.iter().map(|t| t.title.as_str()).collect();

    // Same rank resolves newest-updated first
    assert_eq!(titles, vec!["newer", "older"]);

    scrub(&pool, &[dev.id]).await;
}

#[tokio::test]
async fn unassigned_selector_excludes_assigned_tasks() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };
    let dev = seed_developer(&pool, "Selector").await;

    let assigned = seed_task(&pool, &dev, "assigned", TaskStatus::Pending, None, Utc::now()).await;
    let orphan = Task::create(
        &pool,
        CreateTask {
            title: "unassigned".to_string(),
            description: None,
            assigned_to: None,
            priority: TaskPriority::Low,
            status: TaskStatus::Pending,
            start_date: None,
            due_date: None,
            created_by: dev.id,
        },
        Utc::now(),
    )
    .await
    .unwrap();

    let rows = Task::list_page(
        &pool,
        AssigneeSelector::Unassigned,
        TaskSortKey::CreatedAt,
        SortDirection::Desc,
        50,
        0,
    )
    .await
    .unwrap();
    let ids: Vec<Uuid> = rows.iter().map(|t| t.id).collect();

    assert!(ids.contains(&orphan.id));
    assert!(!ids.contains(&assigned.id));

    scrub(&pool, &[dev.id]).await;
}

#[tokio::test]
async fn service_update_touches_only_named_fields() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };
    let dev = seed_developer(&pool, "Updater").await;

    let created_at = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
    let updated_at = Utc.with_ymd_and_hms(2024, 3, 12, 16, 30, 0).unwrap();

    let creating: Arc<dyn Clock> = Arc::new(FixedClock(created_at));
    let updating: Arc<dyn Clock> = Arc::new(FixedClock(updated_at));

    let task = TaskService::new(pool.clone(), creating)
        .create_task(
            &as_admin(&dev),
            TaskDraft {
                title: Some("Original".to_string()),
                description: Some("keep me".to_string()),
                assigned_to: Some(dev.id),
                priority: Some("High".to_string()),
                status: None,
                start_date: Some("2024-03-01".to_string()),
                due_date: Some("2024-04-01".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(task.created_at, created_at);
    assert_eq!(task.updated_at, created_at);

    let view = TaskService::new(pool.clone(), updating)
        .update_task(
            &as_admin(&dev),
            task.id,
            TaskPatch {
                status: Some("In Progress".to_string()),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(view.status, TaskStatus::InProgress);
    assert_eq!(view.title, "Original");
    assert_eq!(view.description.as_deref(), Some("keep me"));
    assert_eq!(view.priority, TaskPriority::High);
    assert_eq!(view.start_date, Some(day(2024, 3, 1)));
    assert_eq!(view.due_date, Some(day(2024, 4, 1)));
    assert_eq!(view.created_at, created_at);
    assert_eq!(view.updated_at, updated_at);

    scrub(&pool, &[dev.id]).await;
}

#[tokio::test]
async fn empty_date_string_clears_like_null() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };
    let dev = seed_developer(&pool, "Dates").await;

    let clock: Arc<dyn Clock> = Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap(),
    ));
    let service = TaskService::new(pool.clone(), clock);

    let task = service
        .create_task(
            &as_admin(&dev),
            TaskDraft {
                title: Some("Dated".to_string()),
                due_date: Some("2024-06-01".to_string()),
                ..TaskDraft::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(task.due_date, Some(day(2024, 6, 1)));

    let view = service
        .update_task(
            &as_admin(&dev),
            task.id,
            TaskPatch {
                due_date: Some(Some("".to_string())),
                ..TaskPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(view.due_date, None);

    // An empty string at creation means "no date" as well
    let bare = service
        .create_task(
            &as_admin(&dev),
            TaskDraft {
                title: Some("Undated".to_string()),
                start_date: Some("".to_string()),
                ..TaskDraft::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(bare.start_date, None);

    scrub(&pool, &[dev.id]).await;
}

#[tokio::test]
async fn overdue_counts_compare_dates_strictly() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };
    let dev = seed_developer(&pool, "Overdue").await;

    let today = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
    let queries = TaskQueries::new(pool.clone(), Arc::new(FixedClock(today)));

    seed_task(
        &pool,
        &dev,
        "due yesterday",
        TaskStatus::Pending,
        Some(day(2024, 3, 14)),
        today,
    )
    .await;
    seed_task(
        &pool,
        &dev,
        "due today",
        TaskStatus::Pending,
        Some(day(2024, 3, 15)),
        today,
    )
    .await;
    seed_task(
        &pool,
        &dev,
        "late but finished",
        TaskStatus::Completed,
        Some(day(2024, 3, 1)),
        today,
    )
    .await;
    seed_task(&pool, &dev, "no deadline", TaskStatus::OnHold, None, today).await;

    let stats = queries.dashboard_stats(&as_developer(&dev)).await.unwrap();

    assert_eq!(stats.total_tasks, 4);
    assert_eq!(stats.completed_tasks, 1);
    assert_eq!(stats.pending_tasks, 2);
    assert_eq!(stats.in_progress_tasks, 0);
    assert_eq!(stats.overdue_tasks, 1);

    scrub(&pool, &[dev.id]).await;
}

#[tokio::test]
async fn duplicate_email_conflicts_without_clobbering() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };
    let dev = seed_developer(&pool, "Registrar").await;

    let clock: Arc<dyn Clock> = Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap(),
    ));
    let service = UserService::new(pool.clone(), clock, Arc::new(Argon2Hasher));

    let email = format!("test-{}@example.com", Uuid::new_v4());
    let first = service
        .create_user(
            &as_admin(&dev),
            UserDraft {
                name: Some("First".to_string()),
                email: Some(email.clone()),
                password: Some("secret1".to_string()),
                role: None,
            },
        )
        .await
        .unwrap();

    // Same address, different casing
    let err = service
        .create_user(
            &as_admin(&dev),
            UserDraft {
                name: Some("Second".to_string()),
                email: Some(email.to_uppercase()),
                password: Some("secret1".to_string()),
                role: None,
            },
        )
        .await
        .unwrap_err();

    match err {
        CoreError::Conflict(msg) => assert_eq!(msg, "Email already exists"),
        other => panic!("expected conflict, got {:?}", other),
    }

    let stored = User::find_by_email(&pool, &email).await.unwrap().unwrap();
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.name, "First");

    scrub(&pool, &[dev.id, first.id]).await;
}

#[tokio::test]
async fn last_admin_cannot_be_demoted_or_deleted() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };

    // The guard counts admin rows globally, so this test must own
    // every admin row in the table. Stale rows from crashed runs are
    // swept first; no other test in this binary stores an admin role.
    sqlx::query("DELETE FROM users WHERE role = 'admin'")
        .execute(&pool)
        .await
        .expect("failed to sweep admin rows");

    let admin = User::create(
        &pool,
        CreateUser {
            name: "Only Admin".to_string(),
            email: format!("test-{}@example.com", Uuid::new_v4()),
            role: Role::Admin,
            password_hash: "test_hash".to_string(),
        },
        Utc::now(),
    )
    .await
    .unwrap();
    let dev = seed_developer(&pool, "Bystander").await;

    let clock: Arc<dyn Clock> = Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap(),
    ));
    let service = UserService::new(pool.clone(), clock, Arc::new(Argon2Hasher));

    // Demoting the only admin is refused
    let err = service
        .update_user(
            &Actor::new(admin.id, Role::Admin),
            admin.id,
            UserPatch {
                role: Some("developer".to_string()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap_err();
    match err {
        CoreError::Conflict(msg) => {
            assert_eq!(msg, "Cannot change role. At least one admin is required")
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    // Deleting the only admin is refused too, even by another admin
    let err = service
        .delete_user(&Actor::new(dev.id, Role::Admin), admin.id)
        .await
        .unwrap_err();
    match err {
        CoreError::Conflict(msg) => assert_eq!(msg, "Cannot delete the last admin"),
        other => panic!("expected conflict, got {:?}", other),
    }

    let untouched = User::find_by_id(&pool, admin.id).await.unwrap().unwrap();
    assert_eq!(untouched.role, Role::Admin);

    // With a second admin in place the demotion goes through
    let second = service
        .create_user(
            &Actor::new(admin.id, Role::Admin),
            UserDraft {
                name: Some("Backup Admin".to_string()),
                email: Some(format!("test-{}@example.com", Uuid::new_v4())),
                password: Some("secret1".to_string()),
                role: Some("admin".to_string()),
            },
        )
        .await
        .unwrap();

    let demoted = service
        .update_user(
            &Actor::new(second.id, Role::Admin),
            admin.id,
            UserPatch {
                role: Some("developer".to_string()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(demoted.role, Role::Developer);

    scrub(&pool, &[admin.id, dev.id, second.id]).await;
}

#[tokio::test]
async fn deleting_a_user_nulls_their_references() {
    let pool = match connect().await {
        Some(pool) => pool,
        None => return,
    };
    let keeper = seed_developer(&pool, "Keeper").await;
    let leaver = seed_developer(&pool, "Leaver").await;

    let task = seed_task(&pool, &leaver, "handover", TaskStatus::Pending, None, Utc::now()).await;

    // Direct row deletion; SET NULL is a schema property, not service logic
    assert!(User::delete(&pool, leaver.id).await.unwrap());

    let survivor = Task::find_by_id(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(survivor.assigned_to, None);
    assert_eq!(survivor.created_by, None);
    assert_eq!(survivor.title, "handover");

    // And the projection renders the dangling names as null
    let record = Task::find_with_names(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(record.assigned_to_name, None);
    assert_eq!(record.created_by_name, None);

    scrub(&pool, &[keeper.id, leaver.id]).await;
}
