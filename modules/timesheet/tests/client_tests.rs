mod common;

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use common::{new_user, setup};
use timesheet::contract::{
    client::TimesheetApi,
    error::TimesheetError,
    model::{NewActivity, NewSession, NewSubtask, NewTodo, PageRequest, WorklogEntry},
};
use timesheet::domain::activities::ActivityService;
use timesheet::domain::sessions::SessionService;
use timesheet::gateways::local::TimesheetLocalClient;
use timesheet::TimesheetConfig;
use uuid::Uuid;
use worktrack_db::DbHandle;

async fn client() -> Result<(DbHandle, TimesheetLocalClient)> {
    let db = setup().await?;
    let client = TimesheetLocalClient::new(db.sea(), TimesheetConfig::default());
    Ok((db, client))
}

/// Seeds one activity type and returns its id.
async fn seed_type(db: &DbHandle, title: &str) -> Result<Uuid> {
    let session = db.session();
    let types = ActivityService::new(TimesheetConfig::default())
        .ensure_activity_types(&session, &[title])
        .await?;
    session.close().await?;
    Ok(types[0].id)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

#[tokio::test]
async fn test_register_get_and_duplicate_email() -> Result<()> {
    let (_db, client) = client().await?;

    let user = client.register_user(new_user("Ann", "ann@example.com")).await?;
    assert_eq!(user.role, "user");
    assert!(user.is_active);
    assert!(!user.is_admin);
    assert_eq!(client.get_user(user.id).await?, user);

    let err = client
        .register_user(new_user("Other Ann", "ann@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::Conflict { .. }), "{err}");
    assert!(err.to_string().contains("ann@example.com"));

    let err = client.get_user(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err, TimesheetError::not_found("user not found"));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_registration_with_same_email() -> Result<()> {
    let (_db, client) = client().await?;

    let (a, b) = tokio::join!(
        client.register_user(new_user("A", "race@example.com")),
        client.register_user(new_user("B", "race@example.com")),
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(TimesheetError::Conflict { .. }))));

    let all = client.list_users(PageRequest::default()).await?;
    assert_eq!(all.total_records, 1);
    Ok(())
}

#[tokio::test]
async fn test_list_users_paginates_and_hides_password_hash() -> Result<()> {
    let (_db, client) = client().await?;
    for i in 0..5 {
        client
            .register_user(new_user(&format!("User {i}"), &format!("u{i}@example.com")))
            .await?;
    }

    let page = client
        .list_users(
            PageRequest::new(2, 2)
                .sort_by("-email")
                .filter_by("email__il__EXAMPLE"),
        )
        .await?;
    assert_eq!(page.total_records, 5);
    assert_eq!(page.result.len(), 2);
    assert_eq!(page.result[0].email, "u2@example.com");
    assert_eq!(page.result[1].email, "u1@example.com");

    let err = client
        .list_users(PageRequest::default().filter_by("hashed_password==x"))
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::BadRequest { .. }), "{err}");

    let err = client
        .list_users(PageRequest::default().sort_by("hashed_password"))
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::BadRequest { .. }), "{err}");
    Ok(())
}

#[tokio::test]
async fn test_activity_assignment_and_tasks() -> Result<()> {
    let (db, client) = client().await?;
    let type_id = seed_type(&db, "Projects").await?;
    let user = client.register_user(new_user("Jo", "jo@example.com")).await?;
    let admin = client.register_user(new_user("Admin", "admin@example.com")).await?;

    let activity = client
        .create_activity(NewActivity {
            title: "Billing".into(),
            code: "BIL".into(),
            expected_hours_monthly: 80,
            activity_type_id: type_id,
        })
        .await?;

    let err = client
        .create_activity(NewActivity {
            title: "Billing again".into(),
            code: "BIL".into(),
            expected_hours_monthly: 10,
            activity_type_id: type_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::Conflict { .. }), "{err}");

    let err = client
        .create_activity(NewActivity {
            title: "Orphan".into(),
            code: "ORP".into(),
            expected_hours_monthly: 10,
            activity_type_id: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::BadRequest { .. }), "{err}");

    // not assigned yet
    let err = client
        .add_task(user.id, activity.id, "Design".into())
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::Forbidden { .. }), "{err}");

    let assignment = client
        .assign_user(user.id, activity.id, Some(admin.id))
        .await?;
    assert_eq!(assignment.assigned_by_id, Some(admin.id));
    let err = client
        .assign_user(user.id, activity.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::Conflict { .. }), "{err}");

    let mine = client.activities_for_user(user.id).await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].code, "BIL");
    assert_eq!(mine[0].activity_type.title, "Projects");
    assert!(client.activities_for_user(admin.id).await?.is_empty());

    let task = client
        .add_task(user.id, activity.id, "  Design ".into())
        .await?;
    assert_eq!(task.title, "Design");
    assert_eq!(task.user_id, Some(user.id));
    let err = client
        .add_task(user.id, activity.id, "Design".into())
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::Conflict { .. }), "{err}");

    let tasks = client.tasks_for_user(user.id).await?;
    assert_eq!(tasks, vec![task]);

    let listed = client
        .list_activities(PageRequest::default().filter_by("code==BIL"))
        .await?;
    assert_eq!(listed.total_records, 1);
    assert_eq!(listed.result[0].id, activity.id);
    Ok(())
}

/// A user assigned to one activity with two tasks.
async fn worklog_fixture(client: &TimesheetLocalClient, db: &DbHandle) -> Result<(Uuid, Uuid, Uuid)> {
    let type_id = seed_type(db, "Projects").await?;
    let user = client.register_user(new_user("W", "w@example.com")).await?;
    let activity = client
        .create_activity(NewActivity {
            title: "Ops".into(),
            code: "OPS".into(),
            expected_hours_monthly: 40,
            activity_type_id: type_id,
        })
        .await?;
    client.assign_user(user.id, activity.id, None).await?;
    let t1 = client.add_task(user.id, activity.id, "Deploys".into()).await?;
    let t2 = client.add_task(user.id, activity.id, "On-call".into()).await?;
    Ok((user.id, t1.id, t2.id))
}

fn entry(id: Option<Uuid>, date: NaiveDate, duration: Option<f64>, task_id: Uuid) -> WorklogEntry {
    WorklogEntry {
        id,
        date,
        duration,
        task_id,
    }
}

#[tokio::test]
async fn test_batch_worklog_create_update_delete() -> Result<()> {
    let (db, client) = client().await?;
    let (user, t1, t2) = worklog_fixture(&client, &db).await?;

    let saved = client
        .batch_worklog(
            user,
            vec![
                entry(None, day(6), Some(4.0), t1),
                entry(None, day(6), Some(3.5), t2),
                entry(None, day(7), Some(8.0), t1),
            ],
        )
        .await?;
    assert_eq!(saved.len(), 3);
    assert!(saved.iter().all(|w| w.user_id == user));

    let monday_t1 = saved
        .iter()
        .find(|w| w.date == day(6) && w.activity_task_id == t1)
        .unwrap();
    let tuesday = saved.iter().find(|w| w.date == day(7)).unwrap();

    let updated = client
        .batch_worklog(
            user,
            vec![
                entry(Some(monday_t1.id), day(6), Some(2.0), t1),
                entry(Some(tuesday.id), day(7), Some(0.0), t1),
            ],
        )
        .await?;
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].id, monday_t1.id);
    assert_eq!(updated[0].duration, 2.0);

    // the deleted cell can be re-created
    let again = client
        .batch_worklog(user, vec![entry(None, day(7), Some(1.0), t1)])
        .await?;
    assert_eq!(again.len(), 1);
    assert_ne!(again[0].id, tuesday.id);
    Ok(())
}

#[tokio::test]
async fn test_batch_worklog_daily_limit_rolls_back() -> Result<()> {
    let (db, client) = client().await?;
    let (user, t1, t2) = worklog_fixture(&client, &db).await?;

    let first = client
        .batch_worklog(user, vec![entry(None, day(6), Some(5.0), t1)])
        .await?;

    let err = client
        .batch_worklog(
            user,
            vec![
                entry(Some(first[0].id), day(6), Some(6.0), t1),
                entry(None, day(6), Some(4.0), t2),
                entry(None, day(8), Some(2.0), t2),
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TimesheetError::bad_request("Daily limit exceeded: 2024-05-06 (10h)")
    );

    // nothing from the rejected batch is visible
    let ok = client
        .batch_worklog(user, vec![entry(None, day(6), Some(3.0), t2)])
        .await?;
    assert_eq!(ok.len(), 1);
    let err = client
        .batch_worklog(user, vec![entry(None, day(6), Some(1.0), t2)])
        .await
        .unwrap_err();
    // (t2, day 6) already exists from the previous batch
    assert!(matches!(err, TimesheetError::Conflict { .. }), "{err}");
    Ok(())
}

#[tokio::test]
async fn test_batch_worklog_rejects_bad_entries() -> Result<()> {
    let (db, client) = client().await?;
    let (user, t1, _) = worklog_fixture(&client, &db).await?;

    let err = client
        .batch_worklog(user, vec![entry(None, day(6), None, t1)])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("neither 'id' nor 'duration'"), "{err}");

    let err = client
        .batch_worklog(user, vec![entry(None, day(6), Some(9.0), t1)])
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::BadRequest { .. }), "{err}");

    let err = client
        .batch_worklog(user, vec![entry(None, day(6), Some(2.0), Uuid::new_v4())])
        .await
        .unwrap_err();
    assert!(matches!(err, TimesheetError::BadRequest { .. }), "{err}");

    assert!(client.batch_worklog(user, Vec::new()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_journal_limits_worklogs_to_date_range() -> Result<()> {
    let (db, client) = client().await?;
    let (user, t1, t2) = worklog_fixture(&client, &db).await?;
    client
        .batch_worklog(
            user,
            vec![
                entry(None, day(3), Some(1.0), t1),
                entry(None, day(7), Some(2.0), t1),
                entry(None, day(6), Some(4.0), t1),
                entry(None, day(9), Some(1.5), t2),
            ],
        )
        .await?;

    let journal = client.journal(user, day(6), day(7)).await?;
    assert_eq!(journal.project_assignments.len(), 1);
    let activity = &journal.project_assignments[0];
    assert_eq!(activity.code, "OPS");
    assert_eq!(activity.activity_type.title, "Projects");

    assert_eq!(journal.tasks.len(), 2);
    let deploys = journal.tasks.iter().find(|t| t.id == t1).unwrap();
    assert_eq!(deploys.activity_id, activity.id);
    let dates: Vec<_> = deploys.worklogs.iter().map(|w| (w.date, w.duration)).collect();
    assert_eq!(dates, [(day(6), 4.0), (day(7), 2.0)]);
    let on_call = journal.tasks.iter().find(|t| t.id == t2).unwrap();
    assert!(on_call.worklogs.is_empty());

    // a single day is a valid range
    let journal = client.journal(user, day(9), day(9)).await?;
    let on_call = journal.tasks.iter().find(|t| t.id == t2).unwrap();
    assert_eq!(on_call.worklogs.len(), 1);

    let err = client.journal(user, day(7), day(6)).await.unwrap_err();
    assert!(matches!(err, TimesheetError::BadRequest { .. }), "{err}");

    let stranger = client.register_user(new_user("S", "s@example.com")).await?;
    let empty = client.journal(stranger.id, day(1), day(31)).await?;
    assert!(empty.project_assignments.is_empty());
    assert!(empty.tasks.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_batch_worklog_cannot_touch_foreign_rows() -> Result<()> {
    let (db, client) = client().await?;
    let (owner, t1, _) = worklog_fixture(&client, &db).await?;
    let intruder = client.register_user(new_user("I", "i@example.com")).await?;

    let saved = client
        .batch_worklog(owner, vec![entry(None, day(6), Some(2.0), t1)])
        .await?;

    for duration in [Some(3.0), None] {
        let err = client
            .batch_worklog(intruder.id, vec![entry(Some(saved[0].id), day(6), duration, t1)])
            .await
            .unwrap_err();
        assert!(matches!(err, TimesheetError::Forbidden { .. }), "{err}");
    }
    Ok(())
}

#[tokio::test]
async fn test_todos_with_subtasks() -> Result<()> {
    let (_db, client) = client().await?;
    let user = client.register_user(new_user("T", "t@example.com")).await?;
    let other = client.register_user(new_user("O", "o@example.com")).await?;

    let todo = client
        .create_todo(
            user.id,
            NewTodo {
                title: "Release".into(),
                subtasks: vec![
                    NewSubtask {
                        title: Some("tag".into()),
                        priority: 1,
                    },
                    NewSubtask {
                        title: Some("announce".into()),
                        priority: 5,
                    },
                    NewSubtask::default(),
                ],
            },
        )
        .await?;
    assert_eq!(todo.subtasks.len(), 3);
    assert_eq!(todo.subtasks[0].title.as_deref(), Some("announce"));

    let empty = client
        .create_todo(
            user.id,
            NewTodo {
                title: "Nothing inside".into(),
                subtasks: Vec::new(),
            },
        )
        .await?;
    assert!(empty.subtasks.is_empty());

    let listed = client.todos(user.id).await?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], todo);
    assert!(client.todos(other.id).await?.is_empty());

    let err = client.delete_todo(other.id, todo.id).await.unwrap_err();
    assert!(matches!(err, TimesheetError::NotFound { .. }), "{err}");

    client.delete_todo(user.id, todo.id).await?;
    assert_eq!(client.todos(user.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_sessions_store_hashes_and_logout() -> Result<()> {
    let (db, client) = client().await?;
    let user = client.register_user(new_user("S", "s@example.com")).await?;

    let opened = client
        .create_session(NewSession {
            user_id: user.id,
            access_token: "access-1".into(),
            refresh_token: "refresh-1".into(),
            expires_at: Utc::now() + Duration::hours(1),
            device_name: Some("laptop".into()),
            device_type: None,
            ip_address: Some("10.0.0.1".into()),
            user_agent: None,
        })
        .await?;
    assert!(opened.is_active);

    let sessions = SessionService::new();
    let session = db.session();
    let found = sessions.find_active(&session, "refresh-1").await?;
    assert_eq!(found.map(|s| s.id), Some(opened.id));
    assert!(sessions.find_active(&session, "access-1").await?.is_none());
    session.close().await?;

    client.logout("refresh-1").await?;
    client.logout("never-issued").await?;

    let session = db.session();
    assert!(sessions.find_active(&session, "refresh-1").await?.is_none());
    session.close().await?;
    Ok(())
}
