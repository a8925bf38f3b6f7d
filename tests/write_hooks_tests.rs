//! Integration tests for the write hooks
//!
//! These tests verify request bodies, invalidation of dependent reads,
//! callback ordering and notifications for every write verb.

mod hooks_harness;

use academy::prelude::*;
use hooks_harness::*;

// =============================================================================
// Invalidation
// =============================================================================

/// Observe the course list and count, then forget the initial requests
async fn observed_views(
    h: &Harness,
) -> (
    ReadHandle<Page<CourseRecord>, Course>,
    ReadHandle<u64, Course>,
) {
    let courses = h.ctx.entity::<Course>();
    let mut list = courses.use_courses(FindArgs::new(), ReadOptions::default());
    let mut count = courses.use_count_courses(FindArgs::new(), ReadOptions::default());
    list.settled().await;
    count.settled().await;
    h.service.clear_calls();
    (list, count)
}

fn assert_refetched_once(h: &Harness, write: &str) {
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 1, "list after {write}");
    assert_eq!(h.service.call_count("Course", CrudOp::Count), 1, "count after {write}");
    h.service.clear_calls();
}

#[tokio::test]
async fn test_every_write_refetches_observed_views_once() {
    let h = Harness::new();
    let seeded = h.seed_courses(3);
    let (list, count) = observed_views(&h).await;
    let courses = h.ctx.entity::<Course>();

    courses
        .use_create_course::<Value>(MutationOptions::new(), None)
        .mutate_async(json!({"titleUz": "Rust"}))
        .await
        .unwrap();
    assert_refetched_once(&h, "createOne");

    courses
        .use_create_courses::<Value>(MutationOptions::new(), None)
        .mutate_async(vec![json!({"titleUz": "Go"}), json!({"titleUz": "Zig"})])
        .await
        .unwrap();
    assert_refetched_once(&h, "createMany");

    courses
        .use_create_list_courses::<Value>(MutationOptions::new(), None)
        .mutate_async(vec![json!({"titleUz": "Elm"})])
        .await
        .unwrap();
    assert_refetched_once(&h, "createList");

    courses
        .use_update_course::<Value>(MutationOptions::new(), None)
        .mutate_async(UpdateArgs::by_id(json!({"price": 1}), id_of(&seeded[0])))
        .await
        .unwrap();
    assert_refetched_once(&h, "updateOne");

    courses
        .use_update_courses::<Value>(MutationOptions::new(), None)
        .mutate_async(UpdateArgs::new(json!({"isPublished": true}), Where::new().eq("isPublished", false)))
        .await
        .unwrap();
    assert_refetched_once(&h, "updateMany");

    courses
        .use_update_list_courses::<Value>(MutationOptions::new(), None)
        .mutate_async(vec![json!({"id": id_of(&seeded[1]), "price": 2})])
        .await
        .unwrap();
    assert_refetched_once(&h, "updateList");

    courses
        .use_delete_course(MutationOptions::new(), None)
        .mutate_async(DeleteTarget::from(id_of(&seeded[2])))
        .await
        .unwrap();
    assert_refetched_once(&h, "deleteOne");

    courses
        .use_delete_courses(MutationOptions::new(), None)
        .mutate_async(Where::new().eq("titleUz", "Elm"))
        .await
        .unwrap();
    assert_refetched_once(&h, "deleteMany");

    courses
        .use_delete_all_courses(MutationOptions::new(), None)
        .mutate_async(())
        .await
        .unwrap();
    assert_refetched_once(&h, "deleteAll");

    assert_eq!(count.result().count_courses(), Some(0));
    assert!(list.result().courses_data().unwrap().is_empty());
}

#[tokio::test]
async fn test_unobserved_views_are_only_marked_stale() {
    let h = Harness::new();
    h.seed_courses(1);
    let courses = h.ctx.entity::<Course>();

    {
        let mut list = courses.use_courses(FindArgs::new(), ReadOptions::default());
        list.settled().await;
    }
    h.service.clear_calls();

    courses
        .use_create_course::<Value>(MutationOptions::new(), None)
        .mutate_async(json!({"titleUz": "Rust"}))
        .await
        .unwrap();
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 0);

    let key = courses.model().keys.list().with(json!({}));
    assert!(h.ctx.client().get_query_state(&key).unwrap().is_invalidated);
}

#[tokio::test]
async fn test_writes_leave_other_models_alone() {
    let h = Harness::new();
    h.service.insert("Mentor", json!({"firstName": "Ali", "lastName": "Valiyev"}));

    let mut mentors = h.ctx.entity::<Mentor>().use_mentors(FindArgs::new(), ReadOptions::default());
    mentors.settled().await;
    h.service.clear_calls();

    h.ctx
        .entity::<Course>()
        .use_create_course::<Value>(MutationOptions::new(), None)
        .mutate_async(json!({"titleUz": "Rust"}))
        .await
        .unwrap();

    assert_eq!(h.service.call_count("Mentor", CrudOp::FindMany), 0);
}

#[tokio::test]
async fn test_explicit_secondary_replaces_defaults() {
    let h = Harness::new();
    h.seed_courses(1);
    let (_list, _count) = observed_views(&h).await;
    let courses = h.ctx.entity::<Course>();

    let secondary = SecondaryOptions::new()
        .invalidate(courses.model().keys.count())
        .success_toast("Counted");
    courses
        .use_create_course::<Value>(MutationOptions::new(), Some(secondary))
        .mutate_async(json!({"titleUz": "Rust"}))
        .await
        .unwrap();

    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 0);
    assert_eq!(h.service.call_count("Course", CrudOp::Count), 1);
    assert_eq!(h.successes(), vec!["Counted"]);
}

// =============================================================================
// Round Trips
// =============================================================================

#[tokio::test]
async fn test_created_record_appears_in_list() {
    let h = Harness::new();
    let courses = h.ctx.entity::<Course>();
    let mut list = courses.use_courses(FindArgs::new().take(10), ReadOptions::default());
    assert_eq!(list.settled().await.courses_data().map(Page::len), Some(0));

    let create = courses.use_create_course::<CourseRecord>(MutationOptions::new(), None);
    create.create_course(CourseRecord {
        title_uz: "Rust".to_string(),
        price: 250_000.0,
        ..CourseRecord::default()
    })
    .await
    .unwrap();

    let created = create.created_course().unwrap().unwrap();
    assert_eq!(created.title_uz, "Rust");
    assert!(created.id.is_some());
    assert!(!create.is_loading_create_course());
    assert!(!create.is_error_create_course());

    let result = list.result();
    let page = result.courses_data().unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.data[0].id, created.id);
    assert_eq!(h.successes(), vec!["Muvaffaqiyatli saqlandi"]);
}

#[tokio::test]
async fn test_create_many_reports_batch_count() {
    let h = Harness::new();
    let create = h
        .ctx
        .entity::<Course>()
        .use_create_courses::<Value>(MutationOptions::new(), None);

    create
        .create_courses(vec![json!({"titleUz": "A"}), json!({"titleUz": "B"})])
        .await
        .unwrap();

    assert_eq!(create.created_courses(), Some(Ok(BatchPayload { count: 2 })));
    assert_eq!(
        h.service.calls()[0].body,
        Some(json!({"data": [{"titleUz": "A"}, {"titleUz": "B"}]}))
    );
}

#[tokio::test]
async fn test_create_list_sends_bare_array() {
    let h = Harness::new();
    let create = h
        .ctx
        .entity::<Course>()
        .use_create_list_courses::<Value>(MutationOptions::new(), None);

    create.create_list_courses(vec![json!({"titleUz": "A"})]).await.unwrap();

    assert_eq!(h.service.calls()[0].body, Some(json!([{"titleUz": "A"}])));
    let created = create.created_list_courses().unwrap().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title_uz, "A");
}

#[tokio::test]
async fn test_update_sends_data_and_where() {
    let h = Harness::new();
    let seeded = h.seed_courses(1);
    let id = id_of(&seeded[0]);
    let update = h
        .ctx
        .entity::<Course>()
        .use_update_course::<Value>(MutationOptions::new(), None);

    update
        .update_course(UpdateArgs::by_id(json!({"isPublished": true}), id.clone()))
        .await
        .unwrap();

    assert_eq!(
        h.service.calls()[0].body,
        Some(json!({"data": {"isPublished": true}, "where": {"id": id}}))
    );
    assert!(update.updated_course().unwrap().unwrap().is_published);
    assert_eq!(h.successes(), vec!["Muvaffaqiyatli o'zgartirildi"]);
}

// =============================================================================
// Deletes
// =============================================================================

#[tokio::test]
async fn test_raw_id_and_where_send_the_same_body() {
    let h = Harness::new();
    let seeded = h.seed_courses(2);
    let delete = h.ctx.entity::<Course>().use_delete_course(MutationOptions::new(), None);

    let by_id = id_of(&seeded[0]);
    let by_where = id_of(&seeded[1]);
    delete.delete_course(by_id.clone()).await.unwrap();
    delete.delete_course(Where::id(by_where.clone())).await.unwrap();

    let bodies: Vec<Option<Value>> = h.service.calls().into_iter().map(|call| call.body).collect();
    assert_eq!(
        bodies,
        vec![
            Some(json!({"where": {"id": by_id}})),
            Some(json!({"where": {"id": by_where}})),
        ]
    );
    assert!(h.service.records("Course").is_empty());
}

#[tokio::test]
async fn test_double_delete_is_forwarded_twice() {
    let h = Harness::new();
    let seeded = h.seed_courses(1);
    let id = id_of(&seeded[0]);
    let delete = h.ctx.entity::<Course>().use_delete_course(MutationOptions::new(), None);

    let (first, second) = tokio::join!(
        delete.mutate_async(DeleteTarget::from(id.clone())),
        delete.mutate_async(DeleteTarget::from(id)),
    );

    assert_eq!(h.service.call_count("Course", CrudOp::DeleteOne), 2);
    assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(h.successes(), vec!["Muvaffaqiyatli o'chirildi"]);
    assert_eq!(h.errors(), vec!["Record not found"]);
}

#[tokio::test]
async fn test_delete_from_table_uses_row_id() {
    let h = Harness::new();
    let seeded = h.seed_courses(1);
    let delete = h.ctx.entity::<Course>().use_delete_course(MutationOptions::new(), None);

    let row = json!({"id": id_of(&seeded[0]), "titleUz": "Course 1", "category": null});
    delete.delete_course_from_table(&row).await.unwrap();

    assert_eq!(
        h.service.calls()[0].body,
        Some(json!({"where": {"id": id_of(&seeded[0])}}))
    );
}

#[tokio::test]
async fn test_delete_from_table_without_id_sends_nothing() {
    let h = Harness::new();
    let delete = h.ctx.entity::<Course>().use_delete_course(MutationOptions::new(), None);

    let error = delete
        .delete_from_table(&json!({"titleUz": "orphan"}))
        .await
        .unwrap_err();

    assert_eq!(error, AdminError::Validation(ValidationError::MissingId));
    assert_eq!(h.service.total_calls(), 0);
    assert!(delete.is_error_delete_course());
    assert_eq!(h.errors().len(), 1);
}

#[tokio::test]
async fn test_delete_many_and_all_report_counts() {
    let h = Harness::new();
    h.seed_courses(4);
    let courses = h.ctx.entity::<Course>();

    let delete_many = courses.use_delete_courses(MutationOptions::new(), None);
    delete_many
        .delete_courses(Where::new().eq("isPublished", true))
        .await
        .unwrap();
    assert_eq!(delete_many.deleted_courses(), Some(Ok(BatchPayload { count: 2 })));

    let delete_all = courses.use_delete_all_courses(MutationOptions::new(), None);
    delete_all.delete_all_courses().await.unwrap();
    assert_eq!(delete_all.data(), Some(json!({"count": 2})));

    let last = h.service.calls().pop().unwrap();
    assert_eq!(last.op, Some(CrudOp::DeleteAll));
    assert_eq!(last.body, None);
}

// =============================================================================
// Callbacks and Notifications
// =============================================================================

#[tokio::test]
async fn test_on_success_runs_before_invalidation() {
    let h = Harness::new();
    h.seed_courses(1);
    let (_list, _count) = observed_views(&h).await;
    let log = EventLog::default();

    let service = h.service.clone();
    let seen = log.clone();
    let options = MutationOptions::new().on_success(move |data| {
        let refetched = service.call_count("Course", CrudOp::FindMany);
        seen.push(format!("on_success {} refetched={refetched}", data["titleUz"]));
    });

    h.ctx
        .entity::<Course>()
        .use_create_course::<Value>(options, None)
        .mutate_async(json!({"titleUz": "Rust"}))
        .await
        .unwrap();

    assert_eq!(log.events(), vec!["on_success \"Rust\" refetched=0"]);
    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 1);
    assert_eq!(h.successes(), vec!["Muvaffaqiyatli saqlandi"]);
}

#[tokio::test]
async fn test_backend_message_wins_over_error_text() {
    let h = Harness::new();
    let log = EventLog::default();
    h.service.fail_next(AdminError::backend(
        "/api/course/create",
        400,
        Some(json!({"message": ["titleUz must be a string", "price must be a number"]})),
    ));

    let seen = log.clone();
    let create = h.ctx.entity::<Course>().use_create_course::<Value>(
        MutationOptions::new().on_error(move |error| seen.push(error.error_code())),
        None,
    );
    let error = create.mutate_async(json!({})).await.unwrap_err();

    assert_eq!(error.status(), Some(400));
    assert_eq!(log.events(), vec!["BACKEND_VALIDATION_ERROR"]);
    assert_eq!(h.errors(), vec!["price must be a number"]);
    assert!(h.successes().is_empty());
    assert!(create.is_error());
}

#[tokio::test]
async fn test_backend_error_without_message_shows_error_text() {
    let h = Harness::new();
    h.service
        .fail_next(AdminError::backend("/api/course/create", 500, None));

    let create = h.ctx.entity::<Course>().use_create_course::<Value>(MutationOptions::new(), None);
    let error = create.mutate_async(json!({"titleUz": "Rust"})).await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert_eq!(error.backend_message(), None);
    assert_eq!(h.errors(), vec!["Xatolik sodir bo'ldi"]);
    assert!(h.successes().is_empty());
}

#[tokio::test]
async fn test_transport_failure_shows_configured_error_text() {
    let h = Harness::new();
    h.service
        .fail_next(AdminError::transport("/api/course/delete", "connection reset"));

    let delete = h.ctx.entity::<Course>().use_delete_course(MutationOptions::new(), None);
    let _ = delete.mutate_async(DeleteTarget::from("abc")).await;

    assert_eq!(h.errors(), vec!["Xatolik sodir bo'ldi"]);
}

#[tokio::test]
async fn test_failed_write_does_not_invalidate() {
    let h = Harness::new();
    h.seed_courses(1);
    let (_list, _count) = observed_views(&h).await;
    h.service.fail_next(AdminError::backend("/api/course/create", 500, None));

    let _ = h
        .ctx
        .entity::<Course>()
        .use_create_course::<Value>(MutationOptions::new(), None)
        .mutate_async(json!({"titleUz": "Rust"}))
        .await;

    assert_eq!(h.service.call_count("Course", CrudOp::FindMany), 0);
    assert_eq!(h.service.call_count("Course", CrudOp::Count), 0);
}

#[tokio::test]
async fn test_reset_forgets_outcome() {
    let h = Harness::new();
    let create = h
        .ctx
        .entity::<Course>()
        .use_create_course::<Value>(MutationOptions::new(), None);

    create.mutate_async(json!({"titleUz": "Rust"})).await.unwrap();
    assert!(create.is_success());

    create.reset();
    assert!(create.is_idle());
    assert_eq!(create.data(), None);
}
