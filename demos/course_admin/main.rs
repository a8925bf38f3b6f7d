//! Courses Admin Example
//!
//! Drives the courses page of the dashboard against the in-memory backend:
//! - Renders the paginated table from the URL
//! - Adds a course through the drawer form
//! - Edits it, then deletes a row
//!
//! Run with `RUST_LOG=academy=debug` to see every request and invalidation.

use academy::pages::{CourseRelations, course_page};
use academy::prelude::*;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("academy=info")))
        .init();

    let service = InMemoryService::new();
    populate_test_data(&service);

    let ctx = ApiContext::new(Arc::new(service.clone()), QueryClient::new(), Arc::new(TracingNotifier));
    let collector = ctx.client().spawn_garbage_collector(std::time::Duration::from_secs(60));

    let relations = CourseRelations::load(&ctx).await?;
    println!("📂 Categories: {:?}", relations.categories.iter().map(|c| &c.label).collect::<Vec<_>>());
    println!("👤 Mentors: {:?}", relations.mentors.iter().map(|m| &m.label).collect::<Vec<_>>());

    let mut page = course_page(&ctx, LocationParams::parse("/admin/courses?pageSize=10"));
    print_table("Initial table", &page.table().await?);

    // Add
    page.open_add();
    println!("\n➕ {}", page.location().to_url());
    page.set_field("titleUz", "Rust asoslari");
    page.set_field("price", 450_000);
    if let Some(category) = relations.categories.first() {
        page.set_field("categoryId", category.value.clone());
    }
    page.submit().await?;
    let view = page.table().await?;
    print_table("After create", &view);

    // Edit the newest course
    if let Some(row) = view.records.first() {
        page.open_edit(row).await?;
        println!("\n✏️  {}", page.location().to_url());
        page.set_field("isPublished", true);
        page.submit().await?;
        print_table("After update", &page.table().await?);
    }

    // Delete the oldest course
    let view = page.table().await?;
    if let Some(row) = view.records.last() {
        page.delete_row(row).await?;
        print_table("After delete", &page.table().await?);
    }

    println!("\n📡 Backend calls: {}", service.total_calls());
    collector.abort();
    Ok(())
}

fn print_table(title: &str, view: &TableView) {
    println!("\n📋 {title} ({} courses)", view.total_count);
    println!("   {}", view.headers.join(" | "));
    for row in &view.rows {
        println!("   {}", row.join(" | "));
    }
}

fn populate_test_data(service: &InMemoryService) {
    service.insert(
        "CourseCategory",
        json!({"id": "cat-web", "nameUz": "Veb dasturlash", "isActive": true, "order": 1}),
    );
    service.insert(
        "CourseCategory",
        json!({"id": "cat-design", "nameUz": "Dizayn", "isActive": true, "order": 2}),
    );
    service.insert(
        "Mentor",
        json!({"id": "mentor-1", "firstName": "Aziz", "lastName": "Karimov"}),
    );

    for (n, title) in ["Python", "JavaScript", "Figma"].iter().enumerate() {
        service.insert(
            "Course",
            json!({
                "titleUz": title,
                "price": 300_000 + 50_000 * n,
                "isPublished": n != 2,
                "categoryId": if n == 2 { "cat-design" } else { "cat-web" },
                "mentorId": "mentor-1",
                "createdAt": format!("2024-02-{:02}T09:00:00Z", n + 1),
            }),
        );
    }
}
