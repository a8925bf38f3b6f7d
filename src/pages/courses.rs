//! Courses admin page

use super::crud_page::{CrudPage, PageConfig};
use super::form::{FieldDescriptor, FormSchema, SelectOption, make_options};
use super::location::LocationParams;
use super::table::{ColumnDescriptor, Renderer};
use crate::core::error::AdminError;
use crate::core::field::FieldKind;
use crate::core::query::{FindArgs, Where};
use crate::entities::{Course, CourseCategory, Mentor, MentorRecord};
use crate::hooks::{ApiContext, ReadOptions};
use serde_json::{Value, json};

pub const COURSE_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];

pub type CoursePage = CrudPage<Course>;

/// Columns, form and relations of the courses page
pub fn course_page_config() -> PageConfig {
    let columns = vec![
        ColumnDescriptor::row_number(),
        ColumnDescriptor::new("Title Uz", "titleUz").width(200),
        ColumnDescriptor::new("Title Ru", "titleRu").width(200),
        ColumnDescriptor::new("Title En", "titleEn").width(200),
        ColumnDescriptor::new("Price", "price")
            .render(Renderer::Money {
                currency: "UZS".to_string(),
            })
            .width(100),
        ColumnDescriptor::new("Duration", "duration")
            .render(Renderer::Suffix("min".to_string()))
            .width(100),
        ColumnDescriptor::new("Level", "level").width(100),
        ColumnDescriptor::new("Is Published", "isPublished")
            .render(Renderer::YesNo)
            .width(120),
        ColumnDescriptor::new("Category", "category.nameUz").width(150),
        ColumnDescriptor::new("Mentor", "mentor")
            .custom(|mentor, _| mentor_name(mentor).unwrap_or_else(|| "-".to_string()))
            .width(150),
        ColumnDescriptor::new("Created At", "createdAt")
            .render(Renderer::Date)
            .width(150),
    ];

    let form = FormSchema::new(vec![
        FieldDescriptor::text("titleUz", "Title Uz").required(),
        FieldDescriptor::text("titleRu", "Title Ru"),
        FieldDescriptor::text("titleEn", "Title En"),
        FieldDescriptor::new("descriptionUz", "Description Uz", FieldKind::TextArea),
        FieldDescriptor::new("descriptionRu", "Description Ru", FieldKind::TextArea),
        FieldDescriptor::new("descriptionEn", "Description En", FieldKind::TextArea),
        FieldDescriptor::new("coverImage", "Cover Image", FieldKind::Image),
        FieldDescriptor::new("duration", "Duration (minutes)", FieldKind::Number),
        FieldDescriptor::new(
            "level",
            "Level",
            FieldKind::Select(COURSE_LEVELS.iter().map(|level| level.to_string()).collect()),
        ),
        FieldDescriptor::new("price", "Price (UZS)", FieldKind::Number).required(),
        FieldDescriptor::new("isPublished", "Is Published", FieldKind::Switch),
        FieldDescriptor::new("categoryId", "Category", FieldKind::Relation("CourseCategory".to_string())).required(),
        FieldDescriptor::new("mentorId", "Mentor", FieldKind::Relation("Mentor".to_string())),
    ]);

    PageConfig::new("Courses", columns, form).include(json!({"category": true, "mentor": true}))
}

/// The courses page at `location`
pub fn course_page(ctx: &ApiContext, location: LocationParams) -> CoursePage {
    CrudPage::new(ctx.entity::<Course>(), course_page_config(), location)
}

fn mentor_name(mentor: &Value) -> Option<String> {
    let mentor: MentorRecord = serde_json::from_value(mentor.clone()).ok()?;
    Some(mentor.full_name())
}

/// Choices of the category and mentor selects
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseRelations {
    pub categories: Vec<SelectOption>,
    pub mentors: Vec<SelectOption>,
}

impl CourseRelations {
    /// Active categories in display order, and every mentor
    pub async fn load(ctx: &ApiContext) -> Result<Self, AdminError> {
        let mut categories = ctx.entity::<CourseCategory>().use_course_categories(
            FindArgs::new()
                .filter(Where::new().eq("isActive", true))
                .order_by(json!({"order": "asc"})),
            ReadOptions::enabled(true),
        );
        let mut mentors = ctx
            .entity::<Mentor>()
            .use_mentors(FindArgs::new(), ReadOptions::enabled(true));

        let categories = categories.settled().await;
        let mentors = mentors.settled().await;
        if let Some(error) = categories.error().or(mentors.error()) {
            return Err(error.clone());
        }

        let category_rows: Vec<Value> = categories
            .course_categories_data()
            .map(|page| page.data.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default();
        let mentor_rows: Vec<Value> = mentors
            .mentors_data()
            .map(|page| page.data.iter().filter_map(|m| serde_json::to_value(m).ok()).collect())
            .unwrap_or_default();

        Ok(Self {
            categories: make_options(&category_rows, |row| {
                row.get("nameUz").and_then(Value::as_str).unwrap_or_default().to_string()
            }),
            mentors: make_options(&mentor_rows, |row| mentor_name(row).unwrap_or_default()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_columns() {
        let config = course_page_config();
        assert_eq!(config.columns.len(), 11);
        assert_eq!(config.drawer_width, 650);

        let mentor = config.columns.iter().find(|c| c.title == "Mentor").unwrap();
        assert_eq!(mentor.cell(&json!({"mentor": null}), 1), "-");
        assert_eq!(
            mentor.cell(&json!({"mentor": {"firstName": "Aziz", "lastName": "Karimov"}}), 1),
            "Aziz Karimov"
        );
    }

    #[test]
    fn test_course_create_defaults() {
        let config = course_page_config();
        let mut values = serde_json::Map::new();
        values.insert("titleUz".to_string(), json!("Rust"));
        values.insert("price".to_string(), json!(100000));
        values.insert("categoryId".to_string(), json!("cat-1"));

        let payload = config.form.create_payload(&values).unwrap();
        assert_eq!(payload["duration"], 0);
        assert_eq!(payload["level"], "beginner");
        assert_eq!(payload["isPublished"], false);
        assert!(payload.get("mentorId").is_none());
    }
}
