//! Admin pages: URL state, drawer, forms, tables and the page controller

pub mod courses;
pub mod crud_page;
pub mod drawer;
pub mod form;
pub mod location;
pub mod table;

pub use courses::{CoursePage, CourseRelations, course_page, course_page_config};
pub use crud_page::{CrudPage, PageConfig};
pub use drawer::DrawerState;
pub use form::{FieldDescriptor, FormSchema, FormState, SelectOption, make_options};
pub use location::{LocationParams, PushOptions, TableFetchProps};
pub use table::{ColumnDescriptor, Renderer, TableView};
