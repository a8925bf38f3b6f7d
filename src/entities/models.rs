//! Every model the admin dashboard manages
//!
//! Models with a typed record decode rows into it; the rest use
//! [`JsonRecord`](crate::core::query::JsonRecord).

use super::macros::define_entities;
use super::records::{CourseRecord, MentorRecord, ProductRecord};

define_entities! {
    Address(Address, Addresses),
    Assignment(Assignment, Assignments),
    Banner(Banner, Banners),
    Boardtask(Boardtask, Boardtasks),
    Bookmark(Bookmark, Bookmarks),
    BotChat(BotChat, BotChats),
    BotPost(BotPost, BotPosts),
    Brand(Brand, Brands),
    CartItem(CartItem, CartItems),
    Cart(Cart, Carts),
    Category(Category, Categories),
    Chat(Chat, Chats),
    Client(Client, Clients),
    CoinHistory(CoinHistory, CoinHistories),
    CourseCategory(CourseCategory, CourseCategories),
    CourseEnrollment(CourseEnrollment, CourseEnrollments),
    Course(Course, Courses): CourseRecord,
    Department(Department, Departments),
    Employee(Employee, Employees),
    ErrorFeedback(ErrorFeedback, ErrorFeedbacks),
    ErrorLog(ErrorLog, ErrorLogs),
    EventCalendar(EventCalendar, EventCalendars),
    Event(Event, Events),
    FavoriteProduct(FavoriteProduct, FavoriteProducts),
    LeadComment(LeadComment, LeadComments),
    LeadHistory(LeadHistory, LeadHistories),
    LeadStatusHistory(LeadStatusHistory, LeadStatusHistories),
    LeadStatus(LeadStatus, LeadStatuses),
    Lead(Lead, Leads),
    LessonProgress(LessonProgress, LessonProgresses),
    Lesson(Lesson, Lessons),
    Mentor(Mentor, Mentors): MentorRecord,
    Module(Module, Modules),
    /// Backend model name is plural, rows are single notes
    Notes(Note, Notes),
    Notifications(Notification, Notifications),
    OrderGroup(OrderGroup, OrderGroups),
    OrderItem(OrderItem, OrderItems),
    Order(Order, Orders),
    PageView(PageView, PageViews),
    /// Static content pages of the public site
    Pages(Page, Pages),
    Partner(Partner, Partners),
    Permission(Permission, Permissions),
    Position(Position, Positions),
    Product(Product, Products): ProductRecord,
    PromoCode(PromoCode, PromoCodes),
    QuestionOption(QuestionOption, QuestionOptions),
    Question(Question, Questions),
    Role(Role, Roles),
    ShopCategory(ShopCategory, ShopCategories),
    ShopHistory(ShopHistory, ShopHistories),
    Shop(Shop, Shops),
    SmartupConfig(SmartupConfig, SmartupConfigs),
    SubscriptionPlan(SubscriptionPlan, SubscriptionPlans),
    SubscriptionTransaction(SubscriptionTransaction, SubscriptionTransactions),
    Subscription(Subscription, Subscriptions),
    Subtask(Subtask, Subtasks),
    Suggestions(Suggestion, Suggestions),
    TaskList(TaskList, TaskLists),
    Task(Task, Tasks),
    Test(Test, Tests),
    TgGroup(TgGroup, TgGroups),
    UserAnswer(UserAnswer, UserAnswers),
    UserAssignment(UserAssignment, UserAssignments),
    UserDevice(UserDevice, UserDevices),
    UserTask(UserTask, UserTasks),
    UserTestResult(UserTestResult, UserTestResults),
    User(User, Users),
    Video(Video, Videos),
    ViewNotification(ViewNotification, ViewNotifications),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::Entity;

    #[test]
    fn test_model_count() {
        assert_eq!(all_models().len(), 69);
    }

    #[test]
    fn test_irregular_plurals() {
        assert_eq!(Category::keys().list, "categories");
        assert_eq!(LeadStatus::keys().list, "lead-statuses");
        assert_eq!(LessonProgress::keys().count, "count-lesson-progresses");
        assert_eq!(Address::keys().exist, "exist-address");
    }

    #[test]
    fn test_model_name_differs_from_singular() {
        let model = Notes::model();
        assert_eq!(model.name, "Notes");
        assert_eq!(model.singular, "Note");
        assert_eq!(model.path_segment, "notes");
        assert_eq!(model.keys.single, "note");
        assert_eq!(model.keys.list, "notes");
        assert_eq!(model.aggregate_path, "/api/note/aggregate");
    }

    #[test]
    fn test_course_paths() {
        let model = Course::model();
        assert_eq!(model.operation_path("find-many"), "api/course/find-many");
        assert_eq!(model.keys.aggregate, "aggregate-courses");
    }
}
