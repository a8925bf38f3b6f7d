//! Macros for reducing boilerplate when declaring backend models
//!
//! `define_entities!` takes one line per model and generates, for each:
//!
//! - a marker type implementing [`Entity`](crate::core::entity::Entity)
//! - named entry points on [`EntityHooks`](crate::hooks::EntityHooks)
//!   (`use_courses`, `use_course`, `use_create_course`, ...)
//! - named accessors on the results and handles those hooks return
//!   (`courses_data`, `is_loading_courses`, `created_course`, ...)
//!
//! # Example
//! ```rust,ignore
//! define_entities! {
//!     Course(Course, Courses): CourseRecord,
//!     CourseCategory(CourseCategory, CourseCategories),
//!     Notifications(Notification, Notifications),
//! }
//! ```
//!
//! The first identifier is the model name as the backend knows it, the pair
//! in parentheses its singular and plural forms. Models without a record type
//! use [`JsonRecord`](crate::core::query::JsonRecord).

/// Row type of a model line, `JsonRecord` when none is given
macro_rules! record_type {
    () => {
        $crate::core::query::JsonRecord
    };
    ($record:ty) => {
        $record
    };
}

/// Declare every model and collect their descriptors in `all_models()`
macro_rules! define_entities {
    ($( $(#[$meta:meta])* $ty:ident ( $singular:ident, $plural:ident ) $(: $record:ty)? ),* $(,)?) => {
        $(
            $crate::entities::macros::impl_entity!(
                $(#[$meta])* $ty, $singular, $plural,
                $crate::entities::macros::record_type!($($record)?)
            );
        )*

        /// Descriptors of every built-in model, in declaration order
        pub fn all_models() -> Vec<&'static $crate::core::entity::EntityModel> {
            vec![$(<$ty as $crate::core::entity::Entity>::model()),*]
        }
    };
}

/// Generate the marker type, hook entry points and aliases of one model
macro_rules! impl_entity {
    ($(#[$meta:meta])* $ty:ident, $singular:ident, $plural:ident, $record:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $ty;

        impl $crate::core::entity::Entity for $ty {
            type Record = $record;

            fn model() -> &'static $crate::core::entity::EntityModel {
                static MODEL: ::std::sync::OnceLock<$crate::core::entity::EntityModel> =
                    ::std::sync::OnceLock::new();
                MODEL.get_or_init(|| {
                    $crate::core::entity::EntityModel::new(
                        stringify!($ty),
                        stringify!($singular),
                        stringify!($plural),
                    )
                })
            }
        }

        ::paste::paste! {
            // ----- read hooks -----

            impl $crate::hooks::EntityHooks<$ty> {
                pub fn [<use_ $plural:snake>](
                    &self,
                    props: $crate::core::query::FindArgs,
                    options: $crate::hooks::ReadOptions,
                ) -> $crate::hooks::ReadHandle<$crate::core::query::Page<$record>, $ty> {
                    self.use_many(props, options)
                }

                pub fn [<use_ $plural:snake _with_pagination>](
                    &self,
                    props: $crate::core::query::FindArgs,
                    options: $crate::hooks::ReadOptions,
                    location: &$crate::pages::location::LocationParams,
                ) -> $crate::hooks::ReadHandle<$crate::core::query::Page<$record>, $ty> {
                    self.use_many_with_pagination(props, options, location)
                }

                pub fn [<use_ $singular:snake>](
                    &self,
                    props: $crate::core::query::FindArgs,
                    options: $crate::hooks::ReadOptions,
                ) -> $crate::hooks::ReadHandle<Option<$record>, $ty> {
                    self.use_one(props, options)
                }

                pub fn [<use_count_ $plural:snake>](
                    &self,
                    props: $crate::core::query::FindArgs,
                    options: $crate::hooks::ReadOptions,
                ) -> $crate::hooks::ReadHandle<u64, $ty> {
                    self.use_count(props, options)
                }

                pub fn [<use_exist_ $singular:snake>](
                    &self,
                    props: $crate::core::query::FindArgs,
                    options: $crate::hooks::ReadOptions,
                ) -> $crate::hooks::ReadHandle<bool, $ty> {
                    self.use_exist(props, options)
                }

                pub fn [<use_aggregate_ $plural:snake>](
                    &self,
                    props: ::serde_json::Value,
                    options: $crate::hooks::ReadOptions,
                ) -> $crate::hooks::ReadHandle<::serde_json::Value, $ty> {
                    self.use_aggregate(props, options)
                }

                // ----- write hooks -----

                pub fn [<use_create_ $singular:snake>]<D: ::serde::Serialize + Send + 'static>(
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<D, $ty, $crate::hooks::op::CreateOne> {
                    self.use_create_one(options, secondary)
                }

                pub fn [<use_create_ $plural:snake>]<D: ::serde::Serialize + Send + 'static>(
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<Vec<D>, $ty, $crate::hooks::op::CreateMany> {
                    self.use_create_many(options, secondary)
                }

                pub fn [<use_create_list_ $plural:snake>]<D: ::serde::Serialize + Send + 'static>(
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<Vec<D>, $ty, $crate::hooks::op::CreateList> {
                    self.use_create_list(options, secondary)
                }

                pub fn [<use_update_ $singular:snake>]<D: ::serde::Serialize + Send + 'static>(
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<$crate::core::query::UpdateArgs<D>, $ty, $crate::hooks::op::UpdateOne> {
                    self.use_update_one(options, secondary)
                }

                pub fn [<use_update_ $plural:snake>]<D: ::serde::Serialize + Send + 'static>(
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<$crate::core::query::UpdateArgs<D>, $ty, $crate::hooks::op::UpdateMany> {
                    self.use_update_many(options, secondary)
                }

                pub fn [<use_update_list_ $plural:snake>]<D: ::serde::Serialize + Send + 'static>(
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<Vec<D>, $ty, $crate::hooks::op::UpdateList> {
                    self.use_update_list(options, secondary)
                }

                pub fn [<use_delete_ $singular:snake>](
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<$crate::core::query::DeleteTarget, $ty, $crate::hooks::op::DeleteOne> {
                    self.use_delete_one(options, secondary)
                }

                pub fn [<use_delete_ $plural:snake>](
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<$crate::core::query::Where, $ty, $crate::hooks::op::DeleteMany> {
                    self.use_delete_many(options, secondary)
                }

                pub fn [<use_delete_all_ $plural:snake>](
                    &self,
                    options: $crate::cache::MutationOptions,
                    secondary: Option<$crate::cache::SecondaryOptions>,
                ) -> $crate::hooks::MutationHandle<(), $ty, $crate::hooks::op::DeleteAll> {
                    self.use_delete_all(options, secondary)
                }
            }

            // ----- read result aliases -----

            impl $crate::hooks::ReadResult<$crate::core::query::Page<$record>, $ty> {
                pub fn [<is_loading_ $plural:snake>](&self) -> bool {
                    self.is_loading()
                }

                pub fn [<is_error_ $plural:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<$plural:snake _data>](&self) -> Option<&$crate::core::query::Page<$record>> {
                    self.data()
                }
            }

            impl $crate::hooks::ReadResult<Option<$record>, $ty> {
                pub fn [<is_loading_ $singular:snake>](&self) -> bool {
                    self.is_loading()
                }

                pub fn [<is_error_ $singular:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<$singular:snake _data>](&self) -> Option<&$record> {
                    self.data().and_then(Option::as_ref)
                }
            }

            impl $crate::hooks::ReadResult<u64, $ty> {
                pub fn [<is_loading_count_ $ty:snake>](&self) -> bool {
                    self.is_loading()
                }

                pub fn [<is_error_count_ $ty:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<count_ $plural:snake>](&self) -> Option<u64> {
                    self.data().copied()
                }
            }

            impl $crate::hooks::ReadResult<bool, $ty> {
                pub fn [<is_loading_exist_ $ty:snake>](&self) -> bool {
                    self.is_loading()
                }

                pub fn [<is_error_exist_ $ty:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<exist_ $singular:snake>](&self) -> Option<bool> {
                    self.data().copied()
                }
            }

            impl $crate::hooks::ReadResult<::serde_json::Value, $ty> {
                pub fn [<is_loading_aggregate_ $ty:snake>](&self) -> bool {
                    self.is_loading()
                }

                pub fn [<is_error_aggregate_ $ty:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<aggregate_ $plural:snake>](&self) -> Option<&::serde_json::Value> {
                    self.data()
                }
            }

            // ----- mutation aliases -----

            impl<D: Send + 'static> $crate::hooks::MutationHandle<D, $ty, $crate::hooks::op::CreateOne> {
                pub fn [<create_ $singular:snake>](&self, data: D) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(data)
                }

                pub fn [<is_loading_create_ $singular:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_create_ $singular:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<created_ $singular:snake>](&self) -> Option<Result<$record, $crate::core::error::AdminError>> {
                    self.data_as()
                }
            }

            impl<D: Send + 'static> $crate::hooks::MutationHandle<Vec<D>, $ty, $crate::hooks::op::CreateMany> {
                pub fn [<create_ $plural:snake>](&self, data: Vec<D>) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(data)
                }

                pub fn [<is_loading_create_ $plural:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_create_ $plural:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<created_ $plural:snake>](&self) -> Option<Result<$crate::core::query::BatchPayload, $crate::core::error::AdminError>> {
                    self.data_as()
                }
            }

            impl<D: Send + 'static> $crate::hooks::MutationHandle<Vec<D>, $ty, $crate::hooks::op::CreateList> {
                pub fn [<create_list_ $plural:snake>](&self, items: Vec<D>) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(items)
                }

                pub fn [<is_loading_create_list_ $plural:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_create_list_ $plural:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<created_list_ $plural:snake>](&self) -> Option<Result<Vec<$record>, $crate::core::error::AdminError>> {
                    self.data_as()
                }
            }

            impl<D: Send + 'static> $crate::hooks::MutationHandle<$crate::core::query::UpdateArgs<D>, $ty, $crate::hooks::op::UpdateOne> {
                pub fn [<update_ $singular:snake>](&self, args: $crate::core::query::UpdateArgs<D>) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(args)
                }

                pub fn [<is_loading_update_ $singular:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_update_ $singular:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<updated_ $singular:snake>](&self) -> Option<Result<$record, $crate::core::error::AdminError>> {
                    self.data_as()
                }
            }

            impl<D: Send + 'static> $crate::hooks::MutationHandle<$crate::core::query::UpdateArgs<D>, $ty, $crate::hooks::op::UpdateMany> {
                pub fn [<update_ $plural:snake>](&self, args: $crate::core::query::UpdateArgs<D>) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(args)
                }

                pub fn [<is_loading_update_ $plural:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_update_ $plural:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<updated_ $plural:snake>](&self) -> Option<Result<$crate::core::query::BatchPayload, $crate::core::error::AdminError>> {
                    self.data_as()
                }
            }

            impl<D: Send + 'static> $crate::hooks::MutationHandle<Vec<D>, $ty, $crate::hooks::op::UpdateList> {
                pub fn [<update_list_ $plural:snake>](&self, items: Vec<D>) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(items)
                }

                pub fn [<is_loading_update_list_ $plural:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_update_list_ $plural:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<updated_list_ $plural:snake>](&self) -> Option<Result<Vec<$record>, $crate::core::error::AdminError>> {
                    self.data_as()
                }
            }

            impl $crate::hooks::MutationHandle<$crate::core::query::DeleteTarget, $ty, $crate::hooks::op::DeleteOne> {
                pub fn [<delete_ $singular:snake>](
                    &self,
                    target: impl Into<$crate::core::query::DeleteTarget>,
                ) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(target.into())
                }

                pub async fn [<delete_ $singular:snake _from_table>](
                    &self,
                    row: &::serde_json::Value,
                ) -> $crate::cache::QueryResult {
                    self.delete_from_table(row).await
                }

                pub fn [<is_loading_delete_ $singular:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_delete_ $singular:snake>](&self) -> bool {
                    self.is_error()
                }
            }

            impl $crate::hooks::MutationHandle<$crate::core::query::Where, $ty, $crate::hooks::op::DeleteMany> {
                pub fn [<delete_ $plural:snake>](&self, filter: $crate::core::query::Where) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(filter)
                }

                pub fn [<is_loading_delete_ $plural:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_delete_ $plural:snake>](&self) -> bool {
                    self.is_error()
                }

                pub fn [<deleted_ $plural:snake>](&self) -> Option<Result<$crate::core::query::BatchPayload, $crate::core::error::AdminError>> {
                    self.data_as()
                }
            }

            impl $crate::hooks::MutationHandle<(), $ty, $crate::hooks::op::DeleteAll> {
                pub fn [<delete_all_ $plural:snake>](&self) -> ::tokio::task::JoinHandle<()> {
                    self.mutate(())
                }

                pub fn [<is_loading_delete_all_ $plural:snake>](&self) -> bool {
                    self.is_pending()
                }

                pub fn [<is_error_delete_all_ $plural:snake>](&self) -> bool {
                    self.is_error()
                }
            }
        }
    };
}

pub(crate) use define_entities;
pub(crate) use impl_entity;
pub(crate) use record_type;
