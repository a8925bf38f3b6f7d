//! Generic list + drawer page of one entity
//!
//! The page owns a location and derives everything else from it: which table
//! page is fetched, whether the drawer is open, and on which record. Writes go
//! through the entity's default write hooks, so a successful create, update or
//! delete refreshes every view of the model.

use super::drawer::{self, DrawerState};
use super::form::{FormSchema, FormState};
use super::location::{LocationParams, PushOptions, TableFetchProps};
use super::table::{ColumnDescriptor, TableView};
use crate::cache::{MutationOptions, QueryResult};
use crate::core::entity::Entity;
use crate::core::error::{AdminError, ValidationError};
use crate::core::query::{DeleteTarget, EntityId, FindArgs, Page, UpdateArgs, Where};
use crate::hooks::{EntityHooks, MutationHandle, ReadHandle, ReadOptions, op};
use serde_json::{Map, Value};

/// Static description of an entity page
#[derive(Debug, Clone)]
pub struct PageConfig {
    /// Table name, also the drawer title suffix
    pub title: String,
    pub columns: Vec<ColumnDescriptor>,
    pub form: FormSchema,
    /// Relations loaded with the table rows and the edited record
    pub include: Option<Value>,
    pub drawer_width: u32,
}

impl PageConfig {
    pub fn new(title: impl Into<String>, columns: Vec<ColumnDescriptor>, form: FormSchema) -> Self {
        Self {
            title: title.into(),
            columns,
            form,
            include: None,
            drawer_width: 650,
        }
    }

    pub fn include(mut self, include: Value) -> Self {
        self.include = Some(include);
        self
    }

    pub fn drawer_width(mut self, width: u32) -> Self {
        self.drawer_width = width;
        self
    }
}

/// Table plus add/edit drawer of entity `E`
pub struct CrudPage<E: Entity> {
    hooks: EntityHooks<E>,
    config: PageConfig,
    location: LocationParams,
    list: ReadHandle<Page<E::Record>, E>,
    detail: Option<ReadHandle<Option<E::Record>, E>>,
    loaded: Option<Value>,
    form: FormState,
    create: MutationHandle<Value, E, op::CreateOne>,
    update: MutationHandle<UpdateArgs<Value>, E, op::UpdateOne>,
    delete: MutationHandle<DeleteTarget, E, op::DeleteOne>,
}

impl<E: Entity> CrudPage<E> {
    pub fn new(hooks: EntityHooks<E>, config: PageConfig, location: LocationParams) -> Self {
        let list = Self::list_handle(&hooks, &config, &location);
        let create = hooks.use_create_one(MutationOptions::new(), None);
        let update = hooks.use_update_one(MutationOptions::new(), None);
        let delete = hooks.use_delete_one(MutationOptions::new(), None);

        Self {
            hooks,
            config,
            location,
            list,
            detail: None,
            loaded: None,
            form: FormState::new(),
            create,
            update,
            delete,
        }
    }

    fn list_props(config: &PageConfig) -> FindArgs {
        let mut props = FindArgs::new();
        if let Some(include) = &config.include {
            props = props.include(include.clone());
        }
        props
    }

    fn list_handle(hooks: &EntityHooks<E>, config: &PageConfig, location: &LocationParams) -> ReadHandle<Page<E::Record>, E> {
        hooks.use_many_with_pagination(Self::list_props(config), ReadOptions::default(), location)
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn hooks(&self) -> &EntityHooks<E> {
        &self.hooks
    }

    pub fn location(&self) -> &LocationParams {
        &self.location
    }

    pub fn drawer(&self) -> DrawerState {
        DrawerState::from_location(&self.location)
    }

    pub fn list(&self) -> &ReadHandle<Page<E::Record>, E> {
        &self.list
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Record the drawer is editing, once loaded
    pub fn loaded_record(&self) -> Option<&Value> {
        self.loaded.as_ref()
    }

    /// Live read of the edited record; invalidations refresh it
    pub fn detail(&self) -> Option<&ReadHandle<Option<E::Record>, E>> {
        self.detail.as_ref()
    }

    pub fn create_handle(&self) -> &MutationHandle<Value, E, op::CreateOne> {
        &self.create
    }

    pub fn update_handle(&self) -> &MutationHandle<UpdateArgs<Value>, E, op::UpdateOne> {
        &self.update
    }

    pub fn delete_handle(&self) -> &MutationHandle<DeleteTarget, E, op::DeleteOne> {
        &self.delete
    }

    pub fn is_saving(&self) -> bool {
        self.create.is_pending() || self.update.is_pending()
    }

    /// Push new query parameters and follow them
    pub fn navigate(&mut self, params: Map<String, Value>, options: PushOptions) {
        self.location.push(params, options);
        self.sync();
    }

    /// Show another table page
    pub fn set_page(&mut self, page_number: u64, page_size: u64) {
        let mut params = Map::new();
        params.insert("pageNumber".to_string(), Value::from(page_number));
        params.insert("pageSize".to_string(), Value::from(page_size));
        self.navigate(params, PushOptions::update());
    }

    /// Re-subscribe to the table page and drop edit state the URL no longer names
    fn sync(&mut self) {
        let (key, enabled) = self.hooks.pagination_view(
            &Self::list_props(&self.config),
            &ReadOptions::default(),
            &self.location,
        );
        if &key != self.list.key() || enabled != self.list.is_enabled() {
            self.list = Self::list_handle(&self.hooks, &self.config, &self.location);
        }

        let keep_detail = match (self.drawer(), &self.loaded) {
            (DrawerState::Edit { id: Some(id) }, Some(record)) => {
                record.get("id").and_then(EntityId::from_value).as_ref() == Some(&id)
            }
            _ => false,
        };
        if !keep_detail {
            self.detail = None;
            self.loaded = None;
        }
    }

    /// Wait for the current table page and render it
    ///
    /// Without a page size in the URL nothing is fetched and the view is empty.
    pub async fn table(&mut self) -> Result<TableView, AdminError> {
        let table = TableFetchProps::from_location(&self.location);
        if !self.list.is_enabled() {
            return Ok(TableView::render(&self.config.columns, &Page::default(), table.skip));
        }

        let result = self.list.settled().await;
        if let Some(error) = result.error() {
            return Err(error.clone());
        }

        let page = match self.list.observer().state().decode::<Page<Value>>() {
            Some(decoded) => decoded?,
            None => Page::default(),
        };
        Ok(TableView::render(&self.config.columns, &page, table.skip))
    }

    pub fn open_add(&mut self) {
        drawer::open_add(&mut self.location);
        self.form.clear();
        self.sync();
    }

    /// Open the drawer on a table row and load its record
    pub async fn open_edit(&mut self, row: &Value) -> Result<Option<Value>, AdminError> {
        drawer::open_edit(&mut self.location, row)?;
        self.sync();
        self.load_record().await
    }

    /// Fetch the record named by the URL `id` and fill the form with it
    pub async fn load_record(&mut self) -> Result<Option<Value>, AdminError> {
        let Some(id) = self.drawer().edit_id().cloned() else {
            return Err(ValidationError::NoRecordLoaded.into());
        };

        let mut props = FindArgs::new().filter(Where::id(id));
        if let Some(include) = &self.config.include {
            props = props.include(include.clone());
        }

        let mut handle = self.hooks.use_one(props, ReadOptions::default());
        let result = handle.settled().await;
        if let Some(error) = result.error() {
            return Err(error.clone());
        }

        let record = handle
            .observer()
            .state()
            .data
            .filter(|value| !value.is_null());
        match &record {
            Some(record) => self.form.load(&self.config.form, record),
            None => self.form.clear(),
        }
        self.loaded = record.clone();
        self.detail = Some(handle);
        Ok(record)
    }

    pub fn close(&mut self) {
        drawer::close(&mut self.location);
        self.form.clear();
        self.sync();
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.form.set(name, value);
    }

    /// Save the drawer form
    ///
    /// The URL decides between create and update. An update targets the id of
    /// the loaded record, never the one in the URL. The drawer closes on
    /// success; on failure it stays open with the form untouched.
    pub async fn submit(&mut self) -> QueryResult {
        let result = match self.drawer() {
            DrawerState::Add => match self.config.form.create_payload(self.form.values()) {
                Ok(payload) => self.create.mutate_async(Value::Object(payload)).await,
                Err(error) => self.create.mutation().reject(error.into()).await,
            },
            DrawerState::Edit { .. } => {
                let id = self
                    .loaded
                    .as_ref()
                    .and_then(|record| record.get("id"))
                    .and_then(EntityId::from_value);
                let payload = self.config.form.update_payload(self.form.values());

                match (id, payload) {
                    (Some(id), Ok(payload)) => {
                        self.update
                            .mutate_async(UpdateArgs::by_id(Value::Object(payload), id))
                            .await
                    }
                    (None, _) => {
                        self.update
                            .mutation()
                            .reject(ValidationError::NoRecordLoaded.into())
                            .await
                    }
                    (_, Err(error)) => self.update.mutation().reject(error.into()).await,
                }
            }
            DrawerState::List => return Err(ValidationError::DrawerClosed.into()),
        };

        if result.is_ok() {
            self.close();
        }
        result
    }

    /// Delete the record behind a table row
    pub async fn delete_row(&self, row: &Value) -> QueryResult {
        self.delete.delete_from_table(row).await
    }
}

impl<E: Entity> std::fmt::Debug for CrudPage<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudPage")
            .field("title", &self.config.title)
            .field("location", &self.location.to_url())
            .field("drawer", &self.drawer())
            .finish()
    }
}
