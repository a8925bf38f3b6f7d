//! Test sessions: fetching a test without its answers, starting an attempt,
//! submitting answers and reading a user's past results

use super::models::Test;
use crate::cache::{Mutation, MutationFn, MutationOptions, QueryFn, SecondaryOptions, compose_options};
use crate::core::entity::Entity;
use crate::hooks::{EntityHooks, MutationHandle, ReadHandle, ReadOptions};
use futures::FutureExt;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const FOR_TAKING_PATH: &str = "/api/test/get-for-taking";
pub const START_PATH: &str = "/api/test/start";
pub const SUBMIT_PATH: &str = "/api/test/submit";
pub const USER_RESULTS_PATH: &str = "/api/test/user-results";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTest {
    pub user_id: String,
    pub test_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTest {
    pub user_test_result_id: String,
    pub answers: Vec<Value>,
}

#[derive(Debug)]
pub struct StartAttempt;

#[derive(Debug)]
pub struct SubmitAttempt;

impl EntityHooks<Test> {
    /// Questions of a test, correct answers excluded
    ///
    /// Key `[test, for-taking, testId]`; idle while `test_id` is empty unless
    /// `enabled` says otherwise.
    pub fn use_test_for_taking(&self, test_id: &str, options: ReadOptions) -> ReadHandle<Value, Test> {
        let enabled = options.enabled.unwrap_or(!test_id.is_empty());
        let key = self.model().keys.single().with("for-taking").with(test_id);
        let body = json!({ "where": { "id": test_id } });
        self.post_read(key, FOR_TAKING_PATH, body, &options, enabled)
    }

    /// Past attempts of one user; key `[tests, user-results, userId, testId]`
    pub fn use_user_test_results(&self, user_id: &str, test_id: &str, options: ReadOptions) -> ReadHandle<Value, Test> {
        let enabled = options
            .enabled
            .unwrap_or(!user_id.is_empty() && !test_id.is_empty());
        let key = self
            .model()
            .keys
            .list()
            .with("user-results")
            .with(user_id)
            .with(test_id);
        let body = json!({ "userId": user_id, "testId": test_id });
        self.post_read(key, USER_RESULTS_PATH, body, &options, enabled)
    }

    /// `POST /api/test/start {userId, testId}`
    pub fn use_start_test(&self, options: MutationOptions) -> MutationHandle<StartTest, Test, StartAttempt> {
        self.post_action("start", START_PATH, options)
    }

    /// `POST /api/test/submit {userTestResultId, answers}`
    pub fn use_submit_test(&self, options: MutationOptions) -> MutationHandle<SubmitTest, Test, SubmitAttempt> {
        self.post_action("submit", SUBMIT_PATH, options)
    }

    fn post_read(
        &self,
        key: crate::core::QueryKey,
        path: &'static str,
        body: Value,
        options: &ReadOptions,
        enabled: bool,
    ) -> ReadHandle<Value, Test> {
        let service = self.context().service().clone();
        let fetcher: QueryFn = Arc::new(move || {
            let service = service.clone();
            let body = body.clone();
            async move { service.post(path, body).await }.boxed()
        });
        let observer = self
            .context()
            .client()
            .observe(key, fetcher, options.query_options(enabled));
        ReadHandle::new(observer)
    }

    fn post_action<I, O>(&self, name: &str, path: &'static str, options: MutationOptions) -> MutationHandle<I, Test, O>
    where
        I: Serialize + Send + 'static,
    {
        let service = self.context().service().clone();
        let run: MutationFn<I> = Arc::new(move |input: I| {
            let service = service.clone();
            let body = serde_json::to_value(&input);
            async move {
                let body = body.map_err(|e| crate::core::AdminError::decode(path, e))?;
                service.post(path, body).await
            }
            .boxed()
        });

        // Attempts only surface errors; nothing cached depends on them
        let callbacks = compose_options(options, SecondaryOptions::new(), self.context().notifier().clone());
        let mutation = Mutation::new(
            format!("{}.{name}", Test::name()),
            self.context().client().clone(),
            run,
            callbacks,
        );
        MutationHandle::new(mutation)
    }
}

impl MutationHandle<StartTest, Test, StartAttempt> {
    pub fn start_test(&self, input: StartTest) -> JoinHandle<()> {
        self.mutate(input)
    }
}

impl MutationHandle<SubmitTest, Test, SubmitAttempt> {
    pub fn submit_test(&self, input: SubmitTest) -> JoinHandle<()> {
        self.mutate(input)
    }
}
