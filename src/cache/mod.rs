//! Query cache: keyed reads, deduplication, invalidation and mutations

pub mod client;
pub mod mutation;
pub mod observer;
pub mod state;

pub use client::{QueryClient, QueryClientConfig, QueryFn, QueryOptions, QueryResult, RetryPolicy};
pub use mutation::{
    Mutation, MutationCallbacks, MutationFn, MutationOptions, SecondaryOptions, compose_options,
};
pub use observer::QueryObserver;
pub use state::{FetchStatus, MutationState, MutationStatus, QueryState, QueryStatus};
