//! Query hook over the core cache.
//!
//! A [`Query`] fetches when its reactive inputs change, when one of its keys
//! is invalidated, or on [`Query::refetch`]. Only the newest response lands.

use crate::auth::{OneRoof, use_auth};
use crate::components::feedback::{ErrorPanel, Spinner};
use leptos::prelude::*;
use leptos::task::spawn_local;
use oneroof::error::{AppError, AppResult};
use oneroof::query::QueryKey;
use std::future::Future;
use std::rc::Rc;

pub struct Query<T: Send + Sync + 'static> {
    pub data: RwSignal<Option<T>>,
    pub error: RwSignal<Option<AppError>>,
    pub loading: RwSignal<bool>,
    generation: RwSignal<u64>,
}

impl<T: Send + Sync + 'static> Clone for Query<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for Query<T> {}

impl<T: Send + Sync + 'static> Query<T> {
    pub fn refetch(&self) {
        self.generation.try_update(|g| *g += 1);
    }
}

pub fn use_query<T, F, Fut>(keys: Vec<QueryKey>, fetch: F) -> Query<T>
where
    T: Send + Sync + 'static,
    F: Fn(Rc<OneRoof>) -> Fut + 'static,
    Fut: Future<Output = AppResult<T>> + 'static,
{
    let auth = use_auth();
    let query = Query {
        data: RwSignal::new(None),
        error: RwSignal::new(None),
        loading: RwSignal::new(true),
        generation: RwSignal::new(0),
    };

    Effect::new(move |_| {
        let generation = query.generation.get();
        query.loading.set(true);
        let pending = fetch(auth.app());
        spawn_local(async move {
            let result = pending.await;
            if query.generation.try_get_untracked() != Some(generation) {
                return;
            }
            match result {
                Ok(value) => {
                    query.data.try_set(Some(value));
                    query.error.try_set(None);
                }
                Err(e) => {
                    tracing::debug!(code = e.error_code(), "query failed: {}", e);
                    query.error.try_set(Some(e));
                }
            }
            query.loading.try_set(false);
        });
    });

    let app = auth.app();
    let listener = app.cache.subscribe(move |key| {
        if keys.contains(key) {
            query.refetch();
        }
    });
    on_cleanup(move || auth.app().cache.unsubscribe(listener));

    query
}

/// Spinner until the first result, the retry panel on failure, then `view`.
#[component]
pub fn QueryView<T, V>(query: Query<T>, view: impl Fn(&T) -> V + Send + Sync + 'static) -> impl IntoView
where
    T: Send + Sync + 'static,
    V: IntoView + 'static,
{
    move || {
        if let Some(error) = query.error.get() {
            return view! { <ErrorPanel error=error on_retry=Callback::new(move |_| query.refetch()) /> }
                .into_any();
        }
        query.data.with(|data| match data {
            Some(value) => view(value).into_any(),
            None => view! { <Spinner /> }.into_any(),
        })
    }
}
