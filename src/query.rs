//! Fluent query construction and execution.
//!
//! A [`QueryBuilder`] is handed out by a [`Resource`](crate::Resource) for one
//! request chain. Chained calls mutate its [`QueryOptions`] in place and return
//! the same builder; [`get`](QueryBuilder::get) and
//! [`get_all`](QueryBuilder::get_all) execute it.
//!
//! ```no_run
//! use sportmonks::SportMonksClient;
//!
//! # async fn example() -> Result<(), sportmonks::Error> {
//! let client = SportMonksClient::builder().api_token("token").build()?;
//!
//! let fixtures = client
//!     .fixtures()
//!     .by_date("2024-05-19")?
//!     .include(["participants", "venue"])
//!     .include_fields("scores", ["score", "description"])
//!     .filter("fixtureLeagues", [8, 9])
//!     .per_page(50)
//!     .get_all::<serde_json::Value>()
//!     .await?;
//!
//! println!("{} fixtures", fixtures.len());
//! # Ok(())
//! # }
//! ```

use crate::{
    executor::RequestExecutor,
    metadata::RequestMetadata,
    params::{Include, IntoFilterValue, QueryOptions},
    response::{Envelope, RawEnvelope, Response},
    Result,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Accumulates query options for one request and executes it.
///
/// Builders carry mutable state and are meant for a single request chain;
/// create a fresh one from the resource for each query.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    executor: Arc<RequestExecutor>,
    segments: Vec<String>,
    include_separator: char,
    options: QueryOptions,
}

impl QueryBuilder {
    /// Creates a builder for the given path segments.
    pub fn new(executor: Arc<RequestExecutor>, segments: Vec<String>, include_separator: char) -> Self {
        Self {
            executor,
            segments,
            include_separator,
            options: QueryOptions::default(),
        }
    }

    /// Includes relationships by path. Paths already included are skipped.
    pub fn include<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            self.options.add_include(path, Vec::<String>::new());
        }
        self
    }

    /// Includes a relationship restricted to the given fields.
    pub fn include_fields<I, S>(&mut self, path: impl Into<String>, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.add_include(path, fields);
        self
    }

    /// Includes structured relationship trees, see [`Include`].
    pub fn with_includes(&mut self, includes: impl IntoIterator<Item = Include>) -> &mut Self {
        for include in includes {
            self.options.add_include_tree(include);
        }
        self
    }

    /// Selects the fields returned for the base entity.
    pub fn select<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.add_select(fields);
        self
    }

    /// Sets a filter. A later call with the same key replaces the value.
    pub fn filter(&mut self, key: impl Into<String>, value: impl IntoFilterValue) -> &mut Self {
        self.options.set_filter(key, value);
        self
    }

    /// Sets several filters at once.
    pub fn filters<I, K, V>(&mut self, filters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoFilterValue,
    {
        for (key, value) in filters {
            self.options.set_filter(key, value);
        }
        self
    }

    /// Sets the sort, passed through verbatim (`-field` sorts descending).
    pub fn order_by(&mut self, sort: impl Into<String>) -> &mut Self {
        self.options.set_sort(sort);
        self
    }

    /// Requests a specific page.
    pub fn page(&mut self, page: u32) -> &mut Self {
        self.options.set_page(page);
        self
    }

    /// Sets the page size.
    pub fn per_page(&mut self, per_page: u32) -> &mut Self {
        self.options.set_per_page(per_page);
        self
    }

    /// Alias for [`per_page`](Self::per_page).
    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.per_page(limit)
    }

    /// The accumulated options.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// The query parameters this builder would send, without the API token.
    pub fn params(&self) -> BTreeMap<String, String> {
        self.options.encode(self.include_separator)
    }

    /// The request path below the base URL.
    pub fn path(&self) -> String {
        RequestMetadata::new(self.segments.iter()).path()
    }

    /// Executes the query and decodes the envelope.
    ///
    /// # Errors
    ///
    /// Returns whatever the executor reports once its retries are spent, or
    /// [`Error::Deserialization`](crate::Error::Deserialization) if `data` does
    /// not decode as `T`.
    pub async fn get<T>(&self) -> Result<Response<Envelope<T>>>
    where
        T: DeserializeOwned,
    {
        let response = self.fetch(&self.options).await?;
        response.try_map(Envelope::decode)
    }

    /// Fetches every page, starting from the set page (or 1), and returns all
    /// items in order.
    ///
    /// Stops when a page reports `has_more: false`, when a page is empty, or
    /// after an unpaginated response. The first failure is returned as is.
    pub async fn get_all<T>(&self) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut page = self.options.page().unwrap_or(1);
        let mut items = Vec::new();

        loop {
            let mut options = self.options.clone();
            options.set_page(page);

            let response = self.fetch(&options).await?;
            let envelope = response.try_map(Envelope::<T>::decode_collection)?.data;

            let has_more = envelope.has_more();
            let page_items = envelope.into_items();
            let page_len = page_items.len();
            items.extend(page_items);

            tracing::debug!(
                path = %self.path(),
                page = page,
                page_items = page_len,
                total_items = items.len(),
                has_more = has_more,
                "Fetched page"
            );

            if !has_more || page_len == 0 {
                return Ok(items);
            }
            page += 1;
        }
    }

    async fn fetch(&self, options: &QueryOptions) -> Result<Response<RawEnvelope>> {
        self.executor.execute(&self.request(options)).await
    }

    fn request(&self, options: &QueryOptions) -> RequestMetadata {
        RequestMetadata::new(self.segments.iter().cloned())
            .with_query_params(options.encode(self.include_separator))
    }
}
