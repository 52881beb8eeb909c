//! Query options and their encoding into SportMonks query parameters.
//!
//! [`QueryOptions`] accumulates includes, field selections, filters, sorting and
//! pagination. [`QueryOptions::encode`] turns them into the flat, string-keyed
//! parameter map the API expects:
//!
//! | Option     | Parameter  | Example                          |
//! |------------|------------|----------------------------------|
//! | includes   | `include`  | `country;venue:name,city`        |
//! | selections | `select`   | `id,name`                        |
//! | filters    | `filters`  | `eventTypes:14,19;active:true`   |
//! | sort       | `sort`     | `-starting_at`                   |
//! | page       | `page`     | `2`                              |
//! | page size  | `per_page` | `50`                             |
//!
//! Encoding is pure: the same options always produce the same map.

use std::collections::BTreeMap;

/// Default separator placed between include entries.
pub const DEFAULT_INCLUDE_SEPARATOR: char = ';';

/// A relationship to embed in the response, optionally scoped to a field subset
/// and carrying nested relationships of its own.
///
/// # Examples
///
/// ```
/// use sportmonks::params::{Include, QueryOptions};
///
/// let include = Include::new("participants")
///     .nested(Include::new("country").fields(["name", "image_path"]));
///
/// let mut options = QueryOptions::default();
/// options.add_include_tree(include);
///
/// let params = options.encode(';');
/// assert_eq!(params["include"], "participants.country:name,image_path");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    path: String,
    fields: Vec<String>,
    nested: Vec<Include>,
}

impl Include {
    /// Creates an include for the given relationship path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Restricts the include to the given fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Adds a nested relationship below this one.
    pub fn nested(mut self, include: Include) -> Self {
        self.nested.push(include);
        self
    }

    /// Flattens the tree into dotted entries, parents before children.
    fn flatten_into(self, prefix: Option<&str>, out: &mut Vec<IncludeEntry>) {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{}", self.path),
            None => self.path,
        };

        // A bare parent is implied by its children.
        if !self.fields.is_empty() || self.nested.is_empty() {
            out.push(IncludeEntry {
                path: path.clone(),
                fields: self.fields,
            });
        }

        for child in self.nested {
            child.flatten_into(Some(&path), out);
        }
    }
}

/// One flattened include: a dotted path and its field subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeEntry {
    /// The dotted relationship path, e.g. `participants.country`.
    pub path: String,
    /// Fields requested for this relationship; empty means all fields.
    pub fields: Vec<String>,
}

impl IncludeEntry {
    fn render(&self) -> String {
        if self.fields.is_empty() {
            self.path.clone()
        } else {
            format!("{}:{}", self.path, self.fields.join(","))
        }
    }
}

/// Values accepted by a filter: a scalar or an ordered collection of scalars.
///
/// Implemented for integers, floats, booleans, strings, and `Vec`s, slices and arrays
/// of those.
pub trait IntoFilterValue {
    /// Renders the value(s) in their textual form.
    fn into_filter_values(self) -> Vec<String>;
}

/// A scalar that can appear inside a filter.
pub trait FilterScalar {
    /// Renders the scalar in its textual form.
    fn to_filter_string(&self) -> String;
}

macro_rules! impl_filter_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FilterScalar for $ty {
                fn to_filter_string(&self) -> String {
                    self.to_string()
                }
            }

            impl IntoFilterValue for $ty {
                fn into_filter_values(self) -> Vec<String> {
                    vec![self.to_filter_string()]
                }
            }
        )*
    };
}

impl_filter_scalar!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64, bool, String);

impl FilterScalar for &str {
    fn to_filter_string(&self) -> String {
        (*self).to_string()
    }
}

impl IntoFilterValue for &str {
    fn into_filter_values(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl<T: FilterScalar> IntoFilterValue for Vec<T> {
    fn into_filter_values(self) -> Vec<String> {
        self.iter().map(FilterScalar::to_filter_string).collect()
    }
}

impl<T: FilterScalar> IntoFilterValue for &[T] {
    fn into_filter_values(self) -> Vec<String> {
        self.iter().map(FilterScalar::to_filter_string).collect()
    }
}

impl<T: FilterScalar, const N: usize> IntoFilterValue for [T; N] {
    fn into_filter_values(self) -> Vec<String> {
        self.iter().map(FilterScalar::to_filter_string).collect()
    }
}

/// Accumulated options for one request chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    includes: Vec<IncludeEntry>,
    select: Vec<String>,
    filters: Vec<(String, Vec<String>)>,
    sort: Option<String>,
    page: Option<u32>,
    per_page: Option<u32>,
}

impl QueryOptions {
    /// Adds an include path, merging fields into an existing entry with the same path.
    pub fn add_include<I, S>(&mut self, path: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path = path.into();
        let fields = fields.into_iter().map(Into::into);

        match self.includes.iter_mut().find(|entry| entry.path == path) {
            Some(existing) => push_unique(&mut existing.fields, fields),
            None => {
                let mut entry = IncludeEntry {
                    path,
                    fields: Vec::new(),
                };
                push_unique(&mut entry.fields, fields);
                self.includes.push(entry);
            }
        }
    }

    /// Flattens an include tree and adds every resulting entry.
    pub fn add_include_tree(&mut self, include: Include) {
        let mut entries = Vec::new();
        include.flatten_into(None, &mut entries);
        for entry in entries {
            self.add_include(entry.path, entry.fields);
        }
    }

    /// Adds fields to the selection, skipping ones already selected.
    pub fn add_select<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_unique(&mut self.select, fields.into_iter().map(Into::into));
    }

    /// Sets a filter, replacing any previous value for the same key.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl IntoFilterValue) {
        let key = key.into();
        let values = value.into_filter_values();

        match self.filters.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.filters.push((key, values)),
        }
    }

    /// Sets the sort specification.
    pub fn set_sort(&mut self, sort: impl Into<String>) {
        self.sort = Some(sort.into());
    }

    /// Sets the page number.
    pub fn set_page(&mut self, page: u32) {
        self.page = Some(page);
    }

    /// Sets the page size.
    pub fn set_per_page(&mut self, per_page: u32) {
        self.per_page = Some(per_page);
    }

    /// The include entries in first-insertion order.
    pub fn includes(&self) -> &[IncludeEntry] {
        &self.includes
    }

    /// The selected fields in first-insertion order.
    pub fn selected(&self) -> &[String] {
        &self.select
    }

    /// The explicitly set page, if any.
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// The explicitly set page size, if any.
    pub fn per_page(&self) -> Option<u32> {
        self.per_page
    }

    /// Encodes the options into query parameters.
    ///
    /// `include_separator` joins include entries; filters always join with `;`.
    pub fn encode(&self, include_separator: char) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();

        if !self.includes.is_empty() {
            let rendered: Vec<String> = self.includes.iter().map(IncludeEntry::render).collect();
            params.insert(
                "include".to_string(),
                rendered.join(&include_separator.to_string()),
            );
        }

        if !self.select.is_empty() {
            params.insert("select".to_string(), self.select.join(","));
        }

        if !self.filters.is_empty() {
            let rendered: Vec<String> = self
                .filters
                .iter()
                .map(|(key, values)| format!("{key}:{}", values.join(",")))
                .collect();
            params.insert("filters".to_string(), rendered.join(";"));
        }

        if let Some(sort) = &self.sort {
            params.insert("sort".to_string(), sort.clone());
        }

        if let Some(page) = self.page {
            params.insert("page".to_string(), page.to_string());
        }

        if let Some(per_page) = self.per_page {
            params.insert("per_page".to_string(), per_page.to_string());
        }

        params
    }
}

fn push_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
