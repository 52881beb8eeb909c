//! Resource wrappers.
//!
//! A [`Resource`] is a base path plus a shared executor. Its factory methods
//! validate their arguments and hand out [`QueryBuilder`]s for the matching
//! endpoint:
//!
//! | Method                    | Path                                |
//! |---------------------------|-------------------------------------|
//! | [`all`](Resource::all)         | `/{base}`                      |
//! | [`by_id`](Resource::by_id)     | `/{base}/{id}`                 |
//! | [`search`](Resource::search)   | `/{base}/search/{term}`        |
//! | [`by_date`](Resource::by_date) | `/{base}/date/{date}`          |
//! | [`between`](Resource::between) | `/{base}/between/{start}/{end}`|
//! | [`at`](Resource::at)           | `/{base}/{segments...}`        |

use crate::{executor::RequestExecutor, query::QueryBuilder, Error, Result};
use chrono::NaiveDate;
use std::sync::Arc;

/// Minimum number of non-blank characters in a search term.
pub const MIN_SEARCH_LENGTH: usize = 3;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One API entity collection, e.g. `leagues` or `fixtures`.
#[derive(Debug, Clone)]
pub struct Resource {
    executor: Arc<RequestExecutor>,
    base_segments: Vec<String>,
    include_separator: char,
}

impl Resource {
    /// Creates a resource rooted at `base_path` (e.g. `"fixtures"` or `"livescores/inplay"`).
    pub fn new(executor: Arc<RequestExecutor>, base_path: &str, include_separator: char) -> Self {
        Self {
            executor,
            base_segments: base_path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            include_separator,
        }
    }

    /// The base path, e.g. `/fixtures`.
    pub fn base_path(&self) -> String {
        format!("/{}", self.base_segments.join("/"))
    }

    /// Queries the whole collection.
    pub fn all(&self) -> QueryBuilder {
        self.builder(Vec::new())
    }

    /// Queries one entity by ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for ID `0`, which the API never assigns.
    pub fn by_id(&self, id: u64) -> Result<QueryBuilder> {
        if id == 0 {
            return Err(Error::Validation(format!(
                "invalid ID 0 for {}",
                self.base_path()
            )));
        }
        Ok(self.builder(vec![id.to_string()]))
    }

    /// Searches the collection by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the trimmed term is shorter than
    /// [`MIN_SEARCH_LENGTH`] characters.
    pub fn search(&self, term: &str) -> Result<QueryBuilder> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_LENGTH {
            return Err(Error::Validation(format!(
                "search term {term:?} is too short; at least {MIN_SEARCH_LENGTH} characters are required"
            )));
        }
        Ok(self.builder(vec!["search".to_string(), term.to_string()]))
    }

    /// Queries entities on a date (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the date is malformed.
    pub fn by_date(&self, date: &str) -> Result<QueryBuilder> {
        let date = parse_date(date)?;
        Ok(self.builder(vec!["date".to_string(), date.format(DATE_FORMAT).to_string()]))
    }

    /// Queries entities between two dates (`YYYY-MM-DD`), inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either date is malformed or `start` is
    /// after `end`.
    pub fn between(&self, start: &str, end: &str) -> Result<QueryBuilder> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if start > end {
            return Err(Error::Validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(self.builder(vec![
            "between".to_string(),
            start.format(DATE_FORMAT).to_string(),
            end.format(DATE_FORMAT).to_string(),
        ]))
    }

    /// Queries an arbitrary sub-path, e.g. `at(["seasons", "21646"])` on `standings`.
    pub fn at<I, S>(&self, segments: I) -> QueryBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builder(segments.into_iter().map(Into::into).collect())
    }

    fn builder(&self, suffix: Vec<String>) -> QueryBuilder {
        let mut segments = self.base_segments.clone();
        segments.extend(suffix);
        QueryBuilder::new(self.executor.clone(), segments, self.include_separator)
    }
}

fn parse_date(date: &str) -> Result<NaiveDate> {
    let trimmed = date.trim();
    // chrono accepts single-digit months and days; the API does not.
    if trimmed.len() != 10 {
        return Err(invalid_date(date));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid_date(date))
}

fn invalid_date(date: &str) -> Error {
    Error::Validation(format!("invalid date {date:?}; expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::test_support::{RecordingSleeper, ScriptedTransport};

    fn resource(base: &str) -> (Arc<ScriptedTransport>, Resource) {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let executor = RequestExecutor::new(
            transport.clone(),
            Arc::new(RecordingSleeper::default()),
            RetryPolicy::none(),
            "token",
        );
        (transport, Resource::new(Arc::new(executor), base, ';'))
    }

    #[test]
    fn test_paths() {
        let (_, fixtures) = resource("fixtures");

        assert_eq!(fixtures.all().path(), "/fixtures");
        assert_eq!(fixtures.by_id(18535517).unwrap().path(), "/fixtures/18535517");
        assert_eq!(
            fixtures.by_date("2024-05-19").unwrap().path(),
            "/fixtures/date/2024-05-19"
        );
        assert_eq!(
            fixtures.between("2024-05-01", "2024-05-19").unwrap().path(),
            "/fixtures/between/2024-05-01/2024-05-19"
        );
        assert_eq!(fixtures.at(["head-to-head", "1", "2"]).path(), "/fixtures/head-to-head/1/2");
    }

    #[test]
    fn test_nested_base_path() {
        let (_, inplay) = resource("/livescores/inplay/");
        assert_eq!(inplay.base_path(), "/livescores/inplay");
        assert_eq!(inplay.all().path(), "/livescores/inplay");
    }

    #[test]
    fn test_search_term_is_trimmed() {
        let (_, teams) = resource("teams");
        assert_eq!(teams.search("  Celtic ").unwrap().path(), "/teams/search/Celtic");
    }

    #[test]
    fn test_validation_happens_before_any_request() {
        let (transport, fixtures) = resource("fixtures");

        assert!(matches!(fixtures.search("ab"), Err(Error::Validation(_))));
        assert!(matches!(fixtures.search("   "), Err(Error::Validation(_))));
        assert!(matches!(fixtures.by_date("2024-13-01"), Err(Error::Validation(_))));
        assert!(matches!(fixtures.by_date("2024-5-1"), Err(Error::Validation(_))));
        assert!(matches!(fixtures.by_date("yesterday"), Err(Error::Validation(_))));
        assert!(matches!(
            fixtures.between("2024-05-19", "2024-05-01"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(fixtures.by_id(0), Err(Error::Validation(_))));

        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_builders_are_independent() {
        let (_, leagues) = resource("leagues");
        let mut first = leagues.all();
        first.include(["country"]);
        let second = leagues.all();

        assert_eq!(first.params()["include"], "country");
        assert!(second.params().is_empty());
    }
}
