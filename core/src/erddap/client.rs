use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::erddap::table::Table;
use crate::prelude::{PipelineError, PipelineResult, TabularSource};
use crate::telemetry::log::LogManager;

/// Connection settings for an ERDDAP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: "http://slocum-data.marine.rutgers.edu/erddap".into(),
            timeout_secs: 120,
        }
    }
}

/// A tabledap request: which dataset, which variables, which row filters.
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    pub dataset_id: String,
    pub variables: Vec<String>,
    pub constraints: Vec<String>,
}

impl TableQuery {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables.extend(variables.into_iter().map(Into::into));
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    /// Restrict rows to `[start, end]` on the given time variable.
    pub fn with_time_bounds(
        mut self,
        time_variable: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        if let Some(start) = start {
            self = self.with_constraint(format!(
                "{}>={}",
                time_variable,
                start.format("%Y-%m-%dT%H:%M:%SZ")
            ));
        }
        if let Some(end) = end {
            self = self.with_constraint(format!(
                "{}<={}",
                time_variable,
                end.format("%Y-%m-%dT%H:%M:%SZ")
            ));
        }
        self
    }

    /// The part of the URL after `?`; empty when all variables and rows are wanted.
    pub fn query_string(&self) -> String {
        let mut query = self.variables.join(",");
        for constraint in &self.constraints {
            query.push('&');
            query.push_str(constraint);
        }
        query
    }
}

/// Blocking tabledap client that always asks for the `.csv` response.
pub struct ErddapClient {
    config: ServiceConfig,
    http: Client,
    logger: LogManager,
}

impl ErddapClient {
    pub fn new(config: ServiceConfig) -> PipelineResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            http,
            logger: LogManager::new("erddap"),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn dataset_url(&self, query: &TableQuery) -> PipelineResult<Url> {
        let mut url = format!(
            "{}/tabledap/{}.csv",
            self.config.server.trim_end_matches('/'),
            query.dataset_id
        );
        let query_string = query.query_string();
        if !query_string.is_empty() {
            url.push('?');
            url.push_str(&query_string);
        }
        Url::parse(&url).map_err(|e| PipelineError::Url(format!("{url}: {e}")))
    }
}

impl TabularSource for ErddapClient {
    fn fetch(&self, query: &TableQuery) -> PipelineResult<Table> {
        let url = self.dataset_url(query)?;
        self.logger.record(&format!("GET {}", url));

        let response = self.http.get(url).send()?.error_for_status()?;
        let table = Table::from_erddap_csv(response)?;
        self.logger.detail(&format!(
            "{} -> {} rows x {} columns",
            query.dataset_id,
            table.num_rows(),
            table.names().len()
        ));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client() -> ErddapClient {
        ErddapClient::new(ServiceConfig {
            server: "http://example.org/erddap/".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn bare_query_requests_whole_dataset() {
        let url = client()
            .dataset_url(&TableQuery::new("ru32-20190102T1317-profile-sci-rt"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://example.org/erddap/tabledap/ru32-20190102T1317-profile-sci-rt.csv"
        );
    }

    #[test]
    fn variables_and_time_bounds_become_query() {
        let start = Utc.with_ymd_and_hms(2019, 1, 2, 0, 0, 0).unwrap();
        let query = TableQuery::new("ru32-profile-sci-rt")
            .with_variables(["time", "depth"])
            .with_time_bounds("time", Some(start), None);
        assert_eq!(query.query_string(), "time,depth&time>=2019-01-02T00:00:00Z");

        let url = client().dataset_url(&query).unwrap();
        assert_eq!(url.path(), "/erddap/tabledap/ru32-profile-sci-rt.csv");
        assert!(url.query().unwrap().starts_with("time,depth&time"));
        assert!(url.query().unwrap().ends_with("2019-01-02T00:00:00Z"));
    }
}
