//! Table clients preconfigured for the project

use reqwest::Client;

use outfit_postgrest::{PostgrestClient, PostgrestError};

/// Builds [`PostgrestClient`]s sharing one endpoint, key, schema and HTTP pool
#[derive(Debug, Clone)]
pub struct TableFactory {
    base_url: String,
    api_key: String,
    schema: String,
    http_client: Client,
}

impl TableFactory {
    pub fn new(base_url: &str, api_key: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            schema: "public".to_string(),
            http_client,
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Client for `table`, authorized as the holder of `access_token` when given
    pub fn table(
        &self,
        table: &str,
        access_token: Option<&str>,
    ) -> Result<PostgrestClient, PostgrestError> {
        let client = PostgrestClient::new(
            &self.base_url,
            &self.api_key,
            table,
            self.http_client.clone(),
        );
        let client = match access_token {
            Some(token) => client.with_auth(token)?,
            None => client,
        };
        if self.schema == "public" {
            return Ok(client);
        }
        client
            .with_header("Accept-Profile", &self.schema)?
            .with_header("Content-Profile", &self.schema)
    }
}
