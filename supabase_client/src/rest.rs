//! Table service calls: filtered selects with embedded resources, writes and
//! remote procedure calls.

use std::fmt::Display;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Bearer, SupabaseClient,
    error::{ClientError, ResponseExt},
};

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

/// Query string for the table service. Filters are appended in call order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns to return. Embedded resources use `table(columns)`; whitespace
    /// is stripped so multi-line selections can be written inline.
    pub fn select(columns: &str) -> Self {
        Self::new().param("select", columns.split_whitespace().collect::<String>())
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.param(column, format!("eq.{}", quote(&value.to_string())))
    }

    pub fn in_<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        let list = values
            .into_iter()
            .map(|v| quote(&v.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.param(column, format!("in.({list})"))
    }

    pub fn order(self, column: &str, descending: bool) -> Self {
        let direction = if descending { "desc" } else { "asc" };
        self.param("order", format!("{column}.{direction}"))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.params
    }

    fn param(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_string(), value));
        self
    }
}

/// Values holding reserved characters must be double quoted inside filters.
fn quote(value: &str) -> String {
    const RESERVED: [char; 7] = [',', '.', ':', '(', ')', '"', ' '];
    if value.contains(RESERVED) || value.contains('\\') {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

impl SupabaseClient {
    fn table_url(&self, table: &str) -> String {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    #[tracing::instrument(skip(self, bearer), err)]
    pub async fn select<T>(
        &self,
        table: &str,
        query: &Query,
        bearer: Bearer<'_>,
    ) -> Result<Vec<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let request = self.client.get(self.table_url(table)).query(query.pairs());
        let response = self
            .authorize(request, bearer)
            .send()
            .await
            .map_client_error()
            .await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| ClientError::Decode {
                operation: "select",
                message: e.to_string(),
            })
    }

    /// Insert one row and return the stored representation
    #[tracing::instrument(skip(self, body, bearer), err)]
    pub async fn insert<B, T>(
        &self,
        table: &str,
        body: &B,
        bearer: Bearer<'_>,
    ) -> Result<Vec<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .post(self.table_url(table))
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body);
        let response = self
            .authorize(request, bearer)
            .send()
            .await
            .map_client_error()
            .await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| ClientError::Decode {
                operation: "insert",
                message: e.to_string(),
            })
    }

    /// Insert without reading the row back, for tables the caller may write but
    /// not select under row level security
    #[tracing::instrument(skip(self, body, bearer), err)]
    pub async fn insert_minimal<B>(
        &self,
        table: &str,
        body: &B,
        bearer: Bearer<'_>,
    ) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .client
            .post(self.table_url(table))
            .header(PREFER, RETURN_MINIMAL)
            .json(body);
        self.authorize(request, bearer)
            .send()
            .await
            .map_client_error()
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, body, bearer), err)]
    pub async fn update<B, T>(
        &self,
        table: &str,
        filter: &Query,
        body: &B,
        bearer: Bearer<'_>,
    ) -> Result<Vec<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(filter.pairs())
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body);
        let response = self
            .authorize(request, bearer)
            .send()
            .await
            .map_client_error()
            .await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| ClientError::Decode {
                operation: "update",
                message: e.to_string(),
            })
    }

    #[tracing::instrument(skip(self, bearer), err)]
    pub async fn delete(
        &self,
        table: &str,
        filter: &Query,
        bearer: Bearer<'_>,
    ) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(filter.pairs())
            .header(PREFER, RETURN_MINIMAL);
        self.authorize(request, bearer)
            .send()
            .await
            .map_client_error()
            .await?;
        Ok(())
    }

    /// Call a stored procedure. Procedures returning `void` answer with an
    /// empty body, which is reported as [serde_json::Value::Null].
    #[tracing::instrument(skip(self, params, bearer), err)]
    pub async fn rpc<P>(
        &self,
        function: &str,
        params: &P,
        bearer: Bearer<'_>,
    ) -> Result<serde_json::Value, ClientError>
    where
        P: Serialize + ?Sized,
    {
        let request = self
            .client
            .post(self.endpoint(&format!("rest/v1/rpc/{function}")))
            .json(params);
        let response = self
            .authorize(request, bearer)
            .send()
            .await
            .map_client_error()
            .await?;

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
            operation: "rpc",
            message: e.to_string(),
        })
    }
}
