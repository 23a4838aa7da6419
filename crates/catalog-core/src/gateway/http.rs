use super::{Payload, RemoteCollection};
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::values::{FieldValue, RecordId};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

/// Route layout of one collection, relative to the API base URL.
///
/// `update` and `delete` are prefixes; the record id is appended as the
/// final path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub list: String,
    pub create: String,
    pub update: String,
    pub delete: String,
    /// Uniqueness probe, answered with `{ "exists": bool }`.
    pub check_key: Option<String>,
    /// Query parameter carrying the candidate key.
    pub key_param: String,
}

impl Endpoints {
    /// Plain REST layout: every route is `/{collection}`.
    pub fn rest(collection: &str) -> Self {
        let root = format!("/{}", collection.trim_matches('/'));
        Self {
            list: root.clone(),
            create: root.clone(),
            update: root.clone(),
            delete: root,
            check_key: None,
            key_param: "key".to_owned(),
        }
    }

    pub fn with_check_key(mut self, path: impl Into<String>, param: impl Into<String>) -> Self {
        self.check_key = Some(path.into());
        self.key_param = param.into();
        self
    }

    pub fn products() -> Self {
        Self::rest("products").with_check_key("/products/check-sku", "sku")
    }

    pub fn customers() -> Self {
        Self {
            list: "/customers/all".to_owned(),
            delete: "/customers/delete".to_owned(),
            ..Self::rest("customers")
        }
    }

    pub fn orders() -> Self {
        Self::rest("orders")
    }

    /// Routes for a built-in record kind.
    pub fn builtin(kind: &str) -> Option<Self> {
        match kind {
            "products" | "product" => Some(Self::products()),
            "customers" | "customer" => Some(Self::customers()),
            "orders" | "order" => Some(Self::orders()),
            _ => None,
        }
    }
}

/// [`RemoteCollection`] over the catalog's JSON-over-HTTP API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    endpoints: Endpoints,
    schema: RecordSchema,
}

impl HttpGateway {
    pub fn new(base_url: &str, endpoints: Endpoints, schema: RecordSchema) -> CoreResult<Self> {
        Self::with_client(Client::new(), base_url, endpoints, schema)
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        endpoints: Endpoints,
        schema: RecordSchema,
    ) -> CoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url, endpoints, schema)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        endpoints: Endpoints,
        schema: RecordSchema,
    ) -> CoreResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CoreError::Config(format!("invalid base url `{base_url}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::Config(format!("base url `{base_url}` cannot carry paths")));
        }
        Ok(Self {
            client,
            base_url,
            endpoints,
            schema,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn url(&self, route: &str) -> CoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| CoreError::Config(format!("base url `{}` cannot carry paths", self.base_url)))?;
            segments.pop_if_empty();
            segments.extend(route.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn record_url(&self, route: &str, id: &RecordId) -> CoreResult<Url> {
        let mut url = self.url(route)?;
        url.path_segments_mut()
            .map_err(|()| CoreError::Config(format!("route `{route}` cannot carry an id")))?
            .push(id.as_str());
        Ok(url)
    }

    fn body(&self, request: RequestBuilder, payload: &Payload) -> CoreResult<RequestBuilder> {
        if !payload.is_multipart() {
            let json: serde_json::Map<String, Value> = payload
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect();
            return Ok(request.json(&json));
        }

        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &payload.fields {
            form = form.text(name.clone(), form_text(value));
        }
        for attachment in &payload.attachments {
            let mut part = reqwest::multipart::Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone());
            if let Some(mime) = &attachment.mime {
                part = part.mime_str(mime)?;
            }
            form = form.part(attachment.field.clone(), part);
        }
        Ok(request.multipart(form))
    }

    async fn send(&self, method: Method, url: Url, request: RequestBuilder) -> CoreResult<Response> {
        tracing::debug!(kind = self.schema.kind(), %method, %url, "sending request");
        let response = request.send().await.map_err(|e| {
            tracing::warn!(kind = self.schema.kind(), %method, %url, error = %e, "request failed");
            CoreError::from(e)
        })?;
        check_status(method, url, response).await
    }

    async fn json_body(&self, response: Response) -> CoreResult<Value> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn decode_record(&self, body: Value) -> CoreResult<Option<Record>> {
        match unwrap_envelope(body)? {
            Some(value) => Record::from_json(value, &self.schema).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RemoteCollection for HttpGateway {
    fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    async fn list(&self) -> CoreResult<Vec<Record>> {
        let url = self.url(&self.endpoints.list)?;
        let request = self.client.get(url.clone());
        let response = self.send(Method::GET, url, request).await?;
        let items = match self.json_body(response).await? {
            Value::Array(items) => items,
            Value::Object(mut envelope) => match envelope.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(CoreError::Schema(format!(
                        "{}: list response is an object without a `data` array",
                        self.schema.kind()
                    )))
                }
            },
            other => {
                return Err(CoreError::Schema(format!(
                    "{}: list response is not a sequence: {other}",
                    self.schema.kind()
                )))
            }
        };
        let records = items
            .into_iter()
            .map(|item| Record::from_json(item, &self.schema))
            .collect::<CoreResult<Vec<_>>>()?;
        tracing::debug!(kind = self.schema.kind(), count = records.len(), "listed records");
        Ok(records)
    }

    async fn create(&self, payload: &Payload) -> CoreResult<Record> {
        let url = self.url(&self.endpoints.create)?;
        let request = self.body(self.client.post(url.clone()), payload)?;
        let response = self.send(Method::POST, url, request).await?;
        let body = self.json_body(response).await?;
        self.decode_record(body)?.ok_or_else(|| {
            CoreError::Schema(format!("{}: create response carried no record", self.schema.kind()))
        })
    }

    async fn update(&self, id: &RecordId, payload: &Payload) -> CoreResult<Record> {
        let url = self.record_url(&self.endpoints.update, id)?;
        let request = self.body(self.client.put(url.clone()), payload)?;
        let response = self.send(Method::PUT, url, request).await?;
        let body = self.json_body(response).await?;
        match self.decode_record(body)? {
            Some(record) => Ok(record),
            // `{ success: true }` without a record: what we sent is canonical.
            None => {
                let mut fields = payload.fields.clone();
                self.schema.normalize(&mut fields);
                Ok(Record::new(id.clone(), fields))
            }
        }
    }

    async fn remove(&self, id: &RecordId) -> CoreResult<()> {
        let url = self.record_url(&self.endpoints.delete, id)?;
        let request = self.client.delete(url.clone());
        let response = self.send(Method::DELETE, url, request).await?;
        // Bare 2xx is fine; an envelope may still say no.
        let body = match self.json_body(response).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(
                    kind = self.schema.kind(),
                    %id,
                    error = %err,
                    "unreadable delete response, treating the 2xx as success"
                );
                Value::Null
            }
        };
        unwrap_envelope(body).map(|_| ())
    }

    async fn exists(&self, key: &str) -> CoreResult<bool> {
        let route = self.endpoints.check_key.as_deref().ok_or_else(|| {
            CoreError::Config(format!("{}: no uniqueness check endpoint", self.schema.kind()))
        })?;
        let url = self.url(route)?;
        let request = self
            .client
            .get(url.clone())
            .query(&[(self.endpoints.key_param.as_str(), key)]);
        let response = self.send(Method::GET, url, request).await?;
        match self.json_body(response).await? {
            Value::Object(body) => body.get("exists").and_then(Value::as_bool).ok_or_else(|| {
                CoreError::Schema("check-key response lacks a boolean `exists`".into())
            }),
            other => Err(CoreError::Schema(format!(
                "check-key response is not an object: {other}"
            ))),
        }
    }
}

async fn check_status(method: Method, url: Url, response: Response) -> CoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    let detail = envelope_message(&detail).unwrap_or(detail);
    tracing::warn!(%method, %url, %status, "backend returned an error status");
    Err(match status {
        StatusCode::NOT_FOUND => CoreError::NotFound(format!("{url}: {detail}")),
        StatusCode::CONFLICT => CoreError::Conflict(detail),
        _ => CoreError::Network(format!("{method} {url} returned {status}: {detail}")),
    })
}

fn envelope_message(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    value.get("message")?.as_str().map(str::to_owned)
}

/// Strip the `{ success, message?, data? }` envelope some routes use.
///
/// Returns the record object if one is present, `None` for a successful
/// envelope (or empty body) without one.
fn unwrap_envelope(body: Value) -> CoreResult<Option<Value>> {
    let mut object = match body {
        Value::Object(object) => object,
        Value::Null => return Ok(None),
        other => {
            return Err(CoreError::Schema(format!(
                "expected an object response, got {other}"
            )))
        }
    };
    let Some(success) = object.get("success").and_then(Value::as_bool) else {
        return Ok(Some(Value::Object(object)));
    };
    if !success {
        let message = object
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request was not accepted")
            .to_owned();
        return Err(CoreError::Rejected(message));
    }
    match object.remove("data") {
        Some(data @ Value::Object(_)) => Ok(Some(data)),
        _ => Ok(None),
    }
}

/// Text form of a field inside a multipart body.
fn form_text(value: &FieldValue) -> String {
    match value.search_text() {
        Some(text) => text.into_owned(),
        None if value.is_null() => String::new(),
        None => Value::from(value.clone()).to_string(),
    }
}
