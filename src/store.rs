//! Record store seam.
//!
//! [`FirebaseStore`] talks to a Firebase Realtime Database over its REST API;
//! [`MemoryStore`] keeps records in process and backs the tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::recipe::RawRecord;
use crate::settings::StoreSettings;

/// Key-value access to recipe records. Absence is `None`, never an error.
pub trait RecipeStore {
    /// Every record under the recipe path, in key order.
    fn fetch_all(&self) -> Result<Vec<(String, RawRecord)>>;
    fn fetch(&self, id: &str) -> Result<Option<RawRecord>>;
    /// Store a new record and return its generated identifier.
    fn create(&self, record: &Value) -> Result<String>;
    /// Overwrite only the fields present in `fields`.
    fn update(&self, id: &str, fields: &Value) -> Result<()>;
    fn delete(&self, id: &str) -> Result<()>;
}

/// Characters the Realtime Database does not allow in a key.
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Reject ids that would address anything other than a single record.
///
/// An empty id names the whole collection and `/` reaches nested paths.
pub fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty()
        || id.contains(FORBIDDEN_KEY_CHARS)
        || id.chars().any(char::is_control)
    {
        return Err(Error::Malformed(format!("invalid recipe id '{id}'")));
    }
    Ok(())
}

/// Firebase Realtime Database over REST.
pub struct FirebaseStore {
    client: Client,
    base_url: String,
    path: String,
    auth: Option<String>,
}

#[derive(Deserialize)]
struct PushResponse {
    name: String,
}

impl FirebaseStore {
    pub fn new(settings: &StoreSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            path: settings.path.trim_matches('/').to_string(),
            auth: settings.auth.clone(),
        })
    }

    fn collection_url(&self) -> Result<Url> {
        self.endpoint(None)
    }

    fn record_url(&self, id: &str) -> Result<Url> {
        validate_id(id)?;
        self.endpoint(Some(id))
    }

    /// `<base>/<path>[/<id>].json` with every segment percent-encoded.
    fn endpoint(&self, id: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Store(format!("invalid store url '{}': {e}", self.base_url)))?;
        let mut segments: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();
        segments.extend(id);
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| Error::Store(format!("store url '{}' cannot take a path", self.base_url)))?;
            parts.pop_if_empty();
            if let Some((leaf, parents)) = segments.split_last() {
                parts.extend(parents);
                parts.push(&format!("{leaf}.json"));
            }
        }
        Ok(url)
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = self.with_auth(request).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Store(format!("{status}: {}", body.trim())));
        }
        let body = response.text()?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl RecipeStore for FirebaseStore {
    fn fetch_all(&self) -> Result<Vec<(String, RawRecord)>> {
        let url = self.collection_url()?;
        debug!("GET {url}");
        match self.send(self.client.get(url))? {
            Value::Null => Ok(Vec::new()),
            Value::Object(entries) => Ok(entries
                .into_iter()
                .filter_map(|(id, value)| match RawRecord::from_value(value) {
                    Ok(record) => Some((id, record)),
                    Err(e) => {
                        warn!("Skipping record '{id}': {e}");
                        None
                    }
                })
                .collect()),
            other => Err(Error::Malformed(format!(
                "expected an object under '{}', got {other}",
                self.path
            ))),
        }
    }

    fn fetch(&self, id: &str) -> Result<Option<RawRecord>> {
        let url = self.record_url(id)?;
        debug!("GET {url}");
        match self.send(self.client.get(url))? {
            Value::Null => Ok(None),
            value => RawRecord::from_value(value).map(Some),
        }
    }

    fn create(&self, record: &Value) -> Result<String> {
        let url = self.collection_url()?;
        debug!("POST {url}");
        let value = self.send(self.client.post(url).json(record))?;
        let pushed: PushResponse = serde_json::from_value(value)?;
        Ok(pushed.name)
    }

    fn update(&self, id: &str, fields: &Value) -> Result<()> {
        let url = self.record_url(id)?;
        debug!("PATCH {url}");
        self.send(self.client.patch(url).json(fields))?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let url = self.record_url(id)?;
        debug!("DELETE {url}");
        self.send(self.client.delete(url))?;
        Ok(())
    }
}

/// In-process store with push-style generated keys.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, Value>>,
    next_id: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under a caller-chosen key.
    pub fn insert(&self, id: &str, record: Value) {
        self.lock().insert(id.to_string(), record);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        // A poisoned map is still a valid map.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecipeStore for MemoryStore {
    fn fetch_all(&self) -> Result<Vec<(String, RawRecord)>> {
        let records = self.lock();
        let mut out = Vec::with_capacity(records.len());
        for (id, value) in records.iter() {
            match RawRecord::from_value(value.clone()) {
                Ok(record) => out.push((id.clone(), record)),
                Err(e) => warn!("Skipping record '{id}': {e}"),
            }
        }
        Ok(out)
    }

    fn fetch(&self, id: &str) -> Result<Option<RawRecord>> {
        validate_id(id)?;
        match self.lock().get(id) {
            Some(value) => RawRecord::from_value(value.clone()).map(Some),
            None => Ok(None),
        }
    }

    fn create(&self, record: &Value) -> Result<String> {
        let id = {
            let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
            *next += 1;
            format!("-M{:08}", *next)
        };
        self.lock().insert(id.clone(), record.clone());
        Ok(id)
    }

    fn update(&self, id: &str, fields: &Value) -> Result<()> {
        validate_id(id)?;
        let Value::Object(patch) = fields else {
            return Err(Error::Malformed("update expects an object".into()));
        };
        let mut records = self.lock();
        let entry = records
            .entry(id.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(existing) = entry {
            for (key, value) in patch {
                existing.insert(key.clone(), value.clone());
            }
        } else {
            *entry = fields.clone();
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        validate_id(id)?;
        self.lock().remove(id);
        Ok(())
    }
}
