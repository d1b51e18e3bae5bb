//! Clients for the external collaborator services.
//!
//! The editor talks to three server-side services through a plain
//! request/response contract: template storage (CRUD over the §3 JSON
//! shapes), image upload, and the render-as-image endpoint whose output the
//! local render function mirrors. All calls are async and run on background
//! tasks; the UI only ever sees their results through the operation channel
//! drained once per frame.

use crate::types::{CanvasConfig, CanvasElement, Template};
use crate::vars;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Failures surfaced by the storage, upload and render clients.
///
/// All of these are local and recoverable: the UI reports the message and
/// leaves its state unchanged so the user can retry.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure (connection, timeout, decode).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, when readable.
        message: String,
    },
}

/// One row of the template listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    /// Stored template id.
    pub id: String,
    /// User-visible name.
    pub name: String,
    /// Category the template belongs to, if any.
    #[serde(default)]
    pub category_id: Option<String>,
}

/// A full stored template as returned by `get`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    /// Stored template id.
    pub id: String,
    /// User-visible name.
    pub name: String,
    /// Canvas configuration.
    pub config: CanvasConfig,
    /// Elements in z-order.
    pub elements: Vec<CanvasElement>,
    /// Category the template belongs to, if any.
    #[serde(default)]
    pub category_id: Option<String>,
}

impl TemplateRecord {
    /// Converts the stored record into an editable template.
    pub fn into_template(self) -> Template {
        Template {
            name: self.name,
            config: self.config,
            elements: self.elements,
            category_id: self.category_id,
        }
    }
}

/// Response of a successful `save`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedTemplate {
    /// Id assigned by the service.
    pub id: String,
}

/// Response of a successful image upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadedImage {
    /// Opaque URL usable as an element `src` or the canvas background.
    pub url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateBody<'a> {
    name: &'a str,
    config: &'a CanvasConfig,
    elements: &'a [CanvasElement],
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<&'a str>,
}

impl<'a> TemplateBody<'a> {
    fn of(template: &'a Template) -> Self {
        Self {
            name: &template.name,
            config: &template.config,
            elements: &template.elements,
            category_id: template.category_id.as_deref(),
        }
    }
}

/// HTTP client for the template storage, upload and render services.
#[derive(Debug, Clone)]
pub struct StoreClient {
    base_url: String,
    http: reqwest::Client,
}

impl StoreClient {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// The service origin this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Stores a new template.
    ///
    /// # Returns
    ///
    /// The id assigned by the service.
    pub async fn save(&self, template: &Template) -> Result<SavedTemplate, StoreError> {
        let response = self
            .http
            .post(self.url("templates"))
            .json(&TemplateBody::of(template))
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Fetches a stored template by id.
    pub async fn get(&self, id: &str) -> Result<TemplateRecord, StoreError> {
        let response = self
            .http
            .get(self.url(&format!("templates/{}", urlencoding::encode(id))))
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Replaces a stored template.
    pub async fn update(&self, id: &str, template: &Template) -> Result<(), StoreError> {
        let response = self
            .http
            .put(self.url(&format!("templates/{}", urlencoding::encode(id))))
            .json(&TemplateBody::of(template))
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    /// Deletes a stored template.
    ///
    /// Callers remove the template from local lists only after this returns
    /// success.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.url(&format!("templates/{}", urlencoding::encode(id))))
            .send()
            .await?;
        Self::checked(response).await?;
        Ok(())
    }

    /// Lists stored templates.
    pub async fn list(&self) -> Result<Vec<TemplateSummary>, StoreError> {
        let response = self.http.get(self.url("templates")).send().await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Uploads raw image bytes.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The file content
    /// * `filename` - Original filename, passed along for the service to key
    ///   the stored object
    ///
    /// # Returns
    ///
    /// The opaque URL of the uploaded image.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<UploadedImage, StoreError> {
        let response = self
            .http
            .post(self.url(&format!(
                "images?filename={}",
                urlencoding::encode(filename)
            )))
            .body(bytes)
            .send()
            .await?;
        Ok(Self::checked(response).await?.json().await?)
    }

    /// Fetches raw image bytes from an arbitrary URL (background and element
    /// images for the texture cache and the exporter).
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let response = self.http.get(url).send().await?;
        Ok(Self::checked(response).await?.bytes().await?.to_vec())
    }

    /// The render-as-image URL for a stored template with substitutions.
    ///
    /// Fetching it server-side reproduces what [`crate::render`] produces
    /// locally; this is also the URL the embed contract hands out.
    pub fn render_url(
        &self,
        template_id: &str,
        substitutions: &HashMap<String, String>,
    ) -> String {
        vars::embed_url(&self.base_url, template_id, substitutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn base_url_is_normalized() {
        let client = StoreClient::new("https://api.example.com///");
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(
            client.url("/templates"),
            "https://api.example.com/templates"
        );
    }

    #[test]
    fn template_body_serializes_to_contract_shape() {
        let mut template = Template::new();
        template.name = "Promo".to_string();
        template.category_id = Some("cat-7".to_string());

        let json = serde_json::to_value(TemplateBody::of(&template)).unwrap();

        assert_eq!(json["name"], "Promo");
        assert_eq!(json["categoryId"], "cat-7");
        assert!(json["config"]["width"].is_number());
        assert!(json["elements"].is_array());
    }

    #[test]
    fn template_body_omits_absent_category() {
        let template = Template::new();
        let json = serde_json::to_value(TemplateBody::of(&template)).unwrap();
        assert!(json.get("categoryId").is_none());
    }

    #[test]
    fn template_record_parses_contract_json() {
        let json = r#"{
            "id": "tpl-9",
            "name": "Launch",
            "config": {"width": 640, "height": 480, "backgroundImage": ""},
            "elements": [],
            "categoryId": null
        }"#;

        let record: TemplateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "tpl-9");
        assert_eq!(record.config.width, 640.0);

        let template = record.into_template();
        assert_eq!(template.name, "Launch");
        assert!(template.elements.is_empty());
    }

    #[test]
    fn summary_tolerates_missing_category() {
        let json = r#"[{"id": "a", "name": "One"}]"#;
        let list: Vec<TemplateSummary> = serde_json::from_str(json).unwrap();
        assert_eq!(list[0].category_id, None);
    }

    #[test]
    fn render_url_encodes_template_and_substitutions() {
        let client = StoreClient::new("https://api.example.com");
        let mut subs = HashMap::new();
        subs.insert("title".to_string(), "Hi there".to_string());

        assert_eq!(
            client.render_url("tpl 1", &subs),
            "https://api.example.com/templates/tpl%201/render?title=Hi%20there"
        );
    }
}
