use std::fs;
use std::path::Path;

use mtx_model::ValidationOutcome;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ValidatorConfig;
use crate::error::ValidatorError;
use crate::xsd::SchemaBackend;

const XML_MIME: &str = "application/xml";

/// Delegates validation to an HTTP service.
///
/// The request is a multipart form with `engine` and `mx_type` text fields,
/// the document as `xml` and, when a schema was resolved, the schema as `xsd`.
/// The service answers `{"ok": bool, "errors": [..]}`. Transport and protocol
/// failures never block a document.
#[derive(Debug)]
pub struct RemoteBackend {
    client: Client,
    endpoint: String,
    engine: String,
    mx_type: String,
    schema: Option<(String, Vec<u8>)>,
}

impl RemoteBackend {
    pub fn new(config: &ValidatorConfig, mx_type: &str) -> Result<Self, ValidatorError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or(ValidatorError::MissingEndpoint)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|source| ValidatorError::HttpClient { source })?;
        Ok(Self {
            client,
            endpoint,
            engine: config.engine.clone(),
            mx_type: mx_type.to_string(),
            schema: None,
        })
    }

    fn form(&self, xml: &str) -> Result<Form, reqwest::Error> {
        let mut form = Form::new()
            .text("engine", self.engine.clone())
            .text("mx_type", self.mx_type.clone())
            .part(
                "xml",
                Part::bytes(xml.as_bytes().to_vec())
                    .file_name("payload.xml")
                    .mime_str(XML_MIME)?,
            );
        if let Some((name, bytes)) = &self.schema {
            form = form.part(
                "xsd",
                Part::bytes(bytes.clone())
                    .file_name(name.clone())
                    .mime_str(XML_MIME)?,
            );
        }
        Ok(form)
    }
}

impl SchemaBackend for RemoteBackend {
    fn identifier(&self) -> String {
        format!("remote:{}", self.engine)
    }

    fn load(&mut self, schema_path: Option<&Path>, mx_type: &str) {
        self.mx_type = mx_type.to_string();
        self.schema = schema_path.and_then(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            match fs::read(path) {
                Ok(bytes) => Some((name, bytes)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "schema not attached to remote request");
                    None
                }
            }
        });
    }

    fn validate(&self, xml: &str) -> ValidationOutcome {
        let response = self
            .form(xml)
            .and_then(|form| self.client.post(self.endpoint.as_str()).multipart(form).send());
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "remote validator unreachable");
                return ValidationOutcome::skipped(format!("Remote XSD validation failed: {err}"));
            }
        };

        let status = response.status();
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => {
                return ValidationOutcome::skipped(format!("Remote XSD validation failed: {err}"));
            }
        };
        debug!(endpoint = %self.endpoint, status = status.as_u16(), "remote validator responded");
        if !status.is_success() {
            return ValidationOutcome::skipped(format!(
                "Remote XSD validation HTTP {}: {body}",
                status.as_u16()
            ));
        }
        parse_remote_payload(&body)
    }
}

/// Interpret a response body from the remote validator.
pub fn parse_remote_payload(body: &str) -> ValidationOutcome {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        return ValidationOutcome::skipped(format!(
            "Remote XSD validation returned non-JSON payload: {body}"
        ));
    };
    let Value::Object(payload) = payload else {
        return ValidationOutcome::skipped(format!(
            "Remote XSD validation returned an unexpected payload: {body}"
        ));
    };
    let ok = payload.get("ok").and_then(Value::as_bool).unwrap_or(false);
    let errors = match payload.get("errors") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(display_value).collect(),
        Some(other) => vec![display_value(other)],
    };
    ValidationOutcome { ok, errors }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
