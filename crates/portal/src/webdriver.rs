//! Minimal W3C WebDriver client.
//!
//! Covers the handful of commands the portal flow needs (session lifecycle,
//! navigation, element lookup, click, clear, type) over the WebDriver HTTP
//! protocol using [`reqwest`]. Every response is wrapped in a `{"value": ...}`
//! envelope; errors carry `{"value": {"error": ..., "message": ...}}`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

/// Key under which WebDriver returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// HTTP client for a single WebDriver server.
pub struct WebDriverClient {
    client: reqwest::Client,
    base_url: String,
}

/// An open browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
}

/// Reference to an element inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: String,
}

/// Browser launch options for [`WebDriverClient::new_session`].
#[derive(Debug, Clone)]
pub struct BrowserOptions<'a> {
    pub headless: bool,
    /// Persistent profile directory; cookies survive across sessions.
    pub profile_dir: &'a Path,
    /// Implicit wait applied to element lookups.
    pub implicit_wait: Duration,
}

/// Errors from the WebDriver layer.
#[derive(Debug, thiserror::Error)]
pub enum WebDriverError {
    /// The HTTP request itself failed (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// No element matched the selector within the implicit wait.
    #[error("Element not found: {selector}")]
    NoSuchElement { selector: String },

    /// The server answered with a WebDriver error.
    #[error("WebDriver error ({status}) {error}: {message}")]
    Command {
        status: u16,
        error: String,
        message: String,
    },

    /// The response did not have the expected shape.
    #[error("Malformed WebDriver response: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorValue {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

impl WebDriverClient {
    /// * `base_url` - WebDriver server root, e.g. `http://localhost:9515`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Launch a Chrome session with the given options.
    pub async fn new_session(&self, options: &BrowserOptions<'_>) -> Result<Session, WebDriverError> {
        let mut args = vec![
            format!("--user-data-dir={}", options.profile_dir.display()),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--window-size=1920,1080".to_string(),
        ];
        if options.headless {
            args.push("--headless=new".to_string());
        }

        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args },
                    "timeouts": { "implicit": options.implicit_wait.as_millis() as u64 },
                }
            }
        });

        let value = self.command(reqwest::Method::POST, "/session", Some(body)).await?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::Malformed("missing sessionId".into()))?;

        Ok(Session { id: id.to_string() })
    }

    /// End the session and close the browser.
    pub async fn delete_session(&self, session: &Session) -> Result<(), WebDriverError> {
        self.command(reqwest::Method::DELETE, &format!("/session/{}", session.id), None)
            .await?;
        Ok(())
    }

    pub async fn navigate(&self, session: &Session, url: &str) -> Result<(), WebDriverError> {
        self.command(
            reqwest::Method::POST,
            &format!("/session/{}/url", session.id),
            Some(json!({ "url": url })),
        )
        .await?;
        Ok(())
    }

    pub async fn current_url(&self, session: &Session) -> Result<String, WebDriverError> {
        let value = self
            .command(reqwest::Method::GET, &format!("/session/{}/url", session.id), None)
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WebDriverError::Malformed("url is not a string".into()))
    }

    /// Find the first element matching a CSS selector.
    pub async fn find(&self, session: &Session, selector: &str) -> Result<Element, WebDriverError> {
        let result = self
            .command(
                reqwest::Method::POST,
                &format!("/session/{}/element", session.id),
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await;

        let value = match result {
            Err(WebDriverError::Command { error, .. }) if error == "no such element" => {
                return Err(WebDriverError::NoSuchElement {
                    selector: selector.to_string(),
                })
            }
            other => other?,
        };

        let id = value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::Malformed("missing element reference".into()))?;
        Ok(Element { id: id.to_string() })
    }

    pub async fn click(&self, session: &Session, element: &Element) -> Result<(), WebDriverError> {
        self.element_command(session, element, "click", json!({})).await
    }

    pub async fn clear(&self, session: &Session, element: &Element) -> Result<(), WebDriverError> {
        self.element_command(session, element, "clear", json!({})).await
    }

    pub async fn send_keys(
        &self,
        session: &Session,
        element: &Element,
        text: &str,
    ) -> Result<(), WebDriverError> {
        self.element_command(session, element, "value", json!({ "text": text }))
            .await
    }

    /// Find, clear and type into a field in one go.
    pub async fn fill(&self, session: &Session, selector: &str, text: &str) -> Result<(), WebDriverError> {
        let element = self.find(session, selector).await?;
        self.clear(session, &element).await?;
        self.send_keys(session, &element, text).await
    }

    // ---- private helpers ----

    async fn element_command(
        &self,
        session: &Session,
        element: &Element,
        action: &str,
        body: Value,
    ) -> Result<(), WebDriverError> {
        self.command(
            reqwest::Method::POST,
            &format!("/session/{}/element/{}/{}", session.id, element.id, action),
            Some(body),
        )
        .await?;
        Ok(())
    }

    /// Send a command and unwrap the `value` envelope.
    async fn command(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, WebDriverError> {
        let mut request = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let detail = serde_json::from_str::<Envelope>(&text)
                .ok()
                .and_then(|env| serde_json::from_value::<ErrorValue>(env.value).ok());
            let (error, message) = match detail {
                Some(d) => (d.error, d.message),
                None => ("unknown error".to_string(), text),
            };
            return Err(WebDriverError::Command {
                status: status.as_u16(),
                error,
                message,
            });
        }

        let envelope: Envelope = response.json().await?;
        Ok(envelope.value)
    }
}
