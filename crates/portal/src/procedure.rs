//! The portal submission flow.
//!
//! Opens a browser session on the persistent profile, logs in unless the
//! profile is already authenticated, opens the quote form, types the mapped
//! fields and advances the wizard. The session is always closed and, when
//! tracing is enabled, an archive is written whatever the outcome.

use async_trait::async_trait;
use columbia_core::submission::{SubmissionContext, SubmissionError, SubmissionProcedure};

use crate::config::PortalConfig;
use crate::form;
use crate::trace::TraceRecorder;
use crate::webdriver::{BrowserOptions, Session, WebDriverClient, WebDriverError};

/// [`SubmissionProcedure`] backed by a WebDriver-controlled Chrome.
pub struct ColumbiaPortal {
    config: PortalConfig,
    driver: WebDriverClient,
}

impl ColumbiaPortal {
    pub fn new(config: PortalConfig) -> Self {
        let driver = WebDriverClient::new(config.webdriver_url.clone());
        Self { config, driver }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    async fn login(&self, session: &Session, trace: &mut TraceRecorder) -> Result<(), SubmissionError> {
        step(trace, "check_session", self.driver.navigate(session, &self.config.quote_url)).await?;
        if !is_login_page(&step(trace, "read_url", self.driver.current_url(session)).await?) {
            tracing::info!("Already logged in via persistent session");
            return Ok(());
        }

        tracing::info!("Logging in to portal");
        step(trace, "open_login", self.driver.navigate(session, &self.config.login_url)).await?;
        step(
            trace,
            "fill_username",
            self.driver.fill(session, form::USERNAME_SELECTOR, &self.config.username),
        )
        .await?;
        step(
            trace,
            "fill_password",
            self.driver.fill(session, form::PASSWORD_SELECTOR, &self.config.password),
        )
        .await?;
        let button = step(trace, "find_login_button", self.driver.find(session, form::LOGIN_BUTTON_SELECTOR)).await?;
        step(trace, "submit_login", self.driver.click(session, &button)).await?;

        let url = step(trace, "read_url", self.driver.current_url(session)).await?;
        if is_login_page(&url) {
            trace.failed("login", format!("still on login page: {url}"));
            return Err(SubmissionError::Rejected(
                "Login failed; check COLUMBIA_USERNAME and COLUMBIA_PASSWORD".into(),
            ));
        }
        trace.ok("login");
        Ok(())
    }

    async fn fill_quote(
        &self,
        session: &Session,
        ctx: &SubmissionContext,
        trace: &mut TraceRecorder,
    ) -> Result<(), SubmissionError> {
        step(trace, "open_quote", self.driver.navigate(session, &self.config.quote_url)).await?;

        let today = chrono::Local::now().date_naive();
        for (selector, value) in form::plan(&ctx.input, today) {
            tracing::debug!(job_id = %ctx.job_id, selector, "Filling field");
            step(trace, format!("fill {selector}"), self.driver.fill(session, selector, &value)).await?;
        }

        let next = step(trace, "find_next", self.driver.find(session, form::NEXT_SELECTOR)).await?;
        step(trace, "advance", self.driver.click(session, &next)).await?;
        Ok(())
    }

    async fn run(
        &self,
        session: &Session,
        ctx: &SubmissionContext,
        trace: &mut TraceRecorder,
    ) -> Result<(), SubmissionError> {
        if self.config.login_url.is_empty() || self.config.quote_url.is_empty() {
            return Err(SubmissionError::Portal(
                "COLUMBIA_LOGIN_URL and COLUMBIA_QUOTE_URL must be set".into(),
            ));
        }
        self.login(session, trace).await?;
        self.fill_quote(session, ctx, trace).await
    }
}

#[async_trait]
impl SubmissionProcedure for ColumbiaPortal {
    async fn submit(&self, ctx: &SubmissionContext) -> Result<(), SubmissionError> {
        let mut trace = TraceRecorder::new(ctx.trace_label.clone(), ctx.job_id.clone());
        let profile_dir = self.config.profile_dir();

        let session = match tokio::fs::create_dir_all(&profile_dir).await {
            Ok(()) => {
                let options = BrowserOptions {
                    headless: self.config.headless,
                    profile_dir: &profile_dir,
                    implicit_wait: self.config.browser_timeout,
                };
                step(&mut trace, "start_browser", self.driver.new_session(&options)).await
            }
            Err(e) => {
                trace.failed("start_browser", e.to_string());
                Err(SubmissionError::Portal(format!(
                    "Could not create profile directory {}: {e}",
                    profile_dir.display()
                )))
            }
        };

        let result = match session {
            Ok(session) => {
                tracing::info!(job_id = %ctx.job_id, session_id = %session.id, "Browser session started");
                let result = self.run(&session, ctx, &mut trace).await;
                if let Err(e) = self.driver.delete_session(&session).await {
                    tracing::warn!(job_id = %ctx.job_id, error = %e, "Failed to close browser session");
                }
                result
            }
            Err(e) => Err(e),
        };

        if self.config.enable_tracing {
            let error = result.as_ref().err().map(ToString::to_string);
            let trace_dir = self.config.trace_dir.clone();
            let saved =
                tokio::task::spawn_blocking(move || trace.save(&trace_dir, error.as_deref())).await;
            match saved {
                Ok(Ok(path)) => {
                    tracing::debug!(job_id = %ctx.job_id, path = %path.display(), "Trace archive written")
                }
                Ok(Err(e)) => {
                    tracing::warn!(job_id = %ctx.job_id, error = %e, "Failed to write trace archive")
                }
                Err(e) => {
                    tracing::warn!(job_id = %ctx.job_id, error = %e, "Trace archive task failed")
                }
            }
        }

        result
    }
}

/// Await a driver call, record it in the trace, and map its error.
async fn step<T>(
    trace: &mut TraceRecorder,
    name: impl Into<String>,
    call: impl std::future::Future<Output = Result<T, WebDriverError>>,
) -> Result<T, SubmissionError> {
    let name = name.into();
    match call.await {
        Ok(value) => {
            trace.ok(name);
            Ok(value)
        }
        Err(e) => {
            trace.failed(name.as_str(), e.to_string());
            Err(SubmissionError::Portal(format!("{name}: {e}")))
        }
    }
}

fn is_login_page(url: &str) -> bool {
    url.to_ascii_lowercase().contains("login")
}
