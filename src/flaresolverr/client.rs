use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::config::FlareSolverrConfig;
use crate::errors::RenderError;
use crate::flaresolverr::payload::{FlareSolverrResponse, RequestPayload};
use crate::flaresolverr::{RenderEngine, RenderPage};

/// Extra time given to the HTTP call on top of the `maxTimeout` handed to FlareSolverr.
const HTTP_GRACE: Duration = Duration::from_secs(10);
const SESSION_TIMEOUT: Duration = Duration::from_secs(30);
const READINESS_TIMEOUT: Duration = Duration::from_secs(5);
const STARTUP_POLL: Duration = Duration::from_millis(500);

/// Process-wide handle on the FlareSolverr service.
///
/// Initialized lazily on the first page request. When the service stops answering the
/// handle is marked unusable and the next page request checks it again, spawning the
/// configured executable if `autostart` is enabled.
pub struct FlareSolverr {
    client: Client,
    endpoint: Url,
    root_url: Url,
    config: FlareSolverrConfig,
    state: Mutex<EngineState>,
}

#[derive(Default)]
struct EngineState {
    ready: bool,
    child: Option<Child>,
}

impl FlareSolverr {
    pub fn new(config: FlareSolverrConfig) -> Result<Self, RenderError> {
        let endpoint = Url::parse(&config.flaresolverr_url).map_err(|e| {
            RenderError::Protocol(format!(
                "invalid FlareSolverr url {}: {e}",
                config.flaresolverr_url
            ))
        })?;
        let root_url = endpoint
            .join("/")
            .map_err(|e| RenderError::Protocol(e.to_string()))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            root_url,
            config,
            state: Mutex::new(EngineState::default()),
        })
    }

    async fn answers_readiness_check(&self) -> bool {
        self.client
            .get(self.root_url.clone())
            .timeout(READINESS_TIMEOUT)
            .send()
            .await
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    async fn ensure_ready(&self) -> Result<(), RenderError> {
        let mut state = self.state.lock().await;
        if state.ready {
            return Ok(());
        }

        if self.answers_readiness_check().await {
            info!(url = %self.endpoint, "FlareSolverr is ready");
            state.ready = true;
            return Ok(());
        }

        if !self.config.autostart {
            return Err(RenderError::Unavailable(format!(
                "FlareSolverr is not answering at {}",
                self.root_url
            )));
        }

        // Drop a child that has exited (crashed) so it gets respawned.
        if let Some(child) = state.child.as_mut() {
            if !matches!(child.try_wait(), Ok(None)) {
                warn!("FlareSolverr process exited, restarting it");
                state.child = None;
            }
        }

        if state.child.is_none() {
            let executable = &self.config.executable;
            info!(executable = %executable.display(), "starting FlareSolverr");
            let child = Command::new(executable)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| {
                    RenderError::Unavailable(format!(
                        "failed to start {}: {e}",
                        executable.display()
                    ))
                })?;
            state.child = Some(child);
        }

        let deadline = Instant::now() + self.config.startup_timeout();
        while Instant::now() < deadline {
            if self.answers_readiness_check().await {
                info!(url = %self.endpoint, "FlareSolverr started");
                state.ready = true;
                return Ok(());
            }
            sleep(STARTUP_POLL).await;
        }

        Err(RenderError::Unavailable(format!(
            "FlareSolverr did not become ready within {:?}",
            self.config.startup_timeout()
        )))
    }

    async fn invalidate(&self) {
        self.state.lock().await.ready = false;
    }

    async fn command(
        &self,
        payload: &RequestPayload<'_>,
        limit: Duration,
    ) -> Result<FlareSolverrResponse, RenderError> {
        let result = self.send(payload, limit).await;
        if let Err(e) = &result {
            if e.is_unavailable() {
                self.invalidate().await;
            }
        }
        result
    }

    async fn send(
        &self,
        payload: &RequestPayload<'_>,
        limit: Duration,
    ) -> Result<FlareSolverrResponse, RenderError> {
        // Failed commands come back as HTTP 500 with a JSON body, so the status is not checked.
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .timeout(limit)
            .send()
            .await
            .map_err(|e| classify(e, limit))?;

        response
            .json::<FlareSolverrResponse>()
            .await
            .map_err(|e| RenderError::Protocol(format!("invalid FlareSolverr response: {e}")))
    }
}

fn classify(error: reqwest::Error, limit: Duration) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout(limit)
    } else if error.is_connect() || error.is_request() {
        RenderError::Unavailable(error.to_string())
    } else {
        RenderError::Protocol(error.to_string())
    }
}

#[async_trait]
impl RenderEngine for FlareSolverr {
    async fn acquire_page(&self) -> Result<RenderPage, RenderError> {
        self.ensure_ready().await?;

        let response = self
            .command(&RequestPayload::create_session(), SESSION_TIMEOUT)
            .await?;
        if !response.is_ok() {
            // The service answers but cannot open a browser.
            self.invalidate().await;
            return Err(RenderError::Unavailable(response.message));
        }

        let id = response
            .session
            .ok_or_else(|| RenderError::Protocol("sessions.create returned no session".into()))?;
        debug!(session = %id, "page acquired");
        Ok(RenderPage::new(id))
    }

    async fn render(
        &self,
        page: &RenderPage,
        url: &str,
        timeout: Duration,
    ) -> Result<String, RenderError> {
        let max_timeout = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let response = self
            .command(
                &RequestPayload::get(url, page.id(), max_timeout),
                timeout + HTTP_GRACE,
            )
            .await?;

        if !response.is_ok() {
            return Err(if response.message.contains("Timeout") {
                RenderError::Timeout(timeout)
            } else {
                RenderError::Navigation {
                    url: url.to_string(),
                    message: response.message,
                }
            });
        }

        let solution = response
            .solution
            .ok_or_else(|| RenderError::Protocol("request.get returned no solution".into()))?;
        if solution.status >= 400 {
            return Err(RenderError::Navigation {
                url: solution.url,
                message: format!("HTTP {}", solution.status),
            });
        }

        Ok(solution.response)
    }

    async fn release(&self, page: RenderPage) {
        match self
            .command(&RequestPayload::destroy_session(page.id()), SESSION_TIMEOUT)
            .await
        {
            Ok(response) if response.is_ok() => debug!(session = %page.id(), "page released"),
            Ok(response) => warn!(session = %page.id(), message = %response.message, "failed to release page"),
            Err(e) => warn!(session = %page.id(), error = %e, "failed to release page"),
        }
    }

    async fn recover(&self) {
        self.invalidate().await;
        match self.ensure_ready().await {
            Ok(()) => info!("rendering engine checked after failed run"),
            Err(e) => warn!(error = %e, "rendering engine still unavailable"),
        }
    }
}
