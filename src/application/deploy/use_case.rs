//! Deploy Use Case
//!
//! Orchestrates one deploy as a single logical transaction:
//! 1. Look up the webapp and pick its site-type capabilities
//! 2. Package the local project (layout check, tree walk)
//! 3. Upload changes over a managed session
//! 4. Activate (queue the platform deploy task)
//! 5. Restart and poll until confirmed or timed out
//!
//! Every step goes through a port, so the whole flow runs against fakes in tests.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::cancel::CancelToken;
use crate::application::packaging::{self, Package};
use crate::application::restart::{wait_for_task, RestartStatus, TaskWait};
use crate::application::session::SessionManager;
use crate::application::uploader::{DifferentialUploader, UploadOptions};
use crate::domain::entities::{UploadReport, Webapp};
use crate::domain::ports::{
    AcceptingReviewer, Clock, ControlPlane, DeployEvent, DeployEventSink, LayoutReviewer,
    NoopEventSink, ProjectSource, ScanOptions, TaskKind, Transport,
};
use crate::domain::services::PlanConfig;
use crate::domain::value_objects::{Activation, DeployState, RemoteHost};
use crate::error::{DeployError, DeployResult};

use super::options::{DeployMode, DeployOptions, DeploySettings};
use super::result::DeployOutcome;
use super::state::DeployStateMachine;

/// Deploy use case - orchestrates the deployment flow
///
/// Parameterized by its ports so tests can swap in fakes.
pub struct DeployUseCase<T, A, S>
where
    T: Transport,
    A: ControlPlane,
    S: ProjectSource,
{
    sessions: SessionManager<T>,
    api: A,
    source: S,
    settings: DeploySettings,
    clock: Arc<dyn Clock>,
    events: Arc<dyn DeployEventSink>,
    reviewer: Arc<dyn LayoutReviewer>,
    cancel: CancelToken,
}

impl<T, A, S> DeployUseCase<T, A, S>
where
    T: Transport,
    A: ControlPlane,
    S: ProjectSource,
{
    pub fn new(
        transport: T,
        api: A,
        source: S,
        settings: DeploySettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = SessionManager::new(transport, settings.connect_retry, clock.clone());
        Self {
            sessions,
            api,
            source,
            settings,
            clock,
            events: Arc::new(NoopEventSink),
            reviewer: Arc::new(AcceptingReviewer),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn DeployEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_reviewer(mut self, reviewer: Arc<dyn LayoutReviewer>) -> Self {
        self.reviewer = reviewer;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn transport(&self) -> &T {
        self.sessions.transport()
    }

    /// Execute the deploy use case
    ///
    /// Never panics or returns early; failures are recorded in the outcome
    /// with the state machine in `Failed`.
    pub fn execute(&self, options: &DeployOptions) -> DeployOutcome {
        let mut machine = DeployStateMachine::new(self.events.clone());
        let mut outcome = DeployOutcome::new();

        if let Err(err) = self.run(options, &mut machine, &mut outcome) {
            if err.is_user_cancel() {
                info!(error = %err, "deploy stopped");
            } else {
                debug!(error = %err, "deploy failed");
            }
            machine.fail();
            outcome.failure = Some(err);
        }

        outcome.state = machine.state();
        outcome.history = machine.history().to_vec();

        let report = outcome.upload.clone().unwrap_or_default();
        self.events.on_event(DeployEvent::Completed {
            state: outcome.state,
            uploaded: report.uploaded.len(),
            skipped: report.skipped.len(),
            failed: report.failed.len(),
            deleted: report.deleted.len(),
            dry_run: options.dry_run,
        });
        outcome
    }

    fn run(
        &self,
        options: &DeployOptions,
        machine: &mut DeployStateMachine,
        outcome: &mut DeployOutcome,
    ) -> DeployResult<()> {
        let webapp = self.api.webapp(&options.handle)?;
        let remote_root = self.remote_root(options);
        info!(
            webapp = %webapp.handle,
            site_type = %webapp.site_type,
            env = %options.env,
            mode = options.mode.command_name(),
            "starting"
        );
        outcome.url = webapp.url(options.env);
        self.events.on_event(DeployEvent::Started {
            command: options.mode.command_name(),
            webapp: webapp.handle.clone(),
            env: options.env.to_string(),
            source: options.source.clone(),
            remote: remote_root.clone(),
        });

        if options.mode == DeployMode::RestartOnly {
            machine.advance(DeployState::Restarting)?;
            self.restart(&webapp, options, outcome)?;
            return machine.advance(DeployState::Done);
        }

        if options.uploads() {
            self.check_cancel()?;
            machine.advance(DeployState::Packaging)?;
            let package = self.package(&webapp, options, &remote_root)?;

            self.check_cancel()?;
            machine.advance(DeployState::Uploading)?;
            let report = self.upload(&webapp, options, &package, remote_root)?;
            outcome.upload = Some(report.clone());

            if report.aborted {
                if self.cancel.is_cancelled() {
                    return Err(DeployError::Cancelled);
                }
                return Err(DeployError::UploadAborted {
                    reason: report
                        .abort_reason
                        .clone()
                        .unwrap_or_else(|| "connection lost".to_string()),
                });
            }

            if options.mode == DeployMode::UploadOnly {
                if let Some(first) = report.failed.first() {
                    return Err(DeployError::PartialUpload {
                        failed: report.failed.len(),
                        path: first.path.clone(),
                        attempts: first.attempts,
                    });
                }
                return machine.advance(DeployState::Done);
            }

            if options.dry_run {
                info!(summary = %report.summary(), "dry run complete");
                return machine.advance(DeployState::Done);
            }

            self.guard_activation(&report, options, outcome)?;
        }

        self.check_cancel()?;
        machine.advance(DeployState::Activating)?;
        self.activate(&webapp, options, outcome)?;

        self.check_cancel()?;
        machine.advance(DeployState::Restarting)?;
        self.restart(&webapp, options, outcome)?;

        machine.advance(DeployState::Done)
    }

    fn remote_root(&self, options: &DeployOptions) -> String {
        options
            .remote_dir
            .clone()
            .unwrap_or_else(|| self.settings.remote_dir.clone())
    }

    fn check_cancel(&self) -> DeployResult<()> {
        if self.cancel.is_cancelled() {
            Err(DeployError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Whether `remote_root` is the directory the app is served from
    fn is_app_root(&self, remote_root: &str) -> bool {
        let normalize = |dir: &str| dir.trim_end_matches('/').to_string();
        normalize(remote_root) == normalize(&self.settings.remote_dir)
    }

    fn package(
        &self,
        webapp: &Webapp,
        options: &DeployOptions,
        remote_root: &str,
    ) -> DeployResult<Package> {
        let scan = ScanOptions {
            exclude: self.settings.exclude.clone(),
            checksums: self.settings.compare.needs_checksums(),
            respect_gitignore: self.settings.respect_gitignore,
        };
        // Uploads into a subdirectory carry assets, not an app layout
        let check = match options.mode {
            DeployMode::Full => true,
            DeployMode::UploadOnly => self.is_app_root(remote_root),
            DeployMode::RestartOnly => false,
        };
        let package = packaging::package(
            &self.source,
            &options.source,
            webapp,
            options.env,
            &scan,
            check,
        )?;

        if !package.issues.is_empty() {
            for issue in &package.issues {
                self.events.on_event(DeployEvent::LayoutWarning {
                    file: issue.file.clone(),
                    message: issue.message.clone(),
                });
            }
            if !self.reviewer.review(webapp, &package.issues) {
                return Err(DeployError::Declined);
            }
        }

        self.events.on_event(DeployEvent::Packaged {
            file_count: package.tree.len(),
            total_bytes: package.tree.total_bytes(),
        });
        Ok(package)
    }

    fn upload(
        &self,
        webapp: &Webapp,
        options: &DeployOptions,
        package: &Package,
        remote_root: String,
    ) -> DeployResult<UploadReport> {
        let host = RemoteHost::new(webapp.sftp_host(options.env), self.settings.sftp_port);
        let credentials = self.api.issue_credentials(webapp, options.env)?;
        debug!(host = %host, user = %credentials.username, "credentials issued");

        let uploader = DifferentialUploader::new(
            UploadOptions {
                remote_root,
                dry_run: options.dry_run,
                plan: PlanConfig {
                    compare: self.settings.compare,
                    delete_extraneous: options.delete,
                },
                file_retry: self.settings.file_retry,
            },
            self.clock.clone(),
            self.events.clone(),
            self.cancel.clone(),
        );

        let (_plan, report) = self.sessions.with_session(&host, &credentials, |session| {
            let conn = session.connection()?;
            uploader.run(conn, &package.tree)
        })?;
        Ok(report)
    }

    /// Refuse to activate a partial upload unless forced.
    fn guard_activation(
        &self,
        report: &UploadReport,
        options: &DeployOptions,
        outcome: &mut DeployOutcome,
    ) -> DeployResult<()> {
        let Some(first) = report.failed.first() else {
            return Ok(());
        };
        if !options.force {
            return Err(DeployError::ActivationBlocked {
                failed: report.failed.len(),
                path: first.path.clone(),
                attempts: first.attempts,
            });
        }
        let message = format!(
            "activating with {} failed upload(s) because --force was given",
            report.failed.len()
        );
        info!("{}", message);
        self.events.on_event(DeployEvent::Warning {
            message: message.clone(),
        });
        outcome.warnings.push(message);
        Ok(())
    }

    fn activate(
        &self,
        webapp: &Webapp,
        options: &DeployOptions,
        outcome: &mut DeployOutcome,
    ) -> DeployResult<()> {
        match webapp.site_type.capabilities().activate {
            Activation::None => {
                debug!(site_type = %webapp.site_type, "no activation step");
            }
            Activation::DeployTask => {
                let task = self.api.queue_task(webapp, options.env, TaskKind::Init)?;
                info!(task = %task, "deploy task queued");
                outcome.activation_task = Some(task);
                self.events.on_event(DeployEvent::TaskQueued {
                    kind: TaskKind::Init.as_str(),
                    task_id: task.0,
                });
            }
        }
        Ok(())
    }

    fn restart(
        &self,
        webapp: &Webapp,
        options: &DeployOptions,
        outcome: &mut DeployOutcome,
    ) -> DeployResult<()> {
        let task = self.api.queue_task(webapp, options.env, TaskKind::Restart)?;
        info!(task = %task, "restart queued");
        self.events.on_event(DeployEvent::TaskQueued {
            kind: TaskKind::Restart.as_str(),
            task_id: task.0,
        });

        let wait = wait_for_task(
            &self.api,
            task,
            TaskKind::Restart,
            &self.settings.poll,
            self.clock.as_ref(),
            &self.cancel,
        )?;

        match wait {
            TaskWait::Completed { waited } => {
                outcome.restart = RestartStatus::Confirmed { task, waited };
                self.events.on_event(DeployEvent::RestartConfirmed {
                    task_id: task.0,
                    waited_secs: waited.as_secs(),
                });
            }
            TaskWait::TimedOut { waited } => {
                outcome.restart = RestartStatus::TimedOut { task, waited };
                if let Some(err) = outcome.restart_timeout() {
                    outcome.warnings.push(err.to_string());
                }
                self.events.on_event(DeployEvent::RestartTimedOut {
                    task_id: task.0,
                    waited_secs: waited.as_secs(),
                });
            }
        }
        Ok(())
    }
}
