//! Emission orchestration (the core-to-UI operations).
//!
//! ```text
//! operation
//!   ↓
//! 1. Acquire the per-reference permit (at most one submit/cancel in flight)
//!   ↓
//! 2. Load the record, let the aggregate decide (pure, no IO)
//!   ↓
//! 3. Persist each transition in the registry, publish it on the bus
//!   ↓
//! 4. Call the provider, feed its answer back in as a command
//! ```
//!
//! Nothing here retries a submit on its own. Every resubmission is an explicit
//! `retry_emission` call; the only automatic follow-up is reading the status
//! of a document the provider is still processing.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use fiscoerp_core::{Aggregate, TenantId};
use fiscoerp_events::{Event, EventBus, EventEnvelope};
use fiscoerp_fiscal::{
    ArtifactKind, EmissionCommand, EmissionEvent, EmissionRecord, EmissionRequest, EmissionStatus,
    ProviderOutcome, ProviderResult, ReferenceId, map_sale_to_document,
};
use fiscoerp_focus::{FocusClient, FocusError};
use fiscoerp_sales::SaleId;

use crate::config::EmissionServiceConfig;
use crate::error::EmissionError;
use crate::in_flight::{InFlight, InFlightPermit};
use crate::registry::EmissionRegistry;
use crate::source::FiscalDataSource;

/// Aggregate type used on published envelopes.
pub const AGGREGATE_TYPE: &str = "fiscal.emission";

pub struct EmissionService<R, S, B> {
    registry: R,
    source: S,
    provider: FocusClient,
    bus: B,
    config: EmissionServiceConfig,
    references: Arc<InFlight<(TenantId, ReferenceId)>>,
    sales: Arc<InFlight<(TenantId, SaleId)>>,
}

impl<R, S, B> EmissionService<R, S, B>
where
    R: EmissionRegistry,
    S: FiscalDataSource,
    B: EventBus<EventEnvelope<EmissionEvent>>,
{
    pub fn new(registry: R, source: S, provider: FocusClient, bus: B) -> Self {
        Self {
            registry,
            source,
            provider,
            bus,
            config: EmissionServiceConfig::default(),
            references: InFlight::new(),
            sales: InFlight::new(),
        }
    }

    pub fn with_config(mut self, config: EmissionServiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// `requestEmission(saleId)`: map, register and submit a sale.
    ///
    /// Returns the record once it settles (`emitida`, or `emitindo` if the
    /// provider is still processing after polling). Rejections and transport
    /// failures come back as errors carrying the new reference id.
    pub async fn request_emission(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
    ) -> Result<EmissionRecord, EmissionError> {
        let _sale_permit = self.sales.try_acquire((tenant_id, sale_id)).ok_or_else(|| {
            EmissionError::InvalidState(format!(
                "an emission for sale {sale_id} is already being requested"
            ))
        })?;

        let existing = self.registry.find_by_sale(tenant_id, sale_id).await?;
        if let Some(live) = existing.iter().find(|r| r.status.blocks_new_emission()) {
            return Err(EmissionError::InvalidState(format!(
                "sale {sale_id} already has emission {} in status '{}'; retry or reconcile it instead",
                live.reference, live.status
            )));
        }

        // Validation failures stop here: no record, no network call.
        let request = self.build_request(tenant_id, sale_id).await?;

        let reference = ReferenceId::generate();
        let _permit = self.acquire(tenant_id, reference)?;
        let record = self
            .registry
            .create(tenant_id, reference, sale_id, Utc::now())
            .await?;
        info!(%tenant_id, %sale_id, %reference, "emission requested");
        self.publish(&record, EmissionEvent::requested(&record));

        self.submit(record, &request).await
    }

    /// `retryEmission(emissionId)`: resubmit with the same reference id.
    ///
    /// Legal from `erro` and `contingencia` (and a `pendente` record whose
    /// first submit never started). The payload is rebuilt from current data.
    pub async fn retry_emission(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
    ) -> Result<EmissionRecord, EmissionError> {
        let _permit = self.acquire(tenant_id, reference)?;
        let record = self.load(tenant_id, reference).await?;

        // Refuse before re-mapping so an illegal retry costs nothing.
        record.handle(&EmissionCommand::StartSubmission {
            occurred_at: Utc::now(),
        })?;
        if record.status == EmissionStatus::Contingency {
            warn!(%reference, "resubmitting an emission in contingency without reconciling first");
        }

        let request = self.build_request(tenant_id, record.sale_id).await?;
        self.submit(record, &request).await
    }

    /// Ask the provider what happened to a `contingencia` (or stale
    /// `emitindo`) emission, without resubmitting.
    pub async fn reconcile_emission(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
    ) -> Result<EmissionRecord, EmissionError> {
        let _permit = self.acquire(tenant_id, reference)?;
        let mut record = self.load(tenant_id, reference).await?;

        self.run(
            &mut record,
            EmissionCommand::StartReconciliation {
                occurred_at: Utc::now(),
            },
        )
        .await?;
        info!(%reference, "reconciling emission");

        match self.provider.fetch_status(&reference).await {
            Ok(result) => self.settle(record, result).await,
            // The provider never received it: nothing exists, a retry is safe.
            Err(err) if err.is_not_found() => {
                let message =
                    "provider has no document for this reference; retry is safe".to_string();
                self.run(
                    &mut record,
                    EmissionCommand::RecordProviderFailure {
                        http_status: Some(404),
                        message: message.clone(),
                        occurred_at: Utc::now(),
                    },
                )
                .await?;
                Err(EmissionError::Provider {
                    reference,
                    status: Some(404),
                    message,
                })
            }
            // Any other failed lookup says nothing about the document.
            Err(FocusError::Provider {
                status, message, ..
            }) => {
                let message = format!("status lookup failed with HTTP {status}: {message}");
                self.enter_contingency(record, message).await
            }
            Err(err) => self.fail(record, err).await,
        }
    }

    /// `cancelEmission(emissionId, justification)`; only from `emitida`.
    pub async fn cancel_emission(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
        justification: &str,
    ) -> Result<EmissionRecord, EmissionError> {
        let _permit = self.acquire(tenant_id, reference)?;
        let mut record = self.load(tenant_id, reference).await?;

        // State and justification are checked here, before any request.
        self.run(
            &mut record,
            EmissionCommand::RequestCancellation {
                justification: justification.to_string(),
                occurred_at: Utc::now(),
            },
        )
        .await?;
        info!(%reference, "cancelling emission");

        match self.provider.cancel(&reference, justification).await {
            Ok(result) => {
                self.run(
                    &mut record,
                    EmissionCommand::RecordCancellation {
                        result,
                        occurred_at: Utc::now(),
                    },
                )
                .await?;
                if record.status == EmissionStatus::Cancelled {
                    info!(%reference, "emission cancelled");
                    Ok(record)
                } else {
                    Err(EmissionError::Provider {
                        reference,
                        status: None,
                        message: record.message.clone().unwrap_or_default(),
                    })
                }
            }
            Err(err) => {
                let failure = provider_error(reference, err);
                let message = match &failure {
                    EmissionError::Provider { message, .. }
                    | EmissionError::Transport { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                warn!(%reference, %message, "cancellation failed; document stays authorized");
                self.run(
                    &mut record,
                    EmissionCommand::RecordCancellationFailure {
                        message,
                        occurred_at: Utc::now(),
                    },
                )
                .await?;
                Err(failure)
            }
        }
    }

    /// `downloadArtifact(emissionId, kind)`: raw XML or DANFE bytes.
    pub async fn download_artifact(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
        kind: ArtifactKind,
    ) -> Result<Vec<u8>, EmissionError> {
        let record = self.load(tenant_id, reference).await?;
        if !record.status.has_artifacts() {
            return Err(EmissionError::InvalidState(format!(
                "emission {reference} in status '{}' has no {} to download",
                record.status,
                kind.extension()
            )));
        }

        self.provider
            .download_artifact(&reference, kind)
            .await
            .map_err(|err| provider_error(reference, err))
    }

    pub async fn get(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
    ) -> Result<EmissionRecord, EmissionError> {
        self.load(tenant_id, reference).await
    }

    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<EmissionRecord>, EmissionError> {
        Ok(self.registry.list(tenant_id).await?)
    }

    async fn submit(
        &self,
        mut record: EmissionRecord,
        request: &EmissionRequest,
    ) -> Result<EmissionRecord, EmissionError> {
        self.run(
            &mut record,
            EmissionCommand::StartSubmission {
                occurred_at: Utc::now(),
            },
        )
        .await?;
        info!(reference = %record.reference, attempt = record.attempts, "submitting emission");

        match self.provider.submit(&record.reference, request).await {
            Ok(result) => self.settle(record, result).await,
            Err(err) => self.fail(record, err).await,
        }
    }

    /// Apply a provider status record, reading the status again while the
    /// provider is still processing (bounded by the config).
    async fn settle(
        &self,
        mut record: EmissionRecord,
        mut result: ProviderResult,
    ) -> Result<EmissionRecord, EmissionError> {
        let mut polls = 0;
        loop {
            let processing = result.outcome() == ProviderOutcome::Processing;
            self.run(
                &mut record,
                EmissionCommand::RecordProviderResult {
                    result,
                    occurred_at: Utc::now(),
                },
            )
            .await?;

            if !processing || polls >= self.config.status_poll_attempts {
                break;
            }
            polls += 1;
            tokio::time::sleep(self.config.status_poll_interval).await;

            match self.provider.fetch_status(&record.reference).await {
                Ok(next) => result = next,
                Err(err) => {
                    warn!(
                        reference = %record.reference,
                        error = %err,
                        "status lookup failed; emission stays emitindo"
                    );
                    break;
                }
            }
        }

        match record.status {
            EmissionStatus::Error => {
                warn!(
                    reference = %record.reference,
                    message = ?record.message,
                    "emission rejected"
                );
                Err(EmissionError::Provider {
                    reference: record.reference,
                    status: None,
                    message: record.message.clone().unwrap_or_default(),
                })
            }
            status => {
                info!(
                    reference = %record.reference,
                    %status,
                    number = ?record.number,
                    "emission settled"
                );
                Ok(record)
            }
        }
    }

    /// Route a failed submit/lookup: rejection → `erro`, unknown → `contingencia`.
    async fn fail(
        &self,
        mut record: EmissionRecord,
        err: FocusError,
    ) -> Result<EmissionRecord, EmissionError> {
        let reference = record.reference;
        if err.is_unknown_outcome() {
            return self.enter_contingency(record, err.to_string()).await;
        }

        let (http_status, message) = match err {
            FocusError::Provider {
                status, message, ..
            } => (Some(status), message),
            other => (None, other.to_string()),
        };
        warn!(%reference, http_status = ?http_status, %message, "emission rejected");
        self.run(
            &mut record,
            EmissionCommand::RecordProviderFailure {
                http_status,
                message: message.clone(),
                occurred_at: Utc::now(),
            },
        )
        .await?;
        Err(EmissionError::Provider {
            reference,
            status: http_status,
            message,
        })
    }

    async fn enter_contingency(
        &self,
        mut record: EmissionRecord,
        message: String,
    ) -> Result<EmissionRecord, EmissionError> {
        let reference = record.reference;
        warn!(%reference, %message, "provider outcome unknown; emission in contingency");
        self.run(
            &mut record,
            EmissionCommand::RecordTransportFailure {
                message: message.clone(),
                occurred_at: Utc::now(),
            },
        )
        .await?;
        Err(EmissionError::Transport { reference, message })
    }

    /// Decide, persist each transition, publish it.
    async fn run(
        &self,
        record: &mut EmissionRecord,
        command: EmissionCommand,
    ) -> Result<(), EmissionError> {
        let events = record.handle(&command)?;
        for event in events {
            let stored = self
                .registry
                .update(
                    record.tenant_id,
                    record.reference,
                    &event.kind.update(),
                    event.occurred_at,
                )
                .await?;
            debug!(
                reference = %stored.reference,
                event = event.event_type(),
                status = %stored.status,
                version = stored.version,
                "emission transition"
            );
            *record = stored;
            self.publish(record, event);
        }
        Ok(())
    }

    /// Best-effort: the registry already holds the transition.
    fn publish(&self, record: &EmissionRecord, event: EmissionEvent) {
        let envelope = EventEnvelope::wrap(
            record.tenant_id,
            record.reference.0,
            AGGREGATE_TYPE,
            record.version,
            event,
        );
        if let Err(err) = self.bus.publish(envelope) {
            warn!(reference = %record.reference, error = ?err, "failed to publish emission event");
        }
    }

    async fn build_request(
        &self,
        tenant_id: TenantId,
        sale_id: SaleId,
    ) -> Result<EmissionRequest, EmissionError> {
        let sale = self
            .source
            .sale(tenant_id, sale_id)
            .await?
            .ok_or_else(|| EmissionError::NotFound(format!("sale {sale_id}")))?;
        let emitter = self.source.emitter(tenant_id).await?.ok_or_else(|| {
            EmissionError::Validation(
                "company registration (emitter) is not configured for this tenant".to_string(),
            )
        })?;

        Ok(map_sale_to_document(&sale, &emitter)?)
    }

    async fn load(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
    ) -> Result<EmissionRecord, EmissionError> {
        self.registry
            .get(tenant_id, reference)
            .await?
            .ok_or_else(|| EmissionError::NotFound(format!("emission {reference}")))
    }

    fn acquire(
        &self,
        tenant_id: TenantId,
        reference: ReferenceId,
    ) -> Result<InFlightPermit<(TenantId, ReferenceId)>, EmissionError> {
        self.references
            .try_acquire((tenant_id, reference))
            .ok_or_else(|| {
                EmissionError::InvalidState(format!(
                    "another operation on emission {reference} is in progress"
                ))
            })
    }
}

fn provider_error(reference: ReferenceId, err: FocusError) -> EmissionError {
    if err.is_unknown_outcome() {
        return EmissionError::Transport {
            reference,
            message: err.to_string(),
        };
    }
    match err {
        FocusError::Provider {
            status, message, ..
        } => EmissionError::Provider {
            reference,
            status: Some(status),
            message,
        },
        FocusError::Validation(msg) => EmissionError::Validation(msg),
        other => EmissionError::Provider {
            reference,
            status: None,
            message: other.to_string(),
        },
    }
}
