//! Emission State Machine.
//!
//! `EmissionRecord` is both the aggregate and the persisted view of one
//! emission (one reference id). It performs no IO: the service calls the
//! provider, then feeds the outcome back in as a command.
//!
//! ```text
//! pendente --submit--> emitindo --autorizado--> emitida --cancel--> cancelada
//!                               --rejeitado---> erro --retry--> pendente
//!                               --transporte--> contingencia --submit/reconcile--> emitindo
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fiscoerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, TenantId};
use fiscoerp_events::Event;
use fiscoerp_sales::SaleId;

use crate::provider::ProviderResult;
use crate::status::{EmissionStatus, ProviderOutcome, ProviderStatus};

/// Provider-mandated bounds for a cancellation justification (characters).
pub const MIN_JUSTIFICATION_CHARS: usize = 15;
pub const MAX_JUSTIFICATION_CHARS: usize = 255;

/// Caller-assigned idempotency key (`ref`) correlating a sale to a provider
/// document. Also the emission id handed to the UI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(pub AggregateId);

impl ReferenceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ReferenceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>()
            .map(Self)
            .map_err(|_| DomainError::invalid_id(format!("ReferenceId: {s}")))
    }
}

/// Check a cancellation justification and return it trimmed.
pub fn validate_justification(justification: &str) -> DomainResult<String> {
    let trimmed = justification.trim();
    let len = trimmed.chars().count();
    if len < MIN_JUSTIFICATION_CHARS {
        return Err(DomainError::validation(format!(
            "justification must have at least {MIN_JUSTIFICATION_CHARS} characters (got {len})"
        )));
    }
    if len > MAX_JUSTIFICATION_CHARS {
        return Err(DomainError::validation(format!(
            "justification must have at most {MAX_JUSTIFICATION_CHARS} characters (got {len})"
        )));
    }
    Ok(trimmed.to_string())
}

/// Emission Record: never deleted, only moved forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub reference: ReferenceId,
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub status: EmissionStatus,
    /// Last status reported by the provider, if it ever answered.
    pub provider_status: Option<ProviderStatus>,
    pub message: Option<String>,
    /// Chave de acesso (44 digits) once authorized.
    pub access_key: Option<String>,
    pub number: Option<String>,
    pub series: Option<String>,
    pub xml_url: Option<String>,
    pub pdf_url: Option<String>,
    pub cancellation_xml_url: Option<String>,
    /// Number of submits sent to the provider.
    pub attempts: u32,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmissionRecord {
    /// A freshly requested emission, not yet submitted.
    pub fn pending(
        tenant_id: TenantId,
        reference: ReferenceId,
        sale_id: SaleId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            reference,
            tenant_id,
            sale_id,
            status: EmissionStatus::Pending,
            provider_status: None,
            message: None,
            access_key: None,
            number: None,
            series: None,
            xml_url: None,
            pdf_url: None,
            cancellation_xml_url: None,
            attempts: 0,
            version: 0,
            created_at: at,
            updated_at: at,
        }
    }

    /// Merge a transition patch; +1 version per merged update.
    pub fn merge(&mut self, update: &EmissionUpdate, at: DateTime<Utc>) {
        self.status = update.status;
        self.message = update.message.clone();

        overwrite(&mut self.provider_status, &update.provider_status);
        overwrite(&mut self.access_key, &update.access_key);
        overwrite(&mut self.number, &update.number);
        overwrite(&mut self.series, &update.series);
        overwrite(&mut self.xml_url, &update.xml_url);
        overwrite(&mut self.pdf_url, &update.pdf_url);
        overwrite(&mut self.cancellation_xml_url, &update.cancellation_xml_url);

        if update.attempt {
            self.attempts += 1;
        }
        self.updated_at = at;
        self.version += 1;
    }

    /// `handle` then `apply` every resulting event, in order.
    pub fn execute(&mut self, command: &EmissionCommand) -> DomainResult<Vec<EmissionEvent>> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }

    fn event(&self, occurred_at: DateTime<Utc>, kind: EmissionEventKind) -> EmissionEvent {
        EmissionEvent {
            tenant_id: self.tenant_id,
            reference: self.reference,
            occurred_at,
            kind,
        }
    }

    fn ensure_status(&self, allowed: &[EmissionStatus], action: &str) -> DomainResult<()> {
        if allowed.contains(&self.status) {
            return Ok(());
        }
        Err(DomainError::invalid_state(format!(
            "cannot {action} emission {} in status '{}'",
            self.reference, self.status
        )))
    }
}

fn overwrite<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

impl AggregateRoot for EmissionRecord {
    type Id = ReferenceId;

    fn id(&self) -> &Self::Id {
        &self.reference
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Patch applied to a record by one transition (the registry's
/// `updateEmissionRecord` payload).
///
/// `status` and `message` always overwrite; the other fields only when set,
/// so an authorized record keeps its access key through later transitions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmissionUpdate {
    pub status: EmissionStatus,
    pub message: Option<String>,
    pub provider_status: Option<ProviderStatus>,
    pub access_key: Option<String>,
    pub number: Option<String>,
    pub series: Option<String>,
    pub xml_url: Option<String>,
    pub pdf_url: Option<String>,
    pub cancellation_xml_url: Option<String>,
    /// Counts as one more submit.
    pub attempt: bool,
}

impl EmissionUpdate {
    fn status(status: EmissionStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            ..Self::default()
        }
    }
}

/// Commands accepted by an `EmissionRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmissionCommand {
    /// Send (or resend) the document. Legal from `pendente`, `erro` (retry)
    /// and `contingencia` (explicit resubmission).
    StartSubmission { occurred_at: DateTime<Utc> },
    /// Ask the provider for the current status without resubmitting. Legal
    /// from `contingencia` and from a stale `emitindo`.
    StartReconciliation { occurred_at: DateTime<Utc> },
    /// Provider answered a submit or status lookup with a status record.
    RecordProviderResult {
        result: ProviderResult,
        occurred_at: DateTime<Utc>,
    },
    /// Provider refused the document (non-2xx answer, or a request that
    /// could not be sent at all).
    RecordProviderFailure {
        http_status: Option<u16>,
        message: String,
        occurred_at: DateTime<Utc>,
    },
    /// No definitive answer (timeout, connection failure, unreadable body).
    RecordTransportFailure {
        message: String,
        occurred_at: DateTime<Utc>,
    },
    RequestCancellation {
        justification: String,
        occurred_at: DateTime<Utc>,
    },
    RecordCancellation {
        result: ProviderResult,
        occurred_at: DateTime<Utc>,
    },
    RecordCancellationFailure {
        message: String,
        occurred_at: DateTime<Utc>,
    },
}

/// Lifecycle fact about one emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionEvent {
    pub tenant_id: TenantId,
    pub reference: ReferenceId,
    pub occurred_at: DateTime<Utc>,
    pub kind: EmissionEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmissionEventKind {
    Requested {
        sale_id: SaleId,
    },
    RetryRequested,
    SubmissionStarted {
        attempt: u32,
    },
    ReconciliationStarted,
    Authorized {
        provider_status: ProviderStatus,
        message: String,
        access_key: Option<String>,
        number: Option<String>,
        series: Option<String>,
        xml_url: Option<String>,
        pdf_url: Option<String>,
    },
    Rejected {
        provider_status: Option<ProviderStatus>,
        http_status: Option<u16>,
        message: String,
    },
    StillProcessing {
        provider_status: ProviderStatus,
        message: String,
    },
    /// Outcome unknown. Downstream consumers must not treat this as failure.
    ContingencyEntered {
        message: String,
    },
    CancellationRequested {
        justification: String,
    },
    Cancelled {
        message: String,
        cancellation_xml_url: Option<String>,
    },
    /// The document stays authorized.
    CancellationFailed {
        message: String,
    },
}

impl EmissionEventKind {
    /// The record patch this event implies.
    pub fn update(&self) -> EmissionUpdate {
        match self {
            EmissionEventKind::Requested { .. } | EmissionEventKind::RetryRequested => {
                EmissionUpdate::status(EmissionStatus::Pending, None)
            }
            EmissionEventKind::SubmissionStarted { .. } => EmissionUpdate {
                attempt: true,
                ..EmissionUpdate::status(EmissionStatus::Emitting, None)
            },
            EmissionEventKind::ReconciliationStarted => {
                EmissionUpdate::status(EmissionStatus::Emitting, None)
            }
            EmissionEventKind::Authorized {
                provider_status,
                message,
                access_key,
                number,
                series,
                xml_url,
                pdf_url,
            } => EmissionUpdate {
                provider_status: Some(provider_status.clone()),
                access_key: access_key.clone(),
                number: number.clone(),
                series: series.clone(),
                xml_url: xml_url.clone(),
                pdf_url: pdf_url.clone(),
                ..EmissionUpdate::status(EmissionStatus::Issued, Some(message.clone()))
            },
            EmissionEventKind::Rejected {
                provider_status,
                message,
                ..
            } => EmissionUpdate {
                provider_status: provider_status.clone(),
                ..EmissionUpdate::status(EmissionStatus::Error, Some(message.clone()))
            },
            EmissionEventKind::StillProcessing {
                provider_status,
                message,
            } => EmissionUpdate {
                provider_status: Some(provider_status.clone()),
                ..EmissionUpdate::status(EmissionStatus::Emitting, Some(message.clone()))
            },
            EmissionEventKind::ContingencyEntered { message } => {
                EmissionUpdate::status(EmissionStatus::Contingency, Some(message.clone()))
            }
            EmissionEventKind::CancellationRequested { justification } => EmissionUpdate::status(
                EmissionStatus::Issued,
                Some(format!("cancelamento solicitado: {justification}")),
            ),
            EmissionEventKind::Cancelled {
                message,
                cancellation_xml_url,
            } => EmissionUpdate {
                provider_status: Some(ProviderStatus::Cancelado),
                cancellation_xml_url: cancellation_xml_url.clone(),
                ..EmissionUpdate::status(EmissionStatus::Cancelled, Some(message.clone()))
            },
            EmissionEventKind::CancellationFailed { message } => {
                EmissionUpdate::status(EmissionStatus::Issued, Some(message.clone()))
            }
        }
    }
}

impl Event for EmissionEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            EmissionEventKind::Requested { .. } => "fiscal.emission.requested",
            EmissionEventKind::RetryRequested => "fiscal.emission.retry_requested",
            EmissionEventKind::SubmissionStarted { .. } => "fiscal.emission.submission_started",
            EmissionEventKind::ReconciliationStarted => "fiscal.emission.reconciliation_started",
            EmissionEventKind::Authorized { .. } => "fiscal.emission.authorized",
            EmissionEventKind::Rejected { .. } => "fiscal.emission.rejected",
            EmissionEventKind::StillProcessing { .. } => "fiscal.emission.still_processing",
            EmissionEventKind::ContingencyEntered { .. } => "fiscal.emission.contingency_entered",
            EmissionEventKind::CancellationRequested { .. } => {
                "fiscal.emission.cancellation_requested"
            }
            EmissionEventKind::Cancelled { .. } => "fiscal.emission.cancelled",
            EmissionEventKind::CancellationFailed { .. } => "fiscal.emission.cancellation_failed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl EmissionEvent {
    pub fn requested(record: &EmissionRecord) -> Self {
        record.event(
            record.created_at,
            EmissionEventKind::Requested {
                sale_id: record.sale_id,
            },
        )
    }
}

impl Aggregate for EmissionRecord {
    type Command = EmissionCommand;
    type Event = EmissionEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        self.merge(&event.kind.update(), event.occurred_at);
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            EmissionCommand::StartSubmission { occurred_at } => {
                self.ensure_status(
                    &[
                        EmissionStatus::Pending,
                        EmissionStatus::Error,
                        EmissionStatus::Contingency,
                    ],
                    "submit",
                )?;
                let mut events = Vec::with_capacity(2);
                if self.status == EmissionStatus::Error {
                    events.push(self.event(*occurred_at, EmissionEventKind::RetryRequested));
                }
                events.push(self.event(
                    *occurred_at,
                    EmissionEventKind::SubmissionStarted {
                        attempt: self.attempts + 1,
                    },
                ));
                Ok(events)
            }
            EmissionCommand::StartReconciliation { occurred_at } => {
                self.ensure_status(
                    &[EmissionStatus::Contingency, EmissionStatus::Emitting],
                    "reconcile",
                )?;
                Ok(vec![self.event(*occurred_at, EmissionEventKind::ReconciliationStarted)])
            }
            EmissionCommand::RecordProviderResult {
                result,
                occurred_at,
            } => {
                self.ensure_status(&[EmissionStatus::Emitting], "record a provider result for")?;
                Ok(self.provider_result_events(result, *occurred_at))
            }
            EmissionCommand::RecordProviderFailure {
                http_status,
                message,
                occurred_at,
            } => {
                self.ensure_status(
                    &[EmissionStatus::Emitting],
                    "record a provider rejection for",
                )?;
                Ok(vec![self.event(
                    *occurred_at,
                    EmissionEventKind::Rejected {
                        provider_status: None,
                        http_status: *http_status,
                        message: message.clone(),
                    },
                )])
            }
            EmissionCommand::RecordTransportFailure {
                message,
                occurred_at,
            } => {
                self.ensure_status(&[EmissionStatus::Emitting], "enter contingency for")?;
                Ok(vec![self.event(
                    *occurred_at,
                    EmissionEventKind::ContingencyEntered {
                        message: message.clone(),
                    },
                )])
            }
            EmissionCommand::RequestCancellation {
                justification,
                occurred_at,
            } => {
                // State first: cancelling a pending record is an InvalidState
                // even with a bad justification.
                self.ensure_status(&[EmissionStatus::Issued], "cancel")?;
                let justification = validate_justification(justification)?;
                Ok(vec![self.event(
                    *occurred_at,
                    EmissionEventKind::CancellationRequested { justification },
                )])
            }
            EmissionCommand::RecordCancellation {
                result,
                occurred_at,
            } => {
                self.ensure_status(&[EmissionStatus::Issued], "record a cancellation for")?;
                let kind = if result.outcome() == ProviderOutcome::Cancelled {
                    EmissionEventKind::Cancelled {
                        message: result.message(),
                        cancellation_xml_url: result.caminho_xml_cancelamento.clone(),
                    }
                } else {
                    EmissionEventKind::CancellationFailed {
                        message: format!("cancelamento não confirmado: {}", result.message()),
                    }
                };
                Ok(vec![self.event(*occurred_at, kind)])
            }
            EmissionCommand::RecordCancellationFailure {
                message,
                occurred_at,
            } => {
                self.ensure_status(
                    &[EmissionStatus::Issued],
                    "record a cancellation failure for",
                )?;
                Ok(vec![self.event(
                    *occurred_at,
                    EmissionEventKind::CancellationFailed {
                        message: message.clone(),
                    },
                )])
            }
        }
    }
}

impl EmissionRecord {
    fn provider_result_events(
        &self,
        result: &ProviderResult,
        at: DateTime<Utc>,
    ) -> Vec<EmissionEvent> {
        let authorized = || EmissionEventKind::Authorized {
            provider_status: result.status.clone(),
            message: result.message(),
            access_key: result.chave_nfe.clone(),
            number: result.numero.clone(),
            series: result.serie.clone(),
            xml_url: result.caminho_xml_nota_fiscal.clone(),
            pdf_url: result.caminho_danfe.clone(),
        };

        match result.outcome() {
            ProviderOutcome::Authorized => vec![self.event(at, authorized())],
            ProviderOutcome::Rejected => vec![self.event(
                at,
                EmissionEventKind::Rejected {
                    provider_status: Some(result.status.clone()),
                    http_status: None,
                    message: result.message(),
                },
            )],
            ProviderOutcome::Processing => vec![self.event(
                at,
                EmissionEventKind::StillProcessing {
                    provider_status: result.status.clone(),
                    message: result.message(),
                },
            )],
            // Found already cancelled (e.g. through the provider panel): it was
            // authorized first, so both facts are recorded.
            ProviderOutcome::Cancelled => vec![
                self.event(at, authorized()),
                self.event(
                    at,
                    EmissionEventKind::Cancelled {
                        message: result.message(),
                        cancellation_xml_url: result.caminho_xml_cancelamento.clone(),
                    },
                ),
            ],
        }
    }
}
