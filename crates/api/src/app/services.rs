use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Deserialize;

use fiscoerp_core::TenantId;
use fiscoerp_events::{Event, EventBus, EventEnvelope, InMemoryEventBus};
use fiscoerp_fiscal::EmissionEvent;
use fiscoerp_focus::{FocusClient, FocusConfig, FocusError};
use fiscoerp_infra::{
    EmissionService, EmissionServiceConfig, InMemoryEmissionRegistry, InMemoryFiscalSource,
};
use fiscoerp_parties::Emitter;
use fiscoerp_sales::Sale;

pub type EmissionBus = InMemoryEventBus<EventEnvelope<EmissionEvent>>;

pub type AppEmissionService =
    EmissionService<Arc<InMemoryEmissionRegistry>, Arc<InMemoryFiscalSource>, Arc<EmissionBus>>;

pub struct AppServices {
    pub emissions: AppEmissionService,
}

/// In-memory wiring (dev/test): registry + data source + bus, real provider client.
pub fn build_services(
    focus: FocusConfig,
    source: Arc<InMemoryFiscalSource>,
    config: EmissionServiceConfig,
) -> Result<AppServices, FocusError> {
    let client = FocusClient::new(focus)?;
    tracing::info!(environment = client.environment().as_str(), "Focus NFe client ready");

    let bus: Arc<EmissionBus> = Arc::new(InMemoryEventBus::new());
    spawn_event_logger(&bus);

    let emissions = EmissionService::new(
        Arc::new(InMemoryEmissionRegistry::new()),
        source,
        client,
        bus,
    )
    .with_config(config);

    Ok(AppServices { emissions })
}

/// Background subscriber: bus -> log. Stops once the bus is dropped.
fn spawn_event_logger(bus: &Arc<EmissionBus>) {
    let sub = bus.subscribe();
    let spawned = std::thread::Builder::new()
        .name("emission-events".to_string())
        .spawn(move || {
            while let Ok(env) = sub.recv() {
                tracing::info!(
                    tenant_id = %env.tenant_id(),
                    reference = %env.aggregate_id(),
                    sequence = env.sequence_number(),
                    event = env.payload().event_type(),
                    "emission event"
                );
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("event logger not started: {e}");
    }
}

/// Sales and company registrations to preload into the in-memory source.
///
/// The ERP's own registries feed the service in production; the standalone
/// binary reads them from a JSON file instead.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub emitters: Vec<TenantEmitter>,
    #[serde(default)]
    pub sales: Vec<Sale>,
}

#[derive(Debug, Deserialize)]
pub struct TenantEmitter {
    pub tenant_id: TenantId,
    pub emitter: Emitter,
}

impl SeedData {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading seed file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing seed file {}", path.display()))
    }

    pub fn into_source(self) -> InMemoryFiscalSource {
        let source = InMemoryFiscalSource::new();
        for entry in self.emitters {
            source.set_emitter(entry.tenant_id, entry.emitter);
        }
        for sale in self.sales {
            source.insert_sale(sale);
        }
        source
    }
}
