use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fiscoerp_core::{AggregateId, TenantId};

use crate::event::Event;

/// What consumers receive: the event plus the stream it belongs to.
///
/// `sequence_number` is the record version after the transition, so a
/// consumer can drop anything at or below the last sequence it handled for
/// that `aggregate_id`. `event_type` and `occurred_at` are copied out of the
/// payload for routing without deserializing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    aggregate_type: String,
    sequence_number: u64,
    event_type: String,
    event_version: u32,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap `payload` with a fresh time-ordered event id.
    pub fn wrap(
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            tenant_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            event_type: payload.event_type().to_string(),
            event_version: payload.version(),
            occurred_at: payload.occurred_at(),
            payload,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Issued {
        at: DateTime<Utc>,
    }

    impl Event for Issued {
        fn event_type(&self) -> &'static str {
            "test.issued"
        }

        fn version(&self) -> u32 {
            2
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn wrap_copies_payload_metadata() {
        let at = Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap();
        let env =
            EventEnvelope::wrap(TenantId::new(), AggregateId::new(), "test", 3, Issued { at });

        assert_eq!(env.event_type(), "test.issued");
        assert_eq!(env.event_version(), 2);
        assert_eq!(env.occurred_at(), at);
        assert_eq!(env.sequence_number(), 3);
        assert_eq!(env.aggregate_type(), "test");
    }

    #[test]
    fn event_ids_are_unique() {
        let at = Utc::now();
        let tenant = TenantId::new();
        let id = AggregateId::new();
        let a = EventEnvelope::wrap(tenant, id, "test", 1, Issued { at });
        let b = EventEnvelope::wrap(tenant, id, "test", 2, Issued { at });
        assert_ne!(a.event_id(), b.event_id());
    }
}
