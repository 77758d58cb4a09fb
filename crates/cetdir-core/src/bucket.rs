//! Display buckets of the admin verification lists.
//!
//! Bucketing is a pure function of a record's request kind and state.

use crate::record::VerifiableRecord;
use crate::state::{RequestKind, VerificationState};
use serde::Serialize;
use std::fmt;

/// List a record is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    CambioCategoria,
    SinInvitar,
    SinReclamar,
    Rechazadas,
    Verificadas,
}

impl Bucket {
    /// All buckets, in display order.
    pub const ALL: [Bucket; 5] = [
        Bucket::CambioCategoria,
        Bucket::SinInvitar,
        Bucket::SinReclamar,
        Bucket::Rechazadas,
        Bucket::Verificadas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::CambioCategoria => "cambio_categoria",
            Bucket::SinInvitar => "sin_invitar",
            Bucket::SinReclamar => "sin_reclamar",
            Bucket::Rechazadas => "rechazadas",
            Bucket::Verificadas => "verificadas",
        }
    }

    /// Heading shown to admins.
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::CambioCategoria => "Solicitudes de cambio de categoría",
            Bucket::SinInvitar => "Sin invitar",
            Bucket::SinReclamar => "Invitados sin reclamar",
            Bucket::Rechazadas => "Rechazadas",
            Bucket::Verificadas => "Verificadas",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns the bucket of `record`, or `None` if its fields match no bucket.
///
/// Deletion is not considered here; see [`BucketedRecords::partition`].
pub fn bucket_of(record: &VerifiableRecord) -> Option<Bucket> {
    use RequestKind::*;
    use VerificationState::*;

    match (record.request_kind, record.state) {
        (_, Rechazada) => Some(Bucket::Rechazadas),
        (_, Verificada) => Some(Bucket::Verificadas),
        (CambioCategoria, PendienteAprobacion) => Some(Bucket::CambioCategoria),
        (InvitacionAdmin, SinInvitacion) => Some(Bucket::SinInvitar),
        (InvitacionAdmin, InvitacionEnviada) => Some(Bucket::SinReclamar),
        _ => None,
    }
}

/// Records of one entity split into buckets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BucketedRecords {
    pub cambio_categoria: Vec<VerifiableRecord>,
    pub sin_invitar: Vec<VerifiableRecord>,
    pub sin_reclamar: Vec<VerifiableRecord>,
    pub rechazadas: Vec<VerifiableRecord>,
    pub verificadas: Vec<VerifiableRecord>,

    /// Live records that match no bucket.
    pub unbucketed: usize,

    /// Soft-deleted records left out of every bucket.
    pub deleted: usize,
}

impl BucketedRecords {
    /// Splits `records`, keeping their relative order inside each bucket.
    pub fn partition(records: impl IntoIterator<Item = VerifiableRecord>) -> Self {
        let mut buckets = Self::default();

        for record in records {
            if record.is_deleted {
                buckets.deleted += 1;
                continue;
            }

            match bucket_of(&record) {
                Some(bucket) => buckets.slot_mut(bucket).push(record),
                None => {
                    tracing::warn!(
                        record = %record.id,
                        kind = %record.request_kind,
                        state = %record.state,
                        "record matches no verification bucket"
                    );
                    buckets.unbucketed += 1;
                }
            }
        }

        buckets
    }

    /// Records in `bucket`.
    pub fn get(&self, bucket: Bucket) -> &[VerifiableRecord] {
        match bucket {
            Bucket::CambioCategoria => &self.cambio_categoria,
            Bucket::SinInvitar => &self.sin_invitar,
            Bucket::SinReclamar => &self.sin_reclamar,
            Bucket::Rechazadas => &self.rechazadas,
            Bucket::Verificadas => &self.verificadas,
        }
    }

    /// Number of bucketed records.
    pub fn len(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.get(*b).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut(&mut self, bucket: Bucket) -> &mut Vec<VerifiableRecord> {
        match bucket {
            Bucket::CambioCategoria => &mut self.cambio_categoria,
            Bucket::SinInvitar => &mut self.sin_invitar,
            Bucket::SinReclamar => &mut self.sin_reclamar,
            Bucket::Rechazadas => &mut self.rechazadas,
            Bucket::Verificadas => &mut self.verificadas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AdminContext, NewRecord, RecordId};
    use crate::state::EntityKind;
    use chrono::Utc;

    fn record(kind: RequestKind, state: VerificationState) -> VerifiableRecord {
        let mut record = NewRecord::admin_placeholder(EntityKind::Persona, "Ana")
            .into_record(RecordId::new("p-1"), Utc::now());
        record.request_kind = kind;
        record.state = state;
        record
    }

    #[test]
    fn test_every_combination_lands_in_at_most_one_bucket() {
        for kind in [RequestKind::CambioCategoria, RequestKind::InvitacionAdmin] {
            for state in VerificationState::ALL {
                let rec = record(kind, state);
                let partitioned = BucketedRecords::partition([rec.clone()]);
                let hits = Bucket::ALL
                    .iter()
                    .filter(|b| !partitioned.get(**b).is_empty())
                    .count();

                assert_eq!(hits, usize::from(bucket_of(&rec).is_some()));
                assert_eq!(hits + partitioned.unbucketed, 1);
            }
        }
    }

    #[test]
    fn test_should_bucket_by_kind_and_state() {
        assert_eq!(
            bucket_of(&record(RequestKind::CambioCategoria, VerificationState::PendienteAprobacion)),
            Some(Bucket::CambioCategoria)
        );
        assert_eq!(
            bucket_of(&record(RequestKind::InvitacionAdmin, VerificationState::SinInvitacion)),
            Some(Bucket::SinInvitar)
        );
        assert_eq!(
            bucket_of(&record(RequestKind::InvitacionAdmin, VerificationState::InvitacionEnviada)),
            Some(Bucket::SinReclamar)
        );
        assert_eq!(
            bucket_of(&record(RequestKind::CambioCategoria, VerificationState::Rechazada)),
            Some(Bucket::Rechazadas)
        );
        assert_eq!(
            bucket_of(&record(RequestKind::InvitacionAdmin, VerificationState::Verificada)),
            Some(Bucket::Verificadas)
        );
    }

    #[test]
    fn test_inconsistent_record_is_counted_not_bucketed() {
        let partitioned = BucketedRecords::partition([record(
            RequestKind::CambioCategoria,
            VerificationState::InvitacionEnviada,
        )]);

        assert!(partitioned.is_empty());
        assert_eq!(partitioned.unbucketed, 1);
    }

    #[test]
    fn test_deleted_records_are_excluded() {
        let mut deleted = record(RequestKind::InvitacionAdmin, VerificationState::SinInvitacion);
        deleted.mark_deleted(&AdminContext::now("admin-1"));
        let live = record(RequestKind::InvitacionAdmin, VerificationState::SinInvitacion);

        let partitioned = BucketedRecords::partition([deleted, live]);

        assert_eq!(partitioned.sin_invitar.len(), 1);
        assert_eq!(partitioned.deleted, 1);
        assert_eq!(partitioned.len(), 1);
    }
}
