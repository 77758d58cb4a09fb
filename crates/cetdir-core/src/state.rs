//! Verification states and the enumerations a record is classified by.
//!
//! All enums use their Spanish snake_case names on the wire, which is what
//! the hosted database stores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a verifiable record.
///
/// `SinInvitacion` and `PendienteAprobacion` are the initial states, chosen
/// when the record is created. `Verificada` and `Rechazada` are terminal for
/// the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    /// Admin-created placeholder with no invitation sent yet.
    SinInvitacion,

    /// Self-service submission awaiting admin review.
    PendienteAprobacion,

    /// Invitation sent, not claimed yet.
    InvitacionEnviada,

    /// Approved or claimed.
    Verificada,

    /// Rejected by an admin.
    Rechazada,
}

impl VerificationState {
    /// All states, in lifecycle order.
    pub const ALL: [VerificationState; 5] = [
        VerificationState::SinInvitacion,
        VerificationState::PendienteAprobacion,
        VerificationState::InvitacionEnviada,
        VerificationState::Verificada,
        VerificationState::Rechazada,
    ];

    /// Returns the wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationState::SinInvitacion => "sin_invitacion",
            VerificationState::PendienteAprobacion => "pendiente_aprobacion",
            VerificationState::InvitacionEnviada => "invitacion_enviada",
            VerificationState::Verificada => "verificada",
            VerificationState::Rechazada => "rechazada",
        }
    }

    /// True for the states a record can be created in.
    pub fn is_initial(&self) -> bool {
        matches!(
            self,
            VerificationState::SinInvitacion | VerificationState::PendienteAprobacion
        )
    }

    /// True for `verificada` and `rechazada`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VerificationState::Verificada | VerificationState::Rechazada
        )
    }

    /// Whether the lifecycle has an edge from `self` to `next`.
    ///
    /// Self-loops exist for `invitacion_enviada` (resend) and `verificada`
    /// (claiming an organization that was approved with an invitation).
    /// Nothing leaves `rechazada`.
    pub fn can_transition_to(&self, next: VerificationState) -> bool {
        use VerificationState::*;

        matches!(
            (self, next),
            (SinInvitacion, InvitacionEnviada)
                | (SinInvitacion, Rechazada)
                | (PendienteAprobacion, Verificada)
                | (PendienteAprobacion, Rechazada)
                | (InvitacionEnviada, InvitacionEnviada)
                | (InvitacionEnviada, Verificada)
                | (InvitacionEnviada, Rechazada)
                | (Verificada, Verificada)
        )
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VerificationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VerificationState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("invalid verification state: {}", s))
    }
}

/// How a record entered the pending pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Self-service submission (category change request).
    CambioCategoria,

    /// Admin-created placeholder awaiting contact.
    InvitacionAdmin,
}

impl RequestKind {
    /// Returns the wire name of the request kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::CambioCategoria => "cambio_categoria",
            RequestKind::InvitacionAdmin => "invitacion_admin",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cambio_categoria" => Ok(RequestKind::CambioCategoria),
            "invitacion_admin" => Ok(RequestKind::InvitacionAdmin),
            _ => Err(format!("invalid request kind: {}", s)),
        }
    }
}

/// Directory entity a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// An individual profile.
    Persona,

    /// An institution or company.
    Organizacion,
}

impl EntityKind {
    /// Returns the wire name of the entity.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Persona => "persona",
            EntityKind::Organizacion => "organizacion",
        }
    }

    /// Parses `category` against the entity's taxonomy and returns its
    /// canonical wire name.
    ///
    /// Personas use [`PersonaCategory`], organizations [`OrganizationKind`].
    pub fn parse_category(&self, category: &str) -> Option<&'static str> {
        let category = category.trim();
        match self {
            EntityKind::Persona => category.parse::<PersonaCategory>().ok().map(|c| c.as_str()),
            EntityKind::Organizacion => {
                category.parse::<OrganizationKind>().ok().map(|k| k.as_str())
            }
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "persona" => Ok(EntityKind::Persona),
            "organizacion" => Ok(EntityKind::Organizacion),
            _ => Err(format!("invalid entity: {}", s)),
        }
    }
}

/// Main category of a persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaCategory {
    /// Current student.
    EstudianteCet,

    /// Alumnus.
    ExAlumnoCet,

    /// Faculty.
    DocenteCet,
}

impl PersonaCategory {
    /// Returns the wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaCategory::EstudianteCet => "estudiante_cet",
            PersonaCategory::ExAlumnoCet => "ex_alumno_cet",
            PersonaCategory::DocenteCet => "docente_cet",
        }
    }
}

impl FromStr for PersonaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "estudiante_cet" => Ok(PersonaCategory::EstudianteCet),
            "ex_alumno_cet" => Ok(PersonaCategory::ExAlumnoCet),
            "docente_cet" => Ok(PersonaCategory::DocenteCet),
            _ => Err(format!("invalid persona category: {}", s)),
        }
    }
}

/// Organization type taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationKind {
    Empresa,
    InstitucionEducativa,
    OrganismoPublico,
    Ong,
    Emprendimiento,
    Otro,
}

impl OrganizationKind {
    /// Returns the wire name of the organization type.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationKind::Empresa => "empresa",
            OrganizationKind::InstitucionEducativa => "institucion_educativa",
            OrganizationKind::OrganismoPublico => "organismo_publico",
            OrganizationKind::Ong => "ong",
            OrganizationKind::Emprendimiento => "emprendimiento",
            OrganizationKind::Otro => "otro",
        }
    }
}

impl FromStr for OrganizationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empresa" => Ok(OrganizationKind::Empresa),
            "institucion_educativa" => Ok(OrganizationKind::InstitucionEducativa),
            "organismo_publico" => Ok(OrganizationKind::OrganismoPublico),
            "ong" => Ok(OrganizationKind::Ong),
            "emprendimiento" => Ok(OrganizationKind::Emprendimiento),
            "otro" => Ok(OrganizationKind::Otro),
            _ => Err(format!("invalid organization type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_state_from_string() {
        for state in VerificationState::ALL {
            assert_eq!(state.as_str().parse::<VerificationState>(), Ok(state));
        }
        assert!("aprobada".parse::<VerificationState>().is_err());
    }

    #[test]
    fn test_should_serialize_state_with_wire_name() {
        let json = serde_json::to_string(&VerificationState::InvitacionEnviada).unwrap();
        assert_eq!(json, "\"invitacion_enviada\"");

        let kind: RequestKind = serde_json::from_str("\"cambio_categoria\"").unwrap();
        assert_eq!(kind, RequestKind::CambioCategoria);
    }

    #[test]
    fn test_terminal_states_have_no_way_back() {
        for next in VerificationState::ALL {
            assert!(!VerificationState::Rechazada.can_transition_to(next));
            assert!(!next.can_transition_to(VerificationState::SinInvitacion));
            assert!(!next.can_transition_to(VerificationState::PendienteAprobacion));
        }
        assert!(!VerificationState::Verificada.can_transition_to(VerificationState::Rechazada));
        assert!(
            !VerificationState::Verificada.can_transition_to(VerificationState::InvitacionEnviada)
        );
    }

    #[test]
    fn test_initial_and_terminal_are_disjoint() {
        for state in VerificationState::ALL {
            assert!(!(state.is_initial() && state.is_terminal()));
        }
        assert!(!VerificationState::InvitacionEnviada.is_initial());
        assert!(!VerificationState::InvitacionEnviada.is_terminal());
    }

    #[test]
    fn test_should_parse_category_per_entity() {
        assert_eq!(
            EntityKind::Persona.parse_category(" docente_cet "),
            Some("docente_cet")
        );
        assert_eq!(EntityKind::Persona.parse_category("empresa"), None);
        assert_eq!(
            EntityKind::Organizacion.parse_category("institucion_educativa"),
            Some("institucion_educativa")
        );
        assert_eq!(EntityKind::Organizacion.parse_category("estudiante_cet"), None);
        assert_eq!(EntityKind::Organizacion.parse_category(""), None);
    }

    #[test]
    fn test_should_display_entity() {
        assert_eq!(format!("{}", EntityKind::Organizacion), "organizacion");
        assert_eq!("persona".parse::<EntityKind>(), Ok(EntityKind::Persona));
    }
}
