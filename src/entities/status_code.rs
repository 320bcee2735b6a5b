//! Key placement status codes.
//!
//! Codes are stored as short strings in `status.status_cd`. INITIAL, AUTHFAIL
//! and KEYAUTHFAIL are pending: they are offered again by the next-pending
//! poll until overwritten.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of placing a user's public key on a host system.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum StatusCode {
    /// Seeded by a batch start, no attempt yet
    #[sea_orm(string_value = "INITIAL")]
    Initial,
    /// Password or key authentication against the host failed
    #[sea_orm(string_value = "AUTHFAIL")]
    AuthFail,
    /// The user's public key was rejected or malformed
    #[sea_orm(string_value = "KEYAUTHFAIL")]
    PublicKeyFail,
    /// Claimed by a poller, outcome not yet written
    #[sea_orm(string_value = "INPROGRESS")]
    InProgress,
    /// Unclassified failure
    #[sea_orm(string_value = "GENERICFAIL")]
    GenericFail,
    /// The host could not be reached
    #[sea_orm(string_value = "HOSTFAIL")]
    HostFail,
    /// Key placed
    #[sea_orm(string_value = "SUCCESS")]
    Success,
}

impl StatusCode {
    /// Codes the next-pending poll picks up, in no particular order.
    pub const PENDING: [Self; 3] = [Self::Initial, Self::AuthFail, Self::PublicKeyFail];

    /// Whether this host should be offered again by the next-pending poll.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Initial | Self::AuthFail | Self::PublicKeyFail)
    }

    /// Whether no further attempt is expected for this host.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !self.is_pending() && !matches!(self, Self::InProgress)
    }

    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::AuthFail => "AUTHFAIL",
            Self::PublicKeyFail => "KEYAUTHFAIL",
            Self::InProgress => "INPROGRESS",
            Self::GenericFail => "GENERICFAIL",
            Self::HostFail => "HOSTFAIL",
            Self::Success => "SUCCESS",
        }
    }
}
