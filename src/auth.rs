use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use crate::{
    access::Tier,
    error::{JournalError, Result},
};

pub(crate) const SESSION_TIMEOUT_MINUTES: i64 = 5;

const BCRYPT_PREFIX: &str = "$2b$";

/// `stored` is either a bcrypt hash or, failing the prefix check, a plaintext
/// secret. An empty `stored` never matches.
pub(crate) fn check_password(input: &str, stored: &str) -> bool {
    if stored.is_empty() {
        return false;
    }
    if stored.starts_with(BCRYPT_PREFIX) {
        match bcrypt::verify(input, stored) {
            Ok(ok) => ok,
            Err(e) => {
                warn!("stored bcrypt hash is unusable: {e}");
                false
            }
        }
    } else {
        input == stored
    }
}

pub(crate) fn is_expired(since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - since > Duration::minutes(SESSION_TIMEOUT_MINUTES)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum Session {
    #[default]
    Anonymous,
    Authenticated { tier: Tier, since: DateTime<Utc> },
}

impl Session {
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { tier, .. } => Some(*tier),
        }
    }

    pub fn logout(&mut self) {
        *self = Session::Anonymous;
    }

    /// Drops an expired session. Returns whether it did.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        match *self {
            Session::Authenticated { since, tier } if is_expired(since, now) => {
                info!("{tier} session expired");
                self.logout();
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Identity {
    pub id: String,
    pub secret: String,
}

/// The two accounts this journal knows.
#[derive(Debug, Clone)]
pub(crate) struct AuthGate {
    pub admin: Identity,
    pub work: Identity,
}

impl AuthGate {
    pub fn login(&self, id: &str, password: &str, now: DateTime<Utc>) -> Result<Session> {
        let candidates = [(&self.admin, Tier::Admin), (&self.work, Tier::Work)];
        for (identity, tier) in candidates {
            if id == identity.id && check_password(password, &identity.secret) {
                info!("{tier} logged in");
                return Ok(Session::Authenticated { tier, since: now });
            }
        }
        warn!("failed login attempt");
        Err(JournalError::Auth)
    }
}
