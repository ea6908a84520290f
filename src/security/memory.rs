//! In-memory [`SecretManager`] implementation.
//!
//! [`MemorySecretManager`] keeps master keys and issued tokens in process
//! memory. It stamps identifiers on creation, derives passwords with the
//! current master key, and rejects unknown, revoked and expired tokens. It
//! does not persist or renew tokens.

use crate::security::error::{SecretError, TokenError};
use crate::security::keygen::KeyGenerator;
use crate::security::manager::{SecretManager, TokenIdentifier};
use crate::security::password::{Password, create_password};
use crate::security::SecretKey;
use core::fmt;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

const IDENTIFIER_VERSION: u8 = 0;

// ============================================================================
// Clock
// ============================================================================

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync + 'static {
    /// Current time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// A manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `start_ms`.
    #[must_use]
    pub const fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ============================================================================
// DelegationIdentifier
// ============================================================================

/// Identifier issued by [`MemorySecretManager`].
///
/// Binary layout (big-endian):
///
/// ```text
/// [version: u8]
/// [kind_len: u32]  [kind: utf-8]
/// [owner_len: u32] [owner: utf-8]
/// [issue_date_ms: u64] [max_date_ms: u64] [sequence: u64] [master_key_id: u32]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegationIdentifier {
    kind: String,
    owner: String,
    issue_date_ms: u64,
    max_date_ms: u64,
    sequence: u64,
    master_key_id: u32,
}

impl DelegationIdentifier {
    /// Creates an unstamped identifier.
    #[must_use]
    pub fn new(kind: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            owner: owner.into(),
            issue_date_ms: 0,
            max_date_ms: 0,
            sequence: 0,
            master_key_id: 0,
        }
    }

    /// Sets the owner.
    pub fn set_owner(&mut self, owner: impl Into<String>) {
        self.owner = owner.into();
    }

    /// The token owner.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Issue time, milliseconds since the epoch.
    #[must_use]
    pub const fn issue_date_ms(&self) -> u64 {
        self.issue_date_ms
    }

    /// Expiry time, milliseconds since the epoch.
    #[must_use]
    pub const fn max_date_ms(&self) -> u64 {
        self.max_date_ms
    }

    /// Sequence number assigned at creation.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Id of the master key the password was derived with.
    #[must_use]
    pub const fn master_key_id(&self) -> u32 {
        self.master_key_id
    }

    /// Parses the binary layout produced by [`TokenIdentifier::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, TokenError> {
        let mut reader = Reader { data };
        let malformed = || TokenError::invalid("malformed delegation identifier");
        if reader.take(1).ok_or_else(malformed)? != [IDENTIFIER_VERSION] {
            return Err(TokenError::invalid("unknown delegation identifier version"));
        }
        let kind = reader.string().ok_or_else(malformed)?;
        let owner = reader.string().ok_or_else(malformed)?;
        let issue_date_ms = reader.u64().ok_or_else(malformed)?;
        let max_date_ms = reader.u64().ok_or_else(malformed)?;
        let sequence = reader.u64().ok_or_else(malformed)?;
        let master_key_id = reader.u32().ok_or_else(malformed)?;
        if !reader.data.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            kind,
            owner,
            issue_date_ms,
            max_date_ms,
            sequence,
            master_key_id,
        })
    }
}

impl TokenIdentifier for DelegationIdentifier {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(37 + self.kind.len() + self.owner.len());
        buf.push(IDENTIFIER_VERSION);
        for s in [&self.kind, &self.owner] {
            #[allow(clippy::cast_possible_truncation)]
            buf.extend_from_slice(&(s.len() as u32).to_be_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        buf.extend_from_slice(&self.issue_date_ms.to_be_bytes());
        buf.extend_from_slice(&self.max_date_ms.to_be_bytes());
        buf.extend_from_slice(&self.sequence.to_be_bytes());
        buf.extend_from_slice(&self.master_key_id.to_be_bytes());
        buf
    }
}

impl fmt::Display for DelegationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} owner={}, issueDate={}, maxDate={}, sequenceNumber={}, masterKeyId={}",
            self.kind,
            self.owner,
            self.issue_date_ms,
            self.max_date_ms,
            self.sequence,
            self.master_key_id
        )
    }
}

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.data.len() < n {
            return None;
        }
        let (head, rest) = self.data.split_at(n);
        self.data = rest;
        Some(head)
    }

    fn u32(&mut self) -> Option<u32> {
        Some(u32::from_be_bytes(self.take(4)?.try_into().ok()?))
    }

    fn u64(&mut self) -> Option<u64> {
        Some(u64::from_be_bytes(self.take(8)?.try_into().ok()?))
    }

    fn string(&mut self) -> Option<String> {
        let len = self.u32()? as usize;
        String::from_utf8(self.take(len)?.to_vec()).ok()
    }
}

// ============================================================================
// MemorySecretManager
// ============================================================================

/// Whether the manager is currently serving token reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ServingState {
    /// Serving reads and writes.
    #[default]
    Active,
    /// Not authoritative; clients should fail over.
    Standby,
    /// Temporarily unable to serve; clients should retry here.
    Recovering,
}

struct TokenRecord {
    password: Password,
    max_date_ms: u64,
    master_key_id: u32,
}

struct State {
    current_key_id: u32,
    master_keys: HashMap<u32, SecretKey>,
    tokens: HashMap<Vec<u8>, TokenRecord>,
    sequence: u64,
}

impl State {
    /// Drops master keys other than the current one that no unexpired token
    /// was derived with.
    fn retire_unused_keys(&mut self, now: u64) -> usize {
        let live: HashSet<u32> = self
            .tokens
            .values()
            .filter(|record| record.max_date_ms >= now)
            .map(|record| record.master_key_id)
            .collect();
        let current = self.current_key_id;
        let before = self.master_keys.len();
        self.master_keys
            .retain(|id, _| *id == current || live.contains(id));
        before - self.master_keys.len()
    }
}

/// In-memory secret manager for [`DelegationIdentifier`] tokens.
pub struct MemorySecretManager {
    kind: String,
    max_lifetime: Duration,
    keygen: KeyGenerator,
    clock: Arc<dyn Clock>,
    state: RwLock<State>,
    serving: RwLock<ServingState>,
}

impl MemorySecretManager {
    /// Creates a manager with OS entropy, the system clock and the
    /// process-wide [`SecretSettings`](crate::security::SecretSettings).
    pub fn new(kind: impl Into<String>, max_lifetime: Duration) -> Result<Self, SecretError> {
        Self::with_parts(kind, KeyGenerator::new(), max_lifetime, Arc::new(SystemClock))
    }

    /// Creates a manager from explicit parts and generates the first master key.
    pub fn with_parts(
        kind: impl Into<String>,
        keygen: KeyGenerator,
        max_lifetime: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SecretError> {
        let first = keygen.generate_key()?;
        let mut master_keys = HashMap::new();
        master_keys.insert(1, first);
        Ok(Self {
            kind: kind.into(),
            max_lifetime,
            keygen,
            clock,
            state: RwLock::new(State {
                current_key_id: 1,
                master_keys,
                tokens: HashMap::new(),
                sequence: 0,
            }),
            serving: RwLock::new(ServingState::Active),
        })
    }

    /// Generates a new master key and makes it current.
    ///
    /// Tokens issued under earlier keys stay valid until they expire. Earlier
    /// keys no live token references are retired.
    pub fn roll_master_key(&self) -> Result<u32, SecretError> {
        let key = self.generate_secret()?;
        let now = self.clock.now_ms();
        let mut state = self.state.write();
        let id = state
            .current_key_id
            .checked_add(1)
            .ok_or(SecretError::KeyIdsExhausted)?;
        state.master_keys.insert(id, key);
        state.current_key_id = id;
        let retired = state.retire_unused_keys(now);
        drop(state);
        info!(kind = %self.kind, key_id = id, retired, "rolled master key");
        Ok(id)
    }

    /// Id of the current master key.
    #[must_use]
    pub fn current_key_id(&self) -> u32 {
        self.state.read().current_key_id
    }

    /// Revokes an issued token.
    pub fn revoke(&self, identifier: &DelegationIdentifier) -> Result<(), TokenError> {
        let removed = self.state.write().tokens.remove(&identifier.to_bytes());
        if removed.is_none() {
            return Err(TokenError::invalid(format!(
                "token ({identifier}) can't be found in cache"
            )));
        }
        debug!(kind = %self.kind, sequence = identifier.sequence(), "revoked token");
        Ok(())
    }

    /// Drops expired tokens and the master keys only they referenced,
    /// returning how many tokens were removed.
    pub fn remove_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut state = self.state.write();
        let before = state.tokens.len();
        state.tokens.retain(|_, record| record.max_date_ms >= now);
        let removed = before - state.tokens.len();
        let retired = state.retire_unused_keys(now);
        drop(state);
        if removed > 0 || retired > 0 {
            debug!(kind = %self.kind, removed, retired, "removed expired tokens");
        }
        removed
    }

    /// Number of master keys held, the current one included.
    #[must_use]
    pub fn master_key_count(&self) -> usize {
        self.state.read().master_keys.len()
    }

    /// Number of tokens on record.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.state.read().tokens.len()
    }

    /// Current serving state.
    #[must_use]
    pub fn serving_state(&self) -> ServingState {
        *self.serving.read()
    }

    /// Changes the serving state.
    pub fn set_serving_state(&self, serving: ServingState) {
        *self.serving.write() = serving;
        info!(kind = %self.kind, ?serving, "serving state changed");
    }
}

impl SecretManager for MemorySecretManager {
    type Identifier = DelegationIdentifier;

    fn create_password(&self, identifier: &mut DelegationIdentifier) -> Result<Password, SecretError> {
        let now = self.clock.now_ms();
        let lifetime = u64::try_from(self.max_lifetime.as_millis()).unwrap_or(u64::MAX);
        let (key, key_id) = {
            let mut state = self.state.write();
            state.sequence += 1;
            identifier.sequence = state.sequence;
            identifier.master_key_id = state.current_key_id;
            let key = state
                .master_keys
                .get(&state.current_key_id)
                .cloned()
                .ok_or_else(|| SecretError::InvalidKey("no current master key".into()))?;
            (key, state.current_key_id)
        };
        identifier.issue_date_ms = now;
        identifier.max_date_ms = now.saturating_add(lifetime);

        let bytes = identifier.to_bytes();
        let password = create_password(&bytes, &key)?;
        self.state.write().tokens.insert(
            bytes,
            TokenRecord {
                password: password.clone(),
                max_date_ms: identifier.max_date_ms,
                master_key_id: key_id,
            },
        );
        debug!(kind = %self.kind, sequence = identifier.sequence, "issued token");
        Ok(password)
    }

    fn retrieve_password(&self, identifier: &DelegationIdentifier) -> Result<Password, TokenError> {
        let state = self.state.read();
        let record = state.tokens.get(&identifier.to_bytes()).ok_or_else(|| {
            TokenError::invalid(format!("token ({identifier}) can't be found in cache"))
        })?;
        let now = self.clock.now_ms();
        if record.max_date_ms < now {
            return Err(TokenError::invalid(format!(
                "token ({identifier}) is expired, current time: {now} expected renewal time: {}",
                record.max_date_ms
            )));
        }
        Ok(record.password.clone())
    }

    fn retriable_retrieve_password(
        &self,
        identifier: &DelegationIdentifier,
    ) -> Result<Password, TokenError> {
        match self.serving_state() {
            ServingState::Standby => Err(TokenError::standby(format!(
                "{} secret manager is in standby",
                self.kind
            ))),
            ServingState::Recovering => Err(TokenError::retriable(format!(
                "{} secret manager is recovering, retry later",
                self.kind
            ))),
            ServingState::Active => self.retrieve_password(identifier),
        }
    }

    fn create_identifier(&self) -> DelegationIdentifier {
        DelegationIdentifier::new(self.kind.clone(), "")
    }

    fn check_available_for_read(&self) -> Result<(), TokenError> {
        if self.serving_state() == ServingState::Standby {
            return Err(TokenError::standby(format!(
                "{} secret manager is in standby",
                self.kind
            )));
        }
        Ok(())
    }

    fn key_generator(&self) -> &KeyGenerator {
        &self.keygen
    }
}

impl fmt::Debug for MemorySecretManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySecretManager")
            .field("kind", &self.kind)
            .field("max_lifetime", &self.max_lifetime)
            .field("tokens", &self.token_count())
            .field("serving", &self.serving_state())
            .finish_non_exhaustive()
    }
}
