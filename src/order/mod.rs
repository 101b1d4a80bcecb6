//! Pending orders and the collect responses still to be handed out for them.
//!
//! Each order lives in the bucket of the call that created it (auth or sign) and holds
//! the queue of responses that successive `collect` calls return. An order disappears
//! when its queue runs dry, when it is cancelled, when it is older than the configured
//! time to live, or when its bucket is full and it is the least recently stored order.

mod clock;

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use strum_macros::{AsRefStr, Display};

use crate::{
    definitions::{CollectResponse, OrderRef},
    signature::random::{OsRandom, RandomSource},
};

pub use clock::{Clock, ManualClock, SystemClock};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Bucket {
    Auth,
    Sign,
}

impl Bucket {
    fn other(self) -> Self {
        match self {
            Bucket::Auth => Bucket::Sign,
            Bucket::Sign => Bucket::Auth,
        }
    }
}

#[derive(Debug)]
struct Entry {
    outcomes: VecDeque<CollectResponse>,
    stored_at: Instant,
    sequence: u64,
}

pub struct OrderStore {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    ttl: Duration,
    max_entries: usize,
    auth: HashMap<OrderRef, Entry>,
    sign: HashMap<OrderRef, Entry>,
    next_sequence: u64,
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .field("auth", &self.auth.len())
            .field("sign", &self.sign.len())
            .finish()
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl OrderStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            clock,
            random: Arc::new(OsRandom),
            ttl,
            max_entries: max_entries.max(1),
            auth: HashMap::new(),
            sign: HashMap::new(),
            next_sequence: 0,
        }
    }

    /// Use `random` for new order references.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    fn bucket(&self, bucket: Bucket) -> &HashMap<OrderRef, Entry> {
        match bucket {
            Bucket::Auth => &self.auth,
            Bucket::Sign => &self.sign,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut HashMap<OrderRef, Entry> {
        match bucket {
            Bucket::Auth => &mut self.auth,
            Bucket::Sign => &mut self.sign,
        }
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) >= self.ttl
    }

    /// A fresh order reference, unused by any live order.
    pub fn create(&self) -> OrderRef {
        loop {
            let order_ref = self.random.uuid().to_string();
            if !self.auth.contains_key(&order_ref) && !self.sign.contains_key(&order_ref) {
                return order_ref;
            }
        }
    }

    /// Store `outcomes` as the collect responses for `order_ref`, replacing any earlier
    /// queue and moving the order into `bucket`.
    ///
    /// An empty `outcomes` just removes the order.
    pub fn enqueue(
        &mut self,
        bucket: Bucket,
        order_ref: OrderRef,
        outcomes: impl IntoIterator<Item = CollectResponse>,
    ) {
        let outcomes: VecDeque<CollectResponse> = outcomes.into_iter().collect();
        self.bucket_mut(bucket.other()).remove(&order_ref);
        if outcomes.is_empty() {
            self.bucket_mut(bucket).remove(&order_ref);
            return;
        }

        let now = self.clock.now();
        self.purge_expired(bucket, now);

        let max_entries = self.max_entries;
        let entries = self.bucket_mut(bucket);
        if !entries.contains_key(&order_ref) && entries.len() >= max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.sequence)
                .map(|(order_ref, _)| order_ref.clone());
            if let Some(oldest) = oldest {
                tracing::debug!("{bucket} orders are full, evicting {oldest}");
                entries.remove(&oldest);
            }
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.bucket_mut(bucket).insert(
            order_ref,
            Entry {
                outcomes,
                stored_at: now,
                sequence,
            },
        );
    }

    /// Return the next collect response for `order_ref` and drop it from the queue.
    ///
    /// Auth orders are searched before sign orders. The order is removed once its last
    /// response has been returned.
    pub fn peek_and_advance(&mut self, order_ref: &str) -> Option<CollectResponse> {
        let now = self.clock.now();
        for bucket in [Bucket::Auth, Bucket::Sign] {
            let Some(expired) = self
                .bucket(bucket)
                .get(order_ref)
                .map(|entry| self.is_expired(entry, now))
            else {
                continue;
            };

            let entries = self.bucket_mut(bucket);
            if expired {
                entries.remove(order_ref);
                continue;
            }

            let entry = entries.get_mut(order_ref)?;
            let head = entry.outcomes.pop_front();
            if entry.outcomes.is_empty() {
                entries.remove(order_ref);
            }
            if head.is_some() {
                return head;
            }
        }
        None
    }

    /// Remove `order_ref` from whichever bucket holds it. Returns whether a live order was
    /// removed.
    pub fn cancel(&mut self, order_ref: &str) -> bool {
        let now = self.clock.now();
        let mut cancelled = false;
        for bucket in [Bucket::Auth, Bucket::Sign] {
            let ttl = self.ttl;
            if let Some(entry) = self.bucket_mut(bucket).remove(order_ref) {
                cancelled |= now.saturating_duration_since(entry.stored_at) < ttl;
            }
        }
        cancelled
    }

    pub fn contains(&self, order_ref: &str) -> bool {
        self.bucket_of(order_ref).is_some()
    }

    /// The bucket holding a live order for `order_ref`.
    pub fn bucket_of(&self, order_ref: &str) -> Option<Bucket> {
        let now = self.clock.now();
        [Bucket::Auth, Bucket::Sign].into_iter().find(|bucket| {
            self.bucket(*bucket)
                .get(order_ref)
                .is_some_and(|entry| !self.is_expired(entry, now))
        })
    }

    /// Number of live orders in `bucket`.
    pub fn len(&self, bucket: Bucket) -> usize {
        let now = self.clock.now();
        self.bucket(bucket)
            .values()
            .filter(|entry| !self.is_expired(entry, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len(Bucket::Auth) == 0 && self.len(Bucket::Sign) == 0
    }

    fn purge_expired(&mut self, bucket: Bucket, now: Instant) {
        let ttl = self.ttl;
        self.bucket_mut(bucket)
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
    }
}
