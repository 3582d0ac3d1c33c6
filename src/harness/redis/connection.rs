use futures::FutureExt;
use redis::aio::{Connection, ConnectionLike, MultiplexedConnection};
use redis::{Cmd, Pipeline, RedisError, RedisFuture, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Slot holding the multiplexed connection shared by all users of a factory
pub(super) type SharedSlot = Arc<Mutex<Slot<MultiplexedConnection>>>;

/// Connection stored in a [`SharedSlot`], tagged with the generation it was stored under
///
/// Every replacement bumps the generation so that holders of an older clone can not
/// evict a connection that has been re-established in the meantime.
#[derive(Debug)]
pub(super) struct Slot<C> {
    generation: u64,
    current: Option<C>,
}

impl<C> Default for Slot<C> {
    fn default() -> Self {
        Self {
            generation: 0,
            current: None,
        }
    }
}

impl<C: Clone> Slot<C> {
    /// Clone of the stored connection and its generation
    pub(super) fn current(&self) -> Option<(u64, C)> {
        self.current
            .as_ref()
            .map(|con| (self.generation, con.clone()))
    }

    /// Stores a new connection and returns its generation
    pub(super) fn replace(&mut self, con: C) -> u64 {
        self.generation += 1;
        self.current = Some(con);
        self.generation
    }

    /// Empties the slot if it still holds the connection of the given generation
    pub(super) fn evict(&mut self, generation: u64) -> bool {
        if self.generation != generation || self.current.is_none() {
            return false;
        }

        self.current = None;
        true
    }
}

/// Clone of the shared multiplexed connection which remembers where it came from
pub struct SharedConnection {
    con: MultiplexedConnection,
    slot: SharedSlot,
    generation: u64,
}

impl SharedConnection {
    pub(super) fn new(con: MultiplexedConnection, slot: SharedSlot, generation: u64) -> Self {
        Self {
            con,
            slot,
            generation,
        }
    }
}

/// Connection handed out by the [`SharedRedisFactory`](super::SharedRedisFactory)
pub enum RedisConnection {
    /// Dedicated connection, suitable for blocking commands
    Owned(Connection),
    /// Clone of the shared connection which is evicted from its slot once it breaks
    Multiplexed(SharedConnection),
}

impl RedisConnection {
    async fn evict_if_disconnected(&mut self, error: &RedisError) {
        let disconnected = error.is_connection_dropped()
            || error.is_io_error()
            || error.is_connection_refusal()
            || error.is_timeout();

        if !disconnected {
            return;
        }

        if let RedisConnection::Multiplexed(shared) = self {
            let generation = shared.generation;

            if shared.slot.lock().await.evict(generation) {
                debug!(%error, generation, "Evicted broken shared redis connection");
            } else {
                trace!(%error, generation, "Shared redis connection already replaced");
            }
        }
    }
}

macro_rules! delegate {
    ($self:expr, $con:ident => $call:expr) => {
        match $self {
            RedisConnection::Owned($con) => $call,
            RedisConnection::Multiplexed(SharedConnection { con: $con, .. }) => $call,
        }
    };
}

impl ConnectionLike for RedisConnection {
    fn req_packed_command<'a>(&'a mut self, cmd: &'a Cmd) -> RedisFuture<'a, Value> {
        (async move {
            let result = delegate!(self, con => con.req_packed_command(cmd).await);

            match &result {
                Ok(value) => trace!(?value, "Redis RECV"),
                Err(error) => self.evict_if_disconnected(error).await,
            }

            result
        })
        .boxed()
    }

    fn req_packed_commands<'a>(
        &'a mut self,
        cmd: &'a Pipeline,
        offset: usize,
        count: usize,
    ) -> RedisFuture<'a, Vec<Value>> {
        (async move {
            let result =
                delegate!(self, con => con.req_packed_commands(cmd, offset, count).await);

            if let Err(error) = &result {
                self.evict_if_disconnected(error).await;
            }

            result
        })
        .boxed()
    }

    fn get_db(&self) -> i64 {
        delegate!(self, con => con.get_db())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn evict_the_current_connection() {
        let mut slot = Slot::default();
        let generation = slot.replace("first");

        assert!(slot.evict(generation));
        assert_eq!(slot.current(), None);
    }

    #[test]
    fn keep_connections_established_after_a_stale_clone() {
        let mut slot = Slot::default();
        let stale = slot.replace("first");
        assert!(slot.evict(stale));

        let fresh = slot.replace("second");

        assert!(!slot.evict(stale));
        assert_eq!(slot.current(), Some((fresh, "second")));
    }

    #[test]
    fn ignore_evictions_of_an_empty_slot() {
        let mut slot: Slot<&str> = Slot::default();
        assert!(!slot.evict(0));
    }
}
