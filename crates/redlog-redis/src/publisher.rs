//! Pipelined batch publishing
//!
//! A batch is queued command by command on one connection and flushed once.
//! If any push is rejected the batch is abandoned before the flush, so the
//! backend sees either the whole batch or nothing from this attempt.

use redis::RedisResult;
use redlog_core::Message;
use tracing::{trace, warn};

use crate::error::{SinkError, SinkResult};

/// A connection that can buffer list pushes and send them in one go.
pub trait PushPipeline {
    /// Queue `RPUSH key payload` without waiting for a reply.
    fn push(&mut self, key: &str, payload: &[u8]) -> RedisResult<()>;

    /// Send every queued command and wait for the replies.
    fn flush(&mut self) -> RedisResult<()>;
}

/// Queue `messages` in order onto `conn` and flush them once.
///
/// Stops at the first rejected push without flushing and reports it as
/// [`SinkError::Send`] with a short preview of the offending payload.
pub fn send_batch<C>(conn: &mut C, key: &str, messages: &[Message]) -> SinkResult<()>
where
    C: PushPipeline + ?Sized,
{
    for message in messages {
        if let Err(source) = conn.push(key, message.as_bytes()) {
            let preview = message.preview();
            warn!(
                key,
                preview = %preview,
                error = %source,
                "Aborting batch before flush"
            );
            return Err(SinkError::Send {
                key: key.to_string(),
                preview,
                source,
            });
        }
    }

    conn.flush().map_err(|source| SinkError::Flush {
        key: key.to_string(),
        count: messages.len(),
        source,
    })?;

    trace!(key, batch_size = messages.len(), "Flushed batch");
    Ok(())
}
