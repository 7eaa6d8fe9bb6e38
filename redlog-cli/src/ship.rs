//! `redlog ship`: read JSON lines, batch them, publish

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use redlog_core::{Message, Record};
use redlog_redis::{ConnectionManager, Delivery, PushPipeline, RedisClient};
use tracing::warn;

use crate::error::CliError;

#[derive(Debug, Clone)]
pub struct ShipOptions {
    pub tag: String,
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShipReport {
    pub published: usize,
    pub batches: usize,
    /// Lines that were not JSON objects
    pub skipped: usize,
}

pub fn ship<M, R>(
    client: &RedisClient<M>,
    input: R,
    options: &ShipOptions,
) -> Result<ShipReport, CliError>
where
    M: ConnectionManager,
    M::Connection: PushPipeline,
    R: BufRead,
{
    let mut report = ShipReport::default();
    let mut pending: Vec<Message> = Vec::with_capacity(options.batch_size);

    for (number, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = Record::from_json_line(Utc::now(), &options.tag, &line);
        match record.and_then(|record| record.to_message()) {
            Ok(message) => pending.push(message),
            Err(e) => {
                report.skipped += 1;
                warn!(line = number + 1, error = %e, "Skipping record");
                continue;
            }
        }

        if pending.len() >= options.batch_size {
            publish_with_retry(client, &pending, report.batches, options)?;
            report.published += pending.len();
            report.batches += 1;
            pending.clear();
        }
    }

    if !pending.is_empty() {
        publish_with_retry(client, &pending, report.batches, options)?;
        report.published += pending.len();
        report.batches += 1;
    }

    Ok(report)
}

fn publish_with_retry<M>(
    client: &RedisClient<M>,
    batch: &[Message],
    index: usize,
    options: &ShipOptions,
) -> Result<(), CliError>
where
    M: ConnectionManager,
    M::Connection: PushPipeline,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let error = match client.publish(batch) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        if error.delivery() == Delivery::Drop || attempt > options.max_retries {
            return Err(CliError::Publish {
                batch: index,
                attempts: attempt,
                source: error,
            });
        }

        let factor = 1u32 << (attempt - 1).min(16);
        let delay = options.retry_delay.saturating_mul(factor);
        warn!(
            batch = index,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "Retrying batch"
        );
        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redlog_testing::mock_client;
    use std::io::{Cursor, Write};

    fn options(batch_size: usize, max_retries: u32) -> ShipOptions {
        ShipOptions {
            tag: "app".to_string(),
            batch_size,
            max_retries,
            retry_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_ships_lines_in_batches() {
        let (client, backends) = mock_client("logstash", 1);
        let input = Cursor::new("{\"n\":1}\n{\"n\":2}\n\n{\"n\":3}\n");

        let report = ship(&client, input, &options(2, 0)).unwrap();

        assert_eq!(
            report,
            ShipReport {
                published: 3,
                batches: 2,
                skipped: 0
            }
        );
        assert_eq!(backends[0].flushes(), 2);
        let delivered = backends[0].delivered_payloads();
        let first: serde_json::Value = serde_json::from_slice(&delivered[0]).unwrap();
        assert_eq!(first["n"], 1);
        assert_eq!(first["@tag"], "app");
        assert!(first["@timestamp"].is_string());
    }

    #[test]
    fn test_skips_malformed_lines() {
        let (client, backends) = mock_client("logstash", 1);
        let input = Cursor::new("not json\n[1]\n{\"ok\":true}\n");

        let report = ship(&client, input, &options(10, 0)).unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(report.published, 1);
        assert_eq!(backends[0].delivered_payloads().len(), 1);
    }

    #[test]
    fn test_gives_up_after_retries() {
        let (client, backends) = mock_client("logstash", 1);
        backends[0].fail_flush(true);

        let err = ship(&client, Cursor::new("{\"a\":1}\n"), &options(1, 2)).unwrap_err();

        assert!(matches!(
            err,
            CliError::Publish {
                batch: 0,
                attempts: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_does_not_retry_closed_client() {
        let (client, _backends) = mock_client("logstash", 1);
        client.shutdown();

        let err = ship(&client, Cursor::new("{\"a\":1}\n"), &options(1, 5)).unwrap_err();

        assert!(matches!(err, CliError::Publish { attempts: 1, .. }));
    }

    #[test]
    fn test_reads_from_file() {
        let (client, backends) = mock_client("logstash", 1);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"msg\":\"from file\"}}").unwrap();

        let reader = std::io::BufReader::new(file.reopen().unwrap());
        ship(&client, reader, &options(100, 0)).unwrap();

        let payload = &backends[0].delivered_payloads()[0];
        assert!(String::from_utf8_lossy(payload).contains("from file"));
    }
}
