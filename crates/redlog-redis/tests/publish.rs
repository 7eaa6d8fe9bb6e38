//! Publishing through pooled fake connections

use std::sync::Arc;
use std::thread;

use redlog_core::Message;
use redlog_redis::{
    Delivery, PoolError, PoolSet, PoolSettings, RandomSelector, SeededSelector, SinkError,
};
use redlog_testing::{MockBackend, SequenceSelector, mock_client, mock_pools};

fn batch(items: &[&str]) -> Vec<Message> {
    items.iter().map(|item| Message::from(*item)).collect()
}

#[test]
fn test_publish_pushes_in_order_and_flushes_once() {
    let (client, backends) = mock_client("logstash", 1);

    client.publish(&batch(&["test1", "test2"])).unwrap();

    let backend = &backends[0];
    assert_eq!(
        backend.delivered_payloads(),
        vec![b"test1".to_vec(), b"test2".to_vec()]
    );
    assert_eq!(backend.delivered_keys(), vec!["logstash", "logstash"]);
    assert_eq!(backend.flushes(), 1);
}

#[test]
fn test_rejected_message_abandons_batch_unflushed() {
    let (client, backends) = mock_client("logstash", 1);
    backends[0].reject_payload("failure");

    let err = client
        .publish(&batch(&["test1", "failure", "test2"]))
        .unwrap_err();

    match &err {
        SinkError::Send { key, preview, .. } => {
            assert_eq!(key, "logstash");
            assert_eq!(preview, "failure");
        }
        other => panic!("expected send error, got {other:?}"),
    }
    assert_eq!(err.delivery(), Delivery::Retry);
    assert_eq!(backends[0].pushed_payloads(), vec![b"test1".to_vec()]);
    assert!(backends[0].delivered_payloads().is_empty());
    assert_eq!(backends[0].flushes(), 0);
}

#[test]
fn test_failed_connection_is_not_reused() {
    let (client, backends) = mock_client("logstash", 1);
    backends[0].reject_payload("failure");

    assert!(client.publish(&batch(&["failure"])).is_err());
    assert_eq!(client.pools().pools()[0].idle_count(), 0);

    client.publish(&batch(&["ok"])).unwrap();
    assert_eq!(backends[0].dials(), 2);
    assert_eq!(backends[0].delivered_payloads(), vec![b"ok".to_vec()]);
}

#[test]
fn test_successful_publish_returns_connection_for_reuse() {
    let (client, backends) = mock_client("logstash", 1);

    client.publish(&batch(&["a"])).unwrap();
    client.publish(&batch(&["b"])).unwrap();

    assert_eq!(backends[0].dials(), 1);
    assert_eq!(backends[0].checks(), 1, "reuse must be health-checked");
    assert_eq!(client.pools().pools()[0].idle_count(), 1);
}

#[test]
fn test_flush_failure_is_reported() {
    let (client, backends) = mock_client("logstash", 1);
    backends[0].fail_flush(true);

    let err = client.publish(&batch(&["a", "b"])).unwrap_err();
    assert!(matches!(err, SinkError::Flush { count: 2, .. }));
    assert!(backends[0].delivered_payloads().is_empty());
}

#[test]
fn test_dial_failure_propagates() {
    let (client, backends) = mock_client("logstash", 1);
    backends[0].fail_dial(true);

    let err = client.publish(&batch(&["a"])).unwrap_err();
    assert!(matches!(err, SinkError::Connection(_)));
    assert_eq!(err.delivery(), Delivery::Retry);
}

#[test]
fn test_unhealthy_idle_connection_falls_back_to_dial() {
    let (client, backends) = mock_client("logstash", 1);
    client.publish(&batch(&["a"])).unwrap();

    backends[0].fail_check(true);
    client.publish(&batch(&["b"])).unwrap();

    assert_eq!(backends[0].dials(), 2);
    assert_eq!(
        backends[0].delivered_payloads(),
        vec![b"a".to_vec(), b"b".to_vec()]
    );
}

#[test]
fn test_selector_decides_target_endpoint() {
    let (pools, backends) = mock_pools(3, PoolSettings::default());
    let client = redlog_redis::RedisClient::with_pools("k", pools)
        .with_selector(Box::new(SequenceSelector::new(vec![2, 2, 0])));

    for payload in ["x", "y", "z"] {
        client.publish(&batch(&[payload])).unwrap();
    }

    assert_eq!(
        backends[2].delivered_payloads(),
        vec![b"x".to_vec(), b"y".to_vec()]
    );
    assert_eq!(backends[0].delivered_payloads(), vec![b"z".to_vec()]);
    assert!(backends[1].delivered_payloads().is_empty());
}

#[test]
fn test_out_of_range_selection_is_reported() {
    let (pools, _backends) = mock_pools(2, PoolSettings::default());
    let pools = pools.with_selector(Box::new(SequenceSelector::new(vec![5])));

    assert_eq!(
        pools.select().err(),
        Some(PoolError::Missing {
            index: 5,
            available: 2
        })
    );
}

#[test]
fn test_random_selection_is_roughly_uniform() {
    const POOLS: usize = 4;
    const TRIALS: usize = 40_000;

    for selector in [
        Box::new(RandomSelector) as Box<dyn redlog_redis::PoolSelector>,
        Box::new(SeededSelector::new(42)),
    ] {
        let (pools, _backends) = mock_pools(POOLS, PoolSettings::default());
        let pools = pools.with_selector(selector);

        let mut hits = [0usize; POOLS];
        for _ in 0..TRIALS {
            let chosen = pools.select().unwrap();
            let index = pools
                .pools()
                .iter()
                .position(|pool| std::ptr::eq(pool, chosen))
                .unwrap();
            hits[index] += 1;
        }

        let expected = TRIALS / POOLS;
        for count in hits {
            assert!(
                count.abs_diff(expected) < expected / 10,
                "selection skewed: {hits:?}"
            );
        }
    }
}

#[test]
fn test_shutdown_is_idempotent_and_fails_later_publishes() {
    let (client, backends) = mock_client("logstash", 2);
    client.publish(&batch(&["a"])).unwrap();

    client.shutdown();
    client.shutdown();

    for pool in client.pools().pools() {
        assert!(pool.is_closed());
        assert_eq!(pool.idle_count(), 0);
    }
    let err = client.publish(&batch(&["b"])).unwrap_err();
    assert!(matches!(err, SinkError::Pool(PoolError::Closed { .. })));
    assert_eq!(err.delivery(), Delivery::Drop);
    assert_eq!(backends.iter().map(MockBackend::flushes).sum::<usize>(), 1);
}

#[test]
fn test_empty_pool_set_fails_cleanly() {
    let (pools, _): (PoolSet<_>, _) = mock_pools(0, PoolSettings::default());
    let client = redlog_redis::RedisClient::with_pools("k", pools);

    let err = client.publish(&batch(&["a"])).unwrap_err();
    assert_eq!(err.to_string(), "pool is empty");
}

#[test]
fn test_concurrent_publishers_keep_batch_order() {
    let (client, backends) = mock_client("logstash", 1);
    let client = Arc::new(client);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for round in 0..25 {
                    let messages = vec![
                        Message::from(format!("{worker}-{round}-0")),
                        Message::from(format!("{worker}-{round}-1")),
                    ];
                    client.publish(&messages).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let delivered = backends[0].delivered_payloads();
    assert_eq!(delivered.len(), 200);
    // each batch lands contiguously and in order
    for pair in delivered.chunks(2) {
        let first = String::from_utf8_lossy(&pair[0]);
        let second = String::from_utf8_lossy(&pair[1]);
        let batch = first.strip_suffix("-0");
        assert!(batch.is_some(), "batch split apart: {first} {second}");
        assert_eq!(batch, second.strip_suffix("-1"));
    }
    assert!(client.pools().pools()[0].idle_count() <= 3);
}
