//! `redlog check`

use redlog_core::PoolConfig;
use redlog_redis::RedisClient;
use tracing::{info, warn};

use crate::error::CliError;

pub fn run_check(config: &PoolConfig, connect: bool) -> Result<(), CliError> {
    println!("{config}");
    if !connect {
        return Ok(());
    }

    let client = RedisClient::initialize(config)?;
    let results = client.ping_all();
    client.shutdown();

    let total = results.len();
    let mut failed = 0;
    for (endpoint, result) in results {
        match result {
            Ok(()) => info!(endpoint = %endpoint, "Endpoint reachable"),
            Err(e) => {
                failed += 1;
                warn!(endpoint = %endpoint, error = %e, "Endpoint unreachable");
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Unreachable { failed, total });
    }
    Ok(())
}
