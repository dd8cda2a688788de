use std::{iter, time::Duration};

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::{debug, info};

use super::error::{MongoDaoError, MongoResult};

/// Pings sent before the league store gives up on a fresh connection.
const PING_ATTEMPTS: u32 = 10;
const FIRST_DELAY: Duration = Duration::from_millis(250);
const MAX_DELAY: Duration = Duration::from_secs(5);

/// Pauses between consecutive startup pings: doubling from `FIRST_DELAY`, capped at `MAX_DELAY`.
fn ping_backoff() -> impl Iterator<Item = Duration> {
    iter::successors(Some(FIRST_DELAY), |delay| Some((*delay * 2).min(MAX_DELAY)))
        .take(PING_ATTEMPTS as usize - 1)
}

/// Open the league database and wait until the server answers a ping.
///
/// The storage supervisor keeps the service degraded while this is retrying, so a slow
/// replica set only delays writes instead of failing startup.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    let mut delays = ping_backoff();
    let mut attempts = 0;
    loop {
        attempts += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => break,
            Err(source) => match delays.next() {
                Some(delay) => {
                    debug!(
                        database = database_name,
                        attempts,
                        error = %source,
                        "league database did not answer ping"
                    );
                    sleep(delay).await;
                }
                None => return Err(MongoDaoError::InitialPing { attempts, source }),
            },
        }
    }

    info!(database = database_name, attempts, "connected to MongoDB league store");
    Ok((client, database))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let delays: Vec<u64> = ping_backoff().map(|delay| delay.as_millis() as u64).collect();
        assert_eq!(delays, vec![250, 500, 1000, 2000, 4000, 5000, 5000, 5000, 5000]);
        assert_eq!(delays.len() as u32, PING_ATTEMPTS - 1);
    }
}
