//! Default host generation
//!
//! Used when a client is built without an explicit host list. Each list puts
//! the DSN (read) or primary (write) host first and the three replicas after
//! it in shuffled order, so load spreads across replicas between clients.

use rand::seq::SliceRandom;
use rand::Rng;

use super::HostMode;

/// Read host for the places sub-service
pub const PLACES_DSN_HOST: &str = "places-dsn.algolia.net";

/// Replica hosts for the places sub-service
pub const PLACES_REPLICA_HOSTS: [&str; 3] = [
    "places-1.algolianet.com",
    "places-2.algolianet.com",
    "places-3.algolianet.com",
];

/// DSN read host for an application
#[must_use]
pub fn dsn_host(application_id: &str) -> String {
    format!("{application_id}-dsn.algolia.net")
}

/// Primary write host for an application
#[must_use]
pub fn primary_write_host(application_id: &str) -> String {
    format!("{application_id}.algolia.net")
}

/// The three replica hosts of an application, in canonical order
#[must_use]
pub fn replica_hosts(application_id: &str) -> [String; 3] {
    [1, 2, 3].map(|n| format!("{application_id}-{n}.algolianet.com"))
}

/// Default read hosts: DSN first, then shuffled replicas
pub fn read_hosts<R: Rng + ?Sized>(
    application_id: &str,
    mode: HostMode,
    rng: &mut R,
) -> Vec<String> {
    let (head, mut replicas) = match mode {
        HostMode::Standard => (
            dsn_host(application_id),
            replica_hosts(application_id).to_vec(),
        ),
        HostMode::Places => (
            PLACES_DSN_HOST.to_string(),
            PLACES_REPLICA_HOSTS.iter().map(|h| (*h).to_string()).collect(),
        ),
    };
    replicas.shuffle(rng);
    with_head(head, replicas)
}

/// Default write hosts: primary first, then shuffled replicas
///
/// Places mode only affects reads; writes always target the application.
pub fn write_hosts<R: Rng + ?Sized>(application_id: &str, rng: &mut R) -> Vec<String> {
    let mut replicas = replica_hosts(application_id).to_vec();
    replicas.shuffle(rng);
    with_head(primary_write_host(application_id), replicas)
}

fn with_head(head: String, rest: Vec<String>) -> Vec<String> {
    let mut hosts = Vec::with_capacity(rest.len() + 1);
    hosts.push(head);
    hosts.extend(rest);
    hosts
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn as_set(hosts: &[String]) -> HashSet<&str> {
        hosts.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_standard_read_hosts() {
        let mut rng = StdRng::seed_from_u64(7);
        let hosts = read_hosts("APPID", HostMode::Standard, &mut rng);

        assert_eq!(hosts.len(), 4);
        assert_eq!(hosts[0], "APPID-dsn.algolia.net");
        assert_eq!(
            as_set(&hosts[1..]),
            HashSet::from([
                "APPID-1.algolianet.com",
                "APPID-2.algolianet.com",
                "APPID-3.algolianet.com",
            ])
        );
    }

    #[test]
    fn test_places_read_hosts() {
        let mut rng = StdRng::seed_from_u64(7);
        let hosts = read_hosts("APPID", HostMode::Places, &mut rng);

        assert_eq!(hosts.len(), 4);
        assert_eq!(hosts[0], PLACES_DSN_HOST);
        assert_eq!(as_set(&hosts[1..]), HashSet::from(PLACES_REPLICA_HOSTS));
    }

    #[test]
    fn test_write_hosts() {
        let mut rng = StdRng::seed_from_u64(7);
        let hosts = write_hosts("APPID", &mut rng);

        assert_eq!(hosts.len(), 4);
        assert_eq!(hosts[0], "APPID.algolia.net");
        assert_eq!(
            as_set(&hosts[1..]),
            HashSet::from([
                "APPID-1.algolianet.com",
                "APPID-2.algolianet.com",
                "APPID-3.algolianet.com",
            ])
        );
    }

    #[test]
    fn test_replica_order_varies_but_set_does_not() {
        let orders: HashSet<Vec<String>> = (0..64)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                read_hosts("APPID", HostMode::Standard, &mut rng)
            })
            .inspect(|hosts| assert_eq!(hosts[0], "APPID-dsn.algolia.net"))
            .collect();

        // 64 seeds over 6 permutations; seeing only one would mean no shuffle
        assert!(orders.len() > 1);
        for hosts in &orders {
            assert_eq!(as_set(&hosts[1..]).len(), 3);
        }
    }

    #[test]
    fn test_same_seed_same_order() {
        let a = read_hosts("APPID", HostMode::Standard, &mut StdRng::seed_from_u64(42));
        let b = read_hosts("APPID", HostMode::Standard, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
