//! Candidate pools of plausible Chef-domain test data.

use std::fmt;

use rand::seq::IndexedRandom;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

use crate::Error;

const ORGANIZATIONS: [&str; 6] = [
    "4thcafe",
    "acme",
    "chef",
    "devops",
    "ponyville",
    "test-kitchen",
];
const SOURCE_FQDNS: [&str; 5] = [
    "chef-server.chef.internal",
    "chef-server-2.chef.internal",
    "automate.chef.internal",
    "ip-172-31-6-59.ec2.internal",
    "localhost",
];
const COOKBOOKS: [&str; 10] = [
    "apache2",
    "apt",
    "build-essential",
    "chef-client",
    "mysql",
    "nginx",
    "ntp",
    "openssh",
    "postgresql",
    "yum",
];
const ENTITY_NAMES: [&str; 8] = [
    "insights",
    "test",
    "dev-sec",
    "grimlock",
    "starscream",
    "jazz",
    "blaster",
    "perceptor",
];
const REQUESTOR_NAMES: [&str; 6] = [
    "mkrasnow",
    "afiune",
    "rainbowdash",
    "applejack",
    "pinkiepie",
    "kallistec",
];

/// Minutes in the trailing window `recent_timestamp` draws from.
const RECENT_WINDOW_MINUTES: i64 = 7 * 24 * 60;

/// The closed set of fact categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactKind {
    /// Organization names
    Organization,
    /// Service hostnames, the fqdn an event claims to originate from
    SourceFqdn,
    /// Cookbook identifiers
    Cookbook,
    /// Generic entity names
    EntityName,
    /// Requestor names
    RequestorName,
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FactKind::Organization => "organization",
            FactKind::SourceFqdn => "source_fqdn",
            FactKind::Cookbook => "cookbook",
            FactKind::EntityName => "entity_name",
            FactKind::RequestorName => "requestor_name",
        };
        write!(f, "{s}")
    }
}

/// Configuration of the candidate fact lists. Each list replaces the built-in
/// candidates wholesale when given.
#[derive(Debug, Deserialize, serde::Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Organization name candidates
    pub organizations: Vec<String>,
    /// Service hostname candidates
    pub source_fqdns: Vec<String>,
    /// Cookbook identifier candidates
    pub cookbooks: Vec<String>,
    /// Generic entity name candidates
    pub entity_names: Vec<String>,
    /// Requestor name candidates
    pub requestor_names: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(ToString::to_string).collect()
        }
        Self {
            organizations: owned(&ORGANIZATIONS),
            source_fqdns: owned(&SOURCE_FQDNS),
            cookbooks: owned(&COOKBOOKS),
            entity_names: owned(&ENTITY_NAMES),
            requestor_names: owned(&REQUESTOR_NAMES),
        }
    }
}

/// Validated candidate pools, one per [`FactKind`].
#[derive(Debug, Clone)]
pub struct FactPools {
    organizations: Vec<String>,
    source_fqdns: Vec<String>,
    cookbooks: Vec<String>,
    entity_names: Vec<String>,
    requestor_names: Vec<String>,
}

impl FactPools {
    /// Create a new [`FactPools`] from configuration.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::EmptyFacts`] if any candidate list is empty. This
    /// is checked here, once, so that `pick` cannot come up empty mid-run.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let pools = Self {
            organizations: config.organizations.clone(),
            source_fqdns: config.source_fqdns.clone(),
            cookbooks: config.cookbooks.clone(),
            entity_names: config.entity_names.clone(),
            requestor_names: config.requestor_names.clone(),
        };
        for kind in [
            FactKind::Organization,
            FactKind::SourceFqdn,
            FactKind::Cookbook,
            FactKind::EntityName,
            FactKind::RequestorName,
        ] {
            if pools.list(kind).is_empty() {
                return Err(Error::EmptyFacts(kind));
            }
        }
        Ok(pools)
    }

    fn list(&self, kind: FactKind) -> &[String] {
        match kind {
            FactKind::Organization => &self.organizations,
            FactKind::SourceFqdn => &self.source_fqdns,
            FactKind::Cookbook => &self.cookbooks,
            FactKind::EntityName => &self.entity_names,
            FactKind::RequestorName => &self.requestor_names,
        }
    }

    /// Uniformly choose one candidate from the named category.
    pub fn pick<R>(&self, kind: FactKind, rng: &mut R) -> &str
    where
        R: rand::Rng + ?Sized,
    {
        self.list(kind)
            .choose(rng)
            .expect("candidate lists validated non-empty at construction")
    }
}

/// A dotted three-component version, each component in 0..=8. Plausible
/// enough for fabricated cookbook versions, not a semver guarantee.
pub fn cookbook_version<R>(rng: &mut R) -> String
where
    R: rand::Rng + ?Sized,
{
    format!(
        "{}.{}.{}",
        rng.random_range(0..9),
        rng.random_range(0..9),
        rng.random_range(0..9)
    )
}

/// A timestamp drawn uniformly from the trailing seven days before `now`.
pub fn recent_timestamp<R>(now: OffsetDateTime, rng: &mut R) -> OffsetDateTime
where
    R: rand::Rng + ?Sized,
{
    now - Duration::minutes(rng.random_range(0..RECENT_WINDOW_MINUTES))
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use time::{Duration, OffsetDateTime};

    use super::{Config, FactKind, FactPools, cookbook_version, recent_timestamp};
    use crate::Error;

    #[test]
    fn empty_list_is_a_configuration_error() {
        let config = Config {
            organizations: Vec::new(),
            ..Config::default()
        };
        match FactPools::new(&config) {
            Err(Error::EmptyFacts(kind)) => assert_eq!(kind, FactKind::Organization),
            other => panic!("expected EmptyFacts, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn pick_draws_from_the_configured_list(seed: u64) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let config = Config::default();
            let pools = FactPools::new(&config).expect("default config must validate");

            let org = pools.pick(FactKind::Organization, &mut rng);
            prop_assert!(config.organizations.iter().any(|o| o.as_str() == org));
            let cookbook = pools.pick(FactKind::Cookbook, &mut rng);
            prop_assert!(config.cookbooks.iter().any(|c| c.as_str() == cookbook));
        }
    }

    proptest! {
        #[test]
        fn cookbook_version_is_three_dotted_digits(seed: u64) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let version = cookbook_version(&mut rng);

            let components: Vec<&str> = version.split('.').collect();
            prop_assert_eq!(components.len(), 3);
            for component in components {
                let n: u8 = component.parse().expect("component must be numeric");
                prop_assert!(n <= 8);
            }
        }
    }

    proptest! {
        #[test]
        fn recent_timestamp_lies_in_trailing_week(seed: u64) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let now = OffsetDateTime::now_utc();
            let ts = recent_timestamp(now, &mut rng);

            prop_assert!(ts <= now);
            prop_assert!(ts > now - Duration::days(7));
        }
    }
}
