//! Chef action payload.
//!
//! One `ActionEvent` models a single life-cycle change — create, update,
//! delete — applied to a Chef Server object, in the shape the Automate
//! data-collector ingests as message type "action".

use std::fmt;

use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error, Generator,
    facts::{self, FactKind, FactPools},
};

/// Wire schema message type for every event produced here.
pub const MESSAGE_TYPE: &str = "action";
/// Wire schema version for every event produced here.
pub const MESSAGE_VERSION: &str = "0.1.0";
/// Requestor type reported for fabricated events.
pub const REQUESTOR_TYPE: &str = "chef-load";
/// User agent reported for fabricated events.
pub const USER_AGENT: &str = "chef-load-4.0.0";
/// Baseline organization before randomization applies.
pub const DEFAULT_ORGANIZATION: &str = "_default";
/// Parent type carried by every policy event.
pub const POLICY_PARENT_TYPE: &str = "policy_group";

/// The kind of Chef Server object an event describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A node
    #[default]
    Node,
    /// A cookbook
    Cookbook,
    /// A data bag
    DataBag,
    /// An environment
    Environment,
    /// A role
    Role,
    /// A policy
    Policy,
    /// A group
    Group,
    /// An organization
    Organization,
    /// A permission, always nested under a group
    Permission,
    /// A user
    User,
    /// A data bag item, nested under its data bag
    DataBagItem,
    /// A cookbook version, nested under its cookbook
    CookbookVersion,
    /// An API client
    Client,
}

impl EntityKind {
    /// Every supported kind. Selection and test iteration both index this.
    pub const ALL: [EntityKind; 13] = [
        EntityKind::Node,
        EntityKind::Cookbook,
        EntityKind::DataBag,
        EntityKind::Environment,
        EntityKind::Role,
        EntityKind::Policy,
        EntityKind::Group,
        EntityKind::Organization,
        EntityKind::Permission,
        EntityKind::User,
        EntityKind::DataBagItem,
        EntityKind::CookbookVersion,
        EntityKind::Client,
    ];

    /// The canonical wire string for this kind. Strings follow the Chef
    /// Server actions feed, so nested kinds read shorter than their Rust
    /// names: a data bag is a `bag`, its items are `item`s, a cookbook
    /// version is a `version`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Cookbook => "cookbook",
            EntityKind::DataBag => "bag",
            EntityKind::Environment => "environment",
            EntityKind::Role => "role",
            EntityKind::Policy => "policy",
            EntityKind::Group => "group",
            EntityKind::Organization => "organization",
            EntityKind::Permission => "permission",
            EntityKind::User => "user",
            EntityKind::DataBagItem => "item",
            EntityKind::CookbookVersion => "version",
            EntityKind::Client => "client",
        }
    }
}

impl Distribution<EntityKind> for StandardUniform {
    fn sample<R>(&self, rng: &mut R) -> EntityKind
    where
        R: Rng + ?Sized,
    {
        EntityKind::ALL[rng.random_range(0..EntityKind::ALL.len())]
    }
}

/// The life-cycle action applied to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Entity was created
    Create,
    /// Entity was updated
    Update,
    /// Entity was deleted
    Delete,
}

impl TaskKind {
    /// Every supported task.
    pub const ALL: [TaskKind; 3] = [TaskKind::Create, TaskKind::Update, TaskKind::Delete];

    /// The canonical wire string for this task.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Create => "create",
            TaskKind::Update => "update",
            TaskKind::Delete => "delete",
        }
    }
}

impl Distribution<TaskKind> for StandardUniform {
    fn sample<R>(&self, rng: &mut R) -> TaskKind
    where
        R: Rng + ?Sized,
    {
        TaskKind::ALL[rng.random_range(0..TaskKind::ALL.len())]
    }
}

/// One fabricated change-event, fully populated by [`ChefAction`] before it
/// is handed off for transmission and never mutated after.
#[derive(Debug, Deserialize, serde::Serialize, Clone, PartialEq)]
pub struct ActionEvent {
    /// Unique identity of this event
    pub id: uuid::Uuid,
    /// Always [`MESSAGE_TYPE`]
    pub message_type: String,
    /// Always [`MESSAGE_VERSION`]
    pub message_version: String,
    /// Canonical string of `kind`
    pub entity_type: String,
    /// The kind this event describes. Internal classification, not part of
    /// the wire schema.
    #[serde(skip)]
    pub kind: EntityKind,
    /// Name of the entity acted upon
    pub entity_name: String,
    /// Kind of the logical container, empty when the entity is not nested
    pub parent_type: String,
    /// Name of the logical container, empty when the entity is not nested
    pub parent_name: String,
    /// Canonical task string
    pub task: String,
    /// Containing organization. Empty for organization events, which
    /// describe the organization itself.
    pub organization_name: String,
    /// Hostname of the service that recorded the event
    pub service_hostname: String,
    /// When the change was recorded, within the trailing week
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
    /// Hostname the request originated from
    pub remote_hostname: String,
    /// Server-side request id
    pub request_id: String,
    /// Who performed the change
    pub requestor_name: String,
    /// Always [`REQUESTOR_TYPE`]
    pub requestor_type: String,
    /// Always [`USER_AGENT`]
    pub user_agent: String,
    /// Upstream request id, omitted from the wire when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote_request_id: String,
    /// Opaque event body
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl ActionEvent {
    /// An event of the given kind with every field at its default.
    fn defaulted<R>(kind: EntityKind, now: OffsetDateTime, rng: &mut R) -> Self
    where
        R: rand::Rng + ?Sized,
    {
        // v4 uuid built from the threaded rng so a seeded run reproduces
        // identities.
        let id = uuid::Builder::from_random_bytes(rng.random::<[u8; 16]>()).into_uuid();
        Self {
            id,
            message_type: MESSAGE_TYPE.to_string(),
            message_version: MESSAGE_VERSION.to_string(),
            entity_type: kind.as_str().to_string(),
            kind,
            entity_name: String::new(),
            parent_type: String::new(),
            parent_name: String::new(),
            task: String::new(),
            organization_name: DEFAULT_ORGANIZATION.to_string(),
            service_hostname: String::new(),
            recorded_at: now,
            remote_hostname: String::new(),
            request_id: String::new(),
            requestor_name: String::new(),
            requestor_type: REQUESTOR_TYPE.to_string(),
            user_agent: USER_AGENT.to_string(),
            remote_request_id: String::new(),
            data: serde_json::Map::new(),
        }
    }
}

impl fmt::Display for ActionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.entity_type, self.task)
    }
}

/// Chef action payload generator.
#[derive(Debug, Clone)]
pub struct ChefAction {
    pools: FactPools,
    randomize: bool,
}

impl ChefAction {
    /// Create a new instance of `ChefAction`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::EmptyFacts`] if any configured candidate list is
    /// empty.
    pub fn new(facts: &facts::Config, randomize: bool) -> Result<Self, Error> {
        Ok(Self {
            pools: FactPools::new(facts)?,
            randomize,
        })
    }

    /// Build one event of the given kind, recorded relative to `now`.
    ///
    /// Defaults are applied first, then the common randomization, then the
    /// per-kind overrides. When randomization is off only the defaults and
    /// the kind classification are set.
    pub fn build<R>(&self, kind: EntityKind, now: OffsetDateTime, rng: &mut R) -> ActionEvent
    where
        R: rand::Rng + ?Sized,
    {
        let mut event = ActionEvent::defaulted(kind, now, rng);
        if !self.randomize {
            return event;
        }

        event.task = rng.random::<TaskKind>().as_str().to_string();
        event.entity_name = self.pools.pick(FactKind::EntityName, rng).to_string();
        event.requestor_name = self.pools.pick(FactKind::RequestorName, rng).to_string();
        event.service_hostname = self.pools.pick(FactKind::SourceFqdn, rng).to_string();
        event.organization_name = self.pools.pick(FactKind::Organization, rng).to_string();
        event.recorded_at = facts::recent_timestamp(now, rng);

        match kind {
            EntityKind::Cookbook => {
                event.entity_name = self.pools.pick(FactKind::Cookbook, rng).to_string();
            }
            EntityKind::Policy => {
                // Every policy lives in a policy group.
                event.parent_type = POLICY_PARENT_TYPE.to_string();
                event.parent_name = self.pools.pick(FactKind::EntityName, rng).to_string();
            }
            EntityKind::Organization => {
                // The event describes the organization itself, so the
                // containing-organization field does not apply.
                event.organization_name.clear();
                event.entity_name = self.pools.pick(FactKind::Organization, rng).to_string();
            }
            EntityKind::Permission => {
                event.parent_type = EntityKind::Group.as_str().to_string();
                event.parent_name = self.pools.pick(FactKind::EntityName, rng).to_string();
            }
            EntityKind::CookbookVersion => {
                event.parent_type = EntityKind::Cookbook.as_str().to_string();
                event.parent_name = self.pools.pick(FactKind::Cookbook, rng).to_string();
                event.entity_name = facts::cookbook_version(rng);
            }
            EntityKind::DataBagItem => {
                event.parent_type = EntityKind::DataBag.as_str().to_string();
                event.parent_name = self.pools.pick(FactKind::EntityName, rng).to_string();
            }
            EntityKind::Node
            | EntityKind::DataBag
            | EntityKind::Environment
            | EntityKind::Role
            | EntityKind::Group
            | EntityKind::User
            | EntityKind::Client => {}
        }

        event
    }
}

impl<'a> Generator<'a> for ChefAction {
    type Output = ActionEvent;
    type Error = Error;

    fn generate<R>(&'a self, rng: &mut R) -> Result<Self::Output, Error>
    where
        R: rand::Rng + ?Sized,
    {
        let kind = if self.randomize {
            rng.random::<EntityKind>()
        } else {
            EntityKind::Node
        };
        Ok(self.build(kind, OffsetDateTime::now_utc(), rng))
    }
}
