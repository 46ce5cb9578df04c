//! The top-level [`Armory`] handle.
//!
//! `Armory` owns the backend and wires the catalog, the relation write path,
//! the sync engine, accounts and loadouts together. Build one with
//! [`ArmoryBuilder`].

use std::path::Path;
use std::sync::Arc;

use crate::backend::Backend;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::loadout::Loadouts;
use crate::relation::{RelationHook, RelationHookCollection, Relations};
use crate::sync::{SyncEngine, SyncPolicy};
use crate::user::{LogMailer, Mailer, Users};
use crate::{Clock, Result, SystemClock};

/// Handle to a running Armory.
///
/// Cheap to clone; clones share the same services.
///
/// # Example
/// ```
/// # use armory::{Armory, AuthConfig, Config};
/// # #[tokio::main]
/// # async fn main() -> armory::Result<()> {
/// let url = url::Url::parse("http://localhost:3000").unwrap();
/// let config = Config::new(AuthConfig::new("a-secret-of-16-bytes", url));
/// let armory = Armory::builder(config).in_memory().await?;
///
/// let version = armory.catalog().version().current().await?;
/// # let _ = version;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Armory {
    inner: Arc<ArmoryInner>,
}

#[derive(Debug)]
struct ArmoryInner {
    backend: Backend,
    config: Config,
    catalog: Catalog,
    relations: Relations,
    users: Users,
    loadouts: Loadouts,
}

impl Armory {
    /// Start building an instance with `config`.
    pub fn builder(config: Config) -> ArmoryBuilder {
        ArmoryBuilder::new(config)
    }

    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn relations(&self) -> &Relations {
        &self.inner.relations
    }

    pub fn users(&self) -> &Users {
        &self.inner.users
    }

    pub fn loadouts(&self) -> &Loadouts {
        &self.inner.loadouts
    }

    /// Close the database pool.
    pub async fn close(&self) {
        self.inner.backend.close().await;
    }
}

/// Assembles an [`Armory`].
pub struct ArmoryBuilder {
    config: Config,
    clock: Arc<dyn Clock>,
    mailer: Arc<dyn Mailer>,
    hooks: RelationHookCollection,
}

impl ArmoryBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            mailer: Arc::new(LogMailer),
            hooks: RelationHookCollection::new(),
        }
    }

    /// Use a custom time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Deliver account emails through `mailer` instead of the log.
    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Register a hook that observes every relation change.
    pub fn hook(mut self, hook: Arc<dyn RelationHook>) -> Self {
        self.hooks.add_hook(hook);
        self
    }

    pub fn sync_policy(mut self, policy: SyncPolicy) -> Self {
        self.config.sync = policy;
        self
    }

    /// Open (or create) a database file and build the instance on it.
    pub async fn open(self, path: impl AsRef<Path>) -> Result<Armory> {
        self.config.validate()?;
        let backend = Backend::open(path).await?;
        self.build(backend)
    }

    /// Build the instance on a fresh in-memory database.
    pub async fn in_memory(self) -> Result<Armory> {
        self.config.validate()?;
        let backend = Backend::in_memory().await?;
        self.build(backend)
    }

    fn build(self, backend: Backend) -> Result<Armory> {
        let catalog = Catalog::new(backend.clone(), self.clock.clone());
        let engine = SyncEngine::new(catalog.membership(), self.config.sync);
        let relations = Relations::new(catalog.clone(), engine, self.hooks);
        let users = Users::new(
            backend.clone(),
            self.clock,
            self.config.auth.clone(),
            self.mailer,
        );
        let loadouts = Loadouts::new(catalog.clone());

        tracing::debug!(policy = ?self.config.sync, "Armory ready");
        Ok(Armory {
            inner: Arc::new(ArmoryInner {
                backend,
                config: self.config,
                catalog,
                relations,
                users,
                loadouts,
            }),
        })
    }
}
