// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Routing of logical names to storage providers by URI scheme.
//!
//! A [`Registry`] maps scheme names to providers. The host builds one, installs it once
//! for the whole process with [`install`], and from then on resolves every logical name
//! through [`global`]. [`init`] installs the default registry, which serves the
//! [`SCHEME`] scheme with a default-configured [`PrismaFileSystem`].
//!
//! # Examples
//!
//! ```
//! use prisma_fs::{FileSystem, registry};
//!
//! let registry = registry::init();
//! let fs = registry.resolve("prisma://bucket/tmp/data.bin").expect("prisma is registered");
//! assert_eq!(fs.translate_name("prisma://bucket/tmp/data.bin"), "/tmp/data.bin");
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{Level, event};

use crate::PrismaFileSystem;
use crate::file_system::FileSystem;
use crate::path;

/// The scheme served by [`PrismaFileSystem`] in the default registry.
pub const SCHEME: &str = "prisma";

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// An immutable map from URI scheme to storage provider.
#[derive(Default)]
pub struct Registry {
    providers: HashMap<String, Arc<dyn FileSystem>>,
}

impl Registry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Returns the provider registered for `scheme`.
    #[must_use]
    pub fn get(&self, scheme: &str) -> Option<&dyn FileSystem> {
        self.providers.get(scheme).map(Arc::as_ref)
    }

    /// Returns the provider responsible for the logical name `name`, chosen by its scheme.
    ///
    /// Names without a scheme resolve to the provider registered for the empty scheme,
    /// if there is one.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&dyn FileSystem> {
        self.get(path::parse_uri(name).scheme)
    }

    /// The registered schemes, in no particular order.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.providers.iter()).finish()
    }
}

/// Collects the providers of a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    providers: HashMap<String, Arc<dyn FileSystem>>,
}

impl RegistryBuilder {
    /// Registers `provider` for `scheme`.
    ///
    /// Each scheme can be registered once; a later registration for the same scheme is
    /// ignored and logged.
    #[must_use]
    pub fn register(self, scheme: impl Into<String>, provider: impl FileSystem + 'static) -> Self {
        self.register_shared(scheme, Arc::new(provider))
    }

    /// Registers a provider that is shared with other owners.
    #[must_use]
    pub fn register_shared(mut self, scheme: impl Into<String>, provider: Arc<dyn FileSystem>) -> Self {
        match self.providers.entry(scheme.into()) {
            Entry::Occupied(existing) => {
                event!(Level::WARN, scheme = existing.key().as_str(), "ignoring duplicate file system registration");
            }
            Entry::Vacant(slot) => {
                event!(Level::DEBUG, scheme = slot.key().as_str(), "registered file system");
                slot.insert(provider);
            }
        }
        self
    }

    /// Creates the registry.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            providers: self.providers,
        }
    }
}

/// Installs `registry` as the process-wide registry.
///
/// # Errors
///
/// Returns `registry` back if a registry has already been installed.
pub fn install(registry: Registry) -> Result<&'static Registry, Registry> {
    GLOBAL.set(registry)?;
    Ok(GLOBAL.get_or_init(Registry::default))
}

/// Installs the default registry unless one is already installed, and returns the
/// process-wide registry.
pub fn init() -> &'static Registry {
    GLOBAL.get_or_init(|| Registry::builder().register(SCHEME, PrismaFileSystem::new()).build())
}

/// Returns the process-wide registry, if one has been installed.
#[must_use]
pub fn global() -> Option<&'static Registry> {
    GLOBAL.get()
}
