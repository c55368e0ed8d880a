//! Installer registry keyed by (namespace, package).
//!
//! Registrations come from an explicit table. A platform-specific
//! registration shadows a common one for the same package.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use depforge_schema::{Namespace, PackageName, Platform};
use thiserror::Error;

use crate::installer::Installer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(
        "The following package has more than one installer in namespace {namespace}: {package}"
    )]
    Duplicate {
        namespace: Namespace,
        package: PackageName,
    },

    #[error("Invalid installer registration name: {0}")]
    InvalidName(String),
}

/// One table entry.
pub struct Registration {
    pub namespace: Namespace,
    pub package: PackageName,
    pub installer: Box<dyn Installer>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Registration({}/{})", self.namespace, self.package)
    }
}

impl Registration {
    pub fn new(namespace: Namespace, package: &str, installer: impl Installer + 'static) -> Self {
        Self {
            namespace,
            package: PackageName::new(package),
            installer: Box::new(installer),
        }
    }

    /// Register under a qualified name such as `linux_installer_cmake`.
    pub fn from_qualified(
        name: &str,
        installer: impl Installer + 'static,
    ) -> Result<Self, RegistryError> {
        let (namespace, package) = Namespace::split_qualified(name)
            .ok_or_else(|| RegistryError::InvalidName(name.to_string()))?;
        Ok(Self::new(namespace, package, installer))
    }
}

/// An installer as resolved for one platform.
#[derive(Clone, Copy)]
pub struct Resolved<'r> {
    pub namespace: Namespace,
    pub installer: &'r dyn Installer,
}

impl fmt::Debug for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<(Namespace, PackageName), Box<dyn Installer>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.keys().map(|(ns, pkg)| format!("{ns}/{pkg}")))
            .finish()
    }
}

impl Registry {
    /// Build a registry, rejecting duplicate tokens within a namespace.
    pub fn new(
        registrations: impl IntoIterator<Item = Registration>,
    ) -> Result<Self, RegistryError> {
        let mut entries = BTreeMap::new();
        for registration in registrations {
            let Registration {
                namespace,
                package,
                installer,
            } = registration;

            if !package.is_valid() || namespace == Namespace::Platform(Platform::Unknown) {
                return Err(RegistryError::InvalidName(format!("{namespace}_installer_{package}")));
            }

            let key = (namespace, package);
            if entries.contains_key(&key) {
                let (namespace, package) = key;
                return Err(RegistryError::Duplicate { namespace, package });
            }
            entries.insert(key, installer);
        }
        Ok(Self { entries })
    }

    /// Packages installable on `platform`: its own plus the common ones.
    pub fn list_packages(&self, platform: Platform) -> BTreeSet<PackageName> {
        self.entries
            .keys()
            .filter(|(ns, _)| *ns == Namespace::Common || *ns == Namespace::Platform(platform))
            .map(|(_, pkg)| pkg.clone())
            .collect()
    }

    /// Platform namespace first, then common.
    pub fn resolve(&self, package: &PackageName, platform: Platform) -> Option<Resolved<'_>> {
        [Namespace::Platform(platform), Namespace::Common]
            .into_iter()
            .find_map(|namespace| {
                self.entries
                    .get(&(namespace, package.clone()))
                    .map(|installer| Resolved {
                        namespace,
                        installer: installer.as_ref(),
                    })
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
