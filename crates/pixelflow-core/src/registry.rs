//! The shared, read-only table of site types.

use std::ops::Index;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::id::SiteTypeId;
use crate::site_type::SiteType;

/// Ordered registry of site types, addressed by [`SiteTypeId`].
///
/// Built once at startup and shared behind an `Arc` by every region; no
/// locking is needed because it is never mutated afterwards. Registration
/// order is significant: the n-th type gets `SiteTypeId(n)`, which is the
/// integer code used in grid files.
#[derive(Clone, Debug)]
pub struct SiteTypeRegistry {
    types: IndexMap<String, SiteType>,
}

impl SiteTypeRegistry {
    /// Build a registry from site types in id order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyRegistry`] if `types` is empty,
    /// [`ConfigError::DuplicateSiteType`] if two types share a name.
    pub fn new(types: Vec<SiteType>) -> Result<Self, ConfigError> {
        if types.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }
        let mut map = IndexMap::with_capacity(types.len());
        for ty in types {
            let name = ty.name().to_string();
            if map.contains_key(&name) {
                return Err(ConfigError::DuplicateSiteType { name });
            }
            map.insert(name, ty);
        }
        Ok(Self { types: map })
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always `false`; construction rejects empty registries.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Type for `id`, if registered.
    pub fn get(&self, id: SiteTypeId) -> Option<&SiteType> {
        self.types.get_index(id.index()).map(|(_, ty)| ty)
    }

    /// Check that `id` is registered.
    pub fn check(&self, id: SiteTypeId) -> Result<(), ConfigError> {
        if id.index() < self.types.len() {
            Ok(())
        } else {
            Err(ConfigError::UnknownSiteType {
                id,
                count: self.types.len(),
            })
        }
    }

    /// Id of the type named `name`.
    pub fn id_of(&self, name: &str) -> Option<SiteTypeId> {
        self.types
            .get_index_of(name)
            .map(|i| SiteTypeId(i as u32))
    }

    /// The id after `id`, wrapping to the first type.
    pub fn next_id(&self, id: SiteTypeId) -> SiteTypeId {
        SiteTypeId(((id.index() + 1) % self.types.len()) as u32)
    }

    /// Iterate types in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SiteTypeId, &SiteType)> + '_ {
        self.types
            .values()
            .enumerate()
            .map(|(i, ty)| (SiteTypeId(i as u32), ty))
    }

    /// Highest frequency among oscillating sources.
    pub fn max_source_frequency(&self) -> Option<f64> {
        self.types
            .values()
            .filter_map(SiteType::as_source)
            .filter(|s| !s.is_constant())
            .map(|s| s.frequency())
            .reduce(f64::max)
    }

    /// Largest absolute source amplitude, or zero without sources.
    pub fn max_source_amplitude(&self) -> f64 {
        self.types
            .values()
            .filter_map(SiteType::as_source)
            .map(|s| s.amplitude().abs())
            .fold(0.0, f64::max)
    }
}

impl Index<SiteTypeId> for SiteTypeRegistry {
    type Output = SiteType;

    /// Panics on an unregistered id. Sites only ever hold ids that were
    /// checked on the way in.
    fn index(&self, id: SiteTypeId) -> &SiteType {
        &self.types[id.index()]
    }
}
