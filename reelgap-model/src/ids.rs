use std::fmt;

/// Identifier in the primary metadata catalog (TMDB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CatalogId(pub u64);

/// Identifier in the secondary catalog (Douban).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SecondaryId(pub u64);

impl CatalogId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl SecondaryId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SecondaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which catalog an [`ExternalId`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CatalogKind {
    Tmdb,
    Douban,
}

/// An id tagged with the catalog that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExternalId {
    pub catalog: CatalogKind,
    pub id: u64,
}

impl ExternalId {
    pub fn tmdb(id: CatalogId) -> Self {
        Self {
            catalog: CatalogKind::Tmdb,
            id: id.0,
        }
    }

    pub fn douban(id: SecondaryId) -> Self {
        Self {
            catalog: CatalogKind::Douban,
            id: id.0,
        }
    }

    pub fn as_catalog_id(&self) -> Option<CatalogId> {
        match self.catalog {
            CatalogKind::Tmdb => Some(CatalogId(self.id)),
            CatalogKind::Douban => None,
        }
    }

    pub fn as_secondary_id(&self) -> Option<SecondaryId> {
        match self.catalog {
            CatalogKind::Douban => Some(SecondaryId(self.id)),
            CatalogKind::Tmdb => None,
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.catalog {
            CatalogKind::Tmdb => write!(f, "tmdb:{}", self.id),
            CatalogKind::Douban => write!(f, "douban:{}", self.id),
        }
    }
}

/// Key identifying a canonical media entry. The primary catalog wins when
/// both ids are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "catalog", content = "id"))]
pub enum MediaKey {
    Catalog(CatalogId),
    Secondary(SecondaryId),
}

impl MediaKey {
    pub fn to_external(self) -> ExternalId {
        match self {
            MediaKey::Catalog(id) => ExternalId::tmdb(id),
            MediaKey::Secondary(id) => ExternalId::douban(id),
        }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_external())
    }
}

/// Item id as issued by a media server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
