//! Modèle des médias affichés par le site (carrousel, galerie d'administration)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions reconnues comme vidéo par [`MediaKind::from_key`]
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v"];

/// Erreurs de construction du modèle
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MediaError {
    /// La clé de stockage est vide
    #[error("media key must not be empty")]
    EmptyKey,
}

/// Nature d'un média, détermine le rendu et la stratégie de préchargement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Devine la nature d'un média à partir de l'extension de sa clé.
    ///
    /// Toute extension absente ou inconnue est traitée comme une image.
    pub fn from_key(key: &str) -> Self {
        let ext = key
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match ext {
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Video,
            _ => MediaKind::Image,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

/// Référence vers un objet du stockage distant
///
/// La clé n'est jamais vide et la nature est figée à la construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMediaRef")]
pub struct MediaRef {
    key: String,
    kind: MediaKind,
}

impl MediaRef {
    /// Crée une référence en devinant la nature depuis l'extension de la clé
    pub fn new(key: impl Into<String>) -> Result<Self, MediaError> {
        let key = key.into();
        let kind = MediaKind::from_key(&key);
        Self::with_kind(key, kind)
    }

    /// Crée une référence de nature explicite
    pub fn with_kind(key: impl Into<String>, kind: MediaKind) -> Result<Self, MediaError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(MediaError::EmptyKey);
        }
        Ok(Self { key, kind })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

/// Forme sérialisée d'un [`MediaRef`], validée à la désérialisation
#[derive(Deserialize)]
struct RawMediaRef {
    key: String,
    kind: Option<MediaKind>,
}

impl TryFrom<RawMediaRef> for MediaRef {
    type Error = MediaError;

    fn try_from(raw: RawMediaRef) -> Result<Self, Self::Error> {
        match raw.kind {
            Some(kind) => MediaRef::with_kind(raw.key, kind),
            None => MediaRef::new(raw.key),
        }
    }
}

/// Média associé à son URL résolue, prêt pour la couche de rendu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMedia {
    pub media: MediaRef,
    /// URL absolue, ou chaîne vide si la résolution a échoué
    pub url: String,
}

impl ResolvedMedia {
    /// Indique que le rendu doit afficher un placeholder
    pub fn is_placeholder(&self) -> bool {
        self.url.is_empty()
    }
}
