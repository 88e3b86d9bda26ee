use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Service externe transformant des clés de stockage en URLs affichables.
///
/// Les deux opérations peuvent échouer librement : [`crate::MediaUrlCache`]
/// convertit toute erreur en URL vide et ne la propage jamais à ses appelants.
#[async_trait]
pub trait UrlResolver: Send + Sync {
    /// Retourne l'URL absolue d'une seule clé.
    async fn resolve_one(&self, key: &str) -> Result<String>;

    /// Résout un ensemble de clés dédupliquées en un seul appel.
    ///
    /// Une clé absente de la réponse est considérée comme un échec de résolution.
    /// Une erreur globale déclenche le repli clé par clé sur [`UrlResolver::resolve_one`].
    async fn resolve_batch(&self, keys: &[String]) -> Result<HashMap<String, String>>;
}
