//! Module de cache des URLs de médias
//!
//! Ce module mémorise les URLs obtenues auprès du service de stockage externe
//! et garantit qu'une clé n'est jamais résolue deux fois en parallèle.

use crate::media::{MediaRef, ResolvedMedia};
use crate::resolver::UrlResolver;
use chrono::{DateTime, Utc};
use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use lru::LruCache;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Capacité utilisée quand la capacité demandée est nulle
pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(512).unwrap();

/// Entrée du cache
///
/// Jamais modifiée sur place : une nouvelle résolution remplace l'entrée.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUrl {
    pub key: String,
    /// URL absolue, ou chaîne vide si la résolution a échoué
    pub url: String,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedUrl {
    fn new(key: String, url: String) -> Self {
        Self {
            key,
            url,
            resolved_at: Utc::now(),
        }
    }

    /// Indique un échec de résolution mémorisé
    pub fn is_failure(&self) -> bool {
        self.url.is_empty()
    }
}

/// Compteurs d'utilisation du cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Clés servies directement depuis le cache
    pub hits: u64,
    /// Clés ayant déclenché une nouvelle résolution
    pub misses: u64,
    /// Appels émis vers le service externe (unitaires et par lot)
    pub external_calls: u64,
    /// Clés dont la résolution a échoué
    pub failures: u64,
    /// Nombre d'entrées présentes
    pub len: usize,
    pub capacity: usize,
}

/// URL en cours de résolution, partagée entre tous les appelants concernés
type SharedUrl = Shared<BoxFuture<'static, String>>;

/// Résolution en vol pour une clé
struct Flight {
    id: u64,
    url: SharedUrl,
}

/// Type d'appel externe associé à une résolution en vol
#[derive(Debug, Clone, Copy)]
enum FlightKind {
    Single,
    Batch,
}

/// Nouvelle résolution à lancer une fois le verrou relâché
struct PendingFlight {
    id: u64,
    kind: FlightKind,
    keys: Vec<String>,
    done: oneshot::Sender<Arc<HashMap<String, String>>>,
}

enum Slot {
    Ready(String),
    Waiting(SharedUrl),
}

struct CacheState {
    entries: LruCache<String, ResolvedUrl>,
    /// Map des résolutions en cours (clé -> résolution partagée)
    pending: HashMap<String, Flight>,
    next_flight: u64,
}

struct Inner {
    state: Mutex<CacheState>,
    resolver: Arc<dyn UrlResolver>,
    hits: AtomicU64,
    misses: AtomicU64,
    external_calls: AtomicU64,
    failures: AtomicU64,
}

/// Cache des URLs de médias avec résolution par lot
///
/// Le cache est borné (politique LRU) et possédé explicitement par le composant
/// qui le construit ; il se clone à faible coût pour être partagé entre le
/// carrousel public et la galerie d'administration.
///
/// Aucune opération n'échoue du point de vue de l'appelant : une résolution
/// impossible produit une URL vide que la couche de rendu remplace par un
/// placeholder.
///
/// Note : les résolutions sont exécutées dans des tâches `tokio::spawn`, le cache
/// doit donc être utilisé depuis un runtime tokio. Une résolution lancée va
/// toujours à son terme et alimente le cache, même si l'appelant a abandonné
/// son attente.
#[derive(Clone)]
pub struct MediaUrlCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for MediaUrlCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaUrlCache")
            .field("stats", &self.stats())
            .finish()
    }
}

impl MediaUrlCache {
    /// Crée un cache vide
    ///
    /// # Arguments
    ///
    /// * `resolver` - Service externe de résolution
    /// * `capacity` - Nombre maximal d'URLs mémorisées (0 = [`DEFAULT_CAPACITY`])
    pub fn new(resolver: Arc<dyn UrlResolver>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            tracing::warn!(
                "Media URL cache capacity must be positive, using {}",
                DEFAULT_CAPACITY
            );
            DEFAULT_CAPACITY
        });

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CacheState {
                    entries: LruCache::new(capacity),
                    pending: HashMap::new(),
                    next_flight: 0,
                }),
                resolver,
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                external_calls: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
        }
    }

    /// Résout une clé unique
    ///
    /// Une clé déjà en cache est servie sans appel externe. Sinon le résolveur
    /// unitaire est appelé une seule fois, même si plusieurs appelants
    /// demandent la même clé simultanément.
    pub async fn resolve_one(&self, key: &str) -> String {
        let (slots, flight) = self.classify(&[key.to_string()], FlightKind::Single);
        if let Some(flight) = flight {
            self.launch(flight);
        }

        match slots.into_iter().next() {
            Some((_, Slot::Ready(url))) => url,
            Some((_, Slot::Waiting(url))) => url.await,
            None => String::new(),
        }
    }

    /// Résout une séquence de clés
    ///
    /// # Workflow
    ///
    /// 1. Sépare les clés en cache, en cours de résolution et à résoudre
    /// 2. Émet un unique appel par lot pour les clés à résoudre (dédupliquées)
    /// 3. En cas d'échec global du lot, se replie sur une résolution clé par clé
    /// 4. Assemble le résultat dans l'ordre d'entrée
    ///
    /// # Returns
    ///
    /// Une URL par clé d'entrée, dans le même ordre. Deux clés identiques
    /// obtiennent toujours la même URL ; une URL vide signale un échec.
    pub async fn resolve_batch<S: AsRef<str>>(&self, keys: &[S]) -> Vec<String> {
        let keys: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        if keys.is_empty() {
            return Vec::new();
        }

        let (slots, flight) = self.classify(&keys, FlightKind::Batch);
        if let Some(flight) = flight {
            self.launch(flight);
        }

        let mut resolved: HashMap<String, String> = HashMap::with_capacity(slots.len());
        let mut waiting = Vec::new();
        for (key, slot) in slots {
            match slot {
                Slot::Ready(url) => {
                    resolved.insert(key, url);
                }
                Slot::Waiting(url) => waiting.push(url.map(move |url| (key, url))),
            }
        }
        resolved.extend(future::join_all(waiting).await);

        keys.iter()
            .map(|key| resolved.get(key).cloned().unwrap_or_default())
            .collect()
    }

    /// Résout une liste de médias et associe chaque média à son URL
    pub async fn resolve_media(&self, media: &[MediaRef]) -> Vec<ResolvedMedia> {
        let keys: Vec<&str> = media.iter().map(MediaRef::key).collect();
        let urls = self.resolve_batch(&keys).await;

        media
            .iter()
            .cloned()
            .zip(urls)
            .map(|(media, url)| ResolvedMedia { media, url })
            .collect()
    }

    /// Supprime une entrée et oublie une éventuelle résolution en cours
    ///
    /// La prochaine demande pour cette clé déclenchera un nouvel appel externe.
    pub fn invalidate(&self, key: &str) {
        let mut state = self.inner.lock_state();
        let removed = state.entries.pop(key).is_some();
        let forgotten = state.pending.remove(key).is_some();
        tracing::debug!(key, removed, forgotten, "Invalidated media URL");
    }

    /// Vide complètement le cache
    pub fn clear(&self) {
        let mut state = self.inner.lock_state();
        let count = state.entries.len();
        state.entries.clear();
        state.pending.clear();
        tracing::info!("Cleared media URL cache ({} entries)", count);
    }

    /// Lit une entrée sans modifier l'ordre LRU ni appeler le service externe
    pub fn peek(&self, key: &str) -> Option<ResolvedUrl> {
        self.inner.lock_state().entries.peek(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock_state().entries.cap().get()
    }

    /// Retourne les compteurs d'utilisation
    pub fn stats(&self) -> CacheStats {
        let (len, capacity) = {
            let state = self.inner.lock_state();
            (state.entries.len(), state.entries.cap().get())
        };

        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            external_calls: self.inner.external_calls.load(Ordering::Relaxed),
            failures: self.inner.failures.load(Ordering::Relaxed),
            len,
            capacity,
        }
    }

    /// Classe les clés sous un seul verrou et enregistre les nouvelles résolutions
    ///
    /// Une clé absente du cache et sans résolution en vol reçoit immédiatement
    /// une entrée dans `pending` : tout appelant concurrent la trouvera et
    /// attendra la même résolution.
    fn classify(
        &self,
        keys: &[String],
        kind: FlightKind,
    ) -> (Vec<(String, Slot)>, Option<PendingFlight>) {
        let mut state = self.inner.lock_state();
        let mut slots: Vec<(String, Slot)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut to_fetch: Vec<String> = Vec::new();

        for key in keys {
            if !seen.insert(key.as_str()) {
                continue;
            }

            if let Some(entry) = state.entries.get(key) {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                slots.push((key.clone(), Slot::Ready(entry.url.clone())));
            } else if let Some(flight) = state.pending.get(key) {
                tracing::debug!(key = key.as_str(), "Resolution already in flight");
                slots.push((key.clone(), Slot::Waiting(flight.url.clone())));
            } else {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                to_fetch.push(key.clone());
            }
        }

        if to_fetch.is_empty() {
            return (slots, None);
        }

        let id = state.next_flight;
        state.next_flight += 1;

        let (done, receiver) = oneshot::channel::<Arc<HashMap<String, String>>>();
        // Une tâche interrompue (panic) libère ses attentes avec des URLs vides
        let batch = receiver
            .map(|result| result.unwrap_or_default())
            .boxed()
            .shared();

        for key in &to_fetch {
            let lookup = key.clone();
            let url: SharedUrl = batch
                .clone()
                .map(move |urls| urls.get(&lookup).cloned().unwrap_or_default())
                .boxed()
                .shared();

            state.pending.insert(
                key.clone(),
                Flight {
                    id,
                    url: url.clone(),
                },
            );
            slots.push((key.clone(), Slot::Waiting(url)));
        }

        tracing::debug!(
            flight = id,
            keys = to_fetch.len(),
            ?kind,
            "Starting media URL resolution"
        );

        (
            slots,
            Some(PendingFlight {
                id,
                kind,
                keys: to_fetch,
                done,
            }),
        )
    }

    /// Lance la résolution externe en tâche de fond
    ///
    /// Un résolveur qui panique compte comme un échec pour chaque clé : les
    /// entrées vides sont mémorisées et les résolutions en vol libérées.
    fn launch(&self, flight: PendingFlight) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let PendingFlight { id, kind, keys, done } = flight;

            let resolution = async {
                match kind {
                    FlightKind::Single => {
                        let mut urls = HashMap::with_capacity(keys.len());
                        for key in &keys {
                            let url = inner.fetch_one(key).await;
                            urls.insert(key.clone(), url);
                        }
                        urls
                    }
                    FlightKind::Batch => inner.fetch_batch(&keys).await,
                }
            };

            let urls = match AssertUnwindSafe(resolution).catch_unwind().await {
                Ok(urls) => urls,
                Err(_) => {
                    tracing::error!(flight = id, keys = keys.len(), "Media URL resolver panicked");
                    inner
                        .failures
                        .fetch_add(keys.len() as u64, Ordering::Relaxed);
                    keys.iter().map(|key| (key.clone(), String::new())).collect()
                }
            };

            inner.store(id, &urls);
            // Personne n'attend plus : le cache est tout de même alimenté
            let _ = done.send(Arc::new(urls));
        });
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appelle le résolveur unitaire en convertissant toute erreur en URL vide
    async fn fetch_one(&self, key: &str) -> String {
        self.external_calls.fetch_add(1, Ordering::Relaxed);

        match self.resolver.resolve_one(key).await {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => {
                tracing::warn!(key, "Resolver returned an empty URL");
                self.failures.fetch_add(1, Ordering::Relaxed);
                String::new()
            }
            Err(e) => {
                tracing::warn!(key, "Unable to resolve media URL: {}", e);
                self.failures.fetch_add(1, Ordering::Relaxed);
                String::new()
            }
        }
    }

    /// Appelle le résolveur par lot, avec repli clé par clé si le lot échoue
    async fn fetch_batch(&self, keys: &[String]) -> HashMap<String, String> {
        self.external_calls.fetch_add(1, Ordering::Relaxed);

        match self.resolver.resolve_batch(keys).await {
            Ok(mut urls) => keys
                .iter()
                .map(|key| {
                    let url = urls.remove(key).unwrap_or_default();
                    if url.is_empty() {
                        tracing::warn!(key = key.as_str(), "Batch resolution returned no URL");
                        self.failures.fetch_add(1, Ordering::Relaxed);
                    }
                    (key.clone(), url)
                })
                .collect(),
            Err(e) => {
                tracing::warn!(
                    "Batch resolution of {} keys failed, falling back to per-key resolution: {}",
                    keys.len(),
                    e
                );
                let urls = future::join_all(keys.iter().map(|key| self.fetch_one(key))).await;
                keys.iter().cloned().zip(urls).collect()
            }
        }
    }

    /// Enregistre les résultats d'une résolution terminée
    ///
    /// Seules les clés dont la résolution en vol porte encore l'identifiant `id`
    /// sont mémorisées : une clé invalidée entre-temps n'est pas réinsérée.
    fn store(&self, id: u64, urls: &HashMap<String, String>) {
        let mut state = self.lock_state();

        for (key, url) in urls {
            let current = state.pending.get(key).map(|flight| flight.id);
            if current != Some(id) {
                tracing::debug!(key = key.as_str(), flight = id, "Dropping stale resolution");
                continue;
            }
            state.pending.remove(key);

            let entry = ResolvedUrl::new(key.clone(), url.clone());
            if let Some((evicted, _)) = state.entries.push(key.clone(), entry) {
                if &evicted != key {
                    tracing::debug!(evicted = evicted.as_str(), "LRU eviction of media URL");
                }
            }
        }
    }
}
