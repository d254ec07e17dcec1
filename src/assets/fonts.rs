use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

use usvg::fontdb;

use crate::foundation::error::{TextBlendError, TextBlendResult};

/// Font families offered to users, in presentation order.
pub const FONT_CATALOG: [&str; 50] = [
    "Roboto",
    "Arial",
    "Times New Roman",
    "Georgia",
    "Verdana",
    "Helvetica",
    "Courier New",
    "Trebuchet MS",
    "Impact",
    "Comic Sans MS",
    "Palatino",
    "Garamond",
    "Bookman",
    "Avant Garde",
    "Helvetica Neue",
    "Futura",
    "Century Gothic",
    "Calibri",
    "Candara",
    "Franklin Gothic",
    "Optima",
    "Baskerville",
    "Cambria",
    "Constantia",
    "Corbel",
    "Didot",
    "Geneva",
    "Goudy Old Style",
    "Hoefler Text",
    "Lucida Grande",
    "Monaco",
    "Perpetua",
    "Rockwell",
    "Segoe UI",
    "Tahoma",
    "Arial Black",
    "Copperplate",
    "Gill Sans",
    "Lucida Sans",
    "Myriad Pro",
    "Palatino Linotype",
    "Symbol",
    "Times",
    "Univers",
    "Westminster",
    "Arial Narrow",
    "Book Antiqua",
    "Lucida Console",
    "MS Sans Serif",
    "Wide Latin",
];

/// Number of leading catalog entries selectable without the premium entitlement.
pub const FREE_TIER_FONT_COUNT: usize = 20;

/// Read-only entitlement flags supplied by the identity/session service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Entitlements {
    pub is_premium: bool,
}

impl Entitlements {
    pub fn free() -> Self {
        Self { is_premium: false }
    }

    pub fn premium() -> Self {
        Self { is_premium: true }
    }

    pub fn font_limit(self) -> usize {
        if self.is_premium {
            FONT_CATALOG.len()
        } else {
            FREE_TIER_FONT_COUNT
        }
    }
}

/// Catalog subset selectable under `entitlements`.
pub fn available_fonts(entitlements: Entitlements) -> &'static [&'static str] {
    &FONT_CATALOG[..entitlements.font_limit()]
}

/// Catalog entry at `index`, if the session may select it.
pub fn font_at(entitlements: Entitlements, index: usize) -> TextBlendResult<&'static str> {
    available_fonts(entitlements)
        .get(index)
        .copied()
        .ok_or_else(|| {
            TextBlendError::validation(format!(
                "font index {index} is not available ({} selectable)",
                entitlements.font_limit()
            ))
        })
}

pub fn is_font_available(entitlements: Entitlements, family: &str) -> bool {
    available_fonts(entitlements)
        .iter()
        .any(|f| f.eq_ignore_ascii_case(family.trim()))
}

/// Raw font bytes for one family, ready for shaping and glyph rasterization.
#[derive(Clone)]
pub struct FontFace {
    family: String,
    data: Arc<Vec<u8>>,
    index: u32,
}

impl FontFace {
    pub fn new(family: impl Into<String>, data: Vec<u8>, index: u32) -> Self {
        Self {
            family: family.into(),
            data: Arc::new(data),
            index,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    /// Face index inside a font collection file.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("data_len", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

fn family_key(family: &str) -> String {
    family.trim().to_ascii_lowercase()
}

/// Immutable snapshot of font availability.
///
/// A family is *settled* once loading finished, successfully or not; only loaded families have a
/// face. Snapshots are never mutated after publication.
#[derive(Clone, Debug, Default)]
pub struct FontSet {
    faces: BTreeMap<String, FontFace>,
    failed: BTreeSet<String>,
    generation: u64,
}

impl FontSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, family: &str) -> Option<&FontFace> {
        self.faces.get(&family_key(family))
    }

    pub fn is_loaded(&self, family: &str) -> bool {
        self.faces.contains_key(&family_key(family))
    }

    pub fn is_settled(&self, family: &str) -> bool {
        let key = family_key(family);
        self.faces.contains_key(&key) || self.failed.contains(&key)
    }

    pub fn loaded_families(&self) -> impl Iterator<Item = &str> {
        self.faces.values().map(|f| f.family())
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Bumped on every publication; lets readers detect that availability changed.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Grow-only publisher of [`FontSet`] snapshots.
///
/// Writers swap in a new snapshot; readers clone the current `Arc` and never see a partial update.
#[derive(Debug, Default)]
pub struct FontRegistry {
    current: Mutex<Arc<FontSet>>,
    changed: Condvar,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<FontSet> {
        Arc::clone(&self.lock())
    }

    /// Publish a loaded face. A family that already has a face keeps it.
    pub fn insert_face(&self, face: FontFace) {
        let key = family_key(face.family());
        self.publish(|set| {
            if set.faces.contains_key(&key) {
                return false;
            }
            set.failed.remove(&key);
            set.faces.insert(key, face);
            true
        });
    }

    /// Record that `family` could not be found. Later successful loads still win.
    pub fn mark_failed(&self, family: &str) {
        let key = family_key(family);
        self.publish(|set| {
            if set.faces.contains_key(&key) || set.failed.contains(&key) {
                return false;
            }
            set.failed.insert(key);
            true
        });
    }

    /// Block until every family in `families` is settled or `timeout` elapses.
    ///
    /// Returns the latest snapshot and whether all families settled in time.
    pub fn wait_for(&self, families: &BTreeSet<String>, timeout: Duration) -> (Arc<FontSet>, bool) {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if families.iter().all(|f| guard.is_settled(f)) {
                return (Arc::clone(&guard), true);
            }
            let now = Instant::now();
            if now >= deadline {
                return (Arc::clone(&guard), false);
            }
            guard = match self.changed.wait_timeout(guard, deadline - now) {
                Ok((g, _)) => g,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    fn publish(&self, edit: impl FnOnce(&mut FontSet) -> bool) {
        let mut guard = self.lock();
        let mut next = FontSet::clone(&guard);
        if edit(&mut next) {
            next.generation = guard.generation + 1;
            *guard = Arc::new(next);
            self.changed.notify_all();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Arc<FontSet>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Where the loader looks for font files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontSources {
    pub dirs: Vec<PathBuf>,
    pub system: bool,
}

/// Resolves catalog family names to font bytes in the background.
#[derive(Clone)]
pub struct FontLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    sources: FontSources,
    db: OnceLock<fontdb::Database>,
    requested: Mutex<BTreeSet<String>>,
}

impl FontLoader {
    pub fn new(sources: FontSources) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                sources,
                db: OnceLock::new(),
                requested: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    pub fn sources(&self) -> &FontSources {
        &self.inner.sources
    }

    /// Start loading `families` on the rayon pool and return immediately.
    ///
    /// Families already requested through this loader are skipped. Completion is observable only
    /// through `registry`.
    #[tracing::instrument(skip(self, registry, families))]
    pub fn ensure_loaded<I, S>(&self, registry: Arc<FontRegistry>, families: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pending = self.claim(families);
        if pending.is_empty() {
            return;
        }
        let this = self.clone();
        rayon::spawn(move || this.load_now(&registry, &pending));
    }

    /// Synchronous variant of [`FontLoader::ensure_loaded`].
    pub fn load_blocking<I, S>(&self, registry: &FontRegistry, families: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pending = self.claim(families);
        self.load_now(registry, &pending);
    }

    fn claim<I, S>(&self, families: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut requested = self
            .inner
            .requested
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        families
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty() && requested.insert(family_key(f)))
            .collect()
    }

    fn load_now(&self, registry: &FontRegistry, families: &[String]) {
        let db = self.database();
        let mut loaded = 0usize;
        for family in families {
            match load_family(db, family) {
                Some(face) => {
                    registry.insert_face(face);
                    loaded += 1;
                }
                None => {
                    tracing::debug!(family = family.as_str(), "font family not found");
                    registry.mark_failed(family);
                }
            }
        }
        tracing::info!(
            requested = families.len(),
            loaded,
            "font loading finished"
        );
    }

    fn database(&self) -> &fontdb::Database {
        self.inner.db.get_or_init(|| {
            let mut db = fontdb::Database::new();
            if self.inner.sources.system {
                db.load_system_fonts();
            }
            for dir in &self.inner.sources.dirs {
                load_fonts_from_dir(&mut db, dir);
            }
            tracing::debug!(faces = db.len(), "font database ready");
            db
        })
    }
}

fn load_family(db: &fontdb::Database, family: &str) -> Option<FontFace> {
    let families = [fontdb::Family::Name(family)];
    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| FontFace::new(family, data.to_vec(), index))
}

fn load_fonts_from_dir(db: &mut fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::debug!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::debug!(path = %path.display(), error = %e, "skipping font file");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
