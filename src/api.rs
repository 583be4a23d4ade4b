//! Entities and the service façade
//!
//! This module holds the navigable object graph ([`Show`] → [`Season`] →
//! [`Episode`], plus [`Actor`] and [`Banner`]) and the [`Tvdb`] façade that
//! builds it from service documents.
//!
//! A `Show` returned by [`Tvdb::search`] or [`Tvdb::get`] carries only the
//! attributes of the search-level record. Hydration is always explicit:
//! [`Show::update`] fetches the full series document and builds the
//! season/episode tree, [`Show::load_actors`] and [`Show::load_banners`]
//! fetch their dedicated documents. Reading an attribute never touches the
//! network.
//!
//! Example:
//!
//! ```no_run
//! use tvdb_api::Tvdb;
//!
//! let mut db = Tvdb::new("B43FF87DE395DF56");
//! let result = db.search("Dexter", "en")?;
//! let mut show = result.get(0)?.clone();
//! show.update()?;
//! for season in show.seasons() {
//!     for episode in season.episodes() {
//!         println!("{}", episode.name().unwrap_or("?"));
//!     }
//! }
//! # Ok::<(), tvdb_api::TvdbError>(())
//! ```

use crate::attributes::{AttributeBag, AttributeValue};
use crate::cache::ResponseCache;
use crate::error::{Result, TvdbError};
use crate::language;
use crate::loader::{CachedLoader, HttpLoader, Loader};
use crate::mapper::{
    self, ACTOR_SCHEMA, BANNER_SCHEMA, EPISODE_SCHEMA, SHOW_FULL_SCHEMA, SHOW_SEARCH_SCHEMA,
};
use crate::xmltree::{Element, parse_tree};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Primary service host. The old mirror discovery always resolved here.
const BASE_URL: &str = "http://thetvdb.com";

fn search_url(series: &str, language: &str) -> String {
    format!(
        "{BASE_URL}/api/GetSeries.php?seriesname={}&language={}",
        urlencoding::encode(series),
        language
    )
}

fn series_url(api_key: &str, series_id: u32, language: &str) -> String {
    format!("{BASE_URL}/api/{api_key}/series/{series_id}/{language}.xml")
}

fn series_all_url(api_key: &str, series_id: u32, language: &str) -> String {
    format!("{BASE_URL}/api/{api_key}/series/{series_id}/all/{language}.xml")
}

fn episode_url(api_key: &str, episode_id: u32, language: &str) -> String {
    format!("{BASE_URL}/api/{api_key}/episodes/{episode_id}/{language}.xml")
}

fn actors_url(api_key: &str, series_id: u32) -> String {
    format!("{BASE_URL}/api/{api_key}/series/{series_id}/actors.xml")
}

fn banners_url(api_key: &str, series_id: u32) -> String {
    format!("{BASE_URL}/api/{api_key}/series/{series_id}/banners.xml")
}

/// Shared connection state: the API key, the attribute lookup mode and the
/// transport. Entities hold this by `Arc`; it carries no entity data.
struct Context {
    api_key: String,
    ignore_case: bool,
    loader: Box<dyn Loader>,
}

fn int_field(bag: &AttributeBag, name: &str) -> Option<u32> {
    bag.get(name)
        .and_then(AttributeValue::as_int)
        .and_then(|v| u32::try_from(v).ok())
}

/// A single episode of a show.
///
/// All values delivered by the service are reachable through
/// [`get_attribute`](Episode::get_attribute); the identity of the episode
/// (its id, its episode number, its season and series) is also available
/// through typed accessors. The season and series references carry
/// identity only; the owning [`Show`] holds the actual tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    bag: AttributeBag,
    episode_number: u32,
    season_number: u32,
    series_id: u32,
}

impl Episode {
    fn from_bag(bag: AttributeBag, fallback_series_id: Option<u32>) -> Result<Self> {
        let season_number = int_field(&bag, "SeasonNumber").ok_or_else(|| {
            TvdbError::BadData("episode record without a SeasonNumber".to_string())
        })?;
        let episode_number = int_field(&bag, "EpisodeNumber").ok_or_else(|| {
            TvdbError::BadData("episode record without an EpisodeNumber".to_string())
        })?;
        let series_id = int_field(&bag, "seriesid")
            .or(fallback_series_id)
            .unwrap_or_default();

        Ok(Self {
            bag,
            episode_number,
            season_number,
            series_id,
        })
    }

    /// The service-assigned episode id.
    pub fn id(&self) -> Result<u32> {
        int_field(&self.bag, "id")
            .ok_or_else(|| TvdbError::attribute("Episode", "id", true))
    }

    /// The episode number within its season.
    pub fn episode_number(&self) -> u32 {
        self.episode_number
    }

    /// The number of the season this episode belongs to (0 = specials).
    pub fn season_number(&self) -> u32 {
        self.season_number
    }

    /// The id of the series this episode belongs to.
    pub fn series_id(&self) -> u32 {
        self.series_id
    }

    /// The episode title, if delivered.
    pub fn name(&self) -> Option<&str> {
        self.bag.get("EpisodeName").and_then(AttributeValue::as_text)
    }

    /// Looks up any service-delivered field by name.
    pub fn get_attribute(&self, name: &str) -> Result<&AttributeValue> {
        self.bag.get(name).ok_or_else(|| {
            error!(name, "Episode attribute not found");
            TvdbError::attribute(
                "Episode",
                name,
                EPISODE_SCHEMA.knows(name, self.bag.ignore_case()),
            )
        })
    }

    /// Canonical names of all hydrated fields.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.bag.names()
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Episode S{:03}E{:03} - {}>",
            self.season_number,
            self.episode_number,
            self.name().unwrap_or("")
        )
    }
}

/// An ordered collection of the episodes of one season.
///
/// Episodes are keyed and iterated by episode number, ascending,
/// independent of the order the source document listed them in. The
/// series reference carries identity only; the owning [`Show`] holds the
/// actual data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    number: u32,
    series_id: u32,
    episodes: BTreeMap<u32, Episode>,
}

impl Season {
    fn new(number: u32, series_id: u32) -> Self {
        Self {
            number,
            series_id,
            episodes: BTreeMap::new(),
        }
    }

    fn insert(&mut self, episode: Episode) {
        debug!(season = self.number, episode = episode.episode_number, "adding episode");
        self.episodes.insert(episode.episode_number, episode);
    }

    /// The season number (0 = specials).
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The id of the series this season belongs to.
    pub fn series_id(&self) -> u32 {
        self.series_id
    }

    /// Number of episodes in the season.
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// True if the season holds no episodes.
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// The episode with the given episode number.
    ///
    /// Fails with [`TvdbError::Index`] for numbers the season does not
    /// hold; never clamps or defaults.
    pub fn episode(&self, number: u32) -> Result<&Episode> {
        self.episodes.get(&number).ok_or_else(|| {
            error!(season = self.number, episode = number, "episode not found");
            TvdbError::Index(number.to_string())
        })
    }

    /// Episodes in ascending episode-number order.
    pub fn episodes(&self) -> impl Iterator<Item = &Episode> {
        self.episodes.values()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Season {:03}>", self.number)
    }
}

/// A member of a show's cast, from the actors document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    bag: AttributeBag,
}

impl Actor {
    /// The actor's name, if delivered.
    pub fn name(&self) -> Option<&str> {
        self.bag.get("Name").and_then(AttributeValue::as_text)
    }

    /// The played role, if delivered.
    pub fn role(&self) -> Option<&str> {
        self.bag.get("Role").and_then(AttributeValue::as_text)
    }

    /// Looks up any service-delivered field by name.
    pub fn get_attribute(&self, name: &str) -> Result<&AttributeValue> {
        self.bag.get(name).ok_or_else(|| {
            TvdbError::attribute("Actor", name, ACTOR_SCHEMA.knows(name, self.bag.ignore_case()))
        })
    }
}

/// One banner image record, from the banners document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    bag: AttributeBag,
}

impl Banner {
    /// The full URL of the banner image, derived from the service host and
    /// the record's `BannerPath`.
    pub fn banner_url(&self) -> Result<String> {
        let path = self
            .bag
            .get("BannerPath")
            .and_then(AttributeValue::as_text)
            .ok_or_else(|| TvdbError::attribute("Banner", "BannerPath", true))?;
        Ok(format!("{BASE_URL}/banners/{path}"))
    }

    /// Looks up any service-delivered field by name.
    pub fn get_attribute(&self, name: &str) -> Result<&AttributeValue> {
        self.bag.get(name).ok_or_else(|| {
            TvdbError::attribute("Banner", name, BANNER_SCHEMA.knows(name, self.bag.ignore_case()))
        })
    }
}

/// A television series: service-delivered attributes plus the owned tree of
/// seasons and episodes.
///
/// Freshly constructed shows carry the search-level attribute set and an
/// empty tree; [`update`](Show::update) hydrates the rest. Cloning a show
/// clones its data; the connection state is shared.
#[derive(Clone)]
pub struct Show {
    ctx: Arc<Context>,
    language: String,
    bag: AttributeBag,
    seasons: BTreeMap<u32, Season>,
    actors: Vec<Actor>,
    banners: Vec<Banner>,
}

/// The persistable state of a [`Show`]: every service-delivered attribute
/// plus the season/episode tree, actors and banners. Produced by
/// [`Show::snapshot`], turned back into a live `Show` by [`Tvdb::restore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowSnapshot {
    language: String,
    bag: AttributeBag,
    seasons: BTreeMap<u32, Season>,
    actors: Vec<Actor>,
    banners: Vec<Banner>,
}

impl Show {
    fn from_bag(ctx: Arc<Context>, language: &str, bag: AttributeBag) -> Self {
        Self {
            ctx,
            language: language.to_string(),
            bag,
            seasons: BTreeMap::new(),
            actors: Vec::new(),
            banners: Vec::new(),
        }
    }

    /// The service-assigned series id.
    pub fn id(&self) -> Result<u32> {
        int_field(&self.bag, "id")
            .or_else(|| int_field(&self.bag, "seriesid"))
            .ok_or_else(|| TvdbError::attribute("Show", "id", true))
    }

    /// The series name, if delivered.
    pub fn series_name(&self) -> Option<&str> {
        self.bag.get("SeriesName").and_then(AttributeValue::as_text)
    }

    /// The language this show was requested in.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Looks up any service-delivered field by name.
    ///
    /// Fields that belong to the series record but have not been hydrated
    /// yet fail with a hint to call [`update`](Show::update); fields the
    /// service does not define at all fail plainly. Both are
    /// [`TvdbError::Attribute`].
    pub fn get_attribute(&self, name: &str) -> Result<&AttributeValue> {
        self.bag.get(name).ok_or_else(|| {
            error!(name, "Show attribute not found");
            let known = SHOW_FULL_SCHEMA.knows(name, self.bag.ignore_case())
                || SHOW_SEARCH_SCHEMA.knows(name, self.bag.ignore_case());
            TvdbError::attribute("Show", name, known)
        })
    }

    /// Canonical names of all hydrated fields.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.bag.names()
    }

    /// Number of seasons currently in the tree.
    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    /// True if no season data has been hydrated.
    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    /// The season with the given season number (0 = specials).
    ///
    /// Fails with [`TvdbError::Index`] for numbers the show does not hold;
    /// never clamps or defaults.
    pub fn season(&self, number: u32) -> Result<&Season> {
        self.seasons.get(&number).ok_or_else(|| {
            error!(season = number, "season not found");
            TvdbError::Index(number.to_string())
        })
    }

    /// Seasons in ascending season-number order.
    pub fn seasons(&self) -> impl Iterator<Item = &Season> {
        self.seasons.values()
    }

    /// The actors loaded by [`load_actors`](Show::load_actors), in document
    /// order. Empty until then.
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// The banners loaded by [`load_banners`](Show::load_banners), in
    /// document order. Empty until then.
    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    /// Fetches the full series document and hydrates the show.
    ///
    /// The attribute set is merged (new and changed fields win, fields only
    /// present before persist) and the season/episode tree is rebuilt from
    /// the document, replacing any previous tree. Running `update` twice
    /// yields an equal result.
    pub fn update(&mut self) -> Result<()> {
        let id = self.id()?;
        debug!(id, "populating season data");

        let url = series_all_url(&self.ctx.api_key, id, &self.language);
        let bytes = self.ctx.loader.load(&url, true).map_err(|err| match err {
            TvdbError::NotFound(_) => TvdbError::Id(id.to_string()),
            other => other,
        })?;
        let root = parse_tree(&bytes)?;

        let series = root.find("Series").ok_or_else(|| {
            TvdbError::BadData("series document without a <Series> record".to_string())
        })?;
        self.bag
            .merge(&mapper::map_element(series, &SHOW_FULL_SCHEMA, self.ctx.ignore_case));

        let mut seasons: BTreeMap<u32, Season> = BTreeMap::new();
        for episode_element in root.find_all("Episode") {
            let bag = mapper::map_element(episode_element, &EPISODE_SCHEMA, self.ctx.ignore_case);
            let episode = match Episode::from_bag(bag, Some(id)) {
                Ok(episode) => episode,
                Err(err) => {
                    warn!(%err, "skipping unusable episode record");
                    continue;
                }
            };
            seasons
                .entry(episode.season_number)
                .or_insert_with(|| Season::new(episode.season_number, id))
                .insert(episode);
        }
        self.seasons = seasons;

        Ok(())
    }

    /// Fetches the cast document and fills [`actors`](Show::actors).
    ///
    /// Returns immediately without refetching when actors are already
    /// loaded.
    pub fn load_actors(&mut self) -> Result<()> {
        if !self.actors.is_empty() {
            return Ok(());
        }

        let id = self.id()?;
        let url = actors_url(&self.ctx.api_key, id);
        let bytes = self.ctx.loader.load(&url, true)?;
        let root = parse_tree(&bytes)?;

        self.actors = root
            .find_all("Actor")
            .map(|element| Actor {
                bag: mapper::map_element(element, &ACTOR_SCHEMA, self.ctx.ignore_case),
            })
            .collect();

        debug!(id, count = self.actors.len(), "loaded actors");
        Ok(())
    }

    /// Fetches the banners document and fills [`banners`](Show::banners).
    ///
    /// Returns immediately without refetching when banners are already
    /// loaded.
    pub fn load_banners(&mut self) -> Result<()> {
        if !self.banners.is_empty() {
            return Ok(());
        }

        let id = self.id()?;
        let url = banners_url(&self.ctx.api_key, id);
        let bytes = self.ctx.loader.load(&url, true)?;
        let root = parse_tree(&bytes)?;

        self.banners = root
            .find_all("Banner")
            .map(|element| Banner {
                bag: mapper::map_element(element, &BANNER_SCHEMA, self.ctx.ignore_case),
            })
            .collect();

        debug!(id, count = self.banners.len(), "loaded banners");
        Ok(())
    }

    /// Captures the complete observable state of the show for persistence.
    ///
    /// The snapshot serializes with serde and restores through
    /// [`Tvdb::restore`] without any network activity.
    pub fn snapshot(&self) -> ShowSnapshot {
        ShowSnapshot {
            language: self.language.clone(),
            bag: self.bag.clone(),
            seasons: self.seasons.clone(),
            actors: self.actors.clone(),
            banners: self.banners.clone(),
        }
    }
}

impl PartialEq for Show {
    fn eq(&self, other: &Self) -> bool {
        self.language == other.language
            && self.bag == other.bag
            && self.seasons == other.seasons
            && self.actors == other.actors
            && self.banners == other.banners
    }
}

impl fmt::Debug for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Show")
            .field("language", &self.language)
            .field("bag", &self.bag)
            .field("seasons", &self.seasons)
            .field("actors", &self.actors)
            .field("banners", &self.banners)
            .finish()
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Show - {}>", self.series_name().unwrap_or(""))
    }
}

/// The result of one [`Tvdb::search`] call: the matching shows in document
/// order, together with the original search string.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    shows: Vec<Show>,
    search: String,
    language: String,
}

impl SearchResult {
    /// The search string exactly as passed in, case preserved.
    pub fn search(&self) -> &str {
        &self.search
    }

    /// The language the search was made in.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Number of matching shows.
    pub fn len(&self) -> usize {
        self.shows.len()
    }

    /// True if the search matched nothing.
    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    /// The show at the given position (0-based, document order).
    ///
    /// Fails with [`TvdbError::Index`] outside `0..len`.
    pub fn get(&self, index: usize) -> Result<&Show> {
        self.shows.get(index).ok_or_else(|| {
            warn!(index, "index out of range");
            TvdbError::Index(index.to_string())
        })
    }

    /// Matching shows in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Show> {
        self.shows.iter()
    }

    /// Consumes the result, handing the shows over.
    pub fn into_shows(self) -> Vec<Show> {
        self.shows
    }
}

impl IntoIterator for SearchResult {
    type Item = Show;
    type IntoIter = std::vec::IntoIter<Show>;

    fn into_iter(self) -> Self::IntoIter {
        self.shows.into_iter()
    }
}

/// The main entry point: searches shows, fetches shows and episodes by id,
/// and restores persisted shows.
pub struct Tvdb {
    ctx: Arc<Context>,
    /// Parsed results of earlier searches, keyed by (term, language).
    /// Repeating a search within a session does not re-parse.
    search_buffer: HashMap<(String, String), Vec<Show>>,
}

impl Tvdb {
    /// Creates a façade using the default transport: a blocking HTTP client
    /// with an on-disk response cache. When the cache directory is not
    /// available the client runs uncached.
    pub fn new(api_key: &str) -> Self {
        let loader: Box<dyn Loader> = match ResponseCache::open("responses") {
            Ok(cache) => Box::new(CachedLoader::new(HttpLoader::new(), cache)),
            Err(err) => {
                warn!(%err, "response cache unavailable, running uncached");
                Box::new(HttpLoader::new())
            }
        };
        Self::with_loader(api_key, loader, false)
    }

    /// Creates a façade with an explicit transport and attribute lookup
    /// mode. `ignore_case=true` makes every entity's attribute access
    /// case-insensitive.
    pub fn with_loader(api_key: &str, loader: Box<dyn Loader>, ignore_case: bool) -> Self {
        Self {
            ctx: Arc::new(Context {
                api_key: api_key.to_string(),
                ignore_case,
                loader,
            }),
            search_buffer: HashMap::new(),
        }
    }

    /// Searches the service for shows matching `name`.
    ///
    /// The matching is case-insensitive on the service side; the returned
    /// shows keep the document order. Repeated identical searches within a
    /// session are served from memory.
    pub fn search(&mut self, name: &str, language: &str) -> Result<SearchResult> {
        self.search_with_cache(name, language, true)
    }

    /// Like [`search`](Tvdb::search), with explicit control over whether
    /// the transport may reuse cached response bytes.
    pub fn search_with_cache(
        &mut self,
        name: &str,
        language: &str,
        use_cache: bool,
    ) -> Result<SearchResult> {
        debug!(name, language, "searching");
        language::validate(language)?;

        let key = (name.to_string(), language.to_string());
        if !self.search_buffer.contains_key(&key) {
            let url = search_url(name, language);
            let bytes = self.ctx.loader.load(&url, use_cache)?;
            let root = parse_tree(&bytes)?;

            let shows: Vec<Show> = root
                .find_all("Series")
                .map(|element| {
                    Show::from_bag(
                        Arc::clone(&self.ctx),
                        language,
                        mapper::map_element(element, &SHOW_SEARCH_SCHEMA, self.ctx.ignore_case),
                    )
                })
                .collect();

            debug!(name, count = shows.len(), "search complete");
            self.search_buffer.insert(key.clone(), shows);
        }

        Ok(SearchResult {
            shows: self.search_buffer[&key].clone(),
            search: name.to_string(),
            language: language.to_string(),
        })
    }

    /// Fetches the show with the given series id.
    ///
    /// The returned show carries the search-level attribute set; call
    /// [`Show::update`] for the full record and the season/episode tree.
    /// Unknown and invalid ids (including the service's 404 answer) fail
    /// with [`TvdbError::Id`].
    pub fn get(&self, show_id: u32, language: &str) -> Result<Show> {
        language::validate(language)?;
        if show_id == 0 {
            return Err(TvdbError::Id("0".to_string()));
        }

        let url = series_url(&self.ctx.api_key, show_id, language);
        let bytes = self.ctx.loader.load(&url, true).map_err(|err| match err {
            TvdbError::NotFound(_) => TvdbError::Id(show_id.to_string()),
            other => other,
        })?;
        let root = parse_tree(&bytes)?;

        let series = root
            .find("Series")
            .ok_or_else(|| TvdbError::Id(show_id.to_string()))?;

        Ok(Show::from_bag(
            Arc::clone(&self.ctx),
            language,
            mapper::map_element(series, &SHOW_FULL_SCHEMA, self.ctx.ignore_case),
        ))
    }

    /// Alias of [`get`](Tvdb::get).
    pub fn get_series(&self, show_id: u32, language: &str) -> Result<Show> {
        self.get(show_id, language)
    }

    /// Fetches a single episode by its episode id.
    ///
    /// The returned episode carries its season and series identities as
    /// delivered by the document. Unknown and invalid ids fail with
    /// [`TvdbError::Id`].
    pub fn get_episode(&self, episode_id: u32, language: &str) -> Result<Episode> {
        language::validate(language)?;
        if episode_id == 0 {
            return Err(TvdbError::Id("0".to_string()));
        }

        let url = episode_url(&self.ctx.api_key, episode_id, language);
        let bytes = self.ctx.loader.load(&url, true).map_err(|err| match err {
            TvdbError::NotFound(_) => TvdbError::Id(episode_id.to_string()),
            other => other,
        })?;
        let root = parse_tree(&bytes)?;

        let element = root
            .find("Episode")
            .ok_or_else(|| TvdbError::Id(episode_id.to_string()))?;

        Episode::from_bag(
            mapper::map_element(element, &EPISODE_SCHEMA, self.ctx.ignore_case),
            None,
        )
    }

    /// Turns a [`ShowSnapshot`] back into a live show attached to this
    /// façade. No network activity; all attributes and the tree come from
    /// the snapshot.
    pub fn restore(&self, snapshot: ShowSnapshot) -> Show {
        Show {
            ctx: Arc::clone(&self.ctx),
            language: snapshot.language,
            bag: snapshot.bag,
            seasons: snapshot.seasons,
            actors: snapshot.actors,
            banners: snapshot.banners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Loader serving canned documents from memory. Unknown URLs answer
    /// like the service's 404.
    struct FakeLoader {
        responses: HashMap<String, Vec<u8>>,
    }

    impl FakeLoader {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
            }
        }

        fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.as_bytes().to_vec());
            self
        }
    }

    impl Loader for FakeLoader {
        fn load(&self, url: &str, _use_cache: bool) -> Result<Vec<u8>> {
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| TvdbError::NotFound(url.to_string()))
        }
    }

    const API_KEY: &str = "TESTKEY";

    const SEARCH_DOC: &str = "<Data>\
        <Series>\
          <seriesid>79349</seriesid>\
          <id>79349</id>\
          <language>en</language>\
          <SeriesName>Dexter</SeriesName>\
          <Overview>A forensics expert moonlights.</Overview>\
          <FirstAired>2006-10-01</FirstAired>\
          <IMDB_ID>tt0773262</IMDB_ID>\
        </Series>\
        <Series>\
          <seriesid>77444</seriesid>\
          <id>77444</id>\
          <language>en</language>\
          <SeriesName>Cliff Dexter</SeriesName>\
        </Series>\
      </Data>";

    // Seasons and episodes deliberately out of order.
    const SERIES_ALL_DOC: &str = "<Data>\
        <Series>\
          <id>79349</id>\
          <SeriesName>Dexter</SeriesName>\
          <Network>Showtime</Network>\
          <Runtime>50</Runtime>\
          <Rating>8.8</Rating>\
          <Genre>|Crime|Drama|</Genre>\
          <Status>Ended</Status>\
        </Series>\
        <Episode>\
          <id>307479</id>\
          <EpisodeName>Crocodile</EpisodeName>\
          <EpisodeNumber>2</EpisodeNumber>\
          <SeasonNumber>1</SeasonNumber>\
          <seriesid>79349</seriesid>\
        </Episode>\
        <Episode>\
          <id>998181</id>\
          <EpisodeName>My Dad</EpisodeName>\
          <EpisodeNumber>1</EpisodeNumber>\
          <SeasonNumber>2</SeasonNumber>\
          <seriesid>79349</seriesid>\
        </Episode>\
        <Episode>\
          <id>307473</id>\
          <EpisodeName>Dexter</EpisodeName>\
          <EpisodeNumber>1</EpisodeNumber>\
          <SeasonNumber>1</SeasonNumber>\
          <seriesid>79349</seriesid>\
          <GuestStars>|Keith Carradine|JoBeth Williams|</GuestStars>\
        </Episode>\
        <Episode>\
          <id>412391</id>\
          <EpisodeName>Early Cuts</EpisodeName>\
          <EpisodeNumber>1</EpisodeNumber>\
          <SeasonNumber>0</SeasonNumber>\
          <seriesid>79349</seriesid>\
        </Episode>\
      </Data>";

    const EPISODE_DOC: &str = "<Data>\
        <Episode>\
          <id>307473</id>\
          <EpisodeName>Dexter</EpisodeName>\
          <EpisodeNumber>1</EpisodeNumber>\
          <SeasonNumber>1</SeasonNumber>\
          <seriesid>79349</seriesid>\
          <FirstAired>2006-10-01</FirstAired>\
        </Episode>\
      </Data>";

    const ACTORS_DOC: &str = "<Actors>\
        <Actor>\
          <id>70947</id>\
          <Name>Michael C. Hall</Name>\
          <Role>Dexter Morgan</Role>\
          <SortOrder>0</SortOrder>\
        </Actor>\
        <Actor>\
          <id>70948</id>\
          <Name>Jennifer Carpenter</Name>\
          <Role>Debra Morgan</Role>\
          <SortOrder>1</SortOrder>\
        </Actor>\
      </Actors>";

    const BANNERS_DOC: &str = "<Banners>\
        <Banner>\
          <id>23585</id>\
          <BannerPath>fanart/original/79349-2.jpg</BannerPath>\
          <BannerType>fanart</BannerType>\
          <Rating>7.5</Rating>\
        </Banner>\
      </Banners>";

    fn fake_db() -> Tvdb {
        fake_db_with_case(false)
    }

    fn fake_db_with_case(ignore_case: bool) -> Tvdb {
        let loader = FakeLoader::new()
            .with(&search_url("Dexter", "en"), SEARCH_DOC)
            .with(&series_url(API_KEY, 79349, "en"), SEARCH_DOC)
            .with(&series_all_url(API_KEY, 79349, "en"), SERIES_ALL_DOC)
            .with(&episode_url(API_KEY, 307473, "en"), EPISODE_DOC)
            .with(&actors_url(API_KEY, 79349), ACTORS_DOC)
            .with(&banners_url(API_KEY, 79349), BANNERS_DOC);
        Tvdb::with_loader(API_KEY, Box::new(loader), ignore_case)
    }

    fn updated_show(db: &mut Tvdb) -> Show {
        let result = db.search("Dexter", "en").unwrap();
        let mut show = result.get(0).unwrap().clone();
        show.update().unwrap();
        show
    }

    #[test]
    fn test_search_preserves_document_order_and_term() {
        let mut db = fake_db();
        let result = db.search("Dexter", "en").unwrap();

        assert_eq!(result.search(), "Dexter");
        assert_eq!(result.language(), "en");
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(0).unwrap().series_name(), Some("Dexter"));
        assert_eq!(result.get(1).unwrap().series_name(), Some("Cliff Dexter"));
    }

    #[test]
    fn test_search_rejects_bad_language_before_any_request() {
        struct NoNetwork;
        impl Loader for NoNetwork {
            fn load(&self, url: &str, _use_cache: bool) -> Result<Vec<u8>> {
                panic!("unexpected request to {url}");
            }
        }

        let mut db = Tvdb::with_loader(API_KEY, Box::new(NoNetwork), false);

        let err = db.search("Dexter", "xx").unwrap_err();
        assert!(matches!(err, TvdbError::Value(_)));
        assert_eq!(err.to_string(), "'xx' is not a valid language");

        let err = db.search("Dexter", "").unwrap_err();
        assert!(matches!(err, TvdbError::Value(_)));
    }

    #[test]
    fn test_repeated_search_is_served_from_the_session_buffer() {
        let mut db = fake_db();
        let first = db.search("Dexter", "en").unwrap();
        let second = db.search("Dexter", "en").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_search_result_index_is_bounds_checked() {
        let mut db = fake_db();
        let result = db.search("Dexter", "en").unwrap();

        let err = result.get(2).unwrap_err();
        assert!(matches!(err, TvdbError::Index(_)));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_get_returns_the_requested_show() {
        let db = fake_db();
        let show = db.get(79349, "en").unwrap();

        assert_eq!(show.id().unwrap(), 79349);
        assert_eq!(show.series_name(), Some("Dexter"));
        // Search-level hydration only
        assert!(show.is_empty());
    }

    #[test]
    fn test_get_rejects_invalid_and_unknown_ids() {
        let db = fake_db();

        let err = db.get(0, "en").unwrap_err();
        assert!(matches!(err, TvdbError::Id(_)));

        let err = db.get(99999999, "en").unwrap_err();
        assert!(matches!(err, TvdbError::Id(_)));
        assert!(err.to_string().contains("99999999"));

        let err = db.get(79349, "xx").unwrap_err();
        assert!(matches!(err, TvdbError::Value(_)));
    }

    #[test]
    fn test_get_series_is_an_alias_of_get() {
        let db = fake_db();
        assert_eq!(
            db.get_series(79349, "en").unwrap(),
            db.get(79349, "en").unwrap()
        );
    }

    #[test]
    fn test_update_builds_ordered_tree_from_shuffled_document() {
        let mut db = fake_db();
        let show = updated_show(&mut db);

        let numbers: Vec<u32> = show.seasons().map(Season::number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);

        let season_one = show.season(1).unwrap();
        assert_eq!(season_one.series_id(), 79349);
        let episodes: Vec<u32> = season_one.episodes().map(Episode::episode_number).collect();
        assert_eq!(episodes, vec![1, 2]);
        assert_eq!(season_one.episode(1).unwrap().name(), Some("Dexter"));
        assert_eq!(season_one.episode(1).unwrap().series_id(), 79349);

        // Re-iteration yields the same order
        let again: Vec<u32> = show.seasons().map(Season::number).collect();
        assert_eq!(again, vec![0, 1, 2]);
    }

    #[test]
    fn test_update_merges_attributes_without_dropping() {
        let mut db = fake_db();
        let show = updated_show(&mut db);

        // From the search record, absent in the full record
        assert_eq!(
            show.get_attribute("IMDB_ID").unwrap().as_text(),
            Some("tt0773262")
        );
        // From the full record
        assert_eq!(
            show.get_attribute("Network").unwrap().as_text(),
            Some("Showtime")
        );
        assert_eq!(show.get_attribute("Runtime").unwrap().as_int(), Some(50));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut db = fake_db();
        let mut show = updated_show(&mut db);
        let first = show.clone();

        show.update().unwrap();

        assert_eq!(show, first);
    }

    #[test]
    fn test_season_and_episode_indexes_are_bounds_checked() {
        let mut db = fake_db();
        let show = updated_show(&mut db);

        let err = show.season(7).unwrap_err();
        assert!(matches!(err, TvdbError::Index(_)));
        assert_eq!(err.to_string(), "Index 7 not found");

        let err = show.season(1).unwrap().episode(99).unwrap_err();
        assert!(matches!(err, TvdbError::Index(_)));
    }

    #[test]
    fn test_unhydrated_and_unknown_attributes_fail_with_detail() {
        let mut db = fake_db();
        let result = db.search("Dexter", "en").unwrap();
        let show = result.get(0).unwrap();

        // Known series field, not hydrated at search level
        let err = show.get_attribute("Runtime").unwrap_err();
        assert!(matches!(err, TvdbError::Attribute { .. }));
        assert!(err.to_string().contains("not loaded yet"));

        // Not a service field at all
        let err = show.get_attribute("NoSuchField").unwrap_err();
        assert!(matches!(err, TvdbError::Attribute { .. }));
        assert_eq!(err.to_string(), "Show has no attribute 'NoSuchField'");
    }

    #[test]
    fn test_ignore_case_affects_attribute_lookup() {
        let mut db = fake_db_with_case(true);
        let result = db.search("Dexter", "en").unwrap();
        let show = result.get(0).unwrap();

        assert_eq!(
            show.get_attribute("IMDB_ID").unwrap().as_text(),
            Some("tt0773262")
        );
        assert_eq!(
            show.get_attribute("imdb_id").unwrap().as_text(),
            Some("tt0773262")
        );

        let mut db = fake_db_with_case(false);
        let result = db.search("Dexter", "en").unwrap();
        let show = result.get(0).unwrap();

        assert!(show.get_attribute("imdb_id").is_err());
    }

    #[test]
    fn test_get_episode_populates_identity_references() {
        let db = fake_db();
        let episode = db.get_episode(307473, "en").unwrap();

        assert_eq!(episode.id().unwrap(), 307473);
        assert_eq!(episode.episode_number(), 1);
        assert_eq!(episode.season_number(), 1);
        assert_eq!(episode.series_id(), 79349);
        assert_eq!(episode.name(), Some("Dexter"));
    }

    #[test]
    fn test_get_episode_rejects_invalid_and_unknown_ids() {
        let db = fake_db();

        assert!(matches!(
            db.get_episode(0, "en").unwrap_err(),
            TvdbError::Id(_)
        ));
        assert!(matches!(
            db.get_episode(1, "en").unwrap_err(),
            TvdbError::Id(_)
        ));
        assert!(matches!(
            db.get_episode(307473, "nope").unwrap_err(),
            TvdbError::Value(_)
        ));
    }

    #[test]
    fn test_load_actors_is_idempotent() {
        let mut db = fake_db();
        let mut show = updated_show(&mut db);

        show.load_actors().unwrap();
        assert_eq!(show.actors().len(), 2);
        assert_eq!(show.actors()[0].name(), Some("Michael C. Hall"));
        assert_eq!(show.actors()[1].role(), Some("Debra Morgan"));

        // Second call keeps the list, no refetch
        show.load_actors().unwrap();
        assert_eq!(show.actors().len(), 2);
    }

    #[test]
    fn test_load_banners_builds_the_banner_url() {
        let mut db = fake_db();
        let mut show = updated_show(&mut db);

        show.load_banners().unwrap();
        assert_eq!(show.banners().len(), 1);
        assert_eq!(
            show.banners()[0].banner_url().unwrap(),
            "http://thetvdb.com/banners/fanart/original/79349-2.jpg"
        );
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut db = fake_db();
        let mut show = updated_show(&mut db);
        show.load_actors().unwrap();
        show.load_banners().unwrap();

        let json = serde_json::to_string(&show.snapshot()).unwrap();
        let snapshot: ShowSnapshot = serde_json::from_str(&json).unwrap();
        let restored = db.restore(snapshot);

        assert_eq!(restored, show);
        assert_eq!(restored.season(1).unwrap().len(), 2);
        assert_eq!(
            restored.get_attribute("Network").unwrap().as_text(),
            Some("Showtime")
        );
    }

    #[test]
    fn test_bad_xml_propagates_as_bad_data() {
        let loader = FakeLoader::new().with(&search_url("Dexter", "en"), "<Data><broken");
        let mut db = Tvdb::with_loader(API_KEY, Box::new(loader), false);

        assert!(matches!(
            db.search("Dexter", "en").unwrap_err(),
            TvdbError::BadData(_)
        ));
    }

    #[test]
    fn test_display_formats_match_entity_identity() {
        let mut db = fake_db();
        let show = updated_show(&mut db);

        assert_eq!(show.to_string(), "<Show - Dexter>");
        assert_eq!(show.season(1).unwrap().to_string(), "<Season 001>");
        assert_eq!(
            show.season(1).unwrap().episode(1).unwrap().to_string(),
            "<Episode S001E001 - Dexter>"
        );
    }
}
