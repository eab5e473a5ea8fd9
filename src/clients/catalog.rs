use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clients::{
    entities::{Album, LibraryTrack, RawSearchEntry, SearchEntry, SearchKind},
    errors::{Error, Result},
};
use crate::settings::Settings;

const MAX_SEARCH_RESULTS: &str = "20";

/// Remote music catalog the jukebox searches and streams from.
///
/// Every call except [`Catalog::authorize_client`] fails with
/// [`Error::NotAuthorized`] until the client has logged in.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn authorize_client(&mut self) -> Result<()>;

    /// Search the catalog, keeping only results of `kind`. Nothing left is [`Error::NoResults`].
    async fn search(&self, query: &str, kind: SearchKind) -> Result<Vec<SearchEntry>>;

    /// Full album detail with tracks in album order
    async fn album_details(&self, album_id: &str) -> Result<Album>;

    /// Time-limited URL the track's audio can be fetched from
    async fn stream_url(&self, track_id: &str) -> Result<String>;

    /// Every track in the user's library
    async fn library(&self) -> Result<Vec<LibraryTrack>>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize, Debug)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    entries: Option<Vec<RawSearchEntry>>,
}

#[derive(Deserialize, Debug)]
struct StreamUrlResponse {
    url: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TrackFeed {
    #[serde(default)]
    data: Option<TrackFeedData>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TrackFeedData {
    #[serde(default)]
    items: Vec<LibraryTrack>,
}

/// JSON-over-HTTP catalog client
pub struct HttpCatalog {
    http: reqwest::Client,
    api_url: String,
    email: String,
    password: String,
    token: Option<String>,
}

impl HttpCatalog {
    pub fn new(http: reqwest::Client, api_url: &str, email: &str, password: &str) -> Self {
        HttpCatalog {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            password: password.to_string(),
            token: None,
        }
    }

    // Create a client with the credentials and timeouts from settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(HttpCatalog::new(
            http,
            settings.api_url()?,
            &settings.email,
            &settings.password,
        ))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let token = self.token.as_deref().ok_or(Error::NotAuthorized)?;
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api { status, url });
        }
        Ok(response.json::<T>().await?)
    }
}

impl Catalog for HttpCatalog {
    async fn authorize_client(&mut self) -> Result<()> {
        debug!("Logging in to {} as {}", self.api_url, self.email);
        let response = self
            .http
            .post(self.endpoint("auth/login"))
            .json(&LoginRequest {
                email: &self.email,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| Error::Authentication {
                reason: "could not reach the catalog".into(),
                source: Some(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Authentication {
                reason: format!("login rejected with status {status}"),
                source: None,
            });
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::Authentication {
                reason: "unreadable login response".into(),
                source: Some(e),
            })?;
        self.token = Some(login.token);
        debug!("Authenticated as {}", self.email);
        Ok(())
    }

    async fn search(&self, query: &str, kind: SearchKind) -> Result<Vec<SearchEntry>> {
        let response: SearchResponse = self
            .get_json("query", &[("q", query), ("max-results", MAX_SEARCH_RESULTS)])
            .await?;

        let entries: Vec<SearchEntry> = response
            .entries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|e| e.into_entry(kind))
            .collect();
        debug!("Search for {query:?} returned {} {kind:?} entries", entries.len());

        if entries.is_empty() {
            return Err(Error::NoResults {
                query: query.to_string(),
            });
        }
        Ok(entries)
    }

    async fn album_details(&self, album_id: &str) -> Result<Album> {
        self.get_json(
            "fetchalbum",
            &[("nid", album_id), ("include-tracks", "true")],
        )
        .await
    }

    async fn stream_url(&self, track_id: &str) -> Result<String> {
        let response: StreamUrlResponse =
            self.get_json("mplay", &[("songid", track_id)]).await?;
        Ok(response.url)
    }

    async fn library(&self) -> Result<Vec<LibraryTrack>> {
        let mut tracks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: TrackFeed = {
                let query: Vec<(&str, &str)> = page_token
                    .as_deref()
                    .map(|t| vec![("start-token", t)])
                    .unwrap_or_default();
                self.get_json("trackfeed", &query).await?
            };

            if let Some(data) = page.data {
                tracks.extend(data.items);
            }
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        debug!("Fetched {} library tracks", tracks.len());
        Ok(tracks)
    }
}
