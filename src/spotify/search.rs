use super::{SpotifyClient, SpotifyError, check_status};
use crate::types::{SearchResponse, Track};

impl SpotifyClient {
    /// Searches the catalog for tracks matching `query`.
    ///
    /// Returns the first page of results in Spotify's relevance order. An
    /// empty vector means nothing matched.
    pub async fn search_tracks(&self, token: &str, query: &str) -> Result<Vec<Track>, SpotifyError> {
        let response = self
            .http
            .get(self.api("/search"))
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track")])
            .send()
            .await?;

        let res = check_status(response).await?.json::<SearchResponse>().await?;
        Ok(res.tracks.items)
    }

    /// URI of the best match for `query`.
    pub async fn first_track_uri(&self, token: &str, query: &str) -> Result<String, SpotifyError> {
        self.search_tracks(token, query)
            .await?
            .into_iter()
            .next()
            .map(|track| track.uri)
            .ok_or(SpotifyError::NoTracks)
    }
}
