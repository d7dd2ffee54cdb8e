use super::{SpotifyClient, SpotifyError, check_status};
use crate::types::PlayRequest;

impl SpotifyClient {
    /// Starts playback of `uris` on the user's active device.
    ///
    /// With `device_id` set, playback is started on that device instead.
    /// Spotify answers `204 No Content` on success; a `404` usually means no
    /// device is active.
    pub async fn play(
        &self,
        token: &str,
        uris: Vec<String>,
        device_id: Option<&str>,
    ) -> Result<(), SpotifyError> {
        let mut request = self
            .http
            .put(self.api("/me/player/play"))
            .bearer_auth(token)
            .json(&PlayRequest { uris });
        if let Some(device_id) = device_id {
            request = request.query(&[("device_id", device_id)]);
        }

        check_status(request.send().await?).await?;
        Ok(())
    }
}
