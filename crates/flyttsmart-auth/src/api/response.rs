use serde::Deserialize;
use url::{ParseError, Url};

use crate::AuthError;

/// Body of a successful `POST /external/token`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessTokenApiResponse {
    pub access_token: String,
}

/// Body of a successful `POST /external/users/login`.
///
/// `url` is the deep link into the Flyttsmart site. It usually comes without a scheme.
#[derive(Deserialize, Debug)]
pub(crate) struct LoginApiResponse {
    pub url: String,
}

impl LoginApiResponse {
    /// Extracts the `token` query parameter of the redirect URL.
    pub(crate) fn session_token(&self) -> Result<String, AuthError> {
        let url = match Url::parse(&self.url) {
            Err(ParseError::RelativeUrlWithoutBase) => {
                Url::parse(&format!("https://{}", self.url))?
            }
            parsed => parsed?,
        };

        url.query_pairs()
            .find(|(name, _)| name == "token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingSessionToken)
    }
}
