mod request;
mod response;

pub(crate) use request::{AccessTokenApiRequest, LoginApiRequest};
pub(crate) use response::{AccessTokenApiResponse, LoginApiResponse};

/// Header carrying the client id on every external API request.
pub(crate) const CLIENT_ID_HEADER: &str = "clientId";

pub(crate) const AUTH_CODE_PATH: &str = "/external/code";
pub(crate) const ACCESS_TOKEN_PATH: &str = "/external/token";
pub(crate) const LOGIN_PATH: &str = "/external/users/login";
