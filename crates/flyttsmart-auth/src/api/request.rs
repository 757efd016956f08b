use serde::Serialize;

/// Body of `POST /external/token`.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessTokenApiRequest<'a> {
    pub auth_code: &'a str,
}

/// Body of `POST /external/users/login`.
#[derive(Serialize, Debug)]
pub(crate) struct LoginApiRequest<'a> {
    pub pno: &'a str,
}
