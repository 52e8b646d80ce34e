//! Request authorization and download-link signing
//!
//! API calls carry an `Authorization: OAuth <token>` header. Audio links are
//! signed with MD5(salt + path-without-leading-slash + s).

use md5::{Digest, Md5};

use super::models::DirectLinkInfo;

/// Client identifier sent with every request
pub const CLIENT_NAME: &str = "tunesort";

/// Salt mixed into the download-link signature
const SIGN_SALT: &str = "XGRlBW9FXlekgbPrRHuSiA";

/// Value for the Authorization header
pub fn authorization_header(token: &str) -> String {
    format!("OAuth {}", token)
}

/// Generate the hex signature for a download path
fn sign(path: &str, s: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(SIGN_SALT.as_bytes());
    hasher.update(path.strip_prefix('/').unwrap_or(path).as_bytes());
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build the final MP3 URL from a download-info document
pub fn direct_link(info: &DirectLinkInfo) -> String {
    let sign = sign(&info.path, &info.s);
    format!("https://{}/get-mp3/{}/{}{}", info.host, sign, info.ts, info.path)
}
