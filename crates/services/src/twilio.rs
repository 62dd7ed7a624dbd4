use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Validates an `X-Twilio-Signature` header against the request.
///
/// Twilio signs the full external URL (including query string, exactly as
/// the client saw it) with every form field's key and value appended in
/// lexicographic key order, HMAC-SHA1 keyed by the account auth token,
/// base64-encoded.
///
/// When no auth token is configured, or the request carries no signature
/// header, verification is skipped and the request is accepted (the
/// permissive local/dev default). Any internal failure, e.g. a header that
/// is not valid base64, counts as verification failure, never a panic.
pub fn verify_signature(
    url: &str,
    params: &BTreeMap<String, String>,
    signature: Option<&str>,
    auth_token: Option<&str>,
) -> bool {
    let (Some(token), Some(signature)) = (auth_token, signature) else {
        return true;
    };

    let Ok(expected) = BASE64.decode(signature) else {
        return false;
    };

    let mut data = String::with_capacity(
        url.len() + params.iter().map(|(k, v)| k.len() + v.len()).sum::<usize>(),
    );
    data.push_str(url);
    // BTreeMap iterates in key order, which is exactly the signing order.
    for (key, value) in params {
        data.push_str(key);
        data.push_str(value);
    }

    let Ok(mut mac) = HmacSha1::new_from_slice(token.as_bytes()) else {
        return false;
    };
    mac.update(data.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
