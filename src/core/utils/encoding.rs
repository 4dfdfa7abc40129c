//! URL encoding helpers.
//!
//! Channel and group names may contain characters which have special meaning
//! in URL path and query, so they are percent-encoded before they are put
//! into a request.

use percent_encoding::{percent_encode, AsciiSet, CONTROLS};

/// https://url.spec.whatwg.org/#fragment-percent-encode-set
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`');

/// https://url.spec.whatwg.org/#path-percent-encode-set
const PATH: &AsciiSet = &FRAGMENT.add(b'#').add(b'?').add(b'{').add(b'}');

/// https://url.spec.whatwg.org/#userinfo-percent-encode-set
const USERINFO: &AsciiSet = &PATH
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'|');

/// `+`, `%` and `,` have to be escaped inside of a single name because `,`
/// separates names in a list.
const PUBNUB_SET: &AsciiSet = &USERINFO.add(b'+').add(b'%').add(b',').add(b'&');

/// Placeholder used in the channels path segment when only channel groups
/// are subscribed.
pub const EMPTY_LIST_PLACEHOLDER: &str = ",";

/// Percent-encode single value.
pub fn url_encode(data: &[u8]) -> String {
    percent_encode(data, PUBNUB_SET).to_string()
}

/// Percent-encode every name and join them with `,`.
///
/// Returns `None` for an empty list.
pub fn join_url_encoded<S>(names: &[S]) -> Option<String>
where
    S: AsRef<str>,
{
    if names.is_empty() {
        return None;
    }

    Some(
        names
            .iter()
            .map(|name| url_encode(name.as_ref().as_bytes()))
            .collect::<Vec<String>>()
            .join(","),
    )
}
